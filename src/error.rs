use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T, E = ArchiveError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The request never produced an HTTP response (connect, TLS, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered, but with a non-success status or without the expected payload.
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render index: {0}")]
    Render(#[from] askama::Error),
}

impl ArchiveError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn fs(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Only transport failures are worth another attempt; anything the server
    /// answered (auth failure, unknown slug, bad payload) will answer the same again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
