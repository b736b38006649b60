pub mod archive;
pub mod client;
pub mod error;
pub mod language;
pub mod markdown;
pub mod model;
pub mod problem;
pub mod readme;
pub mod retry;
pub mod submissions;
pub mod sync;
pub mod transport;

pub use archive::{ArchiveWriter, ProblemReport, SubmissionFailure};
pub use client::{ClientConfig, ClientConfigBuilder, LeetCodeClient};
pub use error::{ArchiveError, Result};
pub use language::Language;
pub use model::{
    CodeTemplate, Difficulty, ProblemDetail, RunSummary, SubmissionCode, SubmissionRecord,
    SubmissionStatus, SummaryEntry,
};
pub use readme::write_index;
pub use retry::RetryConfig;
pub use sync::{run, CancelToken, Interruption, SyncOptions, SyncOptionsBuilder, SyncReport};
