use strum::{Display, EnumString};

/// One entry of the user's submission history, newest first as the server lists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub id: u64,
    pub problem_slug: String,
    pub language: String,
    pub status: SubmissionStatus,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumString, Display)]
pub enum SubmissionStatus {
    #[strum(serialize = "Accepted")]
    Accepted,
    #[strum(serialize = "Wrong Answer")]
    WrongAnswer,
    #[strum(serialize = "Time Limit Exceeded")]
    TimeLimitExceeded,
    #[strum(serialize = "Memory Limit Exceeded")]
    MemoryLimitExceeded,
    #[strum(serialize = "Output Limit Exceeded")]
    OutputLimitExceeded,
    #[strum(serialize = "Runtime Error")]
    RuntimeError,
    #[strum(serialize = "Compile Error")]
    CompileError,
    #[strum(serialize = "Internal Error")]
    InternalError,
    #[strum(serialize = "Timeout")]
    Timeout,
    #[strum(default)]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTemplate {
    pub language: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemDetail {
    pub slug: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub description_html: String,
    /// Server order; the first match for the language filter wins.
    pub code_templates: Vec<CodeTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionCode {
    pub submission_id: u64,
    pub source_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    pub slug: String,
    pub title: String,
    pub difficulty: Difficulty,
}

/// Problems saved by one run, in processing order.
pub type RunSummary = Vec<SummaryEntry>;

impl SubmissionStatus {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// `Wrong Answer` becomes `Wrong_Answer`, as used in submission file names.
    pub fn file_label(&self) -> String {
        self.to_string().replace(' ', "_")
    }
}

impl SubmissionRecord {
    /// Canonical language key used for filtering and directory names.
    pub fn language_key(&self) -> String {
        self.language.to_lowercase()
    }
}
