use crate::error::{ArchiveError, Result};
use crate::language::extension_for;
use crate::markdown::html_to_markdown;
use crate::model::{ProblemDetail, SubmissionCode, SubmissionRecord};
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

pub const DESCRIPTION_FILE: &str = "README.md";
pub const TEMPLATE_STEM: &str = "solutiontemplate";
pub const SUBMISSIONS_DIR: &str = "submissions";

/// Writes one directory per problem under `base_dir`. Every write overwrites,
/// so writing the same inputs twice yields the same tree.
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    base_dir: PathBuf,
    languages: Vec<String>,
}

#[derive(Debug)]
pub struct SubmissionFailure {
    pub submission_id: u64,
    pub error: ArchiveError,
}

#[derive(Debug, Default)]
pub struct ProblemReport {
    pub template: Option<PathBuf>,
    pub written: Vec<PathBuf>,
    pub failures: Vec<SubmissionFailure>,
}

impl ArchiveWriter {
    pub fn new(base_dir: impl Into<PathBuf>, languages: &[String]) -> Self {
        Self {
            base_dir: base_dir.into(),
            languages: languages.iter().map(|l| l.to_lowercase()).collect(),
        }
    }

    pub fn accepts(&self, language: &str) -> bool {
        let language = language.to_lowercase();
        self.languages.iter().any(|l| *l == language)
    }

    pub fn problem_dir(&self, slug: &str) -> PathBuf {
        self.base_dir.join(slug)
    }

    /// Write description, template and every submission in the language filter.
    ///
    /// Code is pulled through `fetch_code` one submission at a time. A failed
    /// fetch or write only costs that submission; it lands in
    /// [`ProblemReport::failures`] and the rest carry on.
    pub async fn write_problem<F, Fut>(
        &self,
        slug: &str,
        problem: &ProblemDetail,
        submissions: &[SubmissionRecord],
        fetch_code: F,
    ) -> Result<ProblemReport>
    where
        F: Fn(u64) -> Fut,
        Fut: Future<Output = Result<SubmissionCode>>,
    {
        check_slug(slug)?;
        let dir = self.problem_dir(slug);
        create_dir(&dir.join(SUBMISSIONS_DIR)).await?;

        let description = format!(
            "# {}\n\n{}\n",
            problem.title,
            html_to_markdown(&problem.description_html)
        );
        write_file(&dir.join(DESCRIPTION_FILE), &description).await?;

        let mut report = ProblemReport::default();
        if let Some(template) = problem
            .code_templates
            .iter()
            .find(|t| self.accepts(&t.language))
        {
            let path = dir.join(format!(
                "{TEMPLATE_STEM}.{}",
                extension_for(&template.language)
            ));
            write_file(&path, &template.code).await?;
            report.template = Some(path);
        }

        for submission in submissions.iter().filter(|s| self.accepts(&s.language)) {
            match self.write_submission(&dir, submission, &fetch_code).await {
                Ok(path) => {
                    debug!(slug, path = %path.display(), "submission written");
                    report.written.push(path);
                }
                Err(error) => {
                    warn!(slug, submission_id = submission.id, "submission skipped: {error}");
                    report.failures.push(SubmissionFailure {
                        submission_id: submission.id,
                        error,
                    });
                }
            }
        }

        Ok(report)
    }

    async fn write_submission<F, Fut>(
        &self,
        dir: &Path,
        submission: &SubmissionRecord,
        fetch_code: &F,
    ) -> Result<PathBuf>
    where
        F: Fn(u64) -> Fut,
        Fut: Future<Output = Result<SubmissionCode>>,
    {
        let code = fetch_code(submission.id).await?;
        let language = submission.language_key();
        let lang_dir = dir.join(SUBMISSIONS_DIR).join(&language);
        create_dir(&lang_dir).await?;

        let path = lang_dir.join(submission_file_name(submission));
        write_file(&path, &code.source_text).await?;
        Ok(path)
    }
}

/// `<timestamp>_<Status>.<ext>`; identical names overwrite, last write wins.
pub fn submission_file_name(submission: &SubmissionRecord) -> String {
    format!(
        "{}_{}.{}",
        submission.timestamp,
        submission.status.file_label(),
        extension_for(&submission.language)
    )
}

fn check_slug(slug: &str) -> Result<()> {
    let invalid = slug.is_empty()
        || slug == "."
        || slug == ".."
        || slug.contains(['/', '\\'])
        || slug.eq_ignore_ascii_case(DESCRIPTION_FILE);
    if invalid {
        return Err(ArchiveError::DataIntegrity(format!(
            "{slug:?} cannot be used as a directory name"
        )));
    }
    Ok(())
}

async fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| ArchiveError::fs(path, e))
}

async fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents)
        .await
        .map_err(|e| ArchiveError::fs(path, e))
}
