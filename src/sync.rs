use crate::archive::{ArchiveWriter, ProblemReport, SubmissionFailure};
use crate::client::LeetCodeClient;
use crate::error::{ArchiveError, Result};
use crate::model::{RunSummary, SubmissionRecord, SummaryEntry};
use crate::transport::Transport;
use derive_builder::Builder;
use futures::{stream, StreamExt};
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use strum::Display;
use tokio::fs;
use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Builder)]
pub struct SyncOptions {
    #[builder(setter(into), default = "PathBuf::from(\"leetcode\")")]
    pub base_dir: PathBuf,
    #[builder(default = "50")]
    pub max_submissions: usize,
    #[builder(default = "true")]
    pub only_accepted: bool,
    /// Lowercase language identifiers, e.g. `python3`, `cpp`.
    #[builder(default = "vec![\"python3\".to_string()]")]
    pub languages: Vec<String>,
    /// Skip every slug that already has an entry under `base_dir`.
    #[builder(default)]
    pub incremental: bool,
    /// Problems processed at the same time. Outbound requests are capped
    /// separately by the client.
    #[builder(default = "1")]
    pub concurrency: usize,
    #[builder(default)]
    pub timeout: Option<Duration>,
}

/// Cooperative stop signal, checked before listing and before each problem.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Interruption {
    #[strum(serialize = "cancelled")]
    Cancelled,
    #[strum(serialize = "timed out")]
    TimedOut,
}

#[derive(Debug)]
pub struct ProblemFailure {
    pub slug: String,
    pub error: ArchiveError,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    /// Submissions returned by the listing, before filtering.
    pub retrieved: usize,
    pub summary: RunSummary,
    pub failures: Vec<ProblemFailure>,
    pub submission_failures: Vec<(String, SubmissionFailure)>,
    pub submissions_written: usize,
    pub skipped_existing: Vec<String>,
    pub not_started: Vec<String>,
    pub interrupted: Option<Interruption>,
}

impl SyncReport {
    /// An interrupted run that saved nothing leaves the previous index alone.
    pub fn should_write_index(&self) -> bool {
        self.interrupted.is_none() || !self.summary.is_empty()
    }
}

enum Outcome {
    NotStarted(Interruption),
    Finished(Result<(SummaryEntry, ProblemReport)>),
}

/// Drop non-accepted records when asked, then group by slug. Slugs keep the
/// order of their first appearance and each group keeps listing order.
pub fn group_by_slug(
    records: Vec<SubmissionRecord>,
    only_accepted: bool,
) -> Vec<(String, Vec<SubmissionRecord>)> {
    let mut groups: Vec<(String, Vec<SubmissionRecord>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        if only_accepted && !record.status.is_accepted() {
            continue;
        }
        match index.get(&record.problem_slug) {
            Some(&i) => groups[i].1.push(record),
            None => {
                index.insert(record.problem_slug.clone(), groups.len());
                groups.push((record.problem_slug.clone(), vec![record]));
            }
        }
    }
    groups
}

/// Names of everything directly under `base_dir`; empty when it does not exist.
pub async fn existing_entries(base_dir: &Path) -> Result<HashSet<String>> {
    let mut entries = match fs::read_dir(base_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(e) => return Err(ArchiveError::fs(base_dir, e)),
    };

    let mut names = HashSet::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ArchiveError::fs(base_dir, e))?
    {
        names.insert(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

/// One archive run: list, filter, group, skip what is already archived, then
/// fetch and write each remaining problem.
///
/// Only a failed listing (or an unreadable `base_dir` in incremental mode)
/// fails the run. Anything that goes wrong inside one problem is recorded in
/// [`SyncReport::failures`] and the run moves on.
pub async fn run<T: Transport>(
    client: &LeetCodeClient<T>,
    session: &str,
    options: &SyncOptions,
    cancel: &CancelToken,
) -> Result<SyncReport> {
    let deadline = options.timeout.map(|t| Instant::now() + t);
    let should_stop = || {
        if cancel.is_cancelled() {
            Some(Interruption::Cancelled)
        } else if deadline.is_some_and(|d| Instant::now() >= d) {
            Some(Interruption::TimedOut)
        } else {
            None
        }
    };

    let mut report = SyncReport::default();
    if let Some(reason) = should_stop() {
        report.interrupted = Some(reason);
        return Ok(report);
    }

    let records = client
        .list_submissions(session, options.max_submissions)
        .await?;
    report.retrieved = records.len();
    info!(count = records.len(), "retrieved submissions");

    let mut groups = group_by_slug(records, options.only_accepted);
    if options.incremental {
        let existing = existing_entries(&options.base_dir).await?;
        groups.retain(|(slug, _)| {
            let keep = !existing.contains(slug);
            if !keep {
                report.skipped_existing.push(slug.clone());
            }
            keep
        });
    }
    info!(
        problems = groups.len(),
        skipped = report.skipped_existing.len(),
        "processing problems"
    );

    let writer = ArchiveWriter::new(&options.base_dir, &options.languages);
    let writer = &writer;
    let outcomes: Vec<(String, Outcome)> = stream::iter(groups)
        .map(|(slug, submissions)| async move {
            if let Some(reason) = should_stop() {
                return (slug, Outcome::NotStarted(reason));
            }
            let result = sync_problem(client, session, writer, &slug, &submissions).await;
            match &result {
                Ok(_) => info!(%slug, "problem saved"),
                Err(e) => warn!(%slug, "problem failed: {e}"),
            }
            (slug, Outcome::Finished(result))
        })
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    for (slug, outcome) in outcomes {
        match outcome {
            Outcome::NotStarted(reason) => {
                report.interrupted.get_or_insert(reason);
                report.not_started.push(slug);
            }
            Outcome::Finished(Ok((entry, problem))) => {
                report.submissions_written += problem.written.len();
                report
                    .submission_failures
                    .extend(problem.failures.into_iter().map(|f| (slug.clone(), f)));
                report.summary.push(entry);
            }
            Outcome::Finished(Err(error)) => {
                report.failures.push(ProblemFailure { slug, error });
            }
        }
    }

    Ok(report)
}

async fn sync_problem<T: Transport>(
    client: &LeetCodeClient<T>,
    session: &str,
    writer: &ArchiveWriter,
    slug: &str,
    submissions: &[SubmissionRecord],
) -> Result<(SummaryEntry, ProblemReport)> {
    let problem = client.get_problem(slug, session).await?;
    let report = writer
        .write_problem(slug, &problem, submissions, |id| {
            client.get_submission_code(id, session)
        })
        .await?;

    let entry = SummaryEntry {
        slug: slug.to_string(),
        title: problem.title,
        difficulty: problem.difficulty,
    };
    Ok((entry, report))
}
