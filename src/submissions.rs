use crate::client::{LeetCodeClient, Query};
use crate::error::{ArchiveError, Result};
use crate::model::{SubmissionCode, SubmissionRecord, SubmissionStatus};
use crate::transport::Transport;
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use tracing::debug;

pub const PAGE_SIZE: usize = 20;

const SUBMISSION_LIST: Query = Query {
    operation: "submissionList",
    text: r#"
query submissionList($offset: Int!, $limit: Int!) {
  submissionList(offset: $offset, limit: $limit) {
    submissions { id titleSlug lang statusDisplay timestamp }
    hasNext
  }
}"#,
};

const SUBMISSION_DETAILS: Query = Query {
    operation: "submissionDetails",
    text: r#"
query submissionDetails($submissionId: Int!) {
  submissionDetails(submissionId: $submissionId) { code }
}"#,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListData {
    submission_list: SubmissionPage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionPage {
    submissions: Vec<RawSubmission>,
    has_next: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSubmission {
    id: IntLike,
    title_slug: String,
    lang: String,
    status_display: String,
    timestamp: IntLike,
}

/// The API sends ids and timestamps as decimal strings; accept plain numbers too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IntLike {
    Int(i64),
    Str(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailsData {
    submission_details: Option<CodeBody>,
}

#[derive(Debug, Deserialize)]
struct CodeBody {
    code: String,
}

impl IntLike {
    fn parse(&self, field: &str) -> Result<i64> {
        match self {
            IntLike::Int(v) => Ok(*v),
            IntLike::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| ArchiveError::DataIntegrity(format!("{field} is not an integer: {s:?}"))),
        }
    }
}

impl TryFrom<RawSubmission> for SubmissionRecord {
    type Error = ArchiveError;

    fn try_from(raw: RawSubmission) -> Result<Self> {
        let id = raw.id.parse("submission id")?;
        let id = u64::try_from(id)
            .map_err(|_| ArchiveError::DataIntegrity(format!("negative submission id {id}")))?;
        let status = SubmissionStatus::from_str(&raw.status_display)
            .unwrap_or(SubmissionStatus::Other(raw.status_display));
        Ok(SubmissionRecord {
            id,
            problem_slug: raw.title_slug,
            language: raw.lang,
            status,
            timestamp: raw.timestamp.parse("timestamp")?,
        })
    }
}

impl<T: Transport> LeetCodeClient<T> {
    /// Page through the submission history, newest first, returning at most
    /// `max_count` records. Issues at most `ceil(max_count / PAGE_SIZE)` calls
    /// however many pages the server claims to have.
    pub async fn list_submissions(
        &self,
        session: &str,
        max_count: usize,
    ) -> Result<Vec<SubmissionRecord>> {
        let mut records = Vec::with_capacity(max_count.min(1024));
        let mut offset = 0;

        for _ in 0..max_count.div_ceil(PAGE_SIZE) {
            let data: ListData = self
                .query(
                    SUBMISSION_LIST,
                    json!({ "offset": offset, "limit": PAGE_SIZE }),
                    session,
                )
                .await?;
            let page = data.submission_list;
            debug!(offset, received = page.submissions.len(), has_next = page.has_next, "submission page");

            let received = page.submissions.len();
            for raw in page.submissions {
                records.push(SubmissionRecord::try_from(raw)?);
            }
            if !page.has_next || received == 0 || records.len() >= max_count {
                break;
            }
            offset += PAGE_SIZE;
        }

        records.truncate(max_count);
        Ok(records)
    }

    pub async fn get_submission_code(
        &self,
        submission_id: u64,
        session: &str,
    ) -> Result<SubmissionCode> {
        let data: DetailsData = self
            .query(
                SUBMISSION_DETAILS,
                json!({ "submissionId": submission_id }),
                session,
            )
            .await?;
        let body = data.submission_details.ok_or_else(|| {
            ArchiveError::api(200, format!("submission {submission_id} is not available"))
        })?;
        Ok(SubmissionCode {
            submission_id,
            source_text: body.code,
        })
    }
}
