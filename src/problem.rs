use crate::client::{LeetCodeClient, Query};
use crate::error::{ArchiveError, Result};
use crate::model::{CodeTemplate, Difficulty, ProblemDetail};
use crate::transport::Transport;
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;

const QUESTION: Query = Query {
    operation: "question",
    text: r#"
query question($slug: String!) {
  question(titleSlug: $slug) {
    title content difficulty
    codeSnippets { lang langSlug code }
  }
}"#,
};

#[derive(Debug, Deserialize)]
struct QuestionData {
    question: Option<RawQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    title: String,
    content: Option<String>,
    difficulty: String,
    code_snippets: Option<Vec<RawSnippet>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnippet {
    lang: String,
    lang_slug: Option<String>,
    code: String,
}

impl RawQuestion {
    fn into_detail(self, slug: &str) -> Result<ProblemDetail> {
        let difficulty = Difficulty::from_str(&self.difficulty).map_err(|_| {
            ArchiveError::DataIntegrity(format!(
                "{slug}: unknown difficulty {:?}",
                self.difficulty
            ))
        })?;
        let code_templates = self
            .code_snippets
            .unwrap_or_default()
            .into_iter()
            .map(|s| CodeTemplate {
                language: s.lang_slug.unwrap_or(s.lang),
                code: s.code,
            })
            .collect();

        Ok(ProblemDetail {
            slug: slug.to_string(),
            title: self.title,
            difficulty,
            description_html: self.content.unwrap_or_default(),
            code_templates,
        })
    }
}

impl<T: Transport> LeetCodeClient<T> {
    pub async fn get_problem(&self, slug: &str, session: &str) -> Result<ProblemDetail> {
        let data: QuestionData = self
            .query(QUESTION, json!({ "slug": slug }), session)
            .await?;
        data.question
            .ok_or_else(|| ArchiveError::api(200, format!("unknown problem {slug:?}")))?
            .into_detail(slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfigBuilder;
    use crate::transport::mock::{data, MockTransport};

    fn client(transport: MockTransport) -> LeetCodeClient<MockTransport> {
        LeetCodeClient::with_transport(transport, &ClientConfigBuilder::default().build().unwrap())
    }

    #[tokio::test]
    async fn problem_keeps_template_order() {
        let client = client(MockTransport::new(|req| {
            assert_eq!(req.variables["slug"], "two-sum");
            data(json!({ "question": {
                "title": "Two Sum",
                "content": "<p>Given an array</p>",
                "difficulty": "Easy",
                "codeSnippets": [
                    { "lang": "C++", "langSlug": "cpp", "code": "class Solution {};" },
                    { "lang": "Python3", "langSlug": "python3", "code": "class Solution:" },
                ],
            }}))
        }));

        let problem = client.get_problem("two-sum", "t").await.unwrap();

        assert_eq!(problem.slug, "two-sum");
        assert_eq!(problem.title, "Two Sum");
        assert_eq!(problem.difficulty, Difficulty::Easy);
        let langs: Vec<_> = problem.code_templates.iter().map(|t| t.language.as_str()).collect();
        assert_eq!(langs, vec!["cpp", "python3"]);
    }

    #[tokio::test]
    async fn paid_only_problem_has_empty_description_and_no_templates() {
        let client = client(MockTransport::new(|_| {
            data(json!({ "question": {
                "title": "Locked",
                "content": null,
                "difficulty": "Hard",
                "codeSnippets": null,
            }}))
        }));

        let problem = client.get_problem("locked", "t").await.unwrap();

        assert!(problem.description_html.is_empty());
        assert!(problem.code_templates.is_empty());
    }

    #[tokio::test]
    async fn unknown_slug_is_api_error() {
        let client = client(MockTransport::new(|_| data(json!({ "question": null }))));

        let err = client.get_problem("no-such-problem", "t").await.unwrap_err();
        assert!(matches!(err, ArchiveError::Api { .. }));
    }

    #[tokio::test]
    async fn unknown_difficulty_is_data_integrity_error() {
        let client = client(MockTransport::new(|_| {
            data(json!({ "question": {
                "title": "Odd",
                "content": "",
                "difficulty": "Legendary",
                "codeSnippets": [],
            }}))
        }));

        let err = client.get_problem("odd", "t").await.unwrap_err();
        assert!(matches!(err, ArchiveError::DataIntegrity(_)));
    }
}
