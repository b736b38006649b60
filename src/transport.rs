use crate::error::{ArchiveError, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://leetcode.com/graphql";
const REFERER: &str = "https://leetcode.com/problemset/all/";

/// One GraphQL call, fully described. The session token travels with the
/// request so nothing below the caller holds credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphqlRequest {
    pub operation: &'static str,
    pub query: &'static str,
    pub variables: Value,
    pub session: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &GraphqlRequest) -> Result<RawResponse>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    endpoint: String,
}

impl ReqwestTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| ArchiveError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &GraphqlRequest) -> Result<RawResponse> {
        let body = json!({
            "query": request.query,
            "variables": request.variables,
        });
        let resp = self
            .client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, format!("LEETCODE_SESSION={};", request.session))
            .header(header::REFERER, REFERER)
            .json(&body)
            .send()
            .await
            .map_err(|e| ArchiveError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| ArchiveError::Transport(e.to_string()))?;
        Ok(RawResponse { status, body })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range_is_2xx() {
        assert!(RawResponse::ok("{}").is_success());
        assert!(RawResponse { status: 204, body: String::new() }.is_success());
        assert!(!RawResponse { status: 302, body: String::new() }.is_success());
        assert!(!RawResponse { status: 403, body: String::new() }.is_success());
    }
}
