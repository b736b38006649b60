use crate::error::{ArchiveError, Result};
use crate::retry::RetryConfig;
use crate::transport::{GraphqlRequest, RawResponse, ReqwestTransport, Transport, DEFAULT_ENDPOINT};
use backon::Retryable;
use derive_builder::Builder;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const MAX_ERROR_BODY: usize = 200;

/// A named GraphQL document.
#[derive(Debug, Clone, Copy)]
pub struct Query {
    pub operation: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    #[builder(setter(into), default = "DEFAULT_ENDPOINT.to_string()")]
    pub endpoint: String,
    #[builder(default = "Duration::from_secs(30)")]
    pub request_timeout: Duration,
    /// Global cap on requests in flight at once, across all workers.
    #[builder(default = "1")]
    pub max_in_flight: usize,
    #[builder(default)]
    pub requests_per_second: Option<u32>,
    #[builder(default)]
    pub retry: RetryConfig,
}

pub struct LeetCodeClient<T = ReqwestTransport> {
    transport: T,
    permits: Semaphore,
    limiter: Option<DirectRateLimiter>,
    retry: RetryConfig,
}

impl LeetCodeClient<ReqwestTransport> {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.endpoint.clone(), config.request_timeout)?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: Transport> LeetCodeClient<T> {
    pub fn with_transport(transport: T, config: &ClientConfig) -> Self {
        let limiter = config
            .requests_per_second
            .and_then(NonZeroU32::new)
            .map(|rps| RateLimiter::direct(Quota::per_second(rps)));
        Self {
            transport,
            permits: Semaphore::new(config.max_in_flight.max(1)),
            limiter,
            retry: config.retry.clone(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one query and return its `data` object.
    pub async fn execute(&self, query: Query, variables: Value, session: &str) -> Result<Value> {
        let request = GraphqlRequest {
            operation: query.operation,
            query: query.text,
            variables,
            session: session.to_string(),
        };
        debug!(operation = query.operation, variables = %request.variables, "graphql request");

        let response = (|| self.send_once(&request))
            .retry(self.retry.clone().into_backoff())
            .when(ArchiveError::is_retryable)
            .notify(|err, after| {
                debug!(operation = query.operation, ?after, "retrying after {err}");
            })
            .await?;

        extract_data(response)
    }

    /// Like [`execute`](Self::execute), deserializing `data` into `R`. A payload
    /// that does not have the expected shape is an API error.
    pub async fn query<R: DeserializeOwned>(
        &self,
        query: Query,
        variables: Value,
        session: &str,
    ) -> Result<R> {
        let data = self.execute(query, variables, session).await?;
        serde_json::from_value(data).map_err(|e| {
            ArchiveError::api(200, format!("unexpected {} payload: {e}", query.operation))
        })
    }

    async fn send_once(&self, request: &GraphqlRequest) -> Result<RawResponse> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ArchiveError::Transport("request permits closed".into()))?;
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        self.transport.send(request).await
    }
}

fn extract_data(response: RawResponse) -> Result<Value> {
    let status = response.status;
    if !response.is_success() {
        return Err(ArchiveError::api(status, truncate(&response.body)));
    }

    let mut doc: Value = serde_json::from_str(&response.body)
        .map_err(|e| ArchiveError::api(status, format!("malformed response: {e}")))?;
    match doc.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => Ok(data),
        _ => {
            let message = graphql_errors(&doc).unwrap_or_else(|| "response has no data".into());
            Err(ArchiveError::api(status, message))
        }
    }
}

fn graphql_errors(doc: &Value) -> Option<String> {
    let messages = doc
        .get("errors")?
        .as_array()?
        .iter()
        .filter_map(|e| e.get("message").and_then(Value::as_str))
        .collect::<Vec<_>>();
    (!messages.is_empty()).then(|| messages.join("; "))
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{data, MockTransport};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const PING: Query = Query {
        operation: "ping",
        text: "query ping { ping }",
    };

    fn fast_config() -> ClientConfig {
        ClientConfigBuilder::default()
            .retry(RetryConfig::new(
                Duration::from_millis(1),
                Duration::from_millis(5),
                2,
            ))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn execute_returns_data_and_forwards_session() {
        let transport = MockTransport::new(|_| data(json!({ "ping": "pong" })));
        let client = LeetCodeClient::with_transport(transport, &fast_config());

        let value = client.execute(PING, json!({ "x": 1 }), "token-123").await.unwrap();

        assert_eq!(value, json!({ "ping": "pong" }));
        let requests = client.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].session, "token-123");
        assert_eq!(requests[0].variables, json!({ "x": 1 }));
    }

    #[tokio::test]
    async fn non_success_status_is_api_error_without_retry() {
        let transport = MockTransport::new(|_| {
            Ok(RawResponse {
                status: 403,
                body: "forbidden".into(),
            })
        });
        let client = LeetCodeClient::with_transport(transport, &fast_config());

        let err = client.execute(PING, json!({}), "t").await.unwrap_err();

        assert!(matches!(err, ArchiveError::Api { status: 403, ref message } if message == "forbidden"));
        assert_eq!(client.transport().count("ping"), 1);
    }

    #[tokio::test]
    async fn missing_data_is_api_error_with_graphql_messages() {
        let transport = MockTransport::new(|_| {
            Ok(RawResponse::ok(
                json!({ "data": null, "errors": [{ "message": "That question does not exist" }] })
                    .to_string(),
            ))
        });
        let client = LeetCodeClient::with_transport(transport, &fast_config());

        let err = client.execute(PING, json!({}), "t").await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "api error (status 200): That question does not exist"
        );
    }

    #[tokio::test]
    async fn malformed_body_is_api_error() {
        let transport = MockTransport::new(|_| Ok(RawResponse::ok("<html>login</html>")));
        let client = LeetCodeClient::with_transport(transport, &fast_config());

        let err = client.execute(PING, json!({}), "t").await.unwrap_err();
        assert!(matches!(err, ArchiveError::Api { status: 200, .. }));
    }

    #[tokio::test]
    async fn transport_failures_are_retried_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let transport = MockTransport::new(move |_| {
            if seen.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ArchiveError::Transport("connection reset".into()))
            } else {
                data(json!({ "ping": "pong" }))
            }
        });
        let client = LeetCodeClient::with_transport(transport, &fast_config());

        let value = client.execute(PING, json!({}), "t").await.unwrap();

        assert_eq!(value["ping"], "pong");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let transport =
            MockTransport::new(|_| Err(ArchiveError::Transport("connection refused".into())));
        let client = LeetCodeClient::with_transport(transport, &fast_config());

        let err = client.execute(PING, json!({}), "t").await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(client.transport().count("ping"), 3);
    }

    #[tokio::test]
    async fn query_rejects_payload_of_wrong_shape() {
        #[derive(Debug, serde::Deserialize)]
        struct Ping {
            #[allow(dead_code)]
            ping: u32,
        }
        let transport = MockTransport::new(|_| data(json!({ "ping": "pong" })));
        let client = LeetCodeClient::with_transport(transport, &fast_config());

        let err = client.query::<Ping>(PING, json!({}), "t").await.unwrap_err();
        assert!(matches!(err, ArchiveError::Api { .. }));
    }

    struct SlowTransport {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Transport for SlowTransport {
        async fn send(&self, _request: &GraphqlRequest) -> Result<RawResponse> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(RawResponse::ok(r#"{"data":{}}"#))
        }
    }

    #[tokio::test]
    async fn in_flight_requests_are_capped() {
        let transport = SlowTransport {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };
        let config = ClientConfigBuilder::default().max_in_flight(2).build().unwrap();
        let client = LeetCodeClient::with_transport(transport, &config);

        let calls = (0..6).map(|_| client.execute(PING, json!({}), "t"));
        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(client.transport().peak.load(Ordering::SeqCst), 2);
    }
}
