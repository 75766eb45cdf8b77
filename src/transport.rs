//! HTTP transport behind the price client
//!
//! The client talks to the API through the [`ApiTransport`] trait rather
//! than through `reqwest` directly, so tests can script responses without a
//! network. [`HttpTransport`] is the real implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde_json::Value;

use crate::constants::{COINGECKO_API_URL, REQUEST_TIMEOUT_SECS, USER_AGENT};
use crate::error::FetchError;

/// A GET-with-query source of JSON documents
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Fetches `path` relative to the API root and returns the parsed JSON
    /// body.
    async fn get_json(&self, path: &str, query: &[(String, String)])
        -> Result<Value, FetchError>;
}

/// Transport backed by a shared `reqwest` client
///
/// Rate limiting is surfaced as [`FetchError::RateLimited`] whether it
/// arrives as an HTTP 429 or embedded in a 200 body, and timeouts are
/// separated from other connection errors.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport rooted at the public CoinGecko API.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_base_url(COINGECKO_API_URL)
    }

    /// Creates a transport rooted at a custom base URL (proxies, pro tiers).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(FetchError::Network)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

/// CoinGecko reports throttling inside a 200 body as
/// `{"status": {"error_code": 429, "error_message": "..."}}`.
fn reject_embedded_rate_limit(value: Value) -> Result<Value, FetchError> {
    if value.pointer("/status/error_code").and_then(Value::as_i64) == Some(429) {
        let message = value
            .pointer("/status/error_message")
            .and_then(Value::as_str)
            .unwrap_or("rate limited")
            .to_string();
        return Err(FetchError::RateLimited(message));
    }
    Ok(value)
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "sending API request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(FetchError::RateLimited("HTTP 429".to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.text().await.map_err(FetchError::from_reqwest)?;
        let value: Value = serde_json::from_str(&body).map_err(|e| {
            FetchError::InvalidResponse(format!("failed to parse response JSON: {e}"))
        })?;

        reject_embedded_rate_limit(value)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted transport for unit tests

    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use super::*;

    /// Transport that replays queued responses per path and logs every call
    ///
    /// A path with no queued response answers with an HTTP 404 error, so
    /// tests fail loudly on unexpected requests.
    #[derive(Default)]
    pub struct MockTransport {
        responses: Mutex<HashMap<String, VecDeque<Result<Value, FetchError>>>>,
        calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_response(&self, path: &str, response: Result<Value, FetchError>) {
            self.responses
                .lock()
                .unwrap()
                .entry(path.to_string())
                .or_default()
                .push_back(response);
        }

        pub fn push_ok(&self, path: &str, body: Value) {
            self.push_response(path, Ok(body));
        }

        pub fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ApiTransport for MockTransport {
        async fn get_json(
            &self,
            path: &str,
            query: &[(String, String)],
        ) -> Result<Value, FetchError> {
            self.calls
                .lock()
                .unwrap()
                .push((path.to_string(), query.to_vec()));

            self.responses
                .lock()
                .unwrap()
                .get_mut(path)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| {
                    Err(FetchError::Api {
                        status: 404,
                        body: format!("no scripted response for {path}"),
                    })
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_embedded_rate_limit_is_rejected() {
        let body = json!({
            "status": {
                "error_code": 429,
                "error_message": "You've exceeded the Rate Limit."
            }
        });

        match reject_embedded_rate_limit(body) {
            Err(FetchError::RateLimited(msg)) => {
                assert_eq!(msg, "You've exceeded the Rate Limit.");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_embedded_rate_limit_without_message_uses_placeholder() {
        let body = json!({"status": {"error_code": 429}});

        match reject_embedded_rate_limit(body) {
            Err(FetchError::RateLimited(msg)) => assert_eq!(msg, "rate limited"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_ordinary_payloads_pass_through() {
        let object = json!({"bitcoin": {"usd": 50000.0}});
        assert_eq!(reject_embedded_rate_limit(object.clone()).unwrap(), object);

        let array = json!([{"id": "bitcoin", "symbol": "btc", "name": "Bitcoin"}]);
        assert_eq!(reject_embedded_rate_limit(array.clone()).unwrap(), array);

        let other_status = json!({"status": {"error_code": 500}});
        assert_eq!(
            reject_embedded_rate_limit(other_status.clone()).unwrap(),
            other_status
        );
    }

    #[tokio::test]
    async fn test_mock_replays_responses_in_order() {
        let mock = MockTransport::new();
        mock.push_ok("/ping", json!({"n": 1}));
        mock.push_ok("/ping", json!({"n": 2}));

        let first = mock.get_json("/ping", &[]).await.unwrap();
        let second = mock.get_json("/ping", &[]).await.unwrap();

        assert_eq!(first, json!({"n": 1}));
        assert_eq!(second, json!({"n": 2}));
    }

    #[tokio::test]
    async fn test_mock_records_calls_with_query() {
        let mock = MockTransport::new();
        mock.push_ok("/simple/price", json!({}));

        let query = vec![("ids".to_string(), "bitcoin".to_string())];
        mock.get_json("/simple/price", &query).await.unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "/simple/price");
        assert_eq!(calls[0].1, query);
    }

    #[tokio::test]
    async fn test_mock_errors_on_unscripted_path() {
        let mock = MockTransport::new();

        let result = mock.get_json("/unknown", &[]).await;

        assert!(matches!(result, Err(FetchError::Api { status: 404, .. })));
        assert_eq!(mock.call_count(), 1);
    }
}
