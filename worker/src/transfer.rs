//! Thin HTTP I/O boundary.
//!
//! `TransferClient` is the only place the worker talks HTTP: fetching source
//! files and delivering webhook callbacks. Calls fail on non-success status
//! codes and carry per-call timeouts. No retry logic lives here; resilience
//! is a caller concern.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
}

/// Connection-pooled HTTP client shared by all in-flight jobs.
#[derive(Clone)]
pub struct TransferClient {
    client: Client,
    fetch_timeout: Duration,
    post_timeout: Duration,
}

impl TransferClient {
    /// Create the shared client. `fetch_timeout` applies to downloads,
    /// `post_timeout` to webhook deliveries.
    pub fn new(fetch_timeout: Duration, post_timeout: Duration) -> Result<Self, TransferError> {
        let client = Client::builder().pool_max_idle_per_host(100).build()?;

        Ok(Self {
            client,
            fetch_timeout,
            post_timeout,
        })
    }

    /// Fetch the raw bytes behind `url`.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransferError> {
        let response = match self.client.get(url).timeout(self.fetch_timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                if e.is_timeout() {
                    error!(
                        url = %url,
                        timeout_seconds = self.fetch_timeout.as_secs_f64(),
                        "transfer_fetch_timeout"
                    );
                } else {
                    error!(url = %url, error = %e, "transfer_fetch_error");
                }
                return Err(TransferError::Request(e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            error!(url = %url, status_code = status.as_u16(), "transfer_fetch_bad_status");
            return Err(TransferError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;

        info!(url = %url, body_length = bytes.len(), "transfer_fetch_complete");

        Ok(bytes.to_vec())
    }

    /// POST `body` to `url` with the given headers.
    pub async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: &[(&str, String)],
    ) -> Result<(), TransferError> {
        let body_length = body.len();

        let mut request = self.client.post(url).timeout(self.post_timeout).body(body);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                if e.is_timeout() {
                    error!(
                        url = %url,
                        timeout_seconds = self.post_timeout.as_secs_f64(),
                        "transfer_post_timeout"
                    );
                } else {
                    error!(url = %url, error = %e, "transfer_post_error");
                }
                return Err(TransferError::Request(e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            error!(url = %url, status_code = status.as_u16(), "transfer_post_bad_status");
            return Err(TransferError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        info!(
            url = %url,
            status_code = status.as_u16(),
            body_length = body_length,
            "transfer_post_complete"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client() -> TransferClient {
        TransferClient::new(Duration::from_secs(5), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/file"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"file contents".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let bytes = test_client()
            .fetch(&format!("{}/file", server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, b"file contents");
    }

    #[tokio::test]
    async fn test_fetch_fails_on_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = test_client().fetch(&format!("{}/missing", server.uri())).await;
        match result {
            Err(TransferError::Status { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected status error, got {:?}", other.map(|b| b.len())),
        }
    }

    #[tokio::test]
    async fn test_post_sends_body_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("x-signature", "abc123"))
            .and(body_bytes(b"{\"ok\":true}".to_vec()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        test_client()
            .post(
                &format!("{}/hook", server.uri()),
                b"{\"ok\":true}".to_vec(),
                &[("x-signature", "abc123".to_string())],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_post_fails_on_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = test_client()
            .post(&format!("{}/hook", server.uri()), Vec::new(), &[])
            .await;
        assert!(matches!(
            result,
            Err(TransferError::Status { status: 500, .. })
        ));
    }
}
