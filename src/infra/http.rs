//! reqwest-backed implementation of [`HttpFetcher`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::domain::{ConfigError, ExternalServiceError, HttpFetcher, HttpResponse};

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 8;

const USER_AGENT: &str = concat!("guardia-ip/", env!("CARGO_PKG_VERSION"));

/// HTTP client used for provider and discovery requests
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    http_client: Client,
    timeout: Duration,
}

impl ReqwestFetcher {
    /// Create a fetcher whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http_client,
            timeout,
        })
    }

    fn classify_error(&self, url: &str, e: reqwest::Error) -> ExternalServiceError {
        if e.is_timeout() {
            warn!(url = %url, timeout_secs = self.timeout.as_secs(), "Request timed out");
            ExternalServiceError::Timeout(format!("{} after {:?}", url, self.timeout))
        } else {
            warn!(url = %url, error = %e, "Request failed before a response was received");
            ExternalServiceError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, ExternalServiceError> {
        debug!(url = %url, "GET");

        let mut request = self.http_client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.classify_error(url, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.classify_error(url, e))?;

        debug!(url = %url, status, bytes = body.len(), "Response received");
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connection_refused_is_network_failure() {
        let fetcher = ReqwestFetcher::new(Duration::from_secs(2)).unwrap();
        // Port 9 on loopback is the discard service and is closed on test hosts.
        let err = fetcher
            .get("http://127.0.0.1:9/json/", &[])
            .await
            .unwrap_err();
        assert!(err.is_network_failure(), "unexpected error: {err:?}");
    }
}
