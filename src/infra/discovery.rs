//! Own-address discovery.
//!
//! Minimal services that only echo the caller's public address. They are the
//! last resort for a self-lookup when every enrichment provider failed, for
//! example because a content blocker intercepts all geolocation hosts.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::domain::{ExternalServiceError, HttpFetcher};

/// Services in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryService {
    /// `{"ip": "..."}` from api.ipify.org
    Ipify,
    /// `key=value` lines from Cloudflare's trace endpoint
    CloudflareTrace,
}

impl DiscoveryService {
    pub const CHAIN: [DiscoveryService; 2] = [Self::Ipify, Self::CloudflareTrace];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ipify => "ipify",
            Self::CloudflareTrace => "cloudflare-trace",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Ipify => "https://api.ipify.org",
            Self::CloudflareTrace => "https://www.cloudflare.com",
        }
    }

    #[must_use]
    pub fn request_url(&self, base_url: &str) -> String {
        let base_url = base_url.trim_end_matches('/');
        match self {
            Self::Ipify => format!("{}/?format=json", base_url),
            Self::CloudflareTrace => format!("{}/cdn-cgi/trace", base_url),
        }
    }

    /// Pull the address out of a response body.
    pub fn extract_address(&self, body: &str) -> Result<String, ExternalServiceError> {
        let address = match self {
            Self::Ipify => {
                #[derive(Deserialize)]
                struct IpifyResponse {
                    ip: Option<String>,
                }
                let response: IpifyResponse = serde_json::from_str(body)
                    .map_err(|e| ExternalServiceError::ParseError(format!("ipify: {}", e)))?;
                response.ip.unwrap_or_default()
            }
            Self::CloudflareTrace => body
                .lines()
                .find_map(|line| line.strip_prefix("ip="))
                .unwrap_or_default()
                .to_string(),
        };

        let address = address.trim();
        if address.is_empty() {
            return Err(ExternalServiceError::ParseError(format!(
                "{}: no address in response",
                self.name()
            )));
        }
        Ok(address.to_string())
    }
}

/// Outcome of a discovery run. Never an error: failures are folded in.
#[derive(Debug, Clone, PartialEq)]
pub enum Discovery {
    Found {
        address: String,
        service: &'static str,
    },
    Unavailable {
        /// Most recent failure, consulted when classifying a terminal error
        last_error: Option<ExternalServiceError>,
    },
}

/// Runs the discovery chain against an [`HttpFetcher`]
pub struct OwnAddressResolver {
    fetcher: Arc<dyn HttpFetcher>,
    services: Vec<(DiscoveryService, String)>,
}

impl OwnAddressResolver {
    pub fn new(fetcher: Arc<dyn HttpFetcher>) -> Self {
        let services = DiscoveryService::CHAIN
            .iter()
            .map(|service| (*service, service.default_base_url().to_string()))
            .collect();
        Self { fetcher, services }
    }

    /// Use custom hosts, e.g. a local mock server.
    pub fn with_services(
        fetcher: Arc<dyn HttpFetcher>,
        services: Vec<(DiscoveryService, String)>,
    ) -> Self {
        Self { fetcher, services }
    }

    #[instrument(skip(self))]
    pub async fn discover(&self) -> Discovery {
        let mut last_error = None;

        for (service, base_url) in &self.services {
            match self.try_service(*service, base_url).await {
                Ok(address) => {
                    info!(service = service.name(), address = %address, "Own address discovered");
                    return Discovery::Found {
                        address,
                        service: service.name(),
                    };
                }
                Err(e) => {
                    warn!(service = service.name(), error = %e, "Address discovery failed");
                    last_error = Some(e);
                }
            }
        }

        debug!("All address discovery services failed");
        Discovery::Unavailable { last_error }
    }

    async fn try_service(
        &self,
        service: DiscoveryService,
        base_url: &str,
    ) -> Result<String, ExternalServiceError> {
        let url = service.request_url(base_url);
        let response = self.fetcher.get(&url, &[]).await?;
        if !response.is_success() {
            return Err(ExternalServiceError::ApiError {
                status_code: response.status,
                message: response.body,
            });
        }
        service.extract_address(&response.body)
    }
}
