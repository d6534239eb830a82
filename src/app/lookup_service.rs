//! Lookup orchestration.
//!
//! Implements the provider cascade:
//! 1. Normalize the query (empty means "look up the caller")
//! 2. Try each provider in order, stop at the first usable record
//! 3. For self-lookups only, fall back to own-address discovery
//! 4. Classify total failure as blocked network or unreachable node
//!
//! Each provider gets exactly one attempt per call. Nothing is cached and no
//! state survives between calls.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::domain::{ExternalServiceError, HttpFetcher, IpRecord, LookupError};
use crate::infra::discovery::{Discovery, OwnAddressResolver};
use crate::infra::providers::{JSON_HEADERS, ProviderEndpoint};

/// Trim whitespace, drop a leading `http://`/`https://` and trailing slashes.
#[must_use]
pub fn normalize_query(query: Option<&str>) -> String {
    let trimmed = query.unwrap_or_default().trim();
    let without_scheme = ["https://", "http://"]
        .iter()
        .find_map(|scheme| {
            trimmed
                .get(..scheme.len())
                .filter(|prefix| prefix.eq_ignore_ascii_case(scheme))
                .map(|_| &trimmed[scheme.len()..])
        })
        .unwrap_or(trimmed);
    without_scheme.trim_end_matches('/').trim().to_string()
}

/// Service resolving a query into a canonical [`IpRecord`]
pub struct LookupService {
    fetcher: Arc<dyn HttpFetcher>,
    providers: Vec<ProviderEndpoint>,
    resolver: OwnAddressResolver,
}

impl LookupService {
    /// Production cascade and discovery chain over `fetcher`.
    pub fn new(fetcher: Arc<dyn HttpFetcher>) -> Self {
        let resolver = OwnAddressResolver::new(Arc::clone(&fetcher));
        Self {
            fetcher,
            providers: ProviderEndpoint::default_cascade(),
            resolver,
        }
    }

    /// Custom provider endpoints and resolver, e.g. against mock servers.
    pub fn with_endpoints(
        fetcher: Arc<dyn HttpFetcher>,
        providers: Vec<ProviderEndpoint>,
        resolver: OwnAddressResolver,
    ) -> Self {
        Self {
            fetcher,
            providers,
            resolver,
        }
    }

    /// Resolve a query. `None` or a blank query looks up the caller.
    #[instrument(skip(self), fields(query = ?query))]
    pub async fn resolve(&self, query: Option<&str>) -> Result<IpRecord, LookupError> {
        let query = normalize_query(query);
        let is_self_lookup = query.is_empty();
        if !is_self_lookup && query.parse::<std::net::IpAddr>().is_err() {
            debug!(query = %query, "Query is not a literal IP address; leaving validation to providers");
        }

        let mut last_error: Option<ExternalServiceError> = None;

        for endpoint in &self.providers {
            match self.try_provider(endpoint, &query).await {
                Ok(record) => {
                    info!(
                        provider = endpoint.adapter.name(),
                        address = %record.address,
                        "Lookup resolved"
                    );
                    return Ok(record);
                }
                Err(e) => {
                    warn!(provider = endpoint.adapter.name(), error = %e, "Provider failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        if is_self_lookup {
            info!("All providers failed for self-lookup, falling back to address discovery");
            match self.resolver.discover().await {
                Discovery::Found { address, service } => {
                    info!(address = %address, service, "Returning restricted record");
                    return Ok(IpRecord::restricted(address, service));
                }
                Discovery::Unavailable {
                    last_error: discovery_error,
                } => {
                    if discovery_error.is_some() {
                        last_error = discovery_error;
                    }
                }
            }
        }

        let error = LookupError::classify(last_error.as_ref());
        warn!(last_error = ?last_error, terminal = ?error, "Lookup exhausted every path");
        Err(error)
    }

    async fn try_provider(
        &self,
        endpoint: &ProviderEndpoint,
        query: &str,
    ) -> Result<IpRecord, ExternalServiceError> {
        let url = endpoint.url(query);
        debug!(provider = endpoint.adapter.name(), url = %url, "Querying provider");

        let response = self.fetcher.get(&url, JSON_HEADERS).await?;
        if !response.is_success() {
            return Err(ExternalServiceError::ApiError {
                status_code: response.status,
                message: response.body,
            });
        }
        endpoint.adapter.normalize(&response.body, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_query_strips_scheme_and_slash() {
        assert_eq!(normalize_query(Some("https://1.2.3.4/")), "1.2.3.4");
        assert_eq!(normalize_query(Some("HTTP://1.2.3.4")), "1.2.3.4");
        assert_eq!(normalize_query(Some("  8.8.8.8  ")), "8.8.8.8");
        assert_eq!(normalize_query(Some("2001:db8::1")), "2001:db8::1");
    }

    #[test]
    fn test_normalize_query_empty_means_self() {
        assert_eq!(normalize_query(None), "");
        assert_eq!(normalize_query(Some("   ")), "");
        assert_eq!(normalize_query(Some("https://")), "");
        assert_eq!(normalize_query(Some("http:///")), "");
    }
}
