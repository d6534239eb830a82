//! Geolocation provider adapters.
//!
//! Each provider has its own response schema and a mapping into the
//! canonical [`IpRecord`]. The set is closed: [`ProviderAdapter`] names every
//! supported provider and dispatches to its module, so the lookup service
//! never inspects provider-specific shapes itself.
//!
//! # Cascade order
//! [`ProviderAdapter::CASCADE`] lists providers richest schema first:
//! 1. ipwho.is (nested timezone/connection/security objects)
//! 2. ip-api.com (flat, with proxy/hosting/mobile flags)
//! 3. ipapi.co (flat, no security data)

pub mod ip_api;
pub mod ipapi_co;
pub mod ipwhois;

use crate::domain::{ExternalServiceError, IpRecord};

/// Every request asks for JSON explicitly
pub const JSON_HEADERS: &[(&str, &str)] = &[("Accept", "application/json")];

/// Supported enrichment providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderAdapter {
    IpWhoIs,
    IpApi,
    IpApiCo,
}

impl ProviderAdapter {
    /// Providers in the order the cascade tries them
    pub const CASCADE: [ProviderAdapter; 3] = [Self::IpWhoIs, Self::IpApi, Self::IpApiCo];

    pub fn name(&self) -> &'static str {
        match self {
            Self::IpWhoIs => ipwhois::PROVIDER_NAME,
            Self::IpApi => ip_api::PROVIDER_NAME,
            Self::IpApiCo => ipapi_co::PROVIDER_NAME,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::IpWhoIs => ipwhois::DEFAULT_BASE_URL,
            Self::IpApi => ip_api::DEFAULT_BASE_URL,
            Self::IpApiCo => ipapi_co::DEFAULT_BASE_URL,
        }
    }

    /// Build the request URL. An empty `query` asks about the caller.
    #[must_use]
    pub fn request_url(&self, base_url: &str, query: &str) -> String {
        let base_url = base_url.trim_end_matches('/');
        match self {
            Self::IpWhoIs => ipwhois::request_url(base_url, query),
            Self::IpApi => ip_api::request_url(base_url, query),
            Self::IpApiCo => ipapi_co::request_url(base_url, query),
        }
    }

    /// Map a decoded response body into a canonical record, or reject it.
    pub fn normalize(&self, body: &str, query: &str) -> Result<IpRecord, ExternalServiceError> {
        match self {
            Self::IpWhoIs => ipwhois::normalize(body, query),
            Self::IpApi => ip_api::normalize(body, query),
            Self::IpApiCo => ipapi_co::normalize(body, query),
        }
    }
}

impl std::fmt::Display for ProviderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A provider paired with the host it is reached at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoint {
    pub adapter: ProviderAdapter,
    pub base_url: String,
}

impl ProviderEndpoint {
    pub fn new(adapter: ProviderAdapter, base_url: impl Into<String>) -> Self {
        Self {
            adapter,
            base_url: base_url.into(),
        }
    }

    /// The production cascade against each provider's public host
    #[must_use]
    pub fn default_cascade() -> Vec<Self> {
        ProviderAdapter::CASCADE
            .iter()
            .map(|adapter| Self::new(*adapter, adapter.default_base_url()))
            .collect()
    }

    #[must_use]
    pub fn url(&self, query: &str) -> String {
        self.adapter.request_url(&self.base_url, query)
    }
}

// ============================================================================
// SHARED MAPPING HELPERS
// ============================================================================

pub(crate) fn parse_body<T: serde::de::DeserializeOwned>(
    provider: &'static str,
    body: &str,
) -> Result<T, ExternalServiceError> {
    serde_json::from_str(body)
        .map_err(|e| ExternalServiceError::ParseError(format!("{}: {}", provider, e)))
}

pub(crate) fn reject(provider: &'static str, reason: impl Into<String>) -> ExternalServiceError {
    ExternalServiceError::Rejected {
        provider,
        reason: reason.into(),
    }
}

/// Require a non-empty address field.
pub(crate) fn require_address(
    provider: &'static str,
    address: Option<String>,
    query: &str,
) -> Result<String, ExternalServiceError> {
    let Some(address) = address else {
        return Err(reject(
            provider,
            format!("response for '{}' carried no address field", query),
        ));
    };
    let address = address.trim();
    if address.is_empty() {
        return Err(reject(
            provider,
            format!("response for '{}' carried an empty address", query),
        ));
    }
    Ok(address.to_string())
}

/// Trim; map blank to `None`.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `"-07:00"` / `"-0700"` → `"-0700"`
pub(crate) fn normalize_utc_offset(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    raw.replace(':', "")
}

/// Seconds east of UTC → `"+HHMM"`
pub(crate) fn utc_offset_from_seconds(seconds: i64) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.unsigned_abs() / 60;
    format!("{}{:02}{:02}", sign, minutes / 60, minutes % 60)
}

/// Accepts `15169`, `"15169"`, `"AS15169"`, `"as15169 Google LLC"`; returns `"AS15169"`.
pub(crate) fn normalize_asn(raw: &str) -> Option<String> {
    let token = raw.split_whitespace().next()?;
    let digits = token
        .strip_prefix("AS")
        .or_else(|| token.strip_prefix("as"))
        .unwrap_or(token);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("AS{}", digits))
}
