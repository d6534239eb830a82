//! Error taxonomy for the lookup pipeline.
//!
//! Only [`LookupError`] crosses the core boundary on a failed lookup. The
//! [`ExternalServiceError`] variants describe single-request failures and are
//! recovered inside the cascade.

use thiserror::Error;

/// Top-level application error
#[derive(Debug, Error)]
pub enum AppError {
    #[error("History storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Failure of a single outbound request or a single provider response
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExternalServiceError {
    /// The request never produced an HTTP response (DNS, refused connection,
    /// request intercepted by a blocker).
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The provider answered but the answer is unusable.
    #[error("{provider} rejected the lookup: {reason}")]
    Rejected {
        provider: &'static str,
        reason: String,
    },

    #[error("Service not configured: {0}")]
    Configuration(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl ExternalServiceError {
    /// True when the failure happened below HTTP, i.e. the request could not
    /// be delivered at all. Timeouts count as transport failures.
    #[must_use]
    pub fn is_network_failure(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}

/// Guidance shown when every outbound request was cut off
pub const BLOCKED_NETWORK_GUIDANCE: &str = "Every IP intelligence node was unreachable from this network. \
     This is usually caused by an ad-blocking or privacy extension, or a strict firewall, \
     blocking requests to geolocation services. Allow the lookup hosts or disable the \
     blocker for this page, then retry.";

/// Guidance shown when the cascade exhausted for any other reason
pub const NODE_UNREACHABLE_GUIDANCE: &str =
    "Could not retrieve IP intelligence. Please check the address and your connection, then try again.";

/// Terminal lookup errors surfaced to the presentation layer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("{message}")]
    BlockedNetwork { message: String },

    #[error("{message}")]
    NodeUnreachable { message: String },
}

impl LookupError {
    #[must_use]
    pub fn blocked_network() -> Self {
        Self::BlockedNetwork {
            message: BLOCKED_NETWORK_GUIDANCE.to_string(),
        }
    }

    #[must_use]
    pub fn node_unreachable() -> Self {
        Self::NodeUnreachable {
            message: NODE_UNREACHABLE_GUIDANCE.to_string(),
        }
    }

    /// Classify an exhausted cascade from the most recent recorded failure.
    #[must_use]
    pub fn classify(last_failure: Option<&ExternalServiceError>) -> Self {
        match last_failure {
            Some(err) if err.is_network_failure() => Self::blocked_network(),
            _ => Self::node_unreachable(),
        }
    }

    /// User-facing message
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::BlockedNetwork { message } | Self::NodeUnreachable { message } => message,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error("Could not determine a default location for {0}")]
    MissingDefault(&'static str),

    #[error("HTTP client could not be built: {0}")]
    HttpClient(String),
}
