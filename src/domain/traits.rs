//! Domain traits defining contracts for external collaborators.

use async_trait::async_trait;

use super::error::{AppError, ExternalServiceError};
use super::types::{DeviceInfo, LookupHistoryEntry};

/// Raw HTTP response handed to provider adapters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound HTTP GET capability
///
/// Implementations return `Err` only when no response was obtained. Any
/// status code, including 4xx/5xx, is returned as an [`HttpResponse`].
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, ExternalServiceError>;
}

/// Text generation capability used for narrative enrichment
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ExternalServiceError>;
}

/// Persistence for the recent-lookup list
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Load entries, most recent first. A store that was never written is empty.
    async fn load(&self) -> Result<Vec<LookupHistoryEntry>, AppError>;

    /// Replace the stored list
    async fn save(&self, entries: &[LookupHistoryEntry]) -> Result<(), AppError>;

    /// Remove every entry
    async fn clear(&self) -> Result<(), AppError> {
        self.save(&[]).await
    }
}

/// Describes the device the lookup was made from
pub trait DeviceInfoProvider: Send + Sync {
    fn device_info(&self) -> DeviceInfo;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct VecStore(Mutex<Vec<LookupHistoryEntry>>);

    #[async_trait]
    impl HistoryStore for VecStore {
        async fn load(&self) -> Result<Vec<LookupHistoryEntry>, AppError> {
            Ok(self.0.lock().unwrap().clone())
        }

        async fn save(&self, entries: &[LookupHistoryEntry]) -> Result<(), AppError> {
            *self.0.lock().unwrap() = entries.to_vec();
            Ok(())
        }
    }

    #[test]
    fn test_http_response_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(429, "").is_success());
    }

    #[tokio::test]
    async fn test_history_store_default_clear_saves_empty_list() {
        let store = VecStore(Mutex::new(vec![LookupHistoryEntry {
            id: "1".into(),
            address: "1.1.1.1".into(),
            timestamp_display: "now".into(),
            location_summary: "Sydney, Australia".into(),
            threat_level: crate::domain::ThreatLevel::Low,
        }]));
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }
}
