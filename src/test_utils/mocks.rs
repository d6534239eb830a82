//! Mock implementations for testing.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::{
    AppError, DeviceInfo, DeviceInfoProvider, ExternalServiceError, HistoryStore, HttpFetcher,
    HttpResponse, LookupHistoryEntry, NarrativeGenerator,
};

/// Configuration for mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub should_fail: bool,
    pub error_message: Option<String>,
}

impl MockConfig {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
        }
    }

    fn message(&self) -> String {
        self.error_message
            .clone()
            .unwrap_or_else(|| "Mock error".to_string())
    }
}

type Reply = Result<HttpResponse, ExternalServiceError>;

/// Scripted HTTP fetcher.
///
/// Routes match on URL prefix, first registered wins. Unrouted URLs fail
/// with a network error, which is what a content blocker looks like.
#[derive(Default)]
pub struct MockHttpFetcher {
    routes: Mutex<Vec<(String, Reply)>>,
    calls: Mutex<Vec<String>>,
}

impl MockHttpFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer URLs starting with `prefix` with `status` and `body`.
    #[must_use]
    pub fn respond(self, prefix: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .push((prefix.into(), Ok(HttpResponse::new(status, body))));
        self
    }

    /// Answer URLs starting with `prefix` with a JSON body and status 200.
    #[must_use]
    pub fn respond_json(self, prefix: impl Into<String>, body: serde_json::Value) -> Self {
        self.respond(prefix, 200, body.to_string())
    }

    /// Fail URLs starting with `prefix` with `error`.
    #[must_use]
    pub fn fail(self, prefix: impl Into<String>, error: ExternalServiceError) -> Self {
        self.routes.lock().unwrap().push((prefix.into(), Err(error)));
        self
    }

    /// Every URL requested so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of requests whose URL starts with `prefix`
    pub fn calls_to(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl HttpFetcher for MockHttpFetcher {
    async fn get(&self, url: &str, _headers: &[(&str, &str)]) -> Reply {
        self.calls.lock().unwrap().push(url.to_string());
        let routes = self.routes.lock().unwrap();
        routes
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| {
                Err(ExternalServiceError::Network(format!(
                    "no route to {}",
                    url
                )))
            })
    }
}

/// Mock narrative generator
pub struct MockNarrativeGenerator {
    text: String,
    config: MockConfig,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl MockNarrativeGenerator {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            config: MockConfig::success(),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            config: MockConfig::failure(message),
            ..Self::new("")
        }
    }

    /// Delay every answer, to check the lookup does not wait for it.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl NarrativeGenerator for MockNarrativeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ExternalServiceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.config.should_fail {
            return Err(ExternalServiceError::Unavailable(self.config.message()));
        }
        Ok(self.text.clone())
    }
}

/// In-memory history store
#[derive(Default)]
pub struct MockHistoryStore {
    entries: Mutex<Vec<LookupHistoryEntry>>,
    config: MockConfig,
}

impl MockHistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            config: MockConfig::failure(message),
        }
    }

    pub fn get_all_items(&self) -> Vec<LookupHistoryEntry> {
        self.entries.lock().unwrap().clone()
    }

    fn check_should_fail(&self) -> Result<(), AppError> {
        if self.config.should_fail {
            return Err(AppError::Storage(self.config.message()));
        }
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for MockHistoryStore {
    async fn load(&self) -> Result<Vec<LookupHistoryEntry>, AppError> {
        self.check_should_fail()?;
        Ok(self.entries.lock().unwrap().clone())
    }

    async fn save(&self, entries: &[LookupHistoryEntry]) -> Result<(), AppError> {
        self.check_should_fail()?;
        *self.entries.lock().unwrap() = entries.to_vec();
        Ok(())
    }
}

/// Fixed device description
#[derive(Debug, Clone, Default)]
pub struct MockDeviceInfo(pub DeviceInfo);

impl DeviceInfoProvider for MockDeviceInfo {
    fn device_info(&self) -> DeviceInfo {
        self.0.clone()
    }
}
