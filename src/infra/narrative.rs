//! Gemini narrative client.
//!
//! Sends one `generateContent` request per lookup. Without an API key the
//! client stays in unconfigured mode and reports that instead of calling out.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use crate::domain::{ConfigError, ExternalServiceError, NarrativeGenerator};

/// Default Generative Language API base URL
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model for narrative text
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

const TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 0.9;

/// Narrative requests are slower than lookups.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Join the text parts of the first candidate.
    fn into_text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content?.parts;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Narrative generator backed by the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiNarrativeClient {
    http_client: Client,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
}

impl GeminiNarrativeClient {
    /// Create a new Gemini client
    ///
    /// # Arguments
    /// * `api_key` - API key. If None, every call reports "not configured".
    /// * `base_url` - Optional custom API base URL
    /// * `model` - Optional model name
    pub fn new(
        api_key: Option<SecretString>,
        base_url: Option<String>,
        model: Option<String>,
    ) -> Result<Self, ConfigError> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl NarrativeGenerator for GeminiNarrativeClient {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<String, ExternalServiceError> {
        let Some(api_key) = self.api_key.as_ref() else {
            warn!("Narrative enrichment skipped - no GEMINI_API_KEY configured");
            return Err(ExternalServiceError::Configuration(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        };

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_p: TOP_P,
            },
        };

        let url = self.endpoint();
        debug!(url = %url, prompt_len = prompt.len(), "Requesting narrative");

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Narrative request failed");
                if e.is_timeout() {
                    ExternalServiceError::Timeout(e.to_string())
                } else {
                    ExternalServiceError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Narrative API returned error");
            return Err(ExternalServiceError::ApiError {
                status_code: status.as_u16(),
                message: body,
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse narrative response");
            ExternalServiceError::ParseError(e.to_string())
        })?;

        parsed.into_text().ok_or_else(|| {
            ExternalServiceError::Unavailable("model returned no text".to_string())
        })
    }
}
