//! Gemini generateContent client with retry and backoff.
//!
//! One call sends a single prompt string and yields the generated text of
//! the first candidate. Rate limits (HTTP 429) and transport failures are
//! retried with exponential backoff; every other HTTP error fails
//! immediately, as does a success response missing the text payload.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::{MAX_RETRIES, RETRY_DELAY_MS};
use crate::error::LlmError;

/// Default Gemini generateContent endpoint.
pub const DEFAULT_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-flash-preview:generateContent";

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Trait for clients that can generate text from a single prompt.
///
/// Each call consumes one unit of external API quota; implementations do no
/// caching or deduplication.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends one prompt and returns the raw generated text.
    async fn generate_text(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Client for the Gemini generateContent API.
pub struct GeminiClient {
    /// HTTP client for making API requests.
    client: Client,
    /// API key, passed as the `key` query parameter.
    api_key: String,
    /// Endpoint URL for generateContent.
    api_url: String,
}

impl GeminiClient {
    /// Creates a new client with the given API key and the default endpoint.
    pub fn new(api_key: String) -> Self {
        Self::with_url(api_key, DEFAULT_API_URL.to_string())
    }

    /// Creates a new client with a custom endpoint URL.
    ///
    /// Useful for tests and API-compatible proxies.
    pub fn with_url(api_key: String, api_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client - system TLS configuration error"),
            api_key,
            api_url,
        }
    }

    /// Creates a new client from environment variables.
    ///
    /// Reads `GEMINI_API_KEY` (required) and `GEMINI_API_URL` (optional
    /// endpoint override).
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiKey` if `GEMINI_API_KEY` is not set.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = env::var("GEMINI_API_KEY").map_err(|_| LlmError::MissingApiKey)?;
        let api_url = env::var("GEMINI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Ok(Self::with_url(api_key, api_url))
    }

    /// Get the endpoint URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Get the API key (for debugging, returns masked value).
    pub fn api_key_masked(&self) -> String {
        if self.api_key.len() <= 8 {
            "*".repeat(self.api_key.len())
        } else {
            format!(
                "{}...{}",
                &self.api_key[..4],
                &self.api_key[self.api_key.len() - 4..]
            )
        }
    }

    /// Execute a request with exponential backoff retry logic.
    ///
    /// `MAX_RETRIES` counts retries after the first call, so a request gets
    /// `MAX_RETRIES + 1` attempts in total before giving up.
    async fn execute_with_retry(&self, request: &ApiRequest) -> Result<String, LlmError> {
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay_ms = RETRY_DELAY_MS * (1 << (attempt - 1));
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                tracing::debug!(
                    attempt = attempt + 1,
                    delay_ms = delay_ms,
                    "Retrying Gemini request after transient failure"
                );
            }

            match self.execute_request(request).await {
                Ok(text) => return Ok(text),
                Err(err) => {
                    if is_transient_error(&err) {
                        tracing::warn!(
                            attempt = attempt + 1,
                            max_attempts = MAX_RETRIES + 1,
                            error = %err,
                            "Transient error, will retry"
                        );
                        last_error = Some(err);
                    } else {
                        // Non-transient errors fail immediately
                        return Err(err);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            LlmError::RequestFailed("Max retries exceeded with no error captured".to_string())
        }))
    }

    /// Execute a single request (no retry logic).
    ///
    /// The API key travels as the `key` query parameter, appended to the
    /// endpoint URL per call.
    async fn execute_request(&self, request: &ApiRequest) -> Result<String, LlmError> {
        let url = format!("{}?key={}", self.api_url, self.api_key);
        let http_response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());

            if status_code == 429 {
                return Err(LlmError::RateLimited(error_text));
            }
            return Err(LlmError::ApiError {
                code: status_code,
                message: error_text,
            });
        }

        let api_response: ApiResponse = http_response
            .json()
            .await
            .map_err(|e| LlmError::FormatError(format!("Failed to parse API response: {e}")))?;

        api_response
            .first_text()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                LlmError::FormatError("No text payload in Gemini response".to_string())
            })
    }
}

/// Check if an error is transient and should be retried.
///
/// Only rate limits and transport-level failures retry; all other HTTP
/// statuses and malformed success responses fail immediately.
fn is_transient_error(error: &LlmError) -> bool {
    matches!(
        error,
        LlmError::RateLimited(_) | LlmError::RequestFailed(_)
    )
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String, LlmError> {
        let request = ApiRequest::from_prompt(prompt);
        self.execute_with_retry(&request).await
    }
}

/// Internal request structure for the generateContent API.
#[derive(Debug, Clone, Serialize)]
struct ApiRequest {
    contents: Vec<Content>,
}

impl ApiRequest {
    fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    text: String,
}

/// Internal response structure from the generateContent API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl ApiResponse {
    /// Text of the first candidate's first part, if present.
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .parts
            .first()
            .map(|part| part.text.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}
