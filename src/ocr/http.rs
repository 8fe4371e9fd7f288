//! Remote recognition service backend.
//!
//! POSTs `{ "image": "<data url>", "language": "<lang>" }` and expects
//! `{ "text": "..." }` back, optionally with `rotation`, `is_table`,
//! `is_diagram` and `confidence`.
//!
//! Rate limiting:
//! - Retries HTTP 429 with exponential backoff
//! - Respects Retry-After header from the service

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::backend::{
    ContentKind, EngineOutput, ImageInput, OcrBackend, OcrBackendType, OcrError,
};

/// Default number of retries on 429 responses.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff.
const BACKOFF_BASE_MS: u64 = 1000;

/// Remote OCR backend.
pub struct HttpBackend {
    endpoint: String,
    client: reqwest::Client,
    max_retries: u32,
    backoff_base_ms: u64,
}

#[derive(Debug, Serialize)]
struct RecognizeRequest<'a> {
    image: String,
    language: &'a str,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    text: Option<String>,
    #[serde(default)]
    rotation: Option<i32>,
    #[serde(default)]
    is_table: bool,
    #[serde(default)]
    is_diagram: bool,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpBackend {
    /// Create a backend for `endpoint` with a per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, OcrError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pageocr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| OcrError::OcrFailed(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: BACKOFF_BASE_MS,
        })
    }

    /// Set the maximum number of retries on 429 responses.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base delay for exponential backoff.
    pub fn with_backoff_base_ms(mut self, base_ms: u64) -> Self {
        self.backoff_base_ms = base_ms;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST the request, retrying while the service answers 429.
    async fn post_with_retry(
        &self,
        request: &RecognizeRequest<'_>,
    ) -> Result<reqwest::Response, OcrError> {
        let mut attempt = 0;
        loop {
            let response = self
                .client
                .post(&self.endpoint)
                .json(request)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        OcrError::OcrFailed(format!("request to {} timed out", self.endpoint))
                    } else {
                        OcrError::OcrFailed(format!("HTTP request failed: {}", e))
                    }
                })?;

            if response.status() != reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());
            let retry_after_secs = retry_after.as_deref().and_then(|s| s.parse::<u64>().ok());

            if attempt >= self.max_retries {
                return Err(OcrError::RateLimited {
                    backend: OcrBackendType::Http,
                    retry_after_secs,
                });
            }

            let wait = parse_retry_after(retry_after.as_deref())
                .unwrap_or_else(|| backoff_delay(attempt, self.backoff_base_ms));

            warn!(
                "{} rate limited (attempt {}), waiting {:?}",
                self.endpoint,
                attempt + 1,
                wait
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }
}

/// Parse a Retry-After header in seconds, capped at one minute.
fn parse_retry_after(header_value: Option<&str>) -> Option<Duration> {
    let value = header_value?;
    value
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs.min(60)))
}

/// Exponential backoff delay for a given attempt, capped at one minute.
fn backoff_delay(attempt: u32, base_ms: u64) -> Duration {
    let delay_ms = base_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay_ms.min(60_000))
}

fn into_engine_output(response: RecognizeResponse, start: Instant) -> Result<EngineOutput, OcrError> {
    if let Some(error) = response.error {
        return Err(OcrError::OcrFailed(format!("recognition service error: {}", error)));
    }
    let text = response
        .text
        .ok_or_else(|| OcrError::OcrFailed("response is missing the text field".to_string()))?;

    let content_kind = if response.is_table {
        Some(ContentKind::Table)
    } else if response.is_diagram {
        Some(ContentKind::Diagram)
    } else {
        None
    };

    let mut output = EngineOutput::text_only(text, OcrBackendType::Http, start);
    output.orientation = response.rotation.map(|r| r.rem_euclid(360));
    output.content_kind = content_kind;
    output.confidence = response.confidence;
    Ok(output)
}

#[async_trait]
impl OcrBackend for HttpBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Http
    }

    fn is_available(&self) -> bool {
        reqwest::Url::parse(&self.endpoint)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false)
    }

    fn availability_hint(&self) -> String {
        if self.is_available() {
            format!("Recognition service configured at {}", self.endpoint)
        } else {
            format!(
                "Invalid recognition endpoint '{}'. Set ocr.endpoint or PAGEOCR_ENDPOINT to an http(s) URL",
                self.endpoint
            )
        }
    }

    async fn run_ocr(
        &self,
        image: &ImageInput,
        language: &str,
    ) -> Result<EngineOutput, OcrError> {
        let start = Instant::now();
        let request = RecognizeRequest {
            image: image.to_data_url(),
            language,
        };

        debug!(
            "POST {} ({} bytes, {})",
            self.endpoint,
            image.bytes().len(),
            image.mime_type()
        );
        let response = self.post_with_retry(&request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::OcrFailed(format!(
                "recognition service error ({}): {}",
                status, body
            )));
        }

        let parsed: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| OcrError::OcrFailed(format!("Failed to parse response: {}", e)))?;

        into_engine_output(parsed, start)
    }
}
