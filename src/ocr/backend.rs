//! OCR backend abstraction.
//!
//! Supports multiple recognition engines:
//! - Tesseract: Traditional OCR via command-line (CPU)
//! - Http: A remote recognition service speaking `{ image } -> { text }`

use std::time::Instant;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use crate::tools::ToolError;

/// Errors from OCR backends.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Rate limited by {backend}, retry after {retry_after_secs:?}s")]
    RateLimited {
        backend: OcrBackendType,
        retry_after_secs: Option<u64>,
    },

    #[error("Invalid image input: {0}")]
    InvalidImage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ToolError> for OcrError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::NotFound(hint) => OcrError::BackendNotAvailable(hint),
            ToolError::Io(e) => OcrError::Io(e),
            other => OcrError::OcrFailed(other.to_string()),
        }
    }
}

/// Available OCR backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OcrBackendType {
    /// Tesseract OCR via command-line.
    Tesseract,
    /// Remote recognition service over HTTP.
    Http,
}

impl OcrBackendType {
    pub fn all() -> &'static [OcrBackendType] {
        &[OcrBackendType::Tesseract, OcrBackendType::Http]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OcrBackendType::Tesseract => "tesseract",
            OcrBackendType::Http => "http",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tesseract" => Some(OcrBackendType::Tesseract),
            "http" | "remote" => Some(OcrBackendType::Http),
            _ => None,
        }
    }
}

impl std::fmt::Display for OcrBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Content classification reported by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Prose,
    Table,
    Diagram,
}

/// Raw engine output for one image.
///
/// Orientation and content kind are only ever what the engine reported.
#[derive(Debug, Clone)]
pub struct EngineOutput {
    /// Recognized text. Empty only if the engine succeeded and found nothing.
    pub text: String,
    /// Clockwise rotation in degrees needed to upright the image, if reported.
    pub orientation: Option<i32>,
    /// Content classification, if reported.
    pub content_kind: Option<ContentKind>,
    /// Confidence score (0.0 - 1.0), if available.
    pub confidence: Option<f32>,
    /// Which backend produced this result.
    pub backend: OcrBackendType,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl EngineOutput {
    /// Build a text-only result timed from `start`.
    pub fn text_only(text: String, backend: OcrBackendType, start: Instant) -> Self {
        Self {
            text,
            orientation: None,
            content_kind: None,
            confidence: None,
            backend,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// An encoded image handed to a recognition engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    bytes: Vec<u8>,
    mime_type: String,
}

impl ImageInput {
    /// Wrap raw encoded image bytes. Empty input is rejected.
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Result<Self, OcrError> {
        if bytes.is_empty() {
            return Err(OcrError::InvalidImage("image data is empty".to_string()));
        }
        let mime_type = mime_type.into();
        if mime_type.trim().is_empty() {
            return Err(OcrError::InvalidImage("image MIME type is empty".to_string()));
        }
        Ok(Self { bytes, mime_type })
    }

    /// Decode base64 image data.
    pub fn from_base64(encoded: &str, mime_type: impl Into<String>) -> Result<Self, OcrError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| OcrError::InvalidImage(format!("invalid base64: {}", e)))?;
        Self::new(bytes, mime_type)
    }

    /// Parse a `data:<mime>;base64,<data>` URL.
    pub fn from_data_url(url: &str) -> Result<Self, OcrError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| OcrError::InvalidImage("not a data URL".to_string()))?;
        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| OcrError::InvalidImage("data URL has no payload".to_string()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| OcrError::InvalidImage("data URL is not base64".to_string()))?;
        Self::from_base64(data, mime_type)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// File extension matching the MIME type, for tools that sniff by name.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.to_lowercase().as_str() {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/tiff" => "tif",
            "image/gif" => "gif",
            "image/bmp" => "bmp",
            "image/webp" => "webp",
            _ => "img",
        }
    }
}

/// Trait for OCR backends.
///
/// Implementations are stateless with respect to a single call but may hold
/// expensive resources; callers reach them through `RecognitionEngine`.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Get the backend type.
    fn backend_type(&self) -> OcrBackendType;

    /// Check if this backend is available (dependencies installed, endpoint configured).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Core OCR: recognize text in an image.
    async fn run_ocr(&self, image: &ImageInput, language: &str)
        -> Result<EngineOutput, OcrError>;
}
