//! Extraction error taxonomy.

use thiserror::Error;

use crate::ocr::OcrError;
use crate::render::RenderError;

/// Errors that abort a document extraction.
///
/// Every variant aborts the whole document; no partial page list is
/// ever returned alongside an error.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Recognition engine not ready: {0}")]
    EngineNotReady(String),

    #[error("Failed to open paged document: {0}")]
    DocumentOpen(#[source] RenderError),

    #[error("Failed to render page {page}: {source}")]
    PageRender {
        page: u32,
        #[source]
        source: RenderError,
    },

    #[error("Invalid image input: {0}")]
    InvalidImageInput(String),

    #[error("Recognition failed on page {page}: {source}")]
    RecognitionEngine {
        page: u32,
        #[source]
        source: OcrError,
    },

    #[error("Document has no pages")]
    EmptyDocument,

    #[error("Invalid document content: {0}")]
    InvalidContent(String),

    #[error("Extraction cancelled after {completed_pages} pages")]
    Cancelled { completed_pages: u32 },

    #[error("Failed to serialize payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl ExtractionError {
    /// Map a recognition failure on `page` into the taxonomy.
    pub(crate) fn recognition(page: u32, err: OcrError) -> Self {
        match err {
            OcrError::InvalidImage(msg) => ExtractionError::InvalidImageInput(msg),
            source => ExtractionError::RecognitionEngine { page, source },
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ExtractionError::UnsupportedMediaType(_) => "unsupported_media_type",
            ExtractionError::EngineNotReady(_) => "engine_not_ready",
            ExtractionError::DocumentOpen(_) | ExtractionError::PageRender { .. } => {
                "page_render_error"
            }
            ExtractionError::InvalidImageInput(_) => "invalid_image_input",
            ExtractionError::RecognitionEngine { .. } => "recognition_engine_error",
            ExtractionError::EmptyDocument => "empty_document",
            ExtractionError::InvalidContent(_) => "invalid_content",
            ExtractionError::Cancelled { .. } => "cancelled",
            ExtractionError::Payload(_) => "payload_error",
        }
    }
}
