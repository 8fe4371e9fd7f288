//! OCR engines and the recognition adapter.
//!
//! Recognizes text in page bitmaps using:
//! - Tesseract OCR via its command-line tool (default)
//! - A remote recognition service over HTTP
//!
//! Engines are reached through `RecognitionEngine`, which gives one
//! extraction exclusive use of a backend, and `EnginePool` for
//! concurrent extractions. `RecognitionAdapter` shapes engine output into
//! the structured payloads stored on each page.

mod adapter;
mod backend;
mod engine;
mod http;
mod tesseract;

pub use adapter::{RecognitionAdapter, DEFAULT_LANGUAGE};
pub use backend::{
    ContentKind, EngineOutput, ImageInput, OcrBackend, OcrBackendType, OcrError,
};
pub use engine::{EnginePool, PooledEngine, RecognitionEngine};
pub use http::{HttpBackend, DEFAULT_MAX_RETRIES};
pub use tesseract::TesseractBackend;
