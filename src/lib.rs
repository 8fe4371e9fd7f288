//! pageocr - page-by-page OCR text extraction.
//!
//! Turns a PDF or a standalone image into an ordered list of per-page
//! results, each holding a JSON payload of recognized text and the
//! encoded image the text was recognized from.

pub mod cli;
pub mod config;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod render;
pub mod server;
pub mod tools;

pub use extract::{
    CancellationFlag, DocumentExtractor, ExtractionError, ExtractionEvent, ProgressReporter,
};
pub use models::{PageResult, SourceDocument};
