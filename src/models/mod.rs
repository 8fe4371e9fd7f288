//! Data models for pageocr.

mod document;
mod payload;

pub use document::{MediaClass, PageResult, SourceDocument};
pub use payload::{ImagePayload, PagePayload};
