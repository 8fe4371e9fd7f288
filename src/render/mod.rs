//! Page rasterization for paged documents.
//!
//! - `DocumentLoader` opens encoded document bytes into a `PagedDocument`
//! - `PagedDocument` renders one page at a time to an RGB bitmap
//! - `Rasterizer` encodes rendered pages as JPEG for recognition
//!
//! `PopplerLoader` is the default loader, driving `pdfinfo` and `pdftoppm`.

mod poppler;
mod rasterizer;

use async_trait::async_trait;
use image::RgbImage;
use thiserror::Error;

use crate::tools::ToolError;

pub use poppler::{PopplerDocument, PopplerLoader};
pub use rasterizer::{encode_jpeg, Rasterizer, RenderOptions, RenderedPage};

/// Errors from opening or rendering a paged document.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: u32 },

    #[error("Rendering surface unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("Render failed: {0}")]
    RenderFailed(String),

    #[error("Invalid render options: {0}")]
    InvalidOptions(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ToolError> for RenderError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::NotFound(hint) => RenderError::SurfaceUnavailable(hint),
            ToolError::Io(e) => RenderError::Io(e),
            other => RenderError::RenderFailed(other.to_string()),
        }
    }
}

/// An opened paged document.
///
/// Rendering takes `&mut self`: the rendering surface is reused page to
/// page and must not be shared across concurrent renders.
#[async_trait]
pub trait PagedDocument: Send {
    /// Total number of pages.
    fn page_count(&self) -> u32;

    /// Render a 1-based page at `scale` (1.0 = 72 DPI).
    async fn render_page(&mut self, page: u32, scale: f32) -> Result<RgbImage, RenderError>;
}

/// Opens encoded document bytes for rendering.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn open(&self, content: &[u8]) -> Result<Box<dyn PagedDocument>, RenderError>;
}
