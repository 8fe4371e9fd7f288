//! Poppler-backed page rendering (`pdfinfo` + `pdftoppm`).
//!
//! Each opened document gets its own temporary directory as a rendering
//! surface. Pages are rendered one at a time and the page file is
//! removed once decoded, so the surface is reset between pages.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::RgbImage;
use tempfile::TempDir;
use tokio::process::Command;

use super::{DocumentLoader, PagedDocument, RenderError};
use crate::tools::{check_binary, run_tool, PDFINFO_NOT_FOUND, PDFTOPPM_NOT_FOUND};

/// Base resolution of a scale-1.0 render.
const BASE_DPI: f32 = 72.0;

/// Loader for PDFs using the Poppler command-line tools.
#[derive(Debug, Clone)]
pub struct PopplerLoader {
    pdfinfo_path: PathBuf,
    pdftoppm_path: PathBuf,
}

impl Default for PopplerLoader {
    fn default() -> Self {
        Self {
            pdfinfo_path: PathBuf::from("pdfinfo"),
            pdftoppm_path: PathBuf::from("pdftoppm"),
        }
    }
}

impl PopplerLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the path to the pdfinfo binary.
    pub fn with_pdfinfo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.pdfinfo_path = path.into();
        self
    }

    /// Set the path to the pdftoppm binary.
    pub fn with_pdftoppm_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.pdftoppm_path = path.into();
        self
    }

    /// Check that both Poppler tools are installed.
    pub fn is_available(&self) -> bool {
        check_binary(&self.pdfinfo_path.to_string_lossy())
            && check_binary(&self.pdftoppm_path.to_string_lossy())
    }

    pub fn availability_hint(&self) -> String {
        if self.is_available() {
            "Poppler (pdfinfo, pdftoppm) is available".to_string()
        } else {
            "Poppler not installed. Install with: apt install poppler-utils".to_string()
        }
    }

    /// Read the page count of a PDF.
    async fn page_count(&self, pdf_path: &Path) -> Result<u32, RenderError> {
        let mut cmd = Command::new(&self.pdfinfo_path);
        cmd.arg(pdf_path);
        let output = run_tool(&mut cmd, "pdfinfo", PDFINFO_NOT_FOUND).await?;

        parse_page_count(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            RenderError::RenderFailed("pdfinfo did not report a page count".to_string())
        })
    }
}

/// Extract the `Pages:` value from pdfinfo output.
pub(crate) fn parse_page_count(info: &str) -> Option<u32> {
    info.lines()
        .find(|line| line.starts_with("Pages:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
}

/// Resolution for a render scale, at least 1 DPI.
pub(crate) fn scale_to_dpi(scale: f32) -> u32 {
    ((BASE_DPI * scale).round() as u32).max(1)
}

#[async_trait]
impl DocumentLoader for PopplerLoader {
    async fn open(&self, content: &[u8]) -> Result<Box<dyn PagedDocument>, RenderError> {
        let surface = tempfile::Builder::new()
            .prefix("pageocr-")
            .tempdir()
            .map_err(|e| RenderError::SurfaceUnavailable(e.to_string()))?;

        let source_path = surface.path().join("document.pdf");
        tokio::fs::write(&source_path, content).await?;

        let page_count = self.page_count(&source_path).await?;
        tracing::debug!("Opened PDF with {} pages", page_count);

        Ok(Box::new(PopplerDocument {
            surface,
            source_path,
            page_count,
            pdftoppm_path: self.pdftoppm_path.clone(),
        }))
    }
}

/// A PDF opened on its own rendering surface.
pub struct PopplerDocument {
    surface: TempDir,
    source_path: PathBuf,
    page_count: u32,
    pdftoppm_path: PathBuf,
}

#[async_trait]
impl PagedDocument for PopplerDocument {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    async fn render_page(&mut self, page: u32, scale: f32) -> Result<RgbImage, RenderError> {
        if page == 0 || page > self.page_count {
            return Err(RenderError::PageOutOfRange {
                page,
                page_count: self.page_count,
            });
        }
        if !self.surface.path().is_dir() {
            return Err(RenderError::SurfaceUnavailable(
                "rendering directory no longer exists".to_string(),
            ));
        }

        let page_str = page.to_string();
        let dpi = scale_to_dpi(scale).to_string();
        let output_prefix = self.surface.path().join(format!("page-{}", page));

        let mut cmd = Command::new(&self.pdftoppm_path);
        cmd.args(["-png", "-singlefile", "-r", &dpi, "-f", &page_str, "-l", &page_str])
            .arg(&self.source_path)
            .arg(&output_prefix);
        run_tool(&mut cmd, "pdftoppm", PDFTOPPM_NOT_FOUND).await?;

        let image_path = output_prefix.with_extension("png");
        if !image_path.exists() {
            return Err(RenderError::RenderFailed(format!(
                "No image generated for page {}",
                page
            )));
        }

        let decoded = image::open(&image_path);
        let _ = tokio::fs::remove_file(&image_path).await;
        Ok(decoded?.to_rgb8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDFINFO_OUTPUT: &str = "Title:          Scan\n\
        Producer:       scanner\n\
        Pages:          12\n\
        Encrypted:      no\n\
        Page size:      612 x 792 pts (letter)\n";

    #[test]
    fn test_parse_page_count() {
        assert_eq!(parse_page_count(PDFINFO_OUTPUT), Some(12));
        assert_eq!(parse_page_count("Pages: 0\n"), Some(0));
        assert_eq!(parse_page_count("Title: x\n"), None);
        assert_eq!(parse_page_count("Pages: many\n"), None);
    }

    #[test]
    fn test_scale_to_dpi() {
        assert_eq!(scale_to_dpi(1.0), 72);
        assert_eq!(scale_to_dpi(2.0), 144);
        assert_eq!(scale_to_dpi(4.17), 300);
        assert_eq!(scale_to_dpi(0.001), 1);
    }

    #[tokio::test]
    async fn test_missing_tools_surface_unavailable() {
        let loader = PopplerLoader::new()
            .with_pdfinfo_path("pageocr-no-such-pdfinfo")
            .with_pdftoppm_path("pageocr-no-such-pdftoppm");
        assert!(!loader.is_available());

        let err = loader.open(b"%PDF-1.4").await.err().unwrap();
        assert!(matches!(err, RenderError::SurfaceUnavailable(_)));
    }
}
