//! Lossy page encoding.

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use super::{PagedDocument, RenderError};

/// Default render scale (144 DPI).
pub const DEFAULT_SCALE: f32 = 2.0;

/// Default JPEG quality, medium compression.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// How pages are rasterized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Multiplier over 72 DPI.
    pub scale: f32,
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl RenderOptions {
    pub fn validate(&self) -> Result<(), RenderError> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(RenderError::InvalidOptions(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(RenderError::InvalidOptions(format!(
                "JPEG quality must be 1-100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}

/// An encoded page bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub image_bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Renders pages and encodes them for recognition.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    options: RenderOptions,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self {
            options: RenderOptions::default(),
        }
    }
}

impl Rasterizer {
    pub fn new(options: RenderOptions) -> Result<Self, RenderError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// Render and encode a 1-based page.
    pub async fn rasterize(
        &self,
        document: &mut dyn PagedDocument,
        page: u32,
    ) -> Result<RenderedPage, RenderError> {
        let page_count = document.page_count();
        if page == 0 || page > page_count {
            return Err(RenderError::PageOutOfRange { page, page_count });
        }

        let bitmap = document.render_page(page, self.options.scale).await?;
        encode_jpeg(&bitmap, self.options.jpeg_quality)
    }
}

/// Encode a bitmap as JPEG at the given quality (clamped to 1-100).
pub fn encode_jpeg(bitmap: &RgbImage, quality: u8) -> Result<RenderedPage, RenderError> {
    let (width, height) = bitmap.dimensions();
    if width == 0 || height == 0 {
        return Err(RenderError::RenderFailed(
            "rendered bitmap is empty".to_string(),
        ));
    }

    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    encoder.encode_image(bitmap)?;

    if buffer.is_empty() {
        return Err(RenderError::RenderFailed(
            "JPEG encoder produced no data".to_string(),
        ));
    }

    Ok(RenderedPage {
        image_bytes: buffer,
        mime_type: "image/jpeg",
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::Rgb;

    /// Draws a page-dependent gradient so pages differ.
    struct GradientDocument {
        pages: u32,
        renders: Vec<(u32, f32)>,
    }

    #[async_trait]
    impl PagedDocument for GradientDocument {
        fn page_count(&self) -> u32 {
            self.pages
        }

        async fn render_page(&mut self, page: u32, scale: f32) -> Result<RgbImage, RenderError> {
            self.renders.push((page, scale));
            let side = (32.0 * scale) as u32;
            Ok(RgbImage::from_fn(side, side, |x, y| {
                Rgb([(x * 4) as u8, (y * 4) as u8, (page * 40) as u8])
            }))
        }
    }

    fn document(pages: u32) -> GradientDocument {
        GradientDocument {
            pages,
            renders: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_rasterize_encodes_jpeg() {
        let rasterizer = Rasterizer::default();
        let mut doc = document(2);

        let page = rasterizer.rasterize(&mut doc, 1).await.unwrap();
        assert_eq!(page.mime_type, "image/jpeg");
        assert_eq!((page.width, page.height), (64, 64));
        // JPEG SOI marker
        assert_eq!(&page.image_bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(doc.renders, vec![(1, DEFAULT_SCALE)]);

        let decoded = image::load_from_memory(&page.image_bytes).unwrap();
        assert_eq!(decoded.width(), 64);
    }

    #[tokio::test]
    async fn test_rasterize_is_deterministic() {
        let rasterizer = Rasterizer::default();
        let mut doc = document(1);

        let first = rasterizer.rasterize(&mut doc, 1).await.unwrap();
        let second = rasterizer.rasterize(&mut doc, 1).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_rasterize_out_of_range() {
        let rasterizer = Rasterizer::default();
        let mut doc = document(2);

        for page in [0, 3] {
            let err = rasterizer.rasterize(&mut doc, page).await.unwrap_err();
            assert!(matches!(
                err,
                RenderError::PageOutOfRange { page_count: 2, .. }
            ));
        }
        assert!(doc.renders.is_empty());
    }

    #[test]
    fn test_options_validation() {
        assert!(RenderOptions::default().validate().is_ok());
        assert!(Rasterizer::new(RenderOptions {
            scale: 0.0,
            jpeg_quality: 75
        })
        .is_err());
        assert!(Rasterizer::new(RenderOptions {
            scale: f32::NAN,
            jpeg_quality: 75
        })
        .is_err());
        assert!(Rasterizer::new(RenderOptions {
            scale: 1.0,
            jpeg_quality: 0
        })
        .is_err());
        assert!(Rasterizer::new(RenderOptions {
            scale: 1.0,
            jpeg_quality: 101
        })
        .is_err());
    }

    #[test]
    fn test_lower_quality_is_smaller() {
        let bitmap = RgbImage::from_fn(128, 128, |x, y| Rgb([(x ^ y) as u8, x as u8, y as u8]));
        let high = encode_jpeg(&bitmap, 95).unwrap();
        let low = encode_jpeg(&bitmap, 20).unwrap();
        assert!(low.image_bytes.len() < high.image_bytes.len());
    }

    #[test]
    fn test_empty_bitmap_rejected() {
        let bitmap = RgbImage::new(0, 0);
        assert!(matches!(
            encode_jpeg(&bitmap, 75),
            Err(RenderError::RenderFailed(_))
        ));
    }
}
