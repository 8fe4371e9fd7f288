//! Fakes shared by the integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use pageocr::extract::{CancellationFlag, DocumentExtractor};
use pageocr::ocr::{
    EngineOutput, ImageInput, OcrBackend, OcrBackendType, OcrError, RecognitionAdapter,
    RecognitionEngine,
};
use pageocr::render::{DocumentLoader, PagedDocument, Rasterizer, RenderError};

/// OCR backend that answers from a script.
///
/// Call `n` (1-based) returns `texts[n - 1]`, or `"Page<n>"` past the end.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    pub texts: Vec<String>,
    pub fail_on_call: Option<usize>,
    pub orientation: Option<i32>,
    /// Shared across clones so a test can bring the backend up later.
    pub offline: Arc<AtomicBool>,
    pub delay: Option<Duration>,
    /// Cancel this flag once the given call has succeeded.
    pub cancel_after_call: Option<(usize, CancellationFlag)>,
    pub calls: Arc<AtomicUsize>,
    pub seen: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedBackend {
    pub fn with_texts(texts: &[&str]) -> Self {
        Self {
            texts: texts.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    /// A backend that reports itself unavailable until `set_online`.
    pub fn offline() -> Self {
        Self {
            offline: Arc::new(AtomicBool::new(true)),
            ..Default::default()
        }
    }

    pub fn set_online(&self) {
        self.offline.store(false, Ordering::SeqCst);
    }

    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(mime_type, language)` of every call so far.
    pub fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl OcrBackend for ScriptedBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Tesseract
    }

    fn is_available(&self) -> bool {
        !self.offline.load(Ordering::SeqCst)
    }

    fn availability_hint(&self) -> String {
        if self.offline.load(Ordering::SeqCst) {
            "scripted backend switched off".to_string()
        } else {
            "scripted backend".to_string()
        }
    }

    async fn run_ocr(&self, image: &ImageInput, language: &str) -> Result<EngineOutput, OcrError> {
        let start = Instant::now();
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen
            .lock()
            .unwrap()
            .push((image.mime_type().to_string(), language.to_string()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on_call == Some(call) {
            return Err(OcrError::OcrFailed(format!("scripted failure on call {}", call)));
        }

        let text = self
            .texts
            .get(call - 1)
            .cloned()
            .unwrap_or_else(|| format!("Page{}", call));
        let mut output = EngineOutput::text_only(text, OcrBackendType::Tesseract, start);
        output.orientation = self.orientation;

        if let Some((after, ref flag)) = self.cancel_after_call {
            if call == after {
                flag.cancel();
            }
        }
        Ok(output)
    }
}

/// Engine over `backend`, initialized if the backend is available.
pub fn engine(backend: ScriptedBackend) -> RecognitionEngine {
    let mut engine = RecognitionEngine::new(Box::new(backend));
    let _ = engine.initialize();
    engine
}

/// Loader producing `pages`-page documents that render solid bitmaps.
#[derive(Clone, Default)]
pub struct FakeLoader {
    pub pages: u32,
    pub fail_render_on: Option<u32>,
    pub opens: Arc<AtomicUsize>,
    pub renders: Arc<AtomicUsize>,
}

impl FakeLoader {
    pub fn with_pages(pages: u32) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentLoader for FakeLoader {
    async fn open(&self, _content: &[u8]) -> Result<Box<dyn PagedDocument>, RenderError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeDocument {
            pages: self.pages,
            fail_render_on: self.fail_render_on,
            renders: self.renders.clone(),
        }))
    }
}

pub struct FakeDocument {
    pages: u32,
    fail_render_on: Option<u32>,
    renders: Arc<AtomicUsize>,
}

#[async_trait]
impl PagedDocument for FakeDocument {
    fn page_count(&self) -> u32 {
        self.pages
    }

    async fn render_page(&mut self, page: u32, scale: f32) -> Result<RgbImage, RenderError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        if self.fail_render_on == Some(page) {
            return Err(RenderError::RenderFailed(format!("page {} is corrupt", page)));
        }
        let side = (16.0 * scale) as u32;
        Ok(RgbImage::from_pixel(side, side, Rgb([250, 250, 250])))
    }
}

pub fn extractor(loader: FakeLoader) -> DocumentExtractor {
    DocumentExtractor::new(
        Arc::new(loader),
        Rasterizer::default(),
        RecognitionAdapter::default(),
    )
}

/// A small valid PNG.
pub fn png_bytes() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])));
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// Stand-in PDF bytes; fake loaders never parse them.
pub fn pdf_bytes() -> Vec<u8> {
    b"%PDF-1.4\n%fake\n".to_vec()
}
