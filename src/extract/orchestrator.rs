//! Top-level document extraction.

use std::sync::Arc;

use crate::models::{MediaClass, PageResult, SourceDocument};
use crate::ocr::{ImageInput, RecognitionAdapter, RecognitionEngine};
use crate::render::{DocumentLoader, Rasterizer};

use super::accumulator::PageAccumulator;
use super::error::ExtractionError;
use super::progress::{CancellationFlag, ProgressReporter};

/// Routes a document to the image or paged path and collects its pages.
pub struct DocumentExtractor {
    loader: Arc<dyn DocumentLoader>,
    rasterizer: Rasterizer,
    adapter: RecognitionAdapter,
}

impl DocumentExtractor {
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        rasterizer: Rasterizer,
        adapter: RecognitionAdapter,
    ) -> Self {
        Self {
            loader,
            rasterizer,
            adapter,
        }
    }

    pub fn rasterizer(&self) -> &Rasterizer {
        &self.rasterizer
    }

    pub fn adapter(&self) -> &RecognitionAdapter {
        &self.adapter
    }

    /// Extract text from every page of `document`.
    ///
    /// Returns the same document with its page collection filled in,
    /// ordered by page number. Any failure aborts the whole document.
    pub async fn extract(
        &self,
        document: SourceDocument,
        engine: &mut RecognitionEngine,
        progress: &ProgressReporter,
        cancel: &CancellationFlag,
    ) -> Result<SourceDocument, ExtractionError> {
        if !engine.is_ready() {
            return Err(ExtractionError::EngineNotReady(engine.availability_hint()));
        }

        if document.encoded_content().trim().is_empty() {
            return Err(ExtractionError::InvalidContent(
                "document content is empty".to_string(),
            ));
        }
        let content = document
            .decoded_content()
            .map_err(|e| ExtractionError::InvalidContent(format!("not valid base64: {}", e)))?;

        let pages = match document.media_class() {
            Some(MediaClass::Image) => {
                tracing::info!(
                    "Extracting image {} ({})",
                    document.file_name(),
                    document.media_type()
                );
                vec![
                    self.extract_image(content, document.media_type(), engine)
                        .await?,
                ]
            }
            Some(MediaClass::Paged) => {
                tracing::info!("Extracting paged document {}", document.file_name());
                let mut paged = self
                    .loader
                    .open(&content)
                    .await
                    .map_err(ExtractionError::DocumentOpen)?;

                let mut accumulator =
                    PageAccumulator::new(&self.rasterizer, &self.adapter, progress, cancel);
                accumulator
                    .run(document.id(), paged.as_mut(), engine)
                    .await?
            }
            None => {
                return Err(ExtractionError::UnsupportedMediaType(
                    document.media_type().to_string(),
                ))
            }
        };

        tracing::info!(
            "Extracted {} page(s) from {}",
            pages.len(),
            document.file_name()
        );
        Ok(document.with_pages(pages))
    }

    /// Single images become page 1; the source image stands in for a render.
    async fn extract_image(
        &self,
        content: Vec<u8>,
        media_type: &str,
        engine: &mut RecognitionEngine,
    ) -> Result<PageResult, ExtractionError> {
        ensure_decodable(&content, media_type)?;
        let image =
            ImageInput::new(content, media_type).map_err(|e| ExtractionError::recognition(1, e))?;
        let payload = self
            .adapter
            .recognize_image(engine, &image)
            .await
            .map_err(|e| ExtractionError::recognition(1, e))?;

        Ok(PageResult::new(
            1,
            payload.to_json()?,
            image.bytes(),
            image.mime_type(),
        ))
    }
}

/// The stored page image must decode back into a bitmap.
fn ensure_decodable(content: &[u8], media_type: &str) -> Result<(), ExtractionError> {
    let format = image::guess_format(content).map_err(|e| {
        ExtractionError::InvalidImageInput(format!("{} content is not an image: {}", media_type, e))
    })?;
    image::load_from_memory_with_format(content, format).map_err(|e| {
        ExtractionError::InvalidImageInput(format!("cannot decode {:?} image: {}", format, e))
    })?;
    Ok(())
}
