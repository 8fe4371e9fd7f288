//! Sequential page-by-page extraction for paged documents.
//!
//! Each page goes render -> recognize -> append before the next page is
//! started. The engine and rendering surface are single shared resources,
//! so pages are never processed concurrently.

use crate::models::PageResult;
use crate::ocr::{ImageInput, RecognitionAdapter, RecognitionEngine};
use crate::render::{PagedDocument, Rasterizer};

use super::error::ExtractionError;
use super::progress::{CancellationFlag, ExtractionEvent, ProgressReporter};

/// Where the accumulator is in its per-page cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorState {
    Idle,
    Rendering(u32),
    Recognizing(u32),
    Appending(u32),
    Done,
    Failed,
}

/// Drives rasterizer and adapter across all pages of one document.
pub struct PageAccumulator<'a> {
    rasterizer: &'a Rasterizer,
    adapter: &'a RecognitionAdapter,
    progress: &'a ProgressReporter,
    cancel: &'a CancellationFlag,
    state: AccumulatorState,
}

impl<'a> PageAccumulator<'a> {
    pub fn new(
        rasterizer: &'a Rasterizer,
        adapter: &'a RecognitionAdapter,
        progress: &'a ProgressReporter,
        cancel: &'a CancellationFlag,
    ) -> Self {
        Self {
            rasterizer,
            adapter,
            progress,
            cancel,
            state: AccumulatorState::Idle,
        }
    }

    pub fn state(&self) -> AccumulatorState {
        self.state
    }

    fn transition(&mut self, next: AccumulatorState) {
        tracing::trace!("accumulator {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Process every page in order.
    ///
    /// On error the pages collected so far are dropped.
    pub async fn run(
        &mut self,
        document_id: &str,
        document: &mut dyn PagedDocument,
        engine: &mut RecognitionEngine,
    ) -> Result<Vec<PageResult>, ExtractionError> {
        let result = self.run_pages(document_id, document, engine).await;
        match result {
            Ok(_) => self.transition(AccumulatorState::Done),
            Err(ref e) => {
                tracing::debug!("Extraction of {} failed: {}", document_id, e);
                self.transition(AccumulatorState::Failed);
            }
        }
        result
    }

    async fn run_pages(
        &mut self,
        document_id: &str,
        document: &mut dyn PagedDocument,
        engine: &mut RecognitionEngine,
    ) -> Result<Vec<PageResult>, ExtractionError> {
        let total_pages = document.page_count();
        if total_pages == 0 {
            return Err(ExtractionError::EmptyDocument);
        }

        self.progress.report(ExtractionEvent::DocumentStarted {
            document_id: document_id.to_string(),
            total_pages,
        });

        let mut pages = Vec::with_capacity(total_pages as usize);

        for page_number in 1..=total_pages {
            if self.cancel.is_cancelled() {
                return Err(ExtractionError::Cancelled {
                    completed_pages: page_number - 1,
                });
            }

            self.transition(AccumulatorState::Rendering(page_number));
            let rendered = self
                .rasterizer
                .rasterize(document, page_number)
                .await
                .map_err(|source| ExtractionError::PageRender {
                    page: page_number,
                    source,
                })?;

            self.transition(AccumulatorState::Recognizing(page_number));
            let image = ImageInput::new(rendered.image_bytes, rendered.mime_type)
                .map_err(|e| ExtractionError::recognition(page_number, e))?;
            let payload = self
                .adapter
                .recognize_page(engine, &image)
                .await
                .map_err(|e| ExtractionError::recognition(page_number, e))?;

            self.transition(AccumulatorState::Appending(page_number));
            pages.push(PageResult::new(
                page_number,
                payload.to_json()?,
                image.bytes(),
                image.mime_type(),
            ));
            tracing::debug!(
                "Document {}: page {}/{} complete",
                document_id,
                page_number,
                total_pages
            );

            self.progress.report(ExtractionEvent::PageCompleted {
                document_id: document_id.to_string(),
                page_number,
                total_pages,
                fraction: f64::from(page_number) / f64::from(total_pages),
            });
        }

        Ok(pages)
    }
}
