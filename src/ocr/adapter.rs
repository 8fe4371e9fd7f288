//! Translates engine output into the structured extraction payloads.

use super::backend::{ContentKind, EngineOutput, ImageInput, OcrError};
use super::engine::RecognitionEngine;
use crate::models::{ImagePayload, PagePayload};

/// Default source-language hint.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Submits images to an engine and shapes the results.
#[derive(Debug, Clone)]
pub struct RecognitionAdapter {
    language: String,
}

impl Default for RecognitionAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

impl RecognitionAdapter {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Recognize a standalone image.
    pub async fn recognize_image(
        &self,
        engine: &mut RecognitionEngine,
        image: &ImageInput,
    ) -> Result<ImagePayload, OcrError> {
        let output = engine.recognize(image, &self.language).await?;
        tracing::debug!(
            "Recognized {} chars from image in {}ms",
            output.text.len(),
            output.processing_time_ms
        );
        Ok(ImagePayload::new(self.language.clone(), output.text))
    }

    /// Recognize one rendered page of a paged document.
    pub async fn recognize_page(
        &self,
        engine: &mut RecognitionEngine,
        image: &ImageInput,
    ) -> Result<PagePayload, OcrError> {
        let output = engine.recognize(image, &self.language).await?;
        tracing::debug!(
            "Recognized {} chars from page in {}ms",
            output.text.len(),
            output.processing_time_ms
        );
        Ok(self.page_payload(output))
    }

    fn page_payload(&self, output: EngineOutput) -> PagePayload {
        let rotation_correction = output.orientation.unwrap_or(0).rem_euclid(360);
        PagePayload {
            primary_language: self.language.clone(),
            is_rotation_valid: rotation_correction == 0,
            rotation_correction,
            is_table: output.content_kind == Some(ContentKind::Table),
            is_diagram: output.content_kind == Some(ContentKind::Diagram),
            natural_text: output.text,
        }
    }
}
