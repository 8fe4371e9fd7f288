//! Tesseract OCR backend implementation.
//!
//! Uses Tesseract OCR via command-line for text extraction.
//! This is the traditional, widely-available OCR option.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;

use super::backend::{EngineOutput, ImageInput, OcrBackend, OcrBackendType, OcrError};
use crate::tools::{check_binary, run_tool, TESSERACT_NOT_FOUND};

/// Tesseract OCR backend.
pub struct TesseractBackend {
    /// Path or name of the tesseract binary.
    binary_path: PathBuf,
    /// Run orientation and script detection before recognition.
    detect_orientation: bool,
}

impl TesseractBackend {
    /// Create a new Tesseract backend with default configuration.
    pub fn new() -> Self {
        Self {
            binary_path: PathBuf::from("tesseract"),
            detect_orientation: false,
        }
    }

    /// Set the path to the tesseract binary.
    pub fn with_binary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = path.into();
        self
    }

    /// Enable orientation detection (`--psm 0`).
    pub fn with_orientation_detection(mut self, enabled: bool) -> Self {
        self.detect_orientation = enabled;
        self
    }

    fn binary_name(&self) -> String {
        self.binary_path.to_string_lossy().to_string()
    }

    /// Run Tesseract on an image file.
    async fn run_tesseract(&self, image_path: &Path, language: &str) -> Result<String, OcrError> {
        let mut cmd = Command::new(&self.binary_path);
        cmd.arg(image_path).arg("stdout").args(["-l", language]);

        let output = run_tool(&mut cmd, "tesseract", TESSERACT_NOT_FOUND).await?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run orientation and script detection; failures only lose the hint.
    async fn detect_rotation(&self, image_path: &Path) -> Option<i32> {
        let mut cmd = Command::new(&self.binary_path);
        cmd.arg(image_path).arg("stdout").args(["--psm", "0"]);

        match run_tool(&mut cmd, "tesseract", TESSERACT_NOT_FOUND).await {
            Ok(output) => parse_osd_rotation(&String::from_utf8_lossy(&output.stdout)),
            Err(e) => {
                tracing::debug!("Orientation detection failed: {}", e);
                None
            }
        }
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the `Rotate:` line from a Tesseract OSD report.
pub(crate) fn parse_osd_rotation(report: &str) -> Option<i32> {
    static ROTATE: OnceLock<Regex> = OnceLock::new();
    let re = ROTATE.get_or_init(|| Regex::new(r"(?m)^Rotate:\s*(\d+)\s*$").unwrap());
    re.captures(report)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .map(|degrees| degrees.rem_euclid(360))
}

#[async_trait]
impl OcrBackend for TesseractBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Tesseract
    }

    fn is_available(&self) -> bool {
        check_binary(&self.binary_name())
    }

    fn availability_hint(&self) -> String {
        if !self.is_available() {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        } else {
            "Tesseract is available".to_string()
        }
    }

    async fn run_ocr(
        &self,
        image: &ImageInput,
        language: &str,
    ) -> Result<EngineOutput, OcrError> {
        let start = Instant::now();

        // Tesseract reads from a path; the temp file is removed on drop.
        let mut file = tempfile::Builder::new()
            .prefix("pageocr-")
            .suffix(&format!(".{}", image.extension()))
            .tempfile()?;
        file.write_all(image.bytes())?;
        file.flush()?;

        let orientation = if self.detect_orientation {
            self.detect_rotation(file.path()).await
        } else {
            None
        };

        let text = self.run_tesseract(file.path(), language).await?;

        let mut output = EngineOutput::text_only(text, OcrBackendType::Tesseract, start);
        output.orientation = orientation;
        Ok(output)
    }
}
