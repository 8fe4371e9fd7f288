//! Helpers for invoking external command-line tools (Tesseract, Poppler).

use std::process::Output;

use thiserror::Error;
use tokio::process::Command;

pub const TESSERACT_NOT_FOUND: &str = "tesseract not found (install tesseract-ocr)";
pub const PDFTOPPM_NOT_FOUND: &str = "pdftoppm not found (install poppler-utils)";
pub const PDFINFO_NOT_FOUND: &str = "pdfinfo not found (install poppler-utils)";

/// Errors from running an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    NotFound(String),

    #[error("{tool} failed: {stderr}")]
    Failed { tool: String, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Check if a binary is available in PATH (or is an existing path).
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Run a command to completion, returning its output on a zero exit status.
pub async fn run_tool(
    command: &mut Command,
    tool: &str,
    not_found_hint: &str,
) -> Result<Output, ToolError> {
    match command.kill_on_drop(true).output().await {
        Ok(output) if output.status.success() => Ok(output),
        Ok(output) => Err(ToolError::Failed {
            tool: tool.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ToolError::NotFound(not_found_hint.to_string()))
        }
        Err(e) => Err(ToolError::Io(e)),
    }
}
