//! JSON error responses.

use std::fmt;
use std::time::Duration;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::extract::ExtractionError;
use crate::ocr::OcrError;

/// An error rendered as `{"error": <code>, "message": <text>}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn timeout(limit: Duration) -> Self {
        Self::new(
            StatusCode::GATEWAY_TIMEOUT,
            "timeout",
            format!("extraction did not finish within {}s", limit.as_secs()),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        let status = match &err {
            ExtractionError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ExtractionError::EmptyDocument
            | ExtractionError::InvalidContent(_)
            | ExtractionError::InvalidImageInput(_) => StatusCode::BAD_REQUEST,
            ExtractionError::EngineNotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            ExtractionError::DocumentOpen(_)
            | ExtractionError::PageRender { .. }
            | ExtractionError::RecognitionEngine { .. } => StatusCode::BAD_GATEWAY,
            ExtractionError::Cancelled { .. } | ExtractionError::Payload(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.code(), err.to_string())
    }
}

/// Pool failures mean no engine could be leased.
impl From<OcrError> for ApiError {
    fn from(err: OcrError) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "engine_not_ready",
            err.to_string(),
        )
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), "invalid_request", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({
                "error": self.code,
                "message": self.message,
            })),
        )
            .into_response()
    }
}
