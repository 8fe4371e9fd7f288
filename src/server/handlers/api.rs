//! API endpoint handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use super::super::AppState;
use super::error::ApiError;
use crate::extract::{CancellationFlag, ProgressReporter};
use crate::models::SourceDocument;

/// Health check endpoint for container orchestration.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "backend": state.backend.as_str(),
        "engines": state.pool.size(),
        "engines_idle": state.pool.available(),
    }))
}

/// Extract every page of the posted document.
pub async fn api_extract(
    State(state): State<AppState>,
    body: Result<Json<SourceDocument>, JsonRejection>,
) -> Result<Json<SourceDocument>, ApiError> {
    let Json(document) = body.map_err(ApiError::from)?;
    let document_id = document.id().to_string();
    tracing::info!(
        "Extract request for {} ({})",
        document_id,
        document.media_type()
    );

    let work = async {
        let mut engine = state.pool.acquire().await.map_err(ApiError::from)?;
        if !engine.is_ready() {
            // Backends that were missing at startup may have been installed since.
            if let Err(e) = engine.initialize() {
                tracing::debug!("Engine still unavailable: {}", e);
            }
        }
        let progress = ProgressReporter::disabled();
        let cancel = CancellationFlag::new();
        state
            .extractor
            .extract(document, &mut engine, &progress, &cancel)
            .await
            .map_err(ApiError::from)
    };

    match tokio::time::timeout(state.request_timeout, work).await {
        Ok(Ok(document)) => Ok(Json(document)),
        Ok(Err(e)) => {
            tracing::warn!("Extraction of {} failed: {}", document_id, e);
            Err(e)
        }
        Err(_) => {
            tracing::warn!(
                "Extraction of {} timed out after {:?}",
                document_id,
                state.request_timeout
            );
            Err(ApiError::timeout(state.request_timeout))
        }
    }
}
