//! HTTP extraction service.
//!
//! - `GET /api/health` reports the configured backend and engine pool
//! - `POST /api/extract` runs one document through the pipeline
//!
//! Each request leases an engine from a fixed-size pool, so the pool
//! size bounds how many extractions run at once.

mod handlers;
mod routes;

pub use handlers::ApiError;
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::extract::DocumentExtractor;
use crate::ocr::{EnginePool, OcrBackendType};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<EnginePool>,
    pub extractor: Arc<DocumentExtractor>,
    pub backend: OcrBackendType,
    /// Upper bound on one extraction, including waiting for an engine.
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let engines = config.build_engines(config.ocr.pool_size)?;
        let ready = engines.iter().filter(|e| e.is_ready()).count();
        if ready < engines.len() {
            tracing::warn!(
                "{} of {} engines are not ready; extractions will fail with engine_not_ready",
                engines.len() - ready,
                engines.len()
            );
        }

        Ok(Self {
            pool: Arc::new(EnginePool::new(engines)?),
            extractor: Arc::new(config.build_extractor()?),
            backend: config.backend_type()?,
            request_timeout: config.server.request_timeout(),
            max_body_bytes: config.server.max_body_bytes(),
        })
    }
}

/// Start the web server.
pub async fn serve(config: &Config, addr: SocketAddr) -> anyhow::Result<()> {
    let state = AppState::new(config)?;
    let app = create_router(state);

    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
