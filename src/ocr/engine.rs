//! Recognition engine handle and pool.
//!
//! A `RecognitionEngine` is a single stateful resource: recognition takes
//! `&mut self`, so one extraction owns the engine for its whole duration.
//! Concurrent extractions each lease their own engine from an `EnginePool`.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, OwnedSemaphorePermit, Semaphore};

use super::backend::{EngineOutput, ImageInput, OcrBackend, OcrBackendType, OcrError};

/// Owned handle to one OCR backend, usable once initialized.
pub struct RecognitionEngine {
    backend: Box<dyn OcrBackend>,
    ready: bool,
}

impl RecognitionEngine {
    /// Wrap a backend. The engine is not ready until `initialize` succeeds.
    pub fn new(backend: Box<dyn OcrBackend>) -> Self {
        Self {
            backend,
            ready: false,
        }
    }

    /// Verify the backend can run and mark the engine ready.
    pub fn initialize(&mut self) -> Result<(), OcrError> {
        if !self.backend.is_available() {
            self.ready = false;
            return Err(OcrError::BackendNotAvailable(
                self.backend.availability_hint(),
            ));
        }
        self.ready = true;
        tracing::debug!("{} recognition engine ready", self.backend.backend_type());
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn backend_type(&self) -> OcrBackendType {
        self.backend.backend_type()
    }

    pub fn availability_hint(&self) -> String {
        self.backend.availability_hint()
    }

    /// Recognize one image.
    pub async fn recognize(
        &mut self,
        image: &ImageInput,
        language: &str,
    ) -> Result<EngineOutput, OcrError> {
        if !self.ready {
            return Err(OcrError::BackendNotAvailable(format!(
                "{} engine has not been initialized",
                self.backend.backend_type()
            )));
        }
        self.backend.run_ocr(image, language).await
    }
}

/// Fixed-size pool of engines; its size bounds concurrent extractions.
pub struct EnginePool {
    engines: Vec<Arc<Mutex<RecognitionEngine>>>,
    permits: Arc<Semaphore>,
}

impl EnginePool {
    /// Build a pool from already-constructed engines.
    pub fn new(engines: Vec<RecognitionEngine>) -> Result<Self, OcrError> {
        if engines.is_empty() {
            return Err(OcrError::BackendNotAvailable(
                "engine pool needs at least one engine".to_string(),
            ));
        }
        let permits = Arc::new(Semaphore::new(engines.len()));
        Ok(Self {
            engines: engines
                .into_iter()
                .map(|e| Arc::new(Mutex::new(e)))
                .collect(),
            permits,
        })
    }

    pub fn size(&self) -> usize {
        self.engines.len()
    }

    /// Number of engines not currently leased.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Lease an engine, waiting until one is free.
    pub async fn acquire(&self) -> Result<PooledEngine, OcrError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| OcrError::BackendNotAvailable("engine pool closed".to_string()))?;

        // Holding a permit guarantees at least one unlocked engine.
        for engine in &self.engines {
            if let Ok(guard) = Arc::clone(engine).try_lock_owned() {
                return Ok(PooledEngine {
                    guard,
                    _permit: permit,
                });
            }
        }

        Err(OcrError::BackendNotAvailable(
            "no idle engine despite free permit".to_string(),
        ))
    }
}

/// An engine leased from an `EnginePool`, returned on drop.
pub struct PooledEngine {
    // Field order matters: the engine unlocks before the permit is released.
    guard: OwnedMutexGuard<RecognitionEngine>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledEngine {
    type Target = RecognitionEngine;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl DerefMut for PooledEngine {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}
