//! Progress events and cancellation for extractions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

/// Events emitted while a paged document is processed.
///
/// Single-image documents emit nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionEvent {
    /// Paged extraction started.
    DocumentStarted {
        document_id: String,
        total_pages: u32,
    },
    /// A page was recognized and appended.
    PageCompleted {
        document_id: String,
        page_number: u32,
        total_pages: u32,
        /// `page_number / total_pages`, in `[1/n, 1.0]`.
        fraction: f64,
    },
}

/// Best-effort sender for extraction events.
///
/// Sending never waits: an event that does not fit in the channel is
/// dropped, and a dropped receiver never fails the extraction.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    tx: Option<mpsc::Sender<ExtractionEvent>>,
}

impl ProgressReporter {
    pub fn new(tx: mpsc::Sender<ExtractionEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A reporter that discards every event.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub(crate) fn report(&self, event: ExtractionEvent) {
        let Some(ref tx) = self.tx else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::debug!("Progress channel full, dropping {:?}", event);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Progress receiver dropped, continuing without progress");
            }
        }
    }
}

impl From<mpsc::Sender<ExtractionEvent>> for ProgressReporter {
    fn from(tx: mpsc::Sender<ExtractionEvent>) -> Self {
        Self::new(tx)
    }
}

/// Shared flag checked between pages.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
