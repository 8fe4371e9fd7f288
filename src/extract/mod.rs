//! Document extraction pipeline.
//!
//! `DocumentExtractor` validates a `SourceDocument`, routes it by media
//! class and returns it with one `PageResult` per page. Paged documents
//! are driven page by page through `PageAccumulator`.

mod accumulator;
mod error;
mod orchestrator;
mod progress;

pub use accumulator::{AccumulatorState, PageAccumulator};
pub use error::ExtractionError;
pub use orchestrator::DocumentExtractor;
pub use progress::{CancellationFlag, ExtractionEvent, ProgressReporter};
