//! Application layer: import and reconciliation pipelines
//!
//! Orchestrates the infrastructure services over domain state. The import
//! pipeline turns channel rows into validated, merged cards; the
//! reconciliation engine classifies those cards against the channel for
//! operator review.

pub mod events;
pub mod import;
pub mod reconciliation;
pub mod session;

pub use events::{PipelineStage, ProgressEvent, ProgressSink};
pub use import::{ImportOutcome, ImportPipeline};
pub use reconciliation::{ExportWriter, ReconciliationEngine};
pub use session::{CancellationFlag, ReconciliationSession};
