//! Card extraction, validation, and reconciliation for channel CSV exports.
//!
//! E-commerce channels serialize rich product "cards" as HTML fragments
//! inside CSV cells. This crate parses those fragments back into structured
//! cards, validates them against canonical templates, deduplicates shared
//! cards across SKUs, and reconciles the local card set against the
//! channel's rows into a reviewable decision set. Nothing is written back
//! without an explicit export step.
//!
//! Layering follows a strict direction: `domain` holds the card model and
//! pure services, `infrastructure` the HTML/CSV machinery, `application`
//! the pipelines that orchestrate both.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{
    CancellationFlag, ExportWriter, ImportOutcome, ImportPipeline, ProgressEvent, ProgressSink,
    ReconciliationEngine, ReconciliationSession,
};
pub use domain::card::{Card, CardSource, CardType};
pub use domain::decision::{CardAction, ReconcileOutcome, ReconciliationDecision};
pub use infrastructure::renderer::CardRenderer;
pub use infrastructure::rows::RowRecord;
pub use infrastructure::templates::TemplateRegistry;
