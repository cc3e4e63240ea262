//! Pipeline progress events
//!
//! Progress reporting is an optional observer the host may subscribe to,
//! never a structural dependency of the engine: every pipeline entry point
//! accepts `Option<&dyn ProgressSink>` and works identically without one.

use serde::{Deserialize, Serialize};

/// Pipeline stage a progress event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStage {
    Extraction,
    Validation,
    Merge,
    Reconciliation,
}

/// One unit of reported progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub stage: PipelineStage,
    /// Items completed so far within the stage
    pub processed: usize,
    /// Total items the stage will process
    pub total: usize,
}

/// Observer for pipeline progress
pub trait ProgressSink {
    fn on_progress(&self, event: &ProgressEvent);
}

pub(crate) fn report(
    sink: Option<&dyn ProgressSink>,
    stage: PipelineStage,
    processed: usize,
    total: usize,
) {
    if let Some(sink) = sink {
        sink.on_progress(&ProgressEvent {
            stage,
            processed,
            total,
        });
    }
}
