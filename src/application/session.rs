//! Reconciliation session and cancellation
//!
//! One pass works on an explicit snapshot of rows, cards, and configurations
//! carried in a session value object; no component reads or writes global
//! state, and the engine never mutates the snapshot in place.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::card::Card;
use crate::domain::configuration::Configuration;
use crate::infrastructure::rows::RowRecord;

/// Cooperative cancellation flag
///
/// Checked between SKU-level iterations; a cancelled pass returns the
/// decisions computed so far with a cancelled marker and commits nothing.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Snapshot of everything one reconciliation pass needs
#[derive(Debug, Clone, Default)]
pub struct ReconciliationSession {
    /// Channel rows as last exported/imported
    pub channel_rows: Vec<RowRecord>,
    /// Local cards, post-merge
    pub local_cards: Vec<Card>,
    /// Product families from the configuration store
    pub configurations: Vec<Configuration>,
    pub cancellation: CancellationFlag,
}

impl ReconciliationSession {
    pub fn new(
        channel_rows: Vec<RowRecord>,
        local_cards: Vec<Card>,
        configurations: Vec<Configuration>,
    ) -> Self {
        Self {
            channel_rows,
            local_cards,
            configurations,
            cancellation: CancellationFlag::new(),
        }
    }

    /// Use an externally owned cancellation flag
    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }
}
