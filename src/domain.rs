//! Domain module - core business logic and entities
//!
//! Contains the card and configuration entities, the decision and validation
//! value objects, store traits, and the pure domain services.

pub mod card;
pub mod configuration;
pub mod decision;
pub mod services;
pub mod stores;
pub mod validation;

// Re-export commonly used items
pub use card::{Card, CardSource, CardType, FormatErrorInfo, PlaceholderInfo};
pub use configuration::{Configuration, Variant};
pub use decision::{CardAction, ReconcileOutcome, ReconciliationDecision};
pub use services::MergeService;
pub use stores::{CardStore, ConfigurationStore};
pub use validation::ValidationResult;
