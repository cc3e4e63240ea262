//! Domain services
//!
//! Business logic that doesn't naturally fit within entities.

pub mod merge_service;

pub use merge_service::MergeService;
