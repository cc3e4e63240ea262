//! HTML fragment parsing infrastructure
//!
//! Trait-based extraction architecture over `scraper`, with pre-compiled
//! fallback selector sets per card type and typed, recoverable errors.

pub mod card_extractor;
pub mod config;
pub mod context;
pub mod error;

// Re-export public types
pub use card_extractor::CardExtractor;
pub use config::{CardSelectors, ExtractionConfig};
pub use context::RowParseContext;
pub use error::{ParsingError, ParsingResult};
