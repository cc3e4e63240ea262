//! Infrastructure layer for HTML parsing, templates, rendering, and rows
//!
//! Provides the card extractor, the template registry and renderer, the
//! channel row record types, and the validator.

pub mod logging;
pub mod parsing;
pub mod parsing_error;
pub mod renderer;
pub mod rows;
pub mod templates;
pub mod validator;

// Re-export commonly used items
pub use logging::init_logging;
pub use parsing::{CardExtractor, ExtractionConfig, RowParseContext};
pub use parsing_error::{ParsingError, ParsingResult};
pub use renderer::{CardFields, CardRenderer, fragments_differ, html_fingerprint};
pub use rows::{ColumnFamily, RowRecord, SPEC_TABLE_COLUMN};
pub use templates::{CardTemplate, RequiredSelector, Severity, TemplateRegistry};
pub use validator::CardValidator;
