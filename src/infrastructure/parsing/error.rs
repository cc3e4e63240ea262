//! Parsing error re-export
//!
//! The comprehensive parsing error types live next to the rest of the
//! infrastructure error handling.

pub use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
