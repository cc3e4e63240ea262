//! Parsing error types for card extraction
//!
//! Detailed error types for HTML fragment parsing, with context-aware
//! reporting. Expected data-quality problems are modeled here as typed,
//! recoverable values; the pipeline turns them into placeholder cards rather
//! than propagating them as failures.

use thiserror::Error;

use crate::domain::card::CardType;

pub type ParsingResult<T> = Result<T, ParsingError>;

#[derive(Error, Debug, Clone)]
pub enum ParsingError {
    #[error("Required field '{field}' not found in card fragment")]
    RequiredFieldMissing {
        field: String,
        context: Option<String>,
    },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("HTML parsing failed: {message}")]
    HtmlParsingFailed {
        message: String,
        column: Option<String>,
    },

    #[error("Cell for {card_type} slot {position} contains {count} card containers")]
    MultipleCardsInCell {
        card_type: CardType,
        position: u32,
        count: usize,
        detected_titles: Vec<String>,
    },

    #[error("Column '{column}' does not belong to any card family")]
    ColumnNotRecognized { column: String },

    #[error("Row {row_index} has no usable SKU column")]
    SkuMissing { row_index: usize },

    #[error("Template for {card_type} is unusable: {reason}")]
    TemplateError { card_type: CardType, reason: String },

    #[error("Card validation failed: {reason}")]
    CardValidationFailed {
        reason: String,
        field_errors: Vec<String>,
    },
}

impl ParsingError {
    /// Create a required field missing error with context
    pub fn required_field_missing(field: &str, context: Option<&str>) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
            context: context.map(|s| s.to_string()),
        }
    }

    /// Create an invalid selector error
    pub fn invalid_selector(selector: &str, reason: &str) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a multi-card cell error carrying the detected sub-card titles
    pub fn multiple_cards(
        card_type: CardType,
        position: u32,
        detected_titles: Vec<String>,
    ) -> Self {
        Self::MultipleCardsInCell {
            card_type,
            position,
            count: detected_titles.len(),
            detected_titles,
        }
    }

    /// Whether the pipeline can continue past this error by substituting a
    /// placeholder card
    ///
    /// Selector and template problems are programming or deployment errors
    /// and should surface; everything else is a data-quality problem.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::InvalidSelector { .. } | Self::TemplateError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_quality_errors_are_recoverable() {
        let error = ParsingError::multiple_cards(
            CardType::Feature,
            1,
            vec!["Lights".into(), "Rack".into()],
        );
        assert!(error.is_recoverable());

        let error = ParsingError::invalid_selector("div..bad", "empty class");
        assert!(!error.is_recoverable());
    }
}
