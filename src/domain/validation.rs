//! Validation result types
//!
//! Produced per card by the validator and consumed immediately; never
//! persisted. Errors are fatal (the card becomes a placeholder), warnings
//! are attached for operator visibility and block nothing.

use serde::{Deserialize, Serialize};

/// Outcome of validating one card
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Fold another result's findings into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_until_first_error() {
        let mut result = ValidationResult::new();
        result.warning("image missing");
        assert!(result.is_valid());
        result.error("title missing");
        assert!(!result.is_valid());
    }

    #[test]
    fn merge_folds_both_finding_lists() {
        let mut result = ValidationResult::new();
        result.warning("image missing");

        let mut other = ValidationResult::new();
        other.error("title missing");
        result.merge(other);

        assert_eq!(result.errors, vec!["title missing"]);
        assert_eq!(result.warnings, vec!["image missing"]);
    }
}
