//! Product family configuration
//!
//! Configurations are read-only input owned by an external configuration
//! store; the engine uses them to widen a card's SKU coverage to every
//! variant of the matching family.

use serde::{Deserialize, Serialize};

/// One sellable variant within a product family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    pub sku: String,
}

/// A product family: brand/model/generation plus its variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub brand: String,
    pub model: String,
    pub generation: String,
    pub variants: Vec<Variant>,
}

impl Configuration {
    /// All variant SKUs in this family
    pub fn all_skus(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.sku.as_str())
    }

    /// Case-insensitive, whitespace-trimmed SKU membership test
    pub fn matches_sku(&self, sku: &str) -> bool {
        let needle = sku.trim();
        self.variants
            .iter()
            .any(|v| v.sku.trim().eq_ignore_ascii_case(needle))
    }

    /// Display label used in decision reasons
    pub fn label(&self) -> String {
        format!("{} {} {}", self.brand, self.model, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_matching_is_case_insensitive_and_trimmed() {
        let config = Configuration {
            brand: "Acme".into(),
            model: "Cargo".into(),
            generation: "G2".into(),
            variants: vec![Variant { name: "Long".into(), sku: "F100-L".into() }],
        };

        assert!(config.matches_sku(" f100-l "));
        assert!(!config.matches_sku("F100-S"));
    }
}
