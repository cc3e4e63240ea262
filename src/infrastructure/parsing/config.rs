//! Extraction selector configuration
//!
//! Centralized CSS selector vocabulary for pulling card fields out of
//! channel cell fragments. Each card type carries fallback selector lists:
//! canonical class-based selectors first, then looser element selectors that
//! tolerate minimal/legacy fragments.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::card::CardType;

/// Selector lists for one card type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardSelectors {
    /// Top-level card container selectors, tried in order
    pub container: Vec<String>,
    pub title: Vec<String>,
    pub subtitle: Vec<String>,
    /// Body element whose inner HTML becomes the card content
    pub content: Vec<String>,
    /// Image element selectors; the `src` attribute becomes the image URL
    pub image: Vec<String>,
    pub price: Vec<String>,
}

/// Full extraction configuration, one selector set per card type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub feature: CardSelectors,
    pub product_options: CardSelectors,
    pub cargo_options: CardSelectors,
    pub weather_protection: CardSelectors,
    pub specification_table: CardSelectors,
}

impl ExtractionConfig {
    /// Load a selector configuration from a JSON file
    ///
    /// Deployments with channel-specific markup override the built-in
    /// vocabulary this way; a missing file is the caller's decision to
    /// handle, a malformed one is a deployment error.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading selector config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing selector config {}", path.display()))
    }

    pub fn selectors_for(&self, card_type: CardType) -> &CardSelectors {
        match card_type {
            CardType::Feature => &self.feature,
            CardType::ProductOptions => &self.product_options,
            CardType::CargoOptions => &self.cargo_options,
            CardType::WeatherProtection => &self.weather_protection,
            CardType::SpecificationTable => &self.specification_table,
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| (*s).to_string()).collect()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            feature: CardSelectors {
                container: strings(&["div.feature", "div.feature-card"]),
                title: strings(&[".feature-title", "h2", "h3"]),
                subtitle: strings(&[".feature-subtitle"]),
                content: strings(&[".feature-body", "p"]),
                image: strings(&[".feature-image img", "img"]),
                price: strings(&[]),
            },
            product_options: CardSelectors {
                container: strings(&["div.product-option", "div.option-card"]),
                title: strings(&[".option-title", "h2", "h3"]),
                subtitle: strings(&[".option-subtitle"]),
                content: strings(&[".option-body", "p"]),
                image: strings(&[".option-image img", "img"]),
                price: strings(&[".option-price", ".price"]),
            },
            cargo_options: CardSelectors {
                container: strings(&["div.cargo-option", "div.cargo-card"]),
                title: strings(&[".cargo-title", "h2", "h3"]),
                subtitle: strings(&[".cargo-subtitle"]),
                content: strings(&[".cargo-body", "p"]),
                image: strings(&[".cargo-image img", "img"]),
                price: strings(&[".cargo-price", ".price"]),
            },
            weather_protection: CardSelectors {
                container: strings(&["div.weather-option", "div.weather-card"]),
                title: strings(&[".weather-title", "h2", "h3"]),
                subtitle: strings(&[".weather-subtitle"]),
                content: strings(&[".weather-body", "p"]),
                image: strings(&[".weather-image img", "img"]),
                price: strings(&[]),
            },
            specification_table: CardSelectors {
                container: strings(&["table.spec-table", "table"]),
                title: strings(&[".spec-table-title", "thead th", "caption"]),
                subtitle: strings(&[]),
                content: strings(&["tbody"]),
                image: strings(&[]),
                price: strings(&[]),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn config_round_trips_through_json_file() {
        let mut config = ExtractionConfig::default();
        config.feature.container.push("div.hero-card".to_string());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string_pretty(&config).unwrap().as_bytes())
            .unwrap();

        let loaded = ExtractionConfig::from_json_file(file.path()).unwrap();
        assert_eq!(loaded.feature.container, config.feature.container);
        assert_eq!(loaded.specification_table.content, vec!["tbody".to_string()]);
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        assert!(ExtractionConfig::from_json_file(file.path()).is_err());
    }
}
