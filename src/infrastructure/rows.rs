//! Channel row records and the column-name pattern table
//!
//! A row record is the typed replacement for the source format's duck-typed
//! rows: an ordered map of column name to cell string. Card slots live in
//! numbered column families (`shared.feature-3-card`), resolved through one
//! compiled pattern table instead of per-function regexes.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::card::CardType;

/// Column carrying the spec-table fragment; no numbered family
pub const SPEC_TABLE_COLUMN: &str = "shared.spec-table";

static CARD_COLUMN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^shared\.(feature|option|cargo-option|weather-option)-([0-9]+)-card$")
        .expect("card column pattern is valid")
});

/// Data-driven mapping between channel column names and card slots
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnFamily;

impl ColumnFamily {
    /// Resolve a column name to its card type and 1-based slot position
    ///
    /// Returns `None` for unrecognized columns, which pass through untouched
    /// on export.
    pub fn parse(column: &str) -> Option<(CardType, u32)> {
        if column == SPEC_TABLE_COLUMN {
            return Some((CardType::SpecificationTable, 1));
        }

        let captures = CARD_COLUMN_PATTERN.captures(column)?;
        let card_type = match &captures[1] {
            "feature" => CardType::Feature,
            "option" => CardType::ProductOptions,
            "cargo-option" => CardType::CargoOptions,
            "weather-option" => CardType::WeatherProtection,
            _ => return None,
        };
        let position: u32 = captures[2].parse().ok()?;
        if position == 0 || position > card_type.max_slots() {
            return None;
        }

        Some((card_type, position))
    }

    /// Canonical column name for a card slot
    pub fn column_name(card_type: CardType, position: u32) -> String {
        match card_type {
            CardType::Feature => format!("shared.feature-{position}-card"),
            CardType::ProductOptions => format!("shared.option-{position}-card"),
            CardType::CargoOptions => format!("shared.cargo-option-{position}-card"),
            CardType::WeatherProtection => format!("shared.weather-option-{position}-card"),
            CardType::SpecificationTable => SPEC_TABLE_COLUMN.to_string(),
        }
    }
}

/// One channel row: ordered column-name → cell-value map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRecord {
    columns: BTreeMap<String, String>,
}

impl RowRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: BTreeMap<String, String>) -> Self {
        Self { columns }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.columns.insert(column.into(), value.into());
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The row's SKU, tolerating `sku`/`SKU`/`Sku` header spellings
    pub fn sku(&self) -> Option<&str> {
        self.header_value("sku")
    }

    /// The row's channel id column, if present
    pub fn id(&self) -> Option<&str> {
        self.header_value("id")
    }

    fn header_value(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Case-insensitive, whitespace-trimmed SKU comparison
    pub fn matches_sku(&self, sku: &str) -> bool {
        self.sku()
            .is_some_and(|own| own.eq_ignore_ascii_case(sku.trim()))
    }

    /// All recognized card-slot cells in this row, with their resolved slot
    pub fn card_cells(&self) -> impl Iterator<Item = (CardType, u32, &str, &str)> {
        self.columns.iter().filter_map(|(column, value)| {
            ColumnFamily::parse(column)
                .map(|(card_type, position)| (card_type, position, column.as_str(), value.as_str()))
        })
    }

    /// Whether the slot's cell exists and holds non-whitespace content
    pub fn slot_populated(&self, card_type: CardType, position: u32) -> bool {
        self.get(&ColumnFamily::column_name(card_type, position))
            .is_some_and(|cell| !cell.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("shared.feature-1-card", Some((CardType::Feature, 1)))]
    #[case("shared.option-4-card", Some((CardType::ProductOptions, 4)))]
    #[case("shared.cargo-option-2-card", Some((CardType::CargoOptions, 2)))]
    #[case("shared.weather-option-10-card", Some((CardType::WeatherProtection, 10)))]
    #[case("shared.spec-table", Some((CardType::SpecificationTable, 1)))]
    #[case("shared.feature-0-card", None)]
    #[case("shared.feature-11-card", None)]
    #[case("shared.feature-x-card", None)]
    #[case("description", None)]
    fn column_parsing(#[case] column: &str, #[case] expected: Option<(CardType, u32)>) {
        assert_eq!(ColumnFamily::parse(column), expected);
    }

    #[test]
    fn column_names_round_trip() {
        for card_type in CardType::ALL {
            for position in 1..=card_type.max_slots() {
                let column = ColumnFamily::column_name(card_type, position);
                assert_eq!(ColumnFamily::parse(&column), Some((card_type, position)));
            }
        }
    }

    #[test]
    fn sku_header_spellings() {
        let mut row = RowRecord::new();
        row.set("SKU", " F100 ");
        assert_eq!(row.sku(), Some("F100"));
        assert!(row.matches_sku("f100"));
    }
}
