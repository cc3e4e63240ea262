//! Parsing context for cell extraction
//!
//! Context objects carry the row/column coordinates a fragment came from so
//! that errors, placeholders, and logs can point back at the source cell.

use crate::domain::card::CardType;

/// Coordinates of the cell being extracted
#[derive(Debug, Clone)]
pub struct RowParseContext {
    /// 0-based index of the row within the input snapshot
    pub row_index: usize,
    /// SKU of the row the cell belongs to
    pub sku: String,
    /// Channel column name the cell came from
    pub column: String,
    pub card_type: CardType,
    /// 1-based slot position within the card type's column family
    pub position: u32,
}

impl RowParseContext {
    pub fn new(
        row_index: usize,
        sku: impl Into<String>,
        column: impl Into<String>,
        card_type: CardType,
        position: u32,
    ) -> Self {
        Self {
            row_index,
            sku: sku.into(),
            column: column.into(),
            card_type,
            position,
        }
    }
}
