//! Card entity and card-type vocabulary
//!
//! A card is one structured content block (feature, option, cargo,
//! weather-protection, or specification table) associated with one or more
//! SKUs. Cards are created by the extractor, widened by the merger, and
//! classified by the reconciliation engine.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The five card types the channel format understands
///
/// Each type determines its required fields, its column-name family in the
/// channel flat file, and its render template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardType {
    Feature,
    ProductOptions,
    CargoOptions,
    WeatherProtection,
    SpecificationTable,
}

impl CardType {
    /// All card types, in channel column order
    pub const ALL: [CardType; 5] = [
        CardType::Feature,
        CardType::ProductOptions,
        CardType::CargoOptions,
        CardType::WeatherProtection,
        CardType::SpecificationTable,
    ];

    /// Shared card types are identified by content and may apply to many
    /// SKUs; specification tables are scoped to exactly one SKU.
    pub fn is_shared(self) -> bool {
        !matches!(self, CardType::SpecificationTable)
    }

    /// Maximum number of slots the channel format allocates for this type
    pub fn max_slots(self) -> u32 {
        match self {
            CardType::SpecificationTable => 1,
            _ => 10,
        }
    }

    /// Human-readable name used in error panels and decision reasons
    pub fn display_name(self) -> &'static str {
        match self {
            CardType::Feature => "Feature",
            CardType::ProductOptions => "Product options",
            CardType::CargoOptions => "Cargo options",
            CardType::WeatherProtection => "Weather protection",
            CardType::SpecificationTable => "Specification table",
        }
    }
}

impl std::fmt::Display for CardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CardType::Feature => "feature",
            CardType::ProductOptions => "product-options",
            CardType::CargoOptions => "cargo-options",
            CardType::WeatherProtection => "weather-protection",
            CardType::SpecificationTable => "specification-table",
        };
        write!(f, "{s}")
    }
}

/// Where a card originally came from
///
/// Channel-imported cards are always re-rendered on export (classified
/// `update` even when semantically unchanged) so their formatting stays
/// current; locally authored cards are diffed against the channel cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardSource {
    Local,
    Channel,
}

/// Details preserved when a card failed extraction or validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderInfo {
    pub original_title: Option<String>,
    /// Raw fragment as it appeared in the cell, kept for manual repair
    pub original_content: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Details preserved when a single cell contained more than one card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatErrorInfo {
    /// Number of independent card containers detected in the cell
    pub card_count: usize,
    /// Raw cell content, kept for manual repair
    pub original_content: String,
    /// Titles of the detected sub-cards, in document order
    pub detected_titles: Vec<String>,
}

/// One structured content block associated with one or more SKUs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Opaque identifier generated at creation time
    pub id: String,
    /// Primary associated SKU
    pub sku: String,
    /// All SKUs sharing this logical card (always contains `sku`)
    pub associated_skus: BTreeSet<String>,
    pub card_type: CardType,
    /// 1-based slot index within this card type's column family
    pub position: u32,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    /// Rich text/HTML body
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<String>,
    /// Raw HTML fragment the card was extracted from, when it came from a
    /// channel cell; used for the render-and-diff format comparison
    pub source_html: Option<String>,
    pub source: CardSource,
    pub is_placeholder: bool,
    pub placeholder_info: Option<PlaceholderInfo>,
    pub is_format_error: bool,
    pub format_error_info: Option<FormatErrorInfo>,
    /// Non-fatal validation findings, attached for operator visibility
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Matching product family, attached during reconciliation
    pub configuration: Option<crate::domain::configuration::Configuration>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// Create an empty card shell for the given SKU, type, and slot
    pub fn new(sku: impl Into<String>, card_type: CardType, position: u32) -> Self {
        let sku = sku.into();
        let mut associated_skus = BTreeSet::new();
        associated_skus.insert(sku.clone());
        let now = Utc::now();

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sku,
            associated_skus,
            card_type,
            position,
            title: None,
            subtitle: None,
            content: None,
            image_url: None,
            price: None,
            source_html: None,
            source: CardSource::Local,
            is_placeholder: false,
            placeholder_info: None,
            is_format_error: false,
            format_error_info: None,
            warnings: Vec::new(),
            configuration: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A non-placeholder card must carry at least one of title, content, or
    /// image URL to be worth keeping.
    pub fn has_displayable_content(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.title) || filled(&self.content) || filled(&self.image_url)
    }

    /// Identity key used by the deduplicator/merger
    ///
    /// Shared card types are the same logical card when their type and
    /// normalized content match, regardless of SKU or title; the first
    /// occurrence's title survives the merge. Specification tables are keyed
    /// per SKU and title and never merge across SKUs.
    pub fn dedup_key(&self) -> DedupKey {
        if self.card_type.is_shared() {
            DedupKey::Shared {
                card_type: self.card_type,
                content: normalize_for_identity(self.content.as_deref().unwrap_or("")),
            }
        } else {
            DedupKey::PerSku {
                sku: self.sku.trim().to_uppercase(),
                title: normalize_for_identity(self.title.as_deref().unwrap_or("")),
            }
        }
    }

    /// Exact-duplicate key used to collapse accidental duplicate columns
    /// within one row before the cross-row merge runs.
    pub fn exact_key(&self) -> (CardType, String, String) {
        (
            self.card_type,
            self.title.clone().unwrap_or_default(),
            self.content.clone().unwrap_or_default(),
        )
    }

    /// Add a SKU to the associated set, keeping the primary SKU untouched
    pub fn associate_sku(&mut self, sku: &str) {
        let trimmed = sku.trim();
        if !trimmed.is_empty() {
            self.associated_skus.insert(trimmed.to_string());
            self.updated_at = Utc::now();
        }
    }
}

/// Merge identity for a card (see [`Card::dedup_key`])
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    Shared {
        card_type: CardType,
        content: String,
    },
    PerSku {
        sku: String,
        title: String,
    },
}

/// Collapse runs of whitespace so cosmetic formatting differences in
/// hand-edited cells do not split logical cards.
pub fn normalize_for_identity(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
