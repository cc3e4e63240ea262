//! Deduplicator/merger for extracted cards
//!
//! Collapses cards that are structurally identical across rows/SKUs into one
//! logical card carrying the union of their SKUs. Shared card types merge on
//! `(card_type, content)`; specification tables are keyed `(sku, title)` and
//! never merge across SKUs.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::domain::card::{Card, DedupKey};

/// Content-identity merge over a card list
///
/// Merging is idempotent: running it over an already merged list yields the
/// same list. Placeholder and format-error cards are passed through unmerged
/// because each occurrence needs separate operator follow-up.
#[derive(Debug, Clone, Default)]
pub struct MergeService;

impl MergeService {
    pub fn new() -> Self {
        Self
    }

    /// Collapse structural duplicates, widening the survivor's SKU set
    pub fn merge(&self, cards: Vec<Card>) -> Vec<Card> {
        let input_count = cards.len();
        let mut merged: Vec<Card> = Vec::with_capacity(input_count);
        let mut index_by_key: HashMap<DedupKey, usize> = HashMap::new();

        for card in cards {
            if card.is_placeholder || card.is_format_error {
                merged.push(card);
                continue;
            }

            let key = card.dedup_key();
            match index_by_key.get(&key) {
                Some(&i) => {
                    let survivor = &mut merged[i];
                    for sku in &card.associated_skus {
                        survivor.associate_sku(sku);
                    }
                    debug!(
                        card_type = %card.card_type,
                        sku = %card.sku,
                        "merged duplicate card into existing logical card"
                    );
                }
                None => {
                    index_by_key.insert(key, merged.len());
                    merged.push(card);
                }
            }
        }

        if merged.len() < input_count {
            info!(
                input = input_count,
                output = merged.len(),
                "merge collapsed {} duplicate cards",
                input_count - merged.len()
            );
        }

        merged
    }
}
