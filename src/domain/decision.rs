//! Reconciliation decisions
//!
//! A reconciliation pass classifies every surviving logical card against the
//! channel's existing rows and returns the whole decision set for operator
//! review. Decisions are transient: computed fresh per pass, never persisted,
//! and never applied automatically.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::card::{Card, CardType};

/// Per-card classification relative to the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardAction {
    /// Slot is empty in the channel; the card will be written fresh
    New,
    /// Channel cell differs (or the SKU is being touched anyway); rewrite
    Update,
    /// Channel cell already matches; leave untouched
    Keep,
    /// No channel row can host the card, or the channel has a populated slot
    /// with no local counterpart; deletion candidate pending confirmation
    Remove,
    /// The card's SKU failed the completeness gate; nothing for that SKU
    /// is exported
    Excluded,
}

impl std::fmt::Display for CardAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CardAction::New => "new",
            CardAction::Update => "update",
            CardAction::Keep => "keep",
            CardAction::Remove => "remove",
            CardAction::Excluded => "excluded",
        };
        write!(f, "{s}")
    }
}

/// One decision for one logical card (or one orphaned channel slot)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationDecision {
    /// Id of the local card, when one exists; orphaned channel slots have none
    pub card_id: Option<String>,
    pub card_type: CardType,
    pub position: u32,
    pub action: CardAction,
    pub reason: String,
    pub associated_skus: BTreeSet<String>,
    /// Missing completeness fields, populated for `Excluded` decisions
    pub missing_fields: Vec<String>,
}

impl ReconciliationDecision {
    pub fn for_card(card: &Card, action: CardAction, reason: impl Into<String>) -> Self {
        Self {
            card_id: Some(card.id.clone()),
            card_type: card.card_type,
            position: card.position,
            action,
            reason: reason.into(),
            associated_skus: card.associated_skus.clone(),
            missing_fields: Vec::new(),
        }
    }
}

/// Full result of one reconciliation pass, grouped by action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub decisions: Vec<ReconciliationDecision>,
    /// True when the pass was cancelled cooperatively; decisions cover only
    /// the SKUs processed before the cancellation point
    pub cancelled: bool,
}

impl ReconcileOutcome {
    fn with_action(&self, action: CardAction) -> Vec<&ReconciliationDecision> {
        self.decisions.iter().filter(|d| d.action == action).collect()
    }

    pub fn new_cards(&self) -> Vec<&ReconciliationDecision> {
        self.with_action(CardAction::New)
    }

    pub fn updates(&self) -> Vec<&ReconciliationDecision> {
        self.with_action(CardAction::Update)
    }

    pub fn keeps(&self) -> Vec<&ReconciliationDecision> {
        self.with_action(CardAction::Keep)
    }

    pub fn removals(&self) -> Vec<&ReconciliationDecision> {
        self.with_action(CardAction::Remove)
    }

    pub fn excluded(&self) -> Vec<&ReconciliationDecision> {
        self.with_action(CardAction::Excluded)
    }

    /// Summary line for logs and review UIs
    pub fn summary(&self) -> String {
        format!(
            "{} new, {} update, {} keep, {} remove, {} excluded{}",
            self.new_cards().len(),
            self.updates().len(),
            self.keeps().len(),
            self.removals().len(),
            self.excluded().len(),
            if self.cancelled { " (cancelled)" } else { "" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decisions_serialize_with_kebab_case_vocabulary() {
        let card = Card::new("F100", CardType::Feature, 1);
        let decision =
            ReconciliationDecision::for_card(&card, CardAction::New, "channel slot is empty");

        let json = serde_json::to_string(&decision).unwrap();
        assert!(json.contains("\"action\":\"new\""));
        assert!(json.contains("\"card_type\":\"feature\""));

        let back: ReconciliationDecision = serde_json::from_str(&json).unwrap();
        assert_eq!(back.action, CardAction::New);
        assert_eq!(back.card_id.as_deref(), Some(card.id.as_str()));
    }
}
