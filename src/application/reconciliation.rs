//! Reconciliation engine
//!
//! Compares the local card set (post-merge) against the channel's existing
//! rows and classifies each logical card as new, update, keep, remove, or
//! excluded. The output is a decision set for operator review; nothing is
//! ever applied automatically.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::application::events::{PipelineStage, ProgressSink, report};
use crate::application::session::ReconciliationSession;
use crate::domain::card::{Card, CardSource};
use crate::domain::decision::{CardAction, ReconcileOutcome, ReconciliationDecision};
use crate::infrastructure::renderer::{CardRenderer, fragments_differ};
use crate::infrastructure::rows::{ColumnFamily, RowRecord};
use crate::infrastructure::templates::TemplateRegistry;

fn normalize_sku(sku: &str) -> String {
    sku.trim().to_uppercase()
}

/// Classifies local cards against channel rows
pub struct ReconciliationEngine {
    renderer: CardRenderer,
}

impl ReconciliationEngine {
    pub fn new(renderer: CardRenderer) -> Self {
        Self { renderer }
    }

    pub fn with_builtin_templates() -> Self {
        Self::new(CardRenderer::new(TemplateRegistry::builtin()))
    }

    /// Run one reconciliation pass over a session snapshot
    ///
    /// The snapshot is never mutated; the pass returns a fresh decision set.
    /// Cancellation is checked between SKU groups and yields partial
    /// decisions marked `cancelled`.
    pub fn reconcile(
        &self,
        session: &ReconciliationSession,
        progress: Option<&dyn ProgressSink>,
    ) -> ReconcileOutcome {
        let cards = self.attach_configurations(session);
        let mut outcome = ReconcileOutcome::default();

        // Placeholders and format errors are never export ready; they are
        // reported, not silently skipped.
        for card in &cards {
            if card.is_placeholder || card.is_format_error {
                outcome.decisions.push(ReconciliationDecision::for_card(
                    card,
                    CardAction::Excluded,
                    "placeholder card awaiting operator repair",
                ));
            }
        }

        let groups = self.sku_groups(&cards);
        let excluded_skus = self.completeness_gate(&cards, &groups);

        let total_groups = groups.len();
        let mut classified: HashSet<usize> = HashSet::new();
        let mut decision_by_card: HashMap<usize, usize> = HashMap::new();

        for (processed, (sku, indices)) in groups.iter().enumerate() {
            if session.cancellation.is_cancelled() {
                warn!(processed, total = total_groups, "reconciliation pass cancelled");
                outcome.cancelled = true;
                break;
            }

            debug!(sku = %sku, cards = indices.len(), "reconciling SKU group");
            for &i in indices {
                if !classified.insert(i) {
                    continue;
                }
                let card = &cards[i];

                let decision = if let Some(excluded_sku) =
                    self.first_excluded_sku(card, &excluded_skus)
                {
                    let mut decision = ReconciliationDecision::for_card(
                        card,
                        CardAction::Excluded,
                        format!("SKU {excluded_sku} failed the completeness gate"),
                    );
                    decision.missing_fields = self.missing_fields(card);
                    decision
                } else {
                    self.classify(card, &session.channel_rows)
                };

                decision_by_card.insert(i, outcome.decisions.len());
                outcome.decisions.push(decision);
            }

            report(progress, PipelineStage::Reconciliation, processed + 1, total_groups);
        }

        if !outcome.cancelled {
            self.promote_sku_groups(&groups, &decision_by_card, &mut outcome);
            self.report_unmatched_channel_slots(&cards, &session.channel_rows, &mut outcome);
        }

        info!(summary = %outcome.summary(), "reconciliation pass finished");
        outcome
    }

    /// Attach the matching product family to each card
    fn attach_configurations(&self, session: &ReconciliationSession) -> Vec<Card> {
        let mut cards = session.local_cards.clone();
        for card in &mut cards {
            if card.configuration.is_some() {
                continue;
            }
            card.configuration = session
                .configurations
                .iter()
                .find(|config| card.associated_skus.iter().any(|sku| config.matches_sku(sku)))
                .cloned();
        }
        cards
    }

    /// Every SKU a card touches: its associated SKUs plus all variant SKUs
    /// of the matching configuration
    fn touched_skus(&self, card: &Card) -> BTreeSet<String> {
        let mut skus: BTreeSet<String> =
            card.associated_skus.iter().map(|s| normalize_sku(s)).collect();
        if let Some(config) = &card.configuration {
            skus.extend(config.all_skus().map(normalize_sku));
        }
        skus
    }

    /// Group exportable cards by every SKU they touch
    fn sku_groups(&self, cards: &[Card]) -> BTreeMap<String, Vec<usize>> {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, card) in cards.iter().enumerate() {
            if card.is_placeholder || card.is_format_error {
                continue;
            }
            for sku in self.touched_skus(card) {
                groups.entry(sku).or_default().push(i);
            }
        }
        groups
    }

    /// Completeness fields a card is missing for export
    ///
    /// Required fields come from the template registry; a set image URL must
    /// point at hosted storage (http/https) before export is allowed.
    fn missing_fields(&self, card: &Card) -> Vec<String> {
        let template = self.renderer.registry().template_for(card.card_type);
        let mut missing = Vec::new();

        for field in &template.required_fields {
            let value = match field.as_str() {
                "title" => &card.title,
                "subtitle" => &card.subtitle,
                "content" => &card.content,
                "image_url" => &card.image_url,
                "price" => &card.price,
                _ => continue,
            };
            if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                missing.push(field.clone());
            }
        }

        if let Some(image_url) = card.image_url.as_deref() {
            let url = image_url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                missing.push("image_url (not hosted)".to_string());
            }
        }

        missing
    }

    /// Step 1: any incomplete card excludes its entire SKU from export
    fn completeness_gate(
        &self,
        cards: &[Card],
        groups: &BTreeMap<String, Vec<usize>>,
    ) -> BTreeSet<String> {
        let mut excluded = BTreeSet::new();
        for (sku, indices) in groups {
            for &i in indices {
                let missing = self.missing_fields(&cards[i]);
                if !missing.is_empty() {
                    debug!(
                        sku = %sku,
                        card_type = %cards[i].card_type,
                        missing = ?missing,
                        "SKU excluded from export by incomplete card"
                    );
                    excluded.insert(sku.clone());
                    break;
                }
            }
        }
        excluded
    }

    fn first_excluded_sku(&self, card: &Card, excluded: &BTreeSet<String>) -> Option<String> {
        self.touched_skus(card)
            .into_iter()
            .find(|sku| excluded.contains(sku))
    }

    /// Step 2: classify one card against the channel rows
    ///
    /// Every matched row's slot counts: a card only classifies `keep` when
    /// the slot is populated and matching on every row hosting an associated
    /// SKU. One empty or differing slot anywhere forces a rewrite so no SKU's
    /// coverage is left silently incomplete.
    fn classify(&self, card: &Card, channel_rows: &[RowRecord]) -> ReconciliationDecision {
        let matched_rows: Vec<&RowRecord> = channel_rows
            .iter()
            .filter(|row| card.associated_skus.iter().any(|sku| row.matches_sku(sku)))
            .collect();

        if matched_rows.is_empty() {
            return ReconciliationDecision::for_card(
                card,
                CardAction::Remove,
                "no channel row hosts any associated SKU",
            );
        }

        let column = ColumnFamily::column_name(card.card_type, card.position);
        let cells: Vec<Option<&str>> = matched_rows
            .iter()
            .map(|row| row.get(&column).map(str::trim).filter(|cell| !cell.is_empty()))
            .collect();

        if cells.iter().all(Option::is_none) {
            return ReconciliationDecision::for_card(
                card,
                CardAction::New,
                "channel slot is empty",
            );
        }

        if card.source == CardSource::Channel {
            // Channel-imported cards are always regenerated so formatting
            // stays current even when the text is unchanged.
            return ReconciliationDecision::for_card(
                card,
                CardAction::Update,
                "channel-imported card is regenerated on export",
            );
        }

        if cells.iter().any(Option::is_none) {
            return ReconciliationDecision::for_card(
                card,
                CardAction::Update,
                "channel slot is empty for part of the associated SKUs",
            );
        }

        let rendered = self.renderer.render_card(card);
        if cells
            .iter()
            .flatten()
            .any(|cell| fragments_differ(&rendered, cell))
        {
            ReconciliationDecision::for_card(
                card,
                CardAction::Update,
                "local card differs from channel cell",
            )
        } else {
            ReconciliationDecision::for_card(
                card,
                CardAction::Keep,
                "channel cell already matches",
            )
        }
    }

    /// Step 3: once any card of a SKU is new/update, every keep for that SKU
    /// becomes update; the channel serializes all of a SKU's cards
    /// together, so a partial write would desynchronize the row
    fn promote_sku_groups(
        &self,
        groups: &BTreeMap<String, Vec<usize>>,
        decision_by_card: &HashMap<usize, usize>,
        outcome: &mut ReconcileOutcome,
    ) {
        for (sku, indices) in groups {
            let decision_indices: Vec<usize> = indices
                .iter()
                .filter_map(|i| decision_by_card.get(i).copied())
                .collect();

            let touched = decision_indices.iter().any(|&d| {
                matches!(
                    outcome.decisions[d].action,
                    CardAction::New | CardAction::Update
                )
            });
            if !touched {
                continue;
            }

            for &d in &decision_indices {
                let decision = &mut outcome.decisions[d];
                if decision.action == CardAction::Keep {
                    decision.action = CardAction::Update;
                    decision.reason = format!("promoted: SKU {sku} row is being rewritten");
                }
            }
        }
    }

    /// Step 4: populated channel slots with no local counterpart are
    /// explicit deletion candidates, never auto-applied
    fn report_unmatched_channel_slots(
        &self,
        cards: &[Card],
        channel_rows: &[RowRecord],
        outcome: &mut ReconcileOutcome,
    ) {
        for row in channel_rows {
            let Some(row_sku) = row.sku() else { continue };

            for (card_type, position, _column, cell) in row.card_cells() {
                if cell.trim().is_empty() {
                    continue;
                }
                let covered = cards.iter().any(|card| {
                    card.card_type == card_type
                        && card.position == position
                        && card
                            .associated_skus
                            .iter()
                            .any(|sku| normalize_sku(sku) == normalize_sku(row_sku))
                });
                if covered {
                    continue;
                }

                outcome.decisions.push(ReconciliationDecision {
                    card_id: None,
                    card_type,
                    position,
                    action: CardAction::Remove,
                    reason: "exists in channel but not locally".to_string(),
                    associated_skus: std::iter::once(row_sku.to_string()).collect(),
                    missing_fields: Vec::new(),
                });
            }
        }
    }
}

/// Applies a decision set to channel rows for export
///
/// New/update slots are re-rendered; keep slots and unrecognized columns are
/// left untouched; remove and excluded decisions change nothing without
/// operator confirmation.
pub struct ExportWriter {
    renderer: CardRenderer,
}

impl ExportWriter {
    pub fn new(renderer: CardRenderer) -> Self {
        Self { renderer }
    }

    pub fn apply(
        &self,
        cards: &[Card],
        outcome: &ReconcileOutcome,
        channel_rows: &[RowRecord],
    ) -> Vec<RowRecord> {
        let card_by_id: HashMap<&str, &Card> =
            cards.iter().map(|card| (card.id.as_str(), card)).collect();
        let mut rows: Vec<RowRecord> = channel_rows.to_vec();

        for decision in &outcome.decisions {
            if !matches!(decision.action, CardAction::New | CardAction::Update) {
                continue;
            }
            let Some(card) = decision
                .card_id
                .as_deref()
                .and_then(|id| card_by_id.get(id))
            else {
                continue;
            };

            let column = ColumnFamily::column_name(decision.card_type, decision.position);
            let rendered = self.renderer.render_card(card);

            for row in &mut rows {
                let hosts = decision
                    .associated_skus
                    .iter()
                    .any(|sku| row.matches_sku(sku));
                if hosts {
                    row.set(column.clone(), rendered.clone());
                }
            }
        }

        rows
    }
}
