//! End-to-end reconciliation tests over realistic row snapshots.

use channel_cards::domain::card::{Card, CardSource, CardType};
use channel_cards::domain::configuration::{Configuration, Variant};
use channel_cards::{
    CardAction, CardRenderer, ExportWriter, ReconciliationEngine, ReconciliationSession,
    RowRecord, TemplateRegistry,
};

fn feature(sku: &str, position: u32, title: &str, content: &str) -> Card {
    let mut card = Card::new(sku, CardType::Feature, position);
    card.title = Some(title.to_string());
    card.content = Some(content.to_string());
    card.image_url = Some("https://cdn.example.com/img.jpg".to_string());
    card
}

fn channel_row(sku: &str) -> RowRecord {
    let mut row = RowRecord::new();
    row.set("sku", sku);
    row
}

#[test]
fn untouched_sku_keeps_cards_touched_sku_promotes_keeps() {
    let renderer = CardRenderer::new(TemplateRegistry::builtin());
    let engine = ReconciliationEngine::with_builtin_templates();

    // F100: one matching card and one new one. F200: one matching card only.
    let f100_kept = feature("F100", 1, "Lights", "Bright LED");
    let f100_new = feature("F100", 2, "Rack", "Steel rack");
    let f200_kept = feature("F200", 1, "Bell", "Loud bell");

    let mut row_a = channel_row("F100");
    row_a.set("shared.feature-1-card", renderer.render_card(&f100_kept));
    let mut row_b = channel_row("F200");
    row_b.set("shared.feature-1-card", renderer.render_card(&f200_kept));

    let session = ReconciliationSession::new(
        vec![row_a, row_b],
        vec![f100_kept, f100_new, f200_kept.clone()],
        vec![],
    );
    let outcome = engine.reconcile(&session, None);

    // F100's keep is promoted to update because the SKU row is rewritten.
    assert_eq!(outcome.new_cards().len(), 1);
    assert_eq!(outcome.updates().len(), 1);
    // F200's card is untouched and stays a keep.
    let keeps = outcome.keeps();
    assert_eq!(keeps.len(), 1);
    assert_eq!(keeps[0].card_id.as_deref(), Some(f200_kept.id.as_str()));
}

#[test]
fn incomplete_variant_excludes_the_whole_family() {
    let engine = ReconciliationEngine::with_builtin_templates();
    let config = Configuration {
        brand: "Acme".into(),
        model: "Cargo".into(),
        generation: "G2".into(),
        variants: vec![
            Variant { name: "Long".into(), sku: "F100".into() },
            Variant { name: "Short".into(), sku: "F200".into() },
        ],
    };

    let complete = feature("F100", 1, "Lights", "Bright LED");
    let mut incomplete = Card::new("F200", CardType::ProductOptions, 1);
    incomplete.title = Some("Rain cover".into());
    incomplete.content = Some("Full cover".into());

    let session = ReconciliationSession::new(
        vec![channel_row("F100"), channel_row("F200")],
        vec![complete, incomplete],
        vec![config],
    );
    let outcome = engine.reconcile(&session, None);

    // The missing price on F200 blocks F100 as well.
    assert_eq!(outcome.excluded().len(), 2);
    assert!(outcome.new_cards().is_empty());
    assert!(outcome
        .excluded()
        .iter()
        .any(|d| d.missing_fields.contains(&"price".to_string())));
}

#[test]
fn one_character_content_change_flips_keep_to_update() {
    let renderer = CardRenderer::new(TemplateRegistry::builtin());
    let engine = ReconciliationEngine::with_builtin_templates();

    let card = feature("F100", 1, "Lights", "Bright LED");
    let mut row = channel_row("F100");
    row.set("shared.feature-1-card", renderer.render_card(&card));

    let session = ReconciliationSession::new(vec![row.clone()], vec![card.clone()], vec![]);
    assert_eq!(engine.reconcile(&session, None).keeps().len(), 1);

    let mut changed = card;
    changed.content = Some("Bright LEDs".into());
    let session = ReconciliationSession::new(vec![row], vec![changed], vec![]);
    let outcome = engine.reconcile(&session, None);
    assert_eq!(outcome.keeps().len(), 0);
    assert_eq!(outcome.updates().len(), 1);
}

#[test]
fn whitespace_only_channel_difference_is_a_keep() {
    let renderer = CardRenderer::new(TemplateRegistry::builtin());
    let engine = ReconciliationEngine::with_builtin_templates();

    let card = feature("F100", 1, "Lights", "Bright LED");
    let reformatted = renderer
        .render_card(&card)
        .replace("><", ">\n  <");
    let mut row = channel_row("F100");
    row.set("shared.feature-1-card", reformatted);

    let session = ReconciliationSession::new(vec![row], vec![card], vec![]);
    assert_eq!(engine.reconcile(&session, None).keeps().len(), 1);
}

#[test]
fn placeholder_blocks_nothing_but_is_reported() {
    let engine = ReconciliationEngine::with_builtin_templates();

    let complete = feature("F100", 1, "Lights", "Bright LED");
    let mut placeholder = Card::new("F100", CardType::ProductOptions, 1);
    placeholder.is_placeholder = true;
    placeholder.content = Some("<div class=\"card-error-panel\">…</div>".into());

    let session = ReconciliationSession::new(
        vec![channel_row("F100")],
        vec![complete, placeholder],
        vec![],
    );
    let outcome = engine.reconcile(&session, None);

    // The placeholder does not fail the completeness gate for F100.
    assert_eq!(outcome.new_cards().len(), 1);
    assert_eq!(outcome.excluded().len(), 1);
    assert!(outcome.excluded()[0].reason.contains("placeholder"));
}

#[test]
fn export_round_trip_converges_to_all_keeps() {
    let renderer = CardRenderer::new(TemplateRegistry::builtin());
    let engine = ReconciliationEngine::with_builtin_templates();
    let writer = ExportWriter::new(renderer);

    let cards = vec![
        feature("F100", 1, "Lights", "Bright LED"),
        feature("F100", 2, "Rack", "Steel rack"),
    ];
    let rows = vec![channel_row("F100")];

    let session = ReconciliationSession::new(rows, cards.clone(), vec![]);
    let first = engine.reconcile(&session, None);
    assert_eq!(first.new_cards().len(), 2);

    let exported = writer.apply(&session.local_cards, &first, &session.channel_rows);

    // Reconciling against the exported rows changes nothing further.
    let session = ReconciliationSession::new(exported, cards, vec![]);
    let second = engine.reconcile(&session, None);
    assert_eq!(second.keeps().len(), 2);
    assert!(second.new_cards().is_empty());
    assert!(second.updates().is_empty());
    assert!(second.removals().is_empty());
}

#[test]
fn channel_sourced_card_updates_even_when_cell_matches() {
    let renderer = CardRenderer::new(TemplateRegistry::builtin());
    let engine = ReconciliationEngine::with_builtin_templates();

    let mut card = feature("F100", 1, "Lights", "Bright LED");
    card.source = CardSource::Channel;
    let mut row = channel_row("F100");
    row.set("shared.feature-1-card", renderer.render_card(&card));

    let session = ReconciliationSession::new(vec![row], vec![card], vec![]);
    let outcome = engine.reconcile(&session, None);
    assert_eq!(outcome.updates().len(), 1);
}

#[test]
fn orphaned_channel_slots_surface_as_removals() {
    let engine = ReconciliationEngine::with_builtin_templates();

    let mut row = channel_row("F100");
    row.set(
        "shared.weather-option-1-card",
        "<div class='weather-option'><h2>Canopy</h2><p>Full canopy</p></div>",
    );

    let session = ReconciliationSession::new(vec![row], vec![], vec![]);
    let outcome = engine.reconcile(&session, None);

    let removals = outcome.removals();
    assert_eq!(removals.len(), 1);
    assert!(removals[0].card_id.is_none());
    assert_eq!(removals[0].card_type, CardType::WeatherProtection);
    assert_eq!(removals[0].action, CardAction::Remove);
}
