//! Import pipeline
//!
//! Channel rows → extractor → validator → placeholder substitution → merge.
//! Cards that fail validation are never discarded: a placeholder of the same
//! SKU/type/position carries the original content and the findings, so SKU
//! coverage is never silently incomplete.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::application::events::{PipelineStage, ProgressSink, report};
use crate::application::session::CancellationFlag;
use crate::domain::card::{Card, CardSource, PlaceholderInfo};
use crate::domain::services::MergeService;
use crate::domain::validation::ValidationResult;
use crate::infrastructure::parsing::CardExtractor;
use crate::infrastructure::renderer::CardRenderer;
use crate::infrastructure::rows::RowRecord;
use crate::infrastructure::templates::TemplateRegistry;
use crate::infrastructure::validator::CardValidator;

/// Result of one import pass
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    /// Merged card list, placeholders included
    pub cards: Vec<Card>,
    /// Cards replaced by placeholders during this pass
    pub placeholder_count: usize,
    /// Cells that held more than one card
    pub format_error_count: usize,
    pub cancelled: bool,
}

/// Extraction/validation/merge pipeline over channel rows
pub struct ImportPipeline {
    extractor: CardExtractor,
    validator: CardValidator,
    renderer: CardRenderer,
    merger: MergeService,
}

impl ImportPipeline {
    /// Pipeline over the built-in template registry
    pub fn new() -> Result<Self> {
        Self::with_registry(TemplateRegistry::builtin())
    }

    pub fn with_registry(registry: TemplateRegistry) -> Result<Self> {
        let renderer = CardRenderer::new(registry);
        Ok(Self {
            extractor: CardExtractor::new(renderer.clone())?,
            validator: CardValidator::new(renderer.clone()),
            renderer,
            merger: MergeService::new(),
        })
    }

    /// Extract, validate, and merge cards from a row snapshot
    ///
    /// Rows without a usable SKU are skipped with a warning; only
    /// non-recoverable errors (selector/template problems) propagate.
    pub fn import_rows(
        &self,
        rows: &[RowRecord],
        source: CardSource,
        cancellation: &CancellationFlag,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<ImportOutcome> {
        let total = rows.len();
        info!(rows = total, "starting card import pass");

        let mut outcome = ImportOutcome::default();
        let mut extracted: Vec<(usize, Card)> = Vec::new();

        for (row_index, row) in rows.iter().enumerate() {
            if cancellation.is_cancelled() {
                warn!(processed = row_index, total, "import pass cancelled");
                outcome.cancelled = true;
                break;
            }

            match self.extractor.extract_row(row, row_index, source) {
                Ok(cards) => {
                    extracted.extend(cards.into_iter().map(|card| (row_index, card)));
                }
                Err(e) if e.is_recoverable() => {
                    warn!(row = row_index, error = %e, "skipping unusable row");
                }
                Err(e) => return Err(e.into()),
            }

            report(progress, PipelineStage::Extraction, row_index + 1, total);
        }

        let extracted_count = extracted.len();
        let mut validated: Vec<Card> = Vec::with_capacity(extracted_count);
        for (i, (row_index, card)) in extracted.into_iter().enumerate() {
            validated.push(self.validated(card, &rows[row_index], &mut outcome));
            report(progress, PipelineStage::Validation, i + 1, extracted_count);
        }

        outcome.cards = self.merger.merge(validated);
        report(progress, PipelineStage::Merge, outcome.cards.len(), extracted_count);

        info!(
            cards = outcome.cards.len(),
            placeholders = outcome.placeholder_count,
            format_errors = outcome.format_error_count,
            cancelled = outcome.cancelled,
            "import pass finished"
        );
        Ok(outcome)
    }

    /// Validate one extracted card, substituting a placeholder on fatal
    /// findings and attaching warnings otherwise
    fn validated(&self, mut card: Card, row: &RowRecord, outcome: &mut ImportOutcome) -> Card {
        if card.is_format_error {
            outcome.format_error_count += 1;
            return card;
        }

        let result = self.validator.validate(&card, Some(row));
        if result.is_valid() {
            card.warnings = result.warnings;
            return card;
        }

        debug!(
            sku = %card.sku,
            card_type = %card.card_type,
            "substituting placeholder for invalid card"
        );
        outcome.placeholder_count += 1;
        self.placeholder_for(&card, &result)
    }

    /// Placeholder card of the same SKU/type/position whose content is a
    /// human-readable error panel; the original fragment is preserved for
    /// manual recovery
    fn placeholder_for(&self, card: &Card, result: &ValidationResult) -> Card {
        let original_content = card
            .source_html
            .clone()
            .or_else(|| card.content.clone())
            .unwrap_or_default();

        let panel = self.renderer.render_error_panel(
            card.card_type,
            card.title.as_deref(),
            &result.errors,
            &result.warnings,
            &original_content,
        );

        let mut placeholder = Card::new(&card.sku, card.card_type, card.position);
        placeholder.is_placeholder = true;
        placeholder.content = Some(panel);
        placeholder.source = card.source;
        placeholder.source_html = card.source_html.clone();
        placeholder.placeholder_info = Some(PlaceholderInfo {
            original_title: card.title.clone(),
            original_content,
            errors: result.errors.clone(),
            warnings: result.warnings.clone(),
        });
        placeholder
    }
}
