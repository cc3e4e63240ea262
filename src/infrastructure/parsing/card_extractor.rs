//! Card extractor
//!
//! Parses HTML-embedded card fragments out of channel cells. Exactly one
//! container in a cell yields one structured card; zero containers fall back
//! to extracting directly from the fragment root (tolerates minimal/legacy
//! fragments); more than one container is a structural violation and yields
//! a single format-error placeholder enumerating the detected sub-cards.

use std::collections::{HashMap, HashSet};

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::config::{CardSelectors, ExtractionConfig};
use super::context::RowParseContext;
use crate::domain::card::{Card, CardSource, CardType, FormatErrorInfo};
use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
use crate::infrastructure::renderer::CardRenderer;
use crate::infrastructure::rows::RowRecord;

/// Pre-compiled selector set for one card type
#[derive(Debug, Clone)]
struct CompiledSelectors {
    container: Vec<Selector>,
    title: Vec<Selector>,
    subtitle: Vec<Selector>,
    content: Vec<Selector>,
    image: Vec<Selector>,
    price: Vec<Selector>,
}

/// Extracts structured cards from channel cell fragments
pub struct CardExtractor {
    selectors: HashMap<CardType, CompiledSelectors>,
    renderer: CardRenderer,
}

impl CardExtractor {
    /// Create an extractor with the default selector configuration
    pub fn new(renderer: CardRenderer) -> ParsingResult<Self> {
        Self::with_config(&ExtractionConfig::default(), renderer)
    }

    /// Create an extractor with a custom selector configuration
    pub fn with_config(config: &ExtractionConfig, renderer: CardRenderer) -> ParsingResult<Self> {
        let mut selectors = HashMap::new();
        for card_type in CardType::ALL {
            selectors.insert(card_type, Self::compile(config.selectors_for(card_type))?);
        }
        Ok(Self { selectors, renderer })
    }

    fn compile(config: &CardSelectors) -> ParsingResult<CompiledSelectors> {
        Ok(CompiledSelectors {
            container: Self::compile_selectors(&config.container)?,
            title: Self::compile_selectors(&config.title)?,
            subtitle: Self::compile_selectors(&config.subtitle)?,
            content: Self::compile_selectors(&config.content)?,
            image: Self::compile_selectors(&config.image)?,
            price: Self::compile_selectors(&config.price)?,
        })
    }

    /// Compile selector strings, tolerating individual failures as long as
    /// at least one selector of a non-empty list survives
    fn compile_selectors(selector_strings: &[String]) -> ParsingResult<Vec<Selector>> {
        let mut selectors = Vec::new();
        let mut errors = Vec::new();

        for selector_str in selector_strings {
            match Selector::parse(selector_str) {
                Ok(selector) => selectors.push(selector),
                Err(e) => {
                    warn!("Failed to compile selector '{}': {}", selector_str, e);
                    errors.push(format!("'{selector_str}': {e}"));
                }
            }
        }

        if selectors.is_empty() && !selector_strings.is_empty() {
            return Err(ParsingError::invalid_selector(
                &selector_strings.join(", "),
                &errors.join("; "),
            ));
        }

        Ok(selectors)
    }

    /// Extract all recognized card cells from one row
    ///
    /// In-row exact duplicates (same type, title, and content) collapse to
    /// one instance, defending against accidental duplicate columns.
    pub fn extract_row(
        &self,
        row: &RowRecord,
        row_index: usize,
        source: CardSource,
    ) -> ParsingResult<Vec<Card>> {
        let sku = row
            .sku()
            .ok_or(ParsingError::SkuMissing { row_index })?
            .to_string();

        let mut cards = Vec::new();
        let mut seen = HashSet::new();

        for (card_type, position, column, cell) in row.card_cells() {
            let context = RowParseContext::new(row_index, &sku, column, card_type, position);
            match self.extract_cell(cell, &context)? {
                Some(mut card) => {
                    card.source = source;
                    if !card.is_placeholder && !card.is_format_error && !seen.insert(card.exact_key())
                    {
                        debug!(
                            row = row_index,
                            column,
                            "collapsed exact duplicate card within row"
                        );
                        continue;
                    }
                    cards.push(card);
                }
                None => debug!(row = row_index, column, "cell yielded no card"),
            }
        }

        Ok(cards)
    }

    /// Extract zero or one card from a single cell
    ///
    /// Returns `Ok(None)` for empty cells and cells with no recognizable
    /// content; empty cells are expected and common, not errors.
    pub fn extract_cell(
        &self,
        cell: &str,
        context: &RowParseContext,
    ) -> ParsingResult<Option<Card>> {
        let raw = cell.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        let fragment = Html::parse_fragment(raw);
        let selectors = &self.selectors[&context.card_type];
        let containers = self.top_level_containers(&fragment, &selectors.container);

        match containers.len() {
            0 => {
                // Minimal/legacy fragment: extract from the document root.
                let card = self.card_from_scope(fragment.root_element(), raw, context);
                Ok(card)
            }
            1 => {
                let card = self.card_from_scope(containers[0], raw, context);
                Ok(card)
            }
            count => {
                warn!(
                    row = context.row_index,
                    column = %context.column,
                    count,
                    "cell contains multiple card containers; emitting format-error placeholder"
                );
                Ok(Some(self.format_error_card(raw, &containers, context)))
            }
        }
    }

    /// Locate top-level card container elements
    ///
    /// The first container selector that matches anything wins; matches
    /// nested inside another match are dropped so that each independent card
    /// counts exactly once.
    fn top_level_containers<'a>(
        &self,
        fragment: &'a Html,
        container_selectors: &[Selector],
    ) -> Vec<ElementRef<'a>> {
        for selector in container_selectors {
            let matched: Vec<ElementRef<'a>> = fragment.select(selector).collect();
            if matched.is_empty() {
                continue;
            }
            return matched
                .iter()
                .filter(|el| {
                    !el.ancestors()
                        .filter_map(ElementRef::wrap)
                        .any(|ancestor| selector.matches(&ancestor))
                })
                .copied()
                .collect();
        }
        Vec::new()
    }

    /// Build a card from the fields found under the given scope
    ///
    /// Returns `None` when nothing displayable was found; a card must carry
    /// at least one of title, content, or image URL.
    fn card_from_scope(
        &self,
        scope: ElementRef<'_>,
        raw: &str,
        context: &RowParseContext,
    ) -> Option<Card> {
        let selectors = &self.selectors[&context.card_type];

        let mut card = Card::new(&context.sku, context.card_type, context.position);
        card.title = self.extract_text(scope, &selectors.title);
        card.subtitle = self.extract_text(scope, &selectors.subtitle);
        card.content = self.extract_content(scope, &selectors.content);
        card.image_url = self.extract_image(scope, &selectors.image);
        card.price = self.extract_text(scope, &selectors.price);
        card.source_html = Some(raw.to_string());

        if !card.has_displayable_content() {
            return None;
        }
        Some(card)
    }

    /// One format-error placeholder standing in for a multi-card cell
    fn format_error_card(
        &self,
        raw: &str,
        containers: &[ElementRef<'_>],
        context: &RowParseContext,
    ) -> Card {
        let selectors = &self.selectors[&context.card_type];
        let detected_titles: Vec<String> = containers
            .iter()
            .map(|container| {
                self.extract_text(*container, &selectors.title)
                    .unwrap_or_default()
            })
            .collect();

        let panel = self
            .renderer
            .render_format_error_panel(context.card_type, &detected_titles);

        let mut card = Card::new(&context.sku, context.card_type, context.position);
        card.is_format_error = true;
        card.content = Some(panel);
        card.source_html = Some(raw.to_string());
        card.format_error_info = Some(FormatErrorInfo {
            card_count: containers.len(),
            original_content: raw.to_string(),
            detected_titles,
        });
        card
    }

    /// First non-empty text match across fallback selectors
    fn extract_text(&self, scope: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
        for selector in selectors {
            for element in scope.select(selector) {
                let text = element.text().collect::<String>().trim().to_string();
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
        None
    }

    /// Body markup of the first matching content element
    ///
    /// An explicit `no-content` placeholder block means the body is
    /// intentionally empty and yields `None`.
    fn extract_content(&self, scope: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
        for selector in selectors {
            for element in scope.select(selector) {
                if has_class(element, "no-content") {
                    continue;
                }
                let element_children: Vec<ElementRef<'_>> =
                    element.children().filter_map(ElementRef::wrap).collect();
                if element_children.len() == 1 && has_class(element_children[0], "no-content") {
                    return None;
                }
                let inner = element.inner_html().trim().to_string();
                if !inner.is_empty() {
                    return Some(inner);
                }
            }
        }
        None
    }

    /// `src` of the first matching image, ignoring explicit no-image boxes
    fn extract_image(&self, scope: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
        for selector in selectors {
            for element in scope.select(selector) {
                if let Some(src) = element.value().attr("src") {
                    let src = src.trim();
                    if !src.is_empty() {
                        return Some(src.to_string());
                    }
                }
            }
        }
        None
    }
}

fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::templates::TemplateRegistry;

    fn extractor() -> CardExtractor {
        CardExtractor::new(CardRenderer::new(TemplateRegistry::builtin())).unwrap()
    }

    fn feature_context() -> RowParseContext {
        RowParseContext::new(0, "F100", "shared.feature-1-card", CardType::Feature, 1)
    }

    #[test]
    fn canonical_fragment_extracts_all_fields() {
        let cell = "<div class=\"feature\" style=\"border-radius: 8px;\">\
            <h2 class=\"feature-title\">Lights</h2>\
            <div class=\"feature-image\"><img src=\"https://cdn.example.com/a.jpg\" alt=\"Lights\"></div>\
            <div class=\"feature-body\"><p>Bright LED</p></div></div>";

        let card = extractor()
            .extract_cell(cell, &feature_context())
            .unwrap()
            .expect("one card");

        assert_eq!(card.title.as_deref(), Some("Lights"));
        assert_eq!(card.content.as_deref(), Some("<p>Bright LED</p>"));
        assert_eq!(card.image_url.as_deref(), Some("https://cdn.example.com/a.jpg"));
        assert!(!card.is_placeholder);
        assert!(!card.is_format_error);
    }

    #[test]
    fn legacy_fragment_extracts_via_container_fallbacks() {
        let cell = "<div class='feature'><h2>Lights</h2><p>Bright LED</p></div>";

        let card = extractor()
            .extract_cell(cell, &feature_context())
            .unwrap()
            .expect("one card");

        assert_eq!(card.title.as_deref(), Some("Lights"));
        assert_eq!(card.content.as_deref(), Some("Bright LED"));
        assert!(!card.is_placeholder);
    }

    #[test]
    fn bare_fragment_without_container_extracts_from_root() {
        let cell = "<h2>Lights</h2><p>Bright LED</p>";

        let card = extractor()
            .extract_cell(cell, &feature_context())
            .unwrap()
            .expect("one card");

        assert_eq!(card.title.as_deref(), Some("Lights"));
        assert_eq!(card.content.as_deref(), Some("Bright LED"));
    }

    #[test]
    fn empty_and_meaningless_cells_yield_no_card() {
        let extractor = extractor();
        assert!(extractor.extract_cell("", &feature_context()).unwrap().is_none());
        assert!(extractor.extract_cell("   ", &feature_context()).unwrap().is_none());
        assert!(extractor
            .extract_cell("<div class=\"feature\"></div>", &feature_context())
            .unwrap()
            .is_none());
    }

    #[test]
    fn multi_card_cell_yields_single_format_error_placeholder() {
        let cell = "<div class='feature'><h2>Lights</h2><p>Bright LED</p></div>\
            <div class='feature'><h2>Rack</h2><p>Steel rack</p></div>";

        let card = extractor()
            .extract_cell(cell, &feature_context())
            .unwrap()
            .expect("one placeholder");

        assert!(card.is_format_error);
        let info = card.format_error_info.as_ref().unwrap();
        assert_eq!(info.card_count, 2);
        assert_eq!(info.detected_titles, vec!["Lights", "Rack"]);
        assert_eq!(info.original_content, cell);
        let content = card.content.as_deref().unwrap();
        assert!(content.contains("<li>Lights</li>"));
        assert!(content.contains("<li>Rack</li>"));
    }

    #[test]
    fn nested_containers_count_once() {
        let cell = "<div class='feature'><h2>Outer</h2>\
            <div class='feature'><h2>Inner</h2><p>body</p></div></div>";

        let card = extractor()
            .extract_cell(cell, &feature_context())
            .unwrap()
            .expect("one card");

        // Only the outermost container counts; no format error.
        assert!(!card.is_format_error);
        assert_eq!(card.title.as_deref(), Some("Outer"));
    }

    #[test]
    fn spec_table_extracts_title_and_rows() {
        let cell = "<table class=\"spec-table\" style=\"border-collapse: collapse;\">\
            <thead><tr><th colspan=\"2\" class=\"spec-table-title\">Specs</th></tr></thead>\
            <tbody class=\"spec-table-body\"><tr><td>Weight</td><td>22kg</td></tr></tbody></table>";
        let context = RowParseContext::new(
            0,
            "F100",
            "shared.spec-table",
            CardType::SpecificationTable,
            1,
        );

        let card = extractor().extract_cell(cell, &context).unwrap().expect("one card");

        assert_eq!(card.title.as_deref(), Some("Specs"));
        assert_eq!(
            card.content.as_deref(),
            Some("<tr><td>Weight</td><td>22kg</td></tr>")
        );
    }

    #[test]
    fn explicit_no_content_block_yields_empty_body() {
        let cell = "<div class=\"feature\" style=\"border-radius: 8px;\">\
            <h2 class=\"feature-title\">Lights</h2>\
            <div class=\"feature-image\"><div class=\"no-image\">No image provided</div></div>\
            <div class=\"feature-body\"><div class=\"no-content\">No content provided</div></div></div>";

        let card = extractor()
            .extract_cell(cell, &feature_context())
            .unwrap()
            .expect("title alone is displayable");

        assert_eq!(card.title.as_deref(), Some("Lights"));
        assert!(card.content.is_none());
        assert!(card.image_url.is_none());
    }

    #[test]
    fn row_extraction_collapses_exact_duplicates() {
        let mut row = RowRecord::new();
        row.set("sku", "F100");
        row.set(
            "shared.feature-1-card",
            "<div class='feature'><h2>Lights</h2><p>Bright LED</p></div>",
        );
        row.set(
            "shared.feature-2-card",
            "<div class='feature'><h2>Lights</h2><p>Bright LED</p></div>",
        );

        let cards = extractor().extract_row(&row, 0, CardSource::Channel).unwrap();

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].source, CardSource::Channel);
    }

    #[test]
    fn row_without_sku_is_an_error() {
        let mut row = RowRecord::new();
        row.set("shared.feature-1-card", "<div class='feature'><h2>A</h2></div>");

        let result = extractor().extract_row(&row, 3, CardSource::Channel);
        assert!(matches!(result, Err(ParsingError::SkuMissing { row_index: 3 })));
    }
}
