//! Card validator
//!
//! Checks a card's completeness against its type's required fields and
//! compares its stored markup against the template registry's expected
//! rendering. Fatal findings turn the card into a placeholder downstream;
//! warnings ride along for operator review.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::domain::card::{Card, CardType};
use crate::domain::validation::ValidationResult;
use crate::infrastructure::renderer::{CardFields, CardRenderer};
use crate::infrastructure::rows::RowRecord;
use crate::infrastructure::templates::Severity;

/// Content length ceiling; longer bodies are flagged for review
pub const MAX_CONTENT_CHARS: usize = 5000;
/// Titles longer than this render poorly in the channel UI
pub const MAX_TITLE_CHARS: usize = 120;

static SCRIPT_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*script\b|\bon(?:click|load|error|mouseover|focus)\s*=")
        .expect("script marker pattern is valid")
});

static SCRIPT_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bjavascript\s*:").expect("script scheme pattern is valid"));

/// Block-level tags checked by the structural-balance heuristic
const BALANCED_TAGS: [&str; 4] = ["div", "table", "ul", "ol"];

/// Validates cards against their type's template contract
pub struct CardValidator {
    renderer: CardRenderer,
}

impl CardValidator {
    pub fn new(renderer: CardRenderer) -> Self {
        Self { renderer }
    }

    /// Validate one card, optionally against the row it was extracted from
    ///
    /// Placeholder and format-error cards are already marked for operator
    /// follow-up and skip re-validation.
    pub fn validate(&self, card: &Card, source_row: Option<&RowRecord>) -> ValidationResult {
        let mut result = ValidationResult::new();

        if card.is_placeholder || card.is_format_error {
            return result;
        }

        self.check_structure(card, source_row, &mut result);
        self.check_required_fields(card, &mut result);
        self.check_content(card, &mut result);
        self.check_security(card, &mut result);
        self.check_balance(card, &mut result);
        self.check_format(card, &mut result);

        if !result.is_valid() {
            debug!(
                card_type = %card.card_type,
                sku = %card.sku,
                errors = result.errors.len(),
                warnings = result.warnings.len(),
                "card failed validation"
            );
        }

        result
    }

    fn check_structure(
        &self,
        card: &Card,
        source_row: Option<&RowRecord>,
        result: &mut ValidationResult,
    ) {
        if card.sku.trim().is_empty() {
            result.error("Card has no SKU");
        }
        if card.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
            result.error("Card has no title");
        }
        if let Some(row) = source_row {
            if !row.matches_sku(&card.sku) {
                result.warning(format!(
                    "Card SKU '{}' does not match its source row",
                    card.sku
                ));
            }
        }
    }

    /// Per-type required fields from the template registry
    fn check_required_fields(&self, card: &Card, result: &mut ValidationResult) {
        let template = self.renderer.registry().template_for(card.card_type);
        for field in &template.required_fields {
            let value = match field.as_str() {
                "title" => &card.title,
                "subtitle" => &card.subtitle,
                "content" => &card.content,
                "image_url" => &card.image_url,
                "price" => &card.price,
                other => {
                    warn!(field = other, "unknown required field in template registry");
                    continue;
                }
            };
            if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                // Title is already covered by the structural check.
                if field != "title" {
                    result.error(format!(
                        "{} card requires a {} value",
                        card.card_type.display_name(),
                        field
                    ));
                }
            }
        }
    }

    fn check_content(&self, card: &Card, result: &mut ValidationResult) {
        if let Some(title) = &card.title {
            if title.chars().count() > MAX_TITLE_CHARS {
                result.warning(format!("Title exceeds {MAX_TITLE_CHARS} characters"));
            }
        }
        if let Some(content) = &card.content {
            if content.chars().count() > MAX_CONTENT_CHARS {
                result.warning(format!("Content exceeds {MAX_CONTENT_CHARS} characters"));
            }
        }
        if card.card_type != CardType::SpecificationTable && card.image_url.is_none() {
            result.warning(format!(
                "{} cards normally carry an image",
                card.card_type.display_name()
            ));
        }
        if let Some(image_url) = &card.image_url {
            let url = image_url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                result.warning(format!("Image URL '{url}' does not use a recognized scheme"));
            }
        }
    }

    /// Executable markup is never importable
    fn check_security(&self, card: &Card, result: &mut ValidationResult) {
        let fields = [
            card.title.as_deref(),
            card.subtitle.as_deref(),
            card.content.as_deref(),
            card.source_html.as_deref(),
        ];
        if fields.iter().flatten().any(|v| SCRIPT_MARKER.is_match(v)) {
            result.error("Content contains executable script markers");
        }
        let link_fields = [card.content.as_deref(), card.image_url.as_deref()];
        if link_fields.iter().flatten().any(|v| SCRIPT_SCHEME.is_match(v)) {
            result.error("Content contains a script-scheme link");
        }
    }

    /// Heuristic check for unclosed block-level tags
    fn check_balance(&self, card: &Card, result: &mut ValidationResult) {
        let Some(content) = card.content.as_deref() else {
            return;
        };
        let lowered = content.to_lowercase();
        for tag in BALANCED_TAGS {
            let opens = lowered.matches(&format!("<{tag}")).count();
            let closes = lowered.matches(&format!("</{tag}")).count();
            if opens > closes {
                result.warning(format!("Content has unclosed <{tag}> tags"));
            }
        }
    }

    /// Render-and-diff format comparison
    ///
    /// Renders the card's own fields through the canonical template and
    /// checks the stored fragment for every structural selector the expected
    /// rendering satisfies. Missing major elements are fatal only for
    /// specification tables, which have no fallback rendering; for all other
    /// types they are demoted to warnings so reviewable content is never
    /// discarded. Minor (cosmetic) differences are always warnings.
    fn check_format(&self, card: &Card, result: &mut ValidationResult) {
        let Some(actual_html) = card.source_html.as_deref() else {
            return;
        };

        let expected_html = self.renderer.render(card.card_type, &CardFields::from(card));
        let expected = Html::parse_fragment(&expected_html);
        let actual = Html::parse_fragment(actual_html);

        let template = self.renderer.registry().template_for(card.card_type);
        for required in &template.required_selectors {
            let Ok(selector) = Selector::parse(&required.selector) else {
                warn!(selector = %required.selector, "invalid required selector in registry");
                continue;
            };
            let expected_has = expected.select(&selector).next().is_some();
            let actual_has = actual.select(&selector).next().is_some();
            if !expected_has || actual_has {
                continue;
            }

            match required.severity {
                Severity::Major => {
                    let message = format!(
                        "Stored markup is missing the {} ({})",
                        required.description, required.selector
                    );
                    if card.card_type == CardType::SpecificationTable {
                        result.error(message);
                    } else {
                        result.warning(message);
                    }
                }
                Severity::Minor => {
                    result.warning(format!(
                        "Stored markup lacks cosmetic {} ({})",
                        required.description, required.selector
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::templates::TemplateRegistry;

    fn validator() -> CardValidator {
        CardValidator::new(CardRenderer::new(TemplateRegistry::builtin()))
    }

    fn feature(title: Option<&str>, content: Option<&str>) -> Card {
        let mut card = Card::new("F100", CardType::Feature, 1);
        card.title = title.map(str::to_string);
        card.content = content.map(str::to_string);
        card.image_url = Some("https://cdn.example.com/a.jpg".into());
        card
    }

    #[test]
    fn missing_title_is_fatal() {
        let result = validator().validate(&feature(None, Some("body")), None);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.contains("no title")));
    }

    #[test]
    fn product_options_require_price() {
        let mut card = Card::new("F100", CardType::ProductOptions, 1);
        card.title = Some("Rain cover".into());
        card.content = Some("Full cover".into());
        card.image_url = Some("https://cdn.example.com/r.jpg".into());

        let result = validator().validate(&card, None);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.contains("price")));

        card.price = Some("149".into());
        assert!(validator().validate(&card, None).is_valid());
    }

    #[test]
    fn spec_table_without_content_is_fatal() {
        let mut card = Card::new("F100", CardType::SpecificationTable, 1);
        card.title = Some("Specs".into());

        let result = validator().validate(&card, None);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.contains("content")));
    }

    #[test]
    fn script_markup_is_fatal() {
        let card = feature(Some("Lights"), Some("<script>alert(1)</script>"));
        let result = validator().validate(&card, None);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.contains("script")));
    }

    #[test]
    fn script_scheme_link_is_fatal() {
        let card = feature(Some("Lights"), Some("<a href=\"javascript:alert(1)\">x</a>"));
        let result = validator().validate(&card, None);
        assert!(!result.is_valid());
    }

    #[test]
    fn overlong_content_is_a_warning_not_an_error() {
        let long = "x".repeat(MAX_CONTENT_CHARS + 1);
        let result = validator().validate(&feature(Some("Lights"), Some(&long)), None);
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.contains("exceeds")));
    }

    #[test]
    fn legacy_markup_differences_are_demoted_to_warnings_for_shared_types() {
        let mut card = feature(Some("Lights"), Some("Bright LED"));
        card.source_html = Some("<div class='feature'><h2>Lights</h2><p>Bright LED</p></div>".into());

        let result = validator().validate(&card, None);
        assert!(result.is_valid());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("missing") || w.contains("lacks")));
    }

    #[test]
    fn spec_table_structural_break_is_fatal() {
        let mut card = Card::new("F100", CardType::SpecificationTable, 1);
        card.title = Some("Specs".into());
        card.content = Some("<tr><td>Weight</td><td>22kg</td></tr>".into());
        card.source_html = Some("<div><b>Weight 22kg</b></div>".into());

        let result = validator().validate(&card, None);
        assert!(!result.is_valid());
    }

    #[test]
    fn canonical_markup_round_trips_without_major_differences() {
        let renderer = CardRenderer::new(TemplateRegistry::builtin());
        let mut card = feature(Some("Lights"), Some("Bright LED"));
        card.source_html = Some(renderer.render(CardType::Feature, &CardFields::from(&card)));

        let result = validator().validate(&card, None);
        assert!(result.is_valid());
        assert!(result
            .warnings
            .iter()
            .all(|w| !w.contains("missing the")));
    }

    #[test]
    fn placeholders_skip_validation() {
        let mut card = feature(None, None);
        card.is_placeholder = true;
        assert!(validator().validate(&card, None).is_valid());
    }
}
