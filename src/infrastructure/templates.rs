//! Template registry for card markup
//!
//! Holds, per card type, the canonical HTML skeleton (with placeholder
//! slots) and the structural selectors used to recognize and validate a
//! rendered instance. Extending to a new card type means adding one entry
//! here, not changing algorithm code.
//!
//! Templates can be loaded from per-type HTML files; any file that cannot be
//! loaded falls back to a built-in equivalent that renders structurally
//! identical output, so the loaded-template and fallback paths validate the
//! same way.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::card::CardType;

/// How severely a missing structural element counts in format comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    /// Missing required elements/classes
    Major,
    /// Missing cosmetic attributes (rounded corners and the like)
    Minor,
}

/// One structural expectation for a rendered card instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiredSelector {
    pub selector: String,
    pub description: String,
    pub severity: Severity,
}

impl RequiredSelector {
    fn new(selector: &str, description: &str, severity: Severity) -> Self {
        Self {
            selector: selector.to_string(),
            description: description.to_string(),
            severity,
        }
    }
}

/// Canonical template and structural contract for one card type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardTemplate {
    pub card_type: CardType,
    /// Selector recognizing a top-level card container in a cell
    pub container_selector: String,
    /// Structural expectations checked by the format comparison
    pub required_selectors: Vec<RequiredSelector>,
    /// Fields that must be populated for this type
    pub required_fields: Vec<String>,
    /// HTML skeleton with `{{slot}}` placeholders and `{{#slot}}`/`{{^slot}}`
    /// conditional sections
    pub skeleton: String,
}

impl CardTemplate {
    /// Expand the skeleton with pre-escaped slot values
    ///
    /// `{{name}}` substitutes the value for `name`; `{{#name}}...{{/name}}`
    /// renders its body only when `name` has a non-empty value and
    /// `{{^name}}...{{/name}}` only when it does not. Unknown slots expand to
    /// nothing.
    pub fn expand(&self, slots: &BTreeMap<&str, String>) -> String {
        expand_sections(&self.skeleton, slots)
    }
}

fn slot_filled(slots: &BTreeMap<&str, String>, name: &str) -> bool {
    slots.get(name).is_some_and(|v| !v.trim().is_empty())
}

fn expand_sections(template: &str, slots: &BTreeMap<&str, String>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            output.push_str(&rest[start..]);
            return output;
        };
        let tag = &after[..end];
        rest = &after[end + 2..];

        match tag.chars().next() {
            Some(marker @ ('#' | '^')) => {
                let name = &tag[1..];
                let close = format!("{{{{/{name}}}}}");
                let Some(body_end) = rest.find(&close) else {
                    continue;
                };
                let body = &rest[..body_end];
                rest = &rest[body_end + close.len()..];

                let wanted = slot_filled(slots, name);
                let show = if marker == '#' { wanted } else { !wanted };
                if show {
                    output.push_str(&expand_sections(body, slots));
                }
            }
            _ => {
                if let Some(value) = slots.get(tag) {
                    output.push_str(value);
                }
            }
        }
    }

    output.push_str(rest);
    output
}

const FEATURE_SKELETON: &str = "<div class=\"feature\" style=\"border-radius: 8px;\">\
<h2 class=\"feature-title\">{{title}}</h2>\
{{#subtitle}}<h3 class=\"feature-subtitle\">{{subtitle}}</h3>{{/subtitle}}\
<div class=\"feature-image\">{{#image_url}}<img src=\"{{image_url}}\" alt=\"{{title}}\">{{/image_url}}\
{{^image_url}}<div class=\"no-image\">No image provided</div>{{/image_url}}</div>\
<div class=\"feature-body\">{{#content}}{{content_html}}{{/content}}\
{{^content}}<div class=\"no-content\">No content provided</div>{{/content}}</div>\
</div>";

const PRODUCT_OPTIONS_SKELETON: &str = "<div class=\"product-option\" style=\"border-radius: 8px;\">\
<h2 class=\"option-title\">{{title}}</h2>\
{{#subtitle}}<h3 class=\"option-subtitle\">{{subtitle}}</h3>{{/subtitle}}\
<div class=\"option-image\">{{#image_url}}<img src=\"{{image_url}}\" alt=\"{{title}}\">{{/image_url}}\
{{^image_url}}<div class=\"no-image\">No image provided</div>{{/image_url}}</div>\
<div class=\"option-body\">{{#content}}{{content_html}}{{/content}}\
{{^content}}<div class=\"no-content\">No content provided</div>{{/content}}</div>\
{{#price}}<div class=\"option-price\">{{price}}</div>{{/price}}\
</div>";

const CARGO_OPTIONS_SKELETON: &str = "<div class=\"cargo-option\" style=\"border-radius: 8px;\">\
<h2 class=\"cargo-title\">{{title}}</h2>\
{{#subtitle}}<h3 class=\"cargo-subtitle\">{{subtitle}}</h3>{{/subtitle}}\
<div class=\"cargo-image\">{{#image_url}}<img src=\"{{image_url}}\" alt=\"{{title}}\">{{/image_url}}\
{{^image_url}}<div class=\"no-image\">No image provided</div>{{/image_url}}</div>\
<div class=\"cargo-body\">{{#content}}{{content_html}}{{/content}}\
{{^content}}<div class=\"no-content\">No content provided</div>{{/content}}</div>\
{{#price}}<div class=\"cargo-price\">{{price}}</div>{{/price}}\
</div>";

const WEATHER_PROTECTION_SKELETON: &str = "<div class=\"weather-option\" style=\"border-radius: 8px;\">\
<h2 class=\"weather-title\">{{title}}</h2>\
{{#subtitle}}<h3 class=\"weather-subtitle\">{{subtitle}}</h3>{{/subtitle}}\
<div class=\"weather-image\">{{#image_url}}<img src=\"{{image_url}}\" alt=\"{{title}}\">{{/image_url}}\
{{^image_url}}<div class=\"no-image\">No image provided</div>{{/image_url}}</div>\
<div class=\"weather-body\">{{#content}}{{content_html}}{{/content}}\
{{^content}}<div class=\"no-content\">No content provided</div>{{/content}}</div>\
</div>";

const SPEC_TABLE_SKELETON: &str = "<table class=\"spec-table\" style=\"border-collapse: collapse;\">\
<thead><tr><th colspan=\"2\" class=\"spec-table-title\">{{title}}</th></tr></thead>\
<tbody class=\"spec-table-body\">{{content_html}}</tbody>\
</table>";

fn builtin_template(card_type: CardType) -> CardTemplate {
    use Severity::{Major, Minor};

    match card_type {
        CardType::Feature => CardTemplate {
            card_type,
            container_selector: "div.feature".to_string(),
            required_selectors: vec![
                RequiredSelector::new(".feature-title", "title element", Major),
                RequiredSelector::new(".feature-body", "body text element", Major),
                RequiredSelector::new(
                    ".feature-image img, .feature-image .no-image",
                    "image or explicit no-image placeholder",
                    Major,
                ),
                RequiredSelector::new(
                    "[style*=\"border-radius\"]",
                    "rounded-corner styling",
                    Minor,
                ),
            ],
            required_fields: vec!["title".to_string()],
            skeleton: FEATURE_SKELETON.to_string(),
        },
        CardType::ProductOptions => CardTemplate {
            card_type,
            container_selector: "div.product-option".to_string(),
            required_selectors: vec![
                RequiredSelector::new(".option-title", "title element", Major),
                RequiredSelector::new(".option-body", "body text element", Major),
                RequiredSelector::new(".option-price", "price element", Major),
                RequiredSelector::new(
                    ".option-image img, .option-image .no-image",
                    "image or explicit no-image placeholder",
                    Major,
                ),
                RequiredSelector::new(
                    "[style*=\"border-radius\"]",
                    "rounded-corner styling",
                    Minor,
                ),
            ],
            required_fields: vec!["title".to_string(), "price".to_string()],
            skeleton: PRODUCT_OPTIONS_SKELETON.to_string(),
        },
        CardType::CargoOptions => CardTemplate {
            card_type,
            container_selector: "div.cargo-option".to_string(),
            required_selectors: vec![
                RequiredSelector::new(".cargo-title", "title element", Major),
                RequiredSelector::new(".cargo-body", "body text element", Major),
                RequiredSelector::new(
                    ".cargo-image img, .cargo-image .no-image",
                    "image or explicit no-image placeholder",
                    Major,
                ),
                RequiredSelector::new(
                    "[style*=\"border-radius\"]",
                    "rounded-corner styling",
                    Minor,
                ),
            ],
            required_fields: vec!["title".to_string()],
            skeleton: CARGO_OPTIONS_SKELETON.to_string(),
        },
        CardType::WeatherProtection => CardTemplate {
            card_type,
            container_selector: "div.weather-option".to_string(),
            required_selectors: vec![
                RequiredSelector::new(".weather-title", "title element", Major),
                RequiredSelector::new(".weather-body", "body text element", Major),
                RequiredSelector::new(
                    ".weather-image img, .weather-image .no-image",
                    "image or explicit no-image placeholder",
                    Major,
                ),
                RequiredSelector::new(
                    "[style*=\"border-radius\"]",
                    "rounded-corner styling",
                    Minor,
                ),
            ],
            required_fields: vec!["title".to_string()],
            skeleton: WEATHER_PROTECTION_SKELETON.to_string(),
        },
        CardType::SpecificationTable => CardTemplate {
            card_type,
            container_selector: "table.spec-table, table".to_string(),
            required_selectors: vec![
                RequiredSelector::new("table", "table element", Major),
                RequiredSelector::new(".spec-table-title", "table title cell", Major),
                RequiredSelector::new("tbody tr", "at least one specification row", Major),
                RequiredSelector::new(
                    "[style*=\"border-collapse\"]",
                    "collapsed-border styling",
                    Minor,
                ),
            ],
            required_fields: vec!["title".to_string(), "content".to_string()],
            skeleton: SPEC_TABLE_SKELETON.to_string(),
        },
    }
}

/// File name a card type's template is loaded from
pub fn template_file_name(card_type: CardType) -> &'static str {
    match card_type {
        CardType::Feature => "feature.html",
        CardType::ProductOptions => "product-options.html",
        CardType::CargoOptions => "cargo-options.html",
        CardType::WeatherProtection => "weather-protection.html",
        CardType::SpecificationTable => "specification-table.html",
    }
}

/// Per-card-type template and selector registry
///
/// Pure data holder; stateless and side-effect free after construction.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: BTreeMap<CardType, CardTemplate>,
}

impl TemplateRegistry {
    /// Registry backed entirely by the built-in templates
    pub fn builtin() -> Self {
        let templates = CardType::ALL
            .into_iter()
            .map(|t| (t, builtin_template(t)))
            .collect();
        Self { templates }
    }

    /// Load template files from a directory, falling back per file to the
    /// built-in skeleton when a file is missing
    ///
    /// A file that is present but structurally broken (its expansion does not
    /// satisfy the type's required selectors) is a deployment error and fails
    /// the load outright.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let mut templates = BTreeMap::new();

        for card_type in CardType::ALL {
            let mut template = builtin_template(card_type);
            let path = dir.join(template_file_name(card_type));

            match std::fs::read_to_string(&path) {
                Ok(skeleton) => {
                    template.skeleton = skeleton;
                    Self::check_template(&template).with_context(|| {
                        format!("template file {} is structurally broken", path.display())
                    })?;
                    debug!(card_type = %card_type, path = %path.display(), "loaded card template");
                }
                Err(e) => {
                    warn!(
                        card_type = %card_type,
                        path = %path.display(),
                        "template file unavailable ({e}), using built-in fallback"
                    );
                }
            }

            templates.insert(card_type, template);
        }

        Ok(Self { templates })
    }

    /// The template and structural contract for a card type
    pub fn template_for(&self, card_type: CardType) -> &CardTemplate {
        // Every CardType is inserted at construction.
        &self.templates[&card_type]
    }

    /// Compiled container selector for a card type
    pub fn container_selector(&self, card_type: CardType) -> Result<Selector> {
        let raw = &self.template_for(card_type).container_selector;
        Selector::parse(raw)
            .map_err(|e| anyhow::anyhow!("container selector '{raw}' invalid: {e}"))
    }

    /// Expand a template with probe values and verify its own contract holds
    fn check_template(template: &CardTemplate) -> Result<()> {
        let mut slots: BTreeMap<&str, String> = BTreeMap::new();
        slots.insert("title", "probe title".to_string());
        slots.insert("subtitle", "probe subtitle".to_string());
        slots.insert("content", "probe content".to_string());
        slots.insert("content_html", "<p>probe content</p>".to_string());
        slots.insert("image_url", "https://example.com/probe.jpg".to_string());
        slots.insert("price", "100".to_string());

        let rendered = template.expand(&slots);
        let fragment = Html::parse_fragment(&rendered);

        for required in &template.required_selectors {
            let selector = Selector::parse(&required.selector).map_err(|e| {
                anyhow::anyhow!("required selector '{}' invalid: {e}", required.selector)
            })?;
            if fragment.select(&selector).next().is_none() {
                bail!(
                    "expansion lacks {} ({})",
                    required.description,
                    required.selector
                );
            }
        }

        Ok(())
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_templates_satisfy_their_own_contracts() {
        for card_type in CardType::ALL {
            let template = builtin_template(card_type);
            TemplateRegistry::check_template(&template)
                .unwrap_or_else(|e| panic!("{card_type}: {e}"));
        }
    }

    #[test]
    fn conditional_sections_expand_both_ways() {
        let template = builtin_template(CardType::Feature);

        let mut slots: BTreeMap<&str, String> = BTreeMap::new();
        slots.insert("title", "Lights".to_string());
        slots.insert("content", "Bright LED".to_string());
        slots.insert("content_html", "<p>Bright LED</p>".to_string());

        let rendered = template.expand(&slots);
        assert!(rendered.contains("<div class=\"no-image\">"));
        assert!(rendered.contains("<p>Bright LED</p>"));
        assert!(!rendered.contains("feature-subtitle"));

        slots.insert("image_url", "https://cdn.example.com/a.jpg".to_string());
        slots.insert("subtitle", "LED".to_string());
        let rendered = template.expand(&slots);
        assert!(rendered.contains("src=\"https://cdn.example.com/a.jpg\""));
        assert!(rendered.contains("<h3 class=\"feature-subtitle\">LED</h3>"));
        assert!(!rendered.contains("no-image"));
    }

    #[test]
    fn missing_template_dir_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TemplateRegistry::load_from_dir(dir.path()).unwrap();
        let builtin = TemplateRegistry::builtin();

        for card_type in CardType::ALL {
            assert_eq!(
                registry.template_for(card_type).skeleton,
                builtin.template_for(card_type).skeleton
            );
        }
    }

    #[test]
    fn broken_template_file_is_a_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("feature.html"), "<div>not a card</div>").unwrap();

        assert!(TemplateRegistry::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn loaded_equivalent_template_passes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("feature.html"), FEATURE_SKELETON).unwrap();

        let registry = TemplateRegistry::load_from_dir(dir.path()).unwrap();
        assert_eq!(
            registry.template_for(CardType::Feature).skeleton,
            FEATURE_SKELETON
        );
    }
}
