//! Card renderer
//!
//! Regenerates the canonical HTML fragment for a card type from structured
//! fields. Used by the validator (render-and-diff format comparison) and by
//! the export path. Rendering is deterministic and total: missing optional
//! fields produce explicit "no image"/"no content" placeholder blocks, never
//! broken markup.

use std::collections::BTreeMap;

use scraper::{Html, Node};
use tracing::trace;

use crate::domain::card::{Card, CardType};
use crate::infrastructure::templates::TemplateRegistry;

/// Structured field values a card type renders from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFields {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<String>,
}

impl From<&Card> for CardFields {
    fn from(card: &Card) -> Self {
        Self {
            title: card.title.clone(),
            subtitle: card.subtitle.clone(),
            content: card.content.clone(),
            image_url: card.image_url.clone(),
            price: card.price.clone(),
        }
    }
}

/// Escape text for element content
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Deterministic renderer over the template registry
#[derive(Debug, Clone)]
pub struct CardRenderer {
    registry: TemplateRegistry,
}

impl CardRenderer {
    pub fn new(registry: TemplateRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Render the canonical markup for a card type from structured fields
    pub fn render(&self, card_type: CardType, fields: &CardFields) -> String {
        let template = self.registry.template_for(card_type);
        let mut slots: BTreeMap<&str, String> = BTreeMap::new();

        let filled = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        if let Some(title) = filled(&fields.title) {
            slots.insert("title", escape_html(&title));
        }
        if let Some(subtitle) = filled(&fields.subtitle) {
            slots.insert("subtitle", escape_html(&subtitle));
        }
        if let Some(price) = filled(&fields.price) {
            slots.insert("price", escape_html(&price));
        }
        if let Some(image_url) = filled(&fields.image_url) {
            slots.insert("image_url", escape_html(&image_url));
        }
        if let Some(content) = filled(&fields.content) {
            slots.insert("content_html", body_markup(&content));
            slots.insert("content", content);
        }

        let rendered = template.expand(&slots);
        trace!(card_type = %card_type, bytes = rendered.len(), "rendered card");
        rendered
    }

    /// Render a card's own fields (placeholders render their stored panel)
    pub fn render_card(&self, card: &Card) -> String {
        if card.is_placeholder || card.is_format_error {
            if let Some(content) = &card.content {
                return content.clone();
            }
        }
        self.render(card.card_type, &CardFields::from(card))
    }

    /// Human-readable error panel substituted for a card that failed
    /// validation; preserves the original content for manual recovery
    pub fn render_error_panel(
        &self,
        card_type: CardType,
        original_title: Option<&str>,
        errors: &[String],
        warnings: &[String],
        content_preview: &str,
    ) -> String {
        let mut panel = String::new();
        panel.push_str("<div class=\"card-error-panel\">");
        panel.push_str(&format!(
            "<h2 class=\"card-error-heading\">{} card needs attention</h2>",
            escape_html(card_type.display_name())
        ));
        if let Some(title) = original_title {
            panel.push_str(&format!(
                "<p class=\"card-error-original-title\">Original title: {}</p>",
                escape_html(title)
            ));
        }
        if !errors.is_empty() {
            panel.push_str("<ul class=\"card-error-list\">");
            for error in errors {
                panel.push_str(&format!("<li>{}</li>", escape_html(error)));
            }
            panel.push_str("</ul>");
        }
        if !warnings.is_empty() {
            panel.push_str("<ul class=\"card-warning-list\">");
            for warning in warnings {
                panel.push_str(&format!("<li>{}</li>", escape_html(warning)));
            }
            panel.push_str("</ul>");
        }
        if !content_preview.is_empty() {
            panel.push_str(&format!(
                "<pre class=\"card-error-preview\">{}</pre>",
                escape_html(&truncate_chars(content_preview, 200))
            ));
        }
        panel.push_str("</div>");
        panel
    }

    /// Error summary for a cell that held more than one card, enumerating
    /// each detected sub-card's title
    pub fn render_format_error_panel(
        &self,
        card_type: CardType,
        detected_titles: &[String],
    ) -> String {
        let mut panel = String::new();
        panel.push_str("<div class=\"card-format-error-panel\">");
        panel.push_str(&format!(
            "<h2 class=\"card-error-heading\">Cell contains {} {} cards; expected one</h2>",
            detected_titles.len(),
            escape_html(card_type.display_name())
        ));
        panel.push_str("<ol class=\"card-format-error-list\">");
        for title in detected_titles {
            let label = if title.trim().is_empty() { "(untitled)" } else { title.trim() };
            panel.push_str(&format!("<li>{}</li>", escape_html(label)));
        }
        panel.push_str("</ol>");
        panel.push_str("</div>");
        panel
    }
}

/// Wrap plain-text body content in a paragraph; pass markup bodies through
fn body_markup(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.starts_with('<') {
        trimmed.to_string()
    } else {
        format!("<p>{}</p>", escape_html(trimmed))
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}…")
    }
}

/// Structural fingerprint of an HTML fragment
///
/// Element names, sorted class lists, image sources, and
/// whitespace-collapsed text in document order. Two fragments with equal
/// fingerprints are "meaningfully equal" for reconciliation: byte-level
/// formatting differences do not count, content and structure do.
pub fn html_fingerprint(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut parts: Vec<String> = Vec::new();

    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Element(element) => {
                let mut classes: Vec<&str> = element.classes().collect();
                classes.sort_unstable();
                let mut part = format!("<{}", element.name());
                if !classes.is_empty() {
                    part.push_str(&format!(" .{}", classes.join(".")));
                }
                if let Some(src) = element.attr("src") {
                    part.push_str(&format!(" src={}", src.trim()));
                }
                part.push('>');
                parts.push(part);
            }
            Node::Text(text) => {
                let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !collapsed.is_empty() {
                    parts.push(collapsed);
                }
            }
            _ => {}
        }
    }

    parts.join("|")
}

/// Meaningful-difference comparison between two fragments
pub fn fragments_differ(a: &str, b: &str) -> bool {
    html_fingerprint(a) != html_fingerprint(b)
}
