//! Where element styles come from.
//!
//! Extraction is written against [`StyleSource`]. A renderer-produced document
//! carries computed styles; static markup only has declaration text.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::COMPUTED_STYLE_ATTR;
use crate::css;

static RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^{}]+)\{([^{}]*)\}").expect("static css rule pattern"));

/// Read one style property of one element.
pub trait StyleSource {
    /// `None` when the value cannot be read for this element.
    fn value(&self, element: &ElementRef<'_>, property: &str) -> Option<String>;
}

struct Rule {
    selector: Selector,
    block: String,
}

/// Degraded source: inline `style` attributes, then `<style>` block rules.
///
/// Later rules win over earlier ones; specificity is not modelled.
#[derive(Default)]
pub struct DeclarationStyles {
    rules: Vec<Rule>,
}

impl DeclarationStyles {
    pub fn from_document(document: &Html) -> Self {
        let Ok(style_tags) = Selector::parse("style") else {
            return Self::default();
        };
        let sheets: String = document
            .select(&style_tags)
            .map(|el| el.text().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");
        Self::from_sheet(&sheets)
    }

    pub fn from_sheet(sheet: &str) -> Self {
        let sheet = css::strip_comments(sheet);
        let rules = RULE
            .captures_iter(&sheet)
            .filter_map(|caps| {
                let selector_text = caps[1].trim();
                if selector_text.is_empty() || selector_text.starts_with('@') {
                    return None;
                }
                // Pseudo-elements and unsupported syntax just drop the rule.
                let selector = Selector::parse(selector_text).ok()?;
                Some(Rule {
                    selector,
                    block: caps[2].to_string(),
                })
            })
            .collect();
        Self { rules }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl StyleSource for DeclarationStyles {
    fn value(&self, element: &ElementRef<'_>, property: &str) -> Option<String> {
        if let Some(inline) = element.value().attr("style") {
            let found = css::extract(inline, property);
            if !found.is_empty() {
                return Some(css::strip_important(&found).to_string());
            }
        }
        self.rules
            .iter()
            .rev()
            .filter(|rule| rule.selector.matches(element))
            .map(|rule| css::extract(&rule.block, property))
            .find(|found| !found.is_empty())
            .map(|found| css::strip_important(&found).to_string())
    }
}

/// Reads the per-element computed style stamp left by the headless tier.
///
/// Elements without a stamp (the snapshot is capped) fall back to declarations.
pub struct ComputedStyles {
    fallback: DeclarationStyles,
}

impl ComputedStyles {
    pub fn new(fallback: DeclarationStyles) -> Self {
        Self { fallback }
    }
}

impl StyleSource for ComputedStyles {
    fn value(&self, element: &ElementRef<'_>, property: &str) -> Option<String> {
        match element.value().attr(COMPUTED_STYLE_ATTR) {
            Some(stamp) => {
                let found = css::extract(stamp, property);
                (!found.is_empty()).then_some(found)
            }
            None => self.fallback.value(element, property),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first<'a>(doc: &'a Html, css: &str) -> ElementRef<'a> {
        doc.select(&Selector::parse(css).unwrap()).next().unwrap()
    }

    #[test]
    fn inline_beats_sheet_rules() {
        let doc = Html::parse_document(
            r#"<html><head><style>.cta { color: #222; padding: 8px }</style></head>
               <body><a class="cta" style="color:#fff !important">Go</a></body></html>"#,
        );
        let source = DeclarationStyles::from_document(&doc);
        let el = first(&doc, "a");
        assert_eq!(source.value(&el, "color").as_deref(), Some("#fff"));
        assert_eq!(source.value(&el, "padding").as_deref(), Some("8px"));
        assert_eq!(source.value(&el, "border-radius"), None);
    }

    #[test]
    fn later_rules_win_and_bad_rules_are_skipped() {
        let doc = Html::parse_document(
            r#"<html><head><style>
                /* brand */
                h1 { color: #111 }
                h1::before { color: #999 }
                @media (min-width: 800px) { h1 { color: #333 } }
                @font-face { font-family: Brand; }
            </style></head><body><h1>Hi</h1></body></html>"#,
        );
        let source = DeclarationStyles::from_document(&doc);
        let el = first(&doc, "h1");
        assert_eq!(source.value(&el, "color").as_deref(), Some("#333"));
    }

    #[test]
    fn computed_stamp_is_preferred() {
        let html = format!(
            r#"<html><head><style>p {{ color: #000 }}</style></head><body>
               <p {attr}="color:rgb(1, 2, 3);background-color:rgba(0, 0, 0, 0)">x</p>
               <p>y</p></body></html>"#,
            attr = COMPUTED_STYLE_ATTR
        );
        let doc = Html::parse_document(&html);
        let source = ComputedStyles::new(DeclarationStyles::from_document(&doc));
        let p_selector = Selector::parse("p").unwrap();
        let mut paragraphs = doc.select(&p_selector);
        let stamped = paragraphs.next().unwrap();
        let unstamped = paragraphs.next().unwrap();

        assert_eq!(source.value(&stamped, "color").as_deref(), Some("rgb(1, 2, 3)"));
        assert_eq!(source.value(&stamped, "padding"), None);
        assert_eq!(source.value(&unstamped, "color").as_deref(), Some("#000"));
    }
}
