//! Style token extraction from a fetched document.

mod engine;
mod logo;
mod source;
mod tokens;

use reqwest::Url;
use scraper::Html;

pub use engine::{ExtractOptions, StyleExtractor};
pub use logo::{choose_logo, is_logo_like};
pub use source::{ComputedStyles, DeclarationStyles, StyleSource};
pub use tokens::{ButtonStyle, HeadingStyle, ImageToken, Layout, PageMeta, StyleTokenSet};

/// Attribute the headless tier stamps with each element's computed style.
pub const COMPUTED_STYLE_ATTR: &str = "data-computed-style";

/// Parse `html` and extract tokens, picking the best style source available.
///
/// `computed` marks a document produced by a layout-capable renderer.
pub fn extract_tokens(
    html: &str,
    base: &Url,
    brand: Option<&str>,
    computed: bool,
    options: ExtractOptions,
) -> StyleTokenSet {
    let document = Html::parse_document(html);
    let declarations = DeclarationStyles::from_document(&document);
    if computed {
        let source = ComputedStyles::new(declarations);
        StyleExtractor::new(&source, base)
            .with_options(options)
            .extract(&document, brand)
    } else {
        StyleExtractor::new(&declarations, base)
            .with_options(options)
            .extract(&document, brand)
    }
}
