use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::logo::{choose_logo, is_logo_like};
use super::source::StyleSource;
use super::tokens::*;
use crate::css::{color_in, first_font, strip_important, usable_color};
use crate::dedup::OrderedSet;
use crate::resolve::{resolve, DataUri};

/// Tags whose subtree never paints anything useful.
const SKIPPED_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "meta", "link", "title", "base",
];

/// Image references that are never real content.
const DECOY_PATTERNS: &[&str] = &["captcha", "1x1", "spacer", "pixel.gif", "tracking"];

/// Layout values that say nothing about the design.
const UNSET_LENGTHS: &[&str] = &["", "none", "normal", "auto", "0", "0px", "initial", "inherit"];

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Treat any non-fragment anchor as button-like.
    pub permissive_links: bool,
    pub max_images: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            permissive_links: false,
            max_images: 50,
        }
    }
}

/// Turns one parsed document into a [`StyleTokenSet`].
///
/// Walks the document once, in order; every collection keeps first-seen order,
/// so identical documents always give identical tokens.
pub struct StyleExtractor<'a> {
    source: &'a dyn StyleSource,
    base: &'a Url,
    options: ExtractOptions,
}

#[derive(Default)]
struct Harvest {
    colors: OrderedSet<String>,
    fonts: OrderedSet<String>,
    images: OrderedSet<ImageToken>,
    logo_candidates: Vec<String>,
    buttons: OrderedSet<ButtonStyle>,
    headings: OrderedSet<HeadingStyle>,
    sections: OrderedSet<String>,
    header_bg: Option<String>,
    footer_bg: Option<String>,
    footer_logo: Option<String>,
    max_width: Option<String>,
    container_padding: Option<String>,
    grid_gap: Option<String>,
}

impl<'a> StyleExtractor<'a> {
    pub fn new(source: &'a dyn StyleSource, base: &'a Url) -> Self {
        Self {
            source,
            base,
            options: ExtractOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn extract(&self, document: &Html, brand: Option<&str>) -> StyleTokenSet {
        let mut harvest = Harvest::default();
        self.walk(document.root_element(), &mut harvest);

        let logo = choose_logo(&harvest.logo_candidates, self.base, brand);
        let tokens = StyleTokenSet {
            colors: harvest.colors.into_vec(),
            fonts: harvest.fonts.into_vec(),
            images: harvest.images.into_vec(),
            logo,
            favicon: favicon(document, self.base),
            button_styles: harvest.buttons.into_vec(),
            heading_styles: harvest.headings.into_vec(),
            header_background_color: harvest.header_bg.unwrap_or_default(),
            footer_background_color: harvest.footer_bg.unwrap_or_default(),
            footer_logo: harvest.footer_logo.unwrap_or_default(),
            section_background_colors: harvest.sections.into_vec(),
            layout: Layout {
                max_width: harvest.max_width.unwrap_or_else(|| DEFAULT_MAX_WIDTH.into()),
                container_padding: harvest
                    .container_padding
                    .unwrap_or_else(|| DEFAULT_CONTAINER_PADDING.into()),
                grid_gap: harvest.grid_gap.unwrap_or_else(|| DEFAULT_GRID_GAP.into()),
            },
            meta: page_meta(document),
        };
        debug!(
            colors = tokens.colors.len(),
            fonts = tokens.fonts.len(),
            images = tokens.images.len(),
            buttons = tokens.button_styles.len(),
            headings = tokens.heading_styles.len(),
            has_logo = !tokens.logo.is_empty(),
            "tokens extracted"
        );
        tokens
    }

    /// Pre-order walk that prunes skipped subtrees.
    fn walk(&self, root: ElementRef<'_>, harvest: &mut Harvest) {
        let mut stack = vec![root];
        while let Some(element) = stack.pop() {
            if SKIPPED_TAGS.contains(&element.value().name()) {
                continue;
            }
            self.visit(element, harvest);
            let children: Vec<_> = element.children().filter_map(ElementRef::wrap).collect();
            stack.extend(children.into_iter().rev());
        }
    }

    fn visit(&self, el: ElementRef<'_>, harvest: &mut Harvest) {
        let tag = el.value().name();
        let class = el.value().attr("class").unwrap_or_default().to_ascii_lowercase();

        let color = self.source.value(&el, "color");
        let background = self.background(&el);

        if let Some(c) = color.as_deref().and_then(usable_color) {
            harvest.colors.insert(c);
        }
        if let Some(bg) = background.as_deref().and_then(usable_color) {
            harvest.colors.insert(bg);
        }
        if let Some(font) = self
            .source
            .value(&el, "font-family")
            .as_deref()
            .and_then(first_font)
        {
            harvest.fonts.insert(font);
        }

        if self.is_button_like(&el, tag, &class) {
            harvest.buttons.insert_record(ButtonStyle {
                background_color: color_or(background.as_deref(), DEFAULT_BUTTON_BACKGROUND),
                color: color_or(color.as_deref(), DEFAULT_BUTTON_COLOR),
                padding: self.length_or(&el, "padding", DEFAULT_BUTTON_PADDING),
                border_radius: self.length_or(&el, "border-radius", DEFAULT_BUTTON_RADIUS),
            });
        }

        if is_heading(tag) {
            harvest.headings.insert_record(HeadingStyle {
                tag: tag.to_string(),
                color: color_or(color.as_deref(), DEFAULT_HEADING_COLOR),
                font_size: self.length_or(&el, "font-size", default_heading_size(tag)),
                font_weight: self.length_or(&el, "font-weight", DEFAULT_HEADING_WEIGHT),
                font_family: self
                    .source
                    .value(&el, "font-family")
                    .as_deref()
                    .and_then(first_font)
                    .unwrap_or_else(|| DEFAULT_HEADING_FAMILY.to_string()),
            });
        }

        let usable_bg = background.as_deref().and_then(usable_color);

        if tag == "section" || ["section", "container", "wrapper"].iter().any(|k| class.contains(k)) {
            if let Some(bg) = usable_bg.clone() {
                harvest.sections.insert(bg);
            }
        }

        if class.contains("container") || class.contains("wrapper") {
            if harvest.max_width.is_none() {
                harvest.max_width = self.length(&el, "max-width");
            }
            if harvest.container_padding.is_none() {
                harvest.container_padding = self.length(&el, "padding");
            }
        }

        if harvest.grid_gap.is_none() {
            harvest.grid_gap = self.length(&el, "gap").or_else(|| self.length(&el, "grid-gap"));
        }

        if harvest.header_bg.is_none() && is_header(tag, &class) {
            harvest.header_bg = usable_bg.clone();
        }
        if harvest.footer_bg.is_none() && is_footer(tag, &class) {
            harvest.footer_bg = usable_bg;
        }

        if tag == "img" {
            self.visit_image(el, harvest);
        }
    }

    fn visit_image(&self, el: ElementRef<'_>, harvest: &mut Harvest) {
        let attrs = el.value();
        let raw = attrs
            .attr("src")
            .filter(|s| !s.trim().is_empty())
            .or_else(|| attrs.attr("data-src"))
            .unwrap_or_default();
        let alt = attrs.attr("alt").unwrap_or_default();
        let class = attrs.attr("class").unwrap_or_default();

        if is_logo_like(raw, alt, class) {
            harvest.logo_candidates.push(raw.to_string());
            if harvest.footer_logo.is_none() && inside_footer(el) {
                let url = resolve(self.base, raw, DataUri::Drop);
                if !url.is_empty() {
                    harvest.footer_logo = Some(url);
                }
            }
        }

        if harvest.images.len() >= self.options.max_images {
            return;
        }
        let src = resolve(self.base, raw, DataUri::Drop);
        let lower = src.to_lowercase();
        if src.is_empty() || DECOY_PATTERNS.iter().any(|p| lower.contains(p)) {
            return;
        }
        let position = harvest.images.len();
        harvest.images.insert_keyed(
            src.clone(),
            ImageToken {
                src,
                alt: alt.trim().to_string(),
                width: dimension(attrs.attr("width")),
                height: dimension(attrs.attr("height")),
                position,
            },
        );
    }

    fn is_button_like(&self, el: &ElementRef<'_>, tag: &str, class: &str) -> bool {
        if tag == "button" || class.contains("button") || class.contains("btn") {
            return true;
        }
        if tag == "input" {
            let kind = el.value().attr("type").unwrap_or_default().to_ascii_lowercase();
            return kind == "submit" || kind == "button";
        }
        if self.options.permissive_links && tag == "a" {
            let href = el.value().attr("href").unwrap_or_default().trim();
            return !href.is_empty() && !href.starts_with('#');
        }
        false
    }

    fn background(&self, el: &ElementRef<'_>) -> Option<String> {
        self.source
            .value(el, "background-color")
            .or_else(|| self.source.value(el, "background").and_then(|v| color_in(&v)))
    }

    /// A length-ish value that actually says something.
    fn length(&self, el: &ElementRef<'_>, property: &str) -> Option<String> {
        self.source
            .value(el, property)
            .map(|v| strip_important(&v).to_string())
            .filter(|v| !UNSET_LENGTHS.contains(&v.to_ascii_lowercase().as_str()))
            .filter(|v| !is_page_relative(v))
    }

    fn length_or(&self, el: &ElementRef<'_>, property: &str, default: &str) -> String {
        self.source
            .value(el, property)
            .map(|v| strip_important(&v).to_string())
            .filter(|v| !v.is_empty() && !is_page_relative(v))
            .unwrap_or_else(|| default.to_string())
    }
}

/// Normalised color when one is usable on its own, the default otherwise.
fn color_or(raw: Option<&str>, default: &str) -> String {
    raw.and_then(usable_color)
        .unwrap_or_else(|| default.to_string())
}

/// Values that only mean something inside the page's own cascade.
fn is_page_relative(value: &str) -> bool {
    let lower = value.trim().to_ascii_lowercase();
    lower.starts_with("var(") || matches!(lower.as_str(), "inherit" | "initial" | "unset" | "revert")
}

fn is_heading(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

fn is_header(tag: &str, class: &str) -> bool {
    tag == "header" || tag == "nav" || class.contains("header") || class.contains("navbar")
}

fn is_footer(tag: &str, class: &str) -> bool {
    tag == "footer" || class.contains("footer")
}

fn inside_footer(el: ElementRef<'_>) -> bool {
    el.ancestors().filter_map(ElementRef::wrap).any(|a| {
        let class = a.value().attr("class").unwrap_or_default().to_ascii_lowercase();
        is_footer(a.value().name(), &class)
    })
}

fn dimension(raw: Option<&str>) -> Option<u32> {
    raw?.trim().trim_end_matches("px").parse().ok()
}

fn select_first<'d>(document: &'d Html, css: &str) -> Option<ElementRef<'d>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}

fn meta_content(document: &Html, name: &str) -> String {
    select_first(document, &format!("meta[name=\"{name}\"]"))
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .unwrap_or_default()
}

fn page_meta(document: &Html) -> PageMeta {
    PageMeta {
        title: select_first(document, "title")
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default(),
        description: meta_content(document, "description"),
        viewport: meta_content(document, "viewport"),
        theme_color: meta_content(document, "theme-color"),
    }
}

/// Inline `data:` favicons are kept; they render as-is.
fn favicon(document: &Html, base: &Url) -> String {
    select_first(document, "link[rel~=\"icon\"]")
        .and_then(|el| el.value().attr("href"))
        .map(|href| resolve(base, href, DataUri::Keep))
        .unwrap_or_default()
}
