use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_BUTTON_BACKGROUND: &str = "#4f46e5";
pub const DEFAULT_BUTTON_COLOR: &str = "#ffffff";
pub const DEFAULT_BUTTON_PADDING: &str = "12px 24px";
pub const DEFAULT_BUTTON_RADIUS: &str = "6px";

pub const DEFAULT_HEADING_COLOR: &str = "#1f2937";
pub const DEFAULT_HEADING_WEIGHT: &str = "700";
pub const DEFAULT_HEADING_FAMILY: &str = "inherit";

pub const DEFAULT_MAX_WIDTH: &str = "1200px";
pub const DEFAULT_CONTAINER_PADDING: &str = "16px";
pub const DEFAULT_GRID_GAP: &str = "24px";

const PLACEHOLDER_IMAGE: &str = "https://placehold.co/1200x600";

/// Heading size used when the page gives none.
pub fn default_heading_size(tag: &str) -> &'static str {
    match tag {
        "h1" => "48px",
        "h2" => "36px",
        "h3" => "30px",
        "h4" => "24px",
        "h5" => "20px",
        _ => "16px",
    }
}

/// Design tokens for one page snapshot. Every field is always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StyleTokenSet {
    /// First-seen order; the first entries are the most prominent.
    pub colors: Vec<String>,
    pub fonts: Vec<String>,
    pub images: Vec<ImageToken>,
    pub logo: String,
    pub favicon: String,
    pub button_styles: Vec<ButtonStyle>,
    pub heading_styles: Vec<HeadingStyle>,
    pub header_background_color: String,
    pub footer_background_color: String,
    pub footer_logo: String,
    pub section_background_colors: Vec<String>,
    pub layout: Layout,
    pub meta: PageMeta,
}

impl StyleTokenSet {
    /// Neutral tokens for when the page could not be fetched at all.
    pub fn fallback() -> Self {
        Self {
            colors: ["#4f46e5", "#1f2937", "#ffffff", "#f3f4f6"]
                .map(String::from)
                .to_vec(),
            fonts: vec!["Inter".to_string(), "system-ui".to_string()],
            images: vec![ImageToken {
                src: PLACEHOLDER_IMAGE.to_string(),
                alt: String::new(),
                width: Some(1200),
                height: Some(600),
                position: 0,
            }],
            button_styles: vec![ButtonStyle::default()],
            heading_styles: vec![HeadingStyle::for_tag("h1")],
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageToken {
    pub src: String,
    pub alt: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Zero-based document order among kept images.
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ButtonStyle {
    pub background_color: String,
    pub color: String,
    pub padding: String,
    pub border_radius: String,
}

impl Default for ButtonStyle {
    fn default() -> Self {
        Self {
            background_color: DEFAULT_BUTTON_BACKGROUND.to_string(),
            color: DEFAULT_BUTTON_COLOR.to_string(),
            padding: DEFAULT_BUTTON_PADDING.to_string(),
            border_radius: DEFAULT_BUTTON_RADIUS.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HeadingStyle {
    pub tag: String,
    pub color: String,
    pub font_size: String,
    pub font_weight: String,
    pub font_family: String,
}

impl HeadingStyle {
    pub fn for_tag(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            color: DEFAULT_HEADING_COLOR.to_string(),
            font_size: default_heading_size(tag).to_string(),
            font_weight: DEFAULT_HEADING_WEIGHT.to_string(),
            font_family: DEFAULT_HEADING_FAMILY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub max_width: String,
    pub container_padding: String,
    pub grid_gap: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH.to_string(),
            container_padding: DEFAULT_CONTAINER_PADDING.to_string(),
            grid_gap: DEFAULT_GRID_GAP.to_string(),
        }
    }
}

/// Straight copies of document metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub viewport: String,
    pub theme_color: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_every_key_even_when_empty() {
        let json = serde_json::to_value(StyleTokenSet::default()).unwrap();
        for key in [
            "colors",
            "fonts",
            "images",
            "logo",
            "favicon",
            "buttonStyles",
            "headingStyles",
            "headerBackgroundColor",
            "footerBackgroundColor",
            "footerLogo",
            "sectionBackgroundColors",
            "layout",
            "meta",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["layout"]["maxWidth"], DEFAULT_MAX_WIDTH);
        assert_eq!(json["meta"]["themeColor"], "");
    }

    #[test]
    fn fallback_is_usable() {
        let tokens = StyleTokenSet::fallback();
        assert!(!tokens.colors.is_empty());
        assert!(!tokens.fonts.is_empty());
        assert_eq!(tokens.button_styles[0].background_color, DEFAULT_BUTTON_BACKGROUND);
        assert_eq!(tokens.heading_styles[0].font_size, "48px");
        assert!(tokens.images[0].src.starts_with("https://"));
    }
}
