//! Declaration-text scanning plus the color and font normalisation applied
//! when tokens are harvested.

use once_cell::sync::Lazy;
use regex::Regex;

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-f]{3}|[0-9a-f]{4}|[0-9a-f]{6}|[0-9a-f]{8})$")
        .expect("static hex color pattern")
});

static FUNC_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(rgba?|hsla?)\(\s*([^()]*)\)$").expect("static color function pattern")
});

static COLOR_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)#[0-9a-f]{3,8}\b|(?:rgba?|hsla?)\([^()]*\)").expect("static color token pattern")
});

static COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("static comment pattern"));

/// First value of `property` in a declaration block, trimmed.
///
/// Case-insensitive and tolerant of a missing trailing semicolon. Empty when
/// the property is absent.
pub fn extract(block: &str, property: &str) -> String {
    let property = property.trim();
    if property.is_empty() {
        return String::new();
    }
    block
        .split(|c| c == ';' || c == '{' || c == '}')
        .filter_map(|decl| decl.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case(property))
        .map(|(_, value)| value.trim().to_string())
        .unwrap_or_default()
}

/// Remove `/* ... */` comments from stylesheet text.
pub fn strip_comments(sheet: &str) -> String {
    COMMENT.replace_all(sheet, "").into_owned()
}

/// Drop a trailing `!important` flag.
pub fn strip_important(value: &str) -> &str {
    let trimmed = value.trim();
    match trimmed.to_ascii_lowercase().rfind("!important") {
        Some(idx) => trimmed[..idx].trim_end(),
        None => trimmed,
    }
}

/// Normalise a color value for the `colors` token set.
///
/// Only hex, rgb(a) and hsl(a) shapes are accepted. Transparent, inherited
/// and zero-alpha values are rejected.
pub fn usable_color(raw: &str) -> Option<String> {
    let value = strip_important(raw).to_ascii_lowercase();
    if value.is_empty() || value == "transparent" || value == "inherit" {
        return None;
    }

    if HEX_COLOR.is_match(&value) {
        let digits = &value[1..];
        let zero_alpha = match digits.len() {
            4 => digits.ends_with('0'),
            8 => digits.ends_with("00"),
            _ => false,
        };
        return (!zero_alpha).then_some(value);
    }

    let caps = FUNC_COLOR.captures(&value)?;
    let args: Vec<&str> = caps[2]
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();
    if args.len() < 3 {
        return None;
    }
    if args.len() >= 4 && is_zero_alpha(args[3]) {
        return None;
    }
    Some(value)
}

fn is_zero_alpha(alpha: &str) -> bool {
    alpha
        .trim_end_matches('%')
        .parse::<f32>()
        .map(|a| a == 0.0)
        .unwrap_or(false)
}

/// First usable color inside a shorthand such as `background: url(x) #fff`.
pub fn color_in(value: &str) -> Option<String> {
    COLOR_TOKEN
        .find_iter(value)
        .find_map(|m| usable_color(m.as_str()))
}

/// First family of a `font-family` list, quotes stripped.
pub fn first_font(raw: &str) -> Option<String> {
    let first = strip_important(raw).split(',').next()?.trim();
    let name = first.trim_matches(|c| c == '"' || c == '\'').trim();
    let lower = name.to_ascii_lowercase();
    if name.is_empty()
        || lower.starts_with("var(")
        || matches!(lower.as_str(), "inherit" | "initial" | "unset" | "revert")
    {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_finds_first_declaration() {
        let block = "color: #333; background-color:#fff ;padding:4px 8px";
        assert_eq!(extract(block, "color"), "#333");
        assert_eq!(extract(block, "background-color"), "#fff");
        assert_eq!(extract(block, "padding"), "4px 8px");
        assert_eq!(extract(block, "margin"), "");
    }

    #[test]
    fn extract_is_case_insensitive_and_block_aware() {
        assert_eq!(extract("COLOR : Red }", "color"), "Red");
        assert_eq!(extract("{font-family:'Inter', sans-serif}", "font-family"), "'Inter', sans-serif");
        assert_eq!(extract("border-color: red", "color"), "");
        assert_eq!(extract("background:url(https://x.io/a.png) #fff", "background"), "url(https://x.io/a.png) #fff");
        assert_eq!(extract("color:", "color"), "");
        assert_eq!(extract("color: red", " "), "");
    }

    #[test]
    fn important_is_stripped() {
        assert_eq!(strip_important("#fff !important"), "#fff");
        assert_eq!(strip_important(" 12px "), "12px");
    }

    #[test]
    fn transparent_and_inherit_are_not_colors() {
        for value in [
            "transparent",
            "inherit",
            "rgba(0, 0, 0, 0)",
            "rgba(10,20,30,0.0)",
            "hsla(120, 50%, 50%, 0)",
            "rgb(0 0 0 / 0%)",
            "#0000",
            "#11223300",
            "red",
            "",
        ] {
            assert_eq!(usable_color(value), None, "{value}");
        }
    }

    #[test]
    fn usable_colors_are_normalised() {
        assert_eq!(usable_color("#FFF").as_deref(), Some("#fff"));
        assert_eq!(usable_color("rgb(17, 17, 17)").as_deref(), Some("rgb(17, 17, 17)"));
        assert_eq!(usable_color("rgba(0,0,0,0.5)").as_deref(), Some("rgba(0,0,0,0.5)"));
        assert_eq!(usable_color("hsl(200, 50%, 40%) !important").as_deref(), Some("hsl(200, 50%, 40%)"));
    }

    #[test]
    fn first_font_strips_quotes() {
        assert_eq!(first_font("\"Helvetica Neue\", Arial, sans-serif").as_deref(), Some("Helvetica Neue"));
        assert_eq!(first_font("'Inter'").as_deref(), Some("Inter"));
        assert_eq!(first_font("inherit"), None);
        assert_eq!(first_font("var(--font-sans), sans-serif"), None);
        assert_eq!(first_font(""), None);
    }

    #[test]
    fn shorthand_colors_are_found() {
        assert_eq!(color_in("url(/bg.png) no-repeat #1A1A1A").as_deref(), Some("#1a1a1a"));
        assert_eq!(color_in("linear-gradient(rgba(0,0,0,0), rgb(5, 5, 5))").as_deref(), Some("rgb(5, 5, 5)"));
        assert_eq!(color_in("none"), None);
    }

    #[test]
    fn comments_are_removed() {
        assert_eq!(strip_comments("a{/* x */color:red}"), "a{color:red}");
    }
}
