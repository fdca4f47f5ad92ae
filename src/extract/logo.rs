//! Picks one logo from the logo-like images on a page.

use reqwest::Url;

use crate::resolve::{host_of, resolve, DataUri};

/// `src`, `alt` or `class` mentions a logo or brand.
pub fn is_logo_like(src: &str, alt: &str, class: &str) -> bool {
    [src, alt, class].iter().any(|attr| {
        let lower = attr.to_lowercase();
        lower.contains("logo") || lower.contains("brand")
    })
}

/// Strict priority chain over `candidates` (raw references, document order):
/// same host as the page, then brand mention, then the first one.
///
/// Within a rule the first match wins. Empty when nothing resolves.
pub fn choose_logo(candidates: &[String], page: &Url, brand: Option<&str>) -> String {
    let resolved: Vec<(&str, String)> = candidates
        .iter()
        .map(|raw| (raw.as_str(), resolve(page, raw, DataUri::Drop)))
        .filter(|(_, url)| !url.is_empty())
        .collect();

    let page_host = page.host_str().unwrap_or_default().to_ascii_lowercase();
    if !page_host.is_empty() {
        if let Some((_, url)) = resolved.iter().find(|(_, url)| host_of(url) == page_host) {
            return url.clone();
        }
    }

    if let Some(needle) = brand.map(|b| b.trim().to_lowercase()).filter(|b| !b.is_empty()) {
        if let Some((_, url)) = resolved
            .iter()
            .find(|(raw, _)| raw.to_lowercase().contains(&needle))
        {
            return url.clone();
        }
    }

    resolved
        .into_iter()
        .next()
        .map(|(_, url)| url)
        .unwrap_or_default()
}
