//! Turns asset references found in markup into absolute, fetchable URLs.

use reqwest::Url;

/// What to do with an embedded `data:` URI. Chosen per call-site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataUri {
    /// Hand it back untouched (inline favicons, image metadata).
    Keep,
    /// Treat it as "no usable URL" (logos, backgrounds).
    Drop,
}

/// Resolve `candidate` against `base`.
///
/// Returns an empty string whenever there is no usable URL; callers omit the
/// field in that case. Never panics.
pub fn resolve(base: &Url, candidate: &str, data: DataUri) -> String {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return String::new();
    }

    if candidate
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
    {
        return match data {
            DataUri::Keep => candidate.to_string(),
            DataUri::Drop => String::new(),
        };
    }

    let lower = candidate.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return match Url::parse(candidate) {
            Ok(_) => candidate.to_string(),
            Err(_) => String::new(),
        };
    }

    if let Some(rest) = candidate.strip_prefix("//") {
        return match Url::parse(&format!("{}://{}", base.scheme(), rest)) {
            Ok(url) => url.to_string(),
            Err(_) => String::new(),
        };
    }

    match base.join(candidate) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url.to_string(),
        _ => String::new(),
    }
}

/// Host of an absolute URL, lower-cased. Empty when there is none.
pub fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/blog/post.html").unwrap()
    }

    #[test]
    fn absolute_urls_pass_through_unchanged() {
        for url in [
            "https://cdn.other.net/a.png",
            "http://example.com/x?y=1#z",
            "https://example.com",
        ] {
            assert_eq!(resolve(&base(), url, DataUri::Drop), url);
        }
    }

    #[test]
    fn relative_paths_stay_on_base_origin() {
        let resolved = resolve(&base(), "/img/logo.png", DataUri::Drop);
        assert_eq!(resolved, "https://example.com/img/logo.png");

        let sibling = resolve(&base(), "hero.jpg", DataUri::Drop);
        assert_eq!(sibling, "https://example.com/blog/hero.jpg");

        let parent = resolve(&base(), "../assets/a.svg", DataUri::Drop);
        assert_eq!(host_of(&parent), "example.com");
    }

    #[test]
    fn protocol_relative_takes_base_scheme() {
        assert_eq!(
            resolve(&base(), "//cdn.example.org/logo.svg", DataUri::Drop),
            "https://cdn.example.org/logo.svg"
        );
        let http_base = Url::parse("http://example.com/").unwrap();
        assert_eq!(
            resolve(&http_base, "//cdn.example.org/a.png", DataUri::Drop),
            "http://cdn.example.org/a.png"
        );
    }

    #[test]
    fn data_uris_follow_call_site_policy() {
        let data = "data:image/png;base64,iVBORw0KGgo=";
        assert_eq!(resolve(&base(), data, DataUri::Keep), data);
        assert_eq!(resolve(&base(), data, DataUri::Drop), "");
        assert_eq!(resolve(&base(), "DATA:image/gif;base64,R0lG", DataUri::Drop), "");
    }

    #[test]
    fn empty_and_malformed_yield_empty() {
        assert_eq!(resolve(&base(), "", DataUri::Keep), "");
        assert_eq!(resolve(&base(), "   ", DataUri::Keep), "");
        assert_eq!(resolve(&base(), "http://[::1", DataUri::Keep), "");
        assert_eq!(resolve(&base(), "//", DataUri::Keep), "");
        assert_eq!(resolve(&base(), "javascript:void(0)", DataUri::Keep), "");
    }
}
