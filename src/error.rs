use thiserror::Error;

use crate::fetch::{FetchAttempt, Tier};

/// Longest body excerpt carried by a terminal failure.
pub const EXCERPT_LIMIT: usize = 500;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Missing or unusable target; nothing was fetched.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A required credential or binary is absent; nothing was fetched.
    #[error("configuration error: {0}")]
    Config(String),

    /// Every admitted tier failed. Carries what the last one saw.
    #[error("all fetch tiers exhausted; last tier {tier} returned {}: {excerpt}", status.map(|s| s.to_string()).unwrap_or_else(|| "no response".to_string()))]
    Exhausted {
        tier: Tier,
        status: Option<u16>,
        excerpt: String,
        attempts: Vec<FetchAttempt>,
    },

    /// The extraction task died before producing tokens.
    #[error("extraction failed: {0}")]
    Extraction(String),
}

/// Cut `body` down to at most [`EXCERPT_LIMIT`] chars without splitting one.
pub fn excerpt(body: &str) -> String {
    match body.char_indices().nth(EXCERPT_LIMIT) {
        Some((idx, _)) => body[..idx].to_string(),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_respects_char_boundaries() {
        let body = "é".repeat(EXCERPT_LIMIT + 10);
        let cut = excerpt(&body);
        assert_eq!(cut.chars().count(), EXCERPT_LIMIT);
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn exhausted_message_names_status() {
        let err = ScrapeError::Exhausted {
            tier: Tier::Headless,
            status: Some(403),
            excerpt: "denied".into(),
            attempts: Vec::new(),
        };
        let msg = err.to_string();
        assert!(msg.contains("headless"));
        assert!(msg.contains("403"));
    }
}
