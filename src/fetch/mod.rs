//! Fetch tiers and the controller that escalates through them.

mod browser;
mod escalation;
mod http;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::error::ScrapeError;

pub use browser::BrowserSettings;
pub use escalation::{Escalator, Fetched, DEFAULT_TIMEOUT};
pub use http::{LiveFetcher, RenderProxy, DEFAULT_RENDER_ENDPOINT};

static USER_AGENTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    ]
});

const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Phrases that mark an anti-automation interstitial instead of the page.
const CHALLENGE_PATTERNS: &[&str] = &[
    "checking your browser",
    "just a moment...",
    "cf-browser-verification",
    "cf-challenge",
    "attention required! | cloudflare",
    "verify you are a human",
    "prove you're not a robot",
    "unusual traffic",
    "automated requests",
    "px-captcha",
    "ddos-guard",
    "press & hold",
];

pub(crate) fn pick_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FALLBACK_USER_AGENT)
}

/// Best-effort: substring match on known interstitial phrases.
pub fn detect_challenge(body: &str) -> bool {
    let lower = body.to_lowercase();
    CHALLENGE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// One fetch strategy. Ordered by ascending cost.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Direct HTTP GET.
    Plain,
    /// Rendering proxy, static HTML only.
    StaticRender,
    /// Rendering proxy through residential/premium exits.
    PremiumProxy,
    /// Rendering proxy with JavaScript execution.
    JsRender,
    /// Local headless browser with computed styles.
    Headless,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Plain,
        Tier::StaticRender,
        Tier::PremiumProxy,
        Tier::JsRender,
        Tier::Headless,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Plain => "plain",
            Tier::StaticRender => "static_render",
            Tier::PremiumProxy => "premium_proxy",
            Tier::JsRender => "js_render",
            Tier::Headless => "headless",
        }
    }

    pub fn uses_render_proxy(&self) -> bool {
        matches!(self, Tier::StaticRender | Tier::PremiumProxy | Tier::JsRender)
    }
}

impl Default for Tier {
    fn default() -> Self {
        Tier::Plain
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ScrapeError::InvalidInput(format!("unknown fetch tier '{s}'")))
    }
}

/// A validated scrape target.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    /// Free text, only used to break logo ties.
    pub brand: Option<String>,
    /// Most expensive tier this request may reach.
    pub budget: Tier,
}

impl FetchRequest {
    pub fn new(raw: &str) -> Result<Self, ScrapeError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ScrapeError::InvalidInput("missing target url".into()));
        }
        let url = Url::parse(raw)
            .map_err(|e| ScrapeError::InvalidInput(format!("invalid target url '{raw}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ScrapeError::InvalidInput(format!(
                "target url must be absolute http(s): '{raw}'"
            )));
        }
        Ok(Self {
            url,
            brand: None,
            budget: Tier::default(),
        })
    }

    pub fn with_brand(mut self, brand: Option<String>) -> Self {
        self.brand = brand.map(|b| b.trim().to_string()).filter(|b| !b.is_empty());
        self
    }

    pub fn with_budget(mut self, budget: Tier) -> Self {
        self.budget = budget;
        self
    }
}

/// What a fetcher hands back before the controller judges it.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
    /// Final URL after redirects, when the tier can see it.
    pub final_url: Option<String>,
    /// Body carries per-element computed styles.
    pub computed_styles: bool,
}

/// Why one tier did not yield a usable document.
#[derive(Debug, Clone, Error)]
pub enum FetchFailure {
    #[error("network error: {0}")]
    Network(String),
    #[error("status {status}")]
    Status { status: u16, body: String },
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("bot challenge detected (status {status})")]
    Challenge { status: u16, body: String },
}

impl FetchFailure {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchFailure::Status { status, .. } | FetchFailure::Challenge { status, .. } => {
                Some(*status)
            }
            FetchFailure::Network(_) | FetchFailure::Timeout(_) => None,
        }
    }

    /// Body when there was one, otherwise the failure text.
    pub fn detail(&self) -> String {
        match self {
            FetchFailure::Status { body, .. } | FetchFailure::Challenge { body, .. } => {
                body.clone()
            }
            other => other.to_string(),
        }
    }
}

/// Record of one tier's try.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FetchAttempt {
    pub tier: Tier,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub status: Option<u16>,
    pub challenge: bool,
    /// Empty on success.
    pub failure: String,
}

/// A fetch strategy backend. One call per tier; no retries inside.
#[async_trait]
pub trait TierFetcher: Send + Sync {
    async fn fetch(&self, tier: Tier, url: &Url, timeout: Duration) -> anyhow::Result<RawResponse>;

    /// Fail fast when a tier in `tiers` cannot run with the current config.
    fn preflight(&self, _tiers: &[Tier]) -> Result<(), ScrapeError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_ordered_by_cost() {
        let mut sorted = Tier::ALL;
        sorted.sort();
        assert_eq!(sorted, Tier::ALL);
        assert!(Tier::Plain < Tier::Headless);
    }

    #[test]
    fn tier_parses_from_wire_names() {
        assert_eq!("js_render".parse::<Tier>().unwrap(), Tier::JsRender);
        assert_eq!(" HEADLESS ".parse::<Tier>().unwrap(), Tier::Headless);
        assert!("turbo".parse::<Tier>().is_err());
    }

    #[test]
    fn request_requires_absolute_http_url() {
        assert!(FetchRequest::new("https://example.com/").is_ok());
        for bad in ["", "   ", "/relative", "ftp://example.com/", "mailto:a@b.c", "not a url"] {
            assert!(
                matches!(FetchRequest::new(bad), Err(ScrapeError::InvalidInput(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn request_defaults_to_cheapest_budget() {
        let req = FetchRequest::new("https://example.com").unwrap();
        assert_eq!(req.budget, Tier::Plain);
        let req = req.with_brand(Some("  ".into()));
        assert_eq!(req.brand, None);
    }

    #[test]
    fn challenge_detection_is_case_insensitive() {
        assert!(detect_challenge("<title>Just a moment...</title>"));
        assert!(detect_challenge("Checking your browser before accessing"));
        assert!(!detect_challenge("<html><body>Welcome to our shop</body></html>"));
    }
}
