use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use reqwest::Url;
use tracing::{debug, info, warn};

use super::{detect_challenge, FetchAttempt, FetchFailure, FetchRequest, RawResponse, Tier, TierFetcher};
use crate::error::{excerpt, ScrapeError};
use crate::limiter::RateLimiter;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// A usable document and how we got it.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub tier: Tier,
    pub body: String,
    /// Base for resolving relative references.
    pub base_url: Url,
    pub computed_styles: bool,
    pub attempts: Vec<FetchAttempt>,
}

/// Walks the tier list cheapest-first and stops at the first usable document.
///
/// Tiers run strictly one after another; the list is data, so reordering or
/// adding a tier never touches this loop.
#[derive(Clone)]
pub struct Escalator {
    fetcher: Arc<dyn TierFetcher>,
    tiers: Vec<Tier>,
    timeout: Duration,
    limiter: Arc<RateLimiter>,
}

impl Escalator {
    pub fn new(fetcher: Arc<dyn TierFetcher>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            fetcher,
            tiers: Tier::ALL.to_vec(),
            timeout: DEFAULT_TIMEOUT,
            limiter,
        }
    }

    pub fn with_tiers(mut self, tiers: Vec<Tier>) -> Self {
        self.tiers = tiers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Tiers this request is allowed to reach, in order.
    pub fn admitted(&self, budget: Tier) -> Vec<Tier> {
        self.tiers.iter().copied().filter(|t| *t <= budget).collect()
    }

    pub async fn run(&self, request: &FetchRequest) -> Result<Fetched, ScrapeError> {
        let tiers = self.admitted(request.budget);
        if tiers.is_empty() {
            return Err(ScrapeError::Config(format!(
                "no fetch tier available within budget '{}'",
                request.budget
            )));
        }
        self.fetcher.preflight(&tiers)?;

        let mut attempts = Vec::with_capacity(tiers.len());
        let mut last: Option<(Tier, FetchFailure)> = None;

        for tier in tiers {
            self.limiter.wait().await;
            info!(%tier, url = %request.url, "fetch attempt");

            let started_at = Utc::now();
            let clock = Instant::now();
            let outcome = match tokio::time::timeout(
                self.timeout,
                self.fetcher.fetch(tier, &request.url, self.timeout),
            )
            .await
            {
                Ok(Ok(response)) => judge(response),
                Ok(Err(e)) => Err(FetchFailure::Network(e.to_string())),
                Err(_) => Err(FetchFailure::Timeout(self.timeout)),
            };
            let elapsed_ms = clock.elapsed().as_millis() as u64;

            match outcome {
                Ok(response) => {
                    attempts.push(FetchAttempt {
                        tier,
                        started_at,
                        elapsed_ms,
                        status: Some(response.status),
                        challenge: false,
                        failure: String::new(),
                    });
                    info!(%tier, status = response.status, elapsed_ms, "fetch succeeded");
                    let base_url = response
                        .final_url
                        .as_deref()
                        .and_then(|u| Url::parse(u).ok())
                        .unwrap_or_else(|| request.url.clone());
                    return Ok(Fetched {
                        tier,
                        body: response.body,
                        base_url,
                        computed_styles: response.computed_styles,
                        attempts,
                    });
                }
                Err(failure) => {
                    warn!(%tier, elapsed_ms, status = ?failure.status(), reason = %failure, "fetch tier failed, escalating");
                    attempts.push(FetchAttempt {
                        tier,
                        started_at,
                        elapsed_ms,
                        status: failure.status(),
                        challenge: matches!(failure, FetchFailure::Challenge { .. }),
                        failure: failure.to_string(),
                    });
                    last = Some((tier, failure));
                }
            }
        }

        let Some((tier, failure)) = last else {
            return Err(ScrapeError::Config("no fetch tier was attempted".into()));
        };
        debug!(attempts = attempts.len(), "all tiers exhausted");
        Err(ScrapeError::Exhausted {
            tier,
            status: failure.status(),
            excerpt: excerpt(&failure.detail()),
            attempts,
        })
    }
}

/// Usable means 2xx and not an interstitial.
fn judge(response: RawResponse) -> Result<RawResponse, FetchFailure> {
    if !(200..300).contains(&response.status) {
        return Err(FetchFailure::Status {
            status: response.status,
            body: response.body,
        });
    }
    if detect_challenge(&response.body) {
        return Err(FetchFailure::Challenge {
            status: response.status,
            body: response.body,
        });
    }
    Ok(response)
}
