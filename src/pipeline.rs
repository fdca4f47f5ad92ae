//! Fetch-then-extract for one scrape request.

use tracing::{info, Instrument};
use uuid::Uuid;

use crate::error::ScrapeError;
use crate::extract::{extract_tokens, ExtractOptions, StyleTokenSet};
use crate::fetch::{Escalator, FetchAttempt, FetchRequest, Tier};

/// Tokens plus the fetch history that produced them.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub tokens: StyleTokenSet,
    pub tier: Tier,
    pub attempts: Vec<FetchAttempt>,
}

#[derive(Clone)]
pub struct Scraper {
    escalator: Escalator,
    options: ExtractOptions,
}

impl Scraper {
    pub fn new(escalator: Escalator) -> Self {
        Self {
            escalator,
            options: ExtractOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub async fn scrape(&self, request: &FetchRequest) -> Result<ScrapeOutcome, ScrapeError> {
        let span = tracing::info_span!(
            "scrape",
            request_id = %Uuid::new_v4(),
            url = %request.url,
            budget = %request.budget
        );
        async {
            let fetched = self.escalator.run(request).await?;
            let body = fetched.body;
            let base = fetched.base_url;
            let brand = request.brand.clone();
            let options = self.options.clone();
            let computed = fetched.computed_styles;
            let tokens = tokio::task::spawn_blocking(move || {
                extract_tokens(&body, &base, brand.as_deref(), computed, options)
            })
            .await
            .map_err(|e| ScrapeError::Extraction(e.to_string()))?;
            info!(
                tier = %fetched.tier,
                attempts = fetched.attempts.len(),
                colors = tokens.colors.len(),
                logo = %tokens.logo,
                "scrape complete"
            );
            Ok::<_, ScrapeError>(ScrapeOutcome {
                tokens,
                tier: fetched.tier,
                attempts: fetched.attempts,
            })
        }
        .instrument(span)
        .await
    }
}
