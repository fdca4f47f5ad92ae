use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::trace::TraceLayer;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use style_crawler::fetch::{FetchAttempt, FetchRequest, Tier};
use style_crawler::{ScrapeError, Scraper, StyleTokenSet};

#[derive(Clone)]
pub struct AppState {
    pub scraper: Scraper,
    pub default_budget: Tier,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScrapeQuery {
    /// Absolute http(s) URL of the page to scrape.
    pub url: Option<String>,
    /// Brand name, used only to pick between logo candidates.
    pub brand: Option<String>,
    /// Most expensive fetch tier allowed.
    pub budget: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeSource {
    /// Tier that produced the document; absent when every tier failed.
    pub tier: Option<Tier>,
    pub attempts: Vec<FetchAttempt>,
    /// Tokens are the neutral defaults, not the page's.
    pub fallback: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResponse {
    #[serde(flatten)]
    pub tokens: StyleTokenSet,
    pub scraped_with: ScrapeSource,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(ErrorBody { error: self.1 })).into_response()
    }
}

impl From<ScrapeError> for ApiError {
    fn from(err: ScrapeError) -> Self {
        let status = match err {
            ScrapeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ScrapeError::Config(_) | ScrapeError::Extraction(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ScrapeError::Exhausted { .. } => StatusCode::BAD_GATEWAY,
        };
        ApiError(status, err.to_string())
    }
}

/// Scrape design tokens from a page
#[utoipa::path(
    get,
    path = "/scrape",
    params(ScrapeQuery),
    responses(
        (status = 200, description = "Design tokens (fallback tokens when the page could not be fetched)", body = ScrapeResponse),
        (status = 400, description = "Missing or invalid url/budget", body = ErrorBody),
        (status = 500, description = "Missing credential or browser", body = ErrorBody)
    ),
    tag = "scraper"
)]
pub async fn scrape_styles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScrapeQuery>,
) -> Result<Json<ScrapeResponse>, ApiError> {
    let budget = match query.budget.as_deref() {
        Some(raw) => raw.parse::<Tier>()?,
        None => state.default_budget,
    };
    let request = FetchRequest::new(query.url.as_deref().unwrap_or_default())?
        .with_brand(query.brand)
        .with_budget(budget);

    match state.scraper.scrape(&request).await {
        Ok(outcome) => Ok(Json(ScrapeResponse {
            tokens: outcome.tokens,
            scraped_with: ScrapeSource {
                tier: Some(outcome.tier),
                attempts: outcome.attempts,
                fallback: false,
            },
        })),
        Err(ScrapeError::Exhausted {
            tier,
            status,
            excerpt,
            attempts,
        }) => {
            warn!(url = %request.url, %tier, ?status, excerpt = %excerpt, "serving fallback tokens");
            Ok(Json(ScrapeResponse {
                tokens: StyleTokenSet::fallback(),
                scraped_with: ScrapeSource {
                    tier: None,
                    attempts,
                    fallback: true,
                },
            }))
        }
        Err(other) => Err(other.into()),
    }
}

pub async fn health() -> &'static str {
    "ok"
}

/// Scrape and health routes; anything but `GET` on them is a 405.
pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/scrape", get(scrape_styles))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
