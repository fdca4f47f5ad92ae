mod api;

use std::sync::Arc;

use axum::Router;
use dotenv::dotenv;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use style_crawler::config::Config;
use style_crawler::fetch::{Escalator, LiveFetcher};
use style_crawler::limiter::RateLimiter;
use style_crawler::Scraper;

#[derive(OpenApi)]
#[openapi(
    paths(api::scrape_styles),
    components(
        schemas(
            api::ScrapeResponse,
            api::ScrapeSource,
            api::ErrorBody,
            style_crawler::StyleTokenSet,
            style_crawler::extract::ImageToken,
            style_crawler::extract::ButtonStyle,
            style_crawler::extract::HeadingStyle,
            style_crawler::extract::Layout,
            style_crawler::extract::PageMeta,
            style_crawler::fetch::FetchAttempt,
            style_crawler::Tier
        )
    ),
    tags(
        (name = "scraper", description = "Design token scraping API")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let limiter = Arc::new(RateLimiter::new(config.min_request_interval));
    let fetcher = LiveFetcher::new(config.render_proxy.clone(), config.browser.clone())?;
    let escalator = Escalator::new(Arc::new(fetcher), limiter).with_timeout(config.fetch_timeout);

    let state = Arc::new(api::AppState {
        scraper: Scraper::new(escalator),
        default_budget: config.default_budget,
    });

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api::routes(state));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
