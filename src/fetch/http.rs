use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use super::browser::{self, BrowserSettings};
use super::{pick_user_agent, RawResponse, Tier, TierFetcher};
use crate::error::ScrapeError;

pub const DEFAULT_RENDER_ENDPOINT: &str = "https://app.scrapingbee.com/api/v1/";

/// Remote rendering/proxy service used by the middle tiers.
#[derive(Debug, Clone)]
pub struct RenderProxy {
    pub endpoint: String,
    pub api_key: String,
}

impl RenderProxy {
    /// Service URL for `target` at `tier`.
    pub fn request_url(&self, tier: Tier, target: &Url) -> String {
        let render_js = tier == Tier::JsRender;
        let premium = matches!(tier, Tier::PremiumProxy | Tier::JsRender);
        let mut url = format!(
            "{}?api_key={}&url={}&render_js={}",
            self.endpoint,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(target.as_str()),
            render_js
        );
        if premium {
            url.push_str("&premium_proxy=true");
        }
        url
    }
}

/// Production fetcher: reqwest for the HTTP tiers, headless Chrome for the last.
#[derive(Debug, Clone)]
pub struct LiveFetcher {
    client: reqwest::Client,
    proxy: Option<RenderProxy>,
    browser: BrowserSettings,
}

impl LiveFetcher {
    pub fn new(proxy: Option<RenderProxy>, browser: BrowserSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        let proxy = proxy.filter(|p| !p.api_key.trim().is_empty());
        Ok(Self {
            client,
            proxy,
            browser,
        })
    }

    async fn plain(&self, url: &Url, timeout: Duration) -> Result<RawResponse> {
        let resp = self
            .client
            .get(url.clone())
            .header(reqwest::header::USER_AGENT, pick_user_agent())
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .timeout(timeout)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let body = resp.text().await?;
        debug!(status, bytes = body.len(), %final_url, "plain fetch read");
        Ok(RawResponse {
            status,
            body,
            final_url: Some(final_url),
            computed_styles: false,
        })
    }

    async fn rendered(&self, tier: Tier, url: &Url, timeout: Duration) -> Result<RawResponse> {
        let proxy = self
            .proxy
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("render proxy is not configured"))?;
        let resp = self
            .client
            .get(proxy.request_url(tier, url))
            .timeout(timeout)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        debug!(%tier, status, bytes = body.len(), "render proxy read");
        // The proxy's own URL is not a valid base for the page's assets.
        Ok(RawResponse {
            status,
            body,
            final_url: None,
            computed_styles: false,
        })
    }
}

#[async_trait]
impl TierFetcher for LiveFetcher {
    async fn fetch(&self, tier: Tier, url: &Url, timeout: Duration) -> Result<RawResponse> {
        match tier {
            Tier::Plain => self.plain(url, timeout).await,
            Tier::StaticRender | Tier::PremiumProxy | Tier::JsRender => {
                self.rendered(tier, url, timeout).await
            }
            Tier::Headless => browser::render(url, self.browser.clone(), timeout).await,
        }
    }

    fn preflight(&self, tiers: &[Tier]) -> Result<(), ScrapeError> {
        if tiers.iter().any(Tier::uses_render_proxy) && self.proxy.is_none() {
            return Err(ScrapeError::Config(
                "RENDER_PROXY_API_KEY is required for render-proxy tiers".into(),
            ));
        }
        if tiers.contains(&Tier::Headless) {
            self.browser.executable()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(proxy: Option<RenderProxy>) -> LiveFetcher {
        LiveFetcher::new(proxy, BrowserSettings::default()).unwrap()
    }

    #[test]
    fn proxy_url_flags_follow_tier() {
        let proxy = RenderProxy {
            endpoint: "https://render.test/api".into(),
            api_key: "k".into(),
        };
        let target = Url::parse("https://example.com/a?b=c").unwrap();

        let url = proxy.request_url(Tier::StaticRender, &target);
        assert!(url.contains("url=https%3A%2F%2Fexample.com%2Fa%3Fb%3Dc"));
        assert!(url.contains("render_js=false"));
        assert!(!url.contains("premium_proxy"));

        assert!(proxy.request_url(Tier::PremiumProxy, &target).contains("premium_proxy=true"));
        let js = proxy.request_url(Tier::JsRender, &target);
        assert!(js.contains("render_js=true") && js.contains("premium_proxy=true"));
    }

    #[test]
    fn proxy_tiers_need_a_key() {
        let err = fetcher(None).preflight(&[Tier::Plain, Tier::StaticRender]).unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));

        let blank = RenderProxy {
            endpoint: DEFAULT_RENDER_ENDPOINT.into(),
            api_key: "  ".into(),
        };
        assert!(fetcher(Some(blank)).preflight(&[Tier::JsRender]).is_err());
        assert!(fetcher(None).preflight(&[Tier::Plain]).is_ok());
    }

    #[tokio::test]
    async fn plain_tier_reports_status_and_final_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/down", server.uri())).unwrap();
        let resp = fetcher(None)
            .fetch(Tier::Plain, &url, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(resp.status, 503);
        assert_eq!(resp.body, "maintenance");
        assert_eq!(resp.final_url.as_deref(), Some(url.as_str()));
        assert!(!resp.computed_styles);
    }

    #[tokio::test]
    async fn render_tier_calls_the_proxy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .and(query_param("api_key", "secret"))
            .and(query_param("url", "https://example.com/"))
            .and(query_param("render_js", "true"))
            .and(query_param("premium_proxy", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>rendered</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let proxy = RenderProxy {
            endpoint: format!("{}/api", server.uri()),
            api_key: "secret".into(),
        };
        let target = Url::parse("https://example.com/").unwrap();
        let resp = fetcher(Some(proxy))
            .fetch(Tier::JsRender, &target, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, "<html>rendered</html>");
        assert_eq!(resp.final_url, None);
    }
}
