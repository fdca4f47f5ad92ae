//! Headless Chrome tier.
//!
//! Runs on a blocking thread. The browser process is owned by a session guard
//! that closes the tab and kills the process when it leaves scope, on success,
//! error and panic alike.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use headless_chrome::browser::tab::{RequestInterceptor, RequestPausedDecision};
use headless_chrome::browser::transport::{SessionId, Transport};
use headless_chrome::protocol::cdp::Fetch::events::RequestPausedEvent;
use headless_chrome::protocol::cdp::Fetch::{FailRequest, RequestPattern};
use headless_chrome::protocol::cdp::Network::ErrorReason;
use headless_chrome::{Browser, LaunchOptions, Tab};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{pick_user_agent, RawResponse};
use crate::error::ScrapeError;
use crate::extract::COMPUTED_STYLE_ATTR;

/// Sub-resources that only cost latency for a style snapshot.
const BLOCKED_RESOURCES: &[&str] = &["Image", "Font", "Stylesheet", "Media"];

/// Stamps every element with the computed properties extraction reads, then
/// serializes the document together with the navigation status.
const STAMP_SCRIPT: &str = r#"
(() => {
    const props = ['color', 'background-color', 'font-family', 'font-size', 'font-weight',
                   'padding', 'border-radius', 'max-width', 'gap'];
    const nodes = document.querySelectorAll('body, body *');
    const limit = Math.min(nodes.length, 5000);
    for (let i = 0; i < limit; i++) {
        const el = nodes[i];
        const cs = window.getComputedStyle(el);
        el.setAttribute('__ATTR__', props.map(p => p + ':' + cs.getPropertyValue(p)).join(';'));
    }
    const nav = performance.getEntriesByType('navigation')[0];
    return JSON.stringify({
        status: (nav && nav.responseStatus) || 200,
        url: location.href,
        html: document.documentElement.outerHTML,
    });
})();
"#;

#[derive(Debug, Clone, Default)]
pub struct BrowserSettings {
    /// Explicit binary; otherwise the usual install locations are searched.
    pub chrome_path: Option<PathBuf>,
}

impl BrowserSettings {
    /// Locate the browser binary or fail with a configuration error.
    pub fn executable(&self) -> Result<PathBuf, ScrapeError> {
        if let Some(path) = &self.chrome_path {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(ScrapeError::Config(format!(
                "CHROME_PATH {} does not exist",
                path.display()
            )));
        }
        headless_chrome::browser::default_executable()
            .map_err(|e| ScrapeError::Config(format!("no browser binary found: {e}")))
    }
}

#[derive(Deserialize)]
struct Snapshot {
    status: u16,
    url: String,
    html: String,
}

/// Owns the browser for one navigation.
struct Session {
    tab: Arc<Tab>,
    _browser: Browser,
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(false) {
            debug!("tab close failed during teardown: {e}");
        }
    }
}

pub async fn render(url: &Url, settings: BrowserSettings, timeout: Duration) -> Result<RawResponse> {
    let url = url.to_string();
    tokio::task::spawn_blocking(move || render_blocking(&url, &settings, timeout)).await?
}

fn render_blocking(url: &str, settings: &BrowserSettings, timeout: Duration) -> Result<RawResponse> {
    let session = launch(settings, timeout)?;
    let tab = &session.tab;

    block_subresources(tab)?;
    tab.set_default_timeout(timeout);
    tab.navigate_to(url)?;
    if let Err(e) = tab.wait_for_element_with_custom_timeout("body", timeout) {
        warn!("body wait timed out: {e}; snapshotting anyway");
    }

    let script = STAMP_SCRIPT.replace("__ATTR__", COMPUTED_STYLE_ATTR);
    let raw = tab
        .evaluate(&script, false)?
        .value
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(|| anyhow!("style snapshot returned no value"))?;
    let snapshot: Snapshot = serde_json::from_str(&raw)?;
    debug!(status = snapshot.status, bytes = snapshot.html.len(), "headless snapshot taken");

    Ok(RawResponse {
        status: snapshot.status,
        body: snapshot.html,
        final_url: Some(snapshot.url),
        computed_styles: true,
    })
}

fn launch(settings: &BrowserSettings, timeout: Duration) -> Result<Session> {
    let ua_arg = format!("--user-agent={}", pick_user_agent());
    let args = vec![
        OsStr::new("--disable-blink-features=AutomationControlled"),
        OsStr::new("--no-sandbox"),
        OsStr::new("--disable-dev-shm-usage"),
        OsStr::new(&ua_arg),
    ];

    let browser = Browser::new(LaunchOptions {
        headless: true,
        window_size: Some((1440, 900)),
        path: Some(settings.executable()?),
        idle_browser_timeout: timeout + Duration::from_secs(5),
        args,
        ..Default::default()
    })?;
    let tab = browser.new_tab()?;
    Ok(Session {
        tab,
        _browser: browser,
    })
}

fn block_subresources(tab: &Arc<Tab>) -> Result<()> {
    let patterns = BLOCKED_RESOURCES
        .iter()
        .map(|kind| {
            serde_json::from_value::<RequestPattern>(serde_json::json!({
                "resourceType": kind,
                "requestStage": "Request",
            }))
        })
        .collect::<Result<Vec<_>, _>>()?;
    tab.enable_fetch(Some(&patterns), None)?;

    // Only blocked resource types are paused, so every pause is a refusal.
    let interceptor: Arc<dyn RequestInterceptor + Send + Sync> = Arc::new(
        |_transport: Arc<Transport>, _session: SessionId, event: RequestPausedEvent| {
            RequestPausedDecision::Fail(FailRequest {
                request_id: event.params.request_id,
                error_reason: ErrorReason::BlockedByClient,
            })
        },
    );
    tab.enable_request_interception(interceptor)?;
    Ok(())
}
