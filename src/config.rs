use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ScrapeError;
use crate::fetch::{BrowserSettings, RenderProxy, Tier, DEFAULT_RENDER_ENDPOINT};

/// Runtime settings, read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub render_proxy: Option<RenderProxy>,
    pub browser: BrowserSettings,
    pub fetch_timeout: Duration,
    pub min_request_interval: Duration,
    pub default_budget: Tier,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            render_proxy: None,
            browser: BrowserSettings::default(),
            fetch_timeout: Duration::from_secs(15),
            min_request_interval: Duration::from_millis(1000),
            default_budget: Tier::Plain,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ScrapeError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset and blank values take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ScrapeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let render_proxy = get("RENDER_PROXY_API_KEY").map(|api_key| RenderProxy {
            endpoint: get("RENDER_PROXY_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_RENDER_ENDPOINT.to_string()),
            api_key,
        });

        Ok(Self {
            port: parse_or(get("PORT"), "PORT", defaults.port)?,
            render_proxy,
            browser: BrowserSettings {
                chrome_path: get("CHROME_PATH").map(PathBuf::from),
            },
            fetch_timeout: Duration::from_secs(parse_or(
                get("FETCH_TIMEOUT_SECS"),
                "FETCH_TIMEOUT_SECS",
                defaults.fetch_timeout.as_secs(),
            )?),
            min_request_interval: Duration::from_millis(parse_or(
                get("MIN_REQUEST_INTERVAL_MS"),
                "MIN_REQUEST_INTERVAL_MS",
                defaults.min_request_interval.as_millis() as u64,
            )?),
            default_budget: match get("DEFAULT_FETCH_BUDGET") {
                Some(raw) => raw
                    .parse::<Tier>()
                    .map_err(|_| ScrapeError::Config(format!("DEFAULT_FETCH_BUDGET '{raw}' is not a tier")))?,
                None => defaults.default_budget,
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, ScrapeError> {
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|_| ScrapeError::Config(format!("{key} has invalid value '{raw}'"))),
        None => Ok(default),
    }
}
