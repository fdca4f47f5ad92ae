//! Fetches a third-party page, escalating through progressively costlier
//! fetch tiers, and distills it into a design token summary.

pub mod config;
pub mod css;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod limiter;
pub mod pipeline;
pub mod resolve;

pub use error::ScrapeError;
pub use extract::StyleTokenSet;
pub use fetch::{FetchRequest, Tier};
pub use pipeline::{ScrapeOutcome, Scraper};
