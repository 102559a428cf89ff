//! URL source resolution
//!
//! Builds the frontier of a run from:
//! - the primary feed (a sitemap or a JSON index, never both)
//! - the static list of extra URLs in the configuration
//! - the failed-page list left behind by the previous run
//!
//! Only a failing primary feed aborts the run. Unusable URLs are logged and dropped.

mod json_index;
mod sitemap;

pub use json_index::parse_json_index;
pub use sitemap::parse_sitemap;

use crate::config::{Config, PrimaryFeed};
use crate::crawler::{FetchClient, FetchError};
use crate::storage::read_failure_list;
use crate::url::CrawlTarget;
use crate::HarvestError;
use std::collections::BTreeSet;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Why the primary feed could not be used
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Failed to fetch feed {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("Failed to parse feed {url}: {message}")]
    Parse { url: String, message: String },
}

impl From<FeedError> for HarvestError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::Fetch { url, source } => HarvestError::Feed {
                url,
                message: source.to_string(),
            },
            FeedError::Parse { url, message } => HarvestError::FeedParse { url, message },
        }
    }
}

/// The de-duplicated set of targets for a run
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    targets: BTreeSet<CrawlTarget>,

    /// URLs the primary feed listed after filtering
    pub from_feed: usize,

    /// URLs taken from the configured extra list
    pub from_extra: usize,

    /// URLs carried over from the previous run's failed list
    pub from_failed_list: usize,
}

impl Frontier {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn targets(&self) -> impl Iterator<Item = &CrawlTarget> {
        self.targets.iter()
    }

    pub fn into_targets(self) -> Vec<CrawlTarget> {
        self.targets.into_iter().collect()
    }

    /// Adds `urls`, returning how many parsed; unparseable URLs are logged and skipped
    fn extend<I, S>(&mut self, urls: I, origin: &str) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for url in urls {
            match CrawlTarget::parse(url.as_ref()) {
                Ok(target) => {
                    self.targets.insert(target);
                    added += 1;
                }
                Err(e) => tracing::warn!("Skipping {} URL '{}': {}", origin, url.as_ref(), e),
            }
        }
        added
    }
}

/// Fetches and parses the primary feed
pub async fn fetch_primary_feed(
    feed: &PrimaryFeed,
    fetcher: &FetchClient,
    cancel: &CancellationToken,
) -> Result<Vec<String>, FeedError> {
    let url = feed.url();
    let parse_error = |message: String| FeedError::Parse {
        url: url.to_string(),
        message,
    };

    let parsed = Url::parse(url).map_err(|e| parse_error(e.to_string()))?;
    let body = fetcher
        .fetch_text(&parsed, cancel)
        .await
        .map_err(|source| FeedError::Fetch {
            url: url.to_string(),
            source,
        })?;

    match feed {
        PrimaryFeed::Sitemap(_) => parse_sitemap(&body).map_err(|e| parse_error(e.to_string())),
        PrimaryFeed::JsonIndex(_) => parse_json_index(&body).map_err(|e| parse_error(e.to_string())),
    }
}

/// Keeps the URLs whose path contains `filter`; URLs that do not parse are kept for
/// the frontier to reject with a warning
fn apply_path_filter(urls: Vec<String>, filter: Option<&str>) -> Vec<String> {
    let Some(filter) = filter else {
        return urls;
    };

    urls.into_iter()
        .filter(|url| match CrawlTarget::parse(url) {
            Ok(target) => target.path_contains(filter),
            Err(_) => true,
        })
        .collect()
}

/// Resolves the frontier of a run
pub async fn resolve_frontier(
    config: &Config,
    fetcher: &FetchClient,
    cancel: &CancellationToken,
) -> crate::Result<Frontier> {
    let feed = config.feed.primary();
    tracing::info!("Reading primary feed {}", feed.url());

    let listed = fetch_primary_feed(&feed, fetcher, cancel).await?;
    let listed_count = listed.len();
    let filtered = apply_path_filter(listed, config.feed.path_filter.as_deref());
    if let Some(filter) = &config.feed.path_filter {
        tracing::info!(
            "Path filter '{}' kept {} of {} feed URLs",
            filter,
            filtered.len(),
            listed_count
        );
    }

    let mut frontier = Frontier::default();
    frontier.from_feed = frontier.extend(&filtered, "feed");
    frontier.from_extra = frontier.extend(&config.feed.extra_urls, "extra");

    let previously_failed = read_failure_list(&config.output.failed_html_file).await?;
    frontier.from_failed_list = frontier.extend(&previously_failed, "previously failed");

    tracing::info!(
        "Frontier has {} URLs ({} from feed, {} extra, {} previously failed)",
        frontier.len(),
        frontier.from_feed,
        frontier.from_extra,
        frontier.from_failed_list
    );

    Ok(frontier)
}
