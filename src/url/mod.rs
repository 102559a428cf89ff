//! URL handling module for Civic-Harvest
//!
//! This module provides the crawl target type, canonical on-disk naming,
//! the trailing-slash fallback variant, and domain extraction.

mod canonical;
mod domain;

pub use canonical::{html_file_name, image_file_name, toggle_trailing_slash};
pub use domain::extract_domain;

use crate::{UrlError, UrlResult};
use std::fmt;
use url::Url;

/// A URL scheduled for processing
///
/// The target keeps the URL exactly as it was parsed from its source, so the report
/// key matches what the feed listed. Storage names come from [`html_file_name`],
/// which ignores a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CrawlTarget {
    url: Url,
}

impl CrawlTarget {
    /// Parses a target, accepting only http(s) URLs with a host
    ///
    /// # Examples
    ///
    /// ```
    /// use civic_harvest::url::CrawlTarget;
    ///
    /// let target = CrawlTarget::parse("https://www.amsterdam.nl/subsidies/").unwrap();
    /// assert_eq!(target.as_str(), "https://www.amsterdam.nl/subsidies/");
    /// assert!(CrawlTarget::parse("mailto:info@amsterdam.nl").is_err());
    /// ```
    pub fn parse(input: &str) -> UrlResult<Self> {
        let url = Url::parse(input.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", input, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(url.scheme().to_string()));
        }

        if url.host_str().is_none() {
            return Err(UrlError::MissingHost(input.to_string()));
        }

        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Returns true if the target lives on `site_host`
    pub fn is_on_site(&self, site_host: &str) -> bool {
        self.url
            .host_str()
            .is_some_and(|host| host.eq_ignore_ascii_case(site_host))
    }

    /// Returns true if the URL path contains `filter`
    pub fn path_contains(&self, filter: &str) -> bool {
        self.url.path().contains(filter)
    }
}

impl From<Url> for CrawlTarget {
    fn from(url: Url) -> Self {
        Self { url }
    }
}

impl fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}
