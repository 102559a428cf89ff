//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the page and image clients with browser-like header profiles
//! - Capping concurrent connections across every request kind
//! - Trying a target and its trailing-slash variant as a fallback pair
//! - Racing each request against the run's cancellation token

use crate::config::Config;
use crate::url::{toggle_trailing_slash, CrawlTarget};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Why a single request produced no usable body
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Minimal content from {url} ({length} chars)")]
    MinimalContent { url: String, length: usize },

    #[error("Request to {url} cancelled")]
    Cancelled { url: String },
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Result of fetching a target (and possibly its slash variant)
#[derive(Debug)]
pub enum FetchOutcome {
    /// A variant answered with enough content
    Success {
        /// Page body
        content: String,
        /// The variant that produced the content
        final_url: Url,
    },

    /// Every variant failed; `cause` is the last error seen
    TransportFailure { cause: FetchError },

    /// Every variant answered, the last one with less than the minimal content
    MinimalContent { cause: FetchError },
}

impl FetchOutcome {
    fn from_last_error(cause: FetchError) -> Self {
        match cause {
            FetchError::MinimalContent { .. } => Self::MinimalContent { cause },
            cause => Self::TransportFailure { cause },
        }
    }
}

const PAGE_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";
const IMAGE_ACCEPT: &str = "image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9,nl;q=0.8";

fn page_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(PAGE_ACCEPT));
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE));
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(HeaderName::from_static("sec-fetch-dest"), HeaderValue::from_static("document"));
    headers.insert(HeaderName::from_static("sec-fetch-mode"), HeaderValue::from_static("navigate"));
    headers.insert(HeaderName::from_static("sec-fetch-site"), HeaderValue::from_static("none"));
    headers.insert(HeaderName::from_static("sec-fetch-user"), HeaderValue::from_static("?1"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers
}

fn image_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(IMAGE_ACCEPT));
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE));
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers.insert(HeaderName::from_static("sec-fetch-dest"), HeaderValue::from_static("image"));
    headers.insert(HeaderName::from_static("sec-fetch-mode"), HeaderValue::from_static("no-cors"));
    headers.insert(HeaderName::from_static("sec-fetch-site"), HeaderValue::from_static("same-origin"));
    headers
}

/// Builds the page client: identifying user agent, document headers, page timeouts
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.name.as_str())
        .default_headers(page_headers())
        .timeout(config.crawler.request_timeout())
        .connect_timeout(config.crawler.connect_timeout())
        .pool_max_idle_per_host(config.crawler.max_connections as usize)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Builds the lighter image client: image headers, image timeouts
pub fn build_image_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.name.as_str())
        .default_headers(image_headers())
        .timeout(config.crawler.image_request_timeout())
        .connect_timeout(config.crawler.image_connect_timeout())
        .pool_max_idle_per_host(config.crawler.max_connections as usize)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page and image client sharing one connection cap
#[derive(Debug, Clone)]
pub struct FetchClient {
    pages: Client,
    images: Client,
    permits: Arc<Semaphore>,
    min_content_chars: usize,
}

impl FetchClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            pages: build_http_client(config)?,
            images: build_image_client(config)?,
            permits: Arc::new(Semaphore::new(config.crawler.max_connections as usize)),
            min_content_chars: config.crawler.min_content_chars,
        })
    }

    /// Number of requests that may start right now
    pub fn available_connections(&self) -> usize {
        self.permits.available_permits()
    }

    /// Fetches a target, falling back to its trailing-slash variant
    ///
    /// # Fallback Rules
    ///
    /// | First attempt | Action |
    /// |---------------|--------|
    /// | 2xx, enough content | Success |
    /// | 2xx, minimal content | try the variant |
    /// | non-2xx / transport error | try the variant |
    /// | cancelled | TransportFailure, no variant |
    ///
    /// Root paths have no variant. When the variant fails too, the last error wins.
    pub async fn fetch(&self, target: &CrawlTarget, cancel: &CancellationToken) -> FetchOutcome {
        let primary = target.url().clone();

        let last_error = match self.fetch_candidate(&primary, cancel).await {
            Ok(content) => {
                return FetchOutcome::Success {
                    content,
                    final_url: primary,
                }
            }
            Err(e) if e.is_cancelled() => return FetchOutcome::TransportFailure { cause: e },
            Err(e) => e,
        };

        let Some(variant) = toggle_trailing_slash(&primary) else {
            return FetchOutcome::from_last_error(last_error);
        };

        tracing::debug!(
            "Fetch of {} failed ({}), trying {}",
            primary,
            last_error,
            variant
        );

        match self.fetch_candidate(&variant, cancel).await {
            Ok(content) => FetchOutcome::Success {
                content,
                final_url: variant,
            },
            Err(e) => FetchOutcome::from_last_error(e),
        }
    }

    /// Fetches a feed document; no fallback, no content threshold
    pub async fn fetch_text(&self, url: &Url, cancel: &CancellationToken) -> Result<String, FetchError> {
        self.guarded(url, cancel, self.get_text(&self.pages, url))
            .await
    }

    /// Downloads image bytes with the image header profile
    pub async fn fetch_image(&self, url: &Url, cancel: &CancellationToken) -> Result<Vec<u8>, FetchError> {
        let request = async {
            let response = self.send(&self.images, url).await?;
            let bytes = response.bytes().await.map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;
            Ok(bytes.to_vec())
        };
        self.guarded(url, cancel, request).await
    }

    async fn fetch_candidate(&self, url: &Url, cancel: &CancellationToken) -> Result<String, FetchError> {
        tracing::debug!("Attempting to fetch {}", url);
        let content = self.guarded(url, cancel, self.get_text(&self.pages, url)).await?;

        let length = content.trim().chars().count();
        tracing::debug!("Got {} chars of content from {}", length, url);

        if length < self.min_content_chars {
            return Err(FetchError::MinimalContent {
                url: url.to_string(),
                length,
            });
        }

        Ok(content)
    }

    async fn get_text(&self, client: &Client, url: &Url) -> Result<String, FetchError> {
        let response = self.send(client, url).await?;
        response.text().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })
    }

    async fn send(&self, client: &Client, url: &Url) -> Result<reqwest::Response, FetchError> {
        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        tracing::debug!("Got response {} for {}", status, url);

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    /// Runs `request` under a connection permit, abandoning it on cancellation
    async fn guarded<T, F>(&self, url: &Url, cancel: &CancellationToken, request: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        let cancelled = || FetchError::Cancelled {
            url: url.to_string(),
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(cancelled()),
            result = async {
                let _permit = self.permits.acquire().await.map_err(|_| cancelled())?;
                request.await
            } => result,
        }
    }
}
