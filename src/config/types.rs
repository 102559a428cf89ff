use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Sitemap used when neither the CLI nor the config names a primary feed
pub const DEFAULT_SITEMAP_URL: &str = "https://www.amsterdam.nl/sitemap.xml";

/// Main configuration structure for Civic-Harvest
///
/// Every section has defaults, so an empty file (or no file) is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// The one site whose pages are persisted
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Host that canonical HTML file names are derived for
    #[serde(default = "default_site_host")]
    pub host: String,

    /// Origin used to absolutize root-relative links when rendering
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            host: default_site_host(),
            base_url: default_base_url(),
        }
    }
}

/// Where the crawl frontier comes from
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedConfig {
    /// Sitemap XML feed (`<loc>` elements)
    #[serde(rename = "sitemap-url", default)]
    pub sitemap_url: Option<String>,

    /// JSON index feed (array of objects with a `source_url` field)
    #[serde(rename = "json-index-url", default)]
    pub json_index_url: Option<String>,

    /// Only keep primary-feed URLs whose path contains this substring
    #[serde(rename = "path-filter", default)]
    pub path_filter: Option<String>,

    /// Extra URLs always added to the frontier
    #[serde(rename = "extra-urls", default)]
    pub extra_urls: Vec<String>,
}

/// Primary feed selected for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryFeed {
    Sitemap(String),
    JsonIndex(String),
}

impl PrimaryFeed {
    pub fn url(&self) -> &str {
        match self {
            Self::Sitemap(url) | Self::JsonIndex(url) => url,
        }
    }
}

impl FeedConfig {
    /// Resolves the primary feed, falling back to the default sitemap
    pub fn primary(&self) -> PrimaryFeed {
        if let Some(url) = &self.json_index_url {
            PrimaryFeed::JsonIndex(url.clone())
        } else {
            PrimaryFeed::Sitemap(
                self.sitemap_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SITEMAP_URL.to_string()),
            )
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Cap on concurrent connections (pages and images alike)
    #[serde(rename = "max-connections", default = "default_max_connections")]
    pub max_connections: u32,

    /// Total request timeout for page fetches
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connect timeout for page fetches
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Total request timeout for image downloads
    #[serde(
        rename = "image-request-timeout-secs",
        default = "default_image_request_timeout"
    )]
    pub image_request_timeout_secs: u64,

    /// Connect timeout for image downloads
    #[serde(
        rename = "image-connect-timeout-secs",
        default = "default_image_connect_timeout"
    )]
    pub image_connect_timeout_secs: u64,

    /// Number of retry rounds over the failure set
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Bodies shorter than this (after trimming) count as minimal content
    #[serde(rename = "min-content-chars", default = "default_min_content")]
    pub min_content_chars: usize,

    /// Accepted pages shorter than this are logged as suspicious
    #[serde(rename = "short-content-chars", default = "default_short_content")]
    pub short_content_chars: usize,

    /// Overall run deadline; in-flight requests are cancelled when it passes
    #[serde(rename = "run-deadline-secs", default)]
    pub run_deadline_secs: Option<u64>,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn image_request_timeout(&self) -> Duration {
        Duration::from_secs(self.image_request_timeout_secs)
    }

    pub fn image_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.image_connect_timeout_secs)
    }

    pub fn run_deadline(&self) -> Option<Duration> {
        self.run_deadline_secs.map(Duration::from_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            image_request_timeout_secs: default_image_request_timeout(),
            image_connect_timeout_secs: default_image_connect_timeout(),
            max_retries: default_max_retries(),
            min_content_chars: default_min_content(),
            short_content_chars: default_short_content(),
            run_deadline_secs: None,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Identifying user agent sent with every request
    #[serde(default = "default_user_agent")]
    pub name: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: default_user_agent(),
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(rename = "html-dir", default = "default_html_dir")]
    pub html_dir: PathBuf,

    #[serde(rename = "image-dir", default = "default_image_dir")]
    pub image_dir: PathBuf,

    /// Destination of rendered markdown files
    #[serde(rename = "text-dir", default = "default_text_dir")]
    pub text_dir: PathBuf,

    #[serde(rename = "failed-html-file", default = "default_failed_html")]
    pub failed_html_file: PathBuf,

    #[serde(rename = "failed-images-file", default = "default_failed_images")]
    pub failed_images_file: PathBuf,

    #[serde(rename = "report-json", default = "default_report_json")]
    pub report_json: PathBuf,

    #[serde(rename = "report-csv", default = "default_report_csv")]
    pub report_csv: PathBuf,

    #[serde(rename = "summary-path", default = "default_summary_path")]
    pub summary_path: PathBuf,
}

impl OutputConfig {
    /// Places every output path under `root`, keeping the default layout
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            html_dir: root.join("html").join("scraped"),
            image_dir: root.join("images").join("scraped"),
            text_dir: root.join("txt").join("scraped"),
            failed_html_file: root.join("html").join("failed_html.txt"),
            failed_images_file: root.join("images").join("failed_images.txt"),
            report_json: root.join("scraped_data_overview.json"),
            report_csv: root.join("scraped_data_overview.csv"),
            summary_path: root.join("crawl_summary.md"),
        }
    }

    /// Creates every directory the run writes into
    pub async fn ensure_directories(&self) -> std::io::Result<()> {
        for dir in [&self.html_dir, &self.image_dir, &self.text_dir] {
            tokio::fs::create_dir_all(dir).await?;
        }
        for file in [
            &self.failed_html_file,
            &self.failed_images_file,
            &self.report_json,
            &self.report_csv,
            &self.summary_path,
        ] {
            if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::rooted_at(DEFAULT_DATA_DIR)
    }
}

const DEFAULT_DATA_DIR: &str = "data";

fn default_site_host() -> String {
    "www.amsterdam.nl".to_string()
}

fn default_base_url() -> String {
    "https://www.amsterdam.nl".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_request_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    15
}

fn default_image_request_timeout() -> u64 {
    30
}

fn default_image_connect_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    10
}

fn default_min_content() -> usize {
    100
}

fn default_short_content() -> usize {
    500
}

fn default_user_agent() -> String {
    "SubsidiemaatjeBot".to_string()
}

fn default_html_dir() -> PathBuf {
    OutputConfig::rooted_at(DEFAULT_DATA_DIR).html_dir
}

fn default_image_dir() -> PathBuf {
    OutputConfig::rooted_at(DEFAULT_DATA_DIR).image_dir
}

fn default_text_dir() -> PathBuf {
    OutputConfig::rooted_at(DEFAULT_DATA_DIR).text_dir
}

fn default_failed_html() -> PathBuf {
    OutputConfig::rooted_at(DEFAULT_DATA_DIR).failed_html_file
}

fn default_failed_images() -> PathBuf {
    OutputConfig::rooted_at(DEFAULT_DATA_DIR).failed_images_file
}

fn default_report_json() -> PathBuf {
    OutputConfig::rooted_at(DEFAULT_DATA_DIR).report_json
}

fn default_report_csv() -> PathBuf {
    OutputConfig::rooted_at(DEFAULT_DATA_DIR).report_csv
}

fn default_summary_path() -> PathBuf {
    OutputConfig::rooted_at(DEFAULT_DATA_DIR).summary_path
}
