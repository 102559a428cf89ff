//! Configuration module for Civic-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All sections are optional; missing keys fall back to the defaults for
//! `www.amsterdam.nl`.
//!
//! # Example
//!
//! ```no_run
//! use civic_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Retry rounds: {}", config.crawler.max_retries);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FeedConfig, OutputConfig, PrimaryFeed, SiteConfig, UserAgentConfig,
    DEFAULT_SITEMAP_URL,
};

// Re-export parser functions
pub use parser::{compute_config_hash, hash_content, load_config, load_config_with_hash};
pub use validation::validate;
