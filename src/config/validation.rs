use crate::config::types::{Config, CrawlerConfig, FeedConfig, OutputConfig, SiteConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_feed_config(&config.feed)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent(&config.user_agent.name)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the site section
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_host(&config.host)?;

    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;
    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    Ok(())
}

/// Validates feed URLs and their mutual exclusion
fn validate_feed_config(config: &FeedConfig) -> Result<(), ConfigError> {
    if config.sitemap_url.is_some() && config.json_index_url.is_some() {
        return Err(ConfigError::Validation(
            "sitemap-url and json-index-url are mutually exclusive".to_string(),
        ));
    }

    for url in config.sitemap_url.iter().chain(config.json_index_url.iter()) {
        validate_http_url(url)?;
    }

    if let Some(filter) = &config.path_filter {
        if filter.is_empty() {
            return Err(ConfigError::Validation(
                "path-filter cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_connections < 1 || config.max_connections > 100 {
        return Err(ConfigError::Validation(format!(
            "max-connections must be between 1 and 100, got {}",
            config.max_connections
        )));
    }

    if config.max_retries > 100 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 100, got {}",
            config.max_retries
        )));
    }

    for (name, value) in [
        ("request-timeout-secs", config.request_timeout_secs),
        ("connect-timeout-secs", config.connect_timeout_secs),
        ("image-request-timeout-secs", config.image_request_timeout_secs),
        ("image-connect-timeout-secs", config.image_connect_timeout_secs),
    ] {
        if value == 0 {
            return Err(ConfigError::Validation(format!("{} must be > 0", name)));
        }
    }

    if config.run_deadline_secs == Some(0) {
        return Err(ConfigError::Validation(
            "run-deadline-secs must be > 0 when set".to_string(),
        ));
    }

    if config.min_content_chars > config.short_content_chars {
        return Err(ConfigError::Validation(format!(
            "min-content-chars ({}) cannot exceed short-content-chars ({})",
            config.min_content_chars, config.short_content_chars
        )));
    }

    Ok(())
}

/// Validates the user agent string: non-empty, printable ASCII
fn validate_user_agent(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent name cannot be empty".to_string(),
        ));
    }

    if !name.chars().all(|c| c.is_ascii_graphic() || c == ' ') {
        return Err(ConfigError::Validation(format!(
            "user-agent name must be printable ASCII, got '{}'",
            name
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, path) in [
        ("html-dir", &config.html_dir),
        ("image-dir", &config.image_dir),
        ("text-dir", &config.text_dir),
        ("failed-html-file", &config.failed_html_file),
        ("failed-images-file", &config.failed_images_file),
        ("report-json", &config.report_json),
        ("report-csv", &config.report_csv),
        ("summary-path", &config.summary_path),
    ] {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

fn validate_http_url(url: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid feed URL '{}': {}", url, e)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Feed URL '{}' must use http or https",
            url
        )));
    }

    Ok(())
}

/// Validates a host name (no scheme, no path)
fn validate_host(host: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::Validation("site host cannot be empty".to_string()));
    }

    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "Host '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.')
        || host.ends_with('.')
        || host.starts_with('-')
        || host.ends_with('-')
    {
        return Err(ConfigError::Validation(format!(
            "Host '{}' cannot start or end with '.' or '-'",
            host
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::Validation(format!(
            "Host '{}' cannot contain consecutive dots",
            host
        )));
    }

    Ok(())
}
