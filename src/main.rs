//! Civic-Harvest main entry point
//!
//! This is the command-line interface for the Civic-Harvest site harvester.

use anyhow::Context;
use civic_harvest::config::{hash_content, load_config_with_hash, validate, Config};
use civic_harvest::crawler::{run_crawl, FetchClient};
use civic_harvest::render::render_directory;
use civic_harvest::sources::resolve_frontier;
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Number of frontier URLs listed by --dry-run
const DRY_RUN_PREVIEW: usize = 20;

/// Civic-Harvest: a single-site municipal web harvester
///
/// Civic-Harvest fetches every page a municipal site lists in its feed, keeps the
/// HTML and images on disk, counts the outbound references of each page, and
/// retries failed pages in bounded rounds. Failed pages and images are written to
/// plain-text lists that the next run picks up again.
#[derive(Parser, Debug)]
#[command(name = "civic-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A single-site municipal web harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply without one)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Only harvest feed URLs whose path contains this substring
    #[arg(long, value_name = "STR")]
    path_filter: Option<String>,

    /// Read the frontier from this sitemap
    #[arg(long, value_name = "URL", conflicts_with = "json_index_url")]
    sitemap_url: Option<String>,

    /// Read the frontier from this JSON index
    #[arg(long, value_name = "URL")]
    json_index_url: Option<String>,

    /// Number of retry rounds for failed pages
    #[arg(long, value_name = "N")]
    max_retries: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without fetching pages
    #[arg(long, conflicts_with = "render")]
    dry_run: bool,

    /// Convert the stored HTML pages to markdown and exit
    #[arg(long, conflicts_with = "dry_run")]
    render: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = load_configuration(&cli)?;
    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration after command-line overrides")?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config).await
    } else if cli.render {
        handle_render(&config).await
    } else {
        handle_crawl(config, &config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("civic_harvest=info,warn"),
            1 => EnvFilter::new("civic_harvest=debug,info"),
            2 => EnvFilter::new("civic_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load_configuration(cli: &Cli) -> anyhow::Result<(Config, String)> {
    match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok((config, hash))
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Ok((Config::default(), hash_content("")))
        }
    }
}

/// Command-line values win over the configuration file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(filter) = &cli.path_filter {
        config.feed.path_filter = Some(filter.clone());
    }
    if let Some(url) = &cli.sitemap_url {
        config.feed.sitemap_url = Some(url.clone());
        config.feed.json_index_url = None;
    }
    if let Some(url) = &cli.json_index_url {
        config.feed.json_index_url = Some(url.clone());
        config.feed.sitemap_url = None;
    }
    if let Some(max_retries) = cli.max_retries {
        config.crawler.max_retries = max_retries;
    }
}

/// Handles the --dry-run mode: validates config and shows what would be harvested
async fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Civic-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Host: {}", config.site.host);
    println!("  Base URL: {}", config.site.base_url);

    let feed = config.feed.primary();
    println!("\nFeed:");
    println!("  Primary: {:?}", feed);
    println!(
        "  Path filter: {}",
        config.feed.path_filter.as_deref().unwrap_or("(none)")
    );
    println!("  Extra URLs: {}", config.feed.extra_urls.len());

    println!("\nCrawler:");
    println!("  Max connections: {}", config.crawler.max_connections);
    println!("  Max retry rounds: {}", config.crawler.max_retries);
    println!(
        "  Timeouts: {}s total, {}s connect",
        config.crawler.request_timeout_secs, config.crawler.connect_timeout_secs
    );
    if let Some(deadline) = config.crawler.run_deadline_secs {
        println!("  Run deadline: {}s", deadline);
    }
    println!("  User agent: {}", config.user_agent.name);

    println!("\nOutput:");
    println!("  HTML: {}", config.output.html_dir.display());
    println!("  Images: {}", config.output.image_dir.display());
    println!("  Report: {}", config.output.report_json.display());

    let fetcher = FetchClient::new(config).context("Failed to build HTTP client")?;
    let frontier = resolve_frontier(config, &fetcher, &CancellationToken::new())
        .await
        .context("Failed to resolve the frontier")?;

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would harvest {} URLs ({} from feed, {} extra, {} previously failed)",
        frontier.len(),
        frontier.from_feed,
        frontier.from_extra,
        frontier.from_failed_list
    );
    for target in frontier.targets().take(DRY_RUN_PREVIEW) {
        println!("    * {}", target);
    }
    if frontier.len() > DRY_RUN_PREVIEW {
        println!("    ... and {} more", frontier.len() - DRY_RUN_PREVIEW);
    }

    Ok(())
}

/// Handles the --render mode: converts the HTML store to markdown
async fn handle_render(config: &Config) -> anyhow::Result<()> {
    let summary = render_directory(
        &config.output.html_dir,
        &config.output.text_dir,
        &config.site.base_url,
    )
    .await
    .context("Rendering failed")?;

    println!(
        "✓ Rendered {} pages to {} ({} without content, {} failed)",
        summary.rendered,
        config.output.text_dir.display(),
        summary.skipped,
        summary.failed
    );
    Ok(())
}

/// Handles the main harvest operation
async fn handle_crawl(config: Config, config_hash: &str) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, finishing up");
                cancel.cancel();
            }
        }
    });

    tracing::info!(
        "Harvesting {} with up to {} connections and {} retry rounds",
        config.site.host,
        config.crawler.max_connections,
        config.crawler.max_retries
    );

    let outcome = run_crawl(config, config_hash, cancel)
        .await
        .context("Harvest failed")?;

    tracing::info!(
        "Harvest completed: {} pages recorded, {} pages failed, {} images failed",
        outcome.report.len(),
        outcome.failed_pages.len(),
        outcome.failed_images.len()
    );

    Ok(())
}
