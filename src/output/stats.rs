//! Run statistics
//!
//! Counters filled in by the coordinator while a run progresses, printed to stdout
//! and rendered into the markdown run summary at the end.

use chrono::{DateTime, Utc};

/// Counters for one harvest run
#[derive(Debug, Clone, PartialEq)]
pub struct RunStatistics {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Hash of the configuration the run used
    pub config_hash: String,

    /// Distinct targets in the frontier
    pub frontier_size: usize,

    /// Targets served from the HTML store without a request
    pub cache_hits: usize,

    /// Targets sent to the fetch pipeline in the main pass
    pub pages_fetched: usize,

    /// Retry rounds that actually ran
    pub retry_rounds: u32,

    /// Targets with a page record in the report
    pub pages_recorded: usize,

    /// Targets still failing at the end of the run
    pub pages_failed: usize,

    pub distinct_images: usize,
    pub images_saved: usize,
    pub images_failed: usize,

    /// Whether the run was cut short by its deadline or an interrupt
    pub cancelled: bool,
}

impl RunStatistics {
    pub fn new(config_hash: impl Into<String>) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            config_hash: config_hash.into(),
            frontier_size: 0,
            cache_hits: 0,
            pages_fetched: 0,
            retry_rounds: 0,
            pages_recorded: 0,
            pages_failed: 0,
            distinct_images: 0,
            images_saved: 0,
            images_failed: 0,
            cancelled: false,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Share of the frontier that ended up in the report, in percent
    pub fn success_rate(&self) -> f64 {
        if self.frontier_size == 0 {
            return 0.0;
        }
        (self.pages_recorded as f64 / self.frontier_size as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Pages:");
    println!("  Frontier: {}", stats.frontier_size);
    println!("  Loaded from HTML store: {}", stats.cache_hits);
    println!("  Fetched: {}", stats.pages_fetched);
    println!("  Retry rounds: {}", stats.retry_rounds);
    println!("  Recorded: {}", stats.pages_recorded);
    println!("  Failed: {}", stats.pages_failed);
    println!();

    println!("Images:");
    println!("  Distinct: {}", stats.distinct_images);
    println!("  Saved: {}", stats.images_saved);
    println!("  Failed: {}", stats.images_failed);
    println!();

    if stats.cancelled {
        println!("Run was cancelled before it completed.");
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages recorded)",
        stats.success_rate(),
        stats.pages_recorded,
        stats.frontier_size
    );
}
