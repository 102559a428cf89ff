//! Harvest coordinator - main run orchestration logic
//!
//! This module contains the run loop that coordinates every phase of a harvest:
//! - Resolving the frontier and splitting it into cached and fresh targets
//! - Running each batch as a task group with a join barrier
//! - Merging every result into the report and the retry state in one place
//! - Retry rounds, then the image phase
//! - Writing the report, failure lists, and run summary

use crate::config::Config;
use crate::crawler::pipeline::{process_cached, process_fresh, TargetResult};
use crate::crawler::{RetryCoordinator, RunContext};
use crate::output::{print_statistics, write_csv, write_markdown_summary, Report, RunStatistics};
use crate::sources::resolve_frontier;
use crate::storage::{write_failure_list, ImageError};
use crate::url::CrawlTarget;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;
use tokio::task::{Id, JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use url::Url;

/// How a batch obtains page content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchMode {
    /// Reprocess pages already in the HTML store
    Cached,
    /// Fetch, store and extract
    Fresh,
}

/// Per-batch result counts
#[derive(Debug, Default, Clone, Copy)]
struct BatchTally {
    succeeded: usize,
    failed: usize,
}

/// A task group that remembers which key each task was spawned for
///
/// A task that panics still reports its key, so its target can be recorded as failed.
struct TrackedTasks<K, T> {
    tasks: JoinSet<T>,
    keys: HashMap<Id, K>,
}

impl<K, T: Send + 'static> TrackedTasks<K, T> {
    fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            keys: HashMap::new(),
        }
    }

    fn spawn<F>(&mut self, key: K, task: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let handle = self.tasks.spawn(task);
        self.keys.insert(handle.id(), key);
    }

    /// Waits for the next task; `None` once the group is drained
    async fn join_next(&mut self) -> Option<Result<T, (Option<K>, JoinError)>> {
        let joined = self.tasks.join_next_with_id().await?;
        Some(match joined {
            Ok((id, value)) => {
                self.keys.remove(&id);
                Ok(value)
            }
            Err(error) => Err((self.keys.remove(&error.id()), error)),
        })
    }
}

/// Everything a finished run produced
#[derive(Debug)]
pub struct RunOutcome {
    pub report: Report,
    pub failed_pages: Vec<String>,
    pub failed_images: Vec<String>,
    pub statistics: RunStatistics,
}

/// Main harvest coordinator structure
pub struct Coordinator {
    ctx: Arc<RunContext>,
    statistics: RunStatistics,
}

impl Coordinator {
    /// Creates a coordinator for one run
    ///
    /// `cancel` is cancelled by the caller on interrupt and by the coordinator
    /// itself when the configured run deadline passes.
    pub fn new(config: Config, config_hash: &str, cancel: CancellationToken) -> crate::Result<Self> {
        let ctx = RunContext::new(Arc::new(config), cancel)?;
        Ok(Self {
            ctx: Arc::new(ctx),
            statistics: RunStatistics::new(config_hash),
        })
    }

    pub fn context(&self) -> &Arc<RunContext> {
        &self.ctx
    }

    /// Runs the harvest to completion (or cancellation) and writes every artifact
    pub async fn run(mut self) -> crate::Result<RunOutcome> {
        let deadline = self.spawn_deadline();
        let outcome = self.run_phases().await;
        if let Some(handle) = deadline {
            handle.abort();
        }
        outcome
    }

    async fn run_phases(&mut self) -> crate::Result<RunOutcome> {
        let config = Arc::clone(&self.ctx.config);
        config.output.ensure_directories().await?;

        let frontier = resolve_frontier(&config, &self.ctx.fetcher, &self.ctx.cancel).await?;
        self.statistics.frontier_size = frontier.len();

        let existing = self.ctx.html.existing_names().await?;
        let (cached, fresh): (Vec<CrawlTarget>, Vec<CrawlTarget>) = frontier
            .into_targets()
            .into_iter()
            .partition(|target| self.ctx.html.contains(target, &existing));

        tracing::info!(
            "{} pages already stored, {} to fetch",
            cached.len(),
            fresh.len()
        );
        self.statistics.cache_hits = cached.len();
        self.statistics.pages_fetched = fresh.len();

        let mut report = Report::new();
        let mut retry = RetryCoordinator::new(config.crawler.max_retries);

        self.run_batch(cached, BatchMode::Cached, "Processing stored pages", &mut report, &mut retry)
            .await;
        self.run_batch(fresh, BatchMode::Fresh, "Fetching new pages", &mut report, &mut retry)
            .await;

        while let Some(batch) = retry.next_round(self.ctx.is_cancelled()) {
            let label = format!("Retrying failed pages ({}/{})", retry.round(), retry.max_retries());
            let tally = self
                .run_batch(batch, BatchMode::Fresh, &label, &mut report, &mut retry)
                .await;
            tracing::info!(
                "Retry round {}: {} recovered, {} still failing",
                retry.round(),
                tally.succeeded,
                tally.failed
            );
        }
        self.statistics.retry_rounds = retry.round();

        if self.ctx.is_cancelled() {
            tracing::warn!("Run cancelled, remaining failures are kept for the next run");
            self.statistics.cancelled = true;
        }

        let failed_pages: Vec<String> = retry
            .finish()
            .into_iter()
            .map(|target| target.to_string())
            .collect();

        let failed_images = self.run_image_phase(&report).await;

        self.statistics.pages_recorded = report.len();
        self.statistics.pages_failed = failed_pages.len();
        self.statistics.images_failed = failed_images.len();
        self.statistics.finish();

        self.write_artifacts(&report, &failed_pages, &failed_images).await?;
        print_statistics(&self.statistics);

        Ok(RunOutcome {
            report,
            failed_pages,
            failed_images,
            statistics: self.statistics.clone(),
        })
    }

    /// Runs one batch to completion, merging results as they arrive
    ///
    /// Returns only after every task of the batch has finished.
    async fn run_batch(
        &self,
        targets: Vec<CrawlTarget>,
        mode: BatchMode,
        label: &str,
        report: &mut Report,
        retry: &mut RetryCoordinator,
    ) -> BatchTally {
        let mut tally = BatchTally::default();
        if targets.is_empty() {
            return tally;
        }

        let progress = progress_bar(targets.len(), label);
        let mut tasks = TrackedTasks::new();

        for target in targets {
            let ctx = Arc::clone(&self.ctx);
            tasks.spawn(target.clone(), async move {
                let outcome = match mode {
                    BatchMode::Cached => process_cached(&ctx, &target).await,
                    BatchMode::Fresh => process_fresh(&ctx, &target).await,
                };
                TargetResult { target, outcome }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            progress.inc(1);
            let result = match joined {
                Ok(result) => result,
                Err((target, e)) => {
                    tracing::error!("Page task failed to complete: {}", e);
                    if let Some(target) = target {
                        retry.record_failure(target);
                    }
                    tally.failed += 1;
                    continue;
                }
            };

            match result.outcome {
                Ok(record) => {
                    retry.record_success(&result.target);
                    report.insert(&result.target, record);
                    tally.succeeded += 1;
                }
                Err(failure) => {
                    tracing::warn!("Failed to process {}: {}", result.target, failure);
                    retry.record_failure(result.target);
                    tally.failed += 1;
                }
            }
        }

        progress.finish_with_message(format!(
            "{} ok, {} failed",
            tally.succeeded, tally.failed
        ));
        tally
    }

    /// Downloads every distinct image of the report, returning the URLs that failed
    async fn run_image_phase(&mut self, report: &Report) -> Vec<String> {
        let image_urls = report.image_urls();
        self.statistics.distinct_images = image_urls.len();
        if image_urls.is_empty() {
            return Vec::new();
        }

        tracing::info!("Saving {} distinct images", image_urls.len());
        let progress = progress_bar(image_urls.len(), "Saving images");
        let mut failed = BTreeSet::new();
        let mut tasks = TrackedTasks::new();

        for raw in image_urls {
            let url = match Url::parse(&raw) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!("Failed to download image {}: {}", raw, e);
                    failed.insert(raw);
                    progress.inc(1);
                    continue;
                }
            };

            let ctx = Arc::clone(&self.ctx);
            tasks.spawn(raw.clone(), async move {
                let result = ctx.images.save_image(&ctx.fetcher, &url, &ctx.cancel).await;
                (raw, result)
            });
        }

        let mut saved = 0;
        while let Some(joined) = tasks.join_next().await {
            progress.inc(1);
            match joined {
                Ok((_, Ok(_))) => saved += 1,
                Ok((raw, Err(e))) => {
                    log_image_failure(&raw, &e);
                    failed.insert(raw);
                }
                Err((raw, e)) => {
                    tracing::error!("Image task failed to complete: {}", e);
                    if let Some(raw) = raw {
                        failed.insert(raw);
                    }
                }
            }
        }

        progress.finish_with_message(format!("{} saved, {} failed", saved, failed.len()));
        self.statistics.images_saved = saved;
        failed.into_iter().collect()
    }

    async fn write_artifacts(
        &self,
        report: &Report,
        failed_pages: &[String],
        failed_images: &[String],
    ) -> crate::Result<()> {
        let output = &self.ctx.config.output;

        report.write_json(&output.report_json).await?;
        tracing::info!("Report saved to {}", output.report_json.display());

        let rows = write_csv(report, &output.report_csv).await?;
        tracing::info!("{} rows saved to {}", rows, output.report_csv.display());

        write_failure_list(&output.failed_html_file, failed_pages).await?;
        write_failure_list(&output.failed_images_file, failed_images).await?;
        tracing::info!(
            "{} failed pages and {} failed images recorded",
            failed_pages.len(),
            failed_images.len()
        );

        write_markdown_summary(&self.statistics, failed_pages, &output.summary_path).await?;
        Ok(())
    }

    fn spawn_deadline(&self) -> Option<JoinHandle<()>> {
        let deadline = self.ctx.config.crawler.run_deadline()?;
        let cancel = self.ctx.cancel.clone();

        Some(tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(deadline) => {
                    tracing::warn!("Run deadline of {:?} reached, cancelling", deadline);
                    cancel.cancel();
                }
                _ = cancel.cancelled() => {}
            }
        }))
    }
}

fn log_image_failure(url: &str, error: &ImageError) {
    match error {
        ImageError::Fetch(fetch) if fetch.is_cancelled() => {
            tracing::debug!("Image download {} cancelled", url)
        }
        _ => tracing::warn!("Failed to download image {}: {}", url, error),
    }
}

fn progress_bar(len: usize, label: &str) -> ProgressBar {
    let progress = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
    {
        progress.set_style(style.progress_chars("##-"));
    }
    progress.set_message(label.to_string());
    progress
}

/// Runs a complete harvest
pub async fn run_crawl(
    config: Config,
    config_hash: &str,
    cancel: CancellationToken,
) -> crate::Result<RunOutcome> {
    Coordinator::new(config, config_hash, cancel)?.run().await
}
