//! Per-target processing
//!
//! A target is either fetched (fetch, classify, store, extract) or, when its page is
//! already in the HTML store, reloaded from disk (load, classify, extract). Both paths
//! end in a [`PageRecord`] or a [`PageFailure`]; failures never escape the task.

use crate::crawler::{extract_page, FetchError, FetchOutcome, Rejection, RunContext, Verdict};
use crate::output::PageRecord;
use crate::storage::{HtmlSave, StorageError};
use crate::url::CrawlTarget;
use thiserror::Error;

/// Why a target produced no page record
#[derive(Debug, Error)]
pub enum PageFailure {
    #[error(transparent)]
    Transport(FetchError),

    #[error("only minimal content: {0}")]
    MinimalContent(FetchError),

    #[error("error page: {0}")]
    ErrorPage(Rejection),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("cancelled")]
    Cancelled,
}

/// What a per-target task hands back to the coordinator
#[derive(Debug)]
pub struct TargetResult {
    pub target: CrawlTarget,
    pub outcome: Result<PageRecord, PageFailure>,
}

/// Fetches `target` and turns the accepted page into a record
pub async fn process_fresh(ctx: &RunContext, target: &CrawlTarget) -> Result<PageRecord, PageFailure> {
    if ctx.is_cancelled() {
        return Err(PageFailure::Cancelled);
    }

    let content = match ctx.fetcher.fetch(target, &ctx.cancel).await {
        FetchOutcome::Success { content, final_url } => {
            if final_url != *target.url() {
                tracing::debug!("{} answered as {}", target, final_url);
            }
            content
        }
        FetchOutcome::TransportFailure { cause } if cause.is_cancelled() => {
            return Err(PageFailure::Cancelled)
        }
        FetchOutcome::TransportFailure { cause } => return Err(PageFailure::Transport(cause)),
        FetchOutcome::MinimalContent { cause } => return Err(PageFailure::MinimalContent(cause)),
    };

    // stored and keyed under the original target, whichever variant answered
    match ctx.html.save_html(target, &content, &ctx.classifier).await? {
        HtmlSave::Rejected(rejection) => return Err(PageFailure::ErrorPage(rejection)),
        HtmlSave::Saved(_) | HtmlSave::OffSite => {}
    }

    Ok(extract_page(&content, target.url()))
}

/// Rebuilds the record of a target whose page is already in the HTML store
pub async fn process_cached(ctx: &RunContext, target: &CrawlTarget) -> Result<PageRecord, PageFailure> {
    let content = ctx.html.load_html(target).await?;

    if let Verdict::Rejected(rejection) = ctx.classifier.classify(&content, target) {
        tracing::info!("Stored page for {} is an error page: {}", target, rejection);
        return Err(PageFailure::ErrorPage(rejection));
    }

    Ok(extract_page(&content, target.url()))
}
