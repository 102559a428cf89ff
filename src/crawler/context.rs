use crate::config::Config;
use crate::crawler::{Classifier, FetchClient};
use crate::storage::{HtmlStore, ImageStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything a per-target task needs, built once per run
///
/// Read-only after construction; tasks share it through an `Arc`.
#[derive(Debug)]
pub struct RunContext {
    pub config: Arc<Config>,
    pub fetcher: FetchClient,
    pub classifier: Classifier,
    pub html: HtmlStore,
    pub images: ImageStore,
    pub cancel: CancellationToken,
}

impl RunContext {
    pub fn new(config: Arc<Config>, cancel: CancellationToken) -> crate::Result<Self> {
        let fetcher = FetchClient::new(&config)?;
        let classifier = Classifier::new(config.crawler.short_content_chars);
        let html = HtmlStore::new(&config.output.html_dir, config.site.host.as_str());
        let images = ImageStore::new(&config.output.image_dir);

        Ok(Self {
            config,
            fetcher,
            classifier,
            html,
            images,
            cancel,
        })
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
