use crate::crawler::{Classifier, Rejection, Verdict};
use crate::storage::{StorageError, StorageResult};
use crate::url::{html_file_name, CrawlTarget};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// What `save_html` did with a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlSave {
    /// Written (or overwritten) at this path
    Saved(PathBuf),
    /// Accepted, but the target is not on the site so nothing is written
    OffSite,
    /// Error page; nothing is written
    Rejected(Rejection),
}

impl HtmlSave {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// Directory of accepted pages, one file per canonical name
#[derive(Debug, Clone)]
pub struct HtmlStore {
    dir: PathBuf,
    site_host: String,
}

impl HtmlStore {
    pub fn new(dir: impl Into<PathBuf>, site_host: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            site_host: site_host.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn site_host(&self) -> &str {
        &self.site_host
    }

    /// Canonical file name for `target`, `None` when it is off-site
    pub fn file_name(&self, target: &CrawlTarget) -> Option<String> {
        html_file_name(target, &self.site_host)
    }

    pub fn path_for(&self, target: &CrawlTarget) -> Option<PathBuf> {
        self.file_name(target).map(|name| self.dir.join(name))
    }

    /// Names of the `.html` files already in the store
    ///
    /// A missing directory is an empty store.
    pub async fn existing_names(&self) -> StorageResult<HashSet<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(StorageError::read(&self.dir, e)),
        };

        let mut names = HashSet::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::read(&self.dir, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".html") {
                names.insert(name);
            }
        }
        Ok(names)
    }

    /// Returns true if a page for `target` is already on disk
    pub fn contains(&self, target: &CrawlTarget, existing: &HashSet<String>) -> bool {
        self.file_name(target)
            .is_some_and(|name| existing.contains(&name))
    }

    /// Classifies `content` and writes it under the canonical name of `target`
    ///
    /// Error pages are never written. Off-site targets are accepted without a write.
    /// An existing file with the same canonical name is overwritten.
    pub async fn save_html(
        &self,
        target: &CrawlTarget,
        content: &str,
        classifier: &Classifier,
    ) -> StorageResult<HtmlSave> {
        if let Verdict::Rejected(rejection) = classifier.classify(content, target) {
            tracing::info!("Detected error page at {}: {}", target, rejection);
            return Ok(HtmlSave::Rejected(rejection));
        }

        let Some(path) = self.path_for(target) else {
            tracing::debug!("{} is not on {}, not saving", target, self.site_host);
            return Ok(HtmlSave::OffSite);
        };

        tokio::fs::write(&path, content)
            .await
            .map_err(|e| StorageError::write(&path, e))?;

        tracing::debug!(
            "Saved HTML for {} ({} chars) to {}",
            target,
            content.chars().count(),
            path.display()
        );

        Ok(HtmlSave::Saved(path))
    }

    /// Reads the stored page for `target`
    pub async fn load_html(&self, target: &CrawlTarget) -> StorageResult<String> {
        let path = self
            .path_for(target)
            .ok_or_else(|| StorageError::NoFileName(target.to_string()))?;

        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| StorageError::read(&path, e))
    }
}
