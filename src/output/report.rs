use crate::storage::StorageError;
use crate::url::CrawlTarget;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// References and images extracted from one accepted page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Referenced domain -> number of references to it
    pub domains: BTreeMap<String, u32>,

    /// Referenced URL -> number of anchors pointing at it
    pub reference_urls: BTreeMap<String, u32>,

    /// Image sources in document order, duplicates kept
    pub images: Vec<String>,
}

/// All page records of a run, keyed by the URL as the frontier listed it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    pages: BTreeMap<String, PageRecord>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `record` for `target`, replacing an earlier record
    pub fn insert(&mut self, target: &CrawlTarget, record: PageRecord) {
        self.pages.insert(target.as_str().to_string(), record);
    }

    pub fn get(&self, url: &str) -> Option<&PageRecord> {
        self.pages.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.pages.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> impl Iterator<Item = (&str, &PageRecord)> {
        self.pages.iter().map(|(url, record)| (url.as_str(), record))
    }

    /// Distinct image URLs across all pages
    pub fn image_urls(&self) -> BTreeSet<String> {
        self.pages
            .values()
            .flat_map(|record| record.images.iter().cloned())
            .collect()
    }

    /// Writes the report as pretty-printed JSON
    pub async fn write_json(&self, path: &Path) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| StorageError::write(path, e))?;
        Ok(())
    }
}
