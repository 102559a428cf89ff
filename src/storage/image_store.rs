use crate::crawler::{FetchClient, FetchError};
use crate::url::image_file_name;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Why an image could not be saved
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image URL {0} has no file name")]
    NoFileName(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to write image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Directory of downloaded images, named by URL basename
///
/// Remembers which URLs it saved during this run, so a URL is downloaded at most once.
/// Two URLs sharing a basename share a file: the first download wins.
#[derive(Debug)]
pub struct ImageStore {
    dir: PathBuf,
    saved: Mutex<HashMap<String, String>>,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            saved: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Saves the image at `url`, returning its local file name
    ///
    /// No request is made when the URL was already saved this run or when a file
    /// with its name already exists.
    pub async fn save_image(
        &self,
        fetcher: &FetchClient,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<String, ImageError> {
        if let Some(name) = self.memoized(url) {
            return Ok(name);
        }

        let name = image_file_name(url).ok_or_else(|| ImageError::NoFileName(url.to_string()))?;
        let path = self.dir.join(&name);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!("Image {} already on disk as {}", url, name);
            self.remember(url, &name);
            return Ok(name);
        }

        let bytes = fetcher.fetch_image(url, cancel).await?;
        write_new(&path, &bytes).await?;

        tracing::debug!("Saved image {} ({} bytes) as {}", url, bytes.len(), name);
        self.remember(url, &name);
        Ok(name)
    }

    fn memoized(&self, url: &Url) -> Option<String> {
        self.saved.lock().ok()?.get(url.as_str()).cloned()
    }

    fn remember(&self, url: &Url, name: &str) {
        if let Ok(mut saved) = self.saved.lock() {
            saved.insert(url.to_string(), name.to_string());
        }
    }
}

/// Writes `bytes` unless the file appeared in the meantime
async fn write_new(path: &Path, bytes: &[u8]) -> Result<(), ImageError> {
    let io_error = |source| ImageError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = match tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(()),
        Err(e) => return Err(io_error(e)),
    };

    file.write_all(bytes).await.map_err(io_error)?;
    file.flush().await.map_err(io_error)
}
