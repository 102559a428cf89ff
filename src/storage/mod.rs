//! Storage module for persisting harvested content
//!
//! This module handles everything the harvester keeps on disk:
//! - Accepted HTML pages under their canonical file names
//! - Downloaded images, named by URL basename
//! - The failed-page and failed-image lists that make runs resumable

mod failure_list;
mod html_store;
mod image_store;

pub use failure_list::{read_failure_list, write_failure_list};
pub use html_store::{HtmlSave, HtmlStore};
pub use image_store::{ImageError, ImageStore};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No file name for {0}")]
    NoFileName(String),
}

impl StorageError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
