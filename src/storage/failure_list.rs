use crate::storage::{StorageError, StorageResult};
use std::path::Path;

/// Reads a one-URL-per-line failure list
///
/// A missing file is an empty list. Blank lines are skipped.
pub async fn read_failure_list(path: &Path) -> StorageResult<Vec<String>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::read(path, e)),
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Replaces the failure list at `path` with `urls`
///
/// The file is always written, empty when there are no failures, so the next run
/// never picks up a stale list.
pub async fn write_failure_list<S: AsRef<str>>(path: &Path, urls: &[S]) -> StorageResult<()> {
    let mut content = String::new();
    for url in urls {
        content.push_str(url.as_ref());
        content.push('\n');
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|e| StorageError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let urls = read_failure_list(&dir.path().join("failed_html.txt")).await.unwrap();
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn test_blank_lines_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("failed_html.txt");
        std::fs::write(&path, "https://www.amsterdam.nl/a\n\n  \nhttps://www.amsterdam.nl/b  \n").unwrap();

        let urls = read_failure_list(&path).await.unwrap();
        assert_eq!(urls, vec!["https://www.amsterdam.nl/a", "https://www.amsterdam.nl/b"]);
    }

    #[tokio::test]
    async fn test_write_replaces_previous_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("failed_html.txt");
        write_failure_list(&path, &["https://www.amsterdam.nl/a", "https://www.amsterdam.nl/b"]).await.unwrap();
        write_failure_list(&path, &["https://www.amsterdam.nl/c"]).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "https://www.amsterdam.nl/c\n");
    }

    #[tokio::test]
    async fn test_write_empty_list_creates_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("failed_images.txt");
        write_failure_list::<String>(&path, &[]).await.unwrap();

        assert!(path.exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
