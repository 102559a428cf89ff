//! Markdown rendering of the HTML store
//!
//! Every stored page is reduced to its main content, converted to markdown, and
//! written to the text directory with its DCTERMS metadata as YAML front matter.

mod markdown;
mod metadata;

pub use markdown::{absolutize, absolutize_html, clean_markdown, MarkdownConverter};
pub use metadata::PageMetadata;

use crate::storage::StorageError;
use indicatif::ProgressBar;
use scraper::{ElementRef, Html, Selector};
use std::path::{Path, PathBuf};

/// Tried in order; the first match is the page's main content
pub const MAIN_CONTENT_SELECTORS: &[&str] = &[
    "div.content",
    "div.main-content",
    "article",
    "#main",
    ".article",
];

/// A page ready to be written as markdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub metadata: PageMetadata,
    pub body: String,
}

impl RenderedPage {
    pub fn to_markdown(&self) -> String {
        format!("{}\n{}\n", self.metadata.front_matter(), self.body)
    }
}

/// Counts of one rendering pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub rendered: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Renders one stored page; `None` when nothing readable is left
pub fn render_page(html: &str, converter: &MarkdownConverter) -> Option<RenderedPage> {
    let document = Html::parse_document(html);
    let metadata = PageMetadata::from_document(&document);
    let main = main_content(&document)?;

    let body = match converter.convert(main) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("Markdown conversion failed: {}", e);
            return None;
        }
    };
    if body.is_empty() {
        return None;
    }

    Some(RenderedPage { metadata, body })
}

fn main_content(document: &Html) -> Option<ElementRef<'_>> {
    for selector in MAIN_CONTENT_SELECTORS {
        let Ok(parsed) = Selector::parse(selector) else {
            continue;
        };
        if let Some(element) = document.select(&parsed).next() {
            return Some(element);
        }
    }

    tracing::debug!("No main content selector matched, using body");
    let body = Selector::parse("body").ok()?;
    document.select(&body).next()
}

/// Output path of the markdown file for a stored page
pub fn text_path(html_file: &Path, text_dir: &Path) -> Option<PathBuf> {
    let stem = html_file.file_stem()?;
    let mut name = stem.to_os_string();
    name.push(".md");
    Some(text_dir.join(name))
}

/// Renders every `.html` file of `html_dir` into `text_dir`
pub async fn render_directory(
    html_dir: &Path,
    text_dir: &Path,
    base_url: &str,
) -> crate::Result<RenderSummary> {
    tokio::fs::create_dir_all(text_dir)
        .await
        .map_err(|e| StorageError::write(text_dir, e))?;

    let mut entries = tokio::fs::read_dir(html_dir)
        .await
        .map_err(|e| StorageError::read(html_dir, e))?;
    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StorageError::read(html_dir, e))?
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "html") {
            files.push(path);
        }
    }
    files.sort();

    tracing::info!("Rendering {} stored pages to {}", files.len(), text_dir.display());
    let converter = MarkdownConverter::new(base_url);
    let progress = ProgressBar::new(files.len() as u64);
    let mut summary = RenderSummary::default();

    for file in &files {
        progress.inc(1);

        let html = match tokio::fs::read_to_string(file).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", file.display(), e);
                summary.failed += 1;
                continue;
            }
        };

        let Some(page) = render_page(&html, &converter) else {
            tracing::warn!("No content extracted from {}", file.display());
            summary.skipped += 1;
            continue;
        };

        let Some(target) = text_path(file, text_dir) else {
            summary.failed += 1;
            continue;
        };

        match tokio::fs::write(&target, page.to_markdown()).await {
            Ok(()) => summary.rendered += 1,
            Err(e) => {
                tracing::warn!("Failed to write {}: {}", target.display(), e);
                summary.failed += 1;
            }
        }
    }

    progress.finish_and_clear();
    tracing::info!(
        "Rendered {} pages ({} without content, {} failed)",
        summary.rendered,
        summary.skipped,
        summary.failed
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PAGE: &str = r#"<html><head>
        <meta name="DCTERMS.identifier" content="https://www.amsterdam.nl/wonen/">
        <meta name="DCTERMS.title" content="Wonen">
        </head><body>
        <nav><a href="/">Home</a></nav>
        <div class="content"><h1>Wonen</h1><p>Lees <a href="/wonen/huur">meer</a>.</p></div>
        <footer>Gemeente Amsterdam</footer>
        </body></html>"#;

    fn converter() -> MarkdownConverter {
        MarkdownConverter::new("https://www.amsterdam.nl/")
    }

    #[test]
    fn test_render_uses_main_content() {
        let page = render_page(PAGE, &converter()).unwrap();

        assert_eq!(page.metadata.page_title.as_deref(), Some("Wonen"));
        assert!(page.body.starts_with("# Wonen"));
        assert!(page.body.contains("[meer](https://www.amsterdam.nl/wonen/huur)"));
        assert!(!page.body.contains("Home"));
        assert!(!page.body.contains("Gemeente Amsterdam"));
    }

    #[test]
    fn test_falls_back_to_body() {
        let page = render_page("<html><body><p>Alleen body</p></body></html>", &converter()).unwrap();
        assert_eq!(page.body, "Alleen body");
    }

    #[test]
    fn test_empty_page_skipped() {
        assert!(render_page("<html><body><script>x()</script></body></html>", &converter()).is_none());
    }

    #[test]
    fn test_to_markdown_layout() {
        let page = render_page(PAGE, &converter()).unwrap();
        let markdown = page.to_markdown();

        assert!(markdown.starts_with(
            "---\npage_source: \"https://www.amsterdam.nl/wonen/\"\npage_title: \"Wonen\"\n---\n\n# Wonen"
        ));
        assert!(markdown.ends_with(".\n"));
    }

    #[tokio::test]
    async fn test_render_directory() {
        let html_dir = TempDir::new().unwrap();
        let text_dir = TempDir::new().unwrap();
        std::fs::write(html_dir.path().join("wonen.html"), PAGE).unwrap();
        std::fs::write(html_dir.path().join("leeg.html"), "<html><body></body></html>").unwrap();
        std::fs::write(html_dir.path().join("notes.txt"), "x").unwrap();

        let summary =
            render_directory(html_dir.path(), text_dir.path(), "https://www.amsterdam.nl")
                .await
                .unwrap();

        assert_eq!(summary, RenderSummary { rendered: 1, skipped: 1, failed: 0 });
        let written = std::fs::read_to_string(text_dir.path().join("wonen.md")).unwrap();
        assert!(written.contains("# Wonen"));
    }

    #[test]
    fn test_text_path() {
        assert_eq!(
            text_path(Path::new("/data/html/subsidies_kunst.html"), Path::new("/data/txt")),
            Some(PathBuf::from("/data/txt/subsidies_kunst.md"))
        );
    }
}
