//! Markdown run summary
//!
//! This module writes a human-readable summary of a harvest run: when it ran,
//! with which configuration, how many pages and images made it, and which
//! pages are left for the next run.

use crate::output::RunStatistics;
use crate::storage::StorageError;
use std::path::Path;

/// Writes the markdown summary of a run to `output_path`
pub async fn write_markdown_summary(
    stats: &RunStatistics,
    failed_pages: &[String],
    output_path: &Path,
) -> crate::Result<()> {
    let markdown = format_markdown_summary(stats, failed_pages);
    tokio::fs::write(output_path, markdown)
        .await
        .map_err(|e| StorageError::write(output_path, e))?;
    Ok(())
}

/// Formats a run summary as markdown
pub fn format_markdown_summary(stats: &RunStatistics, failed_pages: &[String]) -> String {
    let mut md = String::new();

    md.push_str("# Civic-Harvest Run Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", stats.started_at.to_rfc3339()));
    if let Some(finished) = &stats.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = stats.duration_seconds() {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    let status = if stats.cancelled { "cancelled" } else { "completed" };
    md.push_str(&format!("- **Status**: {}\n", status));
    md.push_str(&format!("- **Config Hash**: {}\n\n", stats.config_hash));

    md.push_str("## Pages\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Frontier | {} |\n", stats.frontier_size));
    md.push_str(&format!("| Loaded from HTML store | {} |\n", stats.cache_hits));
    md.push_str(&format!("| Fetched | {} |\n", stats.pages_fetched));
    md.push_str(&format!("| Retry rounds | {} |\n", stats.retry_rounds));
    md.push_str(&format!("| Recorded | {} |\n", stats.pages_recorded));
    md.push_str(&format!("| Failed | {} |\n\n", stats.pages_failed));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        stats.success_rate()
    ));

    md.push_str("## Images\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Distinct | {} |\n", stats.distinct_images));
    md.push_str(&format!("| Saved | {} |\n", stats.images_saved));
    md.push_str(&format!("| Failed | {} |\n\n", stats.images_failed));

    if !failed_pages.is_empty() {
        md.push_str("## Failed Pages\n\n");
        md.push_str("These pages are picked up again by the next run.\n\n");
        for url in failed_pages {
            md.push_str(&format!("- {}\n", url));
        }
        md.push('\n');
    }

    md.push_str("---\n\n");
    md.push_str("*Generated by Civic-Harvest*\n");

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn stats() -> RunStatistics {
        let mut stats = RunStatistics::new("deadbeef");
        stats.frontier_size = 3;
        stats.pages_recorded = 2;
        stats.pages_failed = 1;
        stats.retry_rounds = 3;
        stats.finish();
        stats
    }

    #[test]
    fn test_format_contains_sections() {
        let md = format_markdown_summary(&stats(), &["https://www.amsterdam.nl/c".to_string()]);

        assert!(md.contains("# Civic-Harvest Run Summary"));
        assert!(md.contains("- **Config Hash**: deadbeef"));
        assert!(md.contains("| Recorded | 2 |"));
        assert!(md.contains("| Retry rounds | 3 |"));
        assert!(md.contains("## Failed Pages"));
        assert!(md.contains("- https://www.amsterdam.nl/c"));
        assert!(md.contains("- **Status**: completed"));
    }

    #[test]
    fn test_no_failed_section_when_clean() {
        let md = format_markdown_summary(&stats(), &[]);
        assert!(!md.contains("## Failed Pages"));
    }

    #[tokio::test]
    async fn test_write_summary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("crawl_summary.md");
        write_markdown_summary(&stats(), &[], &path).await.unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("# Civic-Harvest"));
    }
}
