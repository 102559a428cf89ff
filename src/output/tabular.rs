use crate::output::Report;
use crate::storage::StorageError;
use crate::url::extract_domain;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One (page, domain, reference) row of the flattened report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabularRow {
    #[serde(rename = "Page URL")]
    pub page_url: String,

    #[serde(rename = "Domain")]
    pub domain: String,

    #[serde(rename = "Reference URL")]
    pub reference_url: String,

    #[serde(rename = "Domain Count")]
    pub domain_count: u32,

    #[serde(rename = "URL Count")]
    pub url_count: u32,
}

/// Flattens the report into one row per referenced URL
///
/// Rows are grouped by domain and sorted by reference URL inside each group.
pub fn flatten_report(report: &Report) -> Vec<TabularRow> {
    let mut rows = Vec::new();

    for (page_url, record) in report.pages() {
        let mut by_domain: BTreeMap<String, Vec<(&str, u32)>> = BTreeMap::new();
        for (reference, count) in &record.reference_urls {
            let domain = extract_domain(reference).unwrap_or_default();
            by_domain
                .entry(domain)
                .or_default()
                .push((reference.as_str(), *count));
        }

        for (domain, mut references) in by_domain {
            references.sort();
            let domain_count = record.domains.get(&domain).copied().unwrap_or(0);
            for (reference, count) in references {
                rows.push(TabularRow {
                    page_url: page_url.to_string(),
                    domain: domain.clone(),
                    reference_url: reference.to_string(),
                    domain_count,
                    url_count: count,
                });
            }
        }
    }

    rows
}

const HEADERS: [&str; 5] = ["Page URL", "Domain", "Reference URL", "Domain Count", "URL Count"];

/// Writes the flattened report as CSV with a header row
pub async fn write_csv(report: &Report, path: &Path) -> crate::Result<usize> {
    // header written by hand so an empty report still gets one
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(HEADERS)?;

    let rows = flatten_report(report);
    for row in &rows {
        writer.serialize(row)?;
    }
    let content = writer
        .into_inner()
        .map_err(|e| StorageError::write(path, e.into_error()))?;

    tokio::fs::write(path, content)
        .await
        .map_err(|e| StorageError::write(path, e))?;

    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::PageRecord;
    use crate::url::CrawlTarget;
    use tempfile::TempDir;

    fn report() -> Report {
        let mut record = PageRecord::default();
        for (url, count) in [
            ("https://example.org/z", 1),
            ("https://example.org/a", 2),
            ("https://other.org/b", 1),
        ] {
            record.reference_urls.insert(url.to_string(), count);
        }
        record.domains.insert("example.org".to_string(), 3);
        record.domains.insert("other.org".to_string(), 1);

        let mut report = Report::new();
        report.insert(
            &CrawlTarget::parse("https://www.amsterdam.nl/wonen").unwrap(),
            record,
        );
        report
    }

    #[test]
    fn test_rows_grouped_and_sorted() {
        let rows = flatten_report(&report());

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].reference_url, "https://example.org/a");
        assert_eq!(rows[0].domain_count, 3);
        assert_eq!(rows[0].url_count, 2);
        assert_eq!(rows[1].reference_url, "https://example.org/z");
        assert_eq!(rows[2].domain, "other.org");
        assert_eq!(rows[2].domain_count, 1);
        assert!(rows.iter().all(|r| r.page_url == "https://www.amsterdam.nl/wonen"));
    }

    #[tokio::test]
    async fn test_csv_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("overview.csv");

        let written = write_csv(&report(), &path).await.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();

        assert_eq!(written, 3);
        assert_eq!(
            lines.next(),
            Some("Page URL,Domain,Reference URL,Domain Count,URL Count")
        );
        assert_eq!(
            lines.next(),
            Some("https://www.amsterdam.nl/wonen,example.org,https://example.org/a,3,2")
        );
    }

    #[tokio::test]
    async fn test_empty_report_writes_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("overview.csv");

        assert_eq!(write_csv(&Report::new(), &path).await.unwrap(), 0);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Page URL,Domain,Reference URL,Domain Count,URL Count\n"
        );
    }
}
