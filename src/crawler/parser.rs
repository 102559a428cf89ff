//! HTML parser for extracting references and images
//!
//! This module turns an accepted page into its [`PageRecord`]:
//! - Outbound references (absolute `http://` / `https://` anchors), counted per URL
//! - The same references counted per target domain
//! - Embedded image sources, in document order

use crate::output::PageRecord;
use crate::url::extract_domain;
use scraper::{Html, Selector};
use url::Url;

/// Extracts references and images from accepted HTML
///
/// # Extraction Rules
///
/// **References:**
/// - `<a href="...">` whose href starts with `http://` or `https://`
/// - resolved against `base_url`, multiplicity preserved
/// - relative, `mailto:`, `tel:` and fragment links are not references
///
/// **Images:**
/// - every `<img src="...">`, resolved against `base_url`
/// - duplicates kept; downloading happens in a later phase
///
/// # Example
///
/// ```
/// use civic_harvest::crawler::extract_page;
/// use url::Url;
///
/// let html = r#"<a href="https://example.org/a">a</a><img src="/logo.png">"#;
/// let base = Url::parse("https://www.amsterdam.nl/wonen").unwrap();
/// let record = extract_page(html, &base);
/// assert_eq!(record.domains.get("example.org"), Some(&1));
/// assert_eq!(record.images, vec!["https://www.amsterdam.nl/logo.png"]);
/// ```
pub fn extract_page(html: &str, base_url: &Url) -> PageRecord {
    let document = Html::parse_document(html);
    let mut record = PageRecord::default();

    for reference in extract_references(&document, base_url) {
        if let Some(domain) = extract_domain(&reference) {
            *record.domains.entry(domain).or_insert(0) += 1;
        }
        *record.reference_urls.entry(reference).or_insert(0) += 1;
    }

    record.images = extract_images(&document, base_url);
    record
}

fn extract_references(document: &Html, base_url: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter(|href| href.starts_with("http://") || href.starts_with("https://"))
        .filter_map(|href| resolve(href, base_url))
        .collect()
}

fn extract_images(document: &Html, base_url: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse("img[src]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("src"))
        .filter_map(|src| resolve(src, base_url))
        .collect()
}

fn resolve(href: &str, base_url: &Url) -> Option<String> {
    match base_url.join(href.trim()) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            tracing::debug!("Skipping unresolvable link '{}' on {}: {}", href, base_url, e);
            None
        }
    }
}
