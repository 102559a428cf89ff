use url::Url;

/// Extracts the lowercase host a reference points at
///
/// Reference counts are grouped by this value, both when a page is extracted and
/// when the report is flattened, so both sides must go through this function.
///
/// # Examples
///
/// ```
/// use civic_harvest::url::extract_domain;
///
/// assert_eq!(extract_domain("https://Example.org/a"), Some("example.org".to_string()));
/// assert_eq!(extract_domain("not a url"), None);
/// ```
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}
