use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct IndexEntry {
    #[serde(default)]
    source_url: Option<serde_json::Value>,
}

/// Collects the `source_url` of every entry in a JSON index array
///
/// Entries without a string `source_url` are skipped.
pub fn parse_json_index(json: &str) -> Result<Vec<String>, serde_json::Error> {
    let entries: Vec<IndexEntry> = serde_json::from_str(json)?;

    Ok(entries
        .into_iter()
        .filter_map(|entry| match entry.source_url {
            Some(serde_json::Value::String(url)) if !url.trim().is_empty() => Some(url),
            _ => None,
        })
        .collect())
}
