use scraper::{Html, Selector};

/// DCTERMS metadata of a stored page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub page_source: Option<String>,
    pub page_title: Option<String>,
    pub page_modified: Option<String>,
    pub page_available: Option<String>,
}

impl PageMetadata {
    /// Reads the `DCTERMS.*` meta tags of a document
    pub fn from_document(document: &Html) -> Self {
        Self {
            page_source: meta_content(document, "DCTERMS.identifier"),
            page_title: meta_content(document, "DCTERMS.title"),
            page_modified: meta_content(document, "DCTERMS.modified"),
            page_available: meta_content(document, "DCTERMS.available"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields().all(|(_, value)| value.is_none())
    }

    fn fields(&self) -> impl Iterator<Item = (&'static str, Option<&str>)> {
        [
            ("page_source", self.page_source.as_deref()),
            ("page_title", self.page_title.as_deref()),
            ("page_modified", self.page_modified.as_deref()),
            ("page_available", self.page_available.as_deref()),
        ]
        .into_iter()
    }

    /// YAML front matter block with the keys that are present
    pub fn front_matter(&self) -> String {
        let mut block = String::from("---\n");
        for (key, value) in self.fields() {
            if let Some(value) = value {
                block.push_str(&format!("{}: \"{}\"\n", key, escape_yaml(value)));
            }
        }
        block.push_str("---\n");
        block
    }
}

fn meta_content(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!("meta[name=\"{}\"]", name)).ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| element.value().attr("content").unwrap_or("").trim().to_string())
}

fn escape_yaml(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_dcterms() {
        let html = Html::parse_document(
            r#"<html><head>
                <meta name="DCTERMS.identifier" content=" https://www.amsterdam.nl/wonen/ ">
                <meta name="DCTERMS.title" content="Wonen">
                <meta name="DCTERMS.modified" content="2024-03-01">
                <meta name="description" content="ignored">
            </head><body></body></html>"#,
        );

        let metadata = PageMetadata::from_document(&html);
        assert_eq!(metadata.page_source.as_deref(), Some("https://www.amsterdam.nl/wonen/"));
        assert_eq!(metadata.page_title.as_deref(), Some("Wonen"));
        assert_eq!(metadata.page_modified.as_deref(), Some("2024-03-01"));
        assert_eq!(metadata.page_available, None);
    }

    #[test]
    fn test_front_matter_only_present_keys() {
        let metadata = PageMetadata {
            page_title: Some("Subsidie \"Kunst\"".to_string()),
            ..Default::default()
        };

        assert_eq!(
            metadata.front_matter(),
            "---\npage_title: \"Subsidie \\\"Kunst\\\"\"\n---\n"
        );
    }

    #[test]
    fn test_empty_metadata() {
        let metadata = PageMetadata::from_document(&Html::parse_document("<p>x</p>"));
        assert!(metadata.is_empty());
        assert_eq!(metadata.front_matter(), "---\n---\n");
    }
}
