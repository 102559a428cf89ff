use quick_xml::events::Event;
use quick_xml::Reader;

/// Collects the text of every `<loc>` element
///
/// Works for plain sitemaps and sitemap indexes alike, with or without the sitemap
/// namespace prefix.
pub fn parse_sitemap(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut locations = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"loc" => {
                current = Some(String::new());
            }
            Event::Text(text) => {
                if let Some(loc) = current.as_mut() {
                    loc.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(loc) = current.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"loc" => {
                if let Some(loc) = current.take() {
                    let loc = loc.trim();
                    if !loc.is_empty() {
                        locations.push(loc.to_string());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(locations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <url><loc>https://www.amsterdam.nl/wonen/</loc><lastmod>2024-01-01</lastmod></url>
                <url><loc> https://www.amsterdam.nl/subsidies </loc></url>
            </urlset>"#;

        assert_eq!(
            parse_sitemap(xml).unwrap(),
            vec!["https://www.amsterdam.nl/wonen/", "https://www.amsterdam.nl/subsidies"]
        );
    }

    #[test]
    fn test_parse_prefixed_and_escaped() {
        let xml = r#"<sm:urlset xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">
                <sm:url><sm:loc>https://www.amsterdam.nl/zoek?a=1&amp;b=2</sm:loc></sm:url>
            </sm:urlset>"#;

        assert_eq!(
            parse_sitemap(xml).unwrap(),
            vec!["https://www.amsterdam.nl/zoek?a=1&b=2"]
        );
    }

    #[test]
    fn test_parse_sitemap_index() {
        let xml = r#"<sitemapindex>
                <sitemap><loc>https://www.amsterdam.nl/sitemap-1.xml</loc></sitemap>
            </sitemapindex>"#;

        assert_eq!(parse_sitemap(xml).unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_xml() {
        assert!(parse_sitemap("<urlset><url><loc>x</url></urlset>").is_err());
    }

    #[test]
    fn test_empty_loc_skipped() {
        assert!(parse_sitemap("<urlset><url><loc></loc></url></urlset>").unwrap().is_empty());
    }
}
