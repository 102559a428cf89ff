use htmd::HtmlToMarkdown;
use scraper::ElementRef;

/// Elements whose content never reaches the markdown
const SKIPPED: &[&str] = &["script", "style", "noscript", "nav", "template", "head"];

/// Attributes holding link targets and image sources
const URL_ATTRIBUTES: &[&str] = &["href", "src"];

/// Converts HTML elements to markdown
///
/// Root-relative link targets and image sources are made absolute against `base_url`
/// before conversion.
pub struct MarkdownConverter {
    base_url: String,
    converter: HtmlToMarkdown,
}

impl MarkdownConverter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            converter: HtmlToMarkdown::builder().skip_tags(SKIPPED.to_vec()).build(),
        }
    }

    /// Converts `element` and cleans the result
    pub fn convert(&self, element: ElementRef<'_>) -> std::io::Result<String> {
        let html = absolutize_html(&element.html(), &self.base_url);
        let markdown = self.converter.convert(&html)?;
        Ok(clean_markdown(&markdown))
    }
}

/// Rewrites `/path` to `<base_url>/path`; anything else is returned unchanged
pub fn absolutize(href: &str, base_url: &str) -> String {
    let href = href.trim();
    if href.starts_with('/') && !href.starts_with("//") {
        format!("{}{}", base_url.trim_end_matches('/'), href)
    } else {
        href.to_string()
    }
}

/// Makes every root-relative `href` and `src` of serialized HTML absolute
///
/// Expects the double-quoted attributes that `scraper` serializes.
pub fn absolutize_html(html: &str, base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    let mut html = html.to_string();

    for attribute in URL_ATTRIBUTES {
        let needle = format!(" {}=\"/", attribute);
        let mut rewritten = String::with_capacity(html.len());
        let mut rest = html.as_str();

        while let Some(pos) = rest.find(&needle) {
            // keep everything up to and including the opening quote
            let (head, tail) = rest.split_at(pos + needle.len() - 1);
            rewritten.push_str(head);
            if !tail.starts_with("//") {
                rewritten.push_str(base_url);
            }
            rest = tail;
        }

        rewritten.push_str(rest);
        html = rewritten;
    }

    html
}

/// Strips trailing whitespace from every line and collapses runs of blank lines
pub fn clean_markdown(markdown: &str) -> String {
    let mut cleaned = Vec::new();
    let mut previous_blank = false;

    for line in markdown.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if !previous_blank {
                cleaned.push("");
            }
            previous_blank = true;
        } else {
            cleaned.push(line);
            previous_blank = false;
        }
    }

    cleaned.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn convert(body: &str) -> String {
        let html = Html::parse_document(&format!("<html><body>{}</body></html>", body));
        let selector = Selector::parse("body").unwrap();
        let element = html.select(&selector).next().unwrap();
        MarkdownConverter::new("https://www.amsterdam.nl")
            .convert(element)
            .unwrap()
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let md = convert("<h1>Wonen</h1><p>Alles over wonen.</p><h2>Huur</h2><p>Sociale huur.</p>");

        assert!(md.starts_with("# Wonen"));
        assert!(md.contains("Alles over wonen."));
        assert!(md.contains("## Huur"));
        assert!(md.ends_with("Sociale huur."));
    }

    #[test]
    fn test_links_are_absolutized() {
        let md = convert(r#"<p>Zie <a href="/subsidies">subsidies</a> en <a href="https://example.org/x">dit</a>.</p>"#);

        assert!(md.contains("[subsidies](https://www.amsterdam.nl/subsidies)"));
        assert!(md.contains("[dit](https://example.org/x)"));
    }

    #[test]
    fn test_absolutize_html() {
        let html = r#"<a href="/a">a</a><img src="/img/b.png"><img src="//cdn.example.org/c.png"><a href="d">d</a>"#;
        assert_eq!(
            absolutize_html(html, "https://www.amsterdam.nl/"),
            r#"<a href="https://www.amsterdam.nl/a">a</a><img src="https://www.amsterdam.nl/img/b.png"><img src="//cdn.example.org/c.png"><a href="d">d</a>"#
        );
    }

    #[test]
    fn test_protocol_relative_link_untouched() {
        assert_eq!(absolutize("//cdn.example.org/a.png", "https://www.amsterdam.nl"), "//cdn.example.org/a.png");
        assert_eq!(absolutize("b.png", "https://www.amsterdam.nl"), "b.png");
        assert_eq!(absolutize("/b.png", "https://www.amsterdam.nl/"), "https://www.amsterdam.nl/b.png");
    }

    #[test]
    fn test_images() {
        let md = convert(r#"<p><img src="/img/kaart.png" alt="Kaart"></p>"#);
        assert!(md.contains("![Kaart](https://www.amsterdam.nl/img/kaart.png)"));
    }

    #[test]
    fn test_lists() {
        let md = convert("<ul><li>Een</li><li>Twee</li></ul><ol><li>A</li><li>B</li></ol>");

        assert!(md
            .lines()
            .any(|line| line.contains("Een") && line.trim_start().starts_with(['*', '-', '+'])));
        assert!(md.lines().any(|line| line.trim_start().starts_with("1.") && line.contains('A')));
        assert!(md.lines().any(|line| line.trim_start().starts_with("2.") && line.contains('B')));
    }

    #[test]
    fn test_skips_scripts_and_nav() {
        let md = convert("<nav><a href='/'>Home</a></nav><script>var x = 1;</script><p>Inhoud</p>");

        assert!(md.contains("Inhoud"));
        assert!(!md.contains("Home"));
        assert!(!md.contains("var x"));
    }

    #[test]
    fn test_clean_markdown() {
        assert_eq!(clean_markdown("a  \n\n\n\nb\n\n"), "a\n\nb");
        assert_eq!(clean_markdown(""), "");
    }
}
