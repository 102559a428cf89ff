//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! harvest cycle end-to-end against a temporary data directory.

use civic_harvest::config::{Config, OutputConfig};
use civic_harvest::crawler::run_crawl;
use civic_harvest::HarvestError;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A page long enough to pass the content threshold, free of error phrases
fn page(title: &str, body: &str) -> String {
    format!(
        r#"<html><head><title>{}</title></head><body>
        <p>De gemeente Amsterdam informeert bewoners en ondernemers over regelingen in de stad.</p>
        {}
        </body></html>"#,
        title, body
    )
}

fn sitemap(base: &str, paths: &[&str]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#,
    );
    for p in paths {
        xml.push_str(&format!("<url><loc>{}{}</loc></url>", base, p));
    }
    xml.push_str("</urlset>");
    xml
}

async fn mount_sitemap(server: &MockServer, paths: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap(&server.uri(), paths)))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, at: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Creates a test configuration rooted in `dir`, reading the sitemap of `server`
fn create_test_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.site.host = "127.0.0.1".to_string();
    config.site.base_url = server.uri();
    config.feed.sitemap_url = Some(format!("{}/sitemap.xml", server.uri()));
    config.crawler.max_retries = 3;
    config.output = OutputConfig::rooted_at(dir.path());
    config
}

fn read(path: &std::path::Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn test_failures_retried_until_bound() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_sitemap(&server, &["/a", "/b", "/c"]).await;

    // A fails on its first two attempts, then succeeds
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(
            "Regeling A",
            r#"<a href="https://example.org/a">a</a>"#,
        )))
        .with_priority(2)
        .mount(&server)
        .await;
    mount_status(&server, "/a/", 500).await;

    mount_page(&server, "/b", page("Regeling B", "")).await;

    mount_status(&server, "/c", 500).await;
    mount_status(&server, "/c/", 503).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);
    let output = config.output.clone();

    let outcome = run_crawl(config, "test", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.report.len(), 2);
    assert!(outcome.report.contains(&format!("{}/a", base)));
    assert!(outcome.report.contains(&format!("{}/b", base)));
    assert_eq!(outcome.failed_pages, vec![format!("{}/c", base)]);
    assert_eq!(outcome.statistics.retry_rounds, 3);

    assert_eq!(read(&output.failed_html_file), format!("{}/c\n", base));
    assert_eq!(read(&output.failed_images_file), "");
    assert!(output.html_dir.join("a.html").exists());
    assert!(output.html_dir.join("b.html").exists());
    assert!(!output.html_dir.join("c.html").exists());

    let json: serde_json::Value = serde_json::from_str(&read(&output.report_json)).unwrap();
    assert_eq!(json[format!("{}/a", base)]["domains"]["example.org"], 1);

    let csv = read(&output.report_csv);
    assert!(csv.starts_with("Page URL,Domain,Reference URL,Domain Count,URL Count\n"));
    assert!(csv.contains(&format!("{}/a,example.org,https://example.org/a,1,1", base)));
    assert!(output.summary_path.exists());
}

#[tokio::test]
async fn test_cached_pages_not_fetched() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_sitemap(&server, &["/opgeslagen/"]).await;

    Mock::given(method("GET"))
        .and(path("/opgeslagen"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Vers", "")))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/opgeslagen/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Vers", "")))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);
    let output = config.output.clone();
    output.ensure_directories().await.unwrap();
    std::fs::write(
        output.html_dir.join("opgeslagen.html"),
        page("Opgeslagen", r#"<a href="https://other.org/b">b</a>"#),
    )
    .unwrap();

    let outcome = run_crawl(config, "test", CancellationToken::new())
        .await
        .unwrap();

    let record = outcome
        .report
        .get(&format!("{}/opgeslagen/", base))
        .expect("cached page should be recorded");
    assert_eq!(record.domains["other.org"], 1);
    assert_eq!(outcome.statistics.cache_hits, 1);
    assert!(outcome.failed_pages.is_empty());
}

#[tokio::test]
async fn test_trailing_slash_fallback() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_sitemap(&server, &["/alleen-met-slash"]).await;
    mount_status(&server, "/alleen-met-slash", 404).await;
    mount_page(&server, "/alleen-met-slash/", page("Met slash", "")).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);
    let output = config.output.clone();

    let outcome = run_crawl(config, "test", CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.report.contains(&format!("{}/alleen-met-slash", base)));
    assert!(output.html_dir.join("alleen-met-slash.html").exists());
    assert_eq!(outcome.statistics.retry_rounds, 0);
}

#[tokio::test]
async fn test_error_page_and_minimal_content_fail() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_sitemap(&server, &["/weg", "/kort"]).await;

    let not_found = format!(
        "<html><head><title>404 Not Found</title></head><body>{}</body></html>",
        "Deze pagina is verplaatst of verwijderd. ".repeat(5)
    );
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(not_found))
        .with_priority(10)
        .mount(&server)
        .await;
    mount_page(&server, "/kort", "<p>kort</p>".to_string()).await;
    mount_page(&server, "/kort/", "<p>kort</p>".to_string()).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.max_retries = 1;
    let output = config.output.clone();

    let outcome = run_crawl(config, "test", CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.report.is_empty());
    assert_eq!(
        outcome.failed_pages,
        vec![format!("{}/kort", base), format!("{}/weg", base)]
    );
    assert!(!output.html_dir.join("weg.html").exists());
    assert!(!output.html_dir.join("kort.html").exists());
}

#[tokio::test]
async fn test_images_downloaded_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_sitemap(&server, &["/een", "/twee"]).await;

    let images = r#"<img src="/img/logo.png"><img src="/img/ontbreekt.png">"#;
    mount_page(&server, "/een", page("Een", images)).await;
    mount_page(&server, "/twee", page("Twee", r#"<img src="/img/logo.png">"#)).await;

    Mock::given(method("GET"))
        .and(path("/img/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
        .expect(1)
        .mount(&server)
        .await;
    mount_status(&server, "/img/ontbreekt.png", 404).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);
    let output = config.output.clone();

    let outcome = run_crawl(config, "test", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.statistics.distinct_images, 2);
    assert_eq!(outcome.statistics.images_saved, 1);
    assert_eq!(
        std::fs::read(output.image_dir.join("logo.png")).unwrap(),
        vec![0x89, b'P', b'N', b'G']
    );
    assert_eq!(
        read(&output.failed_images_file),
        format!("{}/img/ontbreekt.png\n", base)
    );
}

#[tokio::test]
async fn test_json_index_with_path_filter() {
    let server = MockServer::start().await;
    let base = server.uri();

    let index = serde_json::json!([
        {"source_url": format!("{}/subsidies/kunst", base)},
        {"source_url": format!("{}/wonen", base)},
        {"title": "zonder bron"}
    ]);
    Mock::given(method("GET"))
        .and(path("/index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(index))
        .mount(&server)
        .await;
    mount_page(&server, "/subsidies/kunst", page("Kunst", "")).await;
    Mock::given(method("GET"))
        .and(path("/wonen"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Wonen", "")))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.feed.sitemap_url = None;
    config.feed.json_index_url = Some(format!("{}/index.json", base));
    config.feed.path_filter = Some("/subsidies".to_string());
    let output = config.output.clone();

    let outcome = run_crawl(config, "test", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.report.len(), 1);
    assert!(output.html_dir.join("subsidies_kunst.html").exists());
}

#[tokio::test]
async fn test_previous_failures_are_picked_up() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_sitemap(&server, &[]).await;
    mount_page(&server, "/eerder-mislukt", page("Terug", "")).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);
    let output = config.output.clone();
    output.ensure_directories().await.unwrap();
    std::fs::write(
        &output.failed_html_file,
        format!("{}/eerder-mislukt\n\n", base),
    )
    .unwrap();

    let outcome = run_crawl(config, "test", CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.report.contains(&format!("{}/eerder-mislukt", base)));
    assert_eq!(read(&output.failed_html_file), "");
}

#[tokio::test]
async fn test_primary_feed_failure_is_fatal() {
    let server = MockServer::start().await;
    mount_status(&server, "/sitemap.xml", 500).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);
    let output = config.output.clone();

    let result = run_crawl(config, "test", CancellationToken::new()).await;

    assert!(matches!(result, Err(HarvestError::Feed { .. })));
    assert!(!output.report_json.exists());
}

#[tokio::test]
async fn test_cancelled_run_still_writes_failure_list() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_sitemap(&server, &["/traag"]).await;
    Mock::given(method("GET"))
        .and(path("/traag"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page("Traag", ""))
                .set_delay(std::time::Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.run_deadline_secs = Some(1);
    let output = config.output.clone();

    let outcome = run_crawl(config, "test", CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.statistics.cancelled);
    assert_eq!(outcome.statistics.retry_rounds, 0);
    assert_eq!(read(&output.failed_html_file), format!("{}/traag\n", base));
}
