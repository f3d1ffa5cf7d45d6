//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run full crawls
//! through the HTTP page fetcher.

use site_probe::config::Config;
use site_probe::crawler::probe;
use site_probe::ErrorKind;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a sequential test configuration with short timeouts
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.concurrency = 1;
    config.crawler.navigation_timeout_ms = 5000;
    config.crawler.idle_timeout_ms = 2000;
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Test</title></head><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_html(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_crawl_follows_same_origin_links() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        html(
            r#"<a href="/about">About</a>
               <a href="/blog#latest">Blog</a>
               <a href="https://external.invalid/page">Elsewhere</a>
               <a href="mailto:team@example.com">Mail</a>"#,
        ),
    )
    .await;
    mount_html(&server, "/about", html(r#"<a href="/">Home</a>"#)).await;
    mount_html(&server, "/blog", html(r#"<a href="/about">About</a>"#)).await;

    let mut config = create_test_config();
    config.crawler.log_skipped = true;

    let start = format!("{}/", server.uri());
    let report = probe(config, &start).await.unwrap();

    assert_eq!(report.visited, 3);
    assert!(report.results.contains_key(&start));
    assert!(report.results.contains_key(&format!("{}/about", server.uri())));
    assert!(report.results.contains_key(&format!("{}/blog", server.uri())));
    assert!(report.is_success());

    let skipped = report.skipped.unwrap();
    assert_eq!(skipped.external, 2);
}

#[tokio::test]
async fn test_error_page_still_harvested() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        ResponseTemplate::new(404)
            .set_body_raw(r#"<html><body><a href="/found">Found</a></body></html>"#, "text/html"),
    )
    .await;
    mount_html(&server, "/found", html("ok")).await;

    let start = format!("{}/", server.uri());
    let report = probe(create_test_config(), &start).await.unwrap();

    let root = &report.results[&start];
    assert_eq!(root.errors.len(), 1);
    assert_eq!(root.errors[0].kind, ErrorKind::Navigation);
    assert_eq!(root.errors[0].message, "HTTP 404 error");
    assert!(report.results.contains_key(&format!("{}/found", server.uri())));
    assert_eq!(report.total_errors(), 1);
    assert!(!report.is_success());
}

#[tokio::test]
async fn test_shared_stylesheet_fetched_once() {
    let server = MockServer::start().await;

    let page = |link: &str| {
        html(&format!(
            r#"<link rel="stylesheet" href="/site.css"><a href="{}">Next</a>"#,
            link
        ))
    };
    mount_html(&server, "/", page("/one")).await;
    mount_html(&server, "/one", page("/two")).await;
    mount_html(&server, "/two", page("/")).await;

    Mock::given(method("GET"))
        .and(path("/site.css"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("body { margin: 0 }", "text/css"))
        .expect(1)
        .mount(&server)
        .await;

    let start = format!("{}/", server.uri());
    let report = probe(create_test_config(), &start).await.unwrap();

    assert_eq!(report.visited, 3);
    assert_eq!(report.cache.entries, 1);
    assert_eq!(report.cache.misses, 1);
    assert_eq!(report.cache.hits, 2);
    assert_eq!(report.cache.total_bytes, "body { margin: 0 }".len());
}

#[tokio::test]
async fn test_single_page_mode() {
    let server = MockServer::start().await;

    mount_html(&server, "/", html(r#"<a href="/next">Next</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html("never"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config();
    config.crawler.single_page = true;

    let start = format!("{}/", server.uri());
    let report = probe(config, &start).await.unwrap();

    assert_eq!(report.results.len(), 1);
    assert!(report.results[&start].links.is_empty());
}

#[tokio::test]
async fn test_depth_limit() {
    let server = MockServer::start().await;

    mount_html(&server, "/", html(r#"<a href="/1">1</a>"#)).await;
    mount_html(&server, "/1", html(r#"<a href="/2">2</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/2"))
        .respond_with(html("too deep"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config();
    config.crawler.max_depth = 1;

    let start = format!("{}/", server.uri());
    let report = probe(config, &start).await.unwrap();

    assert_eq!(report.visited, 2);
}

#[tokio::test]
async fn test_failed_subresource_reported_when_verbose() {
    let server = MockServer::start().await;

    mount_html(&server, "/", html(r#"<script src="/missing.js"></script>"#)).await;

    let mut config = create_test_config();
    config.reporting.verbose = true;

    let start = format!("{}/", server.uri());
    let report = probe(config, &start).await.unwrap();

    let errors = &report.results[&start].errors;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Request);
    assert_eq!(
        errors[0].location.as_deref(),
        Some(format!("{}/missing.js", server.uri()).as_str())
    );
}

#[tokio::test]
async fn test_failed_subresource_ignored_by_default() {
    let server = MockServer::start().await;

    mount_html(&server, "/", html(r#"<script src="/missing.js"></script>"#)).await;

    let start = format!("{}/", server.uri());
    let report = probe(create_test_config(), &start).await.unwrap();

    assert!(report.is_success());
}

#[tokio::test]
async fn test_redirect_records_final_url() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        ResponseTemplate::new(301).insert_header("Location", "/home"),
    )
    .await;
    mount_html(&server, "/home", html("home")).await;

    let start = format!("{}/", server.uri());
    let report = probe(create_test_config(), &start).await.unwrap();

    let root = &report.results[&start];
    assert_eq!(root.metadata["status"], 200);
    assert_eq!(root.metadata["final_url"], format!("{}/home", server.uri()));
}

#[tokio::test]
async fn test_results_written_as_json() {
    let server = MockServer::start().await;
    mount_html(&server, "/", html("hello")).await;

    let start = format!("{}/", server.uri());
    let report = probe(create_test_config(), &start).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("results.json");
    report.write_json(&output).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written[&start]["url"], start);
    assert!(written[&start]["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_start_url_is_fatal() {
    let result = probe(create_test_config(), "not a url").await;
    assert!(result.is_err());
}
