mod common;

use std::time::Duration;

use serde_json::json;
use unblock_config::UnblockConfig;
use unblock_web::{AgentTool, CrawlAdapter, CrawlTool, UnblockError};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn adapter(server: &MockServer) -> CrawlAdapter {
    CrawlAdapter::from_unlocker(common::unlocker(server))
}

#[tokio::test]
async fn crawl_posts_the_target_url_and_returns_the_page() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/request"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({
            "url": "https://example.com/article?id=7",
            "zone": "unblocker",
            "format": "raw",
            "data_format": "markdown"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Article\n\nText."))
        .expect(1)
        .mount(&server)
        .await;

    let page = adapter(&server)
        .crawl("https://example.com/article?id=7")
        .await
        .unwrap();
    assert_eq!(page.markdown(), "# Article\n\nText.");
}

#[tokio::test]
async fn http_error_is_a_crawl_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/request"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let err = adapter(&server)
        .crawl("https://example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, UnblockError::Crawl(_)));
    assert!(
        err.to_string().starts_with("unlocking API request failed: "),
        "{err}"
    );

    let result = adapter(&server).crawl_result("https://example.com").await;
    assert!(result.markdown.is_empty());
    assert!(result.error.is_some());
}

#[tokio::test]
async fn timeout_is_a_crawl_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/request"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let err = adapter(&server)
        .with_timeout(Duration::from_millis(50))
        .crawl("https://example.com")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("timed out"), "{err}");
}

#[tokio::test]
async fn tool_truncates_content_and_keeps_the_prefix() {
    let server = MockServer::start().await;
    let body = "ß".repeat(1200);

    Mock::given(method("POST"))
        .and(path("/request"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
        .mount(&server)
        .await;

    let tool = CrawlTool::new(adapter(&server));
    let out = tool.call(json!({ "url": "https://example.com" })).await;

    let prefix = "URL: https://example.com\n\nContent:\n";
    assert!(out.starts_with(prefix));
    let content = &out[prefix.len()..];
    assert_eq!(content.chars().count(), 1000);
    assert!(body.starts_with(content));
}

#[tokio::test]
async fn tool_uses_configured_preview_length() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/request"))
        .respond_with(ResponseTemplate::new(200).set_body_string("abcdefghij"))
        .mount(&server)
        .await;

    let tool = CrawlTool::new(adapter(&server).with_preview_chars(4));
    let out = tool.call(json!({ "url": "https://example.com" })).await;
    assert_eq!(out, "URL: https://example.com\n\nContent:\nabcd");
}

#[tokio::test]
async fn tool_failure_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/request"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let tool = CrawlTool::new(adapter(&server));
    let out = tool.call(json!({ "url": "https://example.com" })).await;
    assert!(
        out.starts_with("Failed to crawl. Error: unlocking API request failed: "),
        "{out}"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn blocking_crawl_runs_off_the_executor() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/request"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Page"))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter(&server);
    let page = tokio::task::spawn_blocking(move || adapter.crawl_blocking("https://example.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(page.markdown(), "# Page");
}

#[tokio::test(flavor = "multi_thread")]
async fn blocking_tool_run_renders_the_page() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/request"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Page\n\nbody"))
        .expect(1)
        .mount(&server)
        .await;

    let tool = CrawlTool::new(adapter(&server));
    let out = tokio::task::spawn_blocking(move || tool.run(json!({ "url": "https://example.com" })))
        .await
        .unwrap();
    assert_eq!(out, "URL: https://example.com\n\nContent:\n# Page\n\nbody");
}

#[tokio::test]
async fn configured_preview_is_capped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/request"))
        .respond_with(ResponseTemplate::new(200).set_body_string("y".repeat(3000)))
        .mount(&server)
        .await;

    let tool = CrawlTool::new(adapter(&server).with_preview_chars(2500));
    let out = tool.call(json!({ "url": "https://example.com" })).await;
    let prefix = "URL: https://example.com\n\nContent:\n";
    assert_eq!(out[prefix.len()..].chars().count(), 1000);
}

#[test]
fn missing_credential_fails_construction() {
    let err = CrawlAdapter::new(&UnblockConfig::default()).unwrap_err();
    assert!(err.is_fatal());
}
