//! Integration tests for `WebPageSource` and manual URL ingestion.

mod common;

use chrono::{Duration, TimeZone, Utc};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wxagg_core::SourceType;
use wxagg_ingest::{add_manual_article, FetchError, ManualAddOutcome, RunError, WebPageSource};

use common::MemoryStore;

fn test_source() -> WebPageSource {
    WebPageSource::new(5, "wxagg-test/0.1").expect("failed to build test WebPageSource")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

#[tokio::test]
async fn extracts_og_title_and_published_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thread/42"))
        .respond_with(html(
            r#"<html><head>
                <meta property="og:title" content="Release notes">
                <meta property="article:published_time" content="2024-03-05T08:30:00+00:00">
               </head><body><p>hello</p></body></html>"#,
        ))
        .mount(&server)
        .await;

    let url = format!("{}/thread/42", server.uri());
    let page = test_source().fetch(&url, None).await.expect("fetch should succeed");

    assert_eq!(page.account_name, "127.0.0.1");
    assert_eq!(page.article.title.as_deref(), Some("Release notes"));
    assert_eq!(page.article.url.as_deref(), Some(url.as_str()));
    assert_eq!(
        page.article.published_at,
        Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).single()
    );
}

#[tokio::test]
async fn page_without_markers_falls_back_to_url_title_and_fetch_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thread/12345"))
        .respond_with(html("<html><body><div>just text</div></body></html>"))
        .mount(&server)
        .await;

    let before = Utc::now();
    let url = format!("{}/thread/12345", server.uri());
    let page = test_source().fetch(&url, None).await.unwrap();
    let after = Utc::now();

    assert_eq!(page.article.title.as_deref(), Some("Untitled - 12345"));
    let published = page.article.published_at.unwrap();
    assert!(published >= before - Duration::seconds(1) && published <= after);
}

#[tokio::test]
async fn cookie_is_forwarded_when_given() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("cookie", "sid=forum"))
        .respond_with(html("<html><head><title>Members only</title></head></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/private", server.uri());
    let page = test_source().fetch(&url, Some("sid=forum")).await.unwrap();
    assert_eq!(page.article.title.as_deref(), Some("Members only"));
}

#[tokio::test]
async fn not_found_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = test_source()
        .fetch(&format!("{}/gone", server.uri()), None)
        .await
        .unwrap_err();
    assert!(err.is_transient(), "expected transient, got {err:?}");
}

#[tokio::test]
async fn non_http_url_is_rejected_before_fetching() {
    let err = test_source()
        .fetch("ftp://example.com/file", None)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::MalformedResponse { .. }));
}

// ---------------------------------------------------------------------------
// add_manual_article
// ---------------------------------------------------------------------------

#[tokio::test]
async fn manual_add_inserts_then_reports_existing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/t/7"))
        .respond_with(html("<html><head><title>Forum post</title></head></html>"))
        .mount(&server)
        .await;

    let web = test_source();
    let store = MemoryStore::default();
    let url = format!("{}/t/7", server.uri());

    let first = add_manual_article(&web, &store, &url, None).await.unwrap();
    let ManualAddOutcome::Inserted(article) = first else {
        panic!("expected Inserted, got {first:?}");
    };
    assert_eq!(article.title, "Forum post");
    assert_eq!(article.source_type, SourceType::ForumManual);
    assert_eq!(article.canonical_url, url);

    let second = add_manual_article(&web, &store, &url, None).await.unwrap();
    assert_eq!(second, ManualAddOutcome::AlreadyExists(article));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn manual_add_reports_prefix_collision_without_storing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<html><head><title>Long thread</title></head></html>"))
        .mount(&server)
        .await;

    let web = test_source();
    let store = MemoryStore::default();
    let shared = "a".repeat(800);
    let first_url = format!("{}/t/{shared}/1", server.uri());
    let second_url = format!("{}/t/{shared}/2", server.uri());

    let first = add_manual_article(&web, &store, &first_url, None).await.unwrap();
    assert!(matches!(first, ManualAddOutcome::Inserted(_)));

    let second = add_manual_article(&web, &store, &second_url, None).await.unwrap();
    let ManualAddOutcome::PrefixCollision(article) = second else {
        panic!("expected PrefixCollision, got {second:?}");
    };
    assert_eq!(article.canonical_url, second_url);
    assert_eq!(store.len(), 1);
    assert!(store.get(&second_url).is_none());
    assert!(store.get(&first_url).is_some());
}

#[tokio::test]
async fn manual_add_surfaces_store_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<html><head><title>x</title></head></html>"))
        .mount(&server)
        .await;

    let url = format!("{}/t/8", server.uri());
    let store = MemoryStore::failing_on(&[url.as_str()]);
    let err = add_manual_article(&test_source(), &store, &url, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Store(ref m) if m.contains("disk full")));
}
