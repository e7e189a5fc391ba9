//! Integration tests for the fetch coordinator: resume, request coalescing,
//! extension inference and failure classes

use std::time::Duration;

use cohost_archive::PathPolicy;

mod common;
use common::{StubFetcher, coordinator, coordinator_with_policy, create_test_dir};

const AVATAR: &str = "https://staging.cohostcdn.org/avatar/1-abc.png";

#[tokio::test]
async fn test_resolve_stores_cdn_resource_and_resumes_without_fetching() {
    let dir = create_test_dir();
    let http = StubFetcher::new();
    http.respond(AVATAR, Some("image/png"), b"png".to_vec());

    let first = coordinator(dir.path(), &http).await;
    let path = first.resolve(&format!("{AVATAR}?width=40")).await.expect("resolves");
    assert_eq!(path.as_deref(), Some("rc/avatar/1-abc.png"));
    assert_eq!(
        std::fs::read(dir.path().join("rc/avatar/1-abc.png")).expect("stored"),
        b"png"
    );
    first.finalize().await.expect("flush");

    // A second run over the same root finds the file and never asks again
    let second = coordinator(dir.path(), &http).await;
    let again = second.resolve(AVATAR).await.expect("resolves");
    assert_eq!(again, path);
    assert_eq!(http.calls(), 1);
}

#[tokio::test]
async fn test_concurrent_resolutions_share_one_request() {
    let dir = create_test_dir();
    let http = StubFetcher::new();
    http.respond(AVATAR, Some("image/png"), b"png".to_vec());
    http.set_delay(Duration::from_millis(50));

    let coordinator = coordinator(dir.path(), &http).await;
    let (a, b, c) = tokio::join!(
        coordinator.resolve(AVATAR),
        coordinator.resolve(AVATAR),
        coordinator.resolve(AVATAR)
    );

    assert_eq!(a.expect("a"), Some("rc/avatar/1-abc.png".to_string()));
    assert_eq!(b.expect("b"), Some("rc/avatar/1-abc.png".to_string()));
    assert_eq!(c.expect("c"), Some("rc/avatar/1-abc.png".to_string()));
    assert_eq!(http.calls_to(AVATAR), 1);
}

#[tokio::test]
async fn test_query_variants_of_one_cdn_resource_share_one_request() {
    let dir = create_test_dir();
    let http = StubFetcher::new();
    let avatar = "https://staging.cohostcdn.org/avatar/1-a.png";
    http.respond(avatar, Some("image/png"), b"png".to_vec());
    http.set_delay(Duration::from_millis(50));

    let coordinator = coordinator(dir.path(), &http).await;
    let (full, preview) = tokio::join!(
        coordinator.resolve(&format!("{avatar}?dpr=2")),
        coordinator.resolve(&format!("{avatar}?width=40"))
    );

    assert_eq!(full.expect("full"), Some("rc/avatar/1-a.png".to_string()));
    assert_eq!(preview.expect("preview"), Some("rc/avatar/1-a.png".to_string()));
    assert_eq!(http.calls_to(avatar), 1);
    assert_eq!(http.calls(), 1);
}

#[tokio::test]
async fn test_extension_is_inferred_from_content_type_and_remembered() {
    let dir = create_test_dir();
    let http = StubFetcher::new();
    let url = "https://staging.cohostcdn.org/attachment/abc/file";
    http.respond(url, Some("image/webp; charset=binary"), b"webp".to_vec());

    let first = coordinator(dir.path(), &http).await;
    let path = first.resolve(url).await.expect("resolves");
    assert_eq!(path.as_deref(), Some("rc/attachment/abc/file.webp"));
    first.finalize().await.expect("flush");

    let headers: serde_json::Value = serde_json::from_slice(
        &std::fs::read(dir.path().join("~headers.json")).expect("cache written"),
    )
    .expect("cache is json");
    assert_eq!(headers[url]["content-type"], "image/webp; charset=binary");

    let second = coordinator(dir.path(), &http).await;
    assert_eq!(second.resolve(url).await.expect("resolves"), path);
    assert_eq!(http.calls(), 1);
}

#[tokio::test]
async fn test_unqualified_file_without_cache_entry_is_refetched() {
    let dir = create_test_dir();
    let http = StubFetcher::new();
    let url = "https://staging.cohostcdn.org/attachment/abc/file";
    http.respond(url, Some("image/png"), b"png".to_vec());

    let legacy = dir.path().join("rc/attachment/abc/file");
    std::fs::create_dir_all(legacy.parent().expect("parent")).expect("mkdir");
    std::fs::write(&legacy, b"old").expect("legacy file");

    let coordinator = coordinator(dir.path(), &http).await;
    let path = coordinator.resolve(url).await.expect("resolves");
    assert_eq!(path.as_deref(), Some("rc/attachment/abc/file.png"));
    assert_eq!(http.calls(), 1);
}

#[tokio::test]
async fn test_external_failures_are_tolerated_but_platform_failures_are_fatal() {
    let dir = create_test_dir();
    let http = StubFetcher::new();
    let external = "https://example.com/gone.png";
    http.fail(external, 404);
    http.fail(AVATAR, 500);

    let coordinator = coordinator(dir.path(), &http).await;
    assert_eq!(coordinator.resolve(external).await.expect("tolerated"), None);

    let err = coordinator.resolve(AVATAR).await.expect_err("fatal");
    assert_eq!(err.status(), Some(500));

    // Every later waiter sees the same outcome without another request
    let again = coordinator.resolve(AVATAR).await.expect_err("still fatal");
    assert_eq!(again.status(), Some(500));
    assert_eq!(http.calls_to(AVATAR), 1);
}

#[tokio::test]
async fn test_ignored_urls_are_never_fetched() {
    let dir = create_test_dir();
    let http = StubFetcher::new();
    let policy = PathPolicy::new(vec!["r0t.is".to_string()]);
    let coordinator = coordinator_with_policy(dir.path(), &http, policy).await;

    for url in [
        "http://example.com/a.png",
        "data:image/png;base64,AAAA",
        "https://r0t.is/xp.gif",
        "not a url",
    ] {
        assert_eq!(coordinator.resolve(url).await.expect("ignored"), None, "{url}");
    }
    assert_eq!(http.calls(), 0);
}

#[tokio::test]
async fn test_cookie_is_only_sent_to_the_primary_host() {
    let dir = create_test_dir();
    let http = StubFetcher::new();
    let primary = "https://cohost.org/static/a.png";
    let external = "https://example.com/a.png";
    http.respond(primary, Some("image/png"), b"a".to_vec());
    http.respond(external, Some("image/png"), b"b".to_vec());

    let coordinator = coordinator(dir.path(), &http).await;
    coordinator.resolve(primary).await.expect("primary");
    coordinator.resolve(external).await.expect("external");

    assert_eq!(http.header_sent(primary, "cookie").as_deref(), Some(common::COOKIE));
    assert_eq!(http.header_sent(external, "cookie"), None);
    assert!(http.header_sent(external, "user-agent").is_some());
}

#[tokio::test]
async fn test_stylesheets_are_rewritten_before_storing() {
    let dir = create_test_dir();
    let http = StubFetcher::new();
    let sheet = "https://cohost.org/static/style.css";
    let image = "https://cohost.org/static/img/bg.png";
    http.respond(
        sheet,
        Some("text/css; charset=utf-8"),
        r#"@import url("style.css"); body { background: url("img/bg.png"); }"#,
    );
    http.respond(image, Some("image/png"), b"bg".to_vec());

    let coordinator = coordinator(dir.path(), &http).await;
    let path = tokio::time::timeout(Duration::from_secs(5), coordinator.resolve(sheet))
        .await
        .expect("self import does not deadlock")
        .expect("resolves");
    assert_eq!(path.as_deref(), Some("static/style.css"));

    let stored = std::fs::read_to_string(dir.path().join("static/style.css")).expect("stored");
    assert!(stored.contains("../static/img/bg.png"), "{stored}");
    assert!(dir.path().join("static/img/bg.png").exists());
    assert_eq!(http.calls_to(sheet), 1);
}

#[tokio::test]
async fn test_request_delay_is_applied() {
    let dir = create_test_dir();
    let http = StubFetcher::new();
    http.respond(AVATAR, Some("image/png"), b"png".to_vec());

    let coordinator = coordinator(dir.path(), &http)
        .await
        .with_request_delay(Duration::from_millis(30));
    let started = std::time::Instant::now();
    coordinator.resolve(AVATAR).await.expect("resolves");
    assert!(started.elapsed() >= Duration::from_millis(30));
}
