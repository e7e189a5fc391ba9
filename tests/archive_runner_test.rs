//! End-to-end archive runs against a stubbed platform

use std::sync::Arc;

use cohost_archive::feed::trpc_url;
use cohost_archive::{ArchiveConfig, ArchivedPost, Archiver, FetchCoordinator, HttpFetch, PathPolicy};
use serde_json::{Value, json};

mod common;
use common::{COOKIE, StubFetcher, create_test_dir, post_json, project_json};

fn profile_posts_url(handle: &str, page: u64) -> String {
    trpc_url(
        "posts.profilePosts",
        &json!({
            "projectHandle": handle,
            "page": page,
            "options": {
                "hideAsks": false,
                "hideReplies": false,
                "hideShares": false,
                "pinnedPostsAtTop": true,
                "viewingOnProjectPage": true,
            }
        }),
    )
    .expect("valid url")
}

const POST_PAGE: &str = r#"<!DOCTYPE html>
<html><head><link rel="stylesheet" href="/static/main.css"></head>
<body><img src="https://staging.cohostcdn.org/attachment/c/i.png" srcset="https://staging.cohostcdn.org/attachment/c/i.png 1x, https://staging.cohostcdn.org/attachment/c/i@2x.png 2x">
<div data-post-body="true" class="prose"><p style="background: url(https://staging.cohostcdn.org/attachment/c/i.png)">hi</p></div>
</body></html>"#;

fn trpc_result(data: Value) -> Value {
    json!({ "result": { "data": data } })
}

fn stub_platform() -> Arc<StubFetcher> {
    let http = StubFetcher::new();
    for id in [1, 3] {
        http.respond(
            &format!("https://staging.cohostcdn.org/avatar/{id}-avatar.png"),
            Some("image/png"),
            b"avatar".to_vec(),
        );
    }
    http.respond(
        "https://staging.cohostcdn.org/attachment/c/i.png",
        Some("image/png"),
        b"image".to_vec(),
    );

    http.respond("https://cohost.org/static/main.css", Some("text/css"), b"body{color:red}".to_vec());
    for page in ["a/post/10-post", "b/post/20-post"] {
        http.respond(&format!("https://cohost.org/{page}"), Some("text/html"), POST_PAGE);
    }

    http.respond_json(
        &profile_posts_url("a", 0),
        &trpc_result(json!({
            "pagination": { "currentPage": 0, "morePagesForward": true, "nextPage": 1 },
            "posts": [
                post_json("a", 10, json!([]), json!([])),
                post_json("a", 11, json!([]), json!([])),
            ]
        })),
    );
    // The flag claims more pages; the empty page ends the listing
    http.respond_json(
        &profile_posts_url("a", 1),
        &trpc_result(json!({
            "pagination": { "currentPage": 1, "morePagesForward": true, "nextPage": 2 },
            "posts": []
        })),
    );

    http.respond_json(
        &trpc_url("posts.singlePost", &json!({ "handle": "b", "postId": 20 })).expect("valid url"),
        &trpc_result(json!({
            "post": post_json("b", 20, json!([]), json!([])),
            "comments": {
                "20": [{
                    "poster": project_json("c", 3),
                    "comment": {
                        "commentId": "c1",
                        "body": "![i](https://staging.cohostcdn.org/attachment/c/i.png)",
                        "children": [],
                        "postedAtISO": "2024-10-01T00:00:00.000Z"
                    }
                }]
            }
        })),
    );
    http
}

async fn archiver(root: &std::path::Path, http: &Arc<StubFetcher>) -> Archiver {
    let config = ArchiveConfig::builder()
        .cookie(COOKIE)
        .output_dir(root)
        .project("a")
        .post("https://cohost.org/b/post/20-post")
        .skip_post(11)
        .load_liked_posts(false)
        .build()
        .expect("valid config");
    let http: Arc<dyn HttpFetch> = http.clone();
    let coordinator = FetchCoordinator::new(root, COOKIE, PathPolicy::new(Vec::new()), http).await;
    Archiver::with_coordinator(config, coordinator)
}

fn read_post(root: &std::path::Path, path: &str) -> ArchivedPost {
    serde_json::from_slice(&std::fs::read(root.join(path)).expect("post stored")).expect("post json")
}

#[tokio::test]
async fn test_run_archives_listed_and_single_posts() {
    let dir = create_test_dir();
    let http = stub_platform();

    let report = archiver(dir.path(), &http).await.run().await;
    assert!(report.is_success(), "{report}");
    assert_eq!(report.archived, 2);
    assert_eq!(report.skipped, 1);

    assert!(dir.path().join("a/posts.json").exists());
    assert!(!dir.path().join("a/post/11-post.json").exists());

    let listed = read_post(dir.path(), "a/post/10-post.json");
    assert_eq!(listed.post.posting_project.avatar_url, "../../rc/avatar/1-avatar.png");
    assert_eq!(listed.rewrite_data.base, "https://cohost.org/a/post/10-post");
    assert!(listed.comments.is_none());

    let single = read_post(dir.path(), "b/post/20-post.json");
    let comments = single.comments.expect("single posts carry comments");
    let comment = &comments[&20][0];
    assert_eq!(comment.comment.body.trim(), "![i](../../rc/attachment/c/i.png)");
    assert_eq!(comment.comment.extra["postedAtISO"], "2024-10-01T00:00:00.000Z");
    assert!(single.rewrite_data.urls.contains_key("https://staging.cohostcdn.org/attachment/c/i.png"));
}

#[tokio::test]
async fn test_post_pages_are_captured_next_to_the_post_files() {
    let dir = create_test_dir();
    let http = stub_platform();

    let report = archiver(dir.path(), &http).await.run().await;
    assert!(report.is_success(), "{report}");

    let page = std::fs::read_to_string(dir.path().join("a/post/10-post.html")).expect("page stored");
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains(r#"href="../../static/main.css""#), "{page}");
    assert!(page.contains(r#"<img src="../../rc/attachment/c/i.png">"#), "{page}");
    assert!(!page.contains("i@2x.png"), "{page}");
    assert!(!page.contains("https://staging.cohostcdn.org"), "{page}");
    assert!(dir.path().join("b/post/20-post.html").exists());
    assert!(dir.path().join("static/main.css").exists());
    assert!(!dir.path().join("a/post/11-post.html").exists());
    assert_eq!(http.calls_to("https://cohost.org/static/main.css"), 1);
}

#[tokio::test]
async fn test_a_failed_page_capture_leaves_the_post_for_the_next_run() {
    let dir = create_test_dir();
    let http = stub_platform();
    http.fail("https://cohost.org/a/post/10-post", 500);

    let report = archiver(dir.path(), &http).await.run().await;
    assert_eq!(report.archived, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].url, "https://cohost.org/a/post/10-post");
    assert!(!dir.path().join("a/post/10-post.json").exists());

    http.respond("https://cohost.org/a/post/10-post", Some("text/html"), POST_PAGE);
    let report = archiver(dir.path(), &http).await.run().await;
    assert!(report.is_success(), "{report}");
    assert_eq!(report.archived, 1);
    assert!(dir.path().join("a/post/10-post.json").exists());
}

#[tokio::test]
async fn test_second_run_resumes_from_the_archive() {
    let dir = create_test_dir();
    let http = stub_platform();

    archiver(dir.path(), &http).await.run().await;
    let listing_calls = http.calls_to(&profile_posts_url("a", 0));

    let report = archiver(dir.path(), &http).await.run().await;
    assert!(report.is_success(), "{report}");
    assert_eq!(report.archived, 0);
    assert_eq!(report.already_archived, 2);
    assert_eq!(http.calls_to(&profile_posts_url("a", 0)), listing_calls);
    assert_eq!(http.calls_to("https://cohost.org/a/post/10-post"), 1);
}

#[tokio::test]
async fn test_failed_posts_are_reported_and_the_run_continues() {
    let dir = create_test_dir();
    let http = stub_platform();
    http.fail(
        &trpc_url("posts.singlePost", &json!({ "handle": "b", "postId": 20 })).expect("valid url"),
        404,
    );

    let report = archiver(dir.path(), &http).await.run().await;
    assert_eq!(report.archived, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].url, "https://cohost.org/b/post/20-post");
    assert_eq!(report.failures[0].error.status(), Some(404));
}
