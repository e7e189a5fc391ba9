//! Test utilities shared by the integration tests

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use cohost_archive::resources::{FetchFuture, FetchedResponse, HttpFetch, RequestHeaders};
use cohost_archive::{FetchCoordinator, PathPolicy, ResourceError};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tempfile::TempDir;

#[derive(Clone)]
enum Canned {
    Body { content_type: Option<String>, body: Vec<u8> },
    Status(u16),
}

/// In-memory [`HttpFetch`] that serves canned responses and records every
/// request it sees
#[derive(Default)]
pub struct StubFetcher {
    responses: Mutex<HashMap<String, Canned>>,
    requests: Mutex<Vec<(String, RequestHeaders)>>,
    calls: AtomicUsize,
    delay: Mutex<Duration>,
}

#[allow(dead_code)]
impl StubFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, content_type: Option<&str>, body: impl Into<Vec<u8>>) {
        self.responses.lock().insert(
            url.to_string(),
            Canned::Body {
                content_type: content_type.map(str::to_string),
                body: body.into(),
            },
        );
    }

    pub fn respond_json(&self, url: &str, value: &Value) {
        self.respond(url, Some("application/json"), value.to_string());
    }

    pub fn fail(&self, url: &str, status: u16) {
        self.responses.lock().insert(url.to_string(), Canned::Status(status));
    }

    /// Hold every response back this long, to keep fetches in flight
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.requests.lock().iter().filter(|(u, _)| u == url).count()
    }

    pub fn header_sent(&self, url: &str, name: &str) -> Option<String> {
        self.requests
            .lock()
            .iter()
            .find(|(u, _)| u == url)
            .and_then(|(_, headers)| headers.iter().find(|(n, _)| *n == name))
            .map(|(_, value)| value.clone())
    }
}

impl HttpFetch for StubFetcher {
    fn get<'a>(&'a self, url: &'a str, headers: &'a RequestHeaders) -> FetchFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().push((url.to_string(), headers.clone()));
            let delay = *self.delay.lock();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let canned = self.responses.lock().get(url).cloned();
            match canned {
                Some(Canned::Body { content_type, body }) => Ok(FetchedResponse {
                    status: 200,
                    content_type,
                    body,
                }),
                Some(Canned::Status(status)) => Err(ResourceError::HttpStatus {
                    url: url.to_string(),
                    status,
                    body: String::new(),
                }),
                None => Err(ResourceError::HttpStatus {
                    url: url.to_string(),
                    status: 404,
                    body: "no canned response".to_string(),
                }),
            }
        })
    }
}

pub const COOKIE: &str = "connect.sid=test";

/// Creates a temporary directory for an archive root
#[allow(dead_code)]
pub fn create_test_dir() -> TempDir {
    TempDir::new().expect("temp dir")
}

#[allow(dead_code)]
pub async fn coordinator(root: &Path, http: &Arc<StubFetcher>) -> FetchCoordinator {
    coordinator_with_policy(root, http, PathPolicy::new(Vec::new())).await
}

#[allow(dead_code)]
pub async fn coordinator_with_policy(
    root: &Path,
    http: &Arc<StubFetcher>,
    policy: PathPolicy,
) -> FetchCoordinator {
    let http: Arc<dyn HttpFetch> = http.clone();
    FetchCoordinator::new(root, COOKIE, policy, http).await
}

#[allow(dead_code)]
pub fn project_json(handle: &str, id: u64) -> Value {
    json!({
        "projectId": id,
        "handle": handle,
        "displayName": handle.to_uppercase(),
        "avatarURL": format!("https://staging.cohostcdn.org/avatar/{id}-avatar.png?dpr=2"),
        "avatarPreviewURL": format!("https://staging.cohostcdn.org/avatar/{id}-avatar.png?width=40"),
        "description": "",
    })
}

#[allow(dead_code)]
pub fn post_json(handle: &str, post_id: u64, blocks: Value, share_tree: Value) -> Value {
    json!({
        "postId": post_id,
        "filename": format!("{post_id}-post"),
        "singlePostPageUrl": format!("https://cohost.org/{handle}/post/{post_id}-post"),
        "headline": "",
        "postingProject": project_json(handle, 1),
        "blocks": blocks,
        "astMap": { "readMoreIndex": null, "spans": [] },
        "shareTree": share_tree,
    })
}

#[allow(dead_code)]
pub fn attachment_block(file_url: &str) -> Value {
    json!({
        "type": "attachment",
        "attachment": {
            "kind": "image",
            "fileURL": file_url,
            "previewURL": file_url,
            "attachmentId": "a",
        }
    })
}
