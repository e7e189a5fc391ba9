//! Fetch coordinator: the single way a URL becomes a file in the archive
//!
//! [`FetchCoordinator::resolve`] classifies a URL, reuses a file left by an
//! earlier run when it can be trusted, coalesces concurrent requests for the
//! same URL onto one in-flight fetch, and stores the response (stylesheets
//! rewritten first) under its storage path.
//!
//! The pending table maps each fetch URL to a shared future. An entry is
//! inserted before anything is awaited, so two resolutions of the same
//! resource can never both reach the network. Entries are kept for the lifetime of
//! the coordinator, which turns repeated lookups into a cached result.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, FutureExt, Shared};
use url::Url;

use super::content_type_cache::ContentTypeCache;
use super::error::{ResourceError, ResourceResult};
use super::extensions::{extension_for_content_type, is_css};
use super::http::{FetchedResponse, HttpFetch, request_headers};
use super::path_policy::{PathPolicy, ResourceRequest};
use super::storage::{file_exists, write_atomically};
use crate::rewrite::css;
use crate::utils::to_root_dir;

/// Eventual storage path of a resource; `None` when the URL is ignored or a
/// tolerable fetch failed
pub type ResolveFuture = BoxFuture<'static, ResourceResult<Option<String>>>;

type SharedFetch = Shared<ResolveFuture>;

/// URLs of the stylesheets currently being rewritten above a request
///
/// A stylesheet that (directly or through others) references itself would
/// otherwise wait on its own pending fetch forever.
pub(crate) type Lineage = Arc<Vec<String>>;

#[derive(Clone)]
pub struct FetchCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    root: PathBuf,
    cookie: String,
    policy: PathPolicy,
    http: Arc<dyn HttpFetch>,
    content_types: Arc<ContentTypeCache>,
    pending: DashMap<String, SharedFetch>,
    request_delay: Duration,
}

impl FetchCoordinator {
    /// Create a coordinator writing under `root`, loading the content type
    /// cache left there by earlier runs.
    pub async fn new(
        root: impl Into<PathBuf>,
        cookie: impl Into<String>,
        policy: PathPolicy,
        http: Arc<dyn HttpFetch>,
    ) -> Self {
        let root = root.into();
        let content_types = Arc::new(ContentTypeCache::load(&root).await);
        Self::with_content_types(root, cookie, policy, http, content_types)
    }

    pub fn with_content_types(
        root: impl Into<PathBuf>,
        cookie: impl Into<String>,
        policy: PathPolicy,
        http: Arc<dyn HttpFetch>,
        content_types: Arc<ContentTypeCache>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                root: root.into(),
                cookie: cookie.into(),
                policy,
                http,
                content_types,
                pending: DashMap::new(),
                request_delay: Duration::ZERO,
            }),
        }
    }

    /// Sleep this long before every outbound request
    ///
    /// Must be called before the coordinator is shared.
    #[must_use]
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.request_delay = delay;
        }
        self
    }

    pub(crate) fn policy(&self) -> &PathPolicy {
        &self.inner.policy
    }

    /// On-disk location of an archive-relative storage path
    #[must_use]
    pub fn disk_path(&self, storage_path: &str) -> PathBuf {
        self.inner.policy.disk_path(&self.inner.root, storage_path)
    }

    /// GET `url` with the archive's headers, outside the resource pipeline.
    pub async fn get(&self, url: &str) -> ResourceResult<FetchedResponse> {
        self.throttle().await;
        log::info!("GET {url}");
        let headers = request_headers(url, &self.inner.cookie);
        self.inner.http.get(url, &headers).await
    }

    /// Store `url` in the archive and return its storage path.
    ///
    /// `Ok(None)` means the URL is not archived (ignored, or a tolerable
    /// fetch failed). Errors are fatal fetch failures and must not be
    /// swallowed by callers that embed the result.
    pub fn resolve(&self, url: &str) -> ResolveFuture {
        self.resolve_from(url, Lineage::default())
    }

    pub(crate) fn resolve_from(&self, url: &str, lineage: Lineage) -> ResolveFuture {
        let this = self.clone();
        let url = url.to_string();
        async move {
            if lineage.contains(&url) {
                log::debug!("Not following circular stylesheet reference to {url}");
                return Ok(None);
            }
            let Some(request) = this.inner.policy.classify(&url) else {
                return Ok(None);
            };

            let mut force_refetch = false;
            let mut storage_path = request.storage_path.clone();
            if request.needs_extension_inference {
                match this.inner.content_types.get(&request.fetch_url) {
                    Some(content_type) => {
                        if let Some(ext) = extension_for_content_type(&content_type) {
                            storage_path = format!("{storage_path}.{ext}");
                        }
                    }
                    // A file at the bare path may come from a run that never
                    // recorded its type; it cannot be trusted.
                    None => force_refetch = true,
                }
            }

            if !force_refetch && file_exists(&this.disk_path(&storage_path)).await {
                return Ok(Some(storage_path));
            }

            // Spellings that differ only in a dropped query share one fetch
            let shared = match this.inner.pending.entry(request.fetch_url.clone()) {
                Entry::Occupied(entry) => entry.get().clone(),
                Entry::Vacant(entry) => {
                    let fetch = this.fetch_and_store(url, request, lineage).shared();
                    entry.insert(fetch.clone());
                    fetch
                }
            };
            shared.await
        }
        .boxed()
    }

    fn fetch_and_store(&self, url: String, request: ResourceRequest, lineage: Lineage) -> ResolveFuture {
        let this = self.clone();
        async move {
            let response = match this.get(&request.fetch_url).await {
                Ok(response) => response,
                Err(e) if request.fallible => {
                    log::warn!("FAILED: GET {}: {e}", request.fetch_url);
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };

            let content_type = response.content_type.clone().unwrap_or_default();
            let mut storage_path = request.storage_path.clone();
            if request.needs_extension_inference {
                this.inner.content_types.set(&request.fetch_url, &content_type);
                if let Some(ext) = extension_for_content_type(&content_type) {
                    storage_path = format!("{storage_path}.{ext}");
                }
            }

            let content = if is_css(&content_type) {
                match this.rewrite_stylesheet(&url, &storage_path, response.text(), lineage).await {
                    Ok(css) => css.into_bytes(),
                    Err(e) if request.fallible => {
                        log::warn!("FAILED: rewriting stylesheet {url}: {e}");
                        return Ok(None);
                    }
                    Err(e) => return Err(e),
                }
            } else {
                response.body
            };

            match write_atomically(this.disk_path(&storage_path), content).await {
                Ok(()) => Ok(Some(storage_path)),
                Err(e) if request.fallible => {
                    log::warn!("FAILED: storing {url}: {e}");
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        }
        .boxed()
    }

    async fn rewrite_stylesheet(
        &self,
        url: &str,
        storage_path: &str,
        text: String,
        lineage: Lineage,
    ) -> ResourceResult<String> {
        let base = Url::parse(url).map_err(|e| ResourceError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let mut chain = lineage.as_ref().clone();
        chain.push(url.to_string());

        let rewritten =
            css::rewrite_stylesheet_from(self, &text, &base, &to_root_dir(storage_path), Arc::new(chain))
                .await?;
        Ok(rewritten.text)
    }

    async fn throttle(&self) {
        if !self.inner.request_delay.is_zero() {
            tokio::time::sleep(self.inner.request_delay).await;
        }
    }

    /// Flush the content type cache. Call once when a run is over.
    pub async fn finalize(&self) -> ResourceResult<()> {
        self.inner.content_types.flush().await
    }
}
