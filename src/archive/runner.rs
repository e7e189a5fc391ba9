use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use url::Url;

use super::report::ArchiveReport;
use crate::config::ArchiveConfig;
use crate::feed::{SinglePost, load_all_liked_posts, load_all_project_posts, load_single_post, parse_post_url};
use crate::model::{Comment, Post};
use crate::resources::storage::{file_exists, write_atomically};
use crate::resources::{FetchCoordinator, HttpFetch, PathPolicy, ReqwestFetcher, ResourceError, ResourceResult};
use crate::rewrite::{RewriteData, merge, rewrite_comment, rewrite_page, rewrite_post};
use crate::utils::{PRIMARY_ORIGIN, to_root_dir};

const LIKED_POSTS_FILE: &str = "liked.json";

/// Contents of a stored post file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedPost {
    pub post: Post,
    pub rewrite_data: RewriteData,
    /// Rewritten comments, keyed by the share tree post they belong to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<BTreeMap<u64, Vec<Comment>>>,
}

/// Archive-relative path of a post's stored file
#[must_use]
pub fn post_storage_path(post: &Post) -> String {
    format!("{}/post/{}.json", post.posting_project.handle, post.filename)
}

/// Archive-relative path of a post's captured page
#[must_use]
pub fn post_page_storage_path(post: &Post) -> String {
    format!("{}/post/{}.html", post.posting_project.handle, post.filename)
}

pub struct Archiver {
    config: ArchiveConfig,
    coordinator: FetchCoordinator,
}

impl Archiver {
    /// Set up an archiver fetching over HTTP into the configured output
    /// directory.
    pub async fn new(config: ArchiveConfig) -> ResourceResult<Self> {
        let http: Arc<dyn HttpFetch> = Arc::new(ReqwestFetcher::new(config.request_timeout())?);
        let policy = PathPolicy::new(config.do_not_fetch_hostnames().to_vec())
            .with_windows_paths(config.windows_paths());
        let coordinator = FetchCoordinator::new(config.output_dir(), config.cookie(), policy, http)
            .await
            .with_request_delay(config.request_delay());
        Ok(Self::with_coordinator(config, coordinator))
    }

    #[must_use]
    pub fn with_coordinator(config: ArchiveConfig, coordinator: FetchCoordinator) -> Self {
        Self { config, coordinator }
    }

    #[must_use]
    pub fn coordinator(&self) -> &FetchCoordinator {
        &self.coordinator
    }

    /// Archive everything the config asks for.
    ///
    /// Failures of single posts or listings are recorded in the report and
    /// the run continues. The content type cache is flushed before
    /// returning, whatever happened before.
    pub async fn run(&self) -> ArchiveReport {
        let mut report = ArchiveReport::default();
        let mut posts = Vec::new();

        if self.config.load_liked_posts() {
            match self
                .cached_listing(LIKED_POSTS_FILE, || load_all_liked_posts(&self.coordinator))
                .await
            {
                Ok(liked) => posts.extend(liked),
                Err(e) => report.fail(format!("{PRIMARY_ORIGIN}/rc/liked-posts"), e),
            }
        }

        for handle in self.config.projects() {
            let listing = format!("{handle}/posts.json");
            match self
                .cached_listing(&listing, || load_all_project_posts(&self.coordinator, handle))
                .await
            {
                Ok(own) => posts.extend(own),
                Err(e) => report.fail(format!("{PRIMARY_ORIGIN}/{handle}"), e),
            }
        }

        for post in &posts {
            if let Err(e) = self.archive_listed_post(post, &mut report).await {
                report.fail(&post.single_post_page_url, e);
            }
        }

        for url in self.config.posts() {
            if let Err(e) = self.archive_single_post(url, &mut report).await {
                report.fail(url, e);
            }
        }

        if let Err(e) = self.coordinator.finalize().await {
            log::error!("Failed to save content type cache: {e}");
        }
        report
    }

    /// Read a post listing saved by an earlier run, or load and save it.
    async fn cached_listing<F, Fut>(&self, storage_path: &str, load: F) -> ResourceResult<Vec<Post>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ResourceResult<Vec<Post>>>,
    {
        let path = self.coordinator.disk_path(storage_path);
        if file_exists(&path).await {
            log::debug!("Using saved listing {}", path.display());
            return read_json(&path).await;
        }

        let posts = load().await?;
        log::info!("Listed {} posts into {storage_path}", posts.len());
        write_atomically(path, serde_json::to_vec(&posts)?).await?;
        Ok(posts)
    }

    async fn archive_listed_post(&self, post: &Post, report: &mut ArchiveReport) -> ResourceResult<()> {
        if self.config.is_skipped(post.post_id) {
            report.skipped += 1;
            return Ok(());
        }
        if self.is_archived(post).await {
            report.already_archived += 1;
            return Ok(());
        }

        log::info!("Archiving {}", post.single_post_page_url);
        let storage_path = post_storage_path(post);
        let (rewritten, rewrite_data) = rewrite_post(&self.coordinator, post, &to_root_dir(&storage_path)).await?;
        self.capture_page(post).await?;
        self.store(&storage_path, &ArchivedPost {
            post: rewritten,
            rewrite_data,
            comments: None,
        })
        .await?;
        report.archived += 1;
        Ok(())
    }

    async fn archive_single_post(&self, url: &str, report: &mut ArchiveReport) -> ResourceResult<()> {
        let (handle, post_id) = parse_post_url(url)?;
        if self.config.is_skipped(post_id) {
            report.skipped += 1;
            return Ok(());
        }

        let SinglePost { post, comments } = load_single_post(&self.coordinator, &handle, post_id).await?;
        if self.is_archived(&post).await {
            report.already_archived += 1;
            return Ok(());
        }

        log::info!("Archiving {url}");
        let storage_path = post_storage_path(&post);
        let to_root = to_root_dir(&storage_path);
        let (rewritten, mut rewrite_data) = rewrite_post(&self.coordinator, &post, &to_root).await?;

        let mut rewritten_comments = BTreeMap::new();
        for (share_post_id, thread) in &comments {
            let rewrites = try_join_all(
                thread
                    .iter()
                    .map(|comment| rewrite_comment(&self.coordinator, comment, &to_root)),
            )
            .await?;
            let thread = rewrites
                .into_iter()
                .map(|(comment, urls)| {
                    merge(&mut rewrite_data.urls, urls);
                    comment
                })
                .collect();
            rewritten_comments.insert(*share_post_id, thread);
        }

        self.capture_page(&post).await?;
        self.store(&storage_path, &ArchivedPost {
            post: rewritten,
            rewrite_data,
            comments: Some(rewritten_comments),
        })
        .await?;
        report.archived += 1;
        Ok(())
    }

    /// Store the rendered page of a post with its links and images.
    ///
    /// Runs before the post file is written, which marks the post as done.
    async fn capture_page(&self, post: &Post) -> ResourceResult<()> {
        let url = &post.single_post_page_url;
        let base = Url::parse(url).map_err(|e| ResourceError::InvalidUrl {
            url: url.clone(),
            message: e.to_string(),
        })?;
        let storage_path = post_page_storage_path(post);

        let response = self.coordinator.get(url).await?;
        let page = rewrite_page(&self.coordinator, &response.text(), &base, &to_root_dir(&storage_path)).await?;
        log::debug!("Captured {url} with {} stored references", page.urls.len());
        write_atomically(self.coordinator.disk_path(&storage_path), page.html.into_bytes()).await
    }

    async fn is_archived(&self, post: &Post) -> bool {
        file_exists(&self.coordinator.disk_path(&post_storage_path(post))).await
    }

    async fn store(&self, storage_path: &str, archived: &ArchivedPost) -> ResourceResult<()> {
        let bytes = serde_json::to_vec(archived)?;
        write_atomically(self.coordinator.disk_path(storage_path), bytes).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &std::path::Path) -> ResourceResult<T> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ResourceError::io(path.display(), &e))?;
    Ok(serde_json::from_slice(&bytes)?)
}
