//! All posts of one project, via `posts.profilePosts`

use serde::{Deserialize, Serialize};

use super::trpc_query;
use crate::model::Post;
use crate::resources::{FetchCoordinator, ResourceResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfilePostsInput<'a> {
    project_handle: &'a str,
    page: u64,
    options: ProfilePostsOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfilePostsOptions {
    hide_asks: bool,
    hide_replies: bool,
    hide_shares: bool,
    pinned_posts_at_top: bool,
    viewing_on_project_page: bool,
}

impl Default for ProfilePostsOptions {
    fn default() -> Self {
        Self {
            hide_asks: false,
            hide_replies: false,
            hide_shares: false,
            pinned_posts_at_top: true,
            viewing_on_project_page: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProfilePosts {
    pagination: Pagination,
    posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pagination {
    /// Not reliable on its own, see [`load_all_project_posts`]
    more_pages_forward: bool,
    next_page: Option<u64>,
}

/// Load every post of `handle`, page by page.
///
/// The API's `morePagesForward` flag has been seen to stay true past the
/// last page, so loading also stops at the first page without posts.
pub async fn load_all_project_posts(coordinator: &FetchCoordinator, handle: &str) -> ResourceResult<Vec<Post>> {
    let mut posts = Vec::new();
    let mut page = 0;

    loop {
        let input = ProfilePostsInput {
            project_handle: handle,
            page,
            options: ProfilePostsOptions::default(),
        };
        let result: ProfilePosts = trpc_query(coordinator, "posts.profilePosts", &input).await?;
        let empty = result.posts.is_empty();
        posts.extend(result.posts);
        log::debug!("Loaded page {page} of @{handle}, {} posts so far", posts.len());

        if empty || !result.pagination.more_pages_forward {
            break;
        }
        page = result.pagination.next_page.unwrap_or(page + 1);
    }

    Ok(posts)
}
