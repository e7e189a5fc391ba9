//! Liked posts of the logged-in page
//!
//! There is no API query for likes, so the liked-posts page itself is
//! loaded and its embedded loader state read.

use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;

use crate::model::Post;
use crate::resources::{FetchCoordinator, ResourceError, ResourceResult};
use crate::utils::PRIMARY_ORIGIN;

const LOADER_STATE_SELECTOR: &str = "script#__COHOST_LOADER_STATE__";
const LIKED_POSTS_STATE: &str = "liked-posts-feed";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LikedPostsFeed {
    pagination_mode: PaginationMode,
    posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaginationMode {
    ideal_page_stride: u64,
    ref_timestamp: u64,
    more_pages_forward: bool,
}

pub async fn load_all_liked_posts(coordinator: &FetchCoordinator) -> ResourceResult<Vec<Post>> {
    let mut posts = Vec::new();
    let mut ref_timestamp: Option<u64> = None;
    let mut skip_posts = 0;

    loop {
        let url = liked_page_url(ref_timestamp, skip_posts);
        let html = coordinator.get(&url).await?.text();
        let feed: LikedPostsFeed = serde_json::from_value(loader_state(&html, LIKED_POSTS_STATE)?)?;

        skip_posts += feed.pagination_mode.ideal_page_stride;
        ref_timestamp = Some(feed.pagination_mode.ref_timestamp);
        let empty = feed.posts.is_empty();
        posts.extend(feed.posts);
        log::debug!("Loaded {} liked posts so far", posts.len());

        if empty || !feed.pagination_mode.more_pages_forward {
            break;
        }
    }

    Ok(posts)
}

fn liked_page_url(ref_timestamp: Option<u64>, skip_posts: u64) -> String {
    let mut params = Vec::new();
    if let Some(ts) = ref_timestamp.filter(|ts| *ts != 0) {
        params.push(format!("refTimestamp={ts}"));
    }
    if skip_posts != 0 {
        params.push(format!("skipPosts={skip_posts}"));
    }
    format!("{PRIMARY_ORIGIN}/rc/liked-posts?{}", params.join("&"))
}

/// Read one named entry of a page's embedded loader state
pub(crate) fn loader_state(html: &str, name: &str) -> ResourceResult<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(LOADER_STATE_SELECTOR)
        .map_err(|e| ResourceError::Data(format!("invalid selector: {e}")))?;
    let script = document
        .select(&selector)
        .next()
        .ok_or_else(|| ResourceError::Data("page has no loader state".to_string()))?;

    let mut state: Value = serde_json::from_str(&script.text().collect::<String>())?;
    state
        .get_mut(name)
        .map(Value::take)
        .ok_or_else(|| ResourceError::Data(format!("loader state has no {name}")))
}
