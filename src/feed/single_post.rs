//! One post with its comments, via `posts.singlePost`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use super::trpc_query;
use crate::model::{Comment, Post};
use crate::resources::{FetchCoordinator, ResourceError, ResourceResult};
use crate::utils::PRIMARY_HOST;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SinglePostInput<'a> {
    handle: &'a str,
    post_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinglePost {
    pub post: Post,
    /// Comments keyed by the ID of the post (in the share tree) they were left on
    #[serde(default)]
    pub comments: BTreeMap<u64, Vec<Comment>>,
}

pub async fn load_single_post(coordinator: &FetchCoordinator, handle: &str, post_id: u64) -> ResourceResult<SinglePost> {
    trpc_query(coordinator, "posts.singlePost", &SinglePostInput { handle, post_id }).await
}

/// Split a post page URL (`https://cohost.org/<handle>/post/<id>-<slug>`)
/// into handle and post ID
///
/// The `/post` segment may be left out, as in hand-written config files.
pub fn parse_post_url(url: &str) -> ResourceResult<(String, u64)> {
    let invalid = |message: &str| ResourceError::InvalidUrl {
        url: url.to_string(),
        message: message.to_string(),
    };
    let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
    if parsed.host_str() != Some(PRIMARY_HOST) {
        return Err(invalid("not a post on the primary host"));
    }

    let segments: Vec<&str> = parsed.path_segments().map(Iterator::collect).unwrap_or_default();
    match segments.as_slice() {
        [handle, "post", slug, ..] | [handle, slug] if !handle.is_empty() => {
            let id = slug.split('-').next().unwrap_or_default();
            let post_id = id.parse().map_err(|_| invalid("post ID is not a number"))?;
            Ok(((*handle).to_string(), post_id))
        }
        _ => Err(invalid("not a post URL")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_post_page_urls() {
        assert_eq!(
            parse_post_url("https://cohost.org/example/post/123456-example-post?page=2").expect("valid"),
            ("example".to_string(), 123456)
        );
        assert_eq!(
            parse_post_url("https://cohost.org/example/123456-example-post").expect("valid"),
            ("example".to_string(), 123456)
        );
        assert_eq!(
            parse_post_url("https://cohost.org/a/post/42-x").expect("valid"),
            ("a".to_string(), 42)
        );
        assert!(parse_post_url("https://cohost.org/example").is_err());
        assert!(parse_post_url("https://example.com/a/post/42-x").is_err());
        assert!(parse_post_url("https://cohost.org/a/post/slug-only").is_err());
    }
}
