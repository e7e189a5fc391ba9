//! Comment rewriting: the poster, the markdown body, and every reply

use futures::future::{BoxFuture, FutureExt, try_join_all};

use super::markdown::rewrite_markdown;
use super::project::rewrite_project;
use super::{RewriteMap, merge};
use crate::model::Comment;
use crate::resources::{FetchCoordinator, ResourceResult};

pub fn rewrite_comment<'a>(
    coordinator: &'a FetchCoordinator,
    comment: &'a Comment,
    to_root: &'a str,
) -> BoxFuture<'a, ResourceResult<(Comment, RewriteMap)>> {
    async move {
        let mut rewritten = comment.clone();
        let mut map = RewriteMap::new();

        if let Some(poster) = &comment.poster {
            let (poster, urls) = rewrite_project(coordinator, poster, to_root).await?;
            rewritten.poster = Some(poster);
            merge(&mut map, urls);
        }

        if !comment.comment.body.is_empty() {
            let body = rewrite_markdown(coordinator, &comment.comment.body, to_root).await?;
            rewritten.comment.body = body.markdown;
            merge(&mut map, body.urls);
        }

        let children = try_join_all(
            comment
                .comment
                .children
                .iter()
                .map(|child| rewrite_comment(coordinator, child, to_root)),
        )
        .await?;
        rewritten.comment.children = children
            .into_iter()
            .map(|(child, urls)| {
                merge(&mut map, urls);
                child
            })
            .collect();

        Ok((rewritten, map))
    }
    .boxed()
}
