//! Post rewriting
//!
//! Walks the whole post object graph: posting and related projects, every
//! block, every rendered span, and recursively every post of the share
//! tree. Each child's rewrite map is merged into the parent's.

use futures::future::{BoxFuture, FutureExt, try_join_all};
use serde::{Deserialize, Serialize};
use url::Url;

use super::content_ast::rewrite_serialized_ast;
use super::markdown::rewrite_markdown;
use super::project::{rewrite_asking_project, rewrite_project};
use super::{RewriteMap, merge, resolve_reference};
use crate::model::{Ask, Attachment, AttachmentWrapper, Post, PostBlock};
use crate::resources::{FetchCoordinator, ResourceError, ResourceResult};

/// Sidecar stored with each post page for client-side rewriting of
/// references discovered at render time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewriteData {
    /// The post's canonical URL, which relative references resolve against
    pub base: String,
    /// Original reference → archived relative reference
    pub urls: RewriteMap,
}

/// Rewrite every resource reference of a post and its share tree.
///
/// `to_root` leads from the post's page back to the archive root. The input
/// is left untouched; fatal fetch errors abort the whole rewrite.
pub fn rewrite_post<'a>(
    coordinator: &'a FetchCoordinator,
    post: &'a Post,
    to_root: &'a str,
) -> BoxFuture<'a, ResourceResult<(Post, RewriteData)>> {
    async move {
        let base = Url::parse(&post.single_post_page_url).map_err(|e| ResourceError::InvalidUrl {
            url: post.single_post_page_url.clone(),
            message: e.to_string(),
        })?;

        let projects = try_join_all(
            std::iter::once(&post.posting_project)
                .chain(&post.related_projects)
                .map(|project| rewrite_project(coordinator, project, to_root)),
        );
        let blocks = try_join_all(
            post.blocks
                .iter()
                .map(|block| rewrite_block(coordinator, block, &base, to_root)),
        );
        let spans = try_join_all(
            post.ast_map
                .spans
                .iter()
                .map(|span| rewrite_serialized_ast(coordinator, &span.ast, &base, to_root)),
        );
        let shares = try_join_all(
            post.share_tree
                .iter()
                .map(|shared| rewrite_post(coordinator, shared, to_root)),
        );
        let (projects, blocks, spans, shares) = futures::try_join!(projects, blocks, spans, shares)?;

        let mut rewritten = post.clone();
        let mut urls = RewriteMap::new();

        let mut projects = projects.into_iter();
        if let Some((posting_project, map)) = projects.next() {
            rewritten.posting_project = posting_project;
            merge(&mut urls, map);
        }
        rewritten.related_projects = projects
            .map(|(project, map)| {
                merge(&mut urls, map);
                project
            })
            .collect();

        rewritten.blocks = blocks
            .into_iter()
            .map(|(block, map)| {
                merge(&mut urls, map);
                block
            })
            .collect();

        for (span, (ast, map)) in rewritten.ast_map.spans.iter_mut().zip(spans) {
            span.ast = ast;
            merge(&mut urls, map);
        }

        rewritten.share_tree = shares
            .into_iter()
            .map(|(shared, data)| {
                merge(&mut urls, data.urls);
                shared
            })
            .collect();

        let data = RewriteData {
            base: post.single_post_page_url.clone(),
            urls,
        };
        Ok((rewritten, data))
    }
    .boxed()
}

async fn rewrite_block(
    coordinator: &FetchCoordinator,
    block: &PostBlock,
    base: &Url,
    to_root: &str,
) -> ResourceResult<(PostBlock, RewriteMap)> {
    match block {
        PostBlock::Markdown { markdown } => {
            let rewritten = rewrite_markdown(coordinator, &markdown.content, to_root).await?;
            let mut markdown = markdown.clone();
            markdown.content = rewritten.markdown;
            Ok((PostBlock::Markdown { markdown }, rewritten.urls))
        }
        PostBlock::Ask { ask } => {
            let (ask, map) = rewrite_ask(coordinator, ask, to_root).await?;
            Ok((PostBlock::Ask { ask }, map))
        }
        PostBlock::Attachment { attachment } => {
            let (attachment, map) = rewrite_attachment(coordinator, attachment, base, to_root).await?;
            Ok((PostBlock::Attachment { attachment }, map))
        }
        PostBlock::AttachmentRow { attachments } => {
            let rewritten = try_join_all(
                attachments
                    .iter()
                    .map(|item| rewrite_attachment(coordinator, &item.attachment, base, to_root)),
            )
            .await?;
            let mut map = RewriteMap::new();
            let attachments = rewritten
                .into_iter()
                .map(|(attachment, urls)| {
                    merge(&mut map, urls);
                    AttachmentWrapper { attachment }
                })
                .collect();
            Ok((PostBlock::AttachmentRow { attachments }, map))
        }
    }
}

async fn rewrite_ask(
    coordinator: &FetchCoordinator,
    ask: &Ask,
    to_root: &str,
) -> ResourceResult<(Ask, RewriteMap)> {
    let mut rewritten = ask.clone();
    let mut map = RewriteMap::new();

    if let Some(project) = &ask.asking_project {
        let (project, urls) = rewrite_asking_project(coordinator, project, to_root).await?;
        rewritten.asking_project = Some(project);
        merge(&mut map, urls);
    }
    if !ask.content.is_empty() {
        let content = rewrite_markdown(coordinator, &ask.content, to_root).await?;
        rewritten.content = content.markdown;
        merge(&mut map, content.urls);
    }

    Ok((rewritten, map))
}

/// Both the file and the preview point at the stored file; previews are
/// not archived separately.
async fn rewrite_attachment(
    coordinator: &FetchCoordinator,
    attachment: &Attachment,
    base: &Url,
    to_root: &str,
) -> ResourceResult<(Attachment, RewriteMap)> {
    let mut rewritten = attachment.clone();
    let mut map = RewriteMap::new();

    if !attachment.file_url.is_empty() {
        if let Some(to) = resolve_reference(coordinator, &attachment.file_url, base, to_root).await? {
            map.insert(attachment.file_url.clone(), to.clone());
            rewritten.file_url = to.clone();
            rewritten.preview_url = to;
        }
    }

    Ok((rewritten, map))
}
