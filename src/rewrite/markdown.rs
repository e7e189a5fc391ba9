//! Markdown image rewriting
//!
//! Bios, asks and comments are stored as markdown rather than rendered
//! trees. Image references are resolved against a fixed base, since a
//! markdown body has no URL of its own, and the document is re-serialized
//! as commonmark. The comrak arena is not `Send`, so parsing happens in
//! synchronous helpers on either side of the fetches.

use std::collections::HashMap;

use comrak::nodes::NodeValue;
use comrak::{Arena, Options, format_commonmark, parse_document};
use url::Url;

use super::{RewriteMap, resolve_references};
use crate::resources::coordinator::Lineage;
use crate::resources::{FetchCoordinator, ResourceError, ResourceResult};
use crate::utils::MARKDOWN_BASE_URL;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewrittenMarkdown {
    pub markdown: String,
    pub urls: RewriteMap,
}

/// Rewrite every image in `markdown` to its archived copy.
///
/// The text comes back unchanged when no image was stored.
pub async fn rewrite_markdown(
    coordinator: &FetchCoordinator,
    markdown: &str,
    to_root: &str,
) -> ResourceResult<RewrittenMarkdown> {
    let references = image_urls(markdown);
    if references.is_empty() {
        return Ok(unchanged(markdown));
    }

    let base = Url::parse(MARKDOWN_BASE_URL).map_err(|e| ResourceError::InvalidUrl {
        url: MARKDOWN_BASE_URL.to_string(),
        message: e.to_string(),
    })?;
    let urls = resolve_references(coordinator, references, &base, to_root, &Lineage::default()).await?;
    if urls.is_empty() {
        return Ok(unchanged(markdown));
    }

    let replacements: HashMap<&str, &str> =
        urls.iter().map(|(from, to)| (from.as_str(), to.as_str())).collect();
    let markdown = substitute(markdown, &replacements)?;
    Ok(RewrittenMarkdown { markdown, urls })
}

/// Parse and re-serialize without changing anything
pub fn normalize_markdown(markdown: &str) -> ResourceResult<String> {
    substitute(markdown, &HashMap::new())
}

fn unchanged(markdown: &str) -> RewrittenMarkdown {
    RewrittenMarkdown {
        markdown: markdown.to_string(),
        urls: RewriteMap::new(),
    }
}

fn enable_gfm(options: &mut Options) {
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
}

fn image_urls(markdown: &str) -> Vec<String> {
    let arena = Arena::new();
    let mut options = Options::default();
    enable_gfm(&mut options);
    let root = parse_document(&arena, markdown, &options);

    root.descendants()
        .filter_map(|node| match &node.data.borrow().value {
            NodeValue::Image(link) => Some(link.url.clone()),
            _ => None,
        })
        .filter(|url| !url.is_empty())
        .collect()
}

fn substitute(markdown: &str, replacements: &HashMap<&str, &str>) -> ResourceResult<String> {
    let arena = Arena::new();
    let mut options = Options::default();
    enable_gfm(&mut options);
    let root = parse_document(&arena, markdown, &options);

    for node in root.descendants() {
        if let NodeValue::Image(link) = &mut node.data.borrow_mut().value {
            if let Some(to) = replacements.get(link.url.as_str()) {
                link.url = (*to).to_string();
            }
        }
    }

    let mut output = Vec::new();
    format_commonmark(root, &options, &mut output).map_err(|e| ResourceError::Markdown(e.to_string()))?;
    String::from_utf8(output).map_err(|e| ResourceError::Markdown(e.to_string()))
}
