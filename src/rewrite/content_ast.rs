//! URL rewriting for rendered post content trees
//!
//! A tree is walked twice. The first pass collects inline styles and
//! resource references, which are then resolved concurrently. The second
//! pass applies the results to a copy of the tree:
//!
//! - `style` on any element is rewritten as a CSS declaration list
//! - `src` on `img`, `audio`, `video` and `source`
//! - every candidate of `srcset` on `img` and `source`
//! - `url` on `CustomEmoji`; emoji served from the platform's static assets
//!   are shortened to a host-relative path instead of being stored

use std::collections::HashMap;

use futures::future::try_join_all;
use url::Url;

use super::css::rewrite_declarations;
use super::srcset::{rewrite_srcset, urls_in_srcset};
use super::{RewriteMap, merge, resolve_references};
use crate::model::{AstElement, AstNode};
use crate::resources::coordinator::Lineage;
use crate::resources::{FetchCoordinator, ResourceResult};
use crate::utils::{PRIMARY_ORIGIN, STATIC_ASSET_PREFIX, resolve_https};

const SRC_TAGS: &[&str] = &["img", "audio", "video", "source"];
const SRCSET_TAGS: &[&str] = &["img", "source"];
const CUSTOM_EMOJI: &str = "CustomEmoji";

/// Rewrite a serialized tree, as stored in a post's `astMap` spans.
///
/// A string that does not hold a valid tree is a data error. The string is
/// returned unchanged when nothing in it was rewritten.
pub async fn rewrite_serialized_ast(
    coordinator: &FetchCoordinator,
    ast: &str,
    base: &Url,
    to_root: &str,
) -> ResourceResult<(String, RewriteMap)> {
    let node: AstNode = serde_json::from_str(ast)?;
    let (rewritten, urls) = rewrite_ast(coordinator, &node, base, to_root).await?;
    if urls.is_empty() {
        return Ok((ast.to_string(), urls));
    }
    Ok((serde_json::to_string(&rewritten)?, urls))
}

/// Rewrite a tree, returning the rewritten copy and what changed
pub async fn rewrite_ast(
    coordinator: &FetchCoordinator,
    node: &AstNode,
    base: &Url,
    to_root: &str,
) -> ResourceResult<(AstNode, RewriteMap)> {
    let mut found = References::default();
    found.collect(node, base);

    let style_rewrites = try_join_all(found.styles.iter().map(|style| async move {
        let rewritten = rewrite_declarations(coordinator, style, base, to_root).await?;
        ResourceResult::Ok((style.clone(), rewritten))
    }))
    .await?;
    let urls = resolve_references(coordinator, found.urls, base, to_root, &Lineage::default()).await?;

    let mut map = RewriteMap::new();
    let mut styles = HashMap::new();
    for (style, rewritten) in style_rewrites {
        if !rewritten.urls.is_empty() {
            merge(&mut map, rewritten.urls);
            styles.insert(style, rewritten.text);
        }
    }
    merge(&mut map, urls.clone());

    let replacements = Replacements {
        styles: &styles,
        urls: &urls,
        base,
    };
    let mut rewritten = node.clone();
    replacements.apply(&mut rewritten, &mut map);
    Ok((rewritten, map))
}

#[derive(Default)]
struct References {
    styles: Vec<String>,
    urls: Vec<String>,
}

impl References {
    fn collect(&mut self, node: &AstNode, base: &Url) {
        if let AstNode::Element(element) = node {
            self.collect_element(element, base);
        }
        for child in node.children() {
            self.collect(child, base);
        }
    }

    fn collect_element(&mut self, element: &AstElement, base: &Url) {
        if let Some(style) = element.property("style") {
            if !self.styles.iter().any(|s| s == style) {
                self.styles.push(style.to_string());
            }
        }

        let tag = element.tag_name.as_str();
        if SRC_TAGS.contains(&tag) {
            if let Some(src) = element.property("src") {
                self.urls.push(src.to_string());
            }
        }
        if SRCSET_TAGS.contains(&tag) {
            if let Some(srcset) = element.property("srcset") {
                self.urls.extend(urls_in_srcset(srcset));
            }
        }
        if tag == CUSTOM_EMOJI {
            if let Some(url) = element.property("url") {
                if static_asset_path(url, base).is_none() {
                    self.urls.push(url.to_string());
                }
            }
        }
    }
}

struct Replacements<'a> {
    styles: &'a HashMap<String, String>,
    urls: &'a RewriteMap,
    base: &'a Url,
}

impl Replacements<'_> {
    fn apply(&self, node: &mut AstNode, map: &mut RewriteMap) {
        if let AstNode::Element(element) = node {
            self.apply_element(element, map);
        }
        if let Some(children) = node.children_mut() {
            for child in children {
                self.apply(child, map);
            }
        }
    }

    fn apply_element(&self, element: &mut AstElement, map: &mut RewriteMap) {
        if let Some(style) = element.property("style").and_then(|s| self.styles.get(s)) {
            let style = style.clone();
            element.set_property("style", style);
        }

        let tag = element.tag_name.clone();
        if SRC_TAGS.contains(&tag.as_str()) {
            if let Some(to) = element.property("src").and_then(|src| self.urls.get(src)) {
                let to = to.clone();
                element.set_property("src", to);
            }
        }
        if SRCSET_TAGS.contains(&tag.as_str()) {
            if let Some(to) = element.property("srcset").and_then(|s| rewrite_srcset(s, self.urls)) {
                element.set_property("srcset", to);
            }
        }
        if tag == CUSTOM_EMOJI {
            let Some(url) = element.property("url").map(str::to_string) else {
                return;
            };
            if let Some(path) = static_asset_path(&url, self.base) {
                map.insert(url, path.clone());
                element.set_property("url", path);
            } else if let Some(to) = self.urls.get(&url) {
                let to = to.clone();
                element.set_property("url", to);
            }
        }
    }
}

/// Host-relative path for a reference into the platform's static assets
fn static_asset_path(reference: &str, base: &Url) -> Option<String> {
    let resolved = resolve_https(reference, base)?;
    resolved
        .as_str()
        .starts_with(STATIC_ASSET_PREFIX)
        .then(|| resolved.as_str()[PRIMARY_ORIGIN.len()..].to_string())
}
