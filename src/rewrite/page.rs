//! Post page capture
//!
//! The rendered page of a post is archived next to its JSON file. Every
//! `<link href>` (stylesheets, icons), every `<img src>` and the inline
//! styles of the post body are stored through the coordinator. References
//! are gathered with scraper, resolved concurrently, then substituted in one
//! streaming pass with lol_html, which leaves the rest of the document as it
//! was served.

use std::collections::HashMap;

use futures::future::try_join_all;
use lol_html::{HtmlRewriter, Settings, element};
use scraper::{Html, Selector};
use url::Url;

use super::css::rewrite_declarations;
use super::{RewriteMap, merge, resolve_references};
use crate::resources::coordinator::Lineage;
use crate::resources::{FetchCoordinator, ResourceError, ResourceResult};

const LINK_SELECTOR: &str = "link[href]";
const IMAGE_SELECTOR: &str = "img[src]";
const POST_BODY_STYLE_SELECTOR: &str = "[data-post-body][class][style]";
const POST_BODY_DESCENDANT_STYLE_SELECTOR: &str = "[data-post-body][class] [style]";

/// Rewritten page with every reference that changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewrittenPage {
    pub html: String,
    pub urls: RewriteMap,
}

/// Rewrite a post page so its links, images and post body styles load
/// from the archive.
///
/// A stored image loses its `srcset`: the other candidates are not in the
/// archive. `to_root` leads from the page's directory back to the archive
/// root. When nothing is rewritten the page is returned unchanged.
pub async fn rewrite_page(
    coordinator: &FetchCoordinator,
    html: &str,
    base: &Url,
    to_root: &str,
) -> ResourceResult<RewrittenPage> {
    let found = PageReferences::collect(html)?;

    let style_rewrites = try_join_all(found.styles.iter().map(|style| async move {
        let rewritten = rewrite_declarations(coordinator, style, base, to_root).await?;
        ResourceResult::Ok((style.clone(), rewritten))
    }));
    let references = found.links.iter().chain(&found.images).cloned();
    let lineage = Lineage::default();
    let urls = resolve_references(coordinator, references, base, to_root, &lineage);
    let (style_rewrites, urls) = futures::try_join!(style_rewrites, urls)?;

    let mut map = urls.clone();
    let mut styles = HashMap::new();
    for (style, rewritten) in style_rewrites {
        if !rewritten.urls.is_empty() {
            merge(&mut map, rewritten.urls);
            styles.insert(style, rewritten.text);
        }
    }
    if map.is_empty() {
        return Ok(RewrittenPage {
            html: html.to_string(),
            urls: map,
        });
    }

    let html = substitute(html, &urls, &styles)?;
    Ok(RewrittenPage { html, urls: map })
}

#[derive(Debug, Default)]
struct PageReferences {
    links: Vec<String>,
    images: Vec<String>,
    styles: Vec<String>,
}

impl PageReferences {
    fn collect(html: &str) -> ResourceResult<Self> {
        let document = Html::parse_document(html);
        let attribute_values = |selector: &str, name: &str| -> ResourceResult<Vec<String>> {
            let selector = Selector::parse(selector).map_err(|e| ResourceError::Html(e.to_string()))?;
            Ok(document
                .select(&selector)
                .filter_map(|el| el.value().attr(name))
                .map(str::to_string)
                .collect())
        };

        let mut styles = attribute_values(POST_BODY_STYLE_SELECTOR, "style")?;
        for style in attribute_values(POST_BODY_DESCENDANT_STYLE_SELECTOR, "style")? {
            if !styles.contains(&style) {
                styles.push(style);
            }
        }

        Ok(Self {
            links: attribute_values(LINK_SELECTOR, "href")?,
            images: attribute_values(IMAGE_SELECTOR, "src")?,
            styles,
        })
    }
}

fn substitute(html: &str, urls: &RewriteMap, styles: &HashMap<String, String>) -> ResourceResult<String> {
    let mut output = Vec::with_capacity(html.len());

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!(LINK_SELECTOR, |el| {
                    if let Some(to) = el.get_attribute("href").and_then(|href| urls.get(&href)) {
                        el.set_attribute("href", to)?;
                    }
                    Ok(())
                }),
                element!(IMAGE_SELECTOR, |el| {
                    if let Some(to) = el.get_attribute("src").and_then(|src| urls.get(&src)) {
                        el.set_attribute("src", to)?;
                        el.remove_attribute("srcset");
                    }
                    Ok(())
                }),
                element!(POST_BODY_STYLE_SELECTOR, |el| {
                    if let Some(to) = el.get_attribute("style").and_then(|style| styles.get(&style)) {
                        el.set_attribute("style", to)?;
                    }
                    Ok(())
                }),
                // A nested post body matches both selectors; the second
                // lookup sees the rewritten text and leaves it alone.
                element!(POST_BODY_DESCENDANT_STYLE_SELECTOR, |el| {
                    if let Some(to) = el.get_attribute("style").and_then(|style| styles.get(&style)) {
                        el.set_attribute("style", to)?;
                    }
                    Ok(())
                }),
            ],
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter
        .write(html.as_bytes())
        .map_err(|e| ResourceError::Html(e.to_string()))?;
    rewriter.end().map_err(|e| ResourceError::Html(e.to_string()))?;

    String::from_utf8(output).map_err(|e| ResourceError::Html(e.to_string()))
}
