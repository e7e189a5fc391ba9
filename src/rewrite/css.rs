//! CSS URL rewriting
//!
//! Stylesheets and inline `style` declaration lists are parsed with
//! lightningcss. Rewriting runs in three steps because the parsed tree
//! borrows the source text and cannot be held across an await: collect
//! the `url()` and `@import` references, resolve them all concurrently,
//! then parse again and substitute the stored paths before printing.

use std::collections::HashMap;
use std::convert::Infallible;

use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleAttribute, StyleSheet};
use lightningcss::values::url::Url as CssUrl;
use lightningcss::visit_types;
use lightningcss::visitor::{Visit, VisitTypes, Visitor};
use url::Url;

use super::{RewriteMap, resolve_references};
use crate::resources::coordinator::Lineage;
use crate::resources::{FetchCoordinator, ResourceError, ResourceResult};

/// Rewritten CSS text with the references that changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewrittenCss {
    pub text: String,
    pub urls: RewriteMap,
}

#[derive(Debug, Clone, Copy)]
enum CssSource {
    Stylesheet,
    Declarations,
}

/// Rewrite every reference in a stylesheet.
///
/// `to_root` leads from the stylesheet's own directory back to the archive
/// root. When nothing is rewritten the text is returned unchanged.
pub async fn rewrite_stylesheet(
    coordinator: &FetchCoordinator,
    css: &str,
    base: &Url,
    to_root: &str,
) -> ResourceResult<RewrittenCss> {
    rewrite(coordinator, CssSource::Stylesheet, css, base, to_root, &Lineage::default()).await
}

/// Rewrite every reference in an inline `style` declaration list
pub async fn rewrite_declarations(
    coordinator: &FetchCoordinator,
    style: &str,
    base: &Url,
    to_root: &str,
) -> ResourceResult<RewrittenCss> {
    rewrite(coordinator, CssSource::Declarations, style, base, to_root, &Lineage::default()).await
}

/// Stylesheet rewrite on behalf of a stylesheet that is itself being stored
pub(crate) async fn rewrite_stylesheet_from(
    coordinator: &FetchCoordinator,
    css: &str,
    base: &Url,
    to_root: &str,
    lineage: Lineage,
) -> ResourceResult<RewrittenCss> {
    rewrite(coordinator, CssSource::Stylesheet, css, base, to_root, &lineage).await
}

async fn rewrite(
    coordinator: &FetchCoordinator,
    source: CssSource,
    css: &str,
    base: &Url,
    to_root: &str,
    lineage: &Lineage,
) -> ResourceResult<RewrittenCss> {
    let references = collect_references(source, css)?;
    if references.is_empty() {
        return Ok(RewrittenCss {
            text: css.to_string(),
            urls: RewriteMap::new(),
        });
    }

    let urls = resolve_references(coordinator, references, base, to_root, lineage).await?;
    if urls.is_empty() {
        return Ok(RewrittenCss {
            text: css.to_string(),
            urls,
        });
    }

    let replacements: HashMap<&str, &str> =
        urls.iter().map(|(from, to)| (from.as_str(), to.as_str())).collect();
    let text = substitute(source, css, &replacements)?;
    Ok(RewrittenCss { text, urls })
}

/// Parse and print a stylesheet without changing any reference.
///
/// Shows the serializer's normalization, which is deterministic: normalizing
/// its own output gives the same text back.
pub fn normalize_stylesheet(css: &str) -> ResourceResult<String> {
    substitute(CssSource::Stylesheet, css, &HashMap::new())
}

fn parser_options<'i>() -> ParserOptions<'i> {
    ParserOptions {
        error_recovery: true,
        ..ParserOptions::default()
    }
}

fn parse_error(e: impl std::fmt::Display) -> ResourceError {
    ResourceError::Css(e.to_string())
}

fn collect_references(source: CssSource, css: &str) -> ResourceResult<Vec<String>> {
    let mut collector = UrlCollector::default();
    match source {
        CssSource::Stylesheet => {
            let mut sheet = StyleSheet::parse(css, parser_options()).map_err(parse_error)?;
            for rule in &sheet.rules.0 {
                if let CssRule::Import(import) = rule {
                    collector.urls.push(import.url.to_string());
                }
            }
            let _ = sheet.visit(&mut collector);
        }
        CssSource::Declarations => {
            let mut style = StyleAttribute::parse(css, parser_options()).map_err(parse_error)?;
            let _ = style.declarations.visit(&mut collector);
        }
    }
    Ok(collector.urls)
}

fn substitute(source: CssSource, css: &str, replacements: &HashMap<&str, &str>) -> ResourceResult<String> {
    let mut rewriter = UrlRewriter { replacements };
    let printed = match source {
        CssSource::Stylesheet => {
            let mut sheet = StyleSheet::parse(css, parser_options()).map_err(parse_error)?;
            for rule in &mut sheet.rules.0 {
                if let CssRule::Import(import) = rule {
                    if let Some(to) = replacements.get(&*import.url) {
                        import.url = to.to_string().into();
                    }
                }
            }
            let _ = sheet.visit(&mut rewriter);
            sheet.to_css(PrinterOptions::default()).map_err(parse_error)?
        }
        CssSource::Declarations => {
            let mut style = StyleAttribute::parse(css, parser_options()).map_err(parse_error)?;
            let _ = style.declarations.visit(&mut rewriter);
            style.to_css(PrinterOptions::default()).map_err(parse_error)?
        }
    };
    Ok(printed.code)
}

#[derive(Default)]
struct UrlCollector {
    urls: Vec<String>,
}

impl<'i> Visitor<'i> for UrlCollector {
    type Error = Infallible;

    fn visit_types(&self) -> VisitTypes {
        visit_types!(URLS)
    }

    fn visit_url(&mut self, url: &mut CssUrl<'i>) -> Result<(), Self::Error> {
        self.urls.push(url.url.to_string());
        Ok(())
    }
}

struct UrlRewriter<'a> {
    replacements: &'a HashMap<&'a str, &'a str>,
}

impl<'i> Visitor<'i> for UrlRewriter<'_> {
    type Error = Infallible;

    fn visit_types(&self) -> VisitTypes {
        visit_types!(URLS)
    }

    fn visit_url(&mut self, url: &mut CssUrl<'i>) -> Result<(), Self::Error> {
        if let Some(to) = self.replacements.get(&*url.url) {
            url.url = to.to_string().into();
        }
        Ok(())
    }
}
