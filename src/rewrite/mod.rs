//! URL rewriting for archived content
//!
//! Every rewriter follows the same contract: a reference is resolved against
//! a base URL; only `https:` results are fetched; a stored resource replaces
//! the reference with a path relative to the document's location in the
//! archive; anything that could not be stored keeps its original reference.
//! Fatal fetch errors are passed through untouched.
//!
//! Rewriters never mutate their input. They return a rewritten copy along
//! with a [`RewriteMap`] from original reference to replacement.

pub mod comment;
pub mod content_ast;
pub mod css;
pub mod markdown;
pub mod page;
pub mod post;
pub mod project;
pub mod srcset;

use std::collections::BTreeMap;

use futures::future::try_join_all;
use url::Url;

use crate::resources::coordinator::Lineage;
use crate::resources::{FetchCoordinator, ResourceResult};
use crate::utils::{relative_reference, resolve_https};

/// Original reference → rewritten relative reference
pub type RewriteMap = BTreeMap<String, String>;

pub use comment::rewrite_comment;
pub use css::{rewrite_declarations, rewrite_stylesheet};
pub use markdown::rewrite_markdown;
pub use page::{RewrittenPage, rewrite_page};
pub use post::{RewriteData, rewrite_post};
pub use project::rewrite_project;

/// Resolve and store every reference concurrently.
///
/// The result only contains references that ended up in the archive.
pub(crate) async fn resolve_references<I>(
    coordinator: &FetchCoordinator,
    references: I,
    base: &Url,
    to_root: &str,
    lineage: &Lineage,
) -> ResourceResult<RewriteMap>
where
    I: IntoIterator<Item = String>,
{
    let mut unique: Vec<String> = references.into_iter().collect();
    unique.sort();
    unique.dedup();

    let lookups = unique.into_iter().filter_map(|reference| {
        let resolved = resolve_https(&reference, base)?;
        let pending = coordinator.resolve_from(resolved.as_str(), lineage.clone());
        Some(async move { pending.await.map(|stored| (reference, stored)) })
    });

    let resolved = try_join_all(lookups).await?;
    Ok(resolved
        .into_iter()
        .filter_map(|(reference, stored)| {
            stored.map(|path| (reference, stored_reference(coordinator, to_root, &path)))
        })
        .collect())
}

/// Resolve a single reference; `None` when it is left as is
pub(crate) async fn resolve_reference(
    coordinator: &FetchCoordinator,
    reference: &str,
    base: &Url,
    to_root: &str,
) -> ResourceResult<Option<String>> {
    let Some(resolved) = resolve_https(reference, base) else {
        return Ok(None);
    };
    let stored = coordinator.resolve(resolved.as_str()).await?;
    Ok(stored.map(|path| stored_reference(coordinator, to_root, &path)))
}

/// Reference to a stored file, named as it is on disk
fn stored_reference(coordinator: &FetchCoordinator, to_root: &str, storage_path: &str) -> String {
    relative_reference(to_root, &coordinator.policy().clean_path(storage_path))
}

/// Merge `from` into `into`; later entries win
pub(crate) fn merge(into: &mut RewriteMap, from: RewriteMap) {
    into.extend(from);
}
