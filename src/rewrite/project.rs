//! Project rewriting: avatar and header images plus the markdown bio

use futures::future::try_join_all;
use url::Url;

use super::markdown::rewrite_markdown;
use super::{RewriteMap, merge, resolve_reference};
use crate::model::{AskingProject, Project};
use crate::resources::{FetchCoordinator, ResourceError, ResourceResult};
use crate::utils::PRIMARY_ORIGIN;

/// Rewrite a project's images and bio.
///
/// `to_root` leads from the page the project is shown on back to the
/// archive root.
pub async fn rewrite_project(
    coordinator: &FetchCoordinator,
    project: &Project,
    to_root: &str,
) -> ResourceResult<(Project, RewriteMap)> {
    let base = primary_base()?;
    let mut rewritten = project.clone();
    let mut map = RewriteMap::new();

    let images = [
        Some(project.avatar_url.as_str()),
        Some(project.avatar_preview_url.as_str()),
        project.header_url.as_deref(),
        project.header_preview_url.as_deref(),
    ];
    let stored = rewrite_images(coordinator, &images, &base, to_root).await?;
    let [avatar, avatar_preview, header, header_preview] = stored;

    if let Some(to) = avatar {
        map.insert(project.avatar_url.clone(), to.clone());
        rewritten.avatar_url = to;
    }
    if let Some(to) = avatar_preview {
        map.insert(project.avatar_preview_url.clone(), to.clone());
        rewritten.avatar_preview_url = to;
    }
    if let (Some(from), Some(to)) = (&project.header_url, header) {
        map.insert(from.clone(), to.clone());
        rewritten.header_url = Some(to);
    }
    if let (Some(from), Some(to)) = (&project.header_preview_url, header_preview) {
        map.insert(from.clone(), to.clone());
        rewritten.header_preview_url = Some(to);
    }

    if !project.description.is_empty() {
        let description = rewrite_markdown(coordinator, &project.description, to_root).await?;
        rewritten.description = description.markdown;
        merge(&mut map, description.urls);
    }

    Ok((rewritten, map))
}

/// Rewrite the avatar of the project that sent an ask
pub async fn rewrite_asking_project(
    coordinator: &FetchCoordinator,
    project: &AskingProject,
    to_root: &str,
) -> ResourceResult<(AskingProject, RewriteMap)> {
    let base = primary_base()?;
    let mut rewritten = project.clone();
    let mut map = RewriteMap::new();

    let images = [
        Some(project.avatar_url.as_str()),
        Some(project.avatar_preview_url.as_str()),
    ];
    let [avatar, avatar_preview] = rewrite_images(coordinator, &images, &base, to_root).await?;
    if let Some(to) = avatar {
        map.insert(project.avatar_url.clone(), to.clone());
        rewritten.avatar_url = to;
    }
    if let Some(to) = avatar_preview {
        map.insert(project.avatar_preview_url.clone(), to.clone());
        rewritten.avatar_preview_url = to;
    }

    Ok((rewritten, map))
}

async fn rewrite_images<const N: usize>(
    coordinator: &FetchCoordinator,
    images: &[Option<&str>; N],
    base: &Url,
    to_root: &str,
) -> ResourceResult<[Option<String>; N]> {
    let stored = try_join_all(images.iter().map(|image| async move {
        match image {
            Some(url) if !url.is_empty() => resolve_reference(coordinator, url, base, to_root).await,
            _ => Ok(None),
        }
    }))
    .await?;

    stored
        .try_into()
        .map_err(|_| ResourceError::Data("image count changed while rewriting".to_string()))
}

fn primary_base() -> ResourceResult<Url> {
    Url::parse(PRIMARY_ORIGIN).map_err(|e| ResourceError::InvalidUrl {
        url: PRIMARY_ORIGIN.to_string(),
        message: e.to_string(),
    })
}
