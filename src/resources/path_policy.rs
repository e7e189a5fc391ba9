//! Mapping from URLs to fetch targets and archive storage paths
//!
//! Classification is a pure function of the URL and the deny list: no I/O,
//! and the same URL always maps to the same [`ResourceRequest`]. Mapping a
//! storage path to a concrete on-disk location (including Windows file name
//! sanitization) is a separate step, see [`PathPolicy::disk_path`].

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use url::Url;

use super::extensions::{has_known_extension, longest_known_extension};
use crate::utils::{
    CDN_HOST, CDN_ORIGIN, EXTERNAL_CACHE_DIR, MAX_FILE_NAME_LENGTH_ON_DISK, MAX_FILE_NAME_LENGTH_UTF8,
    PRIMARY_HOST, RESOURCE_CACHE_DIR, WINDOWS_FORBIDDEN_CHARS,
};

/// What to fetch for a URL and where to keep it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    /// URL actually requested over HTTP
    pub fetch_url: String,
    /// `/`-separated path relative to the archive root, without any inferred extension
    pub storage_path: String,
    /// Whether a failed fetch is tolerable (resolves to nothing) rather than fatal
    pub fallible: bool,
    /// Whether the extension must be inferred from the response content type
    pub needs_extension_inference: bool,
}

/// Storage policy for one archive
#[derive(Debug, Clone)]
pub struct PathPolicy {
    do_not_fetch_hostnames: Vec<String>,
    windows: bool,
}

impl Default for PathPolicy {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PathPolicy {
    #[must_use]
    pub fn new(do_not_fetch_hostnames: Vec<String>) -> Self {
        Self {
            do_not_fetch_hostnames,
            windows: cfg!(windows),
        }
    }

    /// Override the host platform flag used when building on-disk paths
    #[must_use]
    pub fn with_windows_paths(mut self, windows: bool) -> Self {
        self.windows = windows;
        self
    }

    /// Decide whether and how a URL is archived.
    ///
    /// Returns `None` for URLs that are never fetched: anything that is not
    /// `https:`, deny-listed hosts, and unparsable input.
    #[must_use]
    pub fn classify(&self, url: &str) -> Option<ResourceRequest> {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::debug!("IGNORING URL {url}: {e}");
                return None;
            }
        };
        let host = parsed.host_str().unwrap_or_default();

        let (fetch_url, storage_path, fallible) =
            if host == CDN_HOST && is_cdn_resource_path(parsed.path()) {
                (
                    format!("{CDN_ORIGIN}{}", parsed.path()),
                    format!("{RESOURCE_CACHE_DIR}{}", decode_path(parsed.path())),
                    false,
                )
            } else if host == PRIMARY_HOST {
                let decoded = decode_path(parsed.path());
                let path = decoded.trim_start_matches('/');
                if path.is_empty() {
                    log::debug!("IGNORING URL {url}: no path to store");
                    return None;
                }
                (url.to_string(), path.to_string(), false)
            } else if parsed.scheme() == "https"
                && !host.is_empty()
                && !self.do_not_fetch_hostnames.iter().any(|h| h == host)
            {
                (url.to_string(), external_storage_path(&parsed), true)
            } else {
                log::warn!("IGNORING URL {url}");
                return None;
            };

        let storage_path = sanitize_segments(&storage_path);
        let needs_extension_inference = !has_known_extension(&storage_path);
        let storage_path = if needs_extension_inference {
            reserve_extension_room(&storage_path)
        } else {
            storage_path
        };

        Some(ResourceRequest {
            fetch_url,
            storage_path,
            fallible,
            needs_extension_inference,
        })
    }

    /// Storage path as it is named on this platform
    ///
    /// On Windows, characters that are illegal in file names are replaced
    /// with `-`. References to stored files must be built from this form.
    #[must_use]
    pub fn clean_path<'a>(&self, storage_path: &'a str) -> Cow<'a, str> {
        if self.windows && storage_path.contains(WINDOWS_FORBIDDEN_CHARS) {
            Cow::Owned(storage_path.replace(WINDOWS_FORBIDDEN_CHARS, "-"))
        } else {
            Cow::Borrowed(storage_path)
        }
    }

    /// Location on disk of a storage path under `root`
    #[must_use]
    pub fn disk_path(&self, root: &Path, storage_path: &str) -> PathBuf {
        self.clean_path(storage_path)
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(root.to_path_buf(), |path, segment| path.join(segment))
    }
}

fn is_cdn_resource_path(path: &str) -> bool {
    let Some(rest) = path.strip_prefix('/') else {
        return false;
    };
    match rest.split_once('/') {
        Some((kind, _)) => !kind.is_empty() && kind.bytes().all(|b| b.is_ascii_lowercase()),
        None => false,
    }
}

fn decode_path(path: &str) -> String {
    urlencoding::decode(path)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| path.to_string())
}

/// `rc/external/<host>/<path><?query>`, with overlong segments split up
fn external_storage_path(url: &Url) -> String {
    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };
    let trimmed = url.path().trim_matches('/');
    let path = if trimmed.is_empty() { "_" } else { trimmed };
    let query = url.query().map(|q| format!("?{q}")).unwrap_or_default();

    split_too_long_segments(&format!("{EXTERNAL_CACHE_DIR}/{host}/{path}{query}"))
}

/// Break every segment longer than the file name limit into nested
/// directories, cutting only at char boundaries.
///
/// Deterministic: the same input always yields the same output.
#[must_use]
pub fn split_too_long_segments(path: &str) -> String {
    path.split('/')
        .flat_map(split_segment)
        .collect::<Vec<_>>()
        .join("/")
}

fn split_segment(segment: &str) -> Vec<&str> {
    split_segment_at(segment, MAX_FILE_NAME_LENGTH_UTF8)
}

fn split_segment_at(segment: &str, limit: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = segment;
    while rest.len() > limit {
        let mut cut = limit;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        let (head, tail) = rest.split_at(cut);
        pieces.push(head);
        rest = tail;
    }
    pieces.push(rest);
    pieces
}

/// Split the file name once more when an inferred extension would push it
/// past the filesystem limit.
fn reserve_extension_room(path: &str) -> String {
    let limit = MAX_FILE_NAME_LENGTH_ON_DISK - 1 - longest_known_extension();
    let (dir, name) = path.rsplit_once('/').unwrap_or(("", path));
    if name.len() <= limit {
        return path.to_string();
    }
    let pieces = split_segment_at(name, limit).join("/");
    if dir.is_empty() {
        pieces
    } else {
        format!("{dir}/{pieces}")
    }
}

/// Neutralize `.` and `..` segments so a storage path cannot escape the
/// archive root once joined onto it.
fn sanitize_segments(path: &str) -> String {
    if !path.split('/').any(|s| s == "." || s == "..") {
        return path.to_string();
    }
    path.split('/')
        .map(|s| if s == "." || s == ".." { "_" } else { s })
        .collect::<Vec<_>>()
        .join("/")
}
