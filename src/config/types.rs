//! Core configuration types for archiving
//!
//! This module contains the `ArchiveConfig` struct and the error raised when a
//! configuration is incomplete or cannot be read.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::DEFAULT_REQUEST_TIMEOUT_SECS;

/// What to archive and how to reach the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Raw `Cookie` header value of a logged-in browser session.
    ///
    /// Only ever sent to the primary host.
    pub(crate) cookie: String,

    /// Root of the archive; every storage path is relative to it
    pub(crate) output_dir: PathBuf,

    /// Handles whose own posts are archived
    #[serde(default)]
    pub(crate) projects: Vec<String>,

    /// Additional single post page URLs
    #[serde(default)]
    pub(crate) posts: Vec<String>,

    /// Post IDs that are never loaded (e.g. deleted after listing)
    #[serde(default)]
    pub(crate) skip_posts: Vec<u64>,

    /// Hosts that are never fetched, matched case-insensitively
    #[serde(default)]
    pub(crate) do_not_fetch_hostnames: Vec<String>,

    /// Archive the liked posts of the logged-in page
    #[serde(default = "default_load_liked_posts")]
    pub(crate) load_liked_posts: bool,

    #[serde(default)]
    pub(crate) request_delay_secs: f64,

    #[serde(default = "default_request_timeout_secs")]
    pub(crate) request_timeout_secs: u64,

    /// Replace characters Windows forbids in file names when writing
    #[serde(default = "default_windows_paths")]
    pub(crate) windows_paths: bool,
}

pub(crate) fn default_load_liked_posts() -> bool {
    true
}

pub(crate) fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

pub(crate) fn default_windows_paths() -> bool {
    cfg!(windows)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}
