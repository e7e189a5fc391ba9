//! Type-safe builder for `ArchiveConfig` using the typestate pattern
//!
//! The cookie and the output directory must be set, in that order, before
//! `build()` becomes available.

use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::{
    ArchiveConfig, ConfigError, default_load_liked_posts, default_request_timeout_secs,
    default_windows_paths,
};
use crate::feed::parse_post_url;

// Type states for the builder
pub struct WithCookie;
pub struct Complete;

pub struct ArchiveConfigBuilder<State = ()> {
    pub(crate) cookie: Option<String>,
    pub(crate) output_dir: Option<PathBuf>,
    pub(crate) projects: Vec<String>,
    pub(crate) posts: Vec<String>,
    pub(crate) skip_posts: Vec<u64>,
    pub(crate) do_not_fetch_hostnames: Vec<String>,
    pub(crate) load_liked_posts: bool,
    pub(crate) request_delay_secs: f64,
    pub(crate) request_timeout_secs: u64,
    pub(crate) windows_paths: bool,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for ArchiveConfigBuilder<()> {
    fn default() -> Self {
        Self {
            cookie: None,
            output_dir: None,
            projects: Vec::new(),
            posts: Vec::new(),
            skip_posts: Vec::new(),
            do_not_fetch_hostnames: Vec::new(),
            load_liked_posts: default_load_liked_posts(),
            request_delay_secs: 0.0,
            request_timeout_secs: default_request_timeout_secs(),
            windows_paths: default_windows_paths(),
            _phantom: PhantomData,
        }
    }
}

impl ArchiveConfig {
    /// Create a builder for configuring an `ArchiveConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> ArchiveConfigBuilder<()> {
        ArchiveConfigBuilder::default()
    }
}

impl<State> ArchiveConfigBuilder<State> {
    fn into_state<Next>(self) -> ArchiveConfigBuilder<Next> {
        ArchiveConfigBuilder {
            cookie: self.cookie,
            output_dir: self.output_dir,
            projects: self.projects,
            posts: self.posts,
            skip_posts: self.skip_posts,
            do_not_fetch_hostnames: self.do_not_fetch_hostnames,
            load_liked_posts: self.load_liked_posts,
            request_delay_secs: self.request_delay_secs,
            request_timeout_secs: self.request_timeout_secs,
            windows_paths: self.windows_paths,
            _phantom: PhantomData,
        }
    }

    #[must_use]
    pub fn project(mut self, handle: impl Into<String>) -> Self {
        self.projects.push(handle.into());
        self
    }

    #[must_use]
    pub fn projects<I, S>(mut self, handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projects.extend(handles.into_iter().map(Into::into));
        self
    }

    /// Add a single post page URL to archive
    #[must_use]
    pub fn post(mut self, url: impl Into<String>) -> Self {
        self.posts.push(url.into());
        self
    }

    #[must_use]
    pub fn skip_post(mut self, post_id: u64) -> Self {
        self.skip_posts.push(post_id);
        self
    }

    #[must_use]
    pub fn do_not_fetch_hostname(mut self, host: impl Into<String>) -> Self {
        self.do_not_fetch_hostnames.push(host.into());
        self
    }

    #[must_use]
    pub fn load_liked_posts(mut self, load: bool) -> Self {
        self.load_liked_posts = load;
        self
    }

    /// Seconds to wait before every request (default: 0)
    #[must_use]
    pub fn request_delay_secs(mut self, secs: f64) -> Self {
        self.request_delay_secs = secs;
        self
    }

    /// Overall timeout of a single request (default: 120)
    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn windows_paths(mut self, windows: bool) -> Self {
        self.windows_paths = windows;
        self
    }
}

impl ArchiveConfigBuilder<()> {
    /// Set the `Cookie` header of a logged-in session
    pub fn cookie(mut self, cookie: impl Into<String>) -> ArchiveConfigBuilder<WithCookie> {
        self.cookie = Some(cookie.into());
        self.into_state()
    }
}

impl ArchiveConfigBuilder<WithCookie> {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> ArchiveConfigBuilder<Complete> {
        self.output_dir = Some(dir.into());
        self.into_state()
    }
}

// Build method only available when all required fields are set
impl ArchiveConfigBuilder<Complete> {
    pub fn build(self) -> Result<ArchiveConfig, ConfigError> {
        let config = ArchiveConfig {
            cookie: self.cookie.ok_or(ConfigError::Invalid {
                field: "cookie",
                message: "is required".to_string(),
            })?,
            output_dir: self.output_dir.ok_or(ConfigError::Invalid {
                field: "output_dir",
                message: "is required".to_string(),
            })?,
            projects: self.projects,
            posts: self.posts,
            skip_posts: self.skip_posts,
            do_not_fetch_hostnames: self.do_not_fetch_hostnames,
            load_liked_posts: self.load_liked_posts,
            request_delay_secs: self.request_delay_secs,
            request_timeout_secs: self.request_timeout_secs,
            windows_paths: self.windows_paths,
        };
        config.validated()
    }
}

impl ArchiveConfig {
    /// Check field values and normalize host names to lowercase
    pub(crate) fn validated(mut self) -> Result<Self, ConfigError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "output_dir",
                message: "must not be empty".to_string(),
            });
        }
        if !self.request_delay_secs.is_finite() || self.request_delay_secs < 0.0 {
            return Err(ConfigError::Invalid {
                field: "request_delay_secs",
                message: format!("{} is not a non-negative number", self.request_delay_secs),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                message: "must be at least 1".to_string(),
            });
        }
        for post in &self.posts {
            parse_post_url(post).map_err(|e| ConfigError::Invalid {
                field: "posts",
                message: e.to_string(),
            })?;
        }
        if let Some(handle) = self.projects.iter().find(|h| h.trim().is_empty() || h.contains('/')) {
            return Err(ConfigError::Invalid {
                field: "projects",
                message: format!("{handle:?} is not a project handle"),
            });
        }

        for host in &mut self.do_not_fetch_hostnames {
            *host = host.trim().to_ascii_lowercase();
        }
        self.do_not_fetch_hostnames.retain(|h| !h.is_empty());
        Ok(self)
    }
}
