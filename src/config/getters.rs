//! Getter methods for `ArchiveConfig`

use std::path::Path;
use std::time::Duration;

use super::types::ArchiveConfig;

impl ArchiveConfig {
    #[must_use]
    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn projects(&self) -> &[String] {
        &self.projects
    }

    #[must_use]
    pub fn posts(&self) -> &[String] {
        &self.posts
    }

    #[must_use]
    pub fn skip_posts(&self) -> &[u64] {
        &self.skip_posts
    }

    #[must_use]
    pub fn is_skipped(&self, post_id: u64) -> bool {
        self.skip_posts.contains(&post_id)
    }

    #[must_use]
    pub fn do_not_fetch_hostnames(&self) -> &[String] {
        &self.do_not_fetch_hostnames
    }

    #[must_use]
    pub fn load_liked_posts(&self) -> bool {
        self.load_liked_posts
    }

    /// Pause before every outbound request
    #[must_use]
    pub fn request_delay(&self) -> Duration {
        Duration::from_secs_f64(self.request_delay_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn windows_paths(&self) -> bool {
        self.windows_paths
    }
}
