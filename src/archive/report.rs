//! Outcome of an archive run

use std::fmt;

use crate::resources::ResourceError;

/// One post (or post listing) that could not be archived
#[derive(Debug, Clone)]
pub struct ArchiveFailure {
    pub url: String,
    pub error: ResourceError,
}

#[derive(Debug, Default)]
pub struct ArchiveReport {
    /// Posts written during this run
    pub archived: usize,
    /// Posts already present from an earlier run
    pub already_archived: usize,
    /// Posts left out because their ID is on the skip list
    pub skipped: usize,
    pub failures: Vec<ArchiveFailure>,
}

impl ArchiveReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn fail(&mut self, url: impl Into<String>, error: ResourceError) {
        let url = url.into();
        log::error!("Failed to archive {url}: {error}");
        self.failures.push(ArchiveFailure { url, error });
    }
}

impl fmt::Display for ArchiveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} posts archived, {} already present, {} skipped",
            self.archived, self.already_archived, self.skipped
        )?;
        if !self.failures.is_empty() {
            write!(f, "\n{} failed:", self.failures.len())?;
            for failure in &self.failures {
                write!(f, "\n  {}: {}", failure.url, failure.error)?;
            }
        }
        Ok(())
    }
}
