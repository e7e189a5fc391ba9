//! Archive a cohost account into a static, browsable offline mirror.
//!
//! The heart of the crate is the resource pipeline: [`resources`] decides
//! where a URL lives in the archive and fetches it at most once, and
//! [`rewrite`] walks posts, projects, comments, stylesheets, markdown and post pages
//! replacing remote references with relative links into the archive.

pub mod archive;
pub mod config;
pub mod feed;
pub mod model;
pub mod resources;
pub mod rewrite;
pub mod utils;

pub use archive::{ArchiveFailure, ArchiveReport, ArchivedPost, Archiver};
pub use config::{ArchiveConfig, ConfigError};
pub use resources::{FetchCoordinator, HttpFetch, PathPolicy, ResourceError, ResourceResult};
pub use rewrite::{RewriteData, RewriteMap};

/// Archive everything `config` asks for
pub async fn archive(config: ArchiveConfig) -> ResourceResult<ArchiveReport> {
    let archiver = Archiver::new(config).await?;
    Ok(archiver.run().await)
}
