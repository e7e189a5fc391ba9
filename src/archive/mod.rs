//! Archive runs: enumerate posts, rewrite them and store the results
//!
//! The runner is thin orchestration over [`crate::feed`] and
//! [`crate::rewrite`]. Every post is written to
//! `<handle>/post/<filename>.json` together with its rewrite data, next to
//! its captured page at `<handle>/post/<filename>.html`. A post whose JSON
//! file already exists is not loaded again.

pub mod report;
pub mod runner;

pub use report::{ArchiveFailure, ArchiveReport};
pub use runner::{ArchivedPost, Archiver, post_page_storage_path, post_storage_path};
