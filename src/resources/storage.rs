//! Atomic file writes into the archive tree
//!
//! Files are written to a temporary sibling and renamed into place, so a
//! run that dies mid-write never leaves a truncated file that the next run
//! would mistake for a completed resource.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::error::{ResourceError, ResourceResult};

/// Write `content` to `path`, creating parent directories as needed.
///
/// Blocking filesystem work runs on the blocking pool.
pub async fn write_atomically(path: PathBuf, content: Vec<u8>) -> ResourceResult<()> {
    let display = path.display().to_string();
    tokio::task::spawn_blocking(move || write_blocking(&path, &content))
        .await
        .map_err(|e| ResourceError::Io {
            path: display,
            message: format!("write task failed: {e}"),
        })?
}

fn write_blocking(path: &Path, content: &[u8]) -> ResourceResult<()> {
    let parent = path.parent().ok_or_else(|| ResourceError::Io {
        path: path.display().to_string(),
        message: "path has no parent directory".to_string(),
    })?;
    std::fs::create_dir_all(parent).map_err(|e| ResourceError::io(parent.display(), &e))?;

    let mut temp_file =
        NamedTempFile::new_in(parent).map_err(|e| ResourceError::io(parent.display(), &e))?;
    temp_file
        .write_all(content)
        .map_err(|e| ResourceError::io(path.display(), &e))?;
    temp_file
        .persist(path)
        .map_err(|e| ResourceError::io(path.display(), &e.error))?;
    Ok(())
}

/// Whether a file exists at `path`; errors count as absent
pub async fn file_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
