//! Persisted fetch URL → content type table
//!
//! Resources stored under an inferred extension can only be found again if
//! the content type that chose the extension is remembered. The table lives
//! in `~headers.json` at the archive root, shaped as
//! `{ "<fetch url>": { "content-type": "<type>" } }`.
//!
//! Changes are flushed on a debounce: the first unsaved change schedules a
//! write [`CONTENT_TYPE_FLUSH_DELAY_MS`] later, and further changes ride
//! along with it. [`ContentTypeCache::flush`] writes immediately and cancels
//! any scheduled write; callers must invoke it once at the end of a run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use super::error::ResourceResult;
use super::storage::write_atomically;
use crate::utils::{CONTENT_TYPE_CACHE_FILE, CONTENT_TYPE_FLUSH_DELAY_MS};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedHeaders {
    #[serde(rename = "content-type")]
    content_type: String,
}

pub struct ContentTypeCache {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, CachedHeaders>>,
    scheduled_flush: Mutex<Option<JoinHandle<()>>>,
    flush_delay: Duration,
}

impl ContentTypeCache {
    /// Load the cache from the archive root.
    ///
    /// A missing or malformed file yields an empty cache.
    pub async fn load(root: &Path) -> Self {
        let path = root.join(CONTENT_TYPE_CACHE_FILE);
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("Ignoring unreadable content type cache {}: {e}", path.display());
                    BTreeMap::new()
                }
            },
            Err(e) => {
                log::debug!("No content type cache at {}: {e}", path.display());
                BTreeMap::new()
            }
        };

        Self {
            path,
            entries: Mutex::new(entries),
            scheduled_flush: Mutex::new(None),
            flush_delay: Duration::from_millis(CONTENT_TYPE_FLUSH_DELAY_MS),
        }
    }

    #[must_use]
    pub fn with_flush_delay(mut self, delay: Duration) -> Self {
        self.flush_delay = delay;
        self
    }

    #[must_use]
    pub fn get(&self, fetch_url: &str) -> Option<String> {
        self.entries
            .lock()
            .get(fetch_url)
            .map(|headers| headers.content_type.clone())
    }

    /// Record a content type and make sure a flush is scheduled
    pub fn set(self: &Arc<Self>, fetch_url: &str, content_type: &str) {
        self.entries.lock().insert(
            fetch_url.to_string(),
            CachedHeaders {
                content_type: content_type.to_string(),
            },
        );
        self.schedule_flush();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn schedule_flush(self: &Arc<Self>) {
        let mut scheduled = self.scheduled_flush.lock();
        if scheduled.is_some() {
            return;
        }
        let cache = Arc::clone(self);
        *scheduled = Some(tokio::spawn(async move {
            tokio::time::sleep(cache.flush_delay).await;
            // Detach ourselves first so a concurrent flush() cannot abort this write.
            cache.scheduled_flush.lock().take();
            if let Err(e) = cache.write().await {
                log::error!("Failed to write content type cache: {e}");
            }
        }));
    }

    /// Write the cache now, cancelling any scheduled flush
    pub async fn flush(&self) -> ResourceResult<()> {
        if let Some(handle) = self.scheduled_flush.lock().take() {
            handle.abort();
        }
        self.write().await
    }

    async fn write(&self) -> ResourceResult<()> {
        let json = serde_json::to_vec(&*self.entries.lock())?;
        write_atomically(self.path.clone(), json).await?;
        log::debug!("Flushed content type cache to {}", self.path.display());
        Ok(())
    }
}
