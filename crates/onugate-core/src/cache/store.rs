use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};

use super::backend::{CacheBackend, MemoryBackend};
use super::entry::CacheEntry;
use crate::error::CoreError;

/// Two-tier cache: every entry lives in memory; entries under a durable
/// key are also mirrored to a persistent backend and reloaded on open.
///
/// Durable I/O runs on the blocking pool so a large snapshot never holds
/// up an executor thread. Failures there are logged and never fail the
/// in-memory operation.
pub struct CacheStore {
    memory: MemoryBackend,
    durable: Option<Arc<dyn CacheBackend>>,
    durable_keys: HashSet<String>,
}

impl CacheStore {
    /// Memory only. Nothing survives a restart.
    pub fn in_memory() -> Self {
        Self {
            memory: MemoryBackend::new(),
            durable: None,
            durable_keys: HashSet::new(),
        }
    }

    /// Layer memory over `durable`, mirroring `durable_keys`. Any of those
    /// keys already persisted are loaded immediately.
    pub fn open<I, K>(durable: impl CacheBackend + 'static, durable_keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let store = Self {
            memory: MemoryBackend::new(),
            durable: Some(Arc::new(durable)),
            durable_keys: durable_keys.into_iter().map(Into::into).collect(),
        };
        store.reload();
        store
    }

    fn reload(&self) {
        let Some(durable) = &self.durable else {
            return;
        };
        for key in &self.durable_keys {
            match durable.load(key) {
                Ok(Some(entry)) => {
                    info!(
                        key = %key,
                        last_fetch = %entry.last_fetch,
                        "restored cache entry from disk"
                    );
                    self.memory.insert(entry);
                }
                Ok(None) => {}
                Err(e) => warn!(key = %key, error = %e, "could not restore cache entry"),
            }
        }
    }

    pub fn is_durable(&self, key: &str) -> bool {
        self.durable.is_some() && self.durable_keys.contains(key)
    }

    pub fn read(&self, key: &str) -> Option<Arc<CacheEntry>> {
        self.memory.get(key)
    }

    /// Entry exists and is within its TTL.
    pub fn is_fresh(&self, key: &str) -> bool {
        self.read(key).is_some_and(|e| e.is_fresh())
    }

    /// Replace the entry for `key`, stamped now.
    ///
    /// The memory tier is updated before the first await; readers see the
    /// new entry even while the durable copy is still being written.
    pub async fn write(&self, key: &str, data: Value, ttl: Duration) -> Arc<CacheEntry> {
        let entry = Arc::new(CacheEntry::new(key, data, ttl));
        self.memory.insert(Arc::clone(&entry));

        if let Some(durable) = self.durable_for(key) {
            let stored = Arc::clone(&entry);
            if let Err(e) = off_executor(durable, move |d| d.store(stored)).await {
                warn!(key, error = %e, "durable cache write failed");
            }
        }
        entry
    }

    /// Drop `key` from both tiers.
    pub async fn invalidate(&self, key: &str) {
        self.memory.evict(key);
        if let Some(durable) = self.durable_for(key) {
            let owned = key.to_owned();
            if let Err(e) = off_executor(durable, move |d| d.remove(&owned)).await {
                warn!(key, error = %e, "durable cache remove failed");
            }
        }
    }

    /// Write every durable key held in memory to the persistent backend.
    /// Returns how many were written.
    pub async fn flush(&self) -> usize {
        let Some(durable) = &self.durable else {
            return 0;
        };
        let mut written = 0;
        for key in &self.durable_keys {
            let Some(entry) = self.memory.get(key) else {
                continue;
            };
            match off_executor(Arc::clone(durable), move |d| d.store(entry)).await {
                Ok(()) => written += 1,
                Err(e) => warn!(key = %key, error = %e, "cache flush failed"),
            }
        }
        written
    }

    fn durable_for(&self, key: &str) -> Option<Arc<dyn CacheBackend>> {
        if self.durable_keys.contains(key) {
            self.durable.clone()
        } else {
            None
        }
    }
}

/// Run a durable backend call on tokio's blocking pool.
async fn off_executor<F>(durable: Arc<dyn CacheBackend>, op: F) -> Result<(), CoreError>
where
    F: FnOnce(&dyn CacheBackend) -> Result<(), CoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(durable.as_ref()))
        .await
        .map_err(|e| CoreError::Cache {
            message: format!("durable cache task failed: {e}"),
        })?
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::in_memory()
    }
}
