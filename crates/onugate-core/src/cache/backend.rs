// ── Cache backends ──
//
// A backend holds whole entries keyed by string and replaces them
// atomically. The store layers a volatile backend over an optional
// durable one.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tempfile::NamedTempFile;
use tracing::debug;

use super::entry::CacheEntry;
use crate::error::CoreError;

/// Storage for cache entries.
pub trait CacheBackend: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<Arc<CacheEntry>>, CoreError>;
    fn store(&self, entry: Arc<CacheEntry>) -> Result<(), CoreError>;
    fn remove(&self, key: &str) -> Result<(), CoreError>;
}

// ── Memory ───────────────────────────────────────────────────────────

/// Volatile backend. Each key is one `Arc` swapped in a single insert, so
/// readers holding an older snapshot are never affected by a write.
#[derive(Default)]
pub struct MemoryBackend {
    entries: DashMap<String, Arc<CacheEntry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<CacheEntry>> {
        self.entries.get(key).map(|e| Arc::clone(e.value()))
    }

    pub fn insert(&self, entry: Arc<CacheEntry>) {
        self.entries.insert(entry.key.clone(), entry);
    }

    pub fn evict(&self, key: &str) -> Option<Arc<CacheEntry>> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<Arc<CacheEntry>>, CoreError> {
        Ok(self.get(key))
    }

    fn store(&self, entry: Arc<CacheEntry>) -> Result<(), CoreError> {
        self.insert(entry);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.evict(key);
        Ok(())
    }
}

// ── File ─────────────────────────────────────────────────────────────

/// Durable backend: one `<sanitized-key>.json` per entry under `dir`.
///
/// Writes go to a temp file in the same directory which is then renamed
/// over the target, so a concurrent reader sees the old file or the new
/// one, never a partial write.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Use `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| io_error("create cache dir", &dir, &e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `key`. Anything outside `[A-Za-z0-9_-]` becomes `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let stem: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let stem = stem.trim_matches('_');
        let stem = if stem.is_empty() { "root" } else { stem };
        self.dir.join(format!("{stem}.json"))
    }
}

impl CacheBackend for FileBackend {
    fn load(&self, key: &str) -> Result<Option<Arc<CacheEntry>>, CoreError> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error("read", &path, &e)),
        };

        let mut entry: CacheEntry = serde_json::from_str(&raw).map_err(|e| CoreError::Cache {
            message: format!("corrupt cache file {}: {e}", path.display()),
        })?;
        entry.key = key.to_owned();
        debug!(path = %path.display(), "loaded durable cache entry");
        Ok(Some(Arc::new(entry)))
    }

    fn store(&self, entry: Arc<CacheEntry>) -> Result<(), CoreError> {
        let path = self.path_for(&entry.key);
        let json = serde_json::to_vec(entry.as_ref()).map_err(|e| CoreError::Cache {
            message: format!("serialize cache entry {}: {e}", entry.key),
        })?;

        let mut tmp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| io_error("create temp file in", &self.dir, &e))?;
        tmp.write_all(&json)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| io_error("write", tmp.path(), &e))?;
        tmp.persist(&path)
            .map_err(|e| io_error("persist", &path, &e.error))?;

        debug!(path = %path.display(), bytes = json.len(), "wrote durable cache entry");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove", &path, &e)),
        }
    }
}

fn io_error(action: &str, path: &Path, err: &std::io::Error) -> CoreError {
    CoreError::Cache {
        message: format!("{action} {}: {err}", path.display()),
    }
}
