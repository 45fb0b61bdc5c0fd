//! Storage tiers
//!
//! Two tiers live behind [`KeyValueStore`]:
//! - ephemeral: TTL-bound, a performance hint only
//! - durable: never expires, holds saved route configuration
//!
//! Writers are not coordinated beyond a per-map lock; the last writer for a
//! key wins.

use crate::StoreError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Abstract two-tier key-value store
pub trait KeyValueStore: Send + Sync {
    fn get_ephemeral(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn set_ephemeral_with_ttl(&self, key: &str, value: Value, ttl: Duration) -> Result<(), StoreError>;

    fn delete_ephemeral(&self, key: &str) -> Result<(), StoreError>;

    fn get_durable(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn set_durable(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// In-memory TTL map shared by both store implementations
#[derive(Debug, Default)]
struct EphemeralTier {
    entries: RwLock<HashMap<String, (Value, Instant)>>,
}

impl EphemeralTier {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
            match entries.get(key) {
                Some((value, expires)) if *expires > now => return Ok(Some(value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: evict so the map does not grow with dead routes
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        if matches!(entries.get(key), Some((_, expires)) if *expires <= now) {
            entries.remove(key);
            tracing::debug!(key, "ephemeral entry expired");
        }
        Ok(None)
    }

    /// Insert, sweeping every expired entry first
    fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        let before = entries.len();
        entries.retain(|_, (_, expires)| *expires > now);
        if entries.len() < before {
            tracing::debug!(swept = before - entries.len(), "expired ephemeral entries swept");
        }
        entries.insert(key.to_string(), (value, now + ttl));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Both tiers in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    ephemeral: EphemeralTier,
    durable: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_ephemeral(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.ephemeral.get(key)
    }

    fn set_ephemeral_with_ttl(&self, key: &str, value: Value, ttl: Duration) -> Result<(), StoreError> {
        self.ephemeral.set(key, value, ttl)
    }

    fn delete_ephemeral(&self, key: &str) -> Result<(), StoreError> {
        self.ephemeral.delete(key)
    }

    fn get_durable(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let durable = self.durable.read().map_err(|_| StoreError::Poisoned)?;
        Ok(durable.get(key).cloned())
    }

    fn set_durable(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut durable = self.durable.write().map_err(|_| StoreError::Poisoned)?;
        durable.insert(key.to_string(), value);
        Ok(())
    }
}

/// Ephemeral tier in memory, durable tier persisted to a JSON file.
///
/// The file holds a single object `{ key: value }` and is rewritten on
/// every durable write (a sibling temp file persisted over it).
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    ephemeral: EphemeralTier,
    durable: RwLock<Map<String, Value>>,
}

impl FileStore {
    /// Open the store, loading existing durable entries. A missing file is
    /// an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let durable = if path.exists() {
            let bytes = fs::read(&path)?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                Map::new()
            } else {
                serde_json::from_slice(&bytes)?
            }
        } else {
            Map::new()
        };

        tracing::debug!(path = %path.display(), entries = durable.len(), "opened durable store");

        Ok(Self {
            path,
            ephemeral: EphemeralTier::default(),
            durable: RwLock::new(durable),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, durable: &Map<String, Value>) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(&serde_json::to_vec_pretty(durable)?)?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_ephemeral(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.ephemeral.get(key)
    }

    fn set_ephemeral_with_ttl(&self, key: &str, value: Value, ttl: Duration) -> Result<(), StoreError> {
        self.ephemeral.set(key, value, ttl)
    }

    fn delete_ephemeral(&self, key: &str) -> Result<(), StoreError> {
        self.ephemeral.delete(key)
    }

    fn get_durable(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let durable = self.durable.read().map_err(|_| StoreError::Poisoned)?;
        Ok(durable.get(key).cloned())
    }

    /// The in-memory view only changes once the file write succeeded
    fn set_durable(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut durable = self.durable.write().map_err(|_| StoreError::Poisoned)?;
        let mut next = durable.clone();
        next.insert(key.to_string(), value);
        self.persist(&next)?;
        *durable = next;
        Ok(())
    }
}
