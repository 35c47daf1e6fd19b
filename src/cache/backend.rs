//! Persistent Key-Value Backends
//!
//! The asynchronous string store underneath every cache namespace.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;

// == Store Trait ==
/// Opaque asynchronous get/set/remove over strings.
///
/// Implementations only guarantee per-key atomicity.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a key. A missing key is `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes a key, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Deletes a key. Deleting a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;
}

// == Memory Store ==
/// Process-local store, used for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

// == File Store ==
/// One file per key under a directory.
///
/// Each write goes to its own temp file which is then renamed over the key's
/// file, so overlapping writes to one key never share a temp path.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    next_write: Arc<AtomicU64>,
}

impl FileStore {
    /// Opens (and creates if needed) the store directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            next_write: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }

    fn temp_path_for(&self, key: &str) -> PathBuf {
        let seq = self.next_write.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!(
            "{}.{}.{}.tmp",
            sanitize_key(key),
            std::process::id(),
            seq
        ))
    }
}

/// Maps a store key onto a safe file name.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let tmp = self.temp_path_for(key);
        if let Err(e) = tokio::fs::write(&tmp, value).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        tokio::fs::rename(&tmp, self.path_for(key)).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
