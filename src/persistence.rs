//! Durable key-value blob storage for the catalog.
//!
//! The store reads and writes its persisted state wholesale under a single
//! key. Only products, categories and the publish log are persisted; pending
//! changes are included only when draft persistence is switched on.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use crate::domain::aggregates::{Category, Product};
use crate::domain::changes::{PendingChange, PublishLog};
use crate::{MenuError, Result};

/// Namespace the catalog blob lives under.
pub const STORAGE_KEY: &str = "menu-manager-storage";

/// A durable key-value store holding opaque blobs.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub publish_logs: Vec<PublishLog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_changes: Option<Vec<PendingChange>>,
}

impl PersistedState {
    pub fn load(blobs: &dyn BlobStore) -> Result<Option<Self>> {
        match blobs.get(STORAGE_KEY)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| MenuError::StorageError(format!("corrupt catalog blob: {e}"))),
            None => Ok(None),
        }
    }

    pub fn save(&self, blobs: &dyn BlobStore) -> Result<()> {
        blobs.put(STORAGE_KEY, &self.to_bytes()?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| MenuError::StorageError(e.to_string()))
    }
}

/// Writes serialized snapshots to a [`BlobStore`] without blocking the caller.
///
/// Inside a tokio runtime each write runs on the blocking pool; outside one it
/// runs inline. Snapshots are numbered in submission order and a write is
/// skipped once a newer snapshot has landed, so the blob never goes backwards.
pub struct SnapshotWriter {
    shared: Arc<WriterShared>,
    issued: AtomicU64,
    latest: Mutex<Option<JoinHandle<()>>>,
}

struct WriterShared {
    blobs: Arc<dyn BlobStore>,
    written: Mutex<u64>,
}

impl SnapshotWriter {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            shared: Arc::new(WriterShared { blobs, written: Mutex::new(0) }),
            issued: AtomicU64::new(0),
            latest: Mutex::new(None),
        }
    }

    /// Queue `bytes` as the newest snapshot.
    pub fn submit(&self, bytes: Vec<u8>) {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let shared = self.shared.clone();
                let write = runtime.spawn_blocking(move || shared.write(generation, &bytes));
                if let Ok(mut latest) = self.latest.lock() {
                    *latest = Some(write);
                }
            }
            Err(_) => self.shared.write(generation, &bytes),
        }
    }

    /// Wait until the newest submitted snapshot has been written (or has failed).
    pub async fn flush(&self) {
        let write = self.latest.lock().ok().and_then(|mut latest| latest.take());
        if let Some(write) = write {
            if let Err(e) = write.await {
                tracing::warn!(error = %e, "catalog write task failed");
            }
        }
    }
}

impl WriterShared {
    fn write(&self, generation: u64, bytes: &[u8]) {
        let Ok(mut written) = self.written.lock() else {
            tracing::warn!(generation, "snapshot writer poisoned, write dropped");
            return;
        };
        if *written >= generation {
            tracing::debug!(generation, latest = *written, "stale catalog snapshot skipped");
            return;
        }
        match self.blobs.put(STORAGE_KEY, bytes) {
            Ok(()) => *written = generation,
            Err(e) => tracing::warn!(error = %e, generation, "failed to persist catalog"),
        }
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    pub fn dir(&self) -> &Path { &self.dir }

    fn path_for(&self, key: &str) -> PathBuf { self.dir.join(format!("{key}.json")) }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MenuError::StorageError(e.to_string())),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| MenuError::StorageError(e.to_string()))?;
        // Write then rename so a crash never leaves a half-written blob.
        let target = self.path_for(key);
        let tmp = target.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|e| MenuError::StorageError(e.to_string()))?;
        std::fs::rename(&tmp, &target).map_err(|e| MenuError::StorageError(e.to_string()))
    }
}

/// In-process blob store, for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self { Self::default() }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let blobs = self.blobs.lock().map_err(|_| MenuError::StorageError("blob store poisoned".into()))?;
        Ok(blobs.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut blobs = self.blobs.lock().map_err(|_| MenuError::StorageError("blob store poisoned".into()))?;
        blobs.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
