//! In-process storage backend.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use super::{directory_to_delete, join_path, StorageBackend};
use crate::error::{Error, Result};

/// A stored blob and its content type
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// Map-backed storage, used by tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    base_path: Option<String>,
    reject_writes: AtomicBool,
    rejected_paths: RwLock<BTreeSet<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that reports external paths under `base_path`
    pub fn with_base_path(base_path: impl Into<String>) -> Self {
        Self {
            base_path: Some(base_path.into()),
            ..Default::default()
        }
    }

    /// Make subsequent writes and deletes fail as if the backend refused them
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Make writes and deletes of one path fail, leaving other paths writable
    pub fn reject_path(&self, path: &str) {
        self.rejected_paths
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(normalize(path));
    }

    /// Fetch a stored object
    pub fn object(&self, path: &str) -> Option<StoredObject> {
        self.read_map().get(&normalize(path)).cloned()
    }

    /// True if a file exists at the path
    pub fn contains(&self, path: &str) -> bool {
        self.read_map().contains_key(&normalize(path))
    }

    /// All stored paths, sorted
    pub fn paths(&self) -> Vec<String> {
        self.read_map().keys().cloned().collect()
    }

    fn read_map(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_map(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects.write().unwrap_or_else(|e| e.into_inner())
    }

    fn check_writable(&self, path: &str) -> Result<()> {
        let rejected = self.reject_writes.load(Ordering::SeqCst)
            || self
                .rejected_paths
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .contains(&normalize(path));

        if rejected {
            return Err(Error::StorageUpdateFailed {
                path: path.to_string(),
                reason: "memory storage is read-only".to_string(),
            });
        }
        Ok(())
    }
}

fn normalize(path: &str) -> String {
    join_path(&[path])
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    async fn read_file(&self, path: &str) -> Result<Option<Bytes>> {
        Ok(self.object(path).map(|o| o.data))
    }

    async fn write_file(&self, path: &str, data: Bytes, content_type: &str) -> Result<()> {
        self.check_writable(path)?;
        self.write_map().insert(
            normalize(path),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        self.check_writable(path)?;
        self.write_map().remove(&normalize(path));
        Ok(())
    }

    async fn delete_directory(&self, path: &str) -> Result<()> {
        let dir = directory_to_delete(path)?;
        self.check_writable(&dir)?;
        let prefix = format!("{}/", dir);
        self.write_map().retain(|key, _| !key.starts_with(&prefix));
        Ok(())
    }

    fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref()
    }
}
