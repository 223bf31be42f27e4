//! Remote blob storage.
//!
//! Backends implement [`StorageBackend`], a small byte-oriented interface over
//! a remote location. Exactly one backend is chosen at construction time from
//! configuration and wrapped in the [`StorageFacade`], which is what the
//! catalog managers talk to.
//!
//! - [`RemoteStorage`]: S3-compatible object storage or FTP/FTPS, via opendal
//! - [`MemoryStorage`]: in-process map, for tests and dry runs
//! - custom backends registered by name in a [`BackendRegistry`]

pub mod facade;
pub mod memory;
pub mod remote;
pub mod secrets;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Error, Result};

pub use facade::StorageFacade;
pub use memory::MemoryStorage;
pub use remote::RemoteStorage;
pub use secrets::{EnvSecretProvider, SecretProvider, StaticSecrets};

/// MIME type used for catalog documents
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Byte-level access to a remote location
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Read a whole file, `None` when it does not exist
    async fn read_file(&self, path: &str) -> Result<Option<Bytes>>;

    /// Create or overwrite a file.
    ///
    /// Fails with [`Error::StorageUpdateFailed`](crate::Error::StorageUpdateFailed)
    /// when the backend rejects the write.
    async fn write_file(&self, path: &str, data: Bytes, content_type: &str) -> Result<()>;

    /// Delete a single file
    async fn delete_file(&self, path: &str) -> Result<()>;

    /// Recursively delete a directory and everything below it.
    ///
    /// A path naming the storage root (empty, `/`) is refused.
    async fn delete_directory(&self, path: &str) -> Result<()>;

    /// Prefix applied to public-facing paths (bucket name, FTP base path)
    fn base_path(&self) -> Option<&str> {
        None
    }

    /// Public-facing path of a file
    fn external_path(&self, path: &str) -> String {
        match self.base_path() {
            Some(base) if !base.trim().is_empty() => join_path(&[base, path]),
            _ => path.to_string(),
        }
    }
}

/// Join path segments with single `/` separators
pub fn join_path(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches(|c| c == '/' || c == '\\'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalized directory path for a recursive delete, refusing the root
pub(crate) fn directory_to_delete(path: &str) -> Result<String> {
    let dir = join_path(&[path]);
    if dir.is_empty() {
        return Err(Error::StorageUpdateFailed {
            path: path.to_string(),
            reason: "refusing to delete the storage root".to_string(),
        });
    }
    Ok(dir)
}

/// Host-supplied backends, selectable by name from configuration
#[derive(Default, Clone)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn StorageBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under a name (case-insensitive)
    pub fn register(&mut self, name: impl Into<String>, backend: Arc<dyn StorageBackend>) {
        self.backends.insert(name.into().to_lowercase(), backend);
    }

    pub fn with_backend(mut self, name: impl Into<String>, backend: Arc<dyn StorageBackend>) -> Self {
        self.register(name, backend);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn StorageBackend>> {
        self.backends.get(&name.to_lowercase()).cloned()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.backends.keys().collect::<Vec<_>>())
            .finish()
    }
}
