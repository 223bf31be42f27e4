//! The single storage entry point used by the catalog managers.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::secrets::{SecretProvider, FTP_PASSWORD, S3_SECRET};
use super::{BackendRegistry, RemoteStorage, StorageBackend, JSON_CONTENT_TYPE};
use crate::config::{BackendKind, StorageConfig};
use crate::domain::Record;
use crate::error::{Error, Result};
use crate::store::RecordStore;

/// Run a storage call, abandoning it if the token fires first
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

/// Wraps the configured [`StorageBackend`].
///
/// Stream-based calls rewind the caller's stream before and after the
/// transfer, so one buffer can be reused across calls.
#[derive(Clone)]
pub struct StorageFacade {
    backend: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for StorageFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageFacade")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl StorageFacade {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Build the backend selected by `config`.
    ///
    /// Credentials come from `secrets`; custom backends are looked up in `registry`.
    pub async fn from_config(
        config: &StorageConfig,
        secrets: &dyn SecretProvider,
        registry: &BackendRegistry,
    ) -> Result<Self> {
        let backend: Arc<dyn StorageBackend> = match config.selection()? {
            BackendKind::S3 => {
                let s3 = config
                    .s3
                    .as_ref()
                    .ok_or_else(|| Error::Config("storage.s3 section is missing".to_string()))?;
                let secret = secrets.require_secret(S3_SECRET).await?;
                Arc::new(RemoteStorage::s3(s3, &secret)?)
            }
            BackendKind::Ftp => {
                let ftp = config
                    .ftp
                    .as_ref()
                    .ok_or_else(|| Error::Config("storage.ftp section is missing".to_string()))?;
                let password = secrets.require_secret(FTP_PASSWORD).await?;
                Arc::new(RemoteStorage::ftp(ftp, &password)?)
            }
            BackendKind::Custom(name) => registry
                .get(&name)
                .ok_or(Error::UnknownBackend(name))?,
        };

        info!(backend = backend.name(), "Storage backend selected");
        Ok(Self::new(backend))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Public-facing path of a stored file
    pub fn external_path(&self, path: &str) -> String {
        self.backend.external_path(path)
    }

    /// Copy a file into `output`. Returns the number of bytes copied, or
    /// `None` when the file does not exist.
    ///
    /// The copy overwrites `output` from its start and leaves it rewound. The
    /// sink is not truncated: a reused buffer that held a longer payload keeps
    /// its old tail past the returned length.
    pub async fn read_file<W>(
        &self,
        path: &str,
        output: &mut W,
        cancel: &CancellationToken,
    ) -> Result<Option<u64>>
    where
        W: AsyncWrite + AsyncSeek + Unpin + Send,
    {
        output.rewind().await?;

        let Some(data) = self.read_bytes(path, cancel).await? else {
            return Ok(None);
        };

        output.write_all(&data).await?;
        output.flush().await?;
        output.rewind().await?;

        Ok(Some(data.len() as u64))
    }

    /// Upload everything in `input` from its start
    pub async fn write_file<R>(
        &self,
        path: &str,
        input: &mut R,
        content_type: &str,
        cancel: &CancellationToken,
    ) -> Result<()>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send,
    {
        input.rewind().await?;
        let mut data = Vec::new();
        input.read_to_end(&mut data).await?;
        input.rewind().await?;

        self.write_bytes(path, Bytes::from(data), content_type, cancel)
            .await
    }

    pub async fn read_bytes(&self, path: &str, cancel: &CancellationToken) -> Result<Option<Bytes>> {
        cancellable(cancel, self.backend.read_file(path)).await
    }

    pub async fn write_bytes(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        cancellable(cancel, self.backend.write_file(path, data, content_type)).await
    }

    pub async fn delete_file(&self, path: &str, cancel: &CancellationToken) -> Result<()> {
        cancellable(cancel, self.backend.delete_file(path)).await
    }

    /// Recursively delete a directory
    pub async fn delete_directory(&self, path: &str, cancel: &CancellationToken) -> Result<()> {
        cancellable(cancel, self.backend.delete_directory(path)).await
    }

    /// Load a catalog. A missing file yields an empty store.
    pub async fn load_store<T: Record>(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<RecordStore<T>> {
        match self.read_bytes(path, cancel).await? {
            Some(data) => {
                let store = RecordStore::from_bytes(&data)?;
                debug!(path, records = store.len(), "Loaded catalog");
                Ok(store)
            }
            None => {
                debug!(path, "Catalog not found, starting empty");
                Ok(RecordStore::new())
            }
        }
    }

    /// Persist a catalog as one JSON document
    pub async fn save_store<T: Record>(
        &self,
        path: &str,
        store: &RecordStore<T>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let data = store.store()?;
        self.write_bytes(path, Bytes::from(data), JSON_CONTENT_TYPE, cancel)
            .await?;
        debug!(path, records = store.len(), "Saved catalog");
        Ok(())
    }
}
