//! Per-channel content catalog and blob storage.

use std::collections::HashMap;
use std::io::SeekFrom;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncSeek, AsyncSeekExt, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::domain::content::file_path_for;
use crate::domain::{unix_now, Channel, ContentItem, ContentType};
use crate::error::{Error, Result};
use crate::storage::StorageFacade;
use crate::store::RecordStore;

/// Manages uploaded and generated blobs of a channel.
///
/// The catalog lives at `{base_dir}/{index_name}`, blobs at
/// `{base_dir}/{content_dir}/{file_path}`.
#[derive(Debug, Clone)]
pub struct ContentManager {
    storage: StorageFacade,
    index_name: String,
    max_content_length: u64,
}

impl ContentManager {
    pub fn new(storage: StorageFacade, index_name: impl Into<String>, max_content_length: u64) -> Self {
        Self {
            storage,
            index_name: index_name.into(),
            max_content_length,
        }
    }

    /// Upload size limit in bytes
    pub fn max_content_length(&self) -> u64 {
        self.max_content_length
    }

    /// Allocate metadata for a new upload of `length` bytes.
    ///
    /// Nothing is stored until [`set_content`](Self::set_content).
    pub fn new_content_meta(
        &self,
        length: u64,
        file_name: Option<&str>,
        content_type: ContentType,
    ) -> Result<ContentItem> {
        self.check_length(length)?;
        Ok(ContentItem::new(
            length,
            file_name.map(str::to_string),
            content_type,
        ))
    }

    pub async fn get_meta(
        &self,
        channel: &Channel,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ContentItem>> {
        let store = self.load(channel, cancel).await?;
        Ok(store.get_record(id).cloned())
    }

    /// Replace a metadata record without touching its blob
    #[instrument(skip(self, channel, meta, cancel), fields(channel = %channel.name, id = ?meta.id))]
    pub async fn set_meta(
        &self,
        channel: &Channel,
        meta: ContentItem,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut store = self.load(channel, cancel).await?;
        store.set_record(meta)?;
        self.save(channel, &store, cancel).await
    }

    /// All content items of a channel, most recently modified first
    pub async fn get_all_content(
        &self,
        channel: &Channel,
        cancel: &CancellationToken,
    ) -> Result<Arc<[ContentItem]>> {
        Ok(self.load(channel, cancel).await?.records())
    }

    /// Copy a blob into `output` and return its metadata.
    ///
    /// An unknown id yields [`ContentItem::not_found`], whose content type is unset.
    pub async fn get_content<W>(
        &self,
        channel: &Channel,
        id: &str,
        output: &mut W,
        cancel: &CancellationToken,
    ) -> Result<ContentItem>
    where
        W: AsyncWrite + AsyncSeek + Unpin + Send,
    {
        let store = self.load(channel, cancel).await?;
        let Some(meta) = store.get_record(id).cloned() else {
            return Ok(ContentItem::not_found(id));
        };

        let copied = self
            .storage
            .read_file(&blob_path(channel, &meta), output, cancel)
            .await?;
        debug!(id, bytes = ?copied, "Read content");

        Ok(meta)
    }

    /// Store a blob for `meta`.
    ///
    /// The catalog is persisted before the blob is written; a failed blob
    /// write leaves an entry without a payload.
    #[instrument(skip(self, channel, meta, input, cancel), fields(channel = %channel.name, id = ?meta.id))]
    pub async fn set_content<R>(
        &self,
        channel: &Channel,
        mut meta: ContentItem,
        input: &mut R,
        content_type: ContentType,
        cancel: &CancellationToken,
    ) -> Result<ContentItem>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send,
    {
        let length = input.seek(SeekFrom::End(0)).await?;
        input.rewind().await?;
        self.check_length(length)?;

        meta.content_type = Some(content_type.mime().to_string());
        meta.length = length;
        meta.last_modified = unix_now();

        let mut store = self.load(channel, cancel).await?;
        store.set_record(meta.clone())?;
        self.save(channel, &store, cancel).await?;

        self.storage
            .write_file(&blob_path(channel, &meta), input, content_type.mime(), cancel)
            .await?;

        info!(path = %meta.file_path, length, "Content stored");
        Ok(meta)
    }

    /// Register an empty HTML body for a post, keyed by the post id.
    ///
    /// Only the catalog is written; the blob appears on the first body upload.
    #[instrument(skip(self, channel, cancel), fields(channel = %channel.name))]
    pub async fn create_new_post_content(
        &self,
        channel: &Channel,
        post_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ContentItem> {
        let meta = ContentItem {
            id: Some(post_id.to_string()),
            last_modified: unix_now(),
            file_name: Some(format!("Content for post {}", post_id)),
            content_type: Some(ContentType::Html.mime().to_string()),
            length: 0,
            file_path: file_path_for(post_id, ContentType::Html, None),
        };

        let mut store = self.load(channel, cancel).await?;
        store.set_record(meta.clone())?;
        self.save(channel, &store, cancel).await?;

        Ok(meta)
    }

    /// Delete a blob and its catalog entry. Returns `false` when the id is unknown.
    ///
    /// The blob is deleted before the catalog is persisted; a failed catalog
    /// write leaves an entry pointing at a missing blob.
    #[instrument(skip(self, channel, cancel), fields(channel = %channel.name))]
    pub async fn delete_content(
        &self,
        channel: &Channel,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let mut store = self.load(channel, cancel).await?;
        let Some(meta) = store.get_record(id).cloned() else {
            return Ok(false);
        };

        store.remove_record(id);
        self.storage
            .delete_file(&blob_path(channel, &meta), cancel)
            .await?;
        self.save(channel, &store, cancel).await?;

        info!(path = %meta.file_path, "Content deleted");
        Ok(true)
    }

    /// Delete several items with a single catalog write. Returns the ids that existed.
    #[instrument(skip(self, channel, ids, cancel), fields(channel = %channel.name, count = ids.len()))]
    pub async fn delete_many(
        &self,
        channel: &Channel,
        ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        let mut store = self.load(channel, cancel).await?;
        let mut deleted = Vec::new();

        for id in ids {
            let Some(meta) = store.get_record(id).cloned() else {
                continue;
            };

            store.remove_record(id);
            self.storage
                .delete_file(&blob_path(channel, &meta), cancel)
                .await?;
            deleted.push(id.clone());
        }

        if !deleted.is_empty() {
            self.save(channel, &store, cancel).await?;
        }

        info!(deleted = deleted.len(), "Content deleted");
        Ok(deleted)
    }

    /// Public-facing path of a blob, `None` when the id is unknown
    pub async fn get_external_path(
        &self,
        channel: &Channel,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<String>> {
        let store = self.load(channel, cancel).await?;
        Ok(store
            .get_record(id)
            .map(|meta| self.storage.external_path(&blob_path(channel, meta))))
    }

    /// Non-empty bodies of the given posts, keyed by post id
    pub(crate) async fn read_post_bodies(
        &self,
        channel: &Channel,
        post_ids: &[&str],
        cancel: &CancellationToken,
    ) -> Result<HashMap<String, String>> {
        let store = self.load(channel, cancel).await?;
        let mut bodies = HashMap::new();

        for id in post_ids {
            let Some(meta) = store.get_record(id) else {
                continue;
            };

            if let Some(data) = self.storage.read_bytes(&blob_path(channel, meta), cancel).await? {
                if !data.is_empty() {
                    bodies.insert(id.to_string(), String::from_utf8_lossy(&data).into_owned());
                }
            }
        }

        Ok(bodies)
    }

    fn check_length(&self, length: u64) -> Result<()> {
        if length > self.max_content_length {
            return Err(Error::ContentTooLarge {
                length,
                max: self.max_content_length,
            });
        }
        Ok(())
    }

    async fn load(
        &self,
        channel: &Channel,
        cancel: &CancellationToken,
    ) -> Result<RecordStore<ContentItem>> {
        self.storage
            .load_store(&channel.path(&self.index_name), cancel)
            .await
    }

    async fn save(
        &self,
        channel: &Channel,
        store: &RecordStore<ContentItem>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.storage
            .save_store(&channel.path(&self.index_name), store, cancel)
            .await
    }
}

fn blob_path(channel: &Channel, meta: &ContentItem) -> String {
    channel.path(&channel.content_file(&meta.file_path))
}
