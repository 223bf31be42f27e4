//! The channel catalog.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::domain::{unix_now, Channel};
use crate::error::{Error, Result};
use crate::storage::{join_path, StorageFacade};
use crate::store::RecordStore;

/// Manages the single top-level catalog of channel definitions
#[derive(Debug, Clone)]
pub struct ChannelManager {
    storage: StorageFacade,
    index_file: String,
}

impl ChannelManager {
    pub fn new(storage: StorageFacade, index_file: impl Into<String>) -> Self {
        Self {
            storage,
            index_file: index_file.into(),
        }
    }

    /// Path of the channel catalog
    pub fn index_file(&self) -> &str {
        &self.index_file
    }

    /// Add a channel.
    ///
    /// The id is always recomputed from the channel's location. Fails with
    /// [`Error::Conflict`] when a channel already lives there, and with
    /// [`Error::Config`] when its base directory is the storage root.
    #[instrument(skip(self, channel, cancel), fields(channel = %channel.name))]
    pub async fn create_channel(
        &self,
        mut channel: Channel,
        cancel: &CancellationToken,
    ) -> Result<Channel> {
        check_base_dir(&channel)?;
        let id = channel.assign_id().to_string();

        let mut store = self.load(cancel).await?;
        if store.get_record(&id).is_some() {
            return Err(Error::Conflict(id));
        }

        channel.last_modified = unix_now();
        store.set_record(channel.clone())?;
        self.save(&store, cancel).await?;

        info!(%id, base_dir = %channel.base_dir, "Channel created");
        Ok(channel)
    }

    /// Replace an existing channel. Fails with [`Error::NotFound`] when the id is unknown.
    #[instrument(skip(self, channel, cancel), fields(channel = %channel.name))]
    pub async fn update_channel(
        &self,
        mut channel: Channel,
        cancel: &CancellationToken,
    ) -> Result<Channel> {
        let id = channel.id.clone().ok_or(Error::MissingId)?;
        check_base_dir(&channel)?;

        let mut store = self.load(cancel).await?;
        if store.get_record(&id).is_none() {
            return Err(Error::NotFound(id));
        }

        channel.last_modified = unix_now();
        store.set_record(channel.clone())?;
        self.save(&store, cancel).await?;

        info!(%id, "Channel updated");
        Ok(channel)
    }

    /// Remove a channel and everything stored under its base directory.
    ///
    /// Returns `false` when the channel does not exist.
    #[instrument(skip(self, cancel))]
    pub async fn delete_channel(&self, id: &str, cancel: &CancellationToken) -> Result<bool> {
        let mut store = self.load(cancel).await?;
        let Some(channel) = store.get_record(id).cloned() else {
            return Ok(false);
        };

        store.remove_record(id);
        self.storage
            .delete_directory(&channel.base_dir, cancel)
            .await?;
        self.save(&store, cancel).await?;

        info!(base_dir = %channel.base_dir, "Channel deleted");
        Ok(true)
    }

    pub async fn get_channel(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Channel>> {
        let store = self.load(cancel).await?;
        Ok(store.get_record(id).cloned())
    }

    /// All channels, most recently modified first
    pub async fn get_all_channels(&self, cancel: &CancellationToken) -> Result<Arc<[Channel]>> {
        Ok(self.load(cancel).await?.records())
    }

    async fn load(&self, cancel: &CancellationToken) -> Result<RecordStore<Channel>> {
        self.storage.load_store(&self.index_file, cancel).await
    }

    async fn save(&self, store: &RecordStore<Channel>, cancel: &CancellationToken) -> Result<()> {
        self.storage.save_store(&self.index_file, store, cancel).await
    }
}

/// A channel owns its own directory, never the storage root
fn check_base_dir(channel: &Channel) -> Result<()> {
    if join_path(&[&channel.base_dir]).is_empty() {
        return Err(Error::Config(format!(
            "channel '{}' needs a base directory below the storage root",
            channel.name
        )));
    }
    Ok(())
}
