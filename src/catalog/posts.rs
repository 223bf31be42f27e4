//! Per-channel post catalog and feed regeneration.

use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::ContentManager;
use crate::domain::{unix_now, Channel, Post};
use crate::error::Result;
use crate::feed::{build_feed, select_feed_posts, FeedItem, RSS_CONTENT_TYPE};
use crate::storage::StorageFacade;
use crate::store::RecordStore;

/// Manages the posts of a channel.
///
/// The catalog lives at the channel's index path. Every change to it
/// regenerates the channel feed when one is configured.
#[derive(Debug, Clone)]
pub struct PostManager {
    storage: StorageFacade,
    content: Arc<ContentManager>,
}

impl PostManager {
    pub fn new(storage: StorageFacade, content: Arc<ContentManager>) -> Self {
        Self { storage, content }
    }

    pub async fn get_post(
        &self,
        channel: &Channel,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Post>> {
        let store = self.load(channel, cancel).await?;
        Ok(store.get_record(id).cloned())
    }

    /// All posts of a channel, most recently modified first
    pub async fn get_posts(&self, channel: &Channel, cancel: &CancellationToken) -> Result<Arc<[Post]>> {
        Ok(self.load(channel, cancel).await?.records())
    }

    /// Publish a new post and provision its empty body.
    ///
    /// The id is derived from the post metadata and the publish second, so
    /// identical posts published within the same second share an id and the
    /// later one replaces the earlier.
    #[instrument(skip(self, channel, post, cancel), fields(channel = %channel.name, title = %post.title))]
    pub async fn publish_post(
        &self,
        channel: &Channel,
        mut post: Post,
        cancel: &CancellationToken,
    ) -> Result<Post> {
        let now = unix_now();
        post.created = now;
        post.last_modified = now;
        let id = post.compute_id(now);
        post.id = Some(id.clone());

        let mut store = self.load(channel, cancel).await?;
        store.set_record(post.clone())?;
        self.save(channel, &store, cancel).await?;

        self.content
            .create_new_post_content(channel, &id, cancel)
            .await?;

        self.write_feed(channel, &store, cancel).await?;

        info!(%id, "Post published");
        Ok(post)
    }

    /// Replace an existing post, keeping its creation time.
    ///
    /// Returns `false` when the post does not exist.
    #[instrument(skip(self, channel, post, cancel), fields(channel = %channel.name, id = ?post.id))]
    pub async fn update_post(
        &self,
        channel: &Channel,
        mut post: Post,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let Some(id) = post.id.clone() else {
            return Ok(false);
        };

        let mut store = self.load(channel, cancel).await?;
        let Some(existing) = store.get_record(&id) else {
            return Ok(false);
        };

        post.created = existing.created;
        post.last_modified = unix_now();
        store.set_record(post)?;

        self.save_with_feed(channel, &store, cancel).await?;

        info!("Post updated");
        Ok(true)
    }

    /// Delete a post and its body. Returns `false` when the post does not exist.
    #[instrument(skip(self, channel, cancel), fields(channel = %channel.name))]
    pub async fn delete_post(
        &self,
        channel: &Channel,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let mut store = self.load(channel, cancel).await?;
        if store.get_record(id).is_none() {
            return Ok(false);
        }

        store.remove_record(id);
        self.content.delete_content(channel, id, cancel).await?;
        self.save_with_feed(channel, &store, cancel).await?;

        info!("Post deleted");
        Ok(true)
    }

    /// Rewrite the post catalog and rebuild the feed.
    ///
    /// Returns `false` when the channel has no feed configured.
    #[instrument(skip(self, channel, cancel), fields(channel = %channel.name))]
    pub async fn update_feed_for_channel(
        &self,
        channel: &Channel,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let store = self.load(channel, cancel).await?;
        self.save_with_feed(channel, &store, cancel).await
    }

    async fn save_with_feed(
        &self,
        channel: &Channel,
        store: &RecordStore<Post>,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        self.save(channel, store, cancel).await?;
        self.write_feed(channel, store, cancel).await
    }

    async fn write_feed(
        &self,
        channel: &Channel,
        store: &RecordStore<Post>,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let (Some(feed), Some(path)) = (channel.feed.as_ref(), channel.feed_file()) else {
            return Ok(false);
        };

        let posts = store.records();
        let selected = select_feed_posts(&posts, feed.item_limit());

        let ids: Vec<&str> = selected.iter().filter_map(|p| p.id.as_deref()).collect();
        let mut bodies = self.content.read_post_bodies(channel, &ids, cancel).await?;

        let items: Vec<FeedItem<'_>> = selected
            .into_iter()
            .map(|post| FeedItem {
                post,
                html: post.id.as_deref().and_then(|id| bodies.remove(id)),
            })
            .collect();

        let xml = build_feed(channel, &items, unix_now())?;
        let len = xml.len();
        self.storage
            .write_bytes(&path, Bytes::from(xml), RSS_CONTENT_TYPE, cancel)
            .await?;

        debug!(%path, items = items.len(), bytes = len, "Feed written");
        Ok(true)
    }

    async fn load(&self, channel: &Channel, cancel: &CancellationToken) -> Result<RecordStore<Post>> {
        self.storage.load_store(&channel.index_file(), cancel).await
    }

    async fn save(
        &self,
        channel: &Channel,
        store: &RecordStore<Post>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.storage
            .save_store(&channel.index_file(), store, cancel)
            .await
    }
}
