//! Channel definitions.
//!
//! A channel is a blog or podcast that owns one directory in remote storage.
//! Its id is derived from where it lives, so two channels can never share
//! the same base directory and index file.

use serde::{Deserialize, Serialize};

use super::feed::FeedConfig;
use super::record::{sha1_hex, Record};
use crate::storage::join_path;

/// Default post index file name within a channel
pub const DEFAULT_INDEX_PATH: &str = "index.json";

/// Default content directory within a channel
pub const DEFAULT_CONTENT_DIR: &str = "content";

fn default_index_path() -> String {
    DEFAULT_INDEX_PATH.to_string()
}

fn default_content_dir() -> String {
    DEFAULT_CONTENT_DIR.to_string()
}

/// A named content area with its own storage directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// SHA-1 of `{base_dir}/{index_path}`
    #[serde(default)]
    pub id: Option<String>,

    pub name: String,

    /// Channel root directory in storage
    #[serde(rename = "path")]
    pub base_dir: String,

    /// Post index file, relative to `base_dir`
    #[serde(rename = "index", default = "default_index_path")]
    pub index_path: String,

    /// Content directory, relative to `base_dir`
    #[serde(rename = "content", default = "default_content_dir")]
    pub content_dir: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed: Option<FeedConfig>,

    #[serde(rename = "date", default)]
    pub last_modified: i64,
}

impl Channel {
    /// Create a channel with default index and content locations
    pub fn new(name: impl Into<String>, base_dir: impl Into<String>) -> Self {
        let mut channel = Self {
            id: None,
            name: name.into(),
            base_dir: base_dir.into(),
            index_path: default_index_path(),
            content_dir: default_content_dir(),
            feed: None,
            last_modified: 0,
        };
        channel.assign_id();
        channel
    }

    /// Compute the channel id for a base directory and index file
    pub fn compute_id(base_dir: &str, index_path: &str) -> String {
        sha1_hex(&format!("{}/{}", base_dir, index_path))
    }

    /// Recompute the id from the current location
    pub fn assign_id(&mut self) -> &str {
        self.id.insert(Self::compute_id(&self.base_dir, &self.index_path))
    }

    pub fn with_index_path(mut self, index_path: impl Into<String>) -> Self {
        self.index_path = index_path.into();
        self.assign_id();
        self
    }

    pub fn with_content_dir(mut self, content_dir: impl Into<String>) -> Self {
        self.content_dir = content_dir.into();
        self
    }

    pub fn with_feed(mut self, feed: FeedConfig) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Resolve a path relative to the channel directory
    pub fn path(&self, relative: &str) -> String {
        join_path(&[&self.base_dir, relative])
    }

    /// Storage path of the post index
    pub fn index_file(&self) -> String {
        self.path(&self.index_path)
    }

    /// Path of a content blob relative to the channel directory
    pub fn content_file(&self, file_path: &str) -> String {
        join_path(&[&self.content_dir, file_path])
    }

    /// Storage path of the feed document, if a feed is configured
    pub fn feed_file(&self) -> Option<String> {
        self.feed.as_ref().map(|feed| self.path(&feed.feed_path))
    }
}

impl Record for Channel {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn last_modified(&self) -> i64 {
        self.last_modified
    }
}
