//! pressbox - channel, post and feed catalog on remote blob storage
//!
//! A small document database built on an arbitrary remote blob backend.
//! Channels (blogs, podcasts) each own a JSON index of posts and content
//! items; every post change regenerates the channel's RSS feed.
//!
//! # Architecture
//!
//! Catalogs are plain JSON documents stored next to the content they
//! describe:
//! - A [`RecordStore`] holds one catalog in memory as an immutable snapshot
//! - The [`StorageFacade`] reads and writes catalogs and blobs through one
//!   configured backend (S3, FTP/FTPS, or a registered custom backend)
//! - The catalog managers run load, mutate, store cycles per operation
//! - The feed builder renders posts into RSS 2.0 with podcast extensions
//!
//! # Modules
//!
//! - `domain`: Entities (Channel, Post, ContentItem, FeedConfig)
//! - `store`: JSON record store
//! - `storage`: Backends, secrets and the storage facade
//! - `catalog`: Channel, content and post managers
//! - `feed`: RSS document construction
//! - `services`: Startup wiring of the managers
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Create a channel with a feed
//! pressbox channels create "Field Notes" blog --feed-url https://example.com/blog
//!
//! # Publish a post
//! pressbox posts publish <channel-id> --title "Hello" --author Ada
//!
//! # Regenerate the feed
//! pressbox rebuild-feed <channel-id>
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod services;
pub mod storage;
pub mod store;

// Re-export main types at crate root for convenience
pub use catalog::{ChannelManager, ContentManager, PostManager};
pub use domain::{Channel, ContentItem, ContentType, ExtendedProperty, FeedConfig, Post, Record};
pub use error::{Error, Result};
pub use services::Services;
pub use storage::{BackendRegistry, StorageBackend, StorageFacade};
pub use store::RecordStore;
