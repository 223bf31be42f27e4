//! Catalog managers.
//!
//! Each manager owns one kind of catalog file and runs every operation as a
//! load, mutate, store cycle through the [`StorageFacade`](crate::storage::StorageFacade).
//! Nothing is cached between calls.
//!
//! Concurrent writers to the same catalog are not serialized: when two
//! updates race, the later store wins and the earlier change is lost.
//!
//! - [`ChannelManager`]: the top-level channel catalog
//! - [`ContentManager`]: per-channel content catalog and blobs
//! - [`PostManager`]: per-channel post catalog and the derived feed

pub mod channels;
pub mod content;
pub mod posts;

pub use channels::ChannelManager;
pub use content::ContentManager;
pub use posts::PostManager;
