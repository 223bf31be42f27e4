//! Catalog entities.
//!
//! Every entity implements [`Record`]: an optional id plus a last-modified
//! stamp in unix seconds.

pub mod channel;
pub mod content;
pub mod feed;
pub mod post;
pub mod record;

pub use channel::Channel;
pub use content::{ContentItem, ContentType};
pub use feed::{ExtendedProperty, FeedConfig};
pub use post::Post;
pub use record::{unix_now, Record};
