//! Feed synthesis.
//!
//! [`build_feed`] turns a channel and its posts into an RSS 2.0 document with
//! iTunes and Podcasting 2.0 extensions. It does no I/O; the post manager
//! gathers post bodies and writes the result as one blob.

pub mod builder;

pub use builder::{build_feed, select_feed_posts, FeedItem, GENERATOR};

/// MIME type the feed document is stored with
pub const RSS_CONTENT_TYPE: &str = "application/rss+xml";
