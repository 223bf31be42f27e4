//! Post Catalog Integration Tests
//!
//! Tests for publish identity, update/delete semantics and feed regeneration.

use std::io::Cursor;
use std::sync::Arc;

use pressbox::config::ResolvedConfig;
use pressbox::domain::record::sha1_hex;
use pressbox::domain::{Channel, ContentType, FeedConfig, Post};
use pressbox::storage::{MemoryStorage, StorageFacade};
use pressbox::{Error, Services};
use tokio_util::sync::CancellationToken;

fn setup() -> (Arc<MemoryStorage>, Services) {
    let memory = Arc::new(MemoryStorage::new());
    let services =
        Services::with_storage(&ResolvedConfig::default(), StorageFacade::new(memory.clone()));
    (memory, services)
}

fn feed_channel() -> Channel {
    Channel::new("Field Notes", "blog").with_feed(
        FeedConfig::new("https://example.com/blog", "feed.xml").with_description("Notes"),
    )
}

fn feed_xml(memory: &MemoryStorage) -> String {
    let feed = memory.object("blog/feed.xml").expect("feed written");
    assert_eq!(feed.content_type, "application/rss+xml");
    String::from_utf8(feed.data.to_vec()).unwrap()
}

#[tokio::test]
async fn test_publish_derives_id_and_provisions_body() {
    let (_, services) = setup();
    let channel = Channel::new("Blog", "blog");
    let cancel = CancellationToken::new();

    let published = services
        .posts
        .publish_post(&channel, Post::new("Hi", "Bob", "S"), &cancel)
        .await
        .unwrap();

    let t = published.created;
    assert_eq!(published.last_modified, t);
    assert_eq!(
        published.id.as_deref(),
        Some(sha1_hex(&format!("Hi.Bob.S.{}", t)).as_str())
    );

    let id = published.id.unwrap();
    let body = services
        .content
        .get_meta(&channel, &id, &cancel)
        .await
        .unwrap()
        .expect("body record");
    assert_eq!(body.length, 0);
    assert_eq!(body.content_type.as_deref(), Some("text/html"));
}

#[tokio::test]
async fn test_publish_without_feed_writes_no_feed() {
    let (memory, services) = setup();
    let channel = Channel::new("Blog", "blog");

    services
        .posts
        .publish_post(&channel, Post::new("Hi", "Bob", "S"), &CancellationToken::new())
        .await
        .unwrap();

    assert!(memory.contains("blog/index.json"));
    assert!(!memory.paths().iter().any(|p| p.ends_with(".xml")));
}

#[tokio::test]
async fn test_update_preserves_created() {
    let (_, services) = setup();
    let channel = feed_channel();
    let cancel = CancellationToken::new();

    let published = services
        .posts
        .publish_post(&channel, Post::new("Hi", "Bob", "S"), &cancel)
        .await
        .unwrap();
    let id = published.id.clone().unwrap();

    let edited = Post {
        title: "Hi again".into(),
        created: 0,
        ..published.clone()
    };
    assert!(services.posts.update_post(&channel, edited, &cancel).await.unwrap());

    let loaded = services.posts.get_post(&channel, &id, &cancel).await.unwrap().unwrap();
    assert_eq!(loaded.title, "Hi again");
    assert_eq!(loaded.created, published.created);
    assert!(loaded.last_modified >= published.last_modified);
}

#[tokio::test]
async fn test_update_missing_post_returns_false() {
    let (memory, services) = setup();
    let channel = feed_channel();
    let cancel = CancellationToken::new();

    let ghost = Post {
        id: Some("ghost".into()),
        ..Post::new("Ghost", "Nobody", "")
    };
    assert!(!services.posts.update_post(&channel, ghost, &cancel).await.unwrap());
    assert!(!services
        .posts
        .update_post(&channel, Post::new("No id", "Nobody", ""), &cancel)
        .await
        .unwrap());
    assert!(memory.paths().is_empty());
}

#[tokio::test]
async fn test_delete_post_removes_body_and_updates_feed() {
    let (memory, services) = setup();
    let channel = feed_channel();
    let cancel = CancellationToken::new();

    let post = services
        .posts
        .publish_post(&channel, Post::new("Hi", "Bob", "S"), &cancel)
        .await
        .unwrap();
    let id = post.id.unwrap();
    assert!(feed_xml(&memory).contains(&format!("<guid>{}</guid>", id)));

    assert!(services.posts.delete_post(&channel, &id, &cancel).await.unwrap());

    assert!(services.posts.get_post(&channel, &id, &cancel).await.unwrap().is_none());
    assert!(services.content.get_meta(&channel, &id, &cancel).await.unwrap().is_none());
    assert!(!feed_xml(&memory).contains("<item>"));
}

#[tokio::test]
async fn test_delete_missing_post_changes_nothing() {
    let (memory, services) = setup();
    let channel = feed_channel();
    let cancel = CancellationToken::new();

    services
        .posts
        .publish_post(&channel, Post::new("Hi", "Bob", "S"), &cancel)
        .await
        .unwrap();

    let snapshot: Vec<_> = memory
        .paths()
        .into_iter()
        .map(|p| (p.clone(), memory.object(&p).unwrap().data))
        .collect();

    let deleted = services
        .posts
        .delete_post(&channel, "does-not-exist", &cancel)
        .await
        .unwrap();

    assert!(!deleted);
    let after: Vec<_> = memory
        .paths()
        .into_iter()
        .map(|p| (p.clone(), memory.object(&p).unwrap().data))
        .collect();
    assert_eq!(after, snapshot);
}

#[tokio::test]
async fn test_feed_caps_items_at_default() {
    let (memory, services) = setup();
    let channel = feed_channel();
    let cancel = CancellationToken::new();

    for i in 0..30 {
        services
            .posts
            .publish_post(&channel, Post::new(format!("Post {}", i), "Ada", "S"), &cancel)
            .await
            .unwrap();
    }

    assert_eq!(services.posts.get_posts(&channel, &cancel).await.unwrap().len(), 30);
    assert_eq!(feed_xml(&memory).matches("<item>").count(), 20);
}

#[tokio::test]
async fn test_feed_includes_html_body() {
    let (memory, services) = setup();
    let channel = feed_channel();
    let cancel = CancellationToken::new();

    let post = services
        .posts
        .publish_post(&channel, Post::new("Hi", "Bob", "Plain summary"), &cancel)
        .await
        .unwrap();
    let id = post.id.unwrap();

    let xml = feed_xml(&memory);
    assert!(xml.contains("<description>Plain summary</description>"));
    assert!(!xml.contains("content:encoded>"));

    // Upload the body, content changes alone do not touch the feed
    let meta = services.content.get_meta(&channel, &id, &cancel).await.unwrap().unwrap();
    let mut body = Cursor::new(b"<p>Hello</p>".to_vec());
    services
        .content
        .set_content(&channel, meta, &mut body, ContentType::Html, &cancel)
        .await
        .unwrap();
    assert_eq!(feed_xml(&memory), xml);

    assert!(services.posts.update_feed_for_channel(&channel, &cancel).await.unwrap());

    let xml = feed_xml(&memory);
    assert!(xml.contains("<description><![CDATA[<p>Hello</p>]]></description>"));
    assert!(xml.contains("<content:encoded><![CDATA[<p>Hello</p>]]></content:encoded>"));
}

#[tokio::test]
async fn test_update_feed_without_feed_config() {
    let (memory, services) = setup();
    let channel = Channel::new("Blog", "blog");

    let written = services
        .posts
        .update_feed_for_channel(&channel, &CancellationToken::new())
        .await
        .unwrap();

    assert!(!written);
    assert_eq!(memory.paths(), vec!["blog/index.json".to_string()]);
}

#[tokio::test]
async fn test_storage_failure_propagates() {
    let (memory, services) = setup();
    memory.set_reject_writes(true);

    let err = services
        .posts
        .publish_post(&Channel::new("Blog", "blog"), Post::new("Hi", "Bob", "S"), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StorageUpdateFailed { .. }));
}

#[tokio::test]
async fn test_cancelled_publish() {
    let (memory, services) = setup();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = services
        .posts
        .publish_post(&Channel::new("Blog", "blog"), Post::new("Hi", "Bob", "S"), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert!(memory.paths().is_empty());
}
