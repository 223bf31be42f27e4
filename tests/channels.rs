//! Channel Catalog Integration Tests
//!
//! Tests for channel identity, create/update conflicts and recursive delete.

use std::sync::Arc;

use bytes::Bytes;
use opendal::{services, Operator};
use pressbox::domain::{Channel, FeedConfig};
use pressbox::storage::{MemoryStorage, RemoteStorage, StorageBackend, StorageFacade};
use pressbox::{ChannelManager, Error, RecordStore};
use tokio_util::sync::CancellationToken;

fn setup() -> (Arc<MemoryStorage>, ChannelManager) {
    let memory = Arc::new(MemoryStorage::new());
    let manager = ChannelManager::new(StorageFacade::new(memory.clone()), "channels.json");
    (memory, manager)
}

#[test]
fn test_channel_id_is_function_of_location() {
    let a = Channel::compute_id("blog", "index.json");

    assert_eq!(a, Channel::compute_id("blog", "index.json"));
    assert_ne!(a, Channel::compute_id("blog2", "index.json"));
    assert_ne!(a, Channel::compute_id("blog", "posts.json"));
    assert_eq!(a.len(), 40);
    assert_eq!(a, a.to_lowercase());
}

#[tokio::test]
async fn test_duplicate_location_conflicts() {
    let (_, manager) = setup();
    let cancel = CancellationToken::new();

    manager
        .create_channel(Channel::new("First", "blog"), &cancel)
        .await
        .unwrap();

    let err = manager
        .create_channel(Channel::new("Second", "blog"), &cancel)
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    // Same directory, different index file is a different channel
    manager
        .create_channel(Channel::new("Third", "blog").with_index_path("other.json"), &cancel)
        .await
        .unwrap();

    assert_eq!(manager.get_all_channels(&cancel).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_catalog_persisted() {
    let (memory, manager) = setup();
    let cancel = CancellationToken::new();

    let created = manager
        .create_channel(Channel::new("Blog", "blog"), &cancel)
        .await
        .unwrap();

    let stored = memory.object("channels.json").unwrap();
    assert_eq!(stored.content_type, "application/json");

    let json: serde_json::Value = serde_json::from_slice(&stored.data).unwrap();
    assert_eq!(json["records"][0]["id"], created.id.clone().unwrap());
    assert_eq!(json["records"][0]["path"], "blog");
    assert_eq!(json["records"][0]["index"], "index.json");
}

#[tokio::test]
async fn test_update_channel() {
    let (_, manager) = setup();
    let cancel = CancellationToken::new();

    let mut channel = manager
        .create_channel(Channel::new("Blog", "blog"), &cancel)
        .await
        .unwrap();
    let id = channel.id.clone().unwrap();

    channel.name = "Renamed".into();
    channel.feed = Some(FeedConfig::new("https://example.com/blog", "feed.xml"));
    manager.update_channel(channel, &cancel).await.unwrap();

    let loaded = manager.get_channel(&id.to_uppercase(), &cancel).await.unwrap().unwrap();
    assert_eq!(loaded.name, "Renamed");
    assert_eq!(loaded.feed_file().as_deref(), Some("blog/feed.xml"));
}

#[tokio::test]
async fn test_update_missing_channel_not_found() {
    let (_, manager) = setup();

    let err = manager
        .update_channel(Channel::new("Ghost", "ghost"), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_delete_removes_directory() {
    let (memory, manager) = setup();
    let cancel = CancellationToken::new();

    let channel = manager
        .create_channel(Channel::new("Blog", "blog"), &cancel)
        .await
        .unwrap();
    for path in ["blog/index.json", "blog/content/a.png", "blogroll/index.json"] {
        memory
            .write_file(path, Bytes::from_static(b"x"), "text/plain")
            .await
            .unwrap();
    }

    let deleted = manager
        .delete_channel(channel.id.as_deref().unwrap(), &cancel)
        .await
        .unwrap();

    assert!(deleted);
    assert!(!memory.contains("blog/index.json"));
    assert!(!memory.contains("blog/content/a.png"));
    assert!(memory.contains("blogroll/index.json"));
    assert!(manager.get_all_channels(&cancel).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_write_propagates() {
    let (memory, manager) = setup();
    memory.set_reject_writes(true);

    let err = manager
        .create_channel(Channel::new("Blog", "blog"), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StorageUpdateFailed { .. }));
}

#[tokio::test]
async fn test_root_base_dir_rejected() {
    let (memory, manager) = setup();
    let cancel = CancellationToken::new();

    for base_dir in ["", "/", "\\"] {
        let err = manager
            .create_channel(Channel::new("Root", base_dir), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{:?}", base_dir);
    }
    assert!(memory.paths().is_empty());

    let mut channel = manager
        .create_channel(Channel::new("Blog", "blog"), &cancel)
        .await
        .unwrap();
    channel.base_dir = "/".into();
    let err = manager.update_channel(channel, &cancel).await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    let stored = manager.get_all_channels(&cancel).await.unwrap();
    assert_eq!(stored[0].base_dir, "blog");
}

#[tokio::test]
async fn test_deleting_root_channel_keeps_other_channels() {
    let operator = Operator::new(services::Memory::default()).unwrap().finish();
    let backend = Arc::new(RemoteStorage::from_operator("opendal-memory", operator, None));
    let facade = StorageFacade::new(backend.clone());
    let manager = ChannelManager::new(facade.clone(), "channels.json");
    let cancel = CancellationToken::new();

    let other = manager
        .create_channel(Channel::new("Other", "other"), &cancel)
        .await
        .unwrap();
    backend
        .write_file("other/content/a.png", Bytes::from_static(b"png"), "image/png")
        .await
        .unwrap();

    // A catalog written before root directories were rejected
    let mut store: RecordStore<Channel> = facade.load_store("channels.json", &cancel).await.unwrap();
    let root = Channel::new("Root", "/");
    let root_id = root.id.clone().unwrap();
    store.set_record(root).unwrap();
    facade.save_store("channels.json", &store, &cancel).await.unwrap();

    let err = manager.delete_channel(&root_id, &cancel).await.unwrap_err();
    assert!(matches!(err, Error::StorageUpdateFailed { .. }));

    assert!(backend.read_file("other/content/a.png").await.unwrap().is_some());
    assert!(manager
        .get_channel(other.id.as_deref().unwrap(), &cancel)
        .await
        .unwrap()
        .is_some());
    assert!(manager.get_channel(&root_id, &cancel).await.unwrap().is_some());
}
