//! Record Store Integration Tests
//!
//! Tests for upsert semantics, case-insensitive lookup and the catalog
//! document format.

use pressbox::domain::{ContentItem, Post};
use pressbox::store::{RecordStore, CURRENT_VERSION};

fn post(id: &str, date: i64) -> Post {
    Post {
        id: Some(id.to_string()),
        last_modified: date,
        created: date,
        ..Post::new(format!("Title {}", id), "Ada", "Summary")
    }
}

#[test]
fn test_set_then_get_returns_equal_record() {
    let mut store = RecordStore::new();
    let record = post("abc", 100).with_tags(["rust"]);

    store.set_record(record.clone()).unwrap();

    assert_eq!(store.get_record("abc"), Some(&record));
    assert_eq!(store.get_record("ABC"), Some(&record));
}

#[test]
fn test_set_record_replaces_whole_record() {
    let mut store = RecordStore::new();
    store.set_record(post("abc", 1).with_image("a.png")).unwrap();
    store.set_record(post("abc", 2)).unwrap();

    let stored = store.get_record("abc").unwrap();
    assert_eq!(store.len(), 1);
    assert!(stored.image.is_none());
}

#[test]
fn test_load_store_round_trip() {
    let mut store = RecordStore::new();
    for (id, date) in [("a", 10), ("b", 30), ("c", 20)] {
        store.set_record(post(id, date)).unwrap();
    }

    let bytes = store.store().unwrap();
    let loaded: RecordStore<Post> = RecordStore::from_bytes(&bytes).unwrap();

    assert_eq!(loaded.last_modified(), store.last_modified());
    assert_eq!(loaded.len(), 3);
    for record in store.records().iter() {
        assert_eq!(loaded.get_record(record.id.as_deref().unwrap()), Some(record));
    }
}

#[test]
fn test_remove_missing_record_is_noop() {
    let mut store = RecordStore::new();
    store.set_record(post("a", 1)).unwrap();
    let before = store.store().unwrap();

    store.remove_record("missing");

    assert_eq!(store.store().unwrap(), before);
}

#[test]
fn test_remove_does_not_touch_last_modified() {
    let mut store: RecordStore<Post> =
        RecordStore::from_bytes(br#"{"last_modified": 5, "version": "0.1.0", "records": [
            {"id": "a", "title": "t", "date": 1, "created": 1, "author": "x", "summary": "s"}
        ]}"#)
        .unwrap();

    store.remove_record("A");

    assert!(store.is_empty());
    assert_eq!(store.last_modified(), 5);
}

#[test]
fn test_document_format() {
    let mut store = RecordStore::new();
    store
        .set_record(ContentItem {
            id: Some("xyz".into()),
            file_path: "xyz.png".into(),
            content_type: Some("image/png".into()),
            length: 12,
            ..Default::default()
        })
        .unwrap();

    let json: serde_json::Value = serde_json::from_slice(&store.store().unwrap()).unwrap();

    assert_eq!(json["version"], CURRENT_VERSION);
    assert_eq!(json["last_modified"], store.last_modified());
    assert_eq!(json["records"][0]["id"], "xyz");
    assert_eq!(json["records"][0]["path"], "xyz.png");
    assert_eq!(json["records"][0]["length"], 12);
}

#[test]
fn test_missing_version_tolerated() {
    let store: RecordStore<Post> =
        RecordStore::from_bytes(br#"{"last_modified": 7, "records": []}"#).unwrap();

    assert!(store.version().is_none());
    assert_eq!(store.last_modified(), 7);

    let json: serde_json::Value = serde_json::from_slice(&store.store().unwrap()).unwrap();
    assert_eq!(json["version"], CURRENT_VERSION);
}

#[test]
fn test_empty_source_yields_epoch_store() {
    for source in [&b""[..], &b"   \n"[..]] {
        let store: RecordStore<Post> = RecordStore::from_bytes(source).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.last_modified(), 0);
    }
}
