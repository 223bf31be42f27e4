//! JSON-backed record store.
//!
//! A store is an in-memory collection of [`Record`]s keyed by id and persisted
//! as a single JSON document:
//!
//! ```text
//! { "last_modified": 1700000000, "version": "0.1.0", "records": [ ... ] }
//! ```
//!
//! The record list is an immutable snapshot. Every mutation builds a new list,
//! sorted newest first, and swaps it in, so readers holding a snapshot from
//! [`RecordStore::records`] never observe a partial update.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{unix_now, Record};
use crate::error::{Error, Result};

/// Version written to catalogs that carry no recognizable version
pub const CURRENT_VERSION: &str = "0.1.0";

#[derive(Serialize)]
struct CatalogDocumentRef<'a, T> {
    last_modified: i64,
    version: &'a str,
    records: &'a [T],
}

#[derive(Deserialize)]
struct CatalogDocument<T> {
    last_modified: i64,
    version: Option<serde_json::Value>,
    records: Option<Vec<T>>,
}

/// Id-keyed collection of records with JSON persistence
#[derive(Debug, Clone)]
pub struct RecordStore<T> {
    last_modified: i64,
    version: Option<String>,
    records: Arc<[T]>,
}

impl<T: Record> Default for RecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> RecordStore<T> {
    /// Create an empty store stamped with the unix epoch
    pub fn new() -> Self {
        Self {
            last_modified: 0,
            version: None,
            records: Arc::from(Vec::new()),
        }
    }

    /// Create a store from a catalog document
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut store = Self::new();
        store.load(data)?;
        Ok(store)
    }

    /// Get a record by id (case-insensitive)
    pub fn get_record(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|r| ids_match(r.id(), id))
    }

    /// Read-only snapshot of all records, newest first
    pub fn records(&self) -> Arc<[T]> {
        Arc::clone(&self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Catalog modification time in unix seconds
    pub fn last_modified(&self) -> i64 {
        self.last_modified
    }

    /// Version read from the catalog, if it was recognizable
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Insert a record, replacing any record with the same id
    pub fn set_record(&mut self, record: T) -> Result<()> {
        let id = record.id().ok_or(Error::MissingId)?.to_string();

        let records = self
            .records
            .iter()
            .filter(|r| !ids_match(r.id(), &id))
            .cloned()
            .chain(std::iter::once(record))
            .collect();

        self.records = sorted(records);
        self.last_modified = unix_now();
        Ok(())
    }

    /// Remove a record by id, no-op when absent
    pub fn remove_record(&mut self, id: &str) {
        if self.get_record(id).is_none() {
            return;
        }

        let records = self
            .records
            .iter()
            .filter(|r| !ids_match(r.id(), id))
            .cloned()
            .collect();

        self.records = sorted(records);
    }

    /// Replace the store contents with a catalog document.
    ///
    /// An empty document yields an empty store. A missing or unparsable
    /// version is dropped and replaced with [`CURRENT_VERSION`] on the next
    /// [`store`](Self::store).
    pub fn load(&mut self, data: &[u8]) -> Result<()> {
        if data.iter().all(u8::is_ascii_whitespace) {
            *self = Self::new();
            return Ok(());
        }

        let doc: CatalogDocument<T> = serde_json::from_slice(data)?;

        self.last_modified = doc.last_modified;
        self.version = doc
            .version
            .as_ref()
            .and_then(|v| v.as_str())
            .and_then(parse_version);
        self.records = sorted(doc.records.unwrap_or_default());

        Ok(())
    }

    /// Serialize the store to a catalog document
    pub fn store(&self) -> Result<Vec<u8>> {
        let doc = CatalogDocumentRef {
            last_modified: self.last_modified,
            version: self.version.as_deref().unwrap_or(CURRENT_VERSION),
            records: &self.records,
        };

        Ok(serde_json::to_vec(&doc)?)
    }
}

fn ids_match(record_id: Option<&str>, id: &str) -> bool {
    record_id.is_some_and(|r| r.eq_ignore_ascii_case(id))
}

fn sorted<T: Record>(mut records: Vec<T>) -> Arc<[T]> {
    records.sort_by(|a, b| b.last_modified().cmp(&a.last_modified()));
    Arc::from(records)
}

/// Accept dotted numeric versions with two to four components
fn parse_version(version: &str) -> Option<String> {
    let parts: Vec<&str> = version.trim().split('.').collect();

    let valid = (2..=4).contains(&parts.len())
        && parts.iter().all(|p| !p.is_empty() && p.parse::<u32>().is_ok());

    valid.then(|| version.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Post;

    fn post(id: &str, date: i64) -> Post {
        Post {
            id: Some(id.to_string()),
            last_modified: date,
            ..Post::new("t", "a", "s")
        }
    }

    #[test]
    fn test_set_record_replaces_case_insensitively() {
        let mut store = RecordStore::new();
        store.set_record(post("abc", 1)).unwrap();
        store.set_record(post("ABC", 2)).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get_record("abc").unwrap().last_modified, 2);
    }

    #[test]
    fn test_set_record_requires_id() {
        let mut store: RecordStore<Post> = RecordStore::new();
        let err = store.set_record(Post::new("t", "a", "s")).unwrap_err();
        assert!(matches!(err, Error::MissingId));
    }

    #[test]
    fn test_records_sorted_newest_first() {
        let mut store = RecordStore::new();
        store.set_record(post("a", 10)).unwrap();
        store.set_record(post("b", 30)).unwrap();
        store.set_record(post("c", 20)).unwrap();

        let ids: Vec<_> = store.records().iter().map(|p| p.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_snapshot_unaffected_by_later_mutation() {
        let mut store = RecordStore::new();
        store.set_record(post("a", 1)).unwrap();

        let snapshot = store.records();
        store.remove_record("a");

        assert_eq!(snapshot.len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_empty_document() {
        let store: RecordStore<Post> = RecordStore::from_bytes(b"").unwrap();
        assert!(store.is_empty());
        assert_eq!(store.last_modified(), 0);
    }

    #[test]
    fn test_load_without_records_key() {
        let store: RecordStore<Post> =
            RecordStore::from_bytes(br#"{"last_modified": 42, "version": "0.1.0"}"#).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.last_modified(), 42);
        assert_eq!(store.version(), Some("0.1.0"));
    }

    #[test]
    fn test_unrecognized_version_replaced_on_store() {
        let store: RecordStore<Post> =
            RecordStore::from_bytes(br#"{"last_modified": 1, "version": "banana", "records": []}"#)
                .unwrap();
        assert!(store.version().is_none());

        let json: serde_json::Value = serde_json::from_slice(&store.store().unwrap()).unwrap();
        assert_eq!(json["version"], CURRENT_VERSION);
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        assert!(RecordStore::<Post>::from_bytes(b"{not json").is_err());
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("1.2.3").as_deref(), Some("1.2.3"));
        assert_eq!(parse_version("1.2").as_deref(), Some("1.2"));
        assert!(parse_version("1").is_none());
        assert!(parse_version("1.x.0").is_none());
        assert!(parse_version("").is_none());
    }
}
