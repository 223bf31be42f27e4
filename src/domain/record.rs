//! The minimal contract shared by every catalog entry.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha1::{Digest, Sha1};

/// An entity that can be kept in a [`RecordStore`](crate::store::RecordStore)
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The record id, if one has been assigned
    fn id(&self) -> Option<&str>;

    /// Last modification time in unix seconds
    fn last_modified(&self) -> i64;
}

/// Current time in unix seconds
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Lowercase hex SHA-1 digest of the input
pub fn sha1_hex(input: &str) -> String {
    hex::encode(Sha1::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1_hex_known_value() {
        assert_eq!(sha1_hex("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_sha1_hex_is_lowercase_and_stable() {
        let a = sha1_hex("blog/index.json");
        let b = sha1_hex("blog/index.json");
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
        assert_eq!(a, a.to_lowercase());
    }
}
