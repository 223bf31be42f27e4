//! Error taxonomy for catalog and storage operations.
//!
//! Expected absence (a missing post, an unknown content id) is reported through
//! `Option`/`bool` return values. The variants here are for conditions a caller
//! cannot treat as a normal outcome.

use thiserror::Error;

/// Errors produced by the record store, storage layer and catalog managers
#[derive(Debug, Error)]
pub enum Error {
    /// A record with the same id already exists
    #[error("A record with id '{0}' already exists")]
    Conflict(String),

    /// The record to update does not exist
    #[error("The requested record '{0}' does not exist")]
    NotFound(String),

    /// A record without an id was handed to a store
    #[error("Record is missing its id")]
    MissingId,

    /// The backend rejected a write or delete
    #[error("Failed to update the remote resource {path}: {reason}")]
    StorageUpdateFailed { path: String, reason: String },

    /// Any other backend failure (connection, auth, timeout)
    #[error("Storage backend error: {0}")]
    Backend(#[from] opendal::Error),

    /// A catalog file could not be parsed or serialized
    #[error("Catalog serialization error: {0}")]
    Catalog(#[from] serde_json::Error),

    /// Feed document construction failed
    #[error("Feed generation error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Declared upload length exceeds the configured maximum
    #[error("Content length {length} exceeds the maximum of {max} bytes")]
    ContentTooLarge { length: u64, max: u64 },

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// The configured storage type names no known or registered backend
    #[error("No storage backend named '{0}' is available")]
    UnknownBackend(String),

    #[error("Missing secret '{0}'")]
    MissingSecret(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The operation was cancelled before the backend call completed
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// True for the duplicate-id outcome of a create
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    /// True when an update targeted a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_predicates() {
        assert!(Error::Conflict("abc".into()).is_conflict());
        assert!(!Error::Conflict("abc".into()).is_not_found());
        assert!(Error::NotFound("abc".into()).is_not_found());
        assert!(!Error::Cancelled.is_conflict());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::ContentTooLarge { length: 20, max: 10 };
        assert_eq!(err.to_string(), "Content length 20 exceeds the maximum of 10 bytes");

        let err = Error::StorageUpdateFailed {
            path: "blog/index.json".into(),
            reason: "denied".into(),
        };
        assert!(err.to_string().contains("blog/index.json"));
    }
}
