//! Error types and result types for repository operations.
//!
//! Every fallible operation in the workspace returns [`DocumentStoreResult<T>`].
//! Absence of a single document is not an error: lookups return `Option`.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document store.
///
/// Setup failures ([`Configuration`](Self::Configuration) and
/// [`Connection`](Self::Connection)) surface when a repository or manager is
/// constructed. The remaining variants surface from individual operations.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// Missing or invalid configuration, including an empty collection name.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The endpoint is malformed, uses an unsupported scheme, or cannot be reached.
    #[error("Connection error: {0}")]
    Connection(String),
    /// A document with the same identifier (or unique index value) already exists.
    #[error("Duplicate key {id} in collection {collection}")]
    DuplicateKey {
        /// Rendered identifier or index value that collided.
        id: String,
        /// Collection the insert targeted.
        collection: String,
    },
    /// The predicate cannot be expressed by the provider's filter language.
    #[error("Query translation error: {0}")]
    QueryTranslation(String),
    /// Serialization/deserialization error when converting between entities and documents.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The requested collection does not exist in the store.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    /// The document or entity has an invalid structure or identity.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl DocumentStoreError {
    /// Builds a [`DuplicateKey`](Self::DuplicateKey) error.
    pub fn duplicate_key(id: impl Into<String>, collection: impl Into<String>) -> Self {
        DocumentStoreError::DuplicateKey {
            id: id.into(),
            collection: collection.into(),
        }
    }

    /// Returns `true` if this error reports an identifier collision.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, DocumentStoreError::DuplicateKey { .. })
    }

    /// Returns `true` if the caller can retry the operation after changing its input.
    ///
    /// Only identifier collisions qualify: retrying with a fresh identifier can succeed.
    /// Configuration, connection and translation failures must be fixed, not retried.
    pub fn is_retriable(&self) -> bool {
        self.is_duplicate_key()
    }
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_duplicate_keys_are_retriable() {
        assert!(DocumentStoreError::duplicate_key("aaa", "Customer").is_retriable());
        assert!(!DocumentStoreError::Configuration("empty".into()).is_retriable());
        assert!(!DocumentStoreError::Connection("refused".into()).is_retriable());
        assert!(!DocumentStoreError::QueryTranslation("regex".into()).is_retriable());
    }

    #[test]
    fn duplicate_key_message_names_collection() {
        let err = DocumentStoreError::duplicate_key("\"xyz\"", "MyTestCollection");

        assert_eq!(
            err.to_string(),
            "Duplicate key \"xyz\" in collection MyTestCollection"
        );
    }
}
