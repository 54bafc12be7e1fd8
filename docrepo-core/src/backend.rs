//! Storage backend abstraction: the collection access provider.
//!
//! A [`StoreBackend`] speaks one store's protocol. Repositories and managers
//! never talk to a store directly; they hand every operation to the backend
//! together with the name of the collection they are bound to.
//!
//! Documents cross this boundary as `(id, document)` pairs of BSON values, so
//! identifier types stay opaque to the backend.
//!
//! ```ignore
//! use docrepo::backend::StoreBackend;
//! use bson::{Bson, doc};
//!
//! let backend = MyBackendImpl::new();
//! let doc = Bson::Document(doc! { "name": "Alice", "_t": "Customer" });
//! backend.insert_documents(vec![(Bson::String("alice".into()), doc)], "Customer").await?;
//! ```

use async_trait::async_trait;
use bson::Bson;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::{
    error::DocumentStoreResult,
    query::{Expr, Query},
};

/// Collection-level metadata reported by a backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Namespace the statistics describe.
    pub name: String,
    /// Number of documents in the collection.
    pub document_count: u64,
    /// Uncompressed size of all documents, in bytes.
    pub size_bytes: u64,
    /// Storage allocated for the documents, in bytes.
    pub storage_size_bytes: u64,
    /// Number of indexes, including the primary id index.
    pub index_count: u64,
    /// Size of all indexes, in bytes.
    pub total_index_size_bytes: u64,
}

/// A secondary index on a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub field: String,
    pub unique: bool,
}

/// Abstract interface for document storage backends.
///
/// Implementations must be thread-safe. Each call is one independent request
/// against the store: no call holds locks or state across calls, and nothing
/// is retried on failure.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts new documents, creating the collection if needed.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DuplicateKey`](crate::error::DocumentStoreError::DuplicateKey)
    /// if an identifier (or unique index value) is already present. No document
    /// of the batch is written in that case when the backend can guarantee it.
    async fn insert_documents(
        &self,
        documents: Vec<(Bson, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()>;

    /// Replaces documents by identifier, inserting any that are absent.
    async fn replace_documents(
        &self,
        documents: Vec<(Bson, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()>;

    /// Deletes documents by identifier and returns how many were removed.
    ///
    /// Missing identifiers and missing collections are not errors.
    async fn delete_documents(&self, ids: Vec<Bson>, collection: &str) -> DocumentStoreResult<u64>;

    /// Deletes every document matching `filter` (all documents if `None`).
    async fn delete_matching(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> DocumentStoreResult<u64>;

    /// Retrieves documents by identifier. Missing identifiers are omitted.
    async fn get_documents(
        &self,
        ids: Vec<Bson>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Runs a structured query against a collection.
    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Counts documents matching `filter` (all documents if `None`).
    async fn count_documents(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> DocumentStoreResult<u64>;

    /// Creates an empty collection. Creating an existing collection is a no-op.
    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()>;

    /// Drops a collection and all its documents. Dropping a missing collection is a no-op.
    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()>;

    /// Returns `true` if the collection currently exists, even when empty.
    async fn collection_exists(&self, name: &str) -> DocumentStoreResult<bool>;

    /// Lists the names of all collections in the store.
    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;

    /// Reports collection statistics.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::CollectionNotFound`](crate::error::DocumentStoreError::CollectionNotFound)
    /// if the collection does not exist.
    async fn collection_stats(&self, name: &str) -> DocumentStoreResult<CollectionStats>;

    /// Creates an index on `field`. Re-creating an identical index is a no-op.
    async fn add_index(
        &self,
        collection: &str,
        field: &str,
        unique: bool,
    ) -> DocumentStoreResult<()>;

    /// Removes the index on `field`. Removing a missing index is a no-op.
    async fn drop_index(&self, collection: &str, field: &str) -> DocumentStoreResult<()>;

    /// Lists the secondary indexes of a collection.
    async fn list_indexes(&self, collection: &str) -> DocumentStoreResult<Vec<IndexInfo>>;
}

/// Factory trait for creating backend instances.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
