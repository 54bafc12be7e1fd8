//! Untyped handle to one named collection.
//!
//! A [`Collection`] pairs a collection name with a shared backend. It is what
//! repositories and managers bind to, and it is exposed to callers who need to
//! issue raw BSON operations against the same collection.

use bson::Bson;
use std::sync::Arc;

use crate::{
    backend::{CollectionStats, IndexInfo, StoreBackend},
    error::DocumentStoreResult,
    query::{Expr, Query},
    resolver::validate_collection_name,
};

/// A cloneable handle to a named collection.
#[derive(Clone, Debug)]
pub struct Collection {
    name: String,
    backend: Arc<dyn StoreBackend>,
}

impl Collection {
    /// Binds a handle to `name` on `backend`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `name` is empty.
    pub fn new(name: impl Into<String>, backend: Arc<dyn StoreBackend>) -> DocumentStoreResult<Self> {
        let name = name.into();
        validate_collection_name(&name)?;

        Ok(Self { name, backend })
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the backend this collection delegates to.
    pub fn backend(&self) -> &Arc<dyn StoreBackend> {
        &self.backend
    }

    pub async fn insert(&self, documents: Vec<(Bson, Bson)>) -> DocumentStoreResult<()> {
        self.backend
            .insert_documents(documents, &self.name)
            .await
    }

    pub async fn replace(&self, documents: Vec<(Bson, Bson)>) -> DocumentStoreResult<()> {
        self.backend
            .replace_documents(documents, &self.name)
            .await
    }

    pub async fn delete(&self, ids: Vec<Bson>) -> DocumentStoreResult<u64> {
        self.backend
            .delete_documents(ids, &self.name)
            .await
    }

    pub async fn delete_matching(&self, filter: Option<Expr>) -> DocumentStoreResult<u64> {
        self.backend
            .delete_matching(filter, &self.name)
            .await
    }

    /// Retrieves documents by identifier. Missing identifiers are omitted.
    pub async fn get(&self, ids: Vec<Bson>) -> DocumentStoreResult<Vec<Bson>> {
        self.backend
            .get_documents(ids, &self.name)
            .await
    }

    pub async fn query(&self, query: Query) -> DocumentStoreResult<Vec<Bson>> {
        self.backend
            .query_documents(query, &self.name)
            .await
    }

    pub async fn count(&self, filter: Option<Expr>) -> DocumentStoreResult<u64> {
        self.backend
            .count_documents(filter, &self.name)
            .await
    }

    pub async fn exists(&self) -> DocumentStoreResult<bool> {
        self.backend.collection_exists(&self.name).await
    }

    pub async fn create(&self) -> DocumentStoreResult<()> {
        self.backend.create_collection(&self.name).await
    }

    pub async fn drop(&self) -> DocumentStoreResult<()> {
        self.backend.drop_collection(&self.name).await
    }

    pub async fn stats(&self) -> DocumentStoreResult<CollectionStats> {
        self.backend.collection_stats(&self.name).await
    }

    pub async fn add_index(&self, field: &str, unique: bool) -> DocumentStoreResult<()> {
        self.backend
            .add_index(&self.name, field, unique)
            .await
    }

    pub async fn drop_index(&self, field: &str) -> DocumentStoreResult<()> {
        self.backend
            .drop_index(&self.name, field)
            .await
    }

    pub async fn list_indexes(&self) -> DocumentStoreResult<Vec<IndexInfo>> {
        self.backend.list_indexes(&self.name).await
    }
}
