//! Administrative access to the collection backing an entity type.
//!
//! A [`RepositoryManager<T>`] resolves its collection exactly as
//! [`Repository<T>`](crate::repository::Repository) does, and operates on the
//! collection as a whole: existence, statistics, indexes and dropping.

use std::marker::PhantomData;
use tracing::debug;

use crate::{
    backend::{CollectionStats, IndexInfo},
    collection::Collection,
    config::default_endpoint,
    endpoint::Endpoint,
    entity::Entity,
    error::DocumentStoreResult,
    provider::StoreProvider,
    resolver::CollectionNameResolver,
    store::DocumentStore,
};

/// Collection-level operations for the collection backing `T`.
#[derive(Debug)]
pub struct RepositoryManager<T: Entity> {
    collection: Collection,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for RepositoryManager<T> {
    fn clone(&self) -> Self {
        Self { collection: self.collection.clone(), _marker: PhantomData }
    }
}

impl<T: Entity> RepositoryManager<T> {
    pub fn from_collection(collection: Collection) -> Self {
        Self { collection, _marker: PhantomData }
    }

    pub fn new(store: &DocumentStore) -> DocumentStoreResult<Self> {
        store.manager::<T>()
    }

    pub fn with_name(store: &DocumentStore, name: &str) -> DocumentStoreResult<Self> {
        store.manager_named::<T>(name)
    }

    /// Opens the default endpoint and binds to the collection resolved from `T`.
    pub async fn connect<P>(provider: &P) -> DocumentStoreResult<Self>
    where
        P: StoreProvider + ?Sized,
    {
        let name = CollectionNameResolver::resolve::<T>()?;
        Self::connect_named(provider, default_endpoint()?, &name).await
    }

    pub async fn connect_to<P>(provider: &P, endpoint: &Endpoint) -> DocumentStoreResult<Self>
    where
        P: StoreProvider + ?Sized,
    {
        let name = CollectionNameResolver::resolve::<T>()?;
        Self::connect_named(provider, endpoint, &name).await
    }

    pub async fn connect_named<P>(
        provider: &P,
        endpoint: &Endpoint,
        name: &str,
    ) -> DocumentStoreResult<Self>
    where
        P: StoreProvider + ?Sized,
    {
        let collection = Collection::new(name, provider.open(endpoint).await?.backend().clone())?;
        Ok(Self::from_collection(collection))
    }

    /// The name of the managed collection.
    pub fn name(&self) -> &str {
        self.collection.name()
    }

    /// Returns `true` if the collection exists, even when it holds no documents.
    pub async fn exists(&self) -> DocumentStoreResult<bool> {
        self.collection.exists().await
    }

    /// Drops the collection, including documents of every type stored in it.
    ///
    /// Dropping a collection that does not exist is a no-op.
    pub async fn drop(&self) -> DocumentStoreResult<()> {
        debug!(collection = self.name(), "dropping collection");
        self.collection.drop().await
    }

    /// Reports size and document count for the collection.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::CollectionNotFound`](crate::error::DocumentStoreError::CollectionNotFound)
    /// if the collection does not exist.
    pub async fn stats(&self) -> DocumentStoreResult<CollectionStats> {
        self.collection.stats().await
    }

    /// Uncompressed size of all documents in the collection, in bytes.
    pub async fn total_data_size(&self) -> DocumentStoreResult<u64> {
        Ok(self.stats().await?.size_bytes)
    }

    /// Storage allocated to the collection's documents and indexes, in bytes.
    pub async fn total_storage_size(&self) -> DocumentStoreResult<u64> {
        let stats = self.stats().await?;
        Ok(stats.storage_size_bytes + stats.total_index_size_bytes)
    }

    /// Creates an index on `field` if it does not exist yet.
    ///
    /// A unique index makes later inserts with a repeated value fail with
    /// [`DocumentStoreError::DuplicateKey`](crate::error::DocumentStoreError::DuplicateKey).
    pub async fn ensure_index(&self, field: &str, unique: bool) -> DocumentStoreResult<()> {
        debug!(collection = self.name(), field, unique, "ensuring index");
        self.collection.add_index(field, unique).await
    }

    /// Removes the index on `field`. Removing a missing index is a no-op.
    pub async fn drop_index(&self, field: &str) -> DocumentStoreResult<()> {
        debug!(collection = self.name(), field, "dropping index");
        self.collection.drop_index(field).await
    }

    pub async fn index_exists(&self, field: &str) -> DocumentStoreResult<bool> {
        Ok(self
            .list_indexes()
            .await?
            .iter()
            .any(|index| index.field == field))
    }

    /// Lists the secondary indexes on the collection.
    pub async fn list_indexes(&self) -> DocumentStoreResult<Vec<IndexInfo>> {
        self.collection.list_indexes().await
    }
}
