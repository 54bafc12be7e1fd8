//! Entry point for working with an opened document store.
//!
//! A [`DocumentStore`] owns a shared backend and hands out collection handles,
//! typed repositories and collection managers bound to it. Cloning a store is
//! cheap; clones share the backend.
//!
//! # Example
//!
//! ```ignore
//! use docrepo::memory::InMemoryStore;
//! use docrepo::store::DocumentStore;
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let customers = store.repository::<Customer>()?;
//! ```

use std::sync::Arc;

use crate::{
    backend::StoreBackend,
    collection::Collection,
    entity::Entity,
    error::DocumentStoreResult,
    manager::RepositoryManager,
    repository::Repository,
    resolver::CollectionNameResolver,
};

/// A handle to one logical database on one backend.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    backend: Arc<dyn StoreBackend>,
}

impl DocumentStore {
    /// Creates a store over the given backend.
    pub fn new(backend: impl StoreBackend + 'static) -> Self {
        Self { backend: Arc::new(backend) }
    }

    /// Creates a store over an already shared backend.
    pub fn from_arc(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn StoreBackend> {
        &self.backend
    }

    /// Gets an untyped handle to the collection with the given name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `name` is empty.
    pub fn collection(&self, name: &str) -> DocumentStoreResult<Collection> {
        Collection::new(name, self.backend.clone())
    }

    /// Gets a repository for `T`, bound to the collection resolved from its type.
    pub fn repository<T: Entity>(&self) -> DocumentStoreResult<Repository<T>> {
        self.repository_named(&CollectionNameResolver::resolve::<T>()?)
    }

    /// Gets a repository for `T`, bound to an explicitly named collection.
    pub fn repository_named<T: Entity>(&self, name: &str) -> DocumentStoreResult<Repository<T>> {
        Ok(Repository::from_collection(self.collection(name)?))
    }

    /// Gets a manager for the collection resolved from `T`.
    pub fn manager<T: Entity>(&self) -> DocumentStoreResult<RepositoryManager<T>> {
        self.manager_named(&CollectionNameResolver::resolve::<T>()?)
    }

    /// Gets a manager for an explicitly named collection.
    pub fn manager_named<T: Entity>(&self, name: &str) -> DocumentStoreResult<RepositoryManager<T>> {
        Ok(RepositoryManager::from_collection(self.collection(name)?))
    }

    /// Creates an empty collection. Creating an existing collection is a no-op.
    pub async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.collection(name)?.create().await
    }

    /// Drops a collection and every document in it. Dropping a missing collection is a no-op.
    pub async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.collection(name)?.drop().await
    }

    /// Lists the names of all collections in the store.
    pub async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.backend.list_collections().await
    }
}
