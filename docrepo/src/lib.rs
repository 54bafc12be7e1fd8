//! Main docrepo crate: typed repositories over JSON document stores.
//!
//! This crate is the primary entry point for users of the docrepo framework.
//! It re-exports the core types, the `Entity` derive and the storage backends,
//! and opens stores from connection strings.
//!
//! # Features
//!
//! - **Typed repositories** - CRUD and lazy queries over one collection per entity hierarchy
//! - **Collection naming** - Names derived from the type, a marker, or its root ancestor
//! - **Polymorphic collections** - Sibling types share a collection and are told apart on read
//! - **Multiple backends** - In-memory and MongoDB storage behind one trait
//!
//! # Quick Start
//!
//! ```ignore
//! use docrepo::prelude::*;
//! use bson::oid::ObjectId;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
//! #[entity(entity_base)]
//! pub struct Customer {
//!     pub id: Option<ObjectId>,
//!     pub first_name: String,
//!     pub last_name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let endpoint = Endpoint::parse("memory://quickstart")?;
//!     let customers = docrepo::repository_at::<Customer>(&endpoint).await?;
//!
//!     let bob = customers
//!         .add(Customer { id: None, first_name: "Bob".into(), last_name: "Dillon".into() })
//!         .await?;
//!
//!     let found = customers.get_by_id(&bob.id).await?;
//!     assert_eq!(found.map(|c| c.first_name), Some("Bob".to_string()));
//!
//!     let dillons = customers
//!         .filter(Filter::eq("last_name", "Dillon"))
//!         .to_vec()
//!         .await?;
//!     assert_eq!(dillons.len(), 1);
//!
//!     Ok(())
//! }
//! ```
//!
//! Without an explicit endpoint, [`repository`] and [`manager`] use the
//! process-wide default from `DOCREPO_CONNECTION_STRING` or `docrepo.json`
//! (see [`config`]).
//!
//! # Backends
//!
//! - [`memory`] - In-process storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires `mongodb` feature)

#[allow(unused_extern_crates)]
extern crate self as docrepo;

pub mod prelude;
pub mod provider;

pub use docrepo_core::{
    backend, collection, config, document, endpoint, entity, error, manager, query, repository,
    resolver, store,
};
pub use docrepo_macros::Entity;

// Re-export BSON types for convenience
pub use bson;

pub use provider::DefaultProvider;

use docrepo_core::{
    endpoint::Endpoint, entity::Entity, error::DocumentStoreResult, manager::RepositoryManager,
    repository::Repository,
};

/// In-memory storage backend implementations.
pub mod memory {
    pub use docrepo_memory::{InMemoryProvider, InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docrepo_mongodb::{MongoDbProvider, MongoDbStore, MongoDbStoreBuilder};
}

/// Opens the default endpoint and returns a repository for `T`.
pub async fn repository<T: Entity>() -> DocumentStoreResult<Repository<T>> {
    Repository::connect(&DefaultProvider).await
}

/// Opens `endpoint` and returns a repository for `T`.
pub async fn repository_at<T: Entity>(endpoint: &Endpoint) -> DocumentStoreResult<Repository<T>> {
    Repository::connect_to(&DefaultProvider, endpoint).await
}

/// Opens `endpoint` and returns a repository for `T` bound to the collection `name`.
pub async fn repository_named<T: Entity>(
    endpoint: &Endpoint,
    name: &str,
) -> DocumentStoreResult<Repository<T>> {
    Repository::connect_named(&DefaultProvider, endpoint, name).await
}

/// Opens the default endpoint and returns a manager for `T`'s collection.
pub async fn manager<T: Entity>() -> DocumentStoreResult<RepositoryManager<T>> {
    RepositoryManager::connect(&DefaultProvider).await
}

pub async fn manager_at<T: Entity>(endpoint: &Endpoint) -> DocumentStoreResult<RepositoryManager<T>> {
    RepositoryManager::connect_to(&DefaultProvider, endpoint).await
}

pub async fn manager_named<T: Entity>(
    endpoint: &Endpoint,
    name: &str,
) -> DocumentStoreResult<RepositoryManager<T>> {
    RepositoryManager::connect_named(&DefaultProvider, endpoint, name).await
}
