//! Convenient re-exports of commonly used types from docrepo.
//!
//! ```ignore
//! use docrepo::prelude::*;
//! ```
//!
//! This provides access to:
//! - The entity contract and its derive
//! - Repositories, managers and stores
//! - Predicate construction
//! - Endpoints and error types

pub use docrepo_core::{
    backend::{CollectionStats, IndexInfo, StoreBackend, StoreBackendBuilder},
    collection::Collection,
    document::{DISCRIMINATOR_FIELD, EntityExt},
    endpoint::Endpoint,
    entity::{Entity, EntityDescriptor, EntityId, Lineage},
    error::{DocumentStoreError, DocumentStoreResult},
    manager::RepositoryManager,
    provider::StoreProvider,
    query::{Expr, FieldOp, Filter, Query, QueryBuilder, QueryVisitor, Sort, SortDirection},
    repository::{Repository, RepositoryQuery},
    resolver::CollectionNameResolver,
    store::DocumentStore,
};
pub use docrepo_macros::Entity;

pub use crate::provider::DefaultProvider;
