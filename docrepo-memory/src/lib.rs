//! In-memory document storage backend for docrepo.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait,
//! plus a provider that serves `memory://name` endpoints from process-wide named stores.
//! It is intended for development and tests.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Full query support** - Filtering (including dotted paths), sorting and paging
//! - **Unique indexes** - Enforced on insert and replace
//! - **Named stores** - `memory://name` endpoints share data across repositories
//!
//! # Quick Start
//!
//! ```ignore
//! use docrepo::prelude::*;
//! use docrepo::memory::InMemoryStore;
//! use bson::oid::ObjectId;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
//! #[entity(entity_base)]
//! pub struct Customer {
//!     pub id: Option<ObjectId>,
//!     pub first_name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DocumentStore::new(InMemoryStore::new());
//!     let customers = store.repository::<Customer>()?;
//!
//!     let bob = customers.add(Customer { id: None, first_name: "Bob".into() }).await?;
//!     assert!(bob.id.is_some());
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrepo_memory;

pub mod evaluator;
pub mod provider;
pub mod store;

pub use provider::InMemoryProvider;
pub use store::{InMemoryStore, InMemoryStoreBuilder};
