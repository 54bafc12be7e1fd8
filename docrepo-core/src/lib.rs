//! Typed repositories over JSON document stores.
//!
//! This crate is the core of the docrepo project and provides:
//!
//! - **Entity contract** ([`entity`]) - Identity, identifier types and static type descriptors
//! - **Collection naming** ([`resolver`]) - Deriving a collection name from an entity type
//! - **Document codec** ([`document`]) - Entity to document conversion with a type discriminator
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing storage providers
//! - **Query and filtering API** ([`query`]) - Predicate construction and translation
//! - **Repositories** ([`repository`], [`manager`]) - Typed CRUD and collection administration
//! - **Endpoints** ([`endpoint`], [`config`], [`provider`]) - Connection strings and the default endpoint
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
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
//! let customers = store.repository::<Customer>()?;
//! assert_eq!(customers.collection_name(), "Customer");
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrepo_core;

pub mod backend;
pub mod collection;
pub mod config;
pub mod document;
pub mod endpoint;
pub mod entity;
pub mod error;
pub mod manager;
pub mod provider;
pub mod query;
pub mod repository;
pub mod resolver;
pub mod store;
