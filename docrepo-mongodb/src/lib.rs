//! MongoDB storage for docrepo repositories.
//!
//! Enabled through the `mongodb` feature of the `docrepo` crate. Endpoints take
//! the form `mongodb://host[:port]/database[?options]` (or `mongodb+srv://`);
//! the database segment is required.
//!
//! Each collection name resolved for an entity type becomes one MongoDB
//! collection. The entity identifier is stored as `_id`, so duplicate custom
//! identifiers and unique index violations come back from the server as
//! `DuplicateKey` errors. Predicates are compiled to native filters; string
//! operators become anchored, escaped regular expressions.
//!
//! ```ignore
//! use docrepo::prelude::*;
//!
//! let endpoint = Endpoint::parse("mongodb://localhost:27017/Shop")?;
//! let customers = docrepo::repository_at::<Customer>(&endpoint).await?;
//! let manager = docrepo::manager_at::<Customer>(&endpoint).await?;
//! manager.ensure_index("email", true).await?;
//! ```
//!
//! A store can also be built directly:
//!
//! ```ignore
//! let backend = MongoDbStore::builder("mongodb://localhost:27017", "Shop").build().await?;
//! let store = DocumentStore::new(backend);
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrepo_mongodb;

pub mod provider;
pub mod query;
pub mod sanitizer;
pub mod store;

pub use provider::MongoDbProvider;
pub use store::{MongoDbStore, MongoDbStoreBuilder};
