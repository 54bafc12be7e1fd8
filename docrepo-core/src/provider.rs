//! Opening stores from endpoints.

use async_trait::async_trait;

use crate::{endpoint::Endpoint, error::DocumentStoreResult, store::DocumentStore};

/// Opens a [`DocumentStore`] for an [`Endpoint`].
///
/// Repositories and managers that are constructed from a connection string
/// go through a provider, so the same code can target different backends.
#[async_trait]
pub trait StoreProvider: Send + Sync {
    /// Opens the store named by `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Connection`](crate::error::DocumentStoreError::Connection)
    /// if the endpoint's scheme is unsupported, it names no database where one
    /// is required, or the store cannot be reached.
    async fn open(&self, endpoint: &Endpoint) -> DocumentStoreResult<DocumentStore>;
}
