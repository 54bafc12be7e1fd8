//! Opening in-memory stores from `memory://` endpoints.

use async_trait::async_trait;
use tracing::debug;

use docrepo_core::{
    endpoint::Endpoint,
    error::{DocumentStoreError, DocumentStoreResult},
    provider::StoreProvider,
    store::DocumentStore,
};

use crate::store::InMemoryStore;

/// Endpoint scheme served by [`InMemoryProvider`].
pub const SCHEME: &str = "memory";

/// Opens the shared in-memory store named by a `memory://name` endpoint.
///
/// Every endpoint naming the same store reaches the same data for the life of
/// the process. `memory://` alone names the default store.
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryProvider;

#[async_trait]
impl StoreProvider for InMemoryProvider {
    async fn open(&self, endpoint: &Endpoint) -> DocumentStoreResult<DocumentStore> {
        if endpoint.scheme() != SCHEME {
            return Err(DocumentStoreError::Connection(format!(
                "scheme `{}` is not served by the in-memory provider",
                endpoint.scheme()
            )));
        }

        debug!(store = endpoint.host(), "opening in-memory store");

        Ok(DocumentStore::new(InMemoryStore::named(endpoint.host()).await))
    }
}
