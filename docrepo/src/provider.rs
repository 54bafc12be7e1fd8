//! Scheme-dispatching store provider.

use async_trait::async_trait;
use tracing::debug;

use docrepo_core::{
    endpoint::Endpoint,
    error::{DocumentStoreError, DocumentStoreResult},
    store::DocumentStore,
};
use docrepo_memory::InMemoryProvider;

pub use docrepo_core::provider::StoreProvider;

/// Opens any endpoint whose scheme a compiled-in backend serves.
///
/// - `memory://name` opens the process-wide in-memory store `name`.
/// - `mongodb://...` and `mongodb+srv://...` open MongoDB (requires the
///   `mongodb` feature).
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProvider;

#[async_trait]
impl StoreProvider for DefaultProvider {
    async fn open(&self, endpoint: &Endpoint) -> DocumentStoreResult<DocumentStore> {
        debug!(scheme = endpoint.scheme(), "opening store");

        match endpoint.scheme() {
            docrepo_memory::provider::SCHEME => InMemoryProvider.open(endpoint).await,
            #[cfg(feature = "mongodb")]
            scheme if docrepo_mongodb::provider::SCHEMES.contains(&scheme) => {
                docrepo_mongodb::MongoDbProvider.open(endpoint).await
            }
            scheme => Err(DocumentStoreError::Connection(format!(
                "no backend serves the `{scheme}` scheme"
            ))),
        }
    }
}
