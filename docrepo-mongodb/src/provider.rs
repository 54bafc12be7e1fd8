//! Opening MongoDB stores from `mongodb://` and `mongodb+srv://` endpoints.

use async_trait::async_trait;

use docrepo_core::{
    backend::StoreBackendBuilder,
    endpoint::Endpoint,
    error::{DocumentStoreError, DocumentStoreResult},
    provider::StoreProvider,
    store::DocumentStore,
};

use crate::store::MongoDbStore;

/// Endpoint schemes served by [`MongoDbProvider`].
pub const SCHEMES: [&str; 2] = ["mongodb", "mongodb+srv"];

/// Opens the database named in the endpoint's path.
///
/// The whole connection string, options included, is handed to the driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct MongoDbProvider;

#[async_trait]
impl StoreProvider for MongoDbProvider {
    async fn open(&self, endpoint: &Endpoint) -> DocumentStoreResult<DocumentStore> {
        if !SCHEMES.contains(&endpoint.scheme()) {
            return Err(DocumentStoreError::Connection(format!(
                "scheme `{}` is not served by the MongoDB provider",
                endpoint.scheme()
            )));
        }

        let database = endpoint.require_database()?;
        let store = MongoDbStore::builder(endpoint.as_str(), database)
            .build()
            .await?;

        Ok(DocumentStore::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn endpoint_without_database_is_rejected_before_connecting() {
        let endpoint = Endpoint::parse("mongodb://localhost:27017").unwrap();

        assert!(matches!(
            MongoDbProvider.open(&endpoint).await,
            Err(DocumentStoreError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn other_schemes_are_rejected() {
        let endpoint = Endpoint::parse("memory://x").unwrap();

        assert!(matches!(
            MongoDbProvider.open(&endpoint).await,
            Err(DocumentStoreError::Connection(_))
        ));
    }
}
