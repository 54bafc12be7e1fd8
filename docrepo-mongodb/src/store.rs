//! MongoDB storage implementation.
//!
//! Each stored document is the entity's document with `_id` set to its
//! identifier. `_id` is left in place on the way out; entities that do not
//! declare it ignore it when decoding.

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection, Database, IndexModel,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{ClientOptions, FindOptions, IndexOptions},
};
use tracing::{debug, trace, warn};

use docrepo_core::{
    backend::{CollectionStats, IndexInfo, StoreBackend, StoreBackendBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Expr, Query, SortDirection},
};

use crate::{query::MongoQueryTranslator, sanitizer::KeySanitizer};

const DUPLICATE_KEY: i32 = 11000;
const NAMESPACE_NOT_FOUND: i32 = 26;
const INDEX_NOT_FOUND: i32 = 27;
const NAMESPACE_EXISTS: i32 = 48;

/// Server error code carried by `error`, if any.
fn error_code(error: &MongoError) -> Option<i32> {
    match error.kind.as_ref() {
        ErrorKind::Command(e) => Some(e.code),
        ErrorKind::Write(WriteFailure::WriteError(e)) => Some(e.code),
        ErrorKind::InsertMany(e) => e
            .write_errors
            .as_ref()?
            .iter()
            .map(|e| e.code)
            .find(|code| *code == DUPLICATE_KEY)
            .or_else(|| e.write_errors.as_ref()?.first().map(|e| e.code)),
        _ => None,
    }
}

fn backend_error(error: MongoError) -> DocumentStoreError {
    DocumentStoreError::Backend(error.to_string())
}

/// Maps a write failure, turning key collisions into [`DocumentStoreError::DuplicateKey`].
fn write_error(error: MongoError, collection: &str) -> DocumentStoreError {
    if error_code(&error) != Some(DUPLICATE_KEY) {
        return backend_error(error);
    }

    let message = error.to_string();
    let key = message
        .split_once("dup key: ")
        .map_or(message.as_str(), |(_, key)| key)
        .trim_end_matches(|c| c == ',' || c == ' ');

    warn!(collection, key, "duplicate key on write");

    DocumentStoreError::duplicate_key(key, collection)
}

/// Reads a numeric statistic that the server may report as any BSON number.
fn number(stats: &Document, key: &str) -> u64 {
    match stats.get(key) {
        Some(Bson::Int32(n)) => *n as u64,
        Some(Bson::Int64(n)) => *n as u64,
        Some(Bson::Double(n)) => *n as u64,
        _ => 0,
    }
}

/// MongoDB-backed [`StoreBackend`] bound to one database.
#[derive(Debug, Clone)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    /// The name of the database this store is bound to.
    pub fn database_name(&self) -> &str {
        &self.database
    }

    fn database(&self) -> Database {
        self.client.database(&self.database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.database()
            .collection(&KeySanitizer::sanitize_collection_name(collection_name))
    }

    fn prepare_document(&self, id: &Bson, document: &Bson) -> DocumentStoreResult<Document> {
        let mut prepared = document
            .as_document()
            .map(KeySanitizer::sanitize_document)
            .ok_or_else(|| DocumentStoreError::InvalidDocument("Expected document".into()))?;
        prepared.insert("_id", id.clone());

        Ok(prepared)
    }

    fn restore_document(&self, document: Document) -> Bson {
        Bson::Document(KeySanitizer::restore_document(&document))
    }

    async fn find(&self, filter: Document, options: FindOptions, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        let documents = self
            .get_collection(collection)
            .find(filter)
            .with_options(options)
            .await
            .map_err(backend_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error)?;

        trace!(collection, count = documents.len(), "find returned documents");

        Ok(documents
            .into_iter()
            .map(|doc| self.restore_document(doc))
            .collect())
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_documents(&self, documents: Vec<(Bson, Bson)>, collection: &str) -> DocumentStoreResult<()> {
        let prepared = documents
            .iter()
            .map(|(id, doc)| self.prepare_document(id, doc))
            .collect::<DocumentStoreResult<Vec<Document>>>()?;

        self.get_collection(collection)
            .insert_many(prepared)
            .await
            .map_err(|e| write_error(e, collection))?;

        Ok(())
    }

    async fn replace_documents(&self, documents: Vec<(Bson, Bson)>, collection: &str) -> DocumentStoreResult<()> {
        let target = self.get_collection(collection);

        for (id, doc) in &documents {
            target
                .replace_one(doc! { "_id": id.clone() }, self.prepare_document(id, doc)?)
                .upsert(true)
                .await
                .map_err(|e| write_error(e, collection))?;
        }

        Ok(())
    }

    async fn delete_documents(&self, ids: Vec<Bson>, collection: &str) -> DocumentStoreResult<u64> {
        Ok(self
            .get_collection(collection)
            .delete_many(doc! { "_id": { "$in": ids } })
            .await
            .map_err(backend_error)?
            .deleted_count)
    }

    async fn delete_matching(&self, filter: Option<Expr>, collection: &str) -> DocumentStoreResult<u64> {
        let filter = MongoQueryTranslator::translate(filter.as_ref())?;

        Ok(self
            .get_collection(collection)
            .delete_many(filter)
            .await
            .map_err(backend_error)?
            .deleted_count)
    }

    async fn get_documents(&self, ids: Vec<Bson>, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        self.find(doc! { "_id": { "$in": ids } }, FindOptions::default(), collection)
            .await
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(limit as i64);
        }
        if let Some(skip) = query.offset {
            options.skip = Some(skip as u64);
        }
        if let Some(sort) = &query.sort {
            options.sort = Some(doc! {
                sort.field.clone(): match sort.direction {
                    SortDirection::Asc => 1,
                    SortDirection::Desc => -1,
                }
            })
        }

        let filter = MongoQueryTranslator::translate(query.filter.as_ref())?;

        self.find(filter, options, collection).await
    }

    async fn count_documents(&self, filter: Option<Expr>, collection: &str) -> DocumentStoreResult<u64> {
        let filter = MongoQueryTranslator::translate(filter.as_ref())?;

        self.get_collection(collection)
            .count_documents(filter)
            .await
            .map_err(backend_error)
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        match self
            .database()
            .create_collection(KeySanitizer::sanitize_collection_name(name))
            .await
        {
            Err(e) if error_code(&e) != Some(NAMESPACE_EXISTS) => Err(backend_error(e)),
            _ => Ok(()),
        }
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        debug!(collection = name, database = %self.database, "dropping collection");

        match self.get_collection(name).drop().await {
            Err(e) if error_code(&e) != Some(NAMESPACE_NOT_FOUND) => Err(backend_error(e)),
            _ => Ok(()),
        }
    }

    async fn collection_exists(&self, name: &str) -> DocumentStoreResult<bool> {
        Ok(!self
            .database()
            .list_collection_names()
            .filter(doc! { "name": KeySanitizer::sanitize_collection_name(name) })
            .await
            .map_err(backend_error)?
            .is_empty())
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        let mut names = self
            .database()
            .list_collection_names()
            .await
            .map_err(backend_error)?;
        names.sort();

        Ok(names)
    }

    async fn collection_stats(&self, name: &str) -> DocumentStoreResult<CollectionStats> {
        if !self.collection_exists(name).await? {
            return Err(DocumentStoreError::CollectionNotFound(name.to_string()));
        }

        let stats = self
            .database()
            .run_command(doc! { "collStats": KeySanitizer::sanitize_collection_name(name) })
            .await
            .map_err(|e| match error_code(&e) {
                Some(NAMESPACE_NOT_FOUND) => DocumentStoreError::CollectionNotFound(name.to_string()),
                _ => backend_error(e),
            })?;

        Ok(CollectionStats {
            name: name.to_string(),
            document_count: number(&stats, "count"),
            size_bytes: number(&stats, "size"),
            storage_size_bytes: number(&stats, "storageSize"),
            index_count: number(&stats, "nindexes"),
            total_index_size_bytes: number(&stats, "totalIndexSize"),
        })
    }

    async fn add_index(&self, collection: &str, field: &str, unique: bool) -> DocumentStoreResult<()> {
        self.get_collection(collection)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { field: 1 })
                    .options(
                        IndexOptions::builder()
                            .name(field.to_string())
                            .unique(unique)
                            .build(),
                    )
                    .build(),
            )
            .await
            .map_err(|e| write_error(e, collection))?;

        Ok(())
    }

    async fn drop_index(&self, collection: &str, field: &str) -> DocumentStoreResult<()> {
        match self.get_collection(collection).drop_index(field).await {
            Err(e) if !matches!(error_code(&e), Some(INDEX_NOT_FOUND | NAMESPACE_NOT_FOUND)) => {
                Err(backend_error(e))
            }
            _ => Ok(()),
        }
    }

    async fn list_indexes(&self, collection: &str) -> DocumentStoreResult<Vec<IndexInfo>> {
        let models = match self.get_collection(collection).list_indexes().await {
            Ok(cursor) => cursor
                .try_collect::<Vec<IndexModel>>()
                .await
                .map_err(backend_error)?,
            Err(e) if error_code(&e) == Some(NAMESPACE_NOT_FOUND) => return Ok(vec![]),
            Err(e) => return Err(backend_error(e)),
        };

        Ok(models
            .into_iter()
            .filter_map(|model| {
                let field = model.keys.keys().next()?.clone();
                let unique = model
                    .options
                    .as_ref()
                    .and_then(|options| options.unique)
                    .unwrap_or(false);

                (field != "_id").then_some(IndexInfo { field, unique })
            })
            .collect())
    }
}

/// Builds a [`MongoDbStore`], checking that the server answers before returning.
pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Connection`] if the connection string is
    /// invalid or the server does not answer a `ping`.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let connection = |e: MongoError| DocumentStoreError::Connection(e.to_string());

        let client = Client::with_options(ClientOptions::parse(&self.dsn).await.map_err(connection)?)
            .map_err(connection)?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(connection)?;

        debug!(database = %self.database, "connected to MongoDB");

        Ok(MongoDbStore::new(client, self.database))
    }
}
