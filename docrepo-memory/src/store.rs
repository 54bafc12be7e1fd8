//! In-memory storage implementation for document stores.
//!
//! Documents are kept as BSON values per collection, keyed by their rendered
//! identifier and kept in insertion order. Unique indexes are enforced on
//! every write.

use async_trait::async_trait;
use bson::{Bson, Document, ser::serialize_to_vec};
use mea::{mutex::Mutex, rwlock::RwLock};
use once_cell::sync::Lazy;
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};
use tracing::{trace, warn};

use docrepo_core::{
    backend::{CollectionStats, IndexInfo, StoreBackend, StoreBackendBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Expr, Query, SortDirection, check_expr},
};

use crate::evaluator::{DocumentEvaluator, compare_by, lookup};

/// Name used for `memory://` endpoints that do not name a store.
pub const DEFAULT_STORE_NAME: &str = "default";

static NAMED_STORES: Lazy<Mutex<HashMap<String, InMemoryStore>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

#[derive(Debug, Default)]
struct CollectionState {
    /// Rendered identifier -> stored document.
    documents: Document,
    /// Indexed field -> unique.
    indexes: BTreeMap<String, bool>,
}

impl CollectionState {
    fn unique_fields(&self) -> impl Iterator<Item = &str> {
        self.indexes
            .iter()
            .filter(|(_, unique)| **unique)
            .map(|(field, _)| field.as_str())
    }

    /// Fails if writing `incoming` would repeat a value of a unique index.
    ///
    /// Documents in `incoming` replace stored documents with the same key, so
    /// those stored documents are not compared against.
    fn check_unique(&self, incoming: &[(String, Bson)], collection: &str) -> DocumentStoreResult<()> {
        let replaced: HashSet<&str> = incoming.iter().map(|(key, _)| key.as_str()).collect();

        for field in self.unique_fields() {
            let mut seen: Vec<(&str, Bson)> = self
                .documents
                .iter()
                .filter(|(key, _)| !replaced.contains(key.as_str()))
                .map(|(key, doc)| (key.as_str(), indexed_value(doc, field)))
                .collect();

            for (key, doc) in incoming {
                let value = indexed_value(doc, field);

                if seen
                    .iter()
                    .any(|(other, existing)| *other != key.as_str() && *existing == value)
                {
                    warn!(collection, field, "unique index violation");
                    return Err(DocumentStoreError::duplicate_key(
                        format!("{field}: {value}"),
                        collection,
                    ));
                }

                seen.push((key.as_str(), value));
            }
        }

        Ok(())
    }
}

/// The value a document contributes to an index. Missing fields index as null.
fn indexed_value(document: &Bson, field: &str) -> Bson {
    document
        .as_document()
        .and_then(|doc| lookup(doc, field))
        .cloned()
        .unwrap_or(Bson::Null)
}

fn key_of(id: &Bson) -> String {
    id.to_string()
}

fn size_of(document: &Bson) -> DocumentStoreResult<u64> {
    match document {
        Bson::Document(doc) => Ok(serialize_to_vec(doc)?.len() as u64),
        other => Err(DocumentStoreError::InvalidDocument(format!(
            "stored value is a {:?}, expected a document",
            other.element_type()
        ))),
    }
}

type StoreMap = HashMap<String, CollectionState>;

/// Thread-safe in-memory document storage backend.
///
/// `InMemoryStore` is cloneable and clones share the same data. Stores opened
/// by name through [`InMemoryStore::named`] are shared process-wide, which is
/// how `memory://name` endpoints reach the same data from separate
/// repositories.
///
/// Queries scan every document in a collection.
///
/// # Example
///
/// ```ignore
/// use docrepo_memory::InMemoryStore;
/// use docrepo::backend::StoreBackend;
/// use bson::{Bson, doc};
///
/// let store = InMemoryStore::new();
/// let doc = Bson::Document(doc! { "name": "Alice", "_t": "Customer" });
/// store.insert_documents(vec![(Bson::from("alice"), doc)], "Customer").await?;
///
/// let docs = store.get_documents(vec![Bson::from("alice")], "Customer").await?;
/// assert_eq!(docs.len(), 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection name -> collection state
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new, private, empty store.
    pub fn new() -> Self {
        Self { store: Arc::new(RwLock::new(StoreMap::new())) }
    }

    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Returns the process-wide store registered under `name`, creating it on first use.
    ///
    /// An empty name refers to [`DEFAULT_STORE_NAME`].
    pub async fn named(name: &str) -> Self {
        let name = if name.is_empty() { DEFAULT_STORE_NAME } else { name };

        NAMED_STORES
            .lock()
            .await
            .entry(name.to_string())
            .or_insert_with(InMemoryStore::new)
            .clone()
    }

    /// Writes `documents`, failing without changes if any key is taken or any
    /// unique index would be violated.
    async fn write(
        &self,
        documents: Vec<(Bson, Bson)>,
        collection: &str,
        overwrite: bool,
    ) -> DocumentStoreResult<()> {
        let incoming: Vec<(String, Bson)> = documents
            .into_iter()
            .map(|(id, doc)| (key_of(&id), doc))
            .collect();

        let mut store = self.store.write().await;
        let state = store.entry(collection.to_string()).or_default();

        if !overwrite {
            let mut keys = HashSet::new();

            for (key, _) in &incoming {
                if state.documents.contains_key(key) || !keys.insert(key.as_str()) {
                    warn!(collection, id = %key, "duplicate identifier on insert");
                    return Err(DocumentStoreError::duplicate_key(key.as_str(), collection));
                }
            }
        }

        state.check_unique(&incoming, collection)?;

        trace!(collection, count = incoming.len(), overwrite, "writing documents");

        for (key, doc) in incoming {
            state.documents.insert(key, doc);
        }

        Ok(())
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_documents(&self, documents: Vec<(Bson, Bson)>, collection: &str) -> DocumentStoreResult<()> {
        self.write(documents, collection, false).await
    }

    async fn replace_documents(&self, documents: Vec<(Bson, Bson)>, collection: &str) -> DocumentStoreResult<()> {
        self.write(documents, collection, true).await
    }

    async fn delete_documents(&self, ids: Vec<Bson>, collection: &str) -> DocumentStoreResult<u64> {
        let mut store = self.store.write().await;
        let Some(state) = store.get_mut(collection) else {
            return Ok(0);
        };

        Ok(ids
            .iter()
            .filter(|id| state.documents.remove(key_of(id)).is_some())
            .count() as u64)
    }

    async fn delete_matching(&self, filter: Option<Expr>, collection: &str) -> DocumentStoreResult<u64> {
        filter.as_ref().map(check_expr).transpose()?;

        let mut store = self.store.write().await;
        let Some(state) = store.get_mut(collection) else {
            return Ok(0);
        };

        let mut doomed = Vec::new();

        for (key, doc) in state.documents.iter() {
            if DocumentEvaluator::matches(doc, filter.as_ref())? {
                doomed.push(key.clone());
            }
        }

        for key in &doomed {
            state.documents.remove(key);
        }

        Ok(doomed.len() as u64)
    }

    async fn get_documents(&self, ids: Vec<Bson>, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let Some(state) = store.get(collection) else {
            return Ok(vec![]);
        };

        Ok(ids
            .iter()
            .filter_map(|id| state.documents.get(key_of(id)).cloned())
            .collect())
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        query.filter.as_ref().map(check_expr).transpose()?;

        let store = self.store.read().await;
        let Some(state) = store.get(collection) else {
            return Ok(vec![]);
        };

        let mut documents = match &query.filter {
            Some(filter) => DocumentEvaluator::filter_documents(state.documents.values(), filter)?,
            None => state.documents.values().cloned().collect(),
        };

        if let Some(sort) = &query.sort {
            documents.sort_by(|a, b| match sort.direction {
                SortDirection::Asc => compare_by(&sort.field, a, b),
                SortDirection::Desc => compare_by(&sort.field, b, a),
            });
        }

        Ok(documents
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn count_documents(&self, filter: Option<Expr>, collection: &str) -> DocumentStoreResult<u64> {
        filter.as_ref().map(check_expr).transpose()?;

        let store = self.store.read().await;
        let Some(state) = store.get(collection) else {
            return Ok(0);
        };

        let mut count = 0;

        for doc in state.documents.values() {
            if DocumentEvaluator::matches(doc, filter.as_ref())? {
                count += 1;
            }
        }

        Ok(count)
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.store
            .write()
            .await
            .entry(name.to_string())
            .or_default();

        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.store.write().await.remove(name);
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> DocumentStoreResult<bool> {
        Ok(self.store.read().await.contains_key(name))
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        let mut names: Vec<String> = self.store.read().await.keys().cloned().collect();
        names.sort();

        Ok(names)
    }

    async fn collection_stats(&self, name: &str) -> DocumentStoreResult<CollectionStats> {
        let store = self.store.read().await;
        let state = store
            .get(name)
            .ok_or_else(|| DocumentStoreError::CollectionNotFound(name.to_string()))?;

        let mut size_bytes = 0;

        for doc in state.documents.values() {
            size_bytes += size_of(doc)?;
        }

        Ok(CollectionStats {
            name: name.to_string(),
            document_count: state.documents.len() as u64,
            size_bytes,
            storage_size_bytes: size_bytes,
            index_count: state.indexes.len() as u64 + 1,
            total_index_size_bytes: 0,
        })
    }

    async fn add_index(&self, collection: &str, field: &str, unique: bool) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;
        let state = store.entry(collection.to_string()).or_default();

        if unique {
            let mut seen: Vec<Bson> = Vec::with_capacity(state.documents.len());

            for doc in state.documents.values() {
                let value = indexed_value(doc, field);

                if seen.contains(&value) {
                    warn!(collection, field, "existing documents violate new unique index");
                    return Err(DocumentStoreError::duplicate_key(
                        format!("{field}: {value}"),
                        collection,
                    ));
                }

                seen.push(value);
            }
        }

        state.indexes.insert(field.to_string(), unique);

        Ok(())
    }

    async fn drop_index(&self, collection: &str, field: &str) -> DocumentStoreResult<()> {
        if let Some(state) = self.store.write().await.get_mut(collection) {
            state.indexes.remove(field);
        }

        Ok(())
    }

    async fn list_indexes(&self, collection: &str) -> DocumentStoreResult<Vec<IndexInfo>> {
        Ok(self
            .store
            .read()
            .await
            .get(collection)
            .map(|state| {
                state
                    .indexes
                    .iter()
                    .map(|(field, unique)| IndexInfo { field: field.clone(), unique: *unique })
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Builder for [`InMemoryStore`] instances.
///
/// Without a name the builder creates a private store; with one it returns
/// the shared store registered under that name.
#[derive(Debug, Default)]
pub struct InMemoryStoreBuilder {
    name: Option<String>,
}

impl InMemoryStoreBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(match self.name {
            Some(name) => InMemoryStore::named(&name).await,
            None => InMemoryStore::new(),
        })
    }
}
