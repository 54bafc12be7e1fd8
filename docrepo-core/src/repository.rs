//! Typed CRUD and query access to one collection.
//!
//! A [`Repository<T>`] is bound to a single collection, resolved from `T`'s
//! descriptor unless a name is given explicitly. Several entity types can share
//! a collection; every document carries its concrete type in the
//! [`DISCRIMINATOR_FIELD`](crate::document::DISCRIMINATOR_FIELD), and typed reads
//! only decode documents that belong to the requested type.
//!
//! # Example
//!
//! ```ignore
//! use docrepo::prelude::*;
//!
//! let customers = store.repository::<Customer>()?;
//! let bob = customers.add(Customer::new("Bob", "Dillon")).await?;
//!
//! let found = customers.get_by_id(bob.id()).await?;
//! let dillons = customers
//!     .filter(Filter::eq("last_name", "Dillon"))
//!     .sort("first_name", SortDirection::Asc)
//!     .to_vec()
//!     .await?;
//! ```

use bson::Bson;
use futures::{
    StreamExt, TryStreamExt,
    stream::{self, BoxStream},
};
use std::marker::PhantomData;
use tracing::{debug, trace};

use crate::{
    collection::Collection,
    config::default_endpoint,
    document::{EntityExt, discriminator_of},
    endpoint::Endpoint,
    entity::{Entity, EntityId},
    error::{DocumentStoreError, DocumentStoreResult},
    provider::StoreProvider,
    query::{Expr, Filter, Query, QueryBuilder, SortDirection},
    resolver::CollectionNameResolver,
    store::DocumentStore,
};

/// Typed access to the collection backing `T`.
#[derive(Debug)]
pub struct Repository<T: Entity> {
    collection: Collection,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self::from_collection(self.collection.clone())
    }
}

impl<T: Entity> Repository<T> {
    /// Binds a repository to an existing collection handle.
    pub fn from_collection(collection: Collection) -> Self {
        debug!(
            entity = T::descriptor().name(),
            collection = collection.name(),
            "repository bound"
        );

        Self { collection, _marker: PhantomData }
    }

    /// Binds to the collection resolved from `T` on an open store.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `T` resolves to an empty name.
    pub fn new(store: &DocumentStore) -> DocumentStoreResult<Self> {
        store.repository::<T>()
    }

    /// Binds to an explicitly named collection, bypassing name resolution.
    pub fn with_name(store: &DocumentStore, name: &str) -> DocumentStoreResult<Self> {
        store.repository_named::<T>(name)
    }

    /// Opens the default endpoint and binds to the collection resolved from `T`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `T` resolves to an empty name or no
    /// default endpoint is configured, and a connection error if the endpoint
    /// cannot be opened.
    pub async fn connect<P>(provider: &P) -> DocumentStoreResult<Self>
    where
        P: StoreProvider + ?Sized,
    {
        let name = CollectionNameResolver::resolve::<T>()?;
        Self::connect_named(provider, default_endpoint()?, &name).await
    }

    /// Opens `endpoint` and binds to the collection resolved from `T`.
    pub async fn connect_to<P>(provider: &P, endpoint: &Endpoint) -> DocumentStoreResult<Self>
    where
        P: StoreProvider + ?Sized,
    {
        let name = CollectionNameResolver::resolve::<T>()?;
        Self::connect_named(provider, endpoint, &name).await
    }

    /// Opens `endpoint` and binds to the collection called `name`.
    pub async fn connect_named<P>(
        provider: &P,
        endpoint: &Endpoint,
        name: &str,
    ) -> DocumentStoreResult<Self>
    where
        P: StoreProvider + ?Sized,
    {
        let collection = Collection::new(name, provider.open(endpoint).await?.backend().clone())?;
        Ok(Self::from_collection(collection))
    }

    /// The name of the bound collection.
    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    /// The untyped handle to the bound collection.
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Persists a new entity and returns it with its identifier populated.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DuplicateKey`] if the identifier is taken
    /// and [`DocumentStoreError::InvalidDocument`] if a caller-supplied
    /// identifier was left unset.
    pub async fn add(&self, mut entity: T) -> DocumentStoreResult<T> {
        let pair = prepare(&mut entity)?;
        self.collection.insert(vec![pair]).await?;

        Ok(entity)
    }

    /// Persists several new entities in one request.
    ///
    /// An empty batch makes no request.
    pub async fn add_many(&self, mut entities: Vec<T>) -> DocumentStoreResult<Vec<T>> {
        if entities.is_empty() {
            return Ok(entities);
        }

        let pairs = entities
            .iter_mut()
            .map(prepare)
            .collect::<DocumentStoreResult<Vec<_>>>()?;

        trace!(collection = self.collection_name(), count = pairs.len(), "adding entities");

        self.collection.insert(pairs).await?;

        Ok(entities)
    }

    /// Replaces the stored document with the same identifier, creating it if absent.
    ///
    /// A native identifier left unset is generated first, so `entity` may change.
    pub async fn update(&self, entity: &mut T) -> DocumentStoreResult<()> {
        let pair = prepare(entity)?;
        self.collection.replace(vec![pair]).await
    }

    /// Replaces or creates several documents in one request.
    pub async fn update_many(&self, entities: &mut [T]) -> DocumentStoreResult<()> {
        if entities.is_empty() {
            return Ok(());
        }

        let pairs = entities
            .iter_mut()
            .map(prepare)
            .collect::<DocumentStoreResult<Vec<_>>>()?;

        self.collection.replace(pairs).await
    }

    /// Removes the stored document for `entity`. A missing document is not an error.
    pub async fn delete(&self, entity: &T) -> DocumentStoreResult<()> {
        self.delete_by_id(entity.id()).await
    }

    /// Removes the document with the given identifier. A missing document is not an error.
    pub async fn delete_by_id(&self, id: &T::Id) -> DocumentStoreResult<()> {
        if id.is_unset() {
            return Ok(());
        }

        self.collection.delete(vec![id.to_bson()?]).await?;
        Ok(())
    }

    /// Removes the documents with the given identifiers and returns how many existed.
    pub async fn delete_many(
        &self,
        ids: impl IntoIterator<Item = T::Id>,
    ) -> DocumentStoreResult<u64> {
        let ids = ids
            .into_iter()
            .filter(|id| !id.is_unset())
            .map(|id| id.to_bson())
            .collect::<DocumentStoreResult<Vec<Bson>>>()?;

        if ids.is_empty() {
            return Ok(0);
        }

        self.collection.delete(ids).await
    }

    /// Removes every document matching `predicate` and returns how many were removed.
    ///
    /// The predicate applies to every document in the collection, whatever its type.
    pub async fn delete_where(&self, predicate: Expr) -> DocumentStoreResult<u64> {
        let removed = self.collection.delete_matching(Some(predicate)).await?;
        trace!(collection = self.collection_name(), removed, "deleted matching documents");

        Ok(removed)
    }

    /// Removes every document in the collection, keeping the collection itself.
    pub async fn delete_all(&self) -> DocumentStoreResult<u64> {
        self.collection.delete_matching(None).await
    }

    /// Looks up an entity by identifier.
    ///
    /// Returns `None` when no document has that identifier, or when the stored
    /// document belongs to a type `T` does not cover.
    pub async fn get_by_id(&self, id: &T::Id) -> DocumentStoreResult<Option<T>> {
        if id.is_unset() {
            return Ok(None);
        }

        let descriptor = T::descriptor();
        let document = self
            .collection
            .get(vec![id.to_bson()?])
            .await?
            .into_iter()
            .find(|document| match document.as_document().and_then(discriminator_of) {
                Some(discriminator) => descriptor.accepts(discriminator),
                None => true,
            });

        document.map(T::from_document).transpose()
    }

    /// Returns `true` if any document in the collection matches `predicate`.
    pub async fn exists(&self, predicate: Expr) -> DocumentStoreResult<bool> {
        Ok(self.collection.count(Some(predicate)).await? > 0)
    }

    /// Counts every document in the collection, whatever its type.
    pub async fn count(&self) -> DocumentStoreResult<u64> {
        self.collection.count(None).await
    }

    /// Starts a lazy query over entities of type `T` matching `predicate`.
    pub fn filter(&self, predicate: Expr) -> RepositoryQuery<T> {
        self.all().filter(predicate)
    }

    /// Starts a lazy query over every entity of type `T`.
    pub fn all(&self) -> RepositoryQuery<T> {
        RepositoryQuery::new(self.collection.clone())
    }

    /// Starts a lazy query restricted to documents of type `S` or its subtypes.
    pub fn of_type<S>(&self) -> RepositoryQuery<S>
    where
        S: Entity<Id = T::Id>,
    {
        self.all().of_type::<S>()
    }
}

/// Assigns a native identifier if needed and encodes the entity.
fn prepare<T: Entity>(entity: &mut T) -> DocumentStoreResult<(Bson, Bson)> {
    if entity.id().is_unset() {
        let id = T::Id::generate().ok_or_else(|| {
            DocumentStoreError::InvalidDocument(format!(
                "{} has no identifier and its identifier type cannot be generated",
                entity.discriminator()
            ))
        })?;
        entity.set_id(id);
    }

    Ok((entity.id_bson()?, entity.to_document()?))
}

/// A lazily executed query over a repository's collection.
///
/// Nothing is sent to the store until a terminal method runs. Each terminal
/// call issues a fresh request, so a query value can be run any number of
/// times and every run observes the store as it is at that moment.
///
/// A query started from [`Repository::all`] or [`Repository::filter`] also
/// returns documents stored without a discriminator. Once narrowed with
/// [`of_type`](Self::of_type), only documents tagged as the target type or one
/// of its subtypes are returned.
#[derive(Debug)]
pub struct RepositoryQuery<T: Entity> {
    collection: Collection,
    builder: QueryBuilder,
    narrowed: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for RepositoryQuery<T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            builder: self.builder.clone(),
            narrowed: self.narrowed,
            _marker: PhantomData,
        }
    }
}

impl<T: Entity> RepositoryQuery<T> {
    fn new(collection: Collection) -> Self {
        Self {
            collection,
            builder: Query::builder(),
            narrowed: false,
            _marker: PhantomData,
        }
    }

    /// Narrows the query further. Successive filters are combined with AND.
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.builder = self.builder.and_filter(predicate);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.builder = self.builder.sort(field, direction);
        self
    }

    pub fn skip(mut self, count: usize) -> Self {
        self.builder = self.builder.offset(count);
        self
    }

    pub fn take(mut self, count: usize) -> Self {
        self.builder = self.builder.limit(count);
        self
    }

    /// Retargets the query at subtype `S`, keeping filters, sort and paging.
    ///
    /// Untagged documents are excluded from then on.
    pub fn of_type<S>(self) -> RepositoryQuery<S>
    where
        S: Entity<Id = T::Id>,
    {
        RepositoryQuery {
            collection: self.collection,
            builder: self.builder,
            narrowed: true,
            _marker: PhantomData,
        }
    }

    /// The request this query sends, including the type restriction.
    pub fn to_query(&self) -> Query {
        let restriction = if self.narrowed {
            Filter::discriminated_as(T::descriptor())
        } else {
            Filter::of_type(T::descriptor())
        };

        self.builder.clone().and_filter(restriction).build()
    }

    /// Runs the query and collects every result.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::QueryTranslation`] if the backend cannot
    /// express the predicate.
    pub async fn to_vec(&self) -> DocumentStoreResult<Vec<T>> {
        let documents = self.collection.query(self.to_query()).await?;

        trace!(
            collection = self.collection.name(),
            count = documents.len(),
            "query returned documents"
        );

        documents
            .into_iter()
            .map(T::from_document)
            .collect()
    }

    /// Runs the query when first polled and yields results one at a time.
    pub fn stream(self) -> BoxStream<'static, DocumentStoreResult<T>> {
        stream::once(async move { self.to_vec().await })
            .map_ok(|items| stream::iter(items.into_iter().map(Ok)))
            .try_flatten()
            .boxed()
    }

    /// Counts matching documents of type `T`, honoring skip and take.
    pub async fn count(&self) -> DocumentStoreResult<u64> {
        let query = self.to_query();
        let matching = self.collection.count(query.filter).await?;
        let remaining = matching.saturating_sub(query.offset.unwrap_or(0) as u64);

        Ok(match query.limit {
            Some(limit) => remaining.min(limit as u64),
            None => remaining,
        })
    }

    /// Returns the first result, if any.
    pub async fn first(&self) -> DocumentStoreResult<Option<T>> {
        Ok(self.clone().take(1).to_vec().await?.into_iter().next())
    }

    /// Returns the only result, `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidDocument`] if more than one
    /// document matches.
    pub async fn single(&self) -> DocumentStoreResult<Option<T>> {
        let mut results = self.clone().take(2).to_vec().await?;

        if results.len() > 1 {
            return Err(DocumentStoreError::InvalidDocument(format!(
                "query on {} matched more than one document",
                self.collection.name()
            )));
        }

        Ok(results.pop())
    }

    /// Returns `true` if the query matches at least one document of type `T`.
    pub async fn exists(&self) -> DocumentStoreResult<bool> {
        Ok(self.count().await? > 0)
    }
}
