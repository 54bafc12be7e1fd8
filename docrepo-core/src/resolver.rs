//! Maps entity types to physical collection names.
//!
//! Resolution reads only the type's [`EntityDescriptor`]:
//!
//! 1. Types outside the abstract entity base ([`Lineage::Identity`]) use the
//!    marker on the type itself, else the type's simple name.
//! 2. Types under the entity base use the marker on the exact type. Markers on
//!    intermediate ancestors are not consulted.
//! 3. Without a marker they fall back to the ancestor directly below the
//!    entity base, so sibling subtypes share one collection.
//! 4. An empty result is a configuration error.
//!
//! Resolution is pure and cheap, so it runs on every repository construction.

use tracing::trace;

use crate::{
    entity::{Entity, EntityDescriptor, Lineage},
    error::{DocumentStoreError, DocumentStoreResult},
};

/// Resolves collection names for entity types.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionNameResolver;

impl CollectionNameResolver {
    /// Resolves the collection name backing `T`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Configuration`] if the computed name is empty.
    pub fn resolve<T: Entity>() -> DocumentStoreResult<String> {
        Self::resolve_descriptor(T::descriptor())
    }

    /// Resolves the collection name described by `descriptor`.
    pub fn resolve_descriptor(descriptor: &EntityDescriptor) -> DocumentStoreResult<String> {
        let name = match descriptor.lineage() {
            Lineage::Identity => descriptor
                .collection()
                .unwrap_or(descriptor.name()),
            Lineage::EntityBase => match descriptor.collection() {
                Some(marker) => marker,
                None => descriptor
                    .ancestors()
                    .last()
                    .copied()
                    .unwrap_or(descriptor.name()),
            },
        };

        trace!(entity = descriptor.name(), collection = name, "resolved collection name");

        validate_collection_name(name).map(str::to_string)
    }
}

/// Checks that an explicit or resolved collection name is usable.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Configuration`] if `name` is empty.
pub fn validate_collection_name(name: &str) -> DocumentStoreResult<&str> {
    if name.is_empty() {
        return Err(DocumentStoreError::Configuration(
            "Collection name cannot be empty for this entity".to_string(),
        ));
    }

    Ok(name)
}
