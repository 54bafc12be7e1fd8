//! Conversion between entities and stored documents.
//!
//! Every document written through a repository carries a
//! [`DISCRIMINATOR_FIELD`] naming its concrete type, so that several entity
//! types can share one collection and still be told apart when read back.

use bson::{Bson, Document, de::deserialize_from_bson, ser::serialize_to_bson};

use crate::{
    entity::Entity,
    error::{DocumentStoreError, DocumentStoreResult},
};

/// Name of the stored field holding a document's concrete type.
pub const DISCRIMINATOR_FIELD: &str = "_t";

/// Extension trait providing document conversion for entities.
///
/// This trait is automatically implemented for all types that implement [`Entity`].
pub trait EntityExt: Entity {
    /// Converts this entity to a stored document, embedding its discriminator.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the entity does not serialize
    /// to a document (for example a bare string or number).
    fn to_document(&self) -> DocumentStoreResult<Bson>;

    /// Creates an entity from a stored document.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_document(document: Bson) -> DocumentStoreResult<Self>;

    /// Returns this entity's identifier as the document key.
    fn id_bson(&self) -> DocumentStoreResult<Bson>;
}

impl<E: Entity> EntityExt for E {
    fn to_document(&self) -> DocumentStoreResult<Bson> {
        let mut document = match serialize_to_bson(self)? {
            Bson::Document(document) => document,
            other => {
                return Err(DocumentStoreError::InvalidDocument(format!(
                    "{} serialized to {:?}, expected a document",
                    E::descriptor().name(),
                    other.element_type()
                )));
            }
        };

        document.insert(DISCRIMINATOR_FIELD, self.discriminator());

        Ok(Bson::Document(document))
    }

    fn from_document(document: Bson) -> DocumentStoreResult<Self> {
        Ok(deserialize_from_bson(document)?)
    }

    fn id_bson(&self) -> DocumentStoreResult<Bson> {
        crate::entity::EntityId::to_bson(self.id())
    }
}

/// Returns the discriminator stored in `document`, if any.
pub fn discriminator_of(document: &Document) -> Option<&str> {
    document.get_str(DISCRIMINATOR_FIELD).ok()
}
