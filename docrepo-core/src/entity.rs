//! The identity contract every stored entity implements.
//!
//! An [`Entity`] owns exactly one identifier of a caller-chosen [`EntityId`]
//! type and exposes a static [`EntityDescriptor`] describing its place in a
//! type hierarchy. The descriptor is what the
//! [`resolver`](crate::resolver) reads to pick a collection name.
//!
//! # Example
//!
//! ```ignore
//! use docrepo::prelude::*;
//! use bson::oid::ObjectId;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
//! #[entity(entity_base)]
//! pub struct Product {
//!     pub id: Option<ObjectId>,
//!     pub name: String,
//! }
//! ```

use bson::{Bson, Uuid, oid::ObjectId, ser::serialize_to_bson};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;

use crate::error::DocumentStoreResult;

/// Identifier types usable as an entity's `Id`.
///
/// The only semantic requirement is equality comparison. Identifier types that
/// are native to the store report [`is_unset`](Self::is_unset) for a missing
/// value and can [`generate`](Self::generate) a fresh one; every other type
/// must be supplied by the caller before the entity is written.
pub trait EntityId:
    Serialize + DeserializeOwned + PartialEq + Clone + Debug + Send + Sync + 'static
{
    /// Returns `true` if no identifier has been assigned yet.
    fn is_unset(&self) -> bool {
        false
    }

    /// Produces a fresh identifier, or `None` if the caller must supply one.
    fn generate() -> Option<Self> {
        None
    }

    /// Converts the identifier into the BSON value used as the document key.
    fn to_bson(&self) -> DocumentStoreResult<Bson> {
        Ok(serialize_to_bson(self)?)
    }
}

/// The store's native identifier: generated on first write when `None`.
impl EntityId for Option<ObjectId> {
    fn is_unset(&self) -> bool {
        self.is_none()
    }

    fn generate() -> Option<Self> {
        Some(Some(ObjectId::new()))
    }
}

impl EntityId for ObjectId {}

impl EntityId for Uuid {}

impl EntityId for String {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }
}

impl EntityId for i32 {}

impl EntityId for i64 {}

impl EntityId for u32 {}

/// Where a type sits relative to the two possible hierarchy roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lineage {
    /// The type implements the identity contract without descending from the
    /// abstract entity base. Any structural parents are plain identity types.
    Identity,
    /// The type descends from the abstract entity base. Its collection
    /// defaults to the ancestor directly below that base.
    EntityBase,
}

/// Static metadata describing an entity type.
///
/// Descriptors are built once per type on first use (see [`Entity::descriptor`])
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    name: &'static str,
    collection: Option<&'static str>,
    ancestors: Vec<&'static str>,
    lineage: Lineage,
    concrete_types: Vec<&'static str>,
}

impl EntityDescriptor {
    /// Starts a descriptor for the type with the given simple name.
    pub fn builder(name: &'static str) -> EntityDescriptorBuilder {
        EntityDescriptorBuilder::new(name)
    }

    /// The type's simple name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The explicit collection-name marker declared on this exact type, if any.
    pub fn collection(&self) -> Option<&'static str> {
        self.collection
    }

    /// Structural ancestors, nearest first.
    ///
    /// Neither the identity root nor the abstract entity base is listed, so for
    /// [`Lineage::EntityBase`] the last element is the direct child of the base.
    pub fn ancestors(&self) -> &[&'static str] {
        &self.ancestors
    }

    pub fn lineage(&self) -> Lineage {
        self.lineage
    }

    /// Discriminator values identifying this type or any of its subtypes.
    ///
    /// A concrete type lists only itself.
    pub fn discriminators(&self) -> &[&'static str] {
        if self.concrete_types.is_empty() {
            std::slice::from_ref(&self.name)
        } else {
            &self.concrete_types
        }
    }

    /// Returns `true` if documents tagged `discriminator` decode as this type.
    pub fn accepts(&self, discriminator: &str) -> bool {
        self.discriminators()
            .iter()
            .any(|candidate| *candidate == discriminator)
    }
}

/// Builder for [`EntityDescriptor`].
#[derive(Debug, Clone)]
pub struct EntityDescriptorBuilder {
    descriptor: EntityDescriptor,
}

impl EntityDescriptorBuilder {
    pub fn new(name: &'static str) -> Self {
        Self {
            descriptor: EntityDescriptor {
                name,
                collection: None,
                ancestors: Vec::new(),
                lineage: Lineage::Identity,
                concrete_types: Vec::new(),
            },
        }
    }

    /// Attaches a collection-name marker to the type.
    pub fn collection(mut self, collection: &'static str) -> Self {
        self.descriptor.collection = Some(collection);
        self
    }

    /// Sets the structural ancestors, nearest first.
    pub fn ancestors(mut self, ancestors: &[&'static str]) -> Self {
        self.descriptor.ancestors = ancestors.to_vec();
        self
    }

    pub fn lineage(mut self, lineage: Lineage) -> Self {
        self.descriptor.lineage = lineage;
        self
    }

    /// Shorthand for `lineage(Lineage::EntityBase)`.
    pub fn entity_base(self) -> Self {
        self.lineage(Lineage::EntityBase)
    }

    /// Declares the concrete subtypes a polymorphic type decodes into.
    pub fn concrete_types(mut self, concrete_types: impl IntoIterator<Item = &'static str>) -> Self {
        self.descriptor.concrete_types = concrete_types.into_iter().collect();
        self
    }

    pub fn build(self) -> EntityDescriptor {
        self.descriptor
    }
}

/// Core trait that all entities stored through a repository implement.
///
/// Implement it by hand or with `#[derive(Entity)]` from the `docrepo` crate.
/// Polymorphic hierarchies are expressed as an enum over their concrete types,
/// tagged with the [`DISCRIMINATOR_FIELD`](crate::document::DISCRIMINATOR_FIELD).
///
/// # Example
///
/// ```ignore
/// use std::sync::OnceLock;
/// use docrepo_core::entity::{Entity, EntityDescriptor};
///
/// impl Entity for IntCustomer {
///     type Id = i32;
///
///     fn id(&self) -> &i32 { &self.id }
///     fn set_id(&mut self, id: i32) { self.id = id; }
///
///     fn descriptor() -> &'static EntityDescriptor {
///         static DESCRIPTOR: OnceLock<EntityDescriptor> = OnceLock::new();
///         DESCRIPTOR.get_or_init(|| EntityDescriptor::builder("IntCustomer").build())
///     }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// The identifier type.
    type Id: EntityId;

    /// Returns a reference to this entity's identifier.
    fn id(&self) -> &Self::Id;

    /// Replaces this entity's identifier.
    fn set_id(&mut self, id: Self::Id);

    /// Returns the static descriptor for this type.
    fn descriptor() -> &'static EntityDescriptor;

    /// The discriminator stored alongside this value.
    ///
    /// Concrete types use their own name; polymorphic types forward to the
    /// concrete type they currently hold.
    fn discriminator(&self) -> &'static str {
        Self::descriptor().name()
    }
}
