//! Procedural macros for the docrepo project.
//!
//! # `Entity`
//!
//! Derives `docrepo::entity::Entity` for structs with named fields and for
//! polymorphic enums.
//!
//! Type-level attributes, all optional:
//!
//! - `#[entity(collection = "Name")]` - explicit collection-name marker
//! - `#[entity(ancestors(Parent, GrandParent))]` - structural ancestors, nearest first
//! - `#[entity(entity_base)]` - the type descends from the abstract entity base
//!
//! Structs use the field marked `#[entity(id)]`, or else the field named `id`,
//! as their identifier:
//!
//! ```ignore
//! use docrepo::prelude::*;
//! use bson::oid::ObjectId;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
//! #[entity(collection = "Catlikes", ancestors(CatLike, Animal), entity_base)]
//! pub struct Lion {
//!     pub id: Option<ObjectId>,
//!     pub pride: String,
//! }
//! ```
//!
//! Enums describe a hierarchy stored in one collection. Every variant wraps
//! one concrete entity type and is named after it, and the enum is tagged with
//! the discriminator field:
//!
//! ```ignore
//! #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
//! #[serde(tag = "_t")]
//! #[entity(entity_base)]
//! pub enum Animal {
//!     Dog(Dog),
//!     Lion(Lion),
//! }
//! ```
//!
//! Variants must wrap concrete (struct) entities; enums nested inside enums
//! would write the discriminator twice.

#[allow(unused_extern_crates)]
extern crate self as docrepo_macros;

mod entity;

use proc_macro::TokenStream;
use syn::{Data, DeriveInput, parse_macro_input};

/// Derives the `Entity` trait. See the crate documentation for attributes.
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    let result = match ast.data {
        Data::Struct(ref data) => entity::generate_for_struct(&ast, data),
        Data::Enum(ref data) => entity::generate_for_enum(&ast, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &ast,
            "Entity cannot be derived for unions",
        )),
    };

    result
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
