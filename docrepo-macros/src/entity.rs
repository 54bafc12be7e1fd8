use proc_macro2::TokenStream;
use quote::quote;
use syn::{DataEnum, DataStruct, DeriveInput, Fields, LitStr, Result, Type};

/// Type-level `#[entity(...)]` settings.
#[derive(Default)]
struct TypeAttrs {
    collection: Option<String>,
    ancestors: Vec<String>,
    entity_base: bool,
}

fn parse_type_attrs(ast: &DeriveInput) -> Result<TypeAttrs> {
    let mut attrs = TypeAttrs::default();

    for attr in ast.attrs.iter().filter(|attr| attr.path().is_ident("entity")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.collection = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("ancestors") {
                meta.parse_nested_meta(|ancestor| {
                    let ident = ancestor
                        .path
                        .get_ident()
                        .ok_or_else(|| ancestor.error("ancestors must be plain type names"))?;
                    attrs.ancestors.push(ident.to_string());
                    Ok(())
                })
            } else if meta.path.is_ident("entity_base") {
                attrs.entity_base = true;
                Ok(())
            } else {
                Err(meta.error("unknown entity attribute"))
            }
        })?;
    }

    Ok(attrs)
}

fn reject_generics(ast: &DeriveInput) -> Result<()> {
    if ast.generics.params.is_empty() {
        Ok(())
    } else {
        Err(syn::Error::new_spanned(
            &ast.generics,
            "Entity cannot be derived for generic types",
        ))
    }
}

/// Builds the `descriptor()` method. `concrete_types` is an expression
/// yielding `&'static str` discriminators, if the type is polymorphic.
fn descriptor_fn(ast: &DeriveInput, attrs: &TypeAttrs, concrete_types: Option<TokenStream>) -> TokenStream {
    let name = ast.ident.to_string();
    let ancestors = &attrs.ancestors;

    let collection = attrs
        .collection
        .as_ref()
        .map(|collection| quote! { .collection(#collection) });
    let lineage = if attrs.entity_base {
        quote! { ::docrepo::entity::Lineage::EntityBase }
    } else {
        quote! { ::docrepo::entity::Lineage::Identity }
    };
    let concrete_types = concrete_types.map(|types| quote! { .concrete_types(#types) });

    quote! {
        fn descriptor() -> &'static ::docrepo::entity::EntityDescriptor {
            static DESCRIPTOR: ::std::sync::OnceLock<::docrepo::entity::EntityDescriptor> =
                ::std::sync::OnceLock::new();

            DESCRIPTOR.get_or_init(|| {
                ::docrepo::entity::EntityDescriptor::builder(#name)
                    #collection
                    .ancestors(&[#(#ancestors),*])
                    .lineage(#lineage)
                    #concrete_types
                    .build()
            })
        }
    }
}

pub(crate) fn generate_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    reject_generics(ast)?;
    let attrs = parse_type_attrs(ast)?;

    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            ast,
            "Entity can only be derived for structs with named fields",
        ));
    };

    let mut marked = Vec::new();
    for field in &fields.named {
        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("entity")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    marked.push(field);
                    Ok(())
                } else {
                    Err(meta.error("unknown entity field attribute"))
                }
            })?;
        }
    }

    let id_field = match marked.as_slice() {
        [field] => *field,
        [] => fields
            .named
            .iter()
            .find(|field| field.ident.as_ref().is_some_and(|ident| ident == "id"))
            .ok_or_else(|| {
                syn::Error::new_spanned(
                    ast,
                    "no identifier field: add a field named `id` or mark one with #[entity(id)]",
                )
            })?,
        [_, second, ..] => {
            return Err(syn::Error::new_spanned(
                second,
                "only one field can be marked #[entity(id)]",
            ));
        }
    };

    let name = &ast.ident;
    let id_ident = &id_field.ident;
    let id_type = &id_field.ty;
    let descriptor = descriptor_fn(ast, &attrs, None);

    Ok(quote! {
        impl ::docrepo::entity::Entity for #name {
            type Id = #id_type;

            fn id(&self) -> &Self::Id {
                &self.#id_ident
            }

            fn set_id(&mut self, id: Self::Id) {
                self.#id_ident = id;
            }

            #descriptor
        }
    })
}

/// The last path segment of a variant's payload type.
fn leaf_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(path) => path.path.segments.last().map(|segment| segment.ident.to_string()),
        _ => None,
    }
}

pub(crate) fn generate_for_enum(ast: &DeriveInput, data: &DataEnum) -> Result<TokenStream> {
    reject_generics(ast)?;
    let attrs = parse_type_attrs(ast)?;

    let mut variants = Vec::with_capacity(data.variants.len());

    for variant in &data.variants {
        let inner = match &variant.fields {
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => &fields.unnamed[0].ty,
            _ => {
                return Err(syn::Error::new_spanned(
                    variant,
                    "polymorphic entity variants must wrap exactly one entity type",
                ));
            }
        };

        if leaf_name(inner).as_deref() != Some(variant.ident.to_string().as_str()) {
            return Err(syn::Error::new_spanned(
                variant,
                "variant must be named after the entity type it wraps",
            ));
        }

        variants.push((&variant.ident, inner));
    }

    let Some((_, first)) = variants.first() else {
        return Err(syn::Error::new_spanned(
            ast,
            "polymorphic entities need at least one variant",
        ));
    };

    let name = &ast.ident;
    let idents: Vec<_> = variants.iter().map(|(ident, _)| *ident).collect();
    let types: Vec<_> = variants.iter().map(|(_, ty)| *ty).collect();

    let concrete_types = quote! {
        [#(<#types as ::docrepo::entity::Entity>::descriptor().discriminators()),*]
            .into_iter()
            .flatten()
            .copied()
    };
    let descriptor = descriptor_fn(ast, &attrs, Some(concrete_types));

    Ok(quote! {
        impl ::docrepo::entity::Entity for #name {
            type Id = <#first as ::docrepo::entity::Entity>::Id;

            fn id(&self) -> &Self::Id {
                match self {
                    #(#name::#idents(inner) => ::docrepo::entity::Entity::id(inner),)*
                }
            }

            fn set_id(&mut self, id: Self::Id) {
                match self {
                    #(#name::#idents(inner) => ::docrepo::entity::Entity::set_id(inner, id),)*
                }
            }

            #descriptor

            fn discriminator(&self) -> &'static str {
                match self {
                    #(#name::#idents(inner) => ::docrepo::entity::Entity::discriminator(inner),)*
                }
            }
        }
    })
}
