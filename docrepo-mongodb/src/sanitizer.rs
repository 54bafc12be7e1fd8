//! Field-name sanitization for MongoDB compatibility.
//!
//! MongoDB reserves `.` and `$` in field names for paths and operators, and
//! rejects `\0` outright. Keys containing them are escaped on the way in and
//! restored on the way out. Values are stored untouched so that predicates
//! compare against exactly what the caller wrote.

use bson::{Bson, Document};

/// Escapes and restores document keys.
pub(crate) struct KeySanitizer;

impl KeySanitizer {
    const REPLACEMENTS: [(&'static str, &'static str); 3] = [
        (".", "__dot__"),
        ("$", "__dollar__"),
        ("\0", "__null__"),
    ];

    /// Recursively escapes the keys of every embedded document.
    pub(crate) fn sanitize_value(value: &Bson) -> Bson {
        match value {
            Bson::Array(arr) => Bson::Array(arr.iter().map(Self::sanitize_value).collect()),
            Bson::Document(doc) => Bson::Document(Self::sanitize_document(doc)),
            _ => value.clone(),
        }
    }

    pub(crate) fn sanitize_document(doc: &Document) -> Document {
        doc.iter()
            .map(|(k, v)| (Self::sanitize_key(k), Self::sanitize_value(v)))
            .collect()
    }

    pub(crate) fn sanitize_key(input: &str) -> String {
        Self::REPLACEMENTS
            .iter()
            .fold(input.to_string(), |key, (target, replacement)| {
                key.replace(target, replacement)
            })
    }

    /// Collection names may contain dots but not `$` or `\0`.
    pub(crate) fn sanitize_collection_name(input: &str) -> String {
        Self::REPLACEMENTS
            .iter()
            .skip(1)
            .fold(input.to_string(), |name, (target, replacement)| {
                name.replace(target, replacement)
            })
    }

    /// Recursively reverts [`sanitize_value`](Self::sanitize_value).
    pub(crate) fn restore_value(value: &Bson) -> Bson {
        match value {
            Bson::Array(arr) => Bson::Array(arr.iter().map(Self::restore_value).collect()),
            Bson::Document(doc) => Bson::Document(Self::restore_document(doc)),
            _ => value.clone(),
        }
    }

    pub(crate) fn restore_document(doc: &Document) -> Document {
        doc.iter()
            .map(|(k, v)| (Self::restore_key(k), Self::restore_value(v)))
            .collect()
    }

    pub(crate) fn restore_key(input: &str) -> String {
        Self::REPLACEMENTS
            .iter()
            .rev()
            .fold(input.to_string(), |key, (target, replacement)| {
                key.replace(replacement, target)
            })
    }
}
