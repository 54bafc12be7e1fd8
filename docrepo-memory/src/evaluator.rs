//! Predicate evaluation for the in-memory store.
//!
//! Predicates are evaluated document by document. Field names may use dotted
//! paths (`address.city`) to reach into embedded documents.

use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};
use std::{cmp::Ordering, collections::HashMap};

use docrepo_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Expr, FieldOp, QueryVisitor, check_operand},
};

/// Comparable view of a BSON value. Integers and floats compare as `f64`.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    ObjectId(ObjectId),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Any other value, compared for equality only.
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::Array(arr) => Comparable::Array(arr.iter().map(Comparable::from).collect()),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect(),
            ),
            other => Comparable::Other(other),
        }
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Resolves a dotted field path inside `document`.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}

/// Orders two documents by `field`. Missing or incomparable values sort as equal.
pub(crate) fn compare_by(field: &str, a: &Bson, b: &Bson) -> Ordering {
    fn value<'a>(doc: &'a Bson, field: &str) -> Comparable<'a> {
        doc.as_document()
            .and_then(|doc| lookup(doc, field))
            .map(Comparable::from)
            .unwrap_or(Comparable::Null)
    }

    value(a, field)
        .partial_cmp(&value(b, field))
        .unwrap_or(Ordering::Equal)
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    /// Prepares to evaluate predicates against `document`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidDocument`] if `document` is not a document.
    pub fn new(document: &'a Bson) -> DocumentStoreResult<Self> {
        match document.as_document() {
            Some(document) => Ok(Self { document }),
            None => Err(DocumentStoreError::InvalidDocument(format!(
                "stored value is a {:?}, expected a document",
                document.element_type()
            ))),
        }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> DocumentStoreResult<bool> {
        self.visit_expr(expr)
    }

    /// Returns `true` if `document` matches `filter`, or if there is no filter.
    pub fn matches(document: &'a Bson, filter: Option<&Expr>) -> DocumentStoreResult<bool> {
        match filter {
            Some(expr) => DocumentEvaluator::new(document)?.evaluate(expr),
            None => Ok(true),
        }
    }

    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Bson>,
        expr: &Expr,
    ) -> DocumentStoreResult<Vec<Bson>> {
        let mut matched = Vec::new();

        for doc in documents {
            if DocumentEvaluator::new(doc)?.evaluate(expr)? {
                matched.push(doc.clone());
            }
        }

        Ok(matched)
    }
}

fn any_shared(field_value: Comparable<'_>, value: Comparable<'_>) -> bool {
    match (field_value, value) {
        (Comparable::Array(array), Comparable::Array(values)) => {
            values.iter().any(|val| array.iter().any(|item| item == val))
        }
        (Comparable::Array(array), single_value) => {
            array.iter().any(|item| item == &single_value)
        }
        (single_value, Comparable::Array(values)) => {
            values.iter().any(|val| val == &single_value)
        }
        (left, right) => left == right,
    }
}

fn contains(field_value: Comparable<'_>, value: Comparable<'_>) -> bool {
    match (field_value, value) {
        (Comparable::Array(array), needle) => array.iter().any(|item| item == &needle),
        (Comparable::String(left), Comparable::String(right)) => left.contains(right),
        _ => false,
    }
}

impl QueryVisitor for DocumentEvaluator<'_> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(lookup(self.document, field).is_some() == should_exist)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        check_operand(field, op, value)?;

        let Some(field_value) = lookup(self.document, field) else {
            // Negative operators match documents that lack the field.
            return Ok(matches!(op, FieldOp::Ne | FieldOp::NotContains | FieldOp::NoneOf));
        };
        let (left, right) = (Comparable::from(field_value), Comparable::from(value));

        Ok(match op {
            FieldOp::Eq => left == right,
            FieldOp::Ne => left != right,
            FieldOp::Gt => left.partial_cmp(&right) == Some(Ordering::Greater),
            FieldOp::Gte => matches!(left.partial_cmp(&right), Some(Ordering::Greater | Ordering::Equal)),
            FieldOp::Lt => left.partial_cmp(&right) == Some(Ordering::Less),
            FieldOp::Lte => matches!(left.partial_cmp(&right), Some(Ordering::Less | Ordering::Equal)),
            FieldOp::Contains => contains(left, right),
            FieldOp::NotContains => !contains(left, right),
            FieldOp::StartsWith => match (left, right) {
                (Comparable::String(left), Comparable::String(right)) => left.starts_with(right),
                _ => false,
            },
            FieldOp::EndsWith => match (left, right) {
                (Comparable::String(left), Comparable::String(right)) => left.ends_with(right),
                _ => false,
            },
            FieldOp::AnyOf => any_shared(left, right),
            FieldOp::NoneOf => !any_shared(left, right),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docrepo_core::query::Filter;

    fn customer() -> Bson {
        Bson::Document(doc! {
            "first_name": "Client1",
            "last_name": "Dillon",
            "age": 42,
            "tags": ["vip", "north"],
            "address": { "city": "Oslo" },
            "_t": "Customer",
        })
    }

    fn eval(expr: Expr) -> DocumentStoreResult<bool> {
        let document = customer();
        DocumentEvaluator::new(&document)?.evaluate(&expr)
    }

    #[test]
    fn compares_numbers_across_widths() {
        assert!(eval(Filter::eq("age", 42i64)).unwrap());
        assert!(eval(Filter::gte("age", 42.0)).unwrap());
        assert!(!eval(Filter::lt("age", 40)).unwrap());
    }

    #[test]
    fn string_operators() {
        assert!(eval(Filter::starts_with("first_name", "Client")).unwrap());
        assert!(eval(Filter::ends_with("last_name", "lon")).unwrap());
        assert!(eval(Filter::contains("last_name", "ill")).unwrap());
        assert!(eval(Filter::not_contains("first_name", "Bob")).unwrap());
    }

    #[test]
    fn array_membership() {
        assert!(eval(Filter::contains("tags", "vip")).unwrap());
        assert!(eval(Filter::any_of("tags", vec!["south", "north"])).unwrap());
        assert!(eval(Filter::none_of("tags", vec!["south"])).unwrap());
        assert!(eval(Filter::any_of("_t", vec!["Customer", "Lead"])).unwrap());
    }

    #[test]
    fn dotted_paths_reach_embedded_documents() {
        assert!(eval(Filter::eq("address.city", "Oslo")).unwrap());
        assert!(eval(Filter::exists("address.city")).unwrap());
        assert!(eval(Filter::not_exists("address.zip")).unwrap());
    }

    #[test]
    fn missing_fields_only_match_negative_operators() {
        assert!(!eval(Filter::eq("email", "x")).unwrap());
        assert!(eval(Filter::ne("email", "x")).unwrap());
        assert!(eval(Filter::none_of("email", vec!["x"])).unwrap());
    }

    #[test]
    fn logic_combinators() {
        let expr = Filter::or([
            Filter::eq("first_name", "Nobody"),
            Filter::and([Filter::eq("last_name", "Dillon"), Filter::gt("age", 18)]),
        ]);

        assert!(eval(expr).unwrap());
        assert!(!eval(Filter::eq("last_name", "Dillon").not()).unwrap());
    }

    #[test]
    fn unsupported_operands_are_translation_errors() {
        let err = eval(Filter::starts_with("first_name", 5)).unwrap_err();

        assert!(matches!(err, DocumentStoreError::QueryTranslation(_)));
    }

    #[test]
    fn non_document_values_are_rejected() {
        let value = Bson::String("not a document".into());

        assert!(matches!(
            DocumentEvaluator::new(&value),
            Err(DocumentStoreError::InvalidDocument(_))
        ));
    }

    #[test]
    fn sorting_compares_by_field() {
        let a = Bson::Document(doc! { "n": 1 });
        let b = Bson::Document(doc! { "n": 2 });

        assert_eq!(compare_by("n", &a, &b), Ordering::Less);
        assert_eq!(compare_by("missing", &a, &b), Ordering::Equal);
    }
}
