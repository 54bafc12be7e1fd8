//! Predicate translation from docrepo expressions to MongoDB filters.

use bson::{Bson, Document, doc};

use docrepo_core::{
    error::DocumentStoreError,
    query::{Expr, FieldOp, QueryVisitor, check_expr},
};

/// Translates predicate expressions into MongoDB filter documents.
///
/// String operators compile to anchored, escaped regular expressions and are
/// case-sensitive, matching the in-memory evaluator.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    /// Translates an optional filter; `None` matches every document.
    ///
    /// The whole tree is checked first, so an empty `and`/`or` (which the
    /// server would reject) surfaces as a translation error.
    pub(crate) fn translate(filter: Option<&Expr>) -> Result<Document, DocumentStoreError> {
        match filter {
            Some(expr) => {
                check_expr(expr)?;
                MongoQueryTranslator.visit_expr(expr)
            }
            None => Ok(Document::new()),
        }
    }
}

/// Escapes regular-expression metacharacters.
fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());

    for c in input.chars() {
        if "\\.^$|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

fn as_list(value: &Bson) -> Bson {
    match value {
        Bson::Array(_) => value.clone(),
        single => Bson::Array(vec![single.clone()]),
    }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        // `$not` only applies to a single field; `$nor` negates a whole filter.
        Ok(doc! {
            "$nor": [self.visit_expr(expr)?],
        })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: { "$exists": should_exist },
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let condition = match (op, value) {
            (FieldOp::Eq, _) => doc! { "$eq": value },
            (FieldOp::Ne, _) => doc! { "$ne": value },
            (FieldOp::Gt, _) => doc! { "$gt": value },
            (FieldOp::Gte, _) => doc! { "$gte": value },
            (FieldOp::Lt, _) => doc! { "$lt": value },
            (FieldOp::Lte, _) => doc! { "$lte": value },
            (FieldOp::Contains, Bson::String(s)) => doc! { "$regex": escape_regex(s) },
            (FieldOp::Contains, _) => doc! { "$all": as_list(value) },
            (FieldOp::NotContains, Bson::String(s)) => {
                doc! { "$not": { "$regex": escape_regex(s) } }
            }
            (FieldOp::NotContains, _) => doc! { "$nin": as_list(value) },
            (FieldOp::StartsWith, Bson::String(s)) => doc! { "$regex": format!("^{}", escape_regex(s)) },
            (FieldOp::EndsWith, Bson::String(s)) => doc! { "$regex": format!("{}$", escape_regex(s)) },
            (FieldOp::AnyOf, _) => doc! { "$in": as_list(value) },
            (FieldOp::NoneOf, _) => doc! { "$nin": as_list(value) },
            (FieldOp::StartsWith | FieldOp::EndsWith, _) => {
                return Err(DocumentStoreError::QueryTranslation(format!(
                    "operator `{}` on field `{field}` needs a string operand",
                    op.name()
                )));
            }
        };

        Ok(doc! { field: condition })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrepo_core::{entity::EntityDescriptor, query::Filter};

    fn translate(expr: Expr) -> Result<Document, DocumentStoreError> {
        MongoQueryTranslator::translate(Some(&expr))
    }

    #[test]
    fn comparison_operators() {
        assert_eq!(
            translate(Filter::gte("age", 18)).unwrap(),
            doc! { "age": { "$gte": 18 } }
        );
        assert_eq!(translate(Filter::ne("name", "Bob")).unwrap(), doc! { "name": { "$ne": "Bob" } });
    }

    #[test]
    fn string_operators_escape_their_operand() {
        assert_eq!(
            translate(Filter::starts_with("first_name", "Client.")).unwrap(),
            doc! { "first_name": { "$regex": "^Client\\." } }
        );
        assert_eq!(
            translate(Filter::ends_with("email", "@x.io")).unwrap(),
            doc! { "email": { "$regex": "@x\\.io$" } }
        );
    }

    #[test]
    fn negation_uses_nor() {
        assert_eq!(
            translate(Filter::eq("a", 1).not()).unwrap(),
            doc! { "$nor": [{ "a": { "$eq": 1 } }] }
        );
    }

    #[test]
    fn type_restriction_translates_to_in_or_missing() {
        let descriptor = EntityDescriptor::builder("Animal")
            .concrete_types(["Dog", "Lion"])
            .build();

        assert_eq!(
            translate(Filter::of_type(&descriptor)).unwrap(),
            doc! {
                "$or": [
                    { "_t": { "$in": ["Dog", "Lion"] } },
                    { "_t": { "$exists": false } },
                ]
            }
        );
    }

    #[test]
    fn scalar_membership_is_wrapped() {
        assert_eq!(translate(Filter::any_of("tag", "a")).unwrap(), doc! { "tag": { "$in": ["a"] } });
    }

    #[test]
    fn unsupported_operands_are_translation_errors() {
        let err = translate(Filter::starts_with("first_name", 1)).unwrap_err();
        assert!(matches!(err, DocumentStoreError::QueryTranslation(_)));

        let err = translate(Filter::contains("tags", true)).unwrap_err();
        assert!(matches!(err, DocumentStoreError::QueryTranslation(_)));
    }

    #[test]
    fn empty_logic_is_a_translation_error() {
        for expr in [Filter::and([]), Filter::or([]), Filter::eq("a", 1).and(Filter::or([]))] {
            assert!(matches!(translate(expr), Err(DocumentStoreError::QueryTranslation(_))));
        }
    }

    #[test]
    fn no_filter_matches_everything() {
        assert_eq!(MongoQueryTranslator::translate(None).unwrap(), Document::new());
    }
}
