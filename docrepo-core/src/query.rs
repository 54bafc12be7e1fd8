//! Predicate and query construction for repositories.
//!
//! Predicates are plain data ([`Expr`]); each provider compiles them into its
//! native filter form through a [`QueryVisitor`]. Providers reject shapes they
//! cannot express with [`DocumentStoreError::QueryTranslation`].
//!
//! ```ignore
//! use docrepo::query::{Query, Filter, SortDirection};
//!
//! let query = Query::builder()
//!     .filter(Filter::eq("first_name", "Bob"))
//!     .limit(10)
//!     .sort("last_name", SortDirection::Asc)
//!     .build();
//! ```
//!
//! The [`Filter`] helpers cover comparison (`eq`, `ne`, `gt`, `gte`, `lt`,
//! `lte`), strings (`starts_with`, `ends_with`, `contains`, `not_contains`),
//! existence (`exists`, `not_exists`), arrays (`any_of`, `none_of`) and logic
//! (`and`, `or`).

use bson::Bson;

use crate::{
    document::DISCRIMINATOR_FIELD,
    entity::EntityDescriptor,
    error::DocumentStoreError,
};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort specification for query results.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// Field comparison operators for filter expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// String or array contains value.
    Contains,
    /// String or array does not contain value.
    NotContains,
    StartsWith,
    EndsWith,
    /// Field equals, or array field contains, any of the values.
    AnyOf,
    /// Field equals, or array field contains, none of the values.
    NoneOf,
}

impl FieldOp {
    /// Short operator name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            FieldOp::Eq => "eq",
            FieldOp::Ne => "ne",
            FieldOp::Gt => "gt",
            FieldOp::Gte => "gte",
            FieldOp::Lt => "lt",
            FieldOp::Lte => "lte",
            FieldOp::Contains => "contains",
            FieldOp::NotContains => "not_contains",
            FieldOp::StartsWith => "starts_with",
            FieldOp::EndsWith => "ends_with",
            FieldOp::AnyOf => "any_of",
            FieldOp::NoneOf => "none_of",
        }
    }
}

/// A predicate over stored documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// All expressions must match.
    And(Vec<Expr>),
    /// Any expression must match.
    Or(Vec<Expr>),
    Not(Box<Expr>),
    /// Checks if a field exists or doesn't exist.
    Exists(String, bool),
    /// Field comparison expression.
    Field {
        field: String,
        op: FieldOp,
        value: Bson,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
    }

    /// Combines this expression with another using logical AND.
    ///
    /// If this expression is already an AND, the other expression is appended
    /// to the list. Otherwise, a new AND expression is created.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines this expression with another using logical OR.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    /// Negates this expression (logical NOT).
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// ANDs two optional predicates together.
    pub fn combine(left: Option<Expr>, right: Option<Expr>) -> Option<Expr> {
        match (left, right) {
            (Some(left), Some(right)) => Some(left.and(right)),
            (left, None) => left,
            (None, right) => right,
        }
    }
}

/// A structured query: filter, pagination and sort.
///
/// Use [`QueryBuilder`] for ergonomic construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Optional filter expression to match documents.
    pub filter: Option<Expr>,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
    /// Number of documents to skip.
    pub offset: Option<usize>,
    /// Sort specification for results.
    pub sort: Option<Sort>,
}

impl Query {
    /// Creates a new empty query with no filters or limits.
    pub fn new() -> Self {
        Query::default()
    }

    /// Creates a new query builder for fluent construction.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }
}

/// Helper struct for constructing filter expressions.
pub struct Filter;

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Ne, value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gt, value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gte, value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lt, value.into())
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lte, value.into())
    }

    /// Matches documents where the string field starts with the specified value.
    pub fn starts_with(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::StartsWith, value.into())
    }

    /// Matches documents where the string field ends with the specified value.
    pub fn ends_with(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::EndsWith, value.into())
    }

    /// Matches documents where the field (string or array) contains the specified value.
    pub fn contains(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Contains, value.into())
    }

    pub fn not_contains(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::NotContains, value.into())
    }

    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }

    /// Matches documents where the field equals (or the array field contains) any of the values.
    pub fn any_of(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::AnyOf, value.into())
    }

    pub fn none_of(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::NoneOf, value.into())
    }

    /// Matches documents whose discriminator identifies the described type or
    /// one of its subtypes, and documents written without a discriminator.
    ///
    /// Repositories use this for plain enumeration, so collections populated
    /// by other tools still decode as the repository's type. Use
    /// [`discriminated_as`](Self::discriminated_as) to partition by type.
    pub fn of_type(descriptor: &EntityDescriptor) -> Expr {
        Filter::any_of(
            DISCRIMINATOR_FIELD,
            descriptor
                .discriminators()
                .iter()
                .map(|name| Bson::String(name.to_string()))
                .collect::<Vec<_>>(),
        )
        .or(Filter::not_exists(DISCRIMINATOR_FIELD))
    }

    /// Matches documents whose discriminator identifies the described type or
    /// one of its subtypes, excluding untagged documents.
    pub fn discriminated_as(descriptor: &EntityDescriptor) -> Expr {
        Filter::any_of(
            DISCRIMINATOR_FIELD,
            descriptor
                .discriminators()
                .iter()
                .map(|name| Bson::String(name.to_string()))
                .collect::<Vec<_>>(),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Sets the filter expression for this query.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    /// ANDs an expression onto any filter already set.
    pub fn and_filter(mut self, filter: Expr) -> Self {
        self.query.filter = Expr::combine(self.query.filter.take(), Some(filter));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.query.offset = Some(offset);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort = Some(Sort { field: field.into(), direction });
        self
    }

    pub fn build(self) -> Query {
        self.query
    }
}

/// Compiles an [`Expr`] tree into some provider-specific output.
pub trait QueryVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}

/// Rejects predicates no provider can express, anywhere in the tree.
///
/// Providers call this before touching any data, so the outcome does not
/// depend on what the collection holds.
///
/// # Errors
///
/// Returns [`DocumentStoreError::QueryTranslation`] for an empty `and`/`or`
/// or for any field comparison [`check_operand`] rejects.
pub fn check_expr(expr: &Expr) -> Result<(), DocumentStoreError> {
    match expr {
        Expr::And(exprs) | Expr::Or(exprs) if exprs.is_empty() => Err(
            DocumentStoreError::QueryTranslation("empty `and`/`or` has no translation".into()),
        ),
        Expr::And(exprs) | Expr::Or(exprs) => exprs.iter().try_for_each(check_expr),
        Expr::Not(expr) => check_expr(expr),
        Expr::Exists(..) => Ok(()),
        Expr::Field { field, op, value } => check_operand(field, op, value),
    }
}

/// Rejects operand shapes no provider can express.
///
/// String operators need a string operand; `Contains`/`NotContains` need a
/// string or an array.
pub fn check_operand(field: &str, op: &FieldOp, value: &Bson) -> Result<(), DocumentStoreError> {
    let supported = match op {
        FieldOp::StartsWith | FieldOp::EndsWith => matches!(value, Bson::String(_)),
        FieldOp::Contains | FieldOp::NotContains => {
            matches!(value, Bson::String(_) | Bson::Array(_))
        }
        _ => true,
    };

    if supported {
        Ok(())
    } else {
        Err(DocumentStoreError::QueryTranslation(format!(
            "operator `{}` on field `{}` does not accept a {:?} operand",
            op.name(),
            field,
            value.element_type()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_flattens_into_existing_conjunction() {
        let expr = Filter::eq("a", 1)
            .and(Filter::eq("b", 2))
            .and(Filter::eq("c", 3));

        match expr {
            Expr::And(list) => assert_eq!(list.len(), 3),
            other => panic!("expected conjunction, got {other:?}"),
        }
    }

    #[test]
    fn builder_and_filter_accumulates() {
        let query = Query::builder()
            .and_filter(Filter::eq("first_name", "Bob"))
            .and_filter(Filter::exists("email"))
            .limit(5)
            .build();

        assert_eq!(
            query.filter,
            Some(Expr::And(vec![
                Filter::eq("first_name", "Bob"),
                Filter::exists("email"),
            ]))
        );
        assert_eq!(query.limit, Some(5));
    }

    #[test]
    fn of_type_lists_every_concrete_discriminator() {
        let descriptor = EntityDescriptor::builder("Animal")
            .concrete_types(["Dog", "Lion"])
            .build();

        assert_eq!(
            Filter::discriminated_as(&descriptor),
            Filter::any_of(
                DISCRIMINATOR_FIELD,
                vec![Bson::String("Dog".into()), Bson::String("Lion".into())]
            )
        );
    }

    #[test]
    fn plain_enumeration_also_accepts_untagged_documents() {
        let descriptor = EntityDescriptor::builder("Dog").build();

        assert_eq!(
            Filter::of_type(&descriptor),
            Filter::discriminated_as(&descriptor).or(Filter::not_exists(DISCRIMINATOR_FIELD))
        );
    }

    #[test]
    fn tree_check_reaches_every_branch() {
        let hidden = Filter::or([
            Filter::eq("first_name", "Bob"),
            Filter::starts_with("first_name", 5).not(),
        ]);

        assert!(matches!(check_expr(&hidden), Err(DocumentStoreError::QueryTranslation(_))));
        assert!(matches!(
            check_expr(&Filter::and([])),
            Err(DocumentStoreError::QueryTranslation(_))
        ));
        assert!(matches!(
            check_expr(&Filter::eq("a", 1).and(Filter::or([]))),
            Err(DocumentStoreError::QueryTranslation(_))
        ));
        assert!(check_expr(&Filter::eq("a", 1).or(Filter::exists("b"))).is_ok());
    }

    #[test]
    fn string_operators_reject_numbers() {
        let err = check_operand("name", &FieldOp::StartsWith, &Bson::Int32(4)).unwrap_err();

        assert!(matches!(err, DocumentStoreError::QueryTranslation(_)));
        assert!(check_operand("name", &FieldOp::Contains, &Bson::Array(vec![])).is_ok());
        assert!(check_operand("price", &FieldOp::Gt, &Bson::Int32(4)).is_ok());
    }
}
