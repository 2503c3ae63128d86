//! Composable boolean queries
//!
//! Every node implements [`Query`]. A tree is evaluated with [`Query::run`],
//! which decides per subtree whether the index alone can answer it (Index
//! mode) or candidates must be re-checked against documents (Document mode).
//!
//! ```ignore
//! use aerodoc::query;
//!
//! let q = query::and(query::eq("x", 1), query::gt("y", 10));
//! let resolution = q.run(&collection, &store);
//! ```

mod and;
mod leaf;
mod node;
mod or;

use std::ops::Bound;

use crate::document::DocValue;

pub use and::QueryAnd;
pub use leaf::{QueryAll, QueryEquals, QueryIn, QueryNot, QueryRange, QueryStartsWith};
pub use node::{IndexResolution, Query, QueryMode, QueryResolution};
pub use or::QueryOr;

/// Every document
pub fn all() -> Box<dyn Query> {
    Box::new(QueryAll::new())
}

/// `field = value`
pub fn eq(field: impl Into<String>, value: impl Into<DocValue>) -> Box<dyn Query> {
    Box::new(QueryEquals::new(field, value))
}

/// `field > value`
pub fn gt(field: impl Into<String>, value: impl Into<DocValue>) -> Box<dyn Query> {
    Box::new(QueryRange::new(field, Bound::Excluded(value.into()), Bound::Unbounded))
}

/// `field >= value`
pub fn gte(field: impl Into<String>, value: impl Into<DocValue>) -> Box<dyn Query> {
    Box::new(QueryRange::new(field, Bound::Included(value.into()), Bound::Unbounded))
}

/// `field < value`
pub fn lt(field: impl Into<String>, value: impl Into<DocValue>) -> Box<dyn Query> {
    Box::new(QueryRange::new(field, Bound::Unbounded, Bound::Excluded(value.into())))
}

/// `field <= value`
pub fn lte(field: impl Into<String>, value: impl Into<DocValue>) -> Box<dyn Query> {
    Box::new(QueryRange::new(field, Bound::Unbounded, Bound::Included(value.into())))
}

/// `start <= field <= end`
pub fn between(
    field: impl Into<String>,
    start: impl Into<DocValue>,
    end: impl Into<DocValue>,
) -> Box<dyn Query> {
    Box::new(QueryRange::new(
        field,
        Bound::Included(start.into()),
        Bound::Included(end.into()),
    ))
}

/// `field` equal to any of `values`
pub fn in_list<I, V>(field: impl Into<String>, values: I) -> Box<dyn Query>
where
    I: IntoIterator<Item = V>,
    V: Into<DocValue>,
{
    Box::new(QueryIn::new(field, values))
}

/// `field != value`
pub fn not(field: impl Into<String>, value: impl Into<DocValue>) -> Box<dyn Query> {
    Box::new(QueryNot::new(field, value))
}

/// String `field` starting with `prefix`
pub fn starts_with(field: impl Into<String>, prefix: impl Into<String>) -> Box<dyn Query> {
    Box::new(QueryStartsWith::new(field, prefix))
}

/// Both sub-queries
pub fn and(left: Box<dyn Query>, right: Box<dyn Query>) -> Box<dyn Query> {
    Box::new(QueryAnd::new(left, right))
}

/// Either sub-query
pub fn or(left: Box<dyn Query>, right: Box<dyn Query>) -> Box<dyn Query> {
    Box::new(QueryOr::new(left, right))
}
