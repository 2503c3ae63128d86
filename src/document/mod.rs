//! Document value model for aerodoc
//!
//! Everything the query engine evaluates and the mapper produces is a
//! [`DocValue`] tree rooted at a [`Document`].
//!
//! # Invariants
//!
//! - Document fields keep insertion order
//! - Every scalar has exactly one variant (narrow integers are widened by the mapper)
//! - `_id` and `_type` are reserved field names

mod document;
mod errors;
pub mod json;
mod object_id;
mod value;

pub use document::{Document, ID_FIELD, TYPE_FIELD};
pub use errors::{DocumentError, DocumentResult};
pub use object_id::ObjectId;
pub use value::DocValue;
