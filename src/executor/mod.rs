//! Query executor subsystem for aerodoc
//!
//! The executor turns a query tree into documents.
//!
//! # Execution Flow (strict order)
//!
//! 1. Run the query tree to obtain candidates and the resolved mode
//! 2. Drop repeated locations
//! 3. Load each candidate from storage
//! 4. In Document mode, re-check every candidate against the query
//! 5. Apply skip and limit
//! 6. Return results in candidate order
//!
//! Index mode results are returned without a per-document check.

mod errors;
mod executor;
mod result;

pub use errors::{ExecutorError, ExecutorResult};
pub use executor::{DocumentSource, QueryExecutor};
pub use result::{ExecutionResult, ResultDocument};
