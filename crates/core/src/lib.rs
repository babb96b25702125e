//! Domain vocabulary for the issue query engine.
//!
//! This crate has no internal dependencies so it can be shared by the
//! repository layer, the HTTP layer and any future tooling.

pub mod error;
pub mod issue_fields;
pub mod issue_search;
pub mod search;
pub mod types;
