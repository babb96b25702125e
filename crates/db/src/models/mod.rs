//! Read models and response DTOs.
//!
//! - [`issue`] -- `FromRow` structs for search rows, bucket discovery and
//!   batched relation lookups
//! - [`issue_view`] -- `Serialize` shapes returned to callers

pub mod issue;
pub mod issue_view;
