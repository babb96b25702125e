//! Authentication primitives.
//!
//! - [`jwt`] -- JWT access-token validation (and generation, for issuers and tests).

pub mod jwt;
