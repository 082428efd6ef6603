//! Shared foundational types used across the dexon compiler toolchain.
//!
//! This crate provides the position-derived scope identifiers that correlate
//! program elements across compiler runs, content fingerprints used for
//! freshness checks, and the internal error type.

#![warn(missing_docs)]

pub mod hash;
pub mod result;
pub mod scope;

pub use hash::ContentHash;
pub use result::InternalError;
pub use scope::{DelegateClosureKey, ScopeId, TypeScopeId, NO_SCOPE};
