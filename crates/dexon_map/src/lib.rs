//! Persisted map file correlating stable scope ids with emitted identities.
//!
//! Every successful compilation writes a map file next to the container it
//! emitted. The map records, per compiled type and method, the scope id the
//! front-end assigned and the descriptor, name and signature actually
//! emitted, plus a content fingerprint per source module. A later session
//! loads it into a [`MapIndex`] to find reusable method bodies.

#![warn(missing_docs)]

pub mod error;
pub mod index;
pub mod map;

pub use error::MapError;
pub use index::{MapIndex, MapRecord};
pub use map::{MapFile, MethodEntry, ModuleFingerprint, SourceCodePosition, TypeEntry, GENERATED_TYPE_ID};
