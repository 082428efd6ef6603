//! In-memory model of the target bytecode container.
//!
//! Types, method prototypes, member references, method bodies and the
//! container file codec. The method body cache reads a container emitted by a
//! previous run through this crate and rewrites the references it finds in
//! cached bodies.

#![warn(missing_docs)]

pub mod body;
pub mod container;
pub mod error;
pub mod prototype;
pub mod reference;
pub mod types;

pub use body::{Catch, ExceptionHandler, Instruction, MethodBody, Opcode, Operand};
pub use container::{ClassDef, Container, FieldDef, MethodDef};
pub use error::DexError;
pub use prototype::{Prototype, PrototypeBuilder, PrototypePool};
pub use reference::{FieldRef, MemberKey, MethodRef};
pub use types::{ClassRef, PrimitiveType, TypeRef};
