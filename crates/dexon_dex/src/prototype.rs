//! Method prototypes: normalized return and parameter types.
//!
//! A prototype is assembled through a [`PrototypeBuilder`] and frozen by
//! [`PrototypeBuilder::build`]. Frozen prototypes are immutable and shared;
//! they carry their signature string and hash so that using them as map keys
//! costs no re-encoding.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::types::TypeRef;

/// Mutable phase of a prototype.
#[derive(Debug, Clone)]
pub struct PrototypeBuilder {
    return_type: TypeRef,
    parameters: Vec<TypeRef>,
}

impl PrototypeBuilder {
    /// Starts a prototype with the given return type and no parameters.
    pub fn new(return_type: impl Into<TypeRef>) -> Self {
        Self {
            return_type: return_type.into(),
            parameters: Vec::new(),
        }
    }

    /// Appends a parameter.
    pub fn param(mut self, ty: impl Into<TypeRef>) -> Self {
        self.parameters.push(ty.into());
        self
    }

    /// Appends a parameter in place.
    pub fn push_param(&mut self, ty: impl Into<TypeRef>) {
        self.parameters.push(ty.into());
    }

    /// Replaces the return type.
    pub fn set_return_type(&mut self, ty: impl Into<TypeRef>) {
        self.return_type = ty.into();
    }

    /// Freezes the prototype, computing its signature and hash once.
    pub fn build(self) -> Prototype {
        let mut signature = String::from("(");
        for p in &self.parameters {
            p.write_descriptor(&mut signature);
        }
        signature.push(')');
        self.return_type.write_descriptor(&mut signature);
        let hash = xxhash_rust::xxh3::xxh3_64(signature.as_bytes());

        Prototype(Arc::new(Frozen {
            return_type: self.return_type,
            parameters: self.parameters,
            signature,
            hash,
        }))
    }
}

struct Frozen {
    return_type: TypeRef,
    parameters: Vec<TypeRef>,
    signature: String,
    hash: u64,
}

/// A frozen method prototype.
///
/// Cloning is a reference-count bump. Equality is structural over the return
/// type and the ordered parameter types; the hash is derived from the
/// signature string, which structurally equal prototypes always share.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "PrototypeRepr", into = "PrototypeRepr")]
pub struct Prototype(Arc<Frozen>);

impl Prototype {
    /// Builds a frozen prototype directly.
    pub fn new(return_type: impl Into<TypeRef>, parameters: Vec<TypeRef>) -> Self {
        PrototypeBuilder {
            return_type: return_type.into(),
            parameters,
        }
        .build()
    }

    /// Returns the return type.
    pub fn return_type(&self) -> &TypeRef {
        &self.0.return_type
    }

    /// Returns the parameter types in order.
    pub fn parameters(&self) -> &[TypeRef] {
        &self.0.parameters
    }

    /// Returns the signature string, e.g. `(ILjava/lang/String;)V`.
    pub fn signature(&self) -> &str {
        &self.0.signature
    }

    /// Returns a builder seeded with this prototype's types.
    pub fn to_builder(&self) -> PrototypeBuilder {
        PrototypeBuilder {
            return_type: self.0.return_type.clone(),
            parameters: self.0.parameters.clone(),
        }
    }

    /// Returns `true` if both values share the same frozen allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Prototype {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.0.hash == other.0.hash
                && self.0.return_type == other.0.return_type
                && self.0.parameters == other.0.parameters)
    }
}

impl Eq for Prototype {}

impl Hash for Prototype {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.signature)
    }
}

impl fmt::Debug for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Prototype({})", self.0.signature)
    }
}

#[derive(Serialize, Deserialize)]
struct PrototypeRepr {
    return_type: TypeRef,
    parameters: Vec<TypeRef>,
}

impl From<PrototypeRepr> for Prototype {
    fn from(repr: PrototypeRepr) -> Self {
        Prototype::new(repr.return_type, repr.parameters)
    }
}

impl From<Prototype> for PrototypeRepr {
    fn from(p: Prototype) -> Self {
        Self {
            return_type: p.0.return_type.clone(),
            parameters: p.0.parameters.clone(),
        }
    }
}

/// Hash-consing pool for prototypes.
///
/// Structurally equal prototypes interned through the same pool share one
/// frozen allocation, so later comparisons hit the pointer fast path.
#[derive(Default)]
pub struct PrototypePool {
    interned: Mutex<HashSet<Prototype>>,
}

impl PrototypePool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pooled instance structurally equal to `prototype`,
    /// inserting it if none exists yet.
    pub fn intern(&self, prototype: Prototype) -> Prototype {
        let mut interned = self.interned.lock();
        if let Some(existing) = interned.get(&prototype) {
            return existing.clone();
        }
        interned.insert(prototype.clone());
        prototype
    }

    /// Returns the number of distinct prototypes in the pool.
    pub fn len(&self) -> usize {
        self.interned.lock().len()
    }

    /// Returns `true` if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
