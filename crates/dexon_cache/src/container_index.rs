//! Lookup over the container emitted by the previous run.

use std::collections::HashMap;

use dexon_dex::{ClassDef, Container, MemberKey, MethodDef, PrototypePool};

/// A method found in the cached container, with its declaring class.
#[derive(Debug, Clone, Copy)]
pub struct IndexedMethod<'a> {
    /// The class the method was emitted into.
    pub class: &'a ClassDef,
    /// The method, including its cached body if it has one.
    pub method: &'a MethodDef,
}

/// Index over a cached [`Container`], keyed by (owner, name, signature).
///
/// Owns the container; cached bodies are only ever handed out by reference
/// and cloned by the caller.
pub struct ContainerIndex {
    container: Container,
    methods: HashMap<MemberKey, (usize, usize)>,
}

impl ContainerIndex {
    /// Builds the index. Method prototypes are hash-consed so that later
    /// prototype comparisons against the same signature share one allocation.
    pub fn new(mut container: Container) -> Self {
        let pool = PrototypePool::new();
        let mut methods = HashMap::new();

        for (ci, class) in container.classes.iter_mut().enumerate() {
            for (mi, method) in class.methods.iter_mut().enumerate() {
                method.prototype = pool.intern(method.prototype.clone());
                methods.insert(
                    MemberKey::new(
                        class.class.descriptor(),
                        &method.name,
                        method.prototype.signature(),
                    ),
                    (ci, mi),
                );
            }
        }

        Self { container, methods }
    }

    /// Looks up a method by owner descriptor, name and signature.
    pub fn method(&self, owner: &str, name: &str, signature: &str) -> Option<IndexedMethod<'_>> {
        let &(ci, mi) = self.methods.get(&MemberKey::new(owner, name, signature))?;
        let class = &self.container.classes[ci];
        Some(IndexedMethod {
            class,
            method: &class.methods[mi],
        })
    }

    /// Returns the number of indexed methods.
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}
