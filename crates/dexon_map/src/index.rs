//! In-memory lookup over a loaded map file.
//!
//! Built once, eagerly, and immutable afterwards, so it can be shared across
//! compilation workers without locking.

use std::collections::HashMap;

use dexon_common::{ContentHash, TypeScopeId};
use dexon_dex::MemberKey;

use crate::map::{MapFile, MethodEntry, SourceCodePosition, TypeEntry, GENERATED_TYPE_ID};

/// A method entry resolved together with the types it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct MapRecord<'a> {
    /// The type entry declaring the method in source. Its scope id is the
    /// method's stable declaring scope.
    pub declaring: &'a TypeEntry,

    /// The method entry.
    pub method: &'a MethodEntry,

    /// Descriptor of the class the method was emitted into. Differs from
    /// `declaring.descriptor` for methods emitted into the generated
    /// container.
    pub emitted_owner: &'a str,
}

impl<'a> MapRecord<'a> {
    /// Returns the source positions recorded for the method body. The slice
    /// borrows from the index, not from the record.
    pub fn source_positions(&self) -> &'a [SourceCodePosition] {
        &self.method.positions
    }
}

/// Index over a [`MapFile`].
pub struct MapIndex {
    map: MapFile,
    by_scope: HashMap<TypeScopeId, HashMap<String, (usize, usize)>>,
    by_emitted: HashMap<MemberKey, (usize, usize)>,
    types_by_descriptor: HashMap<String, usize>,
    modules: HashMap<String, ContentHash>,
}

impl MapIndex {
    /// Builds the index over a loaded map.
    ///
    /// Types without a scope id cannot be correlated across runs and are left
    /// out of the scope lookup, but remain reachable by descriptor. When two
    /// methods claim the same scope id the later one wins.
    pub fn new(map: MapFile) -> Self {
        let mut by_scope: HashMap<TypeScopeId, HashMap<String, (usize, usize)>> = HashMap::new();
        let mut by_emitted = HashMap::new();
        let mut types_by_descriptor = HashMap::with_capacity(map.types.len());

        for (ti, ty) in map.types.iter().enumerate() {
            types_by_descriptor.insert(ty.descriptor.clone(), ti);

            let emitted_owner = emitted_owner(&map, ty);
            for (mi, method) in ty.methods.iter().enumerate() {
                by_emitted.insert(
                    MemberKey::new(emitted_owner, &method.dex_name, &method.dex_signature),
                    (ti, mi),
                );
            }

            if ty.scope_id.is_none() {
                continue;
            }
            let members = by_scope.entry(ty.type_scope_id()).or_default();
            for (mi, method) in ty.methods.iter().enumerate() {
                members.insert(method.scope_id.clone(), (ti, mi));
            }
        }

        let modules = map
            .modules
            .iter()
            .map(|m| (m.name.clone(), m.content_hash))
            .collect();

        Self {
            map,
            by_scope,
            by_emitted,
            types_by_descriptor,
            modules,
        }
    }

    /// Looks up a method by its stable scope id.
    pub fn method_by_scope(&self, type_scope: &TypeScopeId, member: &str) -> Option<MapRecord<'_>> {
        let &(ti, mi) = self.by_scope.get(type_scope)?.get(member)?;
        Some(self.record(ti, mi))
    }

    /// Looks up a method by the identity it was emitted under.
    pub fn method_by_emitted(&self, owner: &str, name: &str, signature: &str) -> Option<MapRecord<'_>> {
        let &(ti, mi) = self.by_emitted.get(&MemberKey::new(owner, name, signature))?;
        Some(self.record(ti, mi))
    }

    /// Looks up a type entry by its emitted descriptor.
    pub fn type_by_descriptor(&self, descriptor: &str) -> Option<&TypeEntry> {
        self.types_by_descriptor
            .get(descriptor)
            .map(|&ti| &self.map.types[ti])
    }

    /// Returns the generated container's descriptor, if the run emitted one.
    pub fn generated_class(&self) -> Option<&str> {
        self.map.generated_class.as_deref()
    }

    /// Returns the recorded fingerprint of a source module.
    pub fn module_fingerprint(&self, module: &str) -> Option<ContentHash> {
        self.modules.get(module).copied()
    }

    /// Returns the underlying map file.
    pub fn map(&self) -> &MapFile {
        &self.map
    }

    fn record(&self, ti: usize, mi: usize) -> MapRecord<'_> {
        let declaring = &self.map.types[ti];
        MapRecord {
            declaring,
            method: &declaring.methods[mi],
            emitted_owner: emitted_owner(&self.map, declaring),
        }
    }
}

fn emitted_owner<'a>(map: &'a MapFile, ty: &'a TypeEntry) -> &'a str {
    match map.generated_class.as_deref() {
        Some(generated) if ty.id == GENERATED_TYPE_ID => generated,
        _ => &ty.descriptor,
    }
}
