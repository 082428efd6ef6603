//! The map file written alongside every emitted container.
//!
//! Stored as JSON. Records are created once per successful compile and never
//! mutated afterwards.

use std::path::Path;

use dexon_common::{ContentHash, DelegateClosureKey, TypeScopeId};
use serde::{Deserialize, Serialize};

use crate::error::MapError;

/// Current map file format version.
const MAP_FORMAT_VERSION: u32 = 1;

/// Id of the type entry whose methods are emitted into the generated
/// container class rather than into a class of their own.
pub const GENERATED_TYPE_ID: u32 = 0;

/// Top-level map file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapFile {
    /// Map format version.
    pub format_version: u32,

    /// Version of the compiler that produced the map.
    pub producer_version: String,

    /// Descriptor of the compiler-synthesized generated container class.
    pub generated_class: Option<String>,

    /// Content fingerprints of the source modules compiled in this run.
    pub modules: Vec<ModuleFingerprint>,

    /// One entry per emitted type.
    pub types: Vec<TypeEntry>,
}

/// Content fingerprint of a source module at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleFingerprint {
    /// Module name, as reported by the front-end.
    pub name: String,

    /// Content hash of the module file when it was compiled.
    pub content_hash: ContentHash,
}

/// A compiled type and the identity it was emitted under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeEntry {
    /// Map-local type id. [`GENERATED_TYPE_ID`] marks the module-level type
    /// emitted into the generated container.
    pub id: u32,

    /// Source-level full name.
    pub name: String,

    /// Declaration scope (the declaring module's scope name), if known.
    pub scope: Option<String>,

    /// Position-derived scope id within `scope`, if known. Delegate adapter
    /// types store an encoded [`DelegateClosureKey`] here.
    pub scope_id: Option<String>,

    /// Emitted class descriptor.
    pub descriptor: String,

    /// Name of the source module declaring the type.
    pub module: Option<String>,

    /// Compiled methods of the type.
    pub methods: Vec<MethodEntry>,
}

impl TypeEntry {
    /// Returns the stable type scope id of this entry.
    pub fn type_scope_id(&self) -> TypeScopeId {
        TypeScopeId::from_parts(self.scope.as_deref(), self.scope_id.as_deref(), &self.name)
    }

    /// Returns `true` for compiler-synthesized delegate adapter types.
    pub fn is_delegate_closure(&self) -> bool {
        self.scope_id
            .as_deref()
            .is_some_and(DelegateClosureKey::is_delegate_scope_id)
    }

    /// Decodes the delegate closure key of an adapter type.
    pub fn delegate_key(&self) -> Option<DelegateClosureKey> {
        let raw = self.scope_id.as_deref()?;
        DelegateClosureKey::parse(self.scope.as_deref(), raw, &self.name)
    }
}

/// A compiled method and the identity it was emitted under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodEntry {
    /// Map-local method id.
    pub id: u32,

    /// Source-level method name.
    pub name: String,

    /// Emitted method name.
    pub dex_name: String,

    /// Emitted signature.
    pub dex_signature: String,

    /// Position-derived member scope id.
    pub scope_id: String,

    /// Source positions of the emitted body, by instruction offset.
    pub positions: Vec<SourceCodePosition>,
}

/// Maps an instruction offset to a source range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCodePosition {
    /// Instruction index in the emitted body.
    pub offset: u32,
    /// Source document path.
    pub document: String,
    /// First line, 1-based.
    pub start_line: u32,
    /// First column, 1-based.
    pub start_column: u32,
    /// Last line, 1-based.
    pub end_line: u32,
    /// Last column, 1-based.
    pub end_column: u32,
}

impl MapFile {
    /// Creates an empty map for the given compiler version.
    pub fn new(producer_version: &str) -> Self {
        Self {
            format_version: MAP_FORMAT_VERSION,
            producer_version: producer_version.to_string(),
            generated_class: None,
            modules: Vec::new(),
            types: Vec::new(),
        }
    }

    /// Loads and version-checks a map file.
    pub fn load(path: &Path) -> Result<Self, MapError> {
        let content = std::fs::read_to_string(path).map_err(|e| MapError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let map: MapFile = serde_json::from_str(&content).map_err(|e| MapError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if map.format_version != MAP_FORMAT_VERSION {
            return Err(MapError::VersionMismatch {
                path: path.to_path_buf(),
                expected: MAP_FORMAT_VERSION,
                actual: map.format_version,
            });
        }
        Ok(map)
    }

    /// Saves the map file, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), MapError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| MapError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| MapError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|e| MapError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
