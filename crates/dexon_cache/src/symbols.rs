//! Contracts the cache needs from the front-end and the code generator.

use std::fmt;
use std::path::PathBuf;

use dexon_common::{DelegateClosureKey, ScopeId, TypeScopeId};
use dexon_dex::{ClassRef, MethodRef};

/// A source module (an assembly or a class library) that methods are
/// compiled from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceModule {
    /// Module name, matching the name recorded in the map file.
    pub name: String,
    /// Location of the module file, hashed for the freshness check.
    pub path: PathBuf,
}

impl SourceModule {
    /// Creates a source module.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// A method the front-end asks the code generator to compile.
pub trait SourceMethod: fmt::Display {
    /// Stable identity of the method. Generated methods return the sentinel.
    fn scope_id(&self) -> &ScopeId;

    /// The module declaring the method, `None` for compiler-synthesized
    /// methods.
    fn source_module(&self) -> Option<&SourceModule>;
}

/// Symbol space of the compilation in progress.
///
/// Implemented by the code generator. Returned references are bound to the
/// current output, so a reused body refers to the same classes and methods a
/// fresh compile would.
pub trait TargetSymbols {
    /// Returns the class emitted for the type with the given scope id.
    fn class_by_scope(&self, type_scope: &TypeScopeId) -> Option<ClassRef>;

    /// Returns the method emitted for the given declaring type and member
    /// scope id.
    fn method_by_scope(&self, type_scope: &TypeScopeId, member_scope: &str) -> Option<MethodRef>;

    /// Returns the delegate adapter class for the given closure key, creating
    /// it in the current output if the current compile has not yet done so.
    fn delegate_instance(&self, key: &DelegateClosureKey) -> Option<ClassRef>;
}
