//! Position-derived identifiers that survive renaming between compiler runs.
//!
//! Names of types and members are not stable across compilations: the
//! compiler renames types, moves them between packages and synthesizes new
//! members. A scope id is derived from where an element is declared instead,
//! so two independent runs over the same source assign the same scope id to
//! the same logical element.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Member scope id marking an element without a stable identity.
///
/// Compiler-generated members carry this sentinel and are never eligible for
/// reuse from the method body cache.
pub const NO_SCOPE: &str = "(none)";

/// Marker separating the delegate half from the target half of a delegate
/// closure scope id.
const DELEGATE_MARKER: &str = ":delegate:";

/// Stable identifier of a type declaration.
///
/// For compiled types this is `"<scope>:<scopeId>"` (for example `"Foo:3"`);
/// when the declaration carries no scope information, the type's full name is
/// used. Imported classes that were copied rather than compiled use their
/// internal name (`com/x/Foo`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeScopeId(String);

impl TypeScopeId {
    /// Wraps a raw type scope id string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Builds the type scope id from the parts recorded for a declaration.
    ///
    /// Falls back to the full type name when either part is missing.
    pub fn from_parts(scope: Option<&str>, scope_id: Option<&str>, full_name: &str) -> Self {
        match (scope, scope_id) {
            (Some(scope), Some(scope_id)) => Self(format!("{scope}:{scope_id}")),
            _ => Self(full_name.to_string()),
        }
    }

    /// Derives the type scope id of an imported class from its descriptor.
    ///
    /// Returns `None` unless the descriptor has the `L<internal name>;` shape.
    pub fn from_descriptor(descriptor: &str) -> Option<Self> {
        let internal = descriptor.strip_prefix('L')?.strip_suffix(';')?;
        if internal.is_empty() {
            return None;
        }
        Some(Self(internal.to_string()))
    }

    /// Returns the class descriptor an imported class with this scope id has.
    pub fn to_descriptor(&self) -> String {
        format!("L{};", self.0)
    }

    /// Returns the raw string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TypeScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeScopeId({})", self.0)
    }
}

/// Stable identity of a member: its declaring type's scope id plus the
/// member's own scope id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId {
    /// Scope id of the declaring type.
    pub type_scope: TypeScopeId,

    /// Scope id of the member within its declaring type.
    pub member: String,
}

impl ScopeId {
    /// Creates a scope id from its two halves.
    pub fn new(type_scope: TypeScopeId, member: impl Into<String>) -> Self {
        Self {
            type_scope,
            member: member.into(),
        }
    }

    /// Creates the "no stable identity" scope id for a member of `type_scope`.
    pub fn sentinel(type_scope: TypeScopeId) -> Self {
        Self::new(type_scope, NO_SCOPE)
    }

    /// Returns `true` if this is the "no stable identity" sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.member == NO_SCOPE || self.member.is_empty()
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.type_scope, self.member)
    }
}

/// Composite scope id of a compiler-synthesized delegate adapter type.
///
/// Adapter types are created while compiling method bodies, so they have no
/// declaration of their own. Their map entry encodes the delegate type and the
/// method the adapter forwards to as
/// `"<delegateScopeId>:delegate:<targetTypeScopeId>|<targetMethodScopeId>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DelegateClosureKey {
    /// Scope id of the delegate type being instantiated.
    pub delegate_type: TypeScopeId,

    /// Scope id of the type declaring the forwarded-to method.
    pub target_type: TypeScopeId,

    /// Member scope id of the forwarded-to method.
    pub target_method: String,
}

impl DelegateClosureKey {
    /// Returns `true` if a type entry's scope id has the delegate closure shape.
    pub fn is_delegate_scope_id(scope_id: &str) -> bool {
        scope_id.contains(DELEGATE_MARKER)
    }

    /// Decodes a delegate closure scope id recorded on a type entry.
    ///
    /// `scope` and `full_name` are the entry's other identity parts; they are
    /// combined with the delegate half the same way [`TypeScopeId::from_parts`]
    /// combines them for ordinary types.
    pub fn parse(scope: Option<&str>, scope_id: &str, full_name: &str) -> Option<Self> {
        let (delegate_part, target_part) = scope_id.split_once(DELEGATE_MARKER)?;
        let (target_type, target_method) = target_part.split_once('|')?;
        if target_type.is_empty() || target_method.is_empty() {
            return None;
        }
        Some(Self {
            delegate_type: TypeScopeId::from_parts(scope, Some(delegate_part), full_name),
            target_type: TypeScopeId::new(target_type),
            target_method: target_method.to_string(),
        })
    }

    /// Encodes the scope id stored on the adapter type's map entry.
    pub fn encode_scope_id(
        delegate_scope_id: &str,
        target_type: &TypeScopeId,
        target_method: &str,
    ) -> String {
        format!("{delegate_scope_id}{DELEGATE_MARKER}{target_type}|{target_method}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_scope_from_parts() {
        let id = TypeScopeId::from_parts(Some("Foo"), Some("3"), "App.Foo");
        assert_eq!(id.as_str(), "Foo:3");
    }

    #[test]
    fn type_scope_falls_back_to_name() {
        assert_eq!(TypeScopeId::from_parts(None, Some("3"), "App.Foo").as_str(), "App.Foo");
        assert_eq!(TypeScopeId::from_parts(Some("Foo"), None, "App.Foo").as_str(), "App.Foo");
    }

    #[test]
    fn descriptor_roundtrip() {
        let id = TypeScopeId::from_descriptor("Ljava/lang/String;").unwrap();
        assert_eq!(id.as_str(), "java/lang/String");
        assert_eq!(id.to_descriptor(), "Ljava/lang/String;");
    }

    #[test]
    fn descriptor_rejects_non_class() {
        assert!(TypeScopeId::from_descriptor("I").is_none());
        assert!(TypeScopeId::from_descriptor("[Ljava/lang/String;").is_none());
        assert!(TypeScopeId::from_descriptor("L;").is_none());
    }

    #[test]
    fn sentinel_detection() {
        let ty = TypeScopeId::new("Foo:3");
        assert!(ScopeId::sentinel(ty.clone()).is_sentinel());
        assert!(ScopeId::new(ty.clone(), "").is_sentinel());
        assert!(!ScopeId::new(ty, "bar()V").is_sentinel());
    }

    #[test]
    fn scope_id_display() {
        let id = ScopeId::new(TypeScopeId::new("Foo:3"), "bar()V");
        assert_eq!(id.to_string(), "Foo:3#bar()V");
    }

    #[test]
    fn delegate_key_roundtrip() {
        let raw = DelegateClosureKey::encode_scope_id("7", &TypeScopeId::new("Main:2"), "run()V");
        assert!(DelegateClosureKey::is_delegate_scope_id(&raw));

        let key = DelegateClosureKey::parse(Some("Action"), &raw, "System.Action").unwrap();
        assert_eq!(key.delegate_type.as_str(), "Action:7");
        assert_eq!(key.target_type.as_str(), "Main:2");
        assert_eq!(key.target_method, "run()V");
    }

    #[test]
    fn delegate_key_rejects_malformed() {
        assert!(DelegateClosureKey::parse(None, "7", "X").is_none());
        assert!(DelegateClosureKey::parse(None, "7:delegate:Main:2", "X").is_none());
        assert!(DelegateClosureKey::parse(None, "7:delegate:|run()V", "X").is_none());
    }

    #[test]
    fn plain_scope_is_not_delegate() {
        assert!(!DelegateClosureKey::is_delegate_scope_id("3"));
    }

    #[test]
    fn serde_roundtrip() {
        let id = ScopeId::new(TypeScopeId::new("Foo:3"), "bar()V");
        let json = serde_json::to_string(&id).unwrap();
        assert!(json.contains("\"Foo:3\""));
        let back: ScopeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
