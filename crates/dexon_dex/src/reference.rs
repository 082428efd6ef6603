//! Method and field references used as instruction operands.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::prototype::Prototype;
use crate::types::{ClassRef, TypeRef};

/// A reference to a method by owner, name and prototype.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    /// The type declaring the method. Usually a class; array types own
    /// methods such as `clone`.
    pub owner: TypeRef,

    /// The method name.
    pub name: String,

    /// The method prototype.
    pub prototype: Prototype,
}

impl MethodRef {
    /// Creates a method reference.
    pub fn new(owner: impl Into<TypeRef>, name: impl Into<String>, prototype: Prototype) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            prototype,
        }
    }

    /// Returns the owning class, if the owner is a class type.
    pub fn owner_class(&self) -> Option<&ClassRef> {
        self.owner.as_class()
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}{}", self.owner, self.name, self.prototype)
    }
}

/// A reference to a field by owner, name and type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    /// The class declaring the field.
    pub owner: ClassRef,

    /// The field name.
    pub name: String,

    /// The field type.
    pub field_type: TypeRef,
}

impl FieldRef {
    /// Creates a field reference.
    pub fn new(owner: ClassRef, name: impl Into<String>, field_type: impl Into<TypeRef>) -> Self {
        Self {
            owner,
            name: name.into(),
            field_type: field_type.into(),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}:{}", self.owner, self.name, self.field_type)
    }
}

/// Hash key identifying a member by (owner descriptor, name, signature).
///
/// Both the container index and the map index key emitted members this way.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberKey(String);

impl MemberKey {
    /// Builds the key for a member.
    pub fn new(owner: &str, name: &str, signature: &str) -> Self {
        let mut key = String::with_capacity(owner.len() + name.len() + signature.len() + 1);
        key.push_str(owner);
        key.push('#');
        key.push_str(name);
        key.push_str(signature);
        Self(key)
    }
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveType;

    #[test]
    fn method_display() {
        let m = MethodRef::new(
            ClassRef::new("Lcom/x/Foo;"),
            "bar",
            Prototype::new(PrimitiveType::Void, vec![]),
        );
        assert_eq!(m.to_string(), "Lcom/x/Foo;#bar()V");
        assert_eq!(m.owner_class().unwrap().descriptor(), "Lcom/x/Foo;");
    }

    #[test]
    fn array_owner_has_no_class() {
        let m = MethodRef::new(
            TypeRef::array(PrimitiveType::Int.into()),
            "clone",
            Prototype::new(TypeRef::class("Ljava/lang/Object;"), vec![]),
        );
        assert!(m.owner_class().is_none());
    }

    #[test]
    fn member_key_matches_method_display() {
        let m = MethodRef::new(
            ClassRef::new("Lcom/x/Foo;"),
            "bar",
            Prototype::new(PrimitiveType::Int, vec![PrimitiveType::Long.into()]),
        );
        let key = MemberKey::new(&m.owner.descriptor(), &m.name, m.prototype.signature());
        assert_eq!(key, MemberKey::new("Lcom/x/Foo;", "bar", "(J)I"));
        assert_eq!(key.to_string(), m.to_string());
    }

    #[test]
    fn field_display() {
        let f = FieldRef::new(ClassRef::new("Lcom/x/Foo;"), "count", PrimitiveType::Int);
        assert_eq!(f.to_string(), "Lcom/x/Foo;.count:I");
    }
}
