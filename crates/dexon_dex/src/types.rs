//! Type references as they appear in instruction operands and signatures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A primitive value type, including `void` for return types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    /// `V`
    Void,
    /// `Z`
    Boolean,
    /// `B`
    Byte,
    /// `S`
    Short,
    /// `C`
    Char,
    /// `I`
    Int,
    /// `J`
    Long,
    /// `F`
    Float,
    /// `D`
    Double,
}

impl PrimitiveType {
    /// Returns the single-character descriptor of this primitive.
    pub fn descriptor_char(self) -> char {
        match self {
            Self::Void => 'V',
            Self::Boolean => 'Z',
            Self::Byte => 'B',
            Self::Short => 'S',
            Self::Char => 'C',
            Self::Int => 'I',
            Self::Long => 'J',
            Self::Float => 'F',
            Self::Double => 'D',
        }
    }
}

/// A reference to a class by descriptor, e.g. `Lcom/x/Foo;`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassRef {
    descriptor: String,
}

impl ClassRef {
    /// Creates a class reference from a full descriptor (`Lcom/x/Foo;`).
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
        }
    }

    /// Returns the class descriptor.
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor)
    }
}

/// A type reference embedded in an operand, a signature or a catch clause.
///
/// Composite variants wrap another reference; rewriting one means rewriting
/// the inner reference and rebuilding the same wrapper around it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    /// A primitive type.
    Primitive(PrimitiveType),

    /// A class or interface.
    Class(ClassRef),

    /// An array of the element type.
    Array(Box<TypeRef>),

    /// A by-reference parameter of the element type.
    ByRef(Box<TypeRef>),

    /// A generic type instantiated with type arguments. Erased to the
    /// element's descriptor.
    GenericInstance {
        /// The generic type definition.
        element: Box<TypeRef>,
        /// The type arguments, in declaration order.
        arguments: Vec<TypeRef>,
    },

    /// A type annotated with a custom modifier class. Erased to the element's
    /// descriptor.
    Modified {
        /// The modified type.
        element: Box<TypeRef>,
        /// The modifier class.
        modifier: ClassRef,
        /// `true` for a required modifier, `false` for an optional one.
        required: bool,
    },
}

impl TypeRef {
    /// Shorthand for a class type from a descriptor.
    pub fn class(descriptor: impl Into<String>) -> Self {
        Self::Class(ClassRef::new(descriptor))
    }

    /// Shorthand for an array of `element`.
    pub fn array(element: TypeRef) -> Self {
        Self::Array(Box::new(element))
    }

    /// Shorthand for a by-reference `element`.
    pub fn by_ref(element: TypeRef) -> Self {
        Self::ByRef(Box::new(element))
    }

    /// Returns the class reference if this is a plain class type.
    pub fn as_class(&self) -> Option<&ClassRef> {
        match self {
            Self::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Returns the descriptor string of this type.
    pub fn descriptor(&self) -> String {
        let mut out = String::new();
        self.write_descriptor(&mut out);
        out
    }

    /// Appends the descriptor of this type to `out`.
    pub fn write_descriptor(&self, out: &mut String) {
        match self {
            Self::Primitive(p) => out.push(p.descriptor_char()),
            Self::Class(c) => out.push_str(c.descriptor()),
            Self::Array(element) => {
                out.push('[');
                element.write_descriptor(out);
            }
            Self::ByRef(element) => {
                out.push('&');
                element.write_descriptor(out);
            }
            Self::GenericInstance { element, .. } | Self::Modified { element, .. } => {
                element.write_descriptor(out)
            }
        }
    }
}

impl From<PrimitiveType> for TypeRef {
    fn from(p: PrimitiveType) -> Self {
        Self::Primitive(p)
    }
}

impl From<ClassRef> for TypeRef {
    fn from(c: ClassRef) -> Self {
        Self::Class(c)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_descriptors() {
        let all = [
            (PrimitiveType::Void, 'V'),
            (PrimitiveType::Boolean, 'Z'),
            (PrimitiveType::Int, 'I'),
            (PrimitiveType::Long, 'J'),
            (PrimitiveType::Double, 'D'),
        ];
        for (p, c) in all {
            assert_eq!(p.descriptor_char(), c);
        }
    }

    #[test]
    fn composite_descriptors() {
        let foo = TypeRef::class("Lcom/x/Foo;");
        assert_eq!(TypeRef::array(foo.clone()).descriptor(), "[Lcom/x/Foo;");
        assert_eq!(TypeRef::by_ref(PrimitiveType::Int.into()).descriptor(), "&I");
        assert_eq!(
            TypeRef::array(TypeRef::array(PrimitiveType::Byte.into())).descriptor(),
            "[[B"
        );
    }

    #[test]
    fn generic_and_modified_erase_to_element() {
        let list = TypeRef::GenericInstance {
            element: Box::new(TypeRef::class("Ljava/util/List;")),
            arguments: vec![TypeRef::class("Lcom/x/Foo;")],
        };
        assert_eq!(list.descriptor(), "Ljava/util/List;");

        let volatile = TypeRef::Modified {
            element: Box::new(PrimitiveType::Int.into()),
            modifier: ClassRef::new("Lsystem/IsVolatile;"),
            required: true,
        };
        assert_eq!(volatile.descriptor(), "I");
    }

    #[test]
    fn structural_equality() {
        let a = TypeRef::array(TypeRef::class("Lcom/x/Foo;"));
        let b = TypeRef::array(TypeRef::class("Lcom/x/Foo;"));
        let c = TypeRef::array(TypeRef::class("Lcom/y/Foo;"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn as_class() {
        assert!(TypeRef::class("LA;").as_class().is_some());
        assert!(TypeRef::array(TypeRef::class("LA;")).as_class().is_none());
        assert!(TypeRef::from(PrimitiveType::Int).as_class().is_none());
    }
}
