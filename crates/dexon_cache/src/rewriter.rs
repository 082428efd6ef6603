//! Retargeting of references in cached bodies.
//!
//! A cached body refers to classes, methods and fields by the names the
//! previous run emitted. Those names may have changed, so every reference is
//! translated back to a stable scope id through the map, then resolved in the
//! current compilation's symbol space. One unresolvable reference aborts the
//! whole body.

use std::collections::HashMap;

use dexon_common::{TypeScopeId, NO_SCOPE};
use dexon_dex::{ClassRef, FieldRef, MethodBody, MethodRef, Operand, Prototype, TypeRef};
use dexon_map::{MapIndex, TypeEntry};

use crate::error::ResolveError;
use crate::symbols::TargetSymbols;

/// Rewrites the references of one cached body.
///
/// Rewritten types are memoized for the lifetime of the rewriter, so a body
/// that mentions the same type many times resolves it once.
pub struct ReferenceRewriter<'a> {
    map: &'a MapIndex,
    symbols: &'a dyn TargetSymbols,
    classes: HashMap<ClassRef, ClassRef>,
    types: HashMap<TypeRef, TypeRef>,
}

impl<'a> ReferenceRewriter<'a> {
    /// Creates a rewriter translating from the snapshot described by `map`
    /// into `symbols`.
    pub fn new(map: &'a MapIndex, symbols: &'a dyn TargetSymbols) -> Self {
        Self {
            map,
            symbols,
            classes: HashMap::new(),
            types: HashMap::new(),
        }
    }

    /// Rewrites every operand and catch clause of `body` in place.
    ///
    /// On error the body is left partially rewritten and must be discarded.
    pub fn rewrite_body(&mut self, body: &mut MethodBody) -> Result<(), ResolveError> {
        for ins in &mut body.instructions {
            match &mut ins.operand {
                Operand::Type(ty) => *ty = self.rewrite_type(ty)?,
                Operand::Method(method) => *method = self.rewrite_method(method)?,
                Operand::Field(field) => *field = self.rewrite_field(field)?,
                Operand::None | Operand::Literal(_) | Operand::String(_) | Operand::Target(_) => {}
            }
        }
        for catch in body.catches_mut() {
            catch.exception_type = self.rewrite_type(&catch.exception_type)?;
        }
        Ok(())
    }

    /// Rewrites a type, recursing through composite wrappers.
    pub fn rewrite_type(&mut self, ty: &TypeRef) -> Result<TypeRef, ResolveError> {
        if let Some(done) = self.types.get(ty) {
            return Ok(done.clone());
        }

        let rewritten = match ty {
            TypeRef::Primitive(_) => return Ok(ty.clone()),
            // classes are memoized by rewrite_class
            TypeRef::Class(class) => return Ok(TypeRef::Class(self.rewrite_class(class)?)),
            TypeRef::Array(element) => TypeRef::Array(Box::new(self.rewrite_type(element)?)),
            TypeRef::ByRef(element) => TypeRef::ByRef(Box::new(self.rewrite_type(element)?)),
            TypeRef::GenericInstance { element, arguments } => TypeRef::GenericInstance {
                element: Box::new(self.rewrite_type(element)?),
                arguments: arguments
                    .iter()
                    .map(|arg| self.rewrite_type(arg))
                    .collect::<Result<_, _>>()?,
            },
            TypeRef::Modified {
                element,
                modifier,
                required,
            } => TypeRef::Modified {
                element: Box::new(self.rewrite_type(element)?),
                modifier: self.rewrite_class(modifier)?,
                required: *required,
            },
        };

        self.types.insert(ty.clone(), rewritten.clone());
        Ok(rewritten)
    }

    /// Rewrites a class reference.
    pub fn rewrite_class(&mut self, class: &ClassRef) -> Result<ClassRef, ResolveError> {
        if let Some(done) = self.classes.get(class) {
            return Ok(done.clone());
        }

        let map = self.map;
        let entry = map.type_by_descriptor(class.descriptor());
        let rewritten = match entry {
            Some(entry) if entry.is_delegate_closure() => self.delegate_class(entry, class)?,
            _ => {
                let scope = type_scope(entry, class)?;
                self.symbols
                    .class_by_scope(&scope)
                    .ok_or_else(|| ResolveError::UnresolvedType {
                        descriptor: class.descriptor().to_string(),
                        scope: scope.to_string(),
                    })?
            }
        };

        self.classes.insert(class.clone(), rewritten.clone());
        Ok(rewritten)
    }

    /// Rewrites a method reference.
    ///
    /// The emitted identity is mapped back to the declaring type's scope id,
    /// which for methods emitted into the generated container differs from
    /// the apparent owner. Methods the map does not know are assumed to be
    /// imported and use `name + signature` as their scope id.
    pub fn rewrite_method(&mut self, method: &MethodRef) -> Result<MethodRef, ResolveError> {
        let Some(owner) = method.owner_class() else {
            // array-owned methods such as `clone`
            let owner = self.rewrite_type(&method.owner)?;
            let prototype = self.rewrite_prototype(&method.prototype)?;
            return Ok(MethodRef::new(owner, method.name.clone(), prototype));
        };

        let map = self.map;
        let (declaring, scope) =
            match map.method_by_emitted(owner.descriptor(), &method.name, method.prototype.signature()) {
                Some(record) => (Some(record.declaring), record.method.scope_id.clone()),
                None => {
                    let entry = map.type_by_descriptor(owner.descriptor());
                    if let Some(entry) = entry.filter(|e| e.is_delegate_closure()) {
                        let adapter = self.delegate_class(entry, owner)?;
                        let prototype = self.rewrite_prototype(&method.prototype)?;
                        return Ok(MethodRef::new(adapter, method.name.clone(), prototype));
                    }
                    (entry, format!("{}{}", method.name, method.prototype.signature()))
                }
            };

        if scope == NO_SCOPE {
            return Err(ResolveError::MissingScope {
                method: method.to_string(),
            });
        }

        let type_scope = type_scope(declaring, owner)?;
        self.symbols
            .method_by_scope(&type_scope, &scope)
            .ok_or_else(|| ResolveError::UnresolvedMethod {
                method: method.to_string(),
                scope,
            })
    }

    /// Rewrites a field reference. The field name is kept.
    pub fn rewrite_field(&mut self, field: &FieldRef) -> Result<FieldRef, ResolveError> {
        if self.map.generated_class() == Some(field.owner.descriptor()) {
            return Err(ResolveError::GeneratedField {
                field: field.to_string(),
            });
        }
        let owner = self.rewrite_class(&field.owner)?;
        let field_type = self.rewrite_type(&field.field_type)?;
        Ok(FieldRef::new(owner, field.name.clone(), field_type))
    }

    fn rewrite_prototype(&mut self, prototype: &Prototype) -> Result<Prototype, ResolveError> {
        let return_type = self.rewrite_type(prototype.return_type())?;
        let parameters = prototype
            .parameters()
            .iter()
            .map(|p| self.rewrite_type(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Prototype::new(return_type, parameters))
    }

    fn delegate_class(&self, entry: &TypeEntry, class: &ClassRef) -> Result<ClassRef, ResolveError> {
        let key = entry
            .delegate_key()
            .ok_or_else(|| ResolveError::MalformedDelegateKey {
                descriptor: class.descriptor().to_string(),
            })?;
        self.symbols
            .delegate_instance(&key)
            .ok_or_else(|| ResolveError::UnresolvedDelegate {
                descriptor: class.descriptor().to_string(),
                scope: entry.scope_id.clone().unwrap_or_default(),
            })
    }
}

/// Scope id of a referenced type: the map entry's if there is one, otherwise
/// the internal name of an imported class.
fn type_scope(entry: Option<&TypeEntry>, class: &ClassRef) -> Result<TypeScopeId, ResolveError> {
    match entry {
        Some(entry) => Ok(entry.type_scope_id()),
        None => TypeScopeId::from_descriptor(class.descriptor()).ok_or_else(|| {
            ResolveError::UnresolvedType {
                descriptor: class.descriptor().to_string(),
                scope: String::new(),
            }
        }),
    }
}
