//! Type-variable substitution.
//!
//! A [`Substitution`] maps type variables to replacement types and
//! rewrites types and signatures by structural recursion. Application
//! never fails: a variable absent from the map is returned unchanged, so
//! the same value can be rewritten repeatedly under different partial
//! substitutions in nested generic scopes.

use std::sync::Arc;

use crate::error::FatalError;
use crate::signature::Signature;
use crate::ty::{StructType, Type, TypeVar};

/// An explicit, finite type-variable to type mapping.
///
/// The variable and replacement lists are always the same length; the
/// constructor rejects anything else. Variables are matched by identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Substitution {
    vars: Vec<TypeVar>,
    replacements: Vec<Type>,
}

impl Substitution {
    /// Build a substitution from parallel variable/replacement lists.
    pub fn new(vars: Vec<TypeVar>, replacements: Vec<Type>) -> Result<Self, FatalError> {
        if vars.len() != replacements.len() {
            return Err(FatalError::SubstitutionArity {
                vars: vars.len(),
                replacements: replacements.len(),
            });
        }
        Ok(Substitution { vars, replacements })
    }

    /// The one-variable substitution.
    pub fn single(var: TypeVar, replacement: Type) -> Self {
        Substitution {
            vars: vec![var],
            replacements: vec![replacement],
        }
    }

    /// Build from variable/replacement pairs, which are arity-safe by
    /// construction.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (TypeVar, Type)>) -> Self {
        let (vars, replacements) = pairs.into_iter().unzip();
        Substitution { vars, replacements }
    }

    /// The empty substitution; applying it is the identity.
    pub fn identity() -> Self {
        Substitution {
            vars: Vec::new(),
            replacements: Vec::new(),
        }
    }

    /// Look up the replacement for a variable, by identity.
    pub fn lookup(&self, var: &TypeVar) -> Option<&Type> {
        self.vars
            .iter()
            .position(|v| v == var)
            .map(|i| &self.replacements[i])
    }

    /// Rewrite a type.
    ///
    /// Non-variable leaves are returned unchanged; mapped variables are
    /// replaced; composites are rebuilt only when a child changed, so
    /// unchanged subtrees stay shared. Literal placeholders are not
    /// substitution targets and pass through untouched.
    pub fn apply_type(&self, ty: &Type) -> Type {
        match ty {
            Type::Var(v) => self.lookup(v).cloned().unwrap_or_else(|| ty.clone()),

            Type::Native(_)
            | Type::Enum(_)
            | Type::IntLiteral
            | Type::UintLiteral
            | Type::FloatLiteral => ty.clone(),

            Type::Struct(s) => {
                let mut changed = false;
                let fields: Vec<_> = s
                    .fields
                    .iter()
                    .map(|f| {
                        let new_ty = self.apply_type(&f.ty);
                        if new_ty != f.ty {
                            changed = true;
                        }
                        crate::ty::StructField {
                            name: f.name,
                            ty: new_ty,
                            origin: f.origin,
                        }
                    })
                    .collect();
                if changed {
                    Type::Struct(StructType::new(s.name, fields))
                } else {
                    ty.clone()
                }
            }

            Type::Ptr { space, inner } => {
                let new_inner = self.apply_type(inner);
                if new_inner == **inner {
                    ty.clone()
                } else {
                    Type::Ptr {
                        space: *space,
                        inner: Arc::new(new_inner),
                    }
                }
            }

            Type::Array { elem, size } => {
                let new_elem = self.apply_type(elem);
                if new_elem == **elem {
                    ty.clone()
                } else {
                    Type::Array {
                        elem: Arc::new(new_elem),
                        size: *size,
                    }
                }
            }

            Type::ArrayRef { space, elem } => {
                let new_elem = self.apply_type(elem);
                if new_elem == **elem {
                    ty.clone()
                } else {
                    Type::ArrayRef {
                        space: *space,
                        elem: Arc::new(new_elem),
                    }
                }
            }

            Type::Matrix { rows, cols, elem } => {
                let new_elem = self.apply_type(elem);
                if new_elem == **elem {
                    ty.clone()
                } else {
                    Type::Matrix {
                        rows: *rows,
                        cols: *cols,
                        elem: Arc::new(new_elem),
                    }
                }
            }

            Type::Vector { size, elem } => {
                let new_elem = self.apply_type(elem);
                if new_elem == **elem {
                    ty.clone()
                } else {
                    Type::Vector {
                        size: *size,
                        elem: Arc::new(new_elem),
                    }
                }
            }

            Type::Ref { name, args } => {
                let mut changed = false;
                let new_args: Vec<_> = args
                    .iter()
                    .map(|a| {
                        let new_a = self.apply_type(a);
                        if new_a != *a {
                            changed = true;
                        }
                        new_a
                    })
                    .collect();
                if changed {
                    Type::Ref {
                        name: *name,
                        args: new_args.into(),
                    }
                } else {
                    ty.clone()
                }
            }
        }
    }

    /// Rewrite a signature, producing a new value.
    ///
    /// Parameter and return types are rewritten; name, kind, generic
    /// parameters, and registry links are preserved.
    pub fn apply_signature(&self, sig: &Signature) -> Signature {
        let params = sig.params.iter().map(|p| self.apply_type(p)).collect();
        let ret = self.apply_type(&sig.ret);
        Signature {
            params,
            ret,
            ..sig.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::SignatureKind;
    use crate::ty::{AddressSpace, Native};
    use prism_ir::{Span, StringInterner};
    use std::sync::Arc;

    fn var(interner: &StringInterner, id: u32, name: &str) -> TypeVar {
        TypeVar::new(id, interner.intern(name), Span::DUMMY)
    }

    #[test]
    fn arity_mismatch_rejected() {
        let interner = StringInterner::new();
        let t = var(&interner, 0, "T");
        let err = Substitution::new(vec![t], vec![]);
        assert_eq!(
            err,
            Err(FatalError::SubstitutionArity {
                vars: 1,
                replacements: 0
            })
        );
    }

    #[test]
    fn identity_leaves_signature_unchanged() {
        let interner = StringInterner::new();
        let t = var(&interner, 0, "T");
        let sig = Signature::generic(
            interner.intern("add"),
            Span::DUMMY,
            SignatureKind::Free,
            vec![t],
            vec![Type::Var(t), Type::Var(t)],
            Type::Var(t),
        );
        let rewritten = Substitution::identity().apply_signature(&sig);
        assert_eq!(rewritten, sig);
    }

    #[test]
    fn mapped_variable_is_replaced() {
        let interner = StringInterner::new();
        let t = var(&interner, 0, "T");
        let subst = Substitution::single(t, Type::Native(Native::Int));
        let ty = Type::ptr(AddressSpace::Thread, Type::Var(t));
        assert_eq!(
            subst.apply_type(&ty),
            Type::ptr(AddressSpace::Thread, Type::Native(Native::Int))
        );
    }

    #[test]
    fn unbound_variable_passes_through() {
        let interner = StringInterner::new();
        let t = var(&interner, 0, "T");
        let u = var(&interner, 1, "U");
        let subst = Substitution::single(t, Type::Native(Native::Int));
        assert_eq!(subst.apply_type(&Type::Var(u)), Type::Var(u));
    }

    #[test]
    fn variables_match_by_identity_not_name() {
        let interner = StringInterner::new();
        // Two distinct binders spelled "T": only the mapped one rewrites.
        let outer = var(&interner, 0, "T");
        let inner = var(&interner, 1, "T");
        let subst = Substitution::single(outer, Type::Native(Native::Float));
        assert_eq!(
            subst.apply_type(&Type::Var(outer)),
            Type::Native(Native::Float)
        );
        assert_eq!(subst.apply_type(&Type::Var(inner)), Type::Var(inner));
    }

    #[test]
    fn unchanged_subtrees_stay_shared() {
        let interner = StringInterner::new();
        let t = var(&interner, 0, "T");
        let subst = Substitution::single(t, Type::Native(Native::Int));
        let elem = Arc::new(Type::Native(Native::Float));
        let ty = Type::Vector {
            size: 4,
            elem: Arc::clone(&elem),
        };
        match subst.apply_type(&ty) {
            Type::Vector { elem: out, .. } => assert!(Arc::ptr_eq(&out, &elem)),
            other => panic!("expected vector, got {other:?}"),
        }
    }

    #[test]
    fn struct_fields_are_rewritten() {
        let interner = StringInterner::new();
        let t = var(&interner, 0, "T");
        let s = StructType::new(
            interner.intern("Pair"),
            vec![
                crate::ty::StructField {
                    name: interner.intern("first"),
                    ty: Type::Var(t),
                    origin: Span::DUMMY,
                },
                crate::ty::StructField {
                    name: interner.intern("second"),
                    ty: Type::Native(Native::Bool),
                    origin: Span::DUMMY,
                },
            ],
        );
        let subst = Substitution::single(t, Type::Native(Native::Uint));
        match subst.apply_type(&Type::Struct(s)) {
            Type::Struct(out) => {
                assert_eq!(out.fields[0].ty, Type::Native(Native::Uint));
                assert_eq!(out.fields[1].ty, Type::Native(Native::Bool));
            }
            other => panic!("expected struct, got {other:?}"),
        }
    }
}
