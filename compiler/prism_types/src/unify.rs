//! Unification of candidate parameter types against argument types.
//!
//! Only an overload candidate's own type parameters are bindable; every
//! other variable is rigid and unifies with itself alone, by identity.
//! Numeric literal placeholders on the argument side unify with any
//! compatible scalar and collapse to a concrete type when the candidate
//! is finalized.

use rustc_hash::{FxHashMap, FxHashSet};

use prism_ir::{Name, StringInterner};

use crate::ty::{AddressSpace, Type, TypeVar};

/// Why a parameter/argument pair failed to unify.
///
/// Rendered into per-candidate failure reasons by the overload resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnifyFailure {
    /// Structural mismatch between two types.
    Mismatch { expected: Type, found: Type },

    /// Pointer-shaped types in different address spaces.
    AddressSpace {
        expected: AddressSpace,
        found: AddressSpace,
    },

    /// Fixed-size arrays of different lengths.
    ArraySize { expected: u32, found: u32 },

    /// A rigid type variable can only match itself.
    Rigid { var: Name },

    /// Binding would create an infinite type.
    Occurs { var: Name },

    /// An unresolved type reference reached unification. Escalated to a
    /// fatal error by the resolver, never a candidate failure.
    Unresolved { name: Name },
}

impl UnifyFailure {
    /// Render for a candidate failure reason.
    pub fn display(&self, interner: &StringInterner) -> String {
        match self {
            UnifyFailure::Mismatch { expected, found } => format!(
                "{} is not {}",
                found.display(interner),
                expected.display(interner)
            ),
            UnifyFailure::AddressSpace { expected, found } => format!(
                "address space mismatch: expected {}, found {}",
                expected.as_str(),
                found.as_str()
            ),
            UnifyFailure::ArraySize { expected, found } => {
                format!("array length mismatch: expected {expected}, found {found}")
            }
            UnifyFailure::Rigid { var } => format!(
                "type parameter {} only matches itself",
                interner.lookup(*var)
            ),
            UnifyFailure::Occurs { var } => format!(
                "type parameter {} would recur into its own binding",
                interner.lookup(*var)
            ),
            UnifyFailure::Unresolved { name } => {
                format!("unresolved type reference {}", interner.lookup(*name))
            }
        }
    }
}

/// Working bindings discovered while matching one overload candidate.
///
/// Created fresh per candidate and discarded after the query; consumed
/// by the resolver to substitute the candidate's return type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnificationContext {
    /// Ids of the candidate's type parameters, the only bindable
    /// variables.
    bindable: FxHashSet<u32>,
    /// Variable id → bound type.
    bindings: FxHashMap<u32, Type>,
}

impl UnificationContext {
    /// A context in which the given type parameters are bindable.
    pub fn new(type_params: &[TypeVar]) -> Self {
        UnificationContext {
            bindable: type_params.iter().map(|v| v.id).collect(),
            bindings: FxHashMap::default(),
        }
    }

    /// The binding for a variable, if one was discovered.
    pub fn binding(&self, var: &TypeVar) -> Option<&Type> {
        self.bindings.get(&var.id)
    }

    /// Whether a variable id is bindable in this context.
    pub fn is_bindable(&self, id: u32) -> bool {
        self.bindable.contains(&id)
    }

    /// Record or replace a binding. Used by the resolver to collapse
    /// literal bindings during finalization.
    pub(crate) fn bind(&mut self, id: u32, ty: Type) {
        self.bindings.insert(id, ty);
    }

    /// Unify a candidate parameter type (`expected`) against an
    /// argument type (`actual`), accumulating bindings.
    pub fn unify(&mut self, expected: &Type, actual: &Type) -> Result<(), UnifyFailure> {
        // Unresolved references are malformed input, even when both
        // sides happen to be spelled the same.
        if let Type::Ref { name, .. } = expected {
            return Err(UnifyFailure::Unresolved { name: *name });
        }
        if let Type::Ref { name, .. } = actual {
            return Err(UnifyFailure::Unresolved { name: *name });
        }

        // Fast path: structurally identical types (including identical
        // variables and identical literal placeholders).
        if expected == actual {
            return Ok(());
        }

        match (expected, actual) {
            (Type::Var(v), _) if self.is_bindable(v.id) => {
                if let Some(bound) = self.bindings.get(&v.id).cloned() {
                    // A literal binding refines to a concrete scalar when
                    // a later argument pins it down.
                    if bound.is_literal() {
                        if let Type::Native(n) = actual {
                            if bound.literal_accepts(*n) {
                                self.bindings.insert(v.id, actual.clone());
                                return Ok(());
                            }
                        }
                    }
                    return self.unify(&bound, actual);
                }
                if actual.contains_var(v.id) {
                    return Err(UnifyFailure::Occurs { var: v.name });
                }
                self.bindings.insert(v.id, actual.clone());
                Ok(())
            }

            // Rigid variables: a distinct variable or a concrete type on
            // the other side can never match.
            (Type::Var(v), _) | (_, Type::Var(v)) => Err(UnifyFailure::Rigid { var: v.name }),

            // Literal placeholders in argument position.
            (Type::Native(n), lit) if lit.is_literal() => {
                if lit.literal_accepts(*n) {
                    Ok(())
                } else {
                    Err(UnifyFailure::Mismatch {
                        expected: expected.clone(),
                        found: actual.clone(),
                    })
                }
            }

            (
                Type::Ptr {
                    space: s1,
                    inner: i1,
                },
                Type::Ptr {
                    space: s2,
                    inner: i2,
                },
            ) => {
                if s1 != s2 {
                    return Err(UnifyFailure::AddressSpace {
                        expected: *s1,
                        found: *s2,
                    });
                }
                self.unify(i1, i2)
            }

            (
                Type::ArrayRef {
                    space: s1,
                    elem: e1,
                },
                Type::ArrayRef {
                    space: s2,
                    elem: e2,
                },
            ) => {
                if s1 != s2 {
                    return Err(UnifyFailure::AddressSpace {
                        expected: *s1,
                        found: *s2,
                    });
                }
                self.unify(e1, e2)
            }

            (
                Type::Array {
                    elem: e1,
                    size: n1,
                },
                Type::Array {
                    elem: e2,
                    size: n2,
                },
            ) => {
                if n1 != n2 {
                    return Err(UnifyFailure::ArraySize {
                        expected: *n1,
                        found: *n2,
                    });
                }
                self.unify(e1, e2)
            }

            (
                Type::Matrix {
                    rows: r1,
                    cols: c1,
                    elem: e1,
                },
                Type::Matrix {
                    rows: r2,
                    cols: c2,
                    elem: e2,
                },
            ) => {
                if r1 != r2 || c1 != c2 {
                    return Err(UnifyFailure::Mismatch {
                        expected: expected.clone(),
                        found: actual.clone(),
                    });
                }
                self.unify(e1, e2)
            }

            (
                Type::Vector {
                    size: n1,
                    elem: e1,
                },
                Type::Vector {
                    size: n2,
                    elem: e2,
                },
            ) => {
                if n1 != n2 {
                    return Err(UnifyFailure::Mismatch {
                        expected: expected.clone(),
                        found: actual.clone(),
                    });
                }
                self.unify(e1, e2)
            }

            // Natives, structs, enums, and literal placeholders in any
            // remaining combination: the fast path caught the equal
            // cases, so these are mismatches.
            _ => Err(UnifyFailure::Mismatch {
                expected: expected.clone(),
                found: actual.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::{EnumType, Native};
    use prism_ir::Span;

    fn int() -> Type {
        Type::Native(Native::Int)
    }

    fn var(id: u32) -> TypeVar {
        TypeVar::new(id, Name::EMPTY, Span::DUMMY)
    }

    #[test]
    fn bindable_var_binds_and_follows() {
        let t = var(0);
        let mut ctx = UnificationContext::new(&[t]);
        assert_eq!(ctx.unify(&Type::Var(t), &int()), Ok(()));
        assert_eq!(ctx.binding(&t), Some(&int()));
        // A second unification must go through the binding.
        assert_eq!(ctx.unify(&Type::Var(t), &int()), Ok(()));
        assert!(ctx.unify(&Type::Var(t), &Type::Native(Native::Bool)).is_err());
    }

    #[test]
    fn rigid_var_only_matches_itself() {
        let t = var(0);
        let u = var(1);
        let mut ctx = UnificationContext::new(&[]);
        assert_eq!(ctx.unify(&Type::Var(t), &Type::Var(t)), Ok(()));
        assert!(matches!(
            ctx.unify(&Type::Var(t), &Type::Var(u)),
            Err(UnifyFailure::Rigid { .. })
        ));
        assert!(matches!(
            ctx.unify(&Type::Var(t), &int()),
            Err(UnifyFailure::Rigid { .. })
        ));
        assert!(matches!(
            ctx.unify(&int(), &Type::Var(t)),
            Err(UnifyFailure::Rigid { .. })
        ));
    }

    #[test]
    fn occurs_check_rejects_recursive_binding() {
        let t = var(0);
        let mut ctx = UnificationContext::new(&[t]);
        let recursive = Type::ptr(AddressSpace::Thread, Type::Var(t));
        assert!(matches!(
            ctx.unify(&Type::Var(t), &recursive),
            Err(UnifyFailure::Occurs { .. })
        ));
    }

    #[test]
    fn literal_unifies_with_compatible_scalars() {
        let mut ctx = UnificationContext::new(&[]);
        assert_eq!(ctx.unify(&int(), &Type::IntLiteral), Ok(()));
        assert_eq!(
            ctx.unify(&Type::Native(Native::Double), &Type::IntLiteral),
            Ok(())
        );
        assert!(ctx
            .unify(&Type::Native(Native::Bool), &Type::IntLiteral)
            .is_err());
        assert!(ctx.unify(&int(), &Type::UintLiteral).is_err());
    }

    #[test]
    fn literal_binding_refines_to_concrete_scalar() {
        let t = var(0);
        // f<T>(T, T) called with (42, someFloat): the literal binding
        // must give way to the concrete scalar.
        let mut ctx = UnificationContext::new(&[t]);
        assert_eq!(ctx.unify(&Type::Var(t), &Type::IntLiteral), Ok(()));
        assert_eq!(
            ctx.unify(&Type::Var(t), &Type::Native(Native::Float)),
            Ok(())
        );
        assert_eq!(ctx.binding(&t), Some(&Type::Native(Native::Float)));

        // Reverse order: concrete first, literal second.
        let mut ctx = UnificationContext::new(&[t]);
        assert_eq!(ctx.unify(&Type::Var(t), &int()), Ok(()));
        assert_eq!(ctx.unify(&Type::Var(t), &Type::IntLiteral), Ok(()));
        assert_eq!(ctx.binding(&t), Some(&int()));

        // An incompatible scalar still fails.
        let mut ctx = UnificationContext::new(&[t]);
        assert_eq!(ctx.unify(&Type::Var(t), &Type::UintLiteral), Ok(()));
        assert!(ctx.unify(&Type::Var(t), &int()).is_err());
    }

    #[test]
    fn address_space_gates_pointers() {
        let mut ctx = UnificationContext::new(&[]);
        let thread = Type::ptr(AddressSpace::Thread, int());
        let device = Type::ptr(AddressSpace::Device, int());
        assert!(matches!(
            ctx.unify(&thread, &device),
            Err(UnifyFailure::AddressSpace { .. })
        ));
        assert_eq!(ctx.unify(&thread, &thread.clone()), Ok(()));

        let ref_a = Type::array_ref(AddressSpace::Device, int());
        let ref_b = Type::array_ref(AddressSpace::Constant, int());
        assert!(matches!(
            ctx.unify(&ref_a, &ref_b),
            Err(UnifyFailure::AddressSpace { .. })
        ));
    }

    #[test]
    fn composite_shapes_must_match() {
        let mut ctx = UnificationContext::new(&[]);
        assert!(matches!(
            ctx.unify(&Type::array(int(), 3), &Type::array(int(), 4)),
            Err(UnifyFailure::ArraySize { .. })
        ));
        assert!(ctx
            .unify(&Type::vector(3, int()), &Type::vector(4, int()))
            .is_err());
        assert!(ctx
            .unify(&Type::matrix(2, 2, int()), &Type::matrix(2, 3, int()))
            .is_err());
    }

    #[test]
    fn nominal_types_unify_by_name() {
        let mut ctx = UnificationContext::new(&[]);
        let a = Type::Enum(EnumType::new(Name::from_raw(1), vec![]));
        let b = Type::Enum(EnumType::new(Name::from_raw(2), vec![]));
        assert_eq!(ctx.unify(&a, &a.clone()), Ok(()));
        assert!(matches!(
            ctx.unify(&a, &b),
            Err(UnifyFailure::Mismatch { .. })
        ));
    }

    #[test]
    fn bindable_var_binds_through_composites() {
        let t = var(0);
        let mut ctx = UnificationContext::new(&[t]);
        let param = Type::array_ref(AddressSpace::Device, Type::Var(t));
        let arg = Type::array_ref(AddressSpace::Device, Type::Native(Native::Float));
        assert_eq!(ctx.unify(&param, &arg), Ok(()));
        assert_eq!(ctx.binding(&t), Some(&Type::Native(Native::Float)));
    }

    #[test]
    fn unresolved_reference_is_reported() {
        let mut ctx = UnificationContext::new(&[]);
        let unresolved = Type::reference(Name::from_raw(3), vec![]);
        assert!(matches!(
            ctx.unify(&unresolved, &int()),
            Err(UnifyFailure::Unresolved { .. })
        ));
        assert!(matches!(
            ctx.unify(&int(), &unresolved),
            Err(UnifyFailure::Unresolved { .. })
        ));
    }
}
