//! Protocol conformance queries.
//!
//! Conformance is structural and duck-typed: a protocol or concrete type
//! satisfies a protocol by having matching callable signatures, never by
//! declaring an `extends` edge. Both queries are computed on demand and
//! never cached on the type.

use crate::error::FatalError;
use crate::overload::{OverloadResolution, Resolver};
use crate::registry::ProtocolId;
use crate::signature::Signature;
use crate::subst::Substitution;
use crate::ty::Type;

/// Result of a conformance query.
///
/// "Does not conform" is a value, not an error; `reason` explains the
/// first failing requirement, embedding the nested resolver failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conformance {
    pub result: bool,
    pub reason: Option<String>,
}

impl Conformance {
    /// A conforming result.
    pub fn holds() -> Self {
        Conformance {
            result: true,
            reason: None,
        }
    }

    /// A non-conforming result with an explanation.
    pub fn fails(reason: impl Into<String>) -> Self {
        Conformance {
            result: false,
            reason: Some(reason.into()),
        }
    }
}

impl<'a> Resolver<'a> {
    /// Whether protocol `a` structurally provides everything `b`
    /// declares.
    ///
    /// An absent `b` trivially conforms. Otherwise every signature
    /// declared directly on `b` must resolve against `a`'s same-named
    /// signatures rewritten in terms of `b`'s Self variable, with an
    /// exactly matching return type.
    pub fn inherits(
        &self,
        a: ProtocolId,
        b: Option<ProtocolId>,
    ) -> Result<Conformance, FatalError> {
        let Some(b) = b else {
            return Ok(Conformance::holds());
        };

        let decl_a = self.protocols.get(a);
        let decl_b = self.protocols.get(b);

        for (name, requirements) in decl_b.signature_map() {
            let Some(candidates) =
                self.protocols
                    .signatures_by_name_with_var(a, name, decl_b.self_var())
            else {
                return Ok(Conformance::fails(format!(
                    "protocol {} has no function named {}",
                    self.interner.lookup(decl_a.name),
                    self.interner.lookup(name)
                )));
            };
            let candidate_refs: Vec<&Signature> = candidates.iter().collect();

            for requirement in requirements {
                match self.resolve_overload(
                    &candidate_refs,
                    &[],
                    &requirement.params,
                    Some(&requirement.ret),
                )? {
                    OverloadResolution::Resolved { .. } => {}
                    OverloadResolution::NoMatch { failures } => {
                        return Ok(Conformance::fails(format!(
                            "protocol {} has no signature matching {}: {}",
                            self.interner.lookup(decl_a.name),
                            requirement.display(self.interner),
                            failures.join("; ")
                        )));
                    }
                    OverloadResolution::Ambiguous { candidates } => {
                        return Ok(Conformance::fails(format!(
                            "protocol {} matches {} ambiguously: {}",
                            self.interner.lookup(decl_a.name),
                            requirement.display(self.interner),
                            candidates.join(", ")
                        )));
                    }
                }
            }
        }

        Ok(Conformance::holds())
    }

    /// Whether `ty` implements protocol `protocol`.
    ///
    /// Every requirement, with the protocol's Self variable fixed to
    /// `ty`, must resolve against the program's overload set for that
    /// requirement's name with an exactly matching return type. This is
    /// the query generic call sites use to check that a type argument
    /// satisfies a declared constraint.
    pub fn conforms(&self, ty: &Type, protocol: ProtocolId) -> Result<Conformance, FatalError> {
        let key = (protocol, ty.clone());
        if !self.in_flight.borrow_mut().insert(key.clone()) {
            let decl = self.protocols.get(protocol);
            return Err(FatalError::CyclicConstraint {
                protocol: decl.name,
                span: decl.origin,
            });
        }
        let result = self.conforms_inner(ty, protocol);
        self.in_flight.borrow_mut().remove(&key);
        result
    }

    fn conforms_inner(&self, ty: &Type, protocol: ProtocolId) -> Result<Conformance, FatalError> {
        let decl = self.protocols.get(protocol);
        let substitution = Substitution::single(decl.self_var(), ty.clone());

        for requirement in decl.signatures() {
            let rewritten = substitution.apply_signature(requirement);
            let candidates: Vec<&Signature> = rewritten
                .possible_overloads
                .iter()
                .map(|&id| self.functions.signature(id))
                .collect();

            if candidates.is_empty() {
                return Ok(Conformance::fails(format!(
                    "{} does not conform to {}: no function named {} exists",
                    ty.display(self.interner),
                    self.interner.lookup(decl.name),
                    self.interner.lookup(requirement.name)
                )));
            }

            match self.resolve_overload(&candidates, &[], &rewritten.params, Some(&rewritten.ret))?
            {
                OverloadResolution::Resolved { .. } => {}
                OverloadResolution::NoMatch { failures } => {
                    return Ok(Conformance::fails(format!(
                        "{} does not conform to {}: no overload matches {}: {}",
                        ty.display(self.interner),
                        self.interner.lookup(decl.name),
                        rewritten.display(self.interner),
                        failures.join("; ")
                    )));
                }
                OverloadResolution::Ambiguous { candidates } => {
                    return Ok(Conformance::fails(format!(
                        "{} conforms to {} ambiguously through {}: {}",
                        ty.display(self.interner),
                        self.interner.lookup(decl.name),
                        rewritten.display(self.interner),
                        candidates.join(", ")
                    )));
                }
            }
        }

        Ok(Conformance::holds())
    }
}
