//! Overload resolution.
//!
//! Given a set of candidate signatures, explicit type arguments, and the
//! argument types at a call site, find the unique best-matching candidate
//! by unification, or report a structured failure carrying one reason per
//! candidate.

use std::cell::RefCell;

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use prism_ir::{Name, StringInterner};

use crate::error::FatalError;
use crate::registry::{FunctionRegistry, ProtocolId, ProtocolRegistry};
use crate::signature::Signature;
use crate::subst::Substitution;
use crate::ty::Type;
use crate::unify::{UnificationContext, UnifyFailure};

/// Outcome of overload resolution.
///
/// Ambiguity is reported distinctly from no-match: callers surface the
/// two differently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverloadResolution {
    /// Exactly one candidate survived.
    Resolved {
        /// Index of the winning candidate in the input slice.
        index: usize,
        /// Bindings discovered during unification.
        context: UnificationContext,
        /// The candidate's return type with all bindings applied.
        return_type: Type,
        /// Concrete argument types, with literal placeholders collapsed.
        argument_types: Vec<Type>,
    },

    /// No candidate matched; one human-readable reason per candidate.
    NoMatch { failures: Vec<String> },

    /// More than one candidate survived the tie-break.
    Ambiguous { candidates: Vec<String> },
}

impl OverloadResolution {
    /// Whether resolution bound a candidate.
    pub fn is_resolved(&self) -> bool {
        matches!(self, OverloadResolution::Resolved { .. })
    }
}

/// One successfully unified candidate, before tie-breaking.
#[derive(Debug)]
struct Match {
    index: usize,
    context: UnificationContext,
    return_type: Type,
    argument_types: Vec<Type>,
}

enum CandidateOutcome {
    Matched(Match),
    Rejected(String),
}

/// Pure query interface over a program's immutable declaration set.
///
/// Binds call sites to overloads and decides protocol conformance. The
/// resolver holds no state beyond a guard against re-entrant constraint
/// walks, so queries are deterministic and side-effect free.
pub struct Resolver<'a> {
    pub(crate) protocols: &'a ProtocolRegistry,
    pub(crate) functions: &'a FunctionRegistry,
    pub(crate) interner: &'a StringInterner,
    /// Protocol/type pairs currently being conformance-checked.
    pub(crate) in_flight: RefCell<FxHashSet<(ProtocolId, Type)>>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over the given registries.
    pub fn new(
        protocols: &'a ProtocolRegistry,
        functions: &'a FunctionRegistry,
        interner: &'a StringInterner,
    ) -> Self {
        Resolver {
            protocols,
            functions,
            interner,
            in_flight: RefCell::new(FxHashSet::default()),
        }
    }

    /// Resolve a call against `candidates`.
    ///
    /// `explicit_type_args` bind a candidate's generic parameters
    /// positionally before argument unification; an empty slice means
    /// all parameters are inferred. `expected_return` is used by
    /// conformance checking, which requires the substituted return type
    /// to match exactly; ordinary call sites pass `None`.
    pub fn resolve_overload(
        &self,
        candidates: &[&Signature],
        explicit_type_args: &[Type],
        argument_types: &[Type],
        expected_return: Option<&Type>,
    ) -> Result<OverloadResolution, FatalError> {
        let mut failures = Vec::new();
        let mut matches = Vec::new();

        for (index, candidate) in candidates.iter().copied().enumerate() {
            match self.infer_call(
                index,
                candidate,
                explicit_type_args,
                argument_types,
                expected_return,
            )? {
                CandidateOutcome::Matched(m) => matches.push(m),
                CandidateOutcome::Rejected(reason) => {
                    trace!(candidate = index, %reason, "overload candidate rejected");
                    failures.push(reason);
                }
            }
        }

        if matches.is_empty() {
            return Ok(OverloadResolution::NoMatch { failures });
        }

        // Specificity pruning: drop every match shadowed by a strictly
        // more specific one.
        let survivors = self.prune_shadowed(candidates, &matches);

        let chosen = if survivors.len() == 1 {
            Some(survivors[0])
        } else {
            self.prefer_literals(argument_types, &matches, &survivors)
        };

        match chosen {
            Some(slot) => {
                let m = matches.swap_remove(slot);
                debug!(
                    candidate = m.index,
                    "overload resolved to {}",
                    candidates[m.index].display(self.interner)
                );
                Ok(OverloadResolution::Resolved {
                    index: m.index,
                    context: m.context,
                    return_type: m.return_type,
                    argument_types: m.argument_types,
                })
            }
            None => {
                let names = survivors
                    .iter()
                    .map(|&slot| candidates[matches[slot].index].display(self.interner))
                    .collect();
                debug!("overload resolution ambiguous");
                Ok(OverloadResolution::Ambiguous { candidates: names })
            }
        }
    }

    /// Resolve a call to a named free function against the program's
    /// overload set for that name.
    pub fn resolve_function_call(
        &self,
        name: Name,
        explicit_type_args: &[Type],
        argument_types: &[Type],
    ) -> Result<OverloadResolution, FatalError> {
        let ids = self.functions.overloads(name);
        if ids.is_empty() {
            return Ok(OverloadResolution::NoMatch {
                failures: vec![format!(
                    "no function named {}",
                    self.interner.lookup(name)
                )],
            });
        }
        let candidates: Vec<&Signature> = ids
            .iter()
            .map(|&id| self.functions.signature(id))
            .collect();
        self.resolve_overload(&candidates, explicit_type_args, argument_types, None)
    }

    /// Attempt to unify one candidate against the call.
    fn infer_call(
        &self,
        index: usize,
        candidate: &Signature,
        explicit_type_args: &[Type],
        argument_types: &[Type],
        expected_return: Option<&Type>,
    ) -> Result<CandidateOutcome, FatalError> {
        let mut ctx = UnificationContext::new(&candidate.type_params);
        let shown = candidate.display(self.interner);

        if !explicit_type_args.is_empty() {
            if explicit_type_args.len() != candidate.type_params.len() {
                return Ok(CandidateOutcome::Rejected(format!(
                    "{shown} did not match because it takes {} type arguments, got {}",
                    candidate.type_params.len(),
                    explicit_type_args.len()
                )));
            }
            for (var, ty) in candidate.type_params.iter().zip(explicit_type_args) {
                match ctx.unify(&Type::Var(*var), ty) {
                    Ok(()) => {}
                    Err(UnifyFailure::Unresolved { name }) => {
                        return Err(FatalError::UnresolvedTypeRef {
                            name,
                            span: candidate.origin,
                        })
                    }
                    Err(failure) => {
                        return Ok(CandidateOutcome::Rejected(format!(
                            "{shown} did not match because type argument {} does not apply: {}",
                            ty.display(self.interner),
                            failure.display(self.interner)
                        )))
                    }
                }
            }
        }

        if candidate.params.len() != argument_types.len() {
            return Ok(CandidateOutcome::Rejected(format!(
                "{shown} did not match because it takes {} arguments, got {}",
                candidate.params.len(),
                argument_types.len()
            )));
        }

        for (i, (param, arg)) in candidate.params.iter().zip(argument_types).enumerate() {
            match ctx.unify(param, arg) {
                Ok(()) => {}
                Err(UnifyFailure::Unresolved { name }) => {
                    return Err(FatalError::UnresolvedTypeRef {
                        name,
                        span: candidate.origin,
                    })
                }
                Err(failure) => {
                    return Ok(CandidateOutcome::Rejected(format!(
                        "{shown} did not match because parameter {} ({}) does not match argument ({}): {}",
                        i + 1,
                        param.display(self.interner),
                        arg.display(self.interner),
                        failure.display(self.interner)
                    )))
                }
            }
        }

        // Finalization: every type parameter must be inferred, literal
        // bindings collapse to their preferred scalar, and protocol
        // constraints must hold.
        for var in &candidate.type_params {
            let Some(bound) = ctx.binding(var).cloned() else {
                return Ok(CandidateOutcome::Rejected(format!(
                    "{shown} did not match because type parameter {} could not be inferred",
                    self.interner.lookup(var.name)
                )));
            };
            let resolved = match bound.preferred_native() {
                Some(native) => Type::Native(native),
                None => bound.clone(),
            };
            if resolved != bound {
                ctx.bind(var.id, resolved.clone());
            }
            if let Some(protocol) = var.constraint {
                let conformance = self.conforms(&resolved, protocol)?;
                if !conformance.result {
                    let protocol_name = self.interner.lookup(self.protocols.get(protocol).name);
                    let detail = conformance.reason.unwrap_or_default();
                    return Ok(CandidateOutcome::Rejected(format!(
                        "{shown} did not match because {} = {} does not conform to {}: {}",
                        self.interner.lookup(var.name),
                        resolved.display(self.interner),
                        protocol_name,
                        detail
                    )));
                }
            }
        }

        let substitution = Substitution::from_pairs(candidate.type_params.iter().filter_map(|v| {
            ctx.binding(v).cloned().map(|ty| (*v, ty))
        }));

        let return_type = substitution.apply_type(&candidate.ret);
        let argument_types: Vec<Type> = candidate
            .params
            .iter()
            .map(|p| substitution.apply_type(p))
            .collect();

        if let Some(expected) = expected_return {
            if *expected != return_type {
                return Ok(CandidateOutcome::Rejected(format!(
                    "{shown} did not match because of return type mismatch: expected {}, found {}",
                    expected.display(self.interner),
                    return_type.display(self.interner)
                )));
            }
        }

        Ok(CandidateOutcome::Matched(Match {
            index,
            context: ctx,
            return_type,
            argument_types,
        }))
    }

    /// Whether `a`'s parameter list is at least as specific as `b`'s:
    /// `b`'s parameters, with `b`'s type parameters bindable, unify onto
    /// `a`'s. Purely structural; constraints are not consulted.
    fn at_least_as_specific(&self, a: &Signature, b: &Signature) -> bool {
        if a.params.len() != b.params.len() {
            return false;
        }
        let mut ctx = UnificationContext::new(&b.type_params);
        a.params
            .iter()
            .zip(&b.params)
            .all(|(ap, bp)| ctx.unify(bp, ap).is_ok())
    }

    /// Drop matches shadowed by a strictly more specific match. Returns
    /// surviving slots into `matches`.
    fn prune_shadowed(&self, candidates: &[&Signature], matches: &[Match]) -> Vec<usize> {
        (0..matches.len())
            .filter(|&i| {
                let this = candidates[matches[i].index];
                !(0..matches.len()).any(|j| {
                    if i == j {
                        return false;
                    }
                    let other = candidates[matches[j].index];
                    self.at_least_as_specific(other, this)
                        && !self.at_least_as_specific(this, other)
                })
            })
            .collect()
    }

    /// Among tied matches, prefer the one where the most literal
    /// arguments landed on their preferred scalar. A unique maximum
    /// wins; anything else stays ambiguous.
    fn prefer_literals(
        &self,
        argument_types: &[Type],
        matches: &[Match],
        survivors: &[usize],
    ) -> Option<usize> {
        let score = |slot: usize| -> usize {
            argument_types
                .iter()
                .zip(&matches[slot].argument_types)
                .filter(|(arg, resolved)| {
                    arg.preferred_native()
                        .is_some_and(|native| **resolved == Type::Native(native))
                })
                .count()
        };

        let best = survivors.iter().map(|&slot| score(slot)).max()?;
        let mut winners = survivors.iter().filter(|&&slot| score(slot) == best);
        let winner = *winners.next()?;
        if winners.next().is_some() {
            return None;
        }
        Some(winner)
    }
}
