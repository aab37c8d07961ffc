//! Declaration registries for functions and protocols.
//!
//! Both registries follow a build-then-query discipline: they are
//! populated while the program is constructed (after parsing and name
//! resolution) and are read-only for the rest of compilation. Name
//! indices use `BTreeMap` for deterministic iteration.

use std::collections::BTreeMap;

use prism_ir::{Name, Span};

use crate::error::FatalError;
use crate::signature::{Signature, SignatureKind};
use crate::subst::Substitution;
use crate::ty::{Type, TypeVar};

/// Index of a function in the [`FunctionRegistry`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct FuncId(usize);

impl FuncId {
    /// Get the raw index value.
    #[inline]
    pub const fn raw(self) -> usize {
        self.0
    }
}

/// Index of a protocol in the [`ProtocolRegistry`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct ProtocolId(usize);

impl ProtocolId {
    /// Get the raw index value.
    #[inline]
    pub const fn raw(self) -> usize {
        self.0
    }
}

/// All free and native functions of a program, indexed by name into
/// overload sets.
#[derive(Clone, Debug, Default)]
pub struct FunctionRegistry {
    /// All registered signatures.
    functions: Vec<Signature>,
    /// Name → overload set, in registration order.
    by_name: BTreeMap<Name, Vec<FuncId>>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, appending it to its name's overload set.
    ///
    /// Protocol requirements live inside protocols, not here; inserting
    /// one is a fatal error.
    pub fn add(&mut self, signature: Signature) -> Result<FuncId, FatalError> {
        if signature.kind == SignatureKind::Protocol {
            return Err(FatalError::ProtocolSignatureAsFunction {
                name: signature.name,
                span: signature.origin,
            });
        }
        let id = FuncId(self.functions.len());
        self.by_name.entry(signature.name).or_default().push(id);
        self.functions.push(signature);
        Ok(id)
    }

    /// The overload set for a name. Empty if no function has the name.
    pub fn overloads(&self, name: Name) -> &[FuncId] {
        self.by_name.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get a signature by id.
    ///
    /// Ids are only minted by [`add`](Self::add), so an id from this
    /// registry always resolves.
    pub fn signature(&self, id: FuncId) -> &Signature {
        &self.functions[id.0]
    }

    /// Iterate over all registered signatures.
    pub fn iter(&self) -> impl Iterator<Item = &Signature> {
        self.functions.iter()
    }

    /// Number of registered functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// A protocol declaration: one implicit Self type variable plus a set of
/// named, possibly-overloaded requirement signatures.
#[derive(Clone, Debug)]
pub struct ProtocolDecl {
    /// Protocol name.
    pub name: Name,
    /// Declaration site.
    pub origin: Span,
    /// Protocols this one declares it extends, by name. Validated by
    /// [`ProtocolRegistry::validate_extends`]; conformance itself is
    /// structural and never walks this list.
    pub extends: Vec<Name>,
    /// The implicit Self variable. Occurrences of the protocol's own
    /// name inside its requirements resolve to this variable.
    self_var: TypeVar,
    /// Name → overload list of requirements.
    signatures: BTreeMap<Name, Vec<Signature>>,
}

impl ProtocolDecl {
    /// Create a protocol with no requirements yet.
    pub fn new(name: Name, origin: Span, extends: Vec<Name>, self_var: TypeVar) -> Self {
        ProtocolDecl {
            name,
            origin,
            extends,
            self_var,
            signatures: BTreeMap::new(),
        }
    }

    /// The implicit Self variable.
    pub fn self_var(&self) -> TypeVar {
        self.self_var
    }

    /// Requirements registered under `name`, in registration order.
    pub fn signatures_by_name(&self, name: Name) -> Option<&[Signature]> {
        self.signatures.get(&name).map(Vec::as_slice)
    }

    /// Iterate over requirement overload sets in name order.
    pub fn signature_map(&self) -> impl Iterator<Item = (Name, &[Signature])> {
        self.signatures.iter().map(|(n, v)| (*n, v.as_slice()))
    }

    /// Iterate over all requirements, flattened, in name order.
    pub fn signatures(&self) -> impl Iterator<Item = &Signature> {
        self.signatures.values().flatten()
    }

    /// Number of requirements across all names.
    pub fn signature_count(&self) -> usize {
        self.signatures.values().map(Vec::len).sum()
    }
}

/// All protocols of a program.
#[derive(Clone, Debug, Default)]
pub struct ProtocolRegistry {
    /// All registered protocols.
    protocols: Vec<ProtocolDecl>,
    /// Name → protocol, for deterministic iteration.
    by_name: BTreeMap<Name, ProtocolId>,
}

impl ProtocolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a protocol declaration.
    pub fn register(&mut self, decl: ProtocolDecl) -> Result<ProtocolId, FatalError> {
        if self.by_name.contains_key(&decl.name) {
            return Err(FatalError::DuplicateProtocol {
                name: decl.name,
                span: decl.origin,
            });
        }
        let id = ProtocolId(self.protocols.len());
        self.by_name.insert(decl.name, id);
        self.protocols.push(decl);
        Ok(id)
    }

    /// Register a requirement signature under its name.
    ///
    /// Only protocol-kind signatures may be inserted; the signature's
    /// owning-protocol back-reference is set here.
    pub fn add_signature(&mut self, id: ProtocolId, mut signature: Signature) -> Result<(), FatalError> {
        if signature.kind != SignatureKind::Protocol {
            return Err(FatalError::NotAProtocolSignature {
                name: signature.name,
                span: signature.origin,
            });
        }
        signature.protocol = Some(id);
        self.protocols[id.0]
            .signatures
            .entry(signature.name)
            .or_default()
            .push(signature);
        Ok(())
    }

    /// Get a protocol by id.
    ///
    /// Ids are only minted by [`register`](Self::register), so an id
    /// from this registry always resolves.
    pub fn get(&self, id: ProtocolId) -> &ProtocolDecl {
        &self.protocols[id.0]
    }

    /// Look up a protocol by name.
    pub fn lookup(&self, name: Name) -> Option<ProtocolId> {
        self.by_name.get(&name).copied()
    }

    /// Iterate over all protocols in name order.
    pub fn iter(&self) -> impl Iterator<Item = (ProtocolId, &ProtocolDecl)> {
        self.by_name.values().map(|&id| (id, &self.protocols[id.0]))
    }

    /// Number of registered protocols.
    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }

    /// Requirements under `name` rewritten in terms of `var`: builds the
    /// one-variable substitution Self → `var` and applies it to every
    /// same-named requirement.
    ///
    /// This is how a generic caller obtains protocol-member signatures
    /// in terms of its own type parameter instead of the protocol's
    /// internal Self variable.
    pub fn signatures_by_name_with_var(
        &self,
        id: ProtocolId,
        name: Name,
        var: TypeVar,
    ) -> Option<Vec<Signature>> {
        let decl = self.get(id);
        let subst = Substitution::single(decl.self_var(), Type::Var(var));
        decl.signatures_by_name(name)
            .map(|sigs| sigs.iter().map(|s| subst.apply_signature(s)).collect())
    }

    /// Record, for every requirement, the program's overload set for
    /// that requirement's name. Runs once during program construction,
    /// after every function has been registered.
    pub fn link_overloads(&mut self, functions: &FunctionRegistry) {
        for protocol in &mut self.protocols {
            for sigs in protocol.signatures.values_mut() {
                for sig in sigs {
                    sig.possible_overloads = functions.overloads(sig.name).to_vec();
                }
            }
        }
    }

    /// Check that every declared `extends` name resolves and that the
    /// extends graph is acyclic.
    ///
    /// Must run before any conformance query: a cyclic chain would
    /// otherwise send recursive walks into non-termination.
    pub fn validate_extends(&self) -> Result<(), FatalError> {
        // Three-color DFS: 0 unvisited, 1 in progress, 2 done.
        let mut state = vec![0u8; self.protocols.len()];
        for id in 0..self.protocols.len() {
            self.visit_extends(ProtocolId(id), &mut state)?;
        }
        Ok(())
    }

    fn visit_extends(&self, id: ProtocolId, state: &mut [u8]) -> Result<(), FatalError> {
        let decl = &self.protocols[id.0];
        match state[id.0] {
            1 => {
                return Err(FatalError::CyclicExtends {
                    name: decl.name,
                    span: decl.origin,
                })
            }
            2 => return Ok(()),
            _ => {}
        }
        state[id.0] = 1;
        for &parent in &decl.extends {
            let parent_id = self.lookup(parent).ok_or(FatalError::UnknownProtocol {
                name: parent,
                span: decl.origin,
            })?;
            self.visit_extends(parent_id, state)?;
        }
        state[id.0] = 2;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
