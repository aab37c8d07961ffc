//! Function and protocol-requirement signatures.

use std::fmt::Write as _;

use prism_ir::{Name, Span, StringInterner};

use crate::registry::{FuncId, ProtocolId};
use crate::ty::{Native, Type, TypeVar};

/// What kind of declaration a signature came from.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SignatureKind {
    /// A function defined in the program.
    Free,
    /// A function provided by the implementation (intrinsics).
    Native,
    /// A requirement declared inside a protocol.
    Protocol,
}

/// A function signature: name, parameter types, return type, and
/// optional generic parameters.
///
/// Signatures are immutable once registered; substitution produces new
/// signature values rather than mutating existing ones. The `origin`
/// span is carried purely for diagnostics.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Signature {
    /// Function name.
    pub name: Name,
    /// Declaration site.
    pub origin: Span,
    /// Declaration kind.
    pub kind: SignatureKind,
    /// Generic type parameters, in declaration order.
    pub type_params: Vec<TypeVar>,
    /// Parameter types, in declaration order.
    pub params: Vec<Type>,
    /// Return type.
    pub ret: Type,
    /// Owning protocol, for protocol requirements. A non-owning index:
    /// the signature's lifetime is owned by the protocol's overload map.
    pub protocol: Option<ProtocolId>,
    /// The program's overload set for this requirement's name, linked
    /// once during program construction.
    pub possible_overloads: Vec<FuncId>,
}

impl Signature {
    /// A plain (non-generic) signature.
    pub fn new(name: Name, origin: Span, kind: SignatureKind, params: Vec<Type>, ret: Type) -> Self {
        Signature {
            name,
            origin,
            kind,
            type_params: Vec::new(),
            params,
            ret,
            protocol: None,
            possible_overloads: Vec::new(),
        }
    }

    /// A generic signature.
    pub fn generic(
        name: Name,
        origin: Span,
        kind: SignatureKind,
        type_params: Vec<TypeVar>,
        params: Vec<Type>,
        ret: Type,
    ) -> Self {
        Signature {
            name,
            origin,
            kind,
            type_params,
            params,
            ret,
            protocol: None,
            possible_overloads: Vec::new(),
        }
    }

    /// Whether the signature declares generic type parameters.
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// Render `name<T, U>(params) -> ret` for diagnostics.
    pub fn display(&self, interner: &StringInterner) -> String {
        let mut out = interner.lookup(self.name).to_owned();
        if !self.type_params.is_empty() {
            out.push('<');
            for (i, var) in self.type_params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(interner.lookup(var.name));
            }
            out.push('>');
        }
        out.push('(');
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{}", param.display(interner));
        }
        out.push(')');
        if self.ret != Type::Native(Native::Void) {
            let _ = write!(out, " -> {}", self.ret.display(interner));
        }
        out
    }
}
