//! Fatal type-engine errors.
//!
//! Expected, data-level failures (an overload does not match, a type
//! does not conform) are ordinary result values. `FatalError` covers
//! malformed input to the engine and aborts the enclosing compiler
//! pass; it is never retried.

use std::fmt;

use prism_diagnostic::{Diagnostic, ErrorCode};
use prism_ir::{Name, Span, StringInterner};

/// Fatal error raised on malformed input to the type engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FatalError {
    /// A non-protocol signature was inserted into a protocol.
    NotAProtocolSignature { name: Name, span: Span },

    /// A protocol requirement was registered as a callable function.
    ProtocolSignatureAsFunction { name: Name, span: Span },

    /// A substitution was constructed from lists of different lengths.
    SubstitutionArity { vars: usize, replacements: usize },

    /// An unresolved type reference reached the resolver. Name
    /// resolution must run before any query.
    UnresolvedTypeRef { name: Name, span: Span },

    /// A protocol `extends` list names an unknown protocol.
    UnknownProtocol { name: Name, span: Span },

    /// Two protocol declarations share a name.
    DuplicateProtocol { name: Name, span: Span },

    /// The protocol `extends` graph contains a cycle.
    CyclicExtends { name: Name, span: Span },

    /// Conformance checking re-entered the same protocol/type pair.
    CyclicConstraint { protocol: Name, span: Span },
}

impl FatalError {
    /// The originating source location.
    pub fn span(&self) -> Span {
        match self {
            FatalError::NotAProtocolSignature { span, .. }
            | FatalError::ProtocolSignatureAsFunction { span, .. }
            | FatalError::UnresolvedTypeRef { span, .. }
            | FatalError::UnknownProtocol { span, .. }
            | FatalError::DuplicateProtocol { span, .. }
            | FatalError::CyclicExtends { span, .. }
            | FatalError::CyclicConstraint { span, .. } => *span,
            FatalError::SubstitutionArity { .. } => Span::DUMMY,
        }
    }

    /// The diagnostic code this error reports under.
    pub fn code(&self) -> ErrorCode {
        match self {
            FatalError::NotAProtocolSignature { .. } => ErrorCode::E9001,
            FatalError::ProtocolSignatureAsFunction { .. } => ErrorCode::E9001,
            FatalError::SubstitutionArity { .. } => ErrorCode::E9002,
            FatalError::UnresolvedTypeRef { .. } => ErrorCode::E9003,
            FatalError::UnknownProtocol { .. } => ErrorCode::E2004,
            FatalError::DuplicateProtocol { .. } => ErrorCode::E2006,
            FatalError::CyclicExtends { .. } => ErrorCode::E2005,
            FatalError::CyclicConstraint { .. } => ErrorCode::E9004,
        }
    }

    /// Convert to a diagnostic.
    pub fn to_diagnostic(&self, interner: &StringInterner) -> Diagnostic {
        match self {
            FatalError::NotAProtocolSignature { name, span } => Diagnostic::error(self.code())
                .with_message(format!(
                    "signature `{}` is not a protocol requirement",
                    interner.lookup(*name)
                ))
                .with_label(*span, "inserted into a protocol here"),
            FatalError::ProtocolSignatureAsFunction { name, span } => Diagnostic::error(self.code())
                .with_message(format!(
                    "protocol requirement `{}` registered as a callable function",
                    interner.lookup(*name)
                ))
                .with_label(*span, "declared here"),
            FatalError::SubstitutionArity { vars, replacements } => Diagnostic::error(self.code())
                .with_message(format!(
                    "substitution arity mismatch: {vars} variables, {replacements} replacements"
                )),
            FatalError::UnresolvedTypeRef { name, span } => Diagnostic::error(self.code())
                .with_message(format!(
                    "unresolved type reference `{}` reached the type engine",
                    interner.lookup(*name)
                ))
                .with_label(*span, "referenced here")
                .with_note("name resolution must run before overload or conformance queries"),
            FatalError::UnknownProtocol { name, span } => Diagnostic::error(self.code())
                .with_message(format!("unknown protocol `{}`", interner.lookup(*name)))
                .with_label(*span, "extends an undeclared protocol"),
            FatalError::DuplicateProtocol { name, span } => Diagnostic::error(self.code())
                .with_message(format!(
                    "protocol `{}` is defined more than once",
                    interner.lookup(*name)
                ))
                .with_label(*span, "redefined here"),
            FatalError::CyclicExtends { name, span } => Diagnostic::error(self.code())
                .with_message(format!(
                    "protocol `{}` is part of a cyclic extends chain",
                    interner.lookup(*name)
                ))
                .with_label(*span, "declared here"),
            FatalError::CyclicConstraint { protocol, span } => Diagnostic::error(self.code())
                .with_message(format!(
                    "conformance to `{}` recursively depends on itself",
                    interner.lookup(*protocol)
                ))
                .with_label(*span, "protocol declared here"),
        }
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalError::NotAProtocolSignature { .. } => {
                write!(f, "signature is not a protocol requirement")
            }
            FatalError::ProtocolSignatureAsFunction { .. } => {
                write!(f, "protocol requirement registered as a callable function")
            }
            FatalError::SubstitutionArity { vars, replacements } => write!(
                f,
                "substitution arity mismatch: {vars} variables, {replacements} replacements"
            ),
            FatalError::UnresolvedTypeRef { .. } => {
                write!(f, "unresolved type reference reached the type engine")
            }
            FatalError::UnknownProtocol { .. } => write!(f, "unknown protocol in extends list"),
            FatalError::DuplicateProtocol { .. } => write!(f, "duplicate protocol definition"),
            FatalError::CyclicExtends { .. } => write!(f, "cyclic protocol extends chain"),
            FatalError::CyclicConstraint { .. } => {
                write!(f, "protocol conformance recursively depends on itself")
            }
        }
    }
}

impl std::error::Error for FatalError {}
