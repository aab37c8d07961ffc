//! Type system for the Prism shading language compiler.
//!
//! This crate is the compile-time core that later phases (call checking,
//! inlining, buffer layout) build on:
//! - the recursive [`Type`] grammar and its [`Substitution`] rewrite,
//! - the [`FunctionRegistry`] / [`ProtocolRegistry`] declaration stores,
//! - the [`Resolver`], which binds call sites to overloads and decides
//!   protocol conformance.
//!
//! # Build-then-query
//!
//! Registries are populated once while the program is constructed
//! (after parsing and name resolution) and are immutable afterwards.
//! Every resolver query is a pure function over that declaration set:
//! types and signatures are immutable value objects, and substitution
//! produces new values instead of mutating.
//!
//! # Error model
//!
//! Expected, data-level failures — an overload does not match, a type
//! does not conform — are ordinary result values ([`OverloadResolution`],
//! [`Conformance`]). Malformed input to the engine raises a typed
//! [`FatalError`] carrying the originating source location.

mod conformance;
mod error;
mod overload;
mod registry;
mod signature;
mod subst;
mod ty;
mod unify;

pub use conformance::Conformance;
pub use error::FatalError;
pub use overload::{OverloadResolution, Resolver};
pub use registry::{FuncId, FunctionRegistry, ProtocolDecl, ProtocolId, ProtocolRegistry};
pub use signature::{Signature, SignatureKind};
pub use subst::Substitution;
pub use ty::{AddressSpace, EnumType, Native, StructField, StructType, Type, TypeVar};
pub use unify::{UnificationContext, UnifyFailure};
