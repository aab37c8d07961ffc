//! Shared identifier and source-location types for the Prism compiler.
//!
//! Every later phase refers to source text through two compact handles:
//! [`Name`], an interned identifier, and [`Span`], a byte range into the
//! source file. The [`StringInterner`] owns the actual string data and is
//! shared by all phases of a compilation.

mod interner;
mod name;
mod span;

pub use interner::{InternError, StringInterner};
pub use name::Name;
pub use span::{Span, SpanError};
