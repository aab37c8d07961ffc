//! Diagnostic system for structured error reporting.
//!
//! Every Prism phase reports problems as a [`Diagnostic`]:
//! - an [`ErrorCode`] for searchability,
//! - a clear message (what went wrong),
//! - a primary [`Label`] (where it went wrong),
//! - optional context labels and notes (why, and how to fix).
//!
//! Rendering diagnostics to a terminal or machine format belongs to the
//! compiler driver; this crate only defines the data.

mod diagnostic;
mod error_code;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
