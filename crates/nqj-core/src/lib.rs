//! Shared foundation for the NotQuiteJava compiler crates.
//!
//! - [`Span`]: source positions carried by syntax nodes and diagnostics
//! - [`error`]: parse errors, analysis diagnostics, runtime errors and the
//!   unified [`NqjError`]

pub mod error;
mod span;

pub use error::{
    CompilationError, Diagnostics, NqjError, ParseError, ParseErrorKind, ParseErrors,
    RuntimeError,
};
pub use span::Span;
