//! NotQuiteJava compiler.
//!
//! Ties the workspace crates into a source-to-IR pipeline:
//!
//! - `nqj-parser`: lexer and arena-allocated syntax tree
//! - `nqj-compiler`: name/type analysis and lowering to basic blocks
//! - `nqj-ir`: the IR itself, its verifier and a reference interpreter
//!
//! # Example
//!
//! ```
//! let source = r#"
//!     class Counter {
//!         int count;
//!         int inc() { count = count + 1; return count; }
//!     }
//!     int main() {
//!         Counter c;
//!         c = new Counter();
//!         c.inc();
//!         printInt(c.inc());
//!         return 0;
//!     }
//! "#;
//!
//! let execution = nqj::run(source).unwrap();
//! assert_eq!(execution.output, vec![2]);
//! assert_eq!(execution.result, Ok(0));
//! ```
//!
//! Rejected programs report every diagnostic analysis found:
//!
//! ```
//! let err = nqj::compile("int main() { return true; }").unwrap_err();
//! assert!(err.is_compilation());
//! ```

use bumpalo::Bump;

pub use nqj_compiler::{CompilationResult, CompileOptions, Compiler};
pub use nqj_core::{
    CompilationError, Diagnostics, NqjError, ParseError, ParseErrors, RuntimeError, Span,
};
pub use nqj_ir::{ExecOptions, Execution, Module};

pub use nqj_compiler as compiler;
pub use nqj_ir as ir;
pub use nqj_parser as parser;

use nqj_parser::Parser;

/// Result type for the one-call entry points.
pub type NqjResult<T> = Result<T, NqjError>;

/// Parse and analyze `source` without generating code.
///
/// Returns the (possibly empty) analysis diagnostics; only syntax errors
/// are reported as `Err`.
pub fn analyze(source: &str) -> Result<Diagnostics, ParseErrors> {
    let arena = Bump::new();
    let program = Parser::parse(source, &arena)?;
    Ok(Compiler::default().analyze(program).diagnostics)
}

/// Compile `source` with default options.
pub fn compile(source: &str) -> NqjResult<Module> {
    compile_with(source, &CompileOptions::default())
}

/// Compile `source`, returning the generated module.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile_with(source: &str, options: &CompileOptions) -> NqjResult<Module> {
    let arena = Bump::new();
    let program = Parser::parse(source, &arena)?;
    let module = Compiler::new(options.clone()).compile(program).into_result()?;
    tracing::debug!(
        arena_bytes = arena.allocated_bytes(),
        procedures = module.procedures().len(),
        "compiled source"
    );
    Ok(module)
}

/// Compile `source` and interpret its `main` procedure.
///
/// Parse and analysis failures are returned as `Err`; what happened at
/// runtime, including halts, is recorded in the [`Execution`].
pub fn run(source: &str) -> NqjResult<Execution> {
    run_with(source, &CompileOptions::default(), &ExecOptions::default())
}

/// Like [`run`], with explicit compiler and interpreter options.
pub fn run_with(
    source: &str,
    options: &CompileOptions,
    exec: &ExecOptions,
) -> NqjResult<Execution> {
    let module = compile_with(source, options)?;
    let execution = nqj_ir::run(&module, "main", exec);
    if let Err(error) = &execution.result {
        tracing::debug!(%error, printed = execution.output.len(), "program stopped");
    }
    Ok(execution)
}

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        CompileOptions, Compiler, Diagnostics, ExecOptions, Execution, Module, NqjError,
        NqjResult, analyze, compile, compile_with, run, run_with,
    };
}
