//! NotQuiteJava Compiler
//!
//! The semantic core of the NQJ compiler: name and type analysis of a
//! parsed program, then lowering of accepted programs to the basic-block
//! IR of `nqj-ir`.
//!
//! ## Architecture
//!
//! - **Analysis**: build the class hierarchy and global function table,
//!   resolve every name, type-check every statement and expression and
//!   enforce the override and control-flow rules. Results are recorded in
//!   [`Annotations`] keyed by syntax node; problems are collected as
//!   diagnostics and never stop the pass.
//! - **Translation**: only for programs with zero diagnostics. Lay out one
//!   struct per class, register every procedure, then lower bodies with
//!   explicit null, bounds and division guards.
//!
//! ## Modules
//!
//! - [`types`]: semantic types and the subtype relation
//! - [`class_table`]: class hierarchy with duplicate and cycle handling
//! - [`name_table`]: global functions and memoized array types
//! - [`scope`]: method scopes and per-class member tables
//! - [`check`]: the analyzer
//! - [`layout`]: struct layouts, constructors and procedure skeletons
//! - [`emit`]: per-procedure IR builder
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use nqj_compiler::Compiler;
//! use nqj_parser::Parser;
//!
//! let arena = Bump::new();
//! let program = Parser::parse("int main() { printInt(6 * 7); return 0; }", &arena).unwrap();
//!
//! let result = Compiler::default().compile(program);
//! assert!(result.is_success());
//! let module = result.module.unwrap();
//! let execution = nqj_ir::run(&module, "main", &Default::default());
//! assert_eq!(execution.output, vec![42]);
//! ```

mod annotations;
pub mod check;
pub mod class_table;
mod compiler;
pub mod emit;
pub mod layout;
pub mod name_table;
pub mod scope;
mod translate;
pub mod types;

pub use annotations::{Annotations, CallTarget, VarBinding};
pub use check::{Analysis, Analyzer};
pub use class_table::ClassTable;
pub use compiler::{CompilationResult, CompileOptions, Compiler};
pub use layout::{ClassLayout, Layouts, ProcSig};
pub use name_table::{GlobalFunction, NameTable};
pub use scope::{ClassContext, FieldInfo, LocalVar, MethodScope, MethodSig};
pub use types::{ArrayType, ClassRef, ClassType, Type};

// Re-export CompilationError from core for convenience
pub use nqj_core::CompilationError;
