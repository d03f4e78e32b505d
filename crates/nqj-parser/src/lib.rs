//! NotQuiteJava parser crate.
//!
//! Provides:
//! - Lexical analysis (tokenization)
//! - Arena-allocated Abstract Syntax Tree with per-node identities
//! - Recursive-descent parser producing a [`ast::Program`]
//!
//! # Example
//!
//! ```
//! use nqj_parser::Parser;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let source = r#"
//!     class Counter {
//!         int count;
//!         int inc() { count = count + 1; return count; }
//!     }
//!     int main() { return 0; }
//! "#;
//!
//! match Parser::parse(source, &arena) {
//!     Ok(program) => println!("{} classes", program.classes.len()),
//!     Err(errors) => eprintln!("Parse errors: {}", errors),
//! }
//! ```

pub mod ast;
pub mod lexer;

pub use ast::{NodeId, Parser, Program};
pub use lexer::{Lexer, Token, TokenKind};
