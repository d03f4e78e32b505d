//! Abstract Syntax Tree (AST) for NotQuiteJava.
//!
//! All nodes live in a [`bumpalo::Bump`] arena and borrow from it for `'ast`.
//! The tree is immutable after parsing: nodes that analysis needs to annotate
//! carry a [`NodeId`] that is unique within one parsed program.
//!
//! # Example
//!
//! ```
//! use nqj_parser::Parser;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let source = r#"
//!     int main() {
//!         printInt(42);
//!         return 0;
//!     }
//! "#;
//!
//! let program = Parser::parse(source, &arena).expect("valid program");
//! assert_eq!(program.functions.len(), 1);
//! ```

pub mod decl;
pub mod expr;
pub mod ops;
pub mod stmt;
pub mod types;

mod decl_parser;
mod expr_parser;
mod parser;
mod stmt_parser;
mod type_parser;

pub use nqj_core::{ParseError, ParseErrorKind, ParseErrors};

pub use decl::*;
pub use expr::*;
pub use ops::*;
pub use parser::Parser;
pub use stmt::*;
pub use types::*;

use nqj_core::Span;
use std::fmt;

/// Identity of a syntax node, unique within one parsed program.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A name together with where it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident<'ast> {
    pub name: &'ast str,
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }
}

impl fmt::Display for Ident<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A parsed program: class declarations and global functions, in source order.
#[derive(Debug, Clone, Copy)]
pub struct Program<'ast> {
    pub classes: &'ast [ClassDecl<'ast>],
    pub functions: &'ast [FunctionDecl<'ast>],
    /// One past the largest [`NodeId`] handed out.
    pub node_count: u32,
}

impl<'ast> Program<'ast> {
    /// The global function named `name`, first declaration wins.
    pub fn function(&self, name: &str) -> Option<&'ast FunctionDecl<'ast>> {
        self.functions.iter().find(|f| f.name.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;

    #[test]
    fn parse_classes_and_functions() {
        let arena = Bump::new();
        let source = r#"
            int main() { return 0; }
            class A { int x; int get() { return x; } }
            class B extends A { boolean flag; }
        "#;
        let program = Parser::parse(source, &arena).unwrap();
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.classes.len(), 2);
        assert_eq!(program.classes[1].extends.map(|e| e.name), Some("A"));
        assert_eq!(program.classes[0].methods[0].name.name, "get");
        assert!(program.function("main").is_some());
    }

    #[test]
    fn node_ids_are_unique() {
        let arena = Bump::new();
        let source = "int main() { int x; x = 1 + 2; return x; }";
        let program = Parser::parse(source, &arena).unwrap();
        let main = program.functions[0];
        let Stmt::Assign(assign) = main.body.stmts[1] else {
            panic!("expected assignment");
        };
        let ExprKind::Binary { left, right, .. } = assign.value.kind else {
            panic!("expected binary");
        };
        assert_ne!(left.id, right.id);
        assert_ne!(assign.value.id, left.id);
        assert_ne!(assign.target.id, assign.value.id);
        assert!(program.node_count > assign.value.id.0);
    }

    #[test]
    fn parse_with_errors() {
        let arena = Bump::new();
        let result = Parser::parse("int main() { x = ; }", &arena);
        let errors = result.unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn type_display() {
        let arena = Bump::new();
        let program = Parser::parse("int[][] f(Foo a) { return null; }", &arena).unwrap();
        let f = program.functions[0];
        assert_eq!(f.return_type.to_string(), "int[][]");
        assert_eq!(f.params[0].ty.to_string(), "Foo");
    }
}
