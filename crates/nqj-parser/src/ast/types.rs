//! Syntactic type expressions.

use crate::ast::{Ident, NodeId};
use nqj_core::Span;
use std::fmt;

/// A type as written in the source: `int`, `boolean`, `Foo`, `T[]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeExpr<'ast> {
    pub id: NodeId,
    pub kind: TypeKind<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeKind<'ast> {
    Int,
    Bool,
    /// A class name, resolved against the class table during analysis.
    Class(Ident<'ast>),
    /// `T[]`
    Array(&'ast TypeExpr<'ast>),
}

impl fmt::Display for TypeExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TypeKind::Int => f.write_str("int"),
            TypeKind::Bool => f.write_str("boolean"),
            TypeKind::Class(name) => f.write_str(name.name),
            TypeKind::Array(component) => write!(f, "{component}[]"),
        }
    }
}
