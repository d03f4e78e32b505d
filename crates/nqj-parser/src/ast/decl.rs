//! Declarations: classes, functions/methods and variables.

use crate::ast::stmt::Block;
use crate::ast::types::TypeExpr;
use crate::ast::{Ident, NodeId};
use nqj_core::Span;

/// `class Name [extends Super] { fields methods }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassDecl<'ast> {
    pub id: NodeId,
    pub name: Ident<'ast>,
    pub extends: Option<Ident<'ast>>,
    pub fields: &'ast [VarDecl<'ast>],
    pub methods: &'ast [FunctionDecl<'ast>],
    pub span: Span,
}

impl<'ast> ClassDecl<'ast> {
    pub fn field(&self, name: &str) -> Option<&'ast VarDecl<'ast>> {
        self.fields.iter().find(|f| f.name.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&'ast FunctionDecl<'ast>> {
        self.methods.iter().find(|m| m.name.name == name)
    }
}

/// A global function or a method; methods differ only by where they are declared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionDecl<'ast> {
    pub id: NodeId,
    pub return_type: &'ast TypeExpr<'ast>,
    pub name: Ident<'ast>,
    pub params: &'ast [VarDecl<'ast>],
    pub body: Block<'ast>,
    pub span: Span,
}

/// A field, parameter or local variable declaration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarDecl<'ast> {
    pub id: NodeId,
    pub ty: &'ast TypeExpr<'ast>,
    pub name: Ident<'ast>,
    pub span: Span,
}
