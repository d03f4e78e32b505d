//! Statement AST nodes.

use crate::ast::decl::VarDecl;
use crate::ast::expr::{Expr, LValue};
use nqj_core::Span;

/// A statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    /// Local declaration; only legal directly inside a block.
    VarDecl(&'ast VarDecl<'ast>),
    /// Expression evaluated for its effect.
    Expr(&'ast Expr<'ast>),
    Assign(&'ast AssignStmt<'ast>),
    If(&'ast IfStmt<'ast>),
    While(&'ast WhileStmt<'ast>),
    Return(&'ast ReturnStmt<'ast>),
    Block(&'ast Block<'ast>),
}

impl<'ast> Stmt<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Stmt::VarDecl(s) => s.span,
            Stmt::Expr(s) => s.span,
            Stmt::Assign(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Block(s) => s.span,
        }
    }
}

/// `{ stmt* }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block<'ast> {
    pub stmts: &'ast [Stmt<'ast>],
    pub span: Span,
}

/// `target = value;`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignStmt<'ast> {
    pub target: &'ast LValue<'ast>,
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

/// `if (condition) then_branch [else else_branch]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfStmt<'ast> {
    pub condition: &'ast Expr<'ast>,
    pub then_branch: &'ast Stmt<'ast>,
    pub else_branch: Option<&'ast Stmt<'ast>>,
    pub span: Span,
}

/// `while (condition) body`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhileStmt<'ast> {
    pub condition: &'ast Expr<'ast>,
    pub body: &'ast Stmt<'ast>,
    pub span: Span,
}

/// `return value;`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnStmt<'ast> {
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}
