//! Expression and assignable-location AST nodes.
//!
//! Every [`Expr`] and [`LValue`] carries a [`NodeId`] so analysis can record
//! resolved types and declarations in side tables instead of on the tree.
//!
//! # Expression Precedence
//!
//! 1. `&&`
//! 2. `==`
//! 3. `<`
//! 4. `+`, `-`
//! 5. `*`, `/`
//! 6. prefix `-`, `!`
//! 7. postfix `.field`, `.method(..)`, `.length`, `[index]`

use crate::ast::types::TypeExpr;
use crate::ast::{BinaryOp, Ident, NodeId, UnaryOp};
use nqj_core::Span;

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expr<'ast> {
    pub id: NodeId,
    pub kind: ExprKind<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExprKind<'ast> {
    Unary {
        op: UnaryOp,
        operand: &'ast Expr<'ast>,
    },
    Binary {
        op: BinaryOp,
        left: &'ast Expr<'ast>,
        right: &'ast Expr<'ast>,
    },
    /// Integer literal. Values up to `2^31` are accepted so that
    /// `-2147483648` can be written; translation wraps to 32 bits.
    Number(i64),
    Bool(bool),
    Null,
    This,
    /// Read the value stored at an assignable location.
    Read(&'ast LValue<'ast>),
    /// `array.length`
    ArrayLength(&'ast Expr<'ast>),
    /// `new C()`
    NewObject(Ident<'ast>),
    /// `new T[size]`; the result has type `T[]`.
    NewArray {
        element: &'ast TypeExpr<'ast>,
        size: &'ast Expr<'ast>,
    },
    /// Unqualified call `f(args)`: a method of the enclosing class chain or a global function.
    Call {
        name: Ident<'ast>,
        args: &'ast [Expr<'ast>],
    },
    /// `receiver.method(args)`
    MethodCall {
        receiver: &'ast Expr<'ast>,
        method: Ident<'ast>,
        args: &'ast [Expr<'ast>],
    },
}

/// An assignable location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LValue<'ast> {
    pub id: NodeId,
    pub kind: LValueKind<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LValueKind<'ast> {
    /// A local, parameter or (implicit `this`) field.
    Var(Ident<'ast>),
    /// `receiver.field`
    Field {
        receiver: &'ast Expr<'ast>,
        field: Ident<'ast>,
    },
    /// `array[index]`
    Index {
        array: &'ast Expr<'ast>,
        index: &'ast Expr<'ast>,
    },
}
