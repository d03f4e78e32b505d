//! Operators of NotQuiteJava expressions with their binding powers.

use crate::lexer::TokenKind;
use std::fmt;

/// Binary operators, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `&&` (short-circuit)
    And,
    /// `==`
    Equal,
    /// `<`
    Less,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

impl BinaryOp {
    /// Left and right binding power; all binary operators are left associative.
    pub fn binding_power(&self) -> (u8, u8) {
        match self {
            BinaryOp::And => (1, 2),
            BinaryOp::Equal => (3, 4),
            BinaryOp::Less => (5, 6),
            BinaryOp::Add | BinaryOp::Sub => (7, 8),
            BinaryOp::Mul | BinaryOp::Div => (9, 10),
        }
    }

    pub fn from_token(token: TokenKind) -> Option<Self> {
        Some(match token {
            TokenKind::AmpAmp => BinaryOp::And,
            TokenKind::EqualEqual => BinaryOp::Equal,
            TokenKind::Less => BinaryOp::Less,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            _ => return None,
        })
    }

    /// Whether both operands and the result are `int`.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::And => "&&",
            BinaryOp::Equal => "==",
            BinaryOp::Less => "<",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        })
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `!`
    Not,
}

impl UnaryOp {
    /// Binds tighter than every binary operator.
    pub fn binding_power() -> u8 {
        11
    }

    pub fn from_token(token: TokenKind) -> Option<Self> {
        match token {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            _ => None,
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        })
    }
}
