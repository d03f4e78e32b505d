//! Expression parsing using precedence climbing.

use super::parser::{Parser, describe};
use crate::ast::expr::*;
use crate::ast::{BinaryOp, Ident, ParseError, ParseErrorKind, UnaryOp};
use crate::lexer::TokenKind;
use bumpalo::collections::Vec as BVec;
use nqj_core::Span;

/// Largest literal outside a negation.
const MAX_INT_LITERAL: i64 = i32::MAX as i64;

/// Largest literal directly under unary minus, so `-2147483648` is `i32::MIN`.
const MAX_NEGATED_LITERAL: i64 = 1 << 31;

impl<'ast> Parser<'ast> {
    /// Parse an expression whose binary operators bind at least `min_bp`.
    pub fn parse_expr(&mut self, min_bp: u8) -> Result<&'ast Expr<'ast>, ParseError> {
        let mut lhs = self.parse_unary()?;

        while let Some(op) = BinaryOp::from_token(self.peek().kind) {
            let (l_bp, r_bp) = op.binding_power();
            if l_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(r_bp)?;
            let span = lhs.span.merge(rhs.span);
            lhs = self.alloc_expr(
                ExprKind::Binary {
                    op,
                    left: lhs,
                    right: rhs,
                },
                span,
            );
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        if let Some(op) = UnaryOp::from_token(self.peek().kind) {
            let start = self.advance().span;
            let operand = if op == UnaryOp::Neg && self.check(TokenKind::IntLiteral) {
                let literal = self.parse_int_literal(MAX_NEGATED_LITERAL)?;
                self.parse_postfix(literal)?
            } else {
                self.parse_unary()?
            };
            let span = start.merge(operand.span);
            return Ok(self.alloc_expr(ExprKind::Unary { op, operand }, span));
        }
        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    /// Member access, method calls, `.length` and indexing.
    fn parse_postfix(
        &mut self,
        mut expr: &'ast Expr<'ast>,
    ) -> Result<&'ast Expr<'ast>, ParseError> {
        loop {
            if self.eat(TokenKind::Dot).is_some() {
                if let Some(length) = self.eat(TokenKind::Length) {
                    let span = expr.span.merge(length.span);
                    expr = self.alloc_expr(ExprKind::ArrayLength(expr), span);
                    continue;
                }
                let name = self.parse_ident()?;
                if self.check(TokenKind::LeftParen) {
                    let args = self.parse_arguments()?;
                    let span = expr.span.merge(self.previous_span());
                    expr = self.alloc_expr(
                        ExprKind::MethodCall {
                            receiver: expr,
                            method: name,
                            args,
                        },
                        span,
                    );
                } else {
                    let span = expr.span.merge(name.span);
                    expr = self.read(
                        LValueKind::Field {
                            receiver: expr,
                            field: name,
                        },
                        span,
                    );
                }
            } else if self.eat(TokenKind::LeftBracket).is_some() {
                let index = self.parse_expr(0)?;
                let end = self.expect(TokenKind::RightBracket)?.span;
                let span = expr.span.merge(end);
                expr = self.read(LValueKind::Index { array: expr, index }, span);
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_int_literal(&mut self, max: i64) -> Result<&'ast Expr<'ast>, ParseError> {
        let token = self.advance();
        let value = token
            .lexeme
            .parse::<i64>()
            .ok()
            .filter(|v| *v <= max)
            .ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::InvalidLiteral,
                    token.span,
                    format!("integer literal {} is too large", token.lexeme),
                )
            })?;
        Ok(self.alloc_expr(ExprKind::Number(value), token.span))
    }

    fn parse_primary(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let token = *self.peek();
        match token.kind {
            TokenKind::IntLiteral => self.parse_int_literal(MAX_INT_LITERAL),
            TokenKind::True | TokenKind::False => {
                self.advance();
                let value = token.kind == TokenKind::True;
                Ok(self.alloc_expr(ExprKind::Bool(value), token.span))
            }
            TokenKind::Null => {
                self.advance();
                Ok(self.alloc_expr(ExprKind::Null, token.span))
            }
            TokenKind::This => {
                self.advance();
                Ok(self.alloc_expr(ExprKind::This, token.span))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expr(0)?;
                self.expect(TokenKind::RightParen)?;
                Ok(inner)
            }
            TokenKind::New => self.parse_new(),
            TokenKind::Identifier => {
                self.advance();
                let name = Ident::new(token.lexeme, token.span);
                if self.check(TokenKind::LeftParen) {
                    let args = self.parse_arguments()?;
                    let span = token.span.merge(self.previous_span());
                    Ok(self.alloc_expr(ExprKind::Call { name, args }, span))
                } else {
                    Ok(self.read(LValueKind::Var(name), token.span))
                }
            }
            TokenKind::Eof => Err(ParseError::new(
                ParseErrorKind::UnexpectedEof,
                token.span,
                "expected expression, found end of file",
            )),
            _ => Err(ParseError::expected_expression(token.span, &describe(&token))),
        }
    }

    /// Grammar: `'new' IDENTIFIER '(' ')' | 'new' BASE_TYPE '[' EXPR ']' ('[' ']')*`
    fn parse_new(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let start = self.expect(TokenKind::New)?.span;

        if self.check(TokenKind::Identifier) && self.peek_nth(1).kind == TokenKind::LeftParen {
            let class = self.parse_ident()?;
            self.expect(TokenKind::LeftParen)?;
            let end = self.expect(TokenKind::RightParen)?.span;
            return Ok(self.alloc_expr(ExprKind::NewObject(class), start.merge(end)));
        }

        let mut element = self.parse_base_type()?;
        self.expect(TokenKind::LeftBracket)?;
        let size = self.parse_expr(0)?;
        let mut end = self.expect(TokenKind::RightBracket)?.span;
        while self.check(TokenKind::LeftBracket) && self.peek_nth(1).kind == TokenKind::RightBracket {
            self.advance();
            end = self.advance().span;
            element = self.wrap_array(element, end);
        }

        Ok(self.alloc_expr(ExprKind::NewArray { element, size }, start.merge(end)))
    }

    /// Grammar: `'(' (EXPR (',' EXPR)*)? ')'`
    fn parse_arguments(&mut self) -> Result<&'ast [Expr<'ast>], ParseError> {
        self.expect(TokenKind::LeftParen)?;
        let mut args = BVec::new_in(self.arena);
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(*self.parse_expr(0)?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen)?;
        Ok(args.into_bump_slice())
    }

    fn alloc_expr(&mut self, kind: ExprKind<'ast>, span: Span) -> &'ast Expr<'ast> {
        let id = self.next_id();
        self.arena.alloc(Expr { id, kind, span })
    }

    /// An expression reading the location described by `kind`.
    fn read(&mut self, kind: LValueKind<'ast>, span: Span) -> &'ast Expr<'ast> {
        let id = self.next_id();
        let lvalue = self.arena.alloc(LValue { id, kind, span });
        self.alloc_expr(ExprKind::Read(lvalue), span)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use bumpalo::Bump;

    #[test]
    fn precedence_mul_over_add() {
        let arena = Bump::new();
        let expr = Parser::expression("1 + 2 * 3", &arena).unwrap();
        let ExprKind::Binary { op, right, .. } = expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn and_binds_loosest() {
        let arena = Bump::new();
        let expr = Parser::expression("a < b && c == d", &arena).unwrap();
        assert!(matches!(expr.kind, ExprKind::Binary { op: BinaryOp::And, .. }));
    }

    #[test]
    fn subtraction_is_left_associative() {
        let arena = Bump::new();
        let expr = Parser::expression("10 - 4 - 3", &arena).unwrap();
        let ExprKind::Binary { left, .. } = expr.kind else {
            panic!("expected binary");
        };
        assert!(matches!(left.kind, ExprKind::Binary { op: BinaryOp::Sub, .. }));
    }

    #[test]
    fn min_int_literal() {
        let arena = Bump::new();
        let expr = Parser::expression("-2147483648", &arena).unwrap();
        let ExprKind::Unary { op: UnaryOp::Neg, operand } = expr.kind else {
            panic!("expected negation");
        };
        assert_eq!(operand.kind, ExprKind::Number(2147483648));
    }

    #[test]
    fn min_int_magnitude_needs_negation() {
        let arena = Bump::new();
        for source in ["2147483648", "1 - 2147483648", "-(2147483648)"] {
            let errors = Parser::expression(source, &arena).unwrap_err();
            assert_eq!(
                errors.iter().next().map(|e| e.kind),
                Some(ParseErrorKind::InvalidLiteral),
                "{source}"
            );
        }
        assert!(Parser::expression("2147483647", &arena).is_ok());
        assert!(Parser::expression("1 - -2147483648", &arena).is_ok());
    }

    #[test]
    fn literal_too_large() {
        let arena = Bump::new();
        let errors = Parser::expression("2147483649", &arena).unwrap_err();
        assert_eq!(
            errors.iter().next().map(|e| e.kind),
            Some(ParseErrorKind::InvalidLiteral)
        );
    }

    #[test]
    fn field_chain_and_length() {
        let arena = Bump::new();
        let expr = Parser::expression("list.tail.elements.length", &arena).unwrap();
        let ExprKind::ArrayLength(array) = expr.kind else {
            panic!("expected length");
        };
        let ExprKind::Read(lvalue) = array.kind else {
            panic!("expected read");
        };
        assert!(matches!(lvalue.kind, LValueKind::Field { field, .. } if field.name == "elements"));
    }

    #[test]
    fn calls() {
        let arena = Bump::new();
        let expr = Parser::expression("printInt(b1.val)", &arena).unwrap();
        assert!(matches!(expr.kind, ExprKind::Call { name, args } if name.name == "printInt" && args.len() == 1));

        let expr = Parser::expression("tail.find(elem)", &arena).unwrap();
        assert!(matches!(expr.kind, ExprKind::MethodCall { method, .. } if method.name == "find"));
    }

    #[test]
    fn new_expressions() {
        let arena = Bump::new();
        let expr = Parser::expression("new Tail()", &arena).unwrap();
        assert!(matches!(expr.kind, ExprKind::NewObject(name) if name.name == "Tail"));

        let expr = Parser::expression("new int[size + 1]", &arena).unwrap();
        assert!(matches!(expr.kind, ExprKind::NewArray { element, .. } if element.kind == TypeKind::Int));

        let expr = Parser::expression("new boolean[3][]", &arena).unwrap();
        let ExprKind::NewArray { element, .. } = expr.kind else {
            panic!("expected new array");
        };
        assert_eq!(element.to_string(), "boolean[]");
    }

    #[test]
    fn negation_and_parentheses() {
        let arena = Bump::new();
        let expr = Parser::expression("!(a == null)", &arena).unwrap();
        let ExprKind::Unary { op: UnaryOp::Not, operand } = expr.kind else {
            panic!("expected not");
        };
        assert!(matches!(operand.kind, ExprKind::Binary { op: BinaryOp::Equal, .. }));
    }

    #[test]
    fn missing_operand() {
        let arena = Bump::new();
        let errors = Parser::expression("1 +", &arena).unwrap_err();
        assert_eq!(
            errors.iter().next().map(|e| e.kind),
            Some(ParseErrorKind::UnexpectedEof)
        );
    }
}
