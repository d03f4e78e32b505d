//! Type parsing.

use super::parser::{Parser, describe};
use crate::ast::{Ident, ParseError, ParseErrorKind, TypeExpr, TypeKind};
use crate::lexer::TokenKind;

impl<'ast> Parser<'ast> {
    /// Parse a type.
    ///
    /// Grammar: `('int' | 'boolean' | IDENTIFIER) ('[' ']')*`
    pub fn parse_type(&mut self) -> Result<&'ast TypeExpr<'ast>, ParseError> {
        let mut ty = self.parse_base_type()?;
        while self.check(TokenKind::LeftBracket) && self.peek_nth(1).kind == TokenKind::RightBracket {
            self.advance();
            let close = self.advance();
            ty = self.wrap_array(ty, close.span);
        }
        Ok(ty)
    }

    /// Parse `int`, `boolean` or a class name without array suffixes.
    pub(super) fn parse_base_type(&mut self) -> Result<&'ast TypeExpr<'ast>, ParseError> {
        let token = *self.peek();
        let kind = match token.kind {
            TokenKind::Int => TypeKind::Int,
            TokenKind::Boolean => TypeKind::Bool,
            TokenKind::Identifier => TypeKind::Class(Ident::new(token.lexeme, token.span)),
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedType,
                    token.span,
                    format!("expected type, found {}", describe(&token)),
                ));
            }
        };
        self.advance();
        let id = self.next_id();
        Ok(self.arena.alloc(TypeExpr {
            id,
            kind,
            span: token.span,
        }))
    }

    /// `component[]`, ending at `end`.
    pub(super) fn wrap_array(
        &mut self,
        component: &'ast TypeExpr<'ast>,
        end: nqj_core::Span,
    ) -> &'ast TypeExpr<'ast> {
        let id = self.next_id();
        self.arena.alloc(TypeExpr {
            id,
            kind: TypeKind::Array(component),
            span: component.span.merge(end),
        })
    }

    /// Whether the upcoming tokens start a variable declaration `TYPE IDENTIFIER`.
    pub(super) fn is_var_decl(&self) -> bool {
        match self.peek().kind {
            TokenKind::Int | TokenKind::Boolean => true,
            TokenKind::Identifier => {
                let mut n = 1;
                while self.peek_nth(n).kind == TokenKind::LeftBracket
                    && self.peek_nth(n + 1).kind == TokenKind::RightBracket
                {
                    n += 2;
                }
                self.peek_nth(n).kind == TokenKind::Identifier
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use bumpalo::Bump;

    #[test]
    fn array_of_class() {
        let arena = Bump::new();
        let program = Parser::parse("int main() { Foo[][] grid; return 0; }", &arena).unwrap();
        let Stmt::VarDecl(decl) = program.functions[0].body.stmts[0] else {
            panic!("expected var decl");
        };
        let TypeKind::Array(inner) = decl.ty.kind else {
            panic!("expected array");
        };
        let TypeKind::Array(base) = inner.kind else {
            panic!("expected nested array");
        };
        assert!(matches!(base.kind, TypeKind::Class(name) if name.name == "Foo"));
    }

    #[test]
    fn index_statement_is_not_declaration() {
        let arena = Bump::new();
        let program = Parser::parse("int main() { a[0] = 1; return 0; }", &arena).unwrap();
        assert!(matches!(program.functions[0].body.stmts[0], Stmt::Assign(_)));
    }

    #[test]
    fn missing_type() {
        let arena = Bump::new();
        let errors = Parser::parse("class A { 5 x; }", &arena).unwrap_err();
        assert_eq!(
            errors.iter().next().map(|e| e.kind),
            Some(ParseErrorKind::ExpectedType)
        );
    }
}
