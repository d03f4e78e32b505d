//! Statement parsing.

use super::parser::Parser;
use crate::ast::stmt::*;
use crate::ast::{ExprKind, ParseError, ParseErrorKind, VarDecl};
use crate::lexer::TokenKind;
use bumpalo::collections::Vec as BVec;

impl<'ast> Parser<'ast> {
    /// Parse a block.
    ///
    /// Grammar: `'{' BLOCK_ITEM* '}'`
    pub fn parse_block(&mut self) -> Result<Block<'ast>, ParseError> {
        let start = self.expect(TokenKind::LeftBrace)?.span;
        let mut stmts = BVec::new_in(self.arena);
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            stmts.push(self.parse_block_item()?);
        }
        let end = self.expect(TokenKind::RightBrace)?.span;
        Ok(Block {
            stmts: stmts.into_bump_slice(),
            span: start.merge(end),
        })
    }

    /// Parse a statement that may also be a local declaration.
    pub fn parse_block_item(&mut self) -> Result<Stmt<'ast>, ParseError> {
        if self.is_var_decl() {
            return self.parse_var_decl();
        }
        self.parse_statement()
    }

    /// Parse a statement (declarations are not statements on their own).
    pub fn parse_statement(&mut self) -> Result<Stmt<'ast>, ParseError> {
        match self.peek().kind {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Return => self.parse_return(),
            TokenKind::LeftBrace => {
                let block = self.parse_block()?;
                Ok(Stmt::Block(self.arena.alloc(block)))
            }
            _ => self.parse_expr_or_assign(),
        }
    }

    /// Grammar: `TYPE IDENTIFIER ';'`
    fn parse_var_decl(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let ty = self.parse_type()?;
        let name = self.parse_ident()?;
        let end = self.expect(TokenKind::Semicolon)?.span;
        let id = self.next_id();
        Ok(Stmt::VarDecl(self.arena.alloc(VarDecl {
            id,
            ty,
            name,
            span: ty.span.merge(end),
        })))
    }

    /// Grammar: `'if' '(' EXPR ')' STMT ('else' STMT)?`
    fn parse_if(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::If)?.span;
        self.expect(TokenKind::LeftParen)?;
        let condition = self.parse_expr(0)?;
        self.expect(TokenKind::RightParen)?;
        let then_stmt = self.parse_statement()?;
        let then_branch: &'ast Stmt<'ast> = self.arena.alloc(then_stmt);
        let else_branch = if self.eat(TokenKind::Else).is_some() {
            let else_stmt = self.parse_statement()?;
            let stmt: &'ast Stmt<'ast> = self.arena.alloc(else_stmt);
            Some(stmt)
        } else {
            None
        };
        let end = else_branch.unwrap_or(then_branch).span();
        Ok(Stmt::If(self.arena.alloc(IfStmt {
            condition,
            then_branch,
            else_branch,
            span: start.merge(end),
        })))
    }

    /// Grammar: `'while' '(' EXPR ')' STMT`
    fn parse_while(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::While)?.span;
        self.expect(TokenKind::LeftParen)?;
        let condition = self.parse_expr(0)?;
        self.expect(TokenKind::RightParen)?;
        let body_stmt = self.parse_statement()?;
        let body: &'ast Stmt<'ast> = self.arena.alloc(body_stmt);
        Ok(Stmt::While(self.arena.alloc(WhileStmt {
            condition,
            body,
            span: start.merge(body.span()),
        })))
    }

    /// Grammar: `'return' EXPR ';'`
    fn parse_return(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::Return)?.span;
        let value = self.parse_expr(0)?;
        let end = self.expect(TokenKind::Semicolon)?.span;
        Ok(Stmt::Return(self.arena.alloc(ReturnStmt {
            value,
            span: start.merge(end),
        })))
    }

    /// Grammar: `EXPR ';' | LVALUE '=' EXPR ';'`
    fn parse_expr_or_assign(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let expr = self.parse_expr(0)?;

        if let Some(eq) = self.eat(TokenKind::Equal) {
            let ExprKind::Read(target) = expr.kind else {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidAssignTarget,
                    eq.span,
                    "left side of an assignment must be a variable, field or array element",
                ));
            };
            let value = self.parse_expr(0)?;
            let end = self.expect(TokenKind::Semicolon)?.span;
            return Ok(Stmt::Assign(self.arena.alloc(AssignStmt {
                target,
                value,
                span: expr.span.merge(end),
            })));
        }

        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Expr(expr))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use bumpalo::Bump;

    #[test]
    fn if_without_braces_chains_else_if() {
        let arena = Bump::new();
        let stmt = Parser::statement(
            "if (empty) result = 0; else if (head == elem) result = 1; else result = 2;",
            &arena,
        )
        .unwrap();
        let Stmt::If(outer) = stmt else {
            panic!("expected if");
        };
        assert!(matches!(outer.then_branch, Stmt::Assign(_)));
        assert!(matches!(outer.else_branch, Some(Stmt::If(_))));
    }

    #[test]
    fn while_with_block_body() {
        let arena = Bump::new();
        let stmt = Parser::statement("while (i < n) { i = i + 1; }", &arena).unwrap();
        let Stmt::While(w) = stmt else {
            panic!("expected while");
        };
        assert!(matches!(w.body, Stmt::Block(b) if b.stmts.len() == 1));
    }

    #[test]
    fn assignment_targets() {
        let arena = Bump::new();
        for source in ["x = 1;", "this.val = 10;", "other[i] = elements[i];"] {
            let stmt = Parser::statement(source, &arena).unwrap();
            assert!(matches!(stmt, Stmt::Assign(_)), "{source}");
        }
    }

    #[test]
    fn invalid_assignment_target() {
        let arena = Bump::new();
        let errors = Parser::statement("f() = 1;", &arena).unwrap_err();
        assert_eq!(
            errors.iter().next().map(|e| e.kind),
            Some(ParseErrorKind::InvalidAssignTarget)
        );
    }

    #[test]
    fn declaration_inside_block() {
        let arena = Bump::new();
        let stmt = Parser::statement("{ int[] other; other = new int[3]; }", &arena).unwrap();
        let Stmt::Block(block) = stmt else {
            panic!("expected block");
        };
        assert!(matches!(block.stmts[0], Stmt::VarDecl(d) if d.name.name == "other"));
    }

    #[test]
    fn expression_statement() {
        let arena = Bump::new();
        let stmt = Parser::statement("list.add(1);", &arena).unwrap();
        assert!(matches!(
            stmt,
            Stmt::Expr(Expr { kind: ExprKind::MethodCall { .. }, .. })
        ));
    }
}
