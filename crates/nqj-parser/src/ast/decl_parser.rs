//! Declaration parsing: program, classes, functions and parameters.

use super::parser::Parser;
use crate::ast::{
    ClassDecl, FunctionDecl, Ident, ParseError, Program, TypeExpr, VarDecl,
};
use crate::lexer::TokenKind;
use bumpalo::collections::Vec as BVec;

impl<'ast> Parser<'ast> {
    /// Parse a whole program.
    ///
    /// Grammar: `(CLASS | FUNCTION)* EOF`
    pub fn parse_program(&mut self) -> Result<Program<'ast>, ParseError> {
        let mut classes = BVec::new_in(self.arena);
        let mut functions = BVec::new_in(self.arena);

        while !self.check(TokenKind::Eof) {
            if self.check(TokenKind::Class) {
                classes.push(self.parse_class()?);
            } else {
                let return_type = self.parse_type()?;
                let name = self.parse_ident()?;
                functions.push(self.parse_function_rest(return_type, name)?);
            }
        }

        Ok(Program {
            classes: classes.into_bump_slice(),
            functions: functions.into_bump_slice(),
            node_count: self.node_count(),
        })
    }

    /// Parse a class declaration.
    ///
    /// Grammar: `'class' IDENTIFIER ('extends' IDENTIFIER)? '{' MEMBER* '}'`
    pub fn parse_class(&mut self) -> Result<ClassDecl<'ast>, ParseError> {
        let start = self.expect(TokenKind::Class)?.span;
        let id = self.next_id();
        let name = self.parse_ident()?;
        let extends = if self.eat(TokenKind::Extends).is_some() {
            Some(self.parse_ident()?)
        } else {
            None
        };

        self.expect(TokenKind::LeftBrace)?;
        let mut fields = BVec::new_in(self.arena);
        let mut methods = BVec::new_in(self.arena);
        while !self.check(TokenKind::RightBrace) {
            let member_start = self.peek().span;
            let ty = self.parse_type()?;
            let member_name = self.parse_ident()?;
            if self.check(TokenKind::LeftParen) {
                methods.push(self.parse_function_rest(ty, member_name)?);
            } else {
                let end = self.expect(TokenKind::Semicolon)?.span;
                let field_id = self.next_id();
                fields.push(VarDecl {
                    id: field_id,
                    ty,
                    name: member_name,
                    span: member_start.merge(end),
                });
            }
        }
        let end = self.expect(TokenKind::RightBrace)?.span;

        Ok(ClassDecl {
            id,
            name,
            extends,
            fields: fields.into_bump_slice(),
            methods: methods.into_bump_slice(),
            span: start.merge(end),
        })
    }

    /// Parse the parameter list and body of a function whose return type and
    /// name were already consumed.
    ///
    /// Grammar: `'(' (PARAM (',' PARAM)*)? ')' BLOCK`
    fn parse_function_rest(
        &mut self,
        return_type: &'ast TypeExpr<'ast>,
        name: Ident<'ast>,
    ) -> Result<FunctionDecl<'ast>, ParseError> {
        let id = self.next_id();
        self.expect(TokenKind::LeftParen)?;
        let mut params = BVec::new_in(self.arena);
        if !self.check(TokenKind::RightParen) {
            loop {
                params.push(self.parse_param()?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen)?;
        let body = self.parse_block()?;
        let span = return_type.span.merge(body.span);

        Ok(FunctionDecl {
            id,
            return_type,
            name,
            params: params.into_bump_slice(),
            body,
            span,
        })
    }

    fn parse_param(&mut self) -> Result<VarDecl<'ast>, ParseError> {
        let ty = self.parse_type()?;
        let name = self.parse_ident()?;
        let id = self.next_id();
        Ok(VarDecl {
            id,
            ty,
            name,
            span: ty.span.merge(name.span),
        })
    }

    pub(super) fn parse_ident(&mut self) -> Result<Ident<'ast>, ParseError> {
        let token = *self.peek();
        if token.kind != TokenKind::Identifier {
            return Err(ParseError::expected_identifier(
                token.span,
                &super::parser::describe(&token),
            ));
        }
        self.advance();
        Ok(Ident::new(token.lexeme, token.span))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use bumpalo::Bump;

    #[test]
    fn class_members_in_order() {
        let arena = Bump::new();
        let source = r#"
            class List extends Tail {
                int head;
                Tail tail;
                int add(int elem) { return 1; }
                int getSize() { return 1; }
            }
        "#;
        let program = Parser::parse(source, &arena).unwrap();
        let class = &program.classes[0];
        assert_eq!(class.name.name, "List");
        assert_eq!(class.fields.len(), 2);
        assert_eq!(class.fields[1].ty.to_string(), "Tail");
        assert_eq!(class.methods.len(), 2);
        assert_eq!(class.methods[0].params[0].name.name, "elem");
        assert!(class.method("getSize").is_some());
        assert!(class.field("tail").is_some());
    }

    #[test]
    fn function_parameters() {
        let arena = Bump::new();
        let program =
            Parser::parse("int f(int a, boolean b, A[] c) { return a; }", &arena).unwrap();
        let f = program.functions[0];
        let names: Vec<_> = f.params.iter().map(|p| p.name.name).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(f.params[2].ty.to_string(), "A[]");
    }

    #[test]
    fn missing_class_name() {
        let arena = Bump::new();
        let errors = Parser::parse("class { }", &arena).unwrap_err();
        assert_eq!(
            errors.iter().next().map(|e| e.kind),
            Some(ParseErrorKind::ExpectedIdentifier)
        );
    }

    #[test]
    fn unexpected_eof_in_class() {
        let arena = Bump::new();
        let errors = Parser::parse("class A { int x;", &arena).unwrap_err();
        assert_eq!(errors.len(), 1);
    }
}
