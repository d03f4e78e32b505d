//! Parser state and token-stream helpers.

use bumpalo::Bump;
use nqj_core::{ParseError, ParseErrorKind, ParseErrors, Span};

use crate::ast::{Expr, NodeId, Program, Stmt};
use crate::lexer::{Lexer, Token, TokenKind};

/// Recursive-descent parser for NotQuiteJava.
///
/// Parsing stops at the first syntax error; lexer errors are reported
/// together with it.
pub struct Parser<'ast> {
    pub(super) tokens: Vec<Token<'ast>>,
    pub(super) position: usize,
    pub(super) arena: &'ast Bump,
    next_id: u32,
}

impl<'ast> Parser<'ast> {
    /// Tokenize `source` and prepare to parse it.
    fn new(source: &str, arena: &'ast Bump) -> Result<Self, ParseErrors> {
        let mut lexer = Lexer::new(source, arena);
        let tokens = lexer.tokenize();
        if lexer.has_errors() {
            let mut errors = ParseErrors::new();
            for error in lexer.take_errors() {
                errors.push(error);
            }
            return Err(errors);
        }
        Ok(Self {
            tokens,
            position: 0,
            arena,
            next_id: 0,
        })
    }

    /// Parse a complete program.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(source: &str, arena: &'ast Bump) -> Result<Program<'ast>, ParseErrors> {
        let mut parser = Self::new(source, arena)?;
        let program = parser.parse_program()?;
        Ok(program)
    }

    /// Parse a single expression followed by end of input.
    pub fn expression(source: &str, arena: &'ast Bump) -> Result<&'ast Expr<'ast>, ParseErrors> {
        let mut parser = Self::new(source, arena)?;
        let expr = parser.parse_expr(0)?;
        parser.expect(TokenKind::Eof)?;
        Ok(expr)
    }

    /// Parse a single statement followed by end of input.
    pub fn statement(source: &str, arena: &'ast Bump) -> Result<Stmt<'ast>, ParseErrors> {
        let mut parser = Self::new(source, arena)?;
        let stmt = parser.parse_block_item()?;
        parser.expect(TokenKind::Eof)?;
        Ok(stmt)
    }

    // =========================================
    // Token stream
    // =========================================

    /// Current token; the stream always ends in `Eof`, which is never consumed.
    pub(super) fn peek(&self) -> &Token<'ast> {
        self.peek_nth(0)
    }

    pub(super) fn peek_nth(&self, n: usize) -> &Token<'ast> {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.position + n).min(last)]
    }

    pub(super) fn advance(&mut self) -> Token<'ast> {
        let token = *self.peek();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub(super) fn eat(&mut self, kind: TokenKind) -> Option<Token<'ast>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub(super) fn expect(&mut self, kind: TokenKind) -> Result<Token<'ast>, ParseError> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let token = *self.peek();
        if token.kind == TokenKind::Eof {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedEof,
                token.span,
                format!("expected {}, found end of file", kind.description()),
            ));
        }
        Err(ParseError::expected_token(
            token.span,
            kind.description(),
            &describe(&token),
        ))
    }

    /// Span of the most recently consumed token.
    pub(super) fn previous_span(&self) -> Span {
        self.tokens
            .get(self.position.saturating_sub(1))
            .map(|t| t.span)
            .unwrap_or_default()
    }

    /// Hand out the next node identity.
    pub(super) fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(super) fn node_count(&self) -> u32 {
        self.next_id
    }
}

/// Describe a token for "found ..." messages.
pub(super) fn describe(token: &Token<'_>) -> String {
    match token.kind {
        TokenKind::Identifier | TokenKind::IntLiteral => format!("'{}'", token.lexeme),
        kind => kind.description().to_string(),
    }
}
