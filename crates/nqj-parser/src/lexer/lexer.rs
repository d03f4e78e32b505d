//! Main lexer implementation for NotQuiteJava.
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s, copying
//! lexemes into the arena so the source string can be dropped afterwards.

use bumpalo::Bump;
use nqj_core::{ParseError, ParseErrorKind, Span};

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};

/// Lexer for NotQuiteJava source code.
pub struct Lexer<'src, 'ast> {
    cursor: Cursor<'src>,
    arena: &'ast Bump,
    errors: Vec<ParseError>,
}

impl<'src, 'ast> Lexer<'src, 'ast> {
    pub fn new(source: &'src str, arena: &'ast Bump) -> Self {
        Self {
            cursor: Cursor::new(source),
            arena,
            errors: Vec::new(),
        }
    }

    /// Take accumulated errors, leaving an empty vec.
    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Scan the whole input. The last token is always [`TokenKind::Eof`].
    pub fn tokenize(&mut self) -> Vec<Token<'ast>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            tokens.push(token);
            if token.kind == TokenKind::Eof {
                return tokens;
            }
        }
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token<'ast> {
        loop {
            self.cursor.eat_while(|c| c.is_whitespace());

            let line = self.cursor.line();
            let col = self.cursor.column();
            let start = self.cursor.offset();

            let Some(c) = self.cursor.peek() else {
                return Token::new(TokenKind::Eof, "", Span::point(line, col));
            };

            if c == '/' {
                match self.cursor.peek_nth(1) {
                    Some('/') => {
                        self.cursor.eat_while(|c| c != '\n');
                        continue;
                    }
                    Some('*') => {
                        self.skip_block_comment(line, col);
                        continue;
                    }
                    _ => {}
                }
            }

            let kind = if c.is_ascii_digit() {
                self.cursor.eat_while(|c| c.is_ascii_digit());
                TokenKind::IntLiteral
            } else if is_ident_start(c) {
                self.cursor.eat_while(is_ident_continue);
                lookup_keyword(self.cursor.slice_from(start)).unwrap_or(TokenKind::Identifier)
            } else {
                self.scan_operator(c, line, col)
            };

            return self.make_token(kind, line, col, start);
        }
    }

    // =========================================
    // Internal
    // =========================================

    fn make_token(&self, kind: TokenKind, line: u32, col: u32, start: u32) -> Token<'ast> {
        let text = self.cursor.slice_from(start);
        let span = Span::new(line, col, self.cursor.offset() - start);
        Token::new(kind, self.arena.alloc_str(text), span)
    }

    fn skip_block_comment(&mut self, line: u32, col: u32) {
        self.cursor.advance();
        self.cursor.advance();
        loop {
            match self.cursor.advance() {
                None => {
                    self.errors.push(ParseError::new(
                        ParseErrorKind::UnterminatedComment,
                        Span::new(line, col, 2),
                        "block comment is never closed",
                    ));
                    return;
                }
                Some('*') if self.cursor.peek() == Some('/') => {
                    self.cursor.advance();
                    return;
                }
                Some(_) => {}
            }
        }
    }

    fn scan_operator(&mut self, c: char, line: u32, col: u32) -> TokenKind {
        self.cursor.advance();
        match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '<' => TokenKind::Less,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '!' => TokenKind::Bang,
            '=' => {
                if self.cursor.peek() == Some('=') {
                    self.cursor.advance();
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                }
            }
            '&' if self.cursor.peek() == Some('&') => {
                self.cursor.advance();
                TokenKind::AmpAmp
            }
            other => {
                self.errors.push(ParseError::new(
                    ParseErrorKind::UnexpectedChar,
                    Span::new(line, col, other.len_utf8() as u32),
                    format!("unexpected character '{other}'"),
                ));
                TokenKind::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let arena = Bump::new();
        let mut lexer = Lexer::new(source, &arena);
        lexer.tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lex_class_header() {
        assert_eq!(
            kinds("class B extends A {"),
            vec![
                TokenKind::Class,
                TokenKind::Identifier,
                TokenKind::Extends,
                TokenKind::Identifier,
                TokenKind::LeftBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_operators() {
        assert_eq!(
            kinds("a == b = c && !d < 1"),
            vec![
                TokenKind::Identifier,
                TokenKind::EqualEqual,
                TokenKind::Identifier,
                TokenKind::Equal,
                TokenKind::Identifier,
                TokenKind::AmpAmp,
                TokenKind::Bang,
                TokenKind::Identifier,
                TokenKind::Less,
                TokenKind::IntLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("// line\nx /* block\n comment */ y"),
            vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn spans_follow_lines() {
        let arena = Bump::new();
        let mut lexer = Lexer::new("int x;\n  return", &arena);
        let tokens = lexer.tokenize();
        assert_eq!(tokens[3].kind, TokenKind::Return);
        assert_eq!(tokens[3].span, Span::new(2, 3, 6));
        assert_eq!(tokens[3].lexeme, "return");
    }

    #[test]
    fn unexpected_character_is_reported() {
        let arena = Bump::new();
        let mut lexer = Lexer::new("a # b", &arena);
        let tokens = lexer.tokenize();
        assert_eq!(tokens[1].kind, TokenKind::Error);
        let errors = lexer.take_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ParseErrorKind::UnexpectedChar);
    }

    #[test]
    fn unterminated_block_comment() {
        let arena = Bump::new();
        let mut lexer = Lexer::new("x /* never closed", &arena);
        lexer.tokenize();
        assert!(lexer.has_errors());
        assert_eq!(lexer.take_errors()[0].kind, ParseErrorKind::UnterminatedComment);
    }
}
