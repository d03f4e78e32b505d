//! Token types for the NotQuiteJava lexer.

use nqj_core::Span;
use std::fmt;

/// A token from the source code.
///
/// The lexeme is copied into the arena, so tokens outlive the source string.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'ast> {
    pub kind: TokenKind,
    pub lexeme: &'ast str,
    pub span: Span,
}

impl<'ast> Token<'ast> {
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'ast str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// All token types of NotQuiteJava.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals and names
    // =========================================
    IntLiteral,
    Identifier,

    // =========================================
    // Keywords
    // =========================================
    Class,
    Extends,
    Int,
    Boolean,
    If,
    Else,
    While,
    Return,
    New,
    This,
    Null,
    True,
    False,
    Length,

    // =========================================
    // Operators
    // =========================================
    /// `=`
    Equal,
    /// `==`
    EqualEqual,
    /// `<`
    Less,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `&&`
    AmpAmp,
    /// `!`
    Bang,

    // =========================================
    // Punctuation
    // =========================================
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Semicolon,
    Comma,
    Dot,

    // =========================================
    // Special
    // =========================================
    /// A character the lexer could not recognize.
    Error,
    Eof,
}

impl TokenKind {
    /// Human-readable description for error messages.
    pub fn description(&self) -> &'static str {
        match self {
            TokenKind::IntLiteral => "integer literal",
            TokenKind::Identifier => "identifier",
            TokenKind::Class => "'class'",
            TokenKind::Extends => "'extends'",
            TokenKind::Int => "'int'",
            TokenKind::Boolean => "'boolean'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::While => "'while'",
            TokenKind::Return => "'return'",
            TokenKind::New => "'new'",
            TokenKind::This => "'this'",
            TokenKind::Null => "'null'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Length => "'length'",
            TokenKind::Equal => "'='",
            TokenKind::EqualEqual => "'=='",
            TokenKind::Less => "'<'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::AmpAmp => "'&&'",
            TokenKind::Bang => "'!'",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::LeftBrace => "'{'",
            TokenKind::RightBrace => "'}'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Error => "invalid token",
            TokenKind::Eof => "end of file",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Map a word to its keyword kind.
pub fn lookup_keyword(word: &str) -> Option<TokenKind> {
    Some(match word {
        "class" => TokenKind::Class,
        "extends" => TokenKind::Extends,
        "int" => TokenKind::Int,
        "boolean" => TokenKind::Boolean,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "return" => TokenKind::Return,
        "new" => TokenKind::New,
        "this" => TokenKind::This,
        "null" => TokenKind::Null,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "length" => TokenKind::Length,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_recognized() {
        assert_eq!(lookup_keyword("extends"), Some(TokenKind::Extends));
        assert_eq!(lookup_keyword("boolean"), Some(TokenKind::Boolean));
        assert_eq!(lookup_keyword("printInt"), None);
    }

    #[test]
    fn description_for_errors() {
        assert_eq!(TokenKind::Semicolon.to_string(), "';'");
        assert_eq!(TokenKind::Eof.to_string(), "end of file");
    }
}
