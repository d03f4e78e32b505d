/// A cursor over source text that tracks position.
///
/// Provides peek/advance over characters while keeping the byte offset,
/// line number and column number of the current position.
pub struct Cursor<'src> {
    /// The full source text.
    source: &'src str,
    /// Remaining source text (slice starting at current position).
    rest: &'src str,
    /// Current byte offset from start of source.
    offset: u32,
    /// Current line number (1-indexed).
    line: u32,
    /// Current column number (1-indexed, byte-based).
    column: u32,
}

impl<'src> Cursor<'src> {
    /// Create a new cursor at the start of the source.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Peek at the current character without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Peek at the nth character ahead (0 = current).
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    /// Check if the current character satisfies a predicate.
    #[inline]
    pub fn check(&self, f: impl Fn(char) -> bool) -> bool {
        self.peek().is_some_and(f)
    }

    /// Consume the current character, updating line/column tracking.
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        let len = ch.len_utf8();
        self.rest = &self.rest[len..];
        self.offset += len as u32;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += len as u32;
        }
        Some(ch)
    }

    /// Consume characters while the predicate holds.
    pub fn eat_while(&mut self, f: impl Fn(char) -> bool) {
        while self.check(&f) {
            self.advance();
        }
    }

    /// Source text from `start` to the current offset.
    #[inline]
    pub fn slice_from(&self, start: u32) -> &'src str {
        &self.source[start as usize..self.offset as usize]
    }
}

/// Whether `c` can start an identifier.
#[inline]
pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Whether `c` can continue an identifier.
#[inline]
pub fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_lines_and_columns() {
        let mut cursor = Cursor::new("ab\ncd");
        cursor.advance();
        cursor.advance();
        assert_eq!((cursor.line(), cursor.column()), (1, 3));
        cursor.advance();
        assert_eq!((cursor.line(), cursor.column()), (2, 1));
        assert_eq!(cursor.offset(), 3);
    }

    #[test]
    fn eat_while_and_slice() {
        let mut cursor = Cursor::new("count1 = 2");
        cursor.eat_while(is_ident_continue);
        assert_eq!(cursor.slice_from(0), "count1");
        assert_eq!(cursor.peek(), Some(' '));
    }

    #[test]
    fn eof_after_last_char() {
        let mut cursor = Cursor::new("x");
        assert_eq!(cursor.advance(), Some('x'));
        assert_eq!(cursor.peek(), None);
        assert_eq!(cursor.advance(), None);
        assert_eq!(cursor.offset(), 1);
    }
}
