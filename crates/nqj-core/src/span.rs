//! Source location tracking for diagnostics.
//!
//! Provides [`Span`] to track where syntax nodes and errors occur in source code.

use std::fmt;

/// A span of source code, represented by its starting position.
///
/// Diagnostics render the `line:col` of the span; the length is kept for
/// caret underlining in [`display_with_source`](crate::ParseError::display_with_source).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// Create a new span from a line, column, and length.
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// Create a zero-length span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self { line, col, len: 0 }
    }

    /// Whether this span is empty (zero length).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The length of this span in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Extend this span so it also covers `other`.
    ///
    /// Spans on different lines keep the start of `self`; the length is only
    /// meaningful for single-line spans.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        if self.line == other.line {
            let start = self.col.min(other.col);
            let end = (other.col + other.len).max(self.col + self.len);
            Span::new(self.line, start, end - start)
        } else {
            Span::new(self.line, self.col, self.len + other.len)
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_line_and_column() {
        assert_eq!(Span::new(3, 15, 5).to_string(), "3:15");
    }

    #[test]
    fn point_is_empty() {
        assert!(Span::point(1, 5).is_empty());
        assert!(!Span::new(1, 5, 2).is_empty());
    }

    #[test]
    fn merge_covers_both_on_same_line() {
        let merged = Span::new(1, 5, 3).merge(Span::new(1, 10, 3));
        assert_eq!(merged, Span::new(1, 5, 8));
    }

    #[test]
    fn merge_across_lines_keeps_start() {
        let merged = Span::new(1, 5, 10).merge(Span::new(3, 1, 5));
        assert_eq!((merged.line, merged.col), (1, 5));
    }
}
