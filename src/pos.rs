//! Source positions and ranges.
//!
//! Positions are 1-based `(line, col)` pairs rather than byte offsets: the
//! kernel's diagnostics are meant to be shown against the user's own source
//! text, and keeping the column space in this form means no downstream
//! consumer has to re-scan the source to turn an offset back into something
//! a human can read.

use std::cmp::{max, min};
use std::fmt;

/// A 1-based line/column position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(line: usize, col: usize) -> Position {
        Position { line, col }
    }

    /// The position before any input has been consumed.
    pub const fn start() -> Position {
        Position::new(1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A half-open range `[start, end)` in column space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub const fn new(start: Position, end: Position) -> Range {
        Range { start, end }
    }

    /// A zero-width range at a single position, e.g. for `EOF`.
    pub const fn zero(at: Position) -> Range {
        Range::new(at, at)
    }

    /// The smallest range containing both `self` and `other`.
    pub fn to(self, other: Range) -> Range {
        Range::new(min(self.start, other.start), max(self.end, other.end))
    }

    /// `true` iff `self` fully contains `inner` (used to check the parse
    /// range-nesting property of spec.md §8.2).
    pub fn contains(&self, inner: &Range) -> bool {
        self.start <= inner.start && inner.end <= self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
