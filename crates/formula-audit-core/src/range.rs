//! Byte ranges into formula source and the derivations rules need.
//!
//! Ranges never change the source. Helpers that "extend" a range return a
//! new, wider [`TextRange`] that can then be handed to an [`Edit`](crate::Edit).

use serde::{Deserialize, Serialize};

/// Half-open byte range `start..end` into the original source text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct TextRange {
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
}

impl TextRange {
    /// Creates a new range. `start` and `end` are swapped if given in reverse.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Creates a zero-width range at `offset`.
    #[must_use]
    pub const fn at(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Length in bytes.
    #[must_use]
    pub const fn len(self) -> usize {
        self.end - self.start
    }

    /// Returns true for zero-width ranges.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Returns true if the two ranges share at least one byte.
    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns the slice of `source` covered by this range, if it is in bounds
    /// and on char boundaries.
    #[must_use]
    pub fn slice(self, source: &str) -> Option<&str> {
        source.get(self.start..self.end)
    }
}

impl std::fmt::Display for TextRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl From<std::ops::Range<usize>> for TextRange {
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}

/// Which side(s) of a range to extend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Only towards the start of the source.
    Left,
    /// Only towards the end of the source.
    Right,
    /// Both directions.
    Both,
}

impl Side {
    const fn left(self) -> bool {
        matches!(self, Self::Left | Self::Both)
    }

    const fn right(self) -> bool {
        matches!(self, Self::Right | Self::Both)
    }
}

/// Extends `range` over adjacent whitespace (spaces, tabs, newlines).
///
/// Offsets outside `source` are clamped to its length.
#[must_use]
pub fn range_with_surrounding_space(source: &str, range: TextRange, side: Side) -> TextRange {
    let bytes = source.as_bytes();
    let mut start = range.start.min(bytes.len());
    let mut end = range.end.min(bytes.len());

    if side.left() {
        while start > 0 && bytes[start - 1].is_ascii_whitespace() {
            start -= 1;
        }
    }
    if side.right() {
        while end < bytes.len() && bytes[end].is_ascii_whitespace() {
            end += 1;
        }
    }

    TextRange::new(start, end)
}

/// Extends `range` over one directly adjacent separating comma.
///
/// With [`Side::Both`] a comma on the left is preferred; the right side is
/// only consumed when there is none, so a middle argument never loses both
/// of its separators.
#[must_use]
pub fn range_with_surrounding_comma(source: &str, range: TextRange, side: Side) -> TextRange {
    let bytes = source.as_bytes();
    let start = range.start.min(bytes.len());
    let end = range.end.min(bytes.len());

    if side.left() && start > 0 && bytes[start - 1] == b',' {
        return TextRange::new(start - 1, end);
    }
    if side.right() && end < bytes.len() && bytes[end] == b',' {
        return TextRange::new(start, end + 1);
    }

    TextRange::new(start, end)
}
