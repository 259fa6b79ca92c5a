//! Text edits proposed by rules and the merge step that applies them.
//!
//! Rules only describe edits. Applying them happens once per source, after
//! all rules ran: edits are sorted by start offset, checked for conflicts and
//! spliced into a fresh string.

use crate::range::TextRange;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A pure description of a text transformation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Edit {
    /// Replace the text in `range` with `text`.
    Replace {
        /// Range to replace.
        range: TextRange,
        /// Replacement text.
        text: String,
    },
    /// Delete the text in `range`.
    Remove {
        /// Range to delete.
        range: TextRange,
    },
    /// Insert `text` at byte offset `at`.
    Insert {
        /// Insertion offset.
        at: usize,
        /// Text to insert.
        text: String,
    },
}

impl Edit {
    /// Creates a replacement edit.
    #[must_use]
    pub fn replace(range: TextRange, text: impl Into<String>) -> Self {
        Self::Replace {
            range,
            text: text.into(),
        }
    }

    /// Creates a removal edit.
    #[must_use]
    pub const fn remove(range: TextRange) -> Self {
        Self::Remove { range }
    }

    /// Creates an insertion edit.
    #[must_use]
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::Insert {
            at,
            text: text.into(),
        }
    }

    /// The source range this edit consumes (zero-width for insertions).
    #[must_use]
    pub const fn range(&self) -> TextRange {
        match self {
            Self::Replace { range, .. } | Self::Remove { range } => *range,
            Self::Insert { at, .. } => TextRange::at(*at),
        }
    }

    /// The text written in place of [`Edit::range`].
    #[must_use]
    pub fn replacement(&self) -> &str {
        match self {
            Self::Replace { text, .. } | Self::Insert { text, .. } => text,
            Self::Remove { .. } => "",
        }
    }

    /// Returns true if both edits cannot be applied together.
    ///
    /// Intersecting ranges conflict, and so do two insertions at the same
    /// offset since their relative order would be arbitrary.
    #[must_use]
    pub fn conflicts_with(&self, other: &Self) -> bool {
        let (a, b) = (self.range(), other.range());
        a.overlaps(b) || (a.is_empty() && b.is_empty() && a.start == b.start)
    }
}

impl std::fmt::Display for Edit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Replace { range, text } => write!(f, "replace {range} with {text:?}"),
            Self::Remove { range } => write!(f, "remove {range}"),
            Self::Insert { at, text } => write!(f, "insert {text:?} at {at}"),
        }
    }
}

/// Errors raised while applying edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// An edit reaches past the end of the source.
    #[error("edit range {range} is out of bounds for source of {len} bytes")]
    OutOfBounds {
        /// Offending range.
        range: TextRange,
        /// Source length.
        len: usize,
    },

    /// An edit boundary splits a UTF-8 character.
    #[error("edit boundary {offset} is not on a char boundary")]
    NotCharBoundary {
        /// Offending offset.
        offset: usize,
    },

    /// Two edits touch the same text.
    #[error("edits at {first} and {second} overlap")]
    Overlap {
        /// Range of the earlier edit.
        first: TextRange,
        /// Range of the later edit.
        second: TextRange,
    },
}

/// Edits split into a conflict-free set and the ones that had to be dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditPlan {
    /// Edits that can be applied together, sorted by range start.
    pub accepted: Vec<Edit>,
    /// Edits that conflict with an accepted edit.
    pub rejected: Vec<Edit>,
}

/// Sorts `edits` and keeps every edit that does not conflict with an
/// earlier accepted one. Exact duplicates collapse into one.
#[must_use]
pub fn plan_edits(mut edits: Vec<Edit>) -> EditPlan {
    edits.sort_by_key(Edit::range);
    edits.dedup();

    let mut plan = EditPlan::default();
    for edit in edits {
        if plan.accepted.iter().any(|a| a.conflicts_with(&edit)) {
            plan.rejected.push(edit);
        } else {
            plan.accepted.push(edit);
        }
    }
    plan
}

/// Applies `edits` to `source` and returns the rewritten text.
///
/// # Errors
///
/// Fails without producing partial output if an edit is out of bounds, splits
/// a character, or conflicts with another edit.
pub fn apply_edits(source: &str, edits: &[Edit]) -> Result<String, EditError> {
    let mut sorted: Vec<&Edit> = edits.iter().collect();
    sorted.sort_by_key(|e| e.range());

    for edit in &sorted {
        let range = edit.range();
        if range.end > source.len() {
            return Err(EditError::OutOfBounds {
                range,
                len: source.len(),
            });
        }
        for offset in [range.start, range.end] {
            if !source.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary { offset });
            }
        }
    }

    for pair in sorted.windows(2) {
        if pair[0].conflicts_with(pair[1]) {
            return Err(EditError::Overlap {
                first: pair[0].range(),
                second: pair[1].range(),
            });
        }
    }

    let mut output = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in sorted {
        let range = edit.range();
        output.push_str(&source[cursor..range.start]);
        output.push_str(edit.replacement());
        cursor = range.end;
    }
    output.push_str(&source[cursor..]);

    Ok(output)
}
