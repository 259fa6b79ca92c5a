//! Parser seam between source text and the core [`Node`] tree.
//!
//! `SourceParser` is the extension point for front ends. The analyzer only
//! needs a tree; how it is produced (Tree-sitter, hand-written, cached) is up
//! to the implementation.

use crate::node::Node;
use thiserror::Error;

/// Errors a front end reports for source it cannot turn into a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The source contains a syntax error.
    #[error("syntax error at line {line}, column {column}")]
    Syntax {
        /// Line of the first error (1-indexed).
        line: usize,
        /// Column of the first error (1-indexed, in bytes).
        column: usize,
    },

    /// The parser could not be set up or gave up.
    #[error("parser failure: {0}")]
    Backend(String),
}

/// Turns source text into a [`Node`] tree.
pub trait SourceParser: Send + Sync {
    /// Language identifier (e.g., `"ruby"`).
    fn language_id(&self) -> &'static str;

    /// File extensions this parser handles (e.g., `&[".rb"]`).
    fn extensions(&self) -> &'static [&'static str];

    /// Parses `source` into a tree whose root spans the whole text.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the source is not syntactically valid.
    fn parse(&self, source: &str) -> Result<Node, ParseError>;

    /// Returns true if `path` has one of [`SourceParser::extensions`].
    fn handles(&self, path: &std::path::Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        self.extensions().contains(&ext.as_str())
    }
}

/// Type alias for boxed parser trait objects.
pub type ParserBox = Box<dyn SourceParser>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    struct NullParser;

    impl SourceParser for NullParser {
        fn language_id(&self) -> &'static str {
            "null"
        }
        fn extensions(&self) -> &'static [&'static str] {
            &[".rb"]
        }
        fn parse(&self, _source: &str) -> Result<Node, ParseError> {
            Err(ParseError::Backend("not implemented".into()))
        }
    }

    #[test]
    fn handles_by_extension() {
        let parser = NullParser;
        assert!(parser.handles(Path::new("Formula/foo.rb")));
        assert!(!parser.handles(Path::new("Formula/foo.py")));
        assert!(!parser.handles(Path::new("Formula/README")));
    }

    #[test]
    fn syntax_error_message() {
        let err = ParseError::Syntax { line: 3, column: 7 };
        assert_eq!(err.to_string(), "syntax error at line 3, column 7");
    }
}
