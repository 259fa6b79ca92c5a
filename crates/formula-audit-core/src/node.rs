//! Immutable syntax tree handed to rules.
//!
//! Parsers build [`Node`] trees once per source file. Every node keeps a
//! shared handle on the original text, so [`Node::source`] is a slice of it
//! and never a re-rendering.

use crate::range::TextRange;
use std::sync::Arc;
use thiserror::Error;

/// Kind tag of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Root of a file.
    Program,
    /// `class Name < Superclass ... end`
    Class,
    /// Constant reference, possibly scoped (`Foo::Bar`).
    Const,
    /// Sequence of statements (class, method or block body).
    Body,
    /// Call with an attached `do ... end` or `{ ... }` block.
    Block,
    /// Method call.
    Send,
    /// Argument list of a call.
    Args,
    /// String literal.
    Str,
    /// Literal text segment inside a string.
    StringContent,
    /// Integer literal.
    Int,
    /// `true`
    True,
    /// `false`
    False,
    /// `nil`
    Nil,
    /// Symbol literal.
    Sym,
    /// Local variable or method name.
    Identifier,
    /// Any construct rules do not inspect directly, tagged with the parser's kind.
    Other(String),
}

impl NodeKind {
    /// Returns the kind name as used in messages.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Program => "program",
            Self::Class => "class",
            Self::Const => "const",
            Self::Body => "body",
            Self::Block => "block",
            Self::Send => "send",
            Self::Args => "args",
            Self::Str => "str",
            Self::StringContent => "string_content",
            Self::Int => "int",
            Self::True => "true",
            Self::False => "false",
            Self::Nil => "nil",
            Self::Sym => "sym",
            Self::Identifier => "identifier",
            Self::Other(kind) => kind,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slot a node fills in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Class name constant.
    Name,
    /// Superclass reference of a class.
    Superclass,
    /// Body of a class or block.
    Body,
    /// Explicit receiver of a call.
    Receiver,
    /// Selector of a call.
    Method,
    /// Argument list of a call.
    Arguments,
    /// Call that introduces a block.
    Call,
}

/// Raised when a node of the wrong kind is passed where a specific kind is
/// required. This is a bug in the caller, not a finding about the formula.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// The node kind did not match the required one.
    #[error("expected {expected} node, found {found} at {range}")]
    UnexpectedKind {
        /// Required kind.
        expected: &'static str,
        /// Kind actually passed.
        found: String,
        /// Range of the offending node.
        range: TextRange,
    },
}

impl NodeError {
    pub(crate) fn unexpected(expected: &'static str, node: &Node) -> Self {
        Self::UnexpectedKind {
            expected,
            found: node.kind().to_string(),
            range: node.range(),
        }
    }
}

/// A syntax tree node.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    field: Option<Field>,
    range: TextRange,
    text: Arc<str>,
    children: Vec<Node>,
}

impl Node {
    /// Creates a leaf node spanning `range` of `text`.
    #[must_use]
    pub fn new(kind: NodeKind, range: TextRange, text: Arc<str>) -> Self {
        Self {
            kind,
            field: None,
            range,
            text,
            children: Vec::new(),
        }
    }

    /// Tags this node with the slot it fills in its parent.
    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.field = Some(field);
        self
    }

    /// Appends a child.
    #[must_use]
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Appends several children.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    /// Kind tag.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Slot this node fills in its parent, if any.
    #[must_use]
    pub fn field(&self) -> Option<Field> {
        self.field
    }

    /// Byte range in the original source.
    #[must_use]
    pub fn range(&self) -> TextRange {
        self.range
    }

    /// Ordered children.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// First child filling `field`.
    #[must_use]
    pub fn child(&self, field: Field) -> Option<&Node> {
        self.children.iter().find(|c| c.field == Some(field))
    }

    /// Source text spanned by this node.
    #[must_use]
    pub fn source(&self) -> &str {
        self.range.slice(&self.text).unwrap_or_default()
    }

    /// The whole source text this tree was parsed from.
    #[must_use]
    pub fn full_source(&self) -> &str {
        &self.text
    }

    /// Body of a class or block.
    #[must_use]
    pub fn body(&self) -> Option<&Node> {
        self.child(Field::Body)
    }

    /// Explicit receiver of a call.
    #[must_use]
    pub fn receiver(&self) -> Option<&Node> {
        self.child(Field::Receiver)
    }

    /// Selector name of a call, or of the call introducing a block.
    #[must_use]
    pub fn selector(&self) -> Option<&str> {
        match self.kind {
            NodeKind::Send => self.child(Field::Method).map(Node::source),
            NodeKind::Block => self.child(Field::Call).and_then(Node::selector),
            _ => None,
        }
    }

    /// Arguments of a call. Empty for anything that is not a call.
    #[must_use]
    pub fn arguments(&self) -> &[Node] {
        if self.kind != NodeKind::Send {
            return &[];
        }
        self.child(Field::Arguments)
            .map(Node::children)
            .unwrap_or_default()
    }

    /// Literal content of a string, without delimiters or interpolations.
    #[must_use]
    pub fn string_content(&self) -> Option<String> {
        if self.kind != NodeKind::Str {
            return None;
        }
        Some(
            self.children
                .iter()
                .filter(|c| c.kind == NodeKind::StringContent)
                .map(Node::source)
                .collect(),
        )
    }

    /// Value of an integer literal.
    #[must_use]
    pub fn int_value(&self) -> Option<i64> {
        if self.kind != NodeKind::Int {
            return None;
        }
        let digits: String = self.source().chars().filter(|c| *c != '_').collect();
        let lower = digits.to_ascii_lowercase();
        let (radix, body) = if let Some(rest) = lower.strip_prefix("0x") {
            (16, rest)
        } else if let Some(rest) = lower.strip_prefix("0b") {
            (2, rest)
        } else if let Some(rest) = lower.strip_prefix("0o") {
            (8, rest)
        } else if let Some(rest) = lower.strip_prefix("0d") {
            (10, rest)
        } else if lower.len() > 1 && lower.starts_with('0') {
            (8, &lower[1..])
        } else {
            (10, lower.as_str())
        };
        i64::from_str_radix(body, radix).ok()
    }

    /// Compares two subtrees by shape: kinds, fields and leaf text must
    /// match, offsets are ignored.
    #[must_use]
    pub fn shape_eq(&self, other: &Self) -> bool {
        if self.kind != other.kind
            || self.field != other.field
            || self.children.len() != other.children.len()
        {
            return false;
        }
        if self.children.is_empty() {
            return self.source() == other.source();
        }
        self.children
            .iter()
            .zip(&other.children)
            .all(|(a, b)| a.shape_eq(b))
    }

    /// Depth-first, pre-order walk over this node and all its descendants.
    #[must_use]
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// First node in depth-first order (starting with `self`) matching `predicate`.
    pub fn find<P>(&self, mut predicate: P) -> Option<&Node>
    where
        P: FnMut(&Node) -> bool,
    {
        self.descendants().find(|n| predicate(n))
    }
}

/// Iterator returned by [`Node::descendants`].
///
/// Uses an explicit stack so deeply nested trees cannot overflow the call stack.
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Hand-built trees for unit tests that must not depend on a parser.

    use super::*;

    /// Builds nodes over one shared source string.
    pub struct TreeBuilder {
        text: Arc<str>,
    }

    impl TreeBuilder {
        pub fn new(source: &str) -> Self {
            Self {
                text: Arc::from(source),
            }
        }

        /// Node spanning the `nth` occurrence (0-based) of `needle`.
        pub fn nth(&self, kind: NodeKind, needle: &str, nth: usize) -> Node {
            let start = self
                .text
                .match_indices(needle)
                .nth(nth)
                .map(|(i, _)| i)
                .unwrap_or_else(|| panic!("{needle:?} not found"));
            Node::new(
                kind,
                TextRange::new(start, start + needle.len()),
                Arc::clone(&self.text),
            )
        }

        /// Node spanning the first occurrence of `needle`.
        pub fn at(&self, kind: NodeKind, needle: &str) -> Node {
            self.nth(kind, needle, 0)
        }

        /// `selector(args...)` call spanning `needle`, without a receiver.
        pub fn send(&self, needle: &str, selector: &str, args: Vec<Node>) -> Node {
            let call = self.at(NodeKind::Send, needle);
            let start = call.range().start;
            let method = Node::new(
                NodeKind::Identifier,
                TextRange::new(start, start + selector.len()),
                Arc::clone(&self.text),
            )
            .with_field(Field::Method);
            let mut call = call.with_child(method);
            if !args.is_empty() {
                let first = args[0].range().start;
                let last = args[args.len() - 1].range().end;
                call = call.with_child(
                    Node::new(
                        NodeKind::Args,
                        TextRange::new(first, last),
                        Arc::clone(&self.text),
                    )
                    .with_field(Field::Arguments)
                    .with_children(args),
                );
            }
            call
        }

        /// String literal spanning `needle` (quotes included) with one content segment.
        pub fn string(&self, needle: &str) -> Node {
            let node = self.at(NodeKind::Str, needle);
            let r = node.range();
            let content = Node::new(
                NodeKind::StringContent,
                TextRange::new(r.start + 1, r.end - 1),
                Arc::clone(&self.text),
            );
            node.with_child(content)
        }
    }
}
