//! Ruby front end using Tree-sitter.

use std::collections::HashMap;
use std::sync::Arc;

use formula_audit_core::{Field, Node, NodeKind, ParseError, SourceParser, TextRange};
use tracing::debug;
use tree_sitter::{Language, Parser};

type TsNode<'t> = tree_sitter::Node<'t>;

/// Parses Ruby source into core [`Node`] trees.
pub struct RubyParser {
    language: Language,
}

impl RubyParser {
    /// Creates a new Ruby parser.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_ruby::LANGUAGE.into(),
        }
    }
}

impl Default for RubyParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceParser for RubyParser {
    fn language_id(&self) -> &'static str {
        "ruby"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".rb"]
    }

    fn parse(&self, source: &str) -> Result<Node, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ParseError::Backend(e.to_string()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ParseError::Backend("parse was cancelled".to_string()))?;
        let root = tree.root_node();

        if root.has_error() {
            let (line, column) = first_error(root);
            debug!("Ruby syntax error at {line}:{column}");
            return Err(ParseError::Syntax { line, column });
        }

        let lower = Lower {
            text: Arc::from(source),
            heredocs: heredoc_contents(root),
        };
        Ok(Node::new(
            NodeKind::Program,
            TextRange::new(0, source.len()),
            Arc::clone(&lower.text),
        )
        .with_children(lower.statements(root)))
    }
}

/// Position (1-indexed) of the first `ERROR` or missing node in preorder.
fn first_error(root: TsNode<'_>) -> (usize, usize) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let at = node.start_position();
            return (at.row + 1, at.column + 1);
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    let at = root.start_position();
    (at.row + 1, at.column + 1)
}

/// Literal segments of each heredoc body, keyed by the start of its `<<~TAG`.
///
/// Bodies are extras placed wherever the parser happened to be, so they are
/// paired with their openers by document order.
fn heredoc_contents(root: TsNode<'_>) -> HashMap<usize, Vec<TextRange>> {
    let mut openers = Vec::new();
    let mut bodies = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "heredoc_beginning" => openers.push(node.start_byte()),
            "heredoc_body" => {
                let mut cursor = node.walk();
                let content: Vec<_> = node
                    .named_children(&mut cursor)
                    .filter(|c| c.kind() == "heredoc_content")
                    .map(range)
                    .collect();
                bodies.push((node.start_byte(), content));
            }
            _ => {}
        }
        let mut cursor = node.walk();
        stack.extend(node.named_children(&mut cursor));
    }
    openers.sort_unstable();
    bodies.sort_unstable_by_key(|(start, _)| *start);
    openers
        .into_iter()
        .zip(bodies.into_iter().map(|(_, content)| content))
        .collect()
}

/// Named children paired with the field they occupy, without comments and
/// heredoc bodies.
fn named_fields(node: TsNode<'_>) -> Vec<(Option<&'static str>, TsNode<'_>)> {
    let mut cursor = node.walk();
    let mut out = Vec::new();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            if child.is_named() && !matches!(child.kind(), "comment" | "heredoc_body") {
                out.push((cursor.field_name(), child));
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

fn range(node: TsNode<'_>) -> TextRange {
    TextRange::new(node.start_byte(), node.end_byte())
}

/// Converts a Tree-sitter tree into core nodes sharing one source handle.
struct Lower {
    text: Arc<str>,
    heredocs: HashMap<usize, Vec<TextRange>>,
}

impl Lower {
    fn make(&self, kind: NodeKind, range: TextRange) -> Node {
        Node::new(kind, range, Arc::clone(&self.text))
    }

    fn node(&self, ts: TsNode<'_>) -> Node {
        match ts.kind() {
            "class" => self.class(ts),
            "call" => self.call(ts),
            "body_statement" | "block_body" => self.body(ts),
            "argument_list" => self
                .make(NodeKind::Args, range(ts))
                .with_children(self.children(ts)),
            "string" => self
                .make(NodeKind::Str, range(ts))
                .with_children(self.children(ts)),
            "string_content" => self.make(NodeKind::StringContent, range(ts)),
            "heredoc_beginning" => self.heredoc(ts),
            "integer" => self.make(NodeKind::Int, range(ts)),
            "true" => self.make(NodeKind::True, range(ts)),
            "false" => self.make(NodeKind::False, range(ts)),
            "nil" => self.make(NodeKind::Nil, range(ts)),
            "constant" | "scope_resolution" => self.make(NodeKind::Const, range(ts)),
            "identifier" => self.make(NodeKind::Identifier, range(ts)),
            "simple_symbol" => self.make(NodeKind::Sym, range(ts)),
            other => self
                .make(NodeKind::Other(other.to_string()), range(ts))
                .with_children(self.children(ts)),
        }
    }

    /// A heredoc is a string spanning its opener, with the body's literal
    /// segments as content.
    fn heredoc(&self, ts: TsNode<'_>) -> Node {
        let content = self
            .heredocs
            .get(&ts.start_byte())
            .map(Vec::as_slice)
            .unwrap_or_default();
        self.make(NodeKind::Str, range(ts)).with_children(
            content
                .iter()
                .map(|r| self.make(NodeKind::StringContent, *r)),
        )
    }

    fn children(&self, ts: TsNode<'_>) -> Vec<Node> {
        named_fields(ts)
            .into_iter()
            .map(|(_, child)| self.node(child))
            .collect()
    }

    /// Converts a statement; a lone identifier is a receiver-less call.
    fn statement(&self, ts: TsNode<'_>) -> Node {
        if ts.kind() == "identifier" {
            self.make(NodeKind::Send, range(ts))
                .with_child(self.make(NodeKind::Identifier, range(ts)).with_field(Field::Method))
        } else {
            self.node(ts)
        }
    }

    fn statements(&self, ts: TsNode<'_>) -> Vec<Node> {
        named_fields(ts)
            .into_iter()
            .map(|(_, child)| self.statement(child))
            .collect()
    }

    fn body(&self, ts: TsNode<'_>) -> Node {
        self.make(NodeKind::Body, range(ts))
            .with_children(self.statements(ts))
    }

    /// Builds a body from loose statements for grammars that inline them.
    fn loose_body(&self, statements: &[TsNode<'_>]) -> Option<Node> {
        let (first, last) = (statements.first()?, statements.last()?);
        Some(
            self.make(
                NodeKind::Body,
                TextRange::new(first.start_byte(), last.end_byte()),
            )
            .with_children(statements.iter().map(|s| self.statement(*s))),
        )
    }

    fn class(&self, ts: TsNode<'_>) -> Node {
        let mut class = self.make(NodeKind::Class, range(ts));
        let mut loose = Vec::new();

        for (field, child) in named_fields(ts) {
            match field {
                Some("name") => {
                    class = class.with_child(self.node(child).with_field(Field::Name));
                }
                Some("superclass") => {
                    let mut cursor = child.walk();
                    let parent = child
                        .named_children(&mut cursor)
                        .find(|c| c.kind() != "comment");
                    if let Some(parent) = parent {
                        class =
                            class.with_child(self.node(parent).with_field(Field::Superclass));
                    }
                }
                Some("body") => {
                    class = class.with_child(self.body(child).with_field(Field::Body));
                }
                _ => loose.push(child),
            }
        }

        if class.body().is_none() {
            if let Some(body) = self.loose_body(&loose) {
                class = class.with_child(body.with_field(Field::Body));
            }
        }
        class
    }

    /// A call becomes a `Send`; a call with a block becomes a `Block`
    /// wrapping that `Send`.
    fn call(&self, ts: TsNode<'_>) -> Node {
        let mut send_children = Vec::new();
        let mut block = None;
        let mut send_end = ts.start_byte();

        for (field, child) in named_fields(ts) {
            let field = match field {
                Some("receiver") => Field::Receiver,
                Some("method") => Field::Method,
                Some("arguments") => Field::Arguments,
                Some("block") => {
                    block = Some(child);
                    continue;
                }
                _ => {
                    send_children.push(self.node(child));
                    continue;
                }
            };
            send_end = send_end.max(child.end_byte());
            send_children.push(self.node(child).with_field(field));
        }

        let Some(block) = block else {
            return self
                .make(NodeKind::Send, range(ts))
                .with_children(send_children);
        };

        let send = self
            .make(NodeKind::Send, TextRange::new(ts.start_byte(), send_end))
            .with_children(send_children)
            .with_field(Field::Call);
        let mut node = self.make(NodeKind::Block, range(ts)).with_child(send);

        let mut loose = Vec::new();
        for (field, child) in named_fields(block) {
            match field {
                Some("body") => {
                    node = node.with_child(self.body(child).with_field(Field::Body));
                }
                Some("parameters") => node = node.with_child(self.node(child)),
                _ if child.kind() == "block_parameters" => {
                    node = node.with_child(self.node(child));
                }
                _ => loose.push(child),
            }
        }
        if node.body().is_none() {
            if let Some(body) = self.loose_body(&loose) {
                node = node.with_child(body.with_field(Field::Body));
            }
        }
        node
    }
}
