//! Structural summary of a formula class and the lookups rules share.

use crate::node::{Field, Node, NodeError, NodeKind};

/// Superclass names that mark a class as a formula.
pub const FORMULA_SUPERCLASSES: &[&str] = &[
    "Formula",
    "GithubGistFormula",
    "ScriptFileFormula",
    "AmazonWebServicesFormula",
];

/// The parts of one formula class that rules inspect.
///
/// Borrowed from a tree owned by the caller; build one per formula, run the
/// rules, drop it.
#[derive(Debug, Clone, Copy)]
pub struct FormulaNodes<'a> {
    /// The whole `class ... end` declaration.
    pub node: &'a Node,
    /// The class name constant.
    pub class_node: &'a Node,
    /// The superclass reference, if the class declares one.
    pub parent_class_node: Option<&'a Node>,
    /// The class body, absent for an empty class.
    pub body_node: Option<&'a Node>,
}

impl<'a> FormulaNodes<'a> {
    /// Summarises a class declaration.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError`] if `node` is not a class or has no name.
    pub fn from_class(node: &'a Node) -> Result<Self, NodeError> {
        if node.kind() != &NodeKind::Class {
            return Err(NodeError::unexpected("class", node));
        }
        let class_node = node
            .child(Field::Name)
            .ok_or_else(|| NodeError::unexpected("named class", node))?;

        Ok(Self {
            node,
            class_node,
            parent_class_node: node.child(Field::Superclass),
            body_node: node.body(),
        })
    }

    /// Collects every formula class under `root`, in source order.
    ///
    /// A class is a formula when its superclass is a constant named in
    /// [`FORMULA_SUPERCLASSES`].
    #[must_use]
    pub fn collect(root: &'a Node) -> Vec<Self> {
        root.descendants()
            .filter(|n| n.kind() == &NodeKind::Class)
            .filter_map(|n| Self::from_class(n).ok())
            .filter(Self::is_formula)
            .collect()
    }

    /// Returns true if the superclass marks this class as a formula.
    #[must_use]
    pub fn is_formula(&self) -> bool {
        self.parent_class_node
            .and_then(|n| class_name(n).ok())
            .is_some_and(|name| FORMULA_SUPERCLASSES.iter().any(|c| *c == name))
    }

    /// Name of the formula class.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.class_node.source()
    }

    /// The source text the formula was parsed from.
    #[must_use]
    pub fn source(&self) -> &'a str {
        self.node.full_source()
    }
}

/// Renders a constant reference as its bare name (`Formula`, `Foo::Bar`).
///
/// # Errors
///
/// Returns [`NodeError`] if `node` is not a constant reference.
pub fn class_name(node: &Node) -> Result<&str, NodeError> {
    if node.kind() != &NodeKind::Const {
        return Err(NodeError::unexpected("const", node));
    }
    Ok(node.source().trim_start_matches("::"))
}

/// First direct child of `body` that is a block introduced by `selector`.
#[must_use]
pub fn find_block<'a>(body: Option<&'a Node>, selector: &str) -> Option<&'a Node> {
    body?
        .children()
        .iter()
        .find(|n| n.kind() == &NodeKind::Block && n.selector() == Some(selector))
}

/// Returns true if a call to `method` appears anywhere under `node`.
#[must_use]
pub fn find_node_method_by_name(node: Option<&Node>, method: &str) -> bool {
    node.is_some_and(|n| {
        n.descendants()
            .any(|d| d.kind() == &NodeKind::Send && d.selector() == Some(method))
    })
}
