//! Lazy search for receiver-less calls to a set of selectors.

use crate::node::{Descendants, Node, NodeKind};

/// A call expression `selector(arg1, arg2, ...)` found in a tree.
#[derive(Debug, Clone, Copy)]
pub struct CallSite<'a> {
    /// The call node.
    pub node: &'a Node,
    /// Selector name.
    pub selector: &'a str,
    /// Arguments in source order.
    pub arguments: &'a [Node],
}

impl<'a> CallSite<'a> {
    /// Views `node` as a call site if it is a call without an explicit receiver.
    #[must_use]
    pub fn from_node(node: &'a Node) -> Option<Self> {
        if node.kind() != &NodeKind::Send || node.receiver().is_some() {
            return None;
        }
        Some(Self {
            node,
            selector: node.selector()?,
            arguments: node.arguments(),
        })
    }

    /// Argument at `index`, if the source provided that many.
    #[must_use]
    pub fn argument(&self, index: usize) -> Option<&'a Node> {
        self.arguments.get(index)
    }
}

/// Iterator over every matching call site under a node, at any depth, in
/// source order.
#[derive(Debug)]
pub struct CallSites<'a, 'n> {
    walk: Descendants<'a>,
    selectors: &'n [&'n str],
}

impl<'a, 'n> CallSites<'a, 'n> {
    /// Searches `root` (itself included) for calls to any of `selectors`.
    #[must_use]
    pub fn new(root: &'a Node, selectors: &'n [&'n str]) -> Self {
        Self {
            walk: root.descendants(),
            selectors,
        }
    }
}

impl<'a> Iterator for CallSites<'a, '_> {
    type Item = CallSite<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let selectors = self.selectors;
        self.walk
            .by_ref()
            .filter_map(CallSite::from_node)
            .find(|site| selectors.iter().any(|s| *s == site.selector))
    }
}
