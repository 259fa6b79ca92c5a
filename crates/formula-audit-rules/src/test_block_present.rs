//! Rule to require a `test do` block in every formula.
//!
//! Formulae that are disabled (`disable!` anywhere in the body) are exempt.
//! Only part of the `strict` preset.

use formula_audit_core::{
    find_block, find_node_method_by_name, Diagnostic, FormulaNodes, FormulaRule, Node, NodeError,
    Severity,
};

/// Rule code for test-block-present.
pub const CODE: &str = "FA003";

/// Rule name for test-block-present.
pub const NAME: &str = "test-block-present";

/// Requires formulae to define a `test do` block.
#[derive(Debug, Clone)]
pub struct TestBlockPresent {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for TestBlockPresent {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBlockPresent {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Warning,
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl FormulaRule for TestBlockPresent {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires a `test do` block unless the formula is disabled"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn audit_formula(&self, formula: &FormulaNodes<'_>) -> Result<Vec<Diagnostic>, NodeError> {
        if find_block(formula.body_node, "test").is_some()
            || find_node_method_by_name(formula.body_node, "disable!")
        {
            return Ok(Vec::new());
        }

        let anchor = formula
            .body_node
            .map_or_else(|| formula.class_node.range(), Node::range);

        Ok(vec![Diagnostic::new(
            CODE,
            NAME,
            self.severity,
            anchor,
            "A `test do` test block should be added",
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formula_audit_core::SourceParser;
    use formula_audit_ruby::RubyParser;

    fn audit(src: &str) -> Vec<Diagnostic> {
        let tree = RubyParser::new().parse(src).expect("valid ruby");
        FormulaNodes::collect(&tree)
            .iter()
            .flat_map(|f| TestBlockPresent::new().audit_formula(f).unwrap())
            .collect()
    }

    #[test]
    fn test_missing_block_anchors_at_body() {
        let src = "class Foo < Formula\n  url \"https://example.com/foo\"\n  version \"1.0\"\nend\n";
        let diagnostics = audit(src);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].anchor.slice(src),
            Some("url \"https://example.com/foo\"\n  version \"1.0\"")
        );
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert!(diagnostics[0].edit.is_none());
    }

    #[test]
    fn test_empty_class_anchors_at_name() {
        let src = "class Foo < Formula\nend\n";
        let diagnostics = audit(src);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].anchor.slice(src), Some("Foo"));
        assert_eq!(diagnostics[0].message, "A `test do` test block should be added");
    }

    #[test]
    fn test_present_block() {
        let src = "class Foo < Formula\n  url \"x\"\n  test do\n    system \"true\"\n  end\nend\n";
        assert!(audit(src).is_empty());
    }

    #[test]
    fn test_empty_present_block_is_enough() {
        assert!(audit("class Foo < Formula\n  test do\n  end\nend\n").is_empty());
    }

    #[test]
    fn test_disabled_formula() {
        let src = "class Foo < Formula\n  url \"x\"\n  disable! date: \"2024-01-01\", because: :unmaintained\nend\n";
        assert!(audit(src).is_empty());
    }

    #[test]
    fn test_nested_test_call_does_not_count() {
        let src = "class Foo < Formula\n  def install\n    test do\n    end\n  end\nend\n";
        assert_eq!(audit(src).len(), 1);
    }
}
