//! Rule to replace deprecated formula base classes with `Formula`.
//!
//! # Detected Patterns
//!
//! - `class Foo < GithubGistFormula`
//! - `class Foo < ScriptFileFormula`
//! - `class Foo < AmazonWebServicesFormula`
//!
//! # Autocorrect
//!
//! The superclass reference is replaced with `Formula`.

use formula_audit_core::{
    class_name, Diagnostic, Edit, FormulaNodes, FormulaRule, NodeError, Severity,
};

/// Rule code for deprecated-superclass.
pub const CODE: &str = "FA001";

/// Rule name for deprecated-superclass.
pub const NAME: &str = "deprecated-superclass";

/// Base classes that formulae must no longer inherit from.
pub const DEPRECATED_CLASSES: &[&str] = &[
    "GithubGistFormula",
    "ScriptFileFormula",
    "AmazonWebServicesFormula",
];

/// Flags formulae inheriting from a deprecated base class.
#[derive(Debug, Clone)]
pub struct DeprecatedSuperclass {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for DeprecatedSuperclass {
    fn default() -> Self {
        Self::new()
    }
}

impl DeprecatedSuperclass {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Error,
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl FormulaRule for DeprecatedSuperclass {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Replaces deprecated formula base classes with `Formula`"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn audit_formula(&self, formula: &FormulaNodes<'_>) -> Result<Vec<Diagnostic>, NodeError> {
        let Some(parent) = formula.parent_class_node else {
            return Ok(Vec::new());
        };

        let parent_name = class_name(parent)?;
        if !DEPRECATED_CLASSES.iter().any(|c| *c == parent_name) {
            return Ok(Vec::new());
        }

        Ok(vec![Diagnostic::new(
            CODE,
            NAME,
            self.severity,
            parent.range(),
            format!("`{parent_name}` is deprecated, use `Formula` instead"),
        )
        .with_edit(Edit::replace(parent.range(), "Formula"))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formula_audit_core::{apply_edits, Node, SourceParser};
    use formula_audit_ruby::RubyParser;

    fn parse(src: &str) -> Node {
        RubyParser::new().parse(src).expect("valid ruby")
    }

    fn audit_first_class(src: &str) -> Vec<Diagnostic> {
        let tree = parse(src);
        let formula = FormulaNodes::from_class(&tree.children()[0]).unwrap();
        DeprecatedSuperclass::new().audit_formula(&formula).unwrap()
    }

    #[test]
    fn test_allows_formula() {
        assert!(audit_first_class("class Foo < Formula\nend\n").is_empty());
    }

    #[test]
    fn test_allows_unrelated_superclass() {
        assert!(audit_first_class("class Foo < Bar\nend\n").is_empty());
        assert!(audit_first_class("class Foo\nend\n").is_empty());
    }

    #[test]
    fn test_name_match_is_exact() {
        assert!(audit_first_class("class Foo < ScriptFileFormulaV2\nend\n").is_empty());
        assert!(audit_first_class("class Foo < MyGithubGistFormula\nend\n").is_empty());
    }

    #[test]
    fn test_detects_script_file_formula() {
        let src = "class Foo < ScriptFileFormula\n  url \"https://example.com/foo\"\nend\n";
        let diagnostics = audit_first_class(src);
        assert_eq!(diagnostics.len(), 1);

        let d = &diagnostics[0];
        assert_eq!(d.code, CODE);
        assert_eq!(d.anchor.slice(src), Some("ScriptFileFormula"));
        assert_eq!(d.message, "`ScriptFileFormula` is deprecated, use `Formula` instead");
        assert_eq!(d.edit, Some(Edit::replace(d.anchor, "Formula")));

        let fixed = apply_edits(src, d.edit.as_slice()).unwrap();
        assert_eq!(fixed, "class Foo < Formula\n  url \"https://example.com/foo\"\nend\n");
    }

    #[test]
    fn test_detects_every_deprecated_class() {
        for parent in DEPRECATED_CLASSES {
            let diagnostics = audit_first_class(&format!("class Foo < {parent}\nend\n"));
            assert_eq!(diagnostics.len(), 1, "{parent}");
        }
    }

    #[test]
    fn test_non_constant_superclass_is_contract_violation() {
        let tree = parse("class Foo < Struct.new(:a)\nend\n");
        let formula = FormulaNodes::from_class(&tree.children()[0]).unwrap();
        assert!(DeprecatedSuperclass::new().audit_formula(&formula).is_err());
    }

    #[test]
    fn test_custom_severity() {
        let rule = DeprecatedSuperclass::new().severity(Severity::Warning);
        let tree = parse("class Foo < GithubGistFormula\nend\n");
        let formula = FormulaNodes::from_class(&tree.children()[0]).unwrap();
        let diagnostics = rule.audit_formula(&formula).unwrap();
        assert_eq!(diagnostics[0].severity, Severity::Warning);
    }
}
