//! Rule to check the contents of a formula's `test do` block.
//!
//! # Detected Patterns
//!
//! - An empty `test do ... end` block
//! - A block whose only statement is `true`
//! - Hard-coded `/usr/local/bin` or `/usr/local/sbin` passed to `system`,
//!   `shell_output` or `pipe_output`
//! - `shell_output(cmd, 0)`, where `0` is already the expected exit status
//!
//! # Autocorrect
//!
//! - `/usr/local/bin` becomes `#{bin}`, `/usr/local/sbin` becomes `#{sbin}`
//! - The redundant `0` is removed together with its leading comma

use std::sync::LazyLock;

use formula_audit_core::{
    find_block, range_with_surrounding_comma, range_with_surrounding_space, CallSite, CallSites,
    Diagnostic, Edit, FormulaNodes, FormulaRule, NodeError, NodeKind, Severity, Side,
    TextRange,
};
use regex::Regex;

/// Rule code for test-block-quality.
pub const CODE: &str = "FA002";

/// Rule name for test-block-quality.
pub const NAME: &str = "test-block-quality";

/// Calls whose command arguments are inspected.
const COMMAND_CALLS: &[&str] = &["system", "shell_output", "pipe_output"];

#[allow(clippy::expect_used)]
static USR_LOCAL_BIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(/usr/local/(s?bin))").expect("valid regex"));

/// Checks that `test do` blocks contain a meaningful, portable test.
#[derive(Debug, Clone)]
pub struct TestBlockQuality {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for TestBlockQuality {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBlockQuality {
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

    fn diagnostic(&self, anchor: TextRange, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(CODE, NAME, self.severity, anchor, message)
    }

    /// `/usr/local/bin` or `/usr/local/sbin` hard-coded in the command string.
    fn check_usr_local(&self, call: &CallSite<'_>) -> Option<Diagnostic> {
        let command = call.argument(0)?;
        if command.kind() != &NodeKind::Str {
            return None;
        }

        let content = command.string_content()?;
        let captures = USR_LOCAL_BIN.captures(&content)?;
        let (path, dir) = (captures.get(1)?.as_str(), captures.get(2)?.as_str());
        let token = format!("#{{{dir}}}");

        let diagnostic = self.diagnostic(
            command.range(),
            format!("Use `{token}` instead of `{path}` in `{}`", call.selector),
        );

        // First occurrence within a literal segment; heredoc segments lie
        // outside the opener's range.
        let edit = command
            .children()
            .iter()
            .filter(|c| c.kind() == &NodeKind::StringContent)
            .find_map(|c| c.source().find(path).map(|offset| c.range().start + offset))
            .map(|start| Edit::replace(TextRange::new(start, start + path.len()), token));

        Some(match edit {
            Some(edit) => diagnostic.with_edit(edit),
            None => diagnostic,
        })
    }

    /// `shell_output(cmd, 0)` repeats the default expected exit status.
    fn check_zero_status(&self, call: &CallSite<'_>) -> Option<Diagnostic> {
        if call.selector != "shell_output" {
            return None;
        }

        let status = call.argument(1)?;
        if status.kind() != &NodeKind::Int || status.int_value() != Some(0) {
            return None;
        }

        let source = status.full_source();
        let removal = range_with_surrounding_comma(
            source,
            range_with_surrounding_space(source, status.range(), Side::Left),
            Side::Left,
        );

        Some(
            self.diagnostic(
                status.range(),
                "Passing 0 to `shell_output` is redundant",
            )
            .with_edit(Edit::remove(removal)),
        )
    }
}

impl FormulaRule for TestBlockQuality {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires a real, portable test inside `test do` blocks"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn audit_formula(&self, formula: &FormulaNodes<'_>) -> Result<Vec<Diagnostic>, NodeError> {
        let Some(test) = find_block(formula.body_node, "test") else {
            return Ok(Vec::new());
        };

        let Some(body) = test.body() else {
            return Ok(vec![
                self.diagnostic(test.range(), "`test do` should not be empty"),
            ]);
        };

        let mut diagnostics = Vec::new();
        if let [only] = body.children() {
            if only.source() == "true" {
                diagnostics.push(
                    self.diagnostic(test.range(), "`test do` should contain a real test"),
                );
            }
        }

        for call in CallSites::new(test, COMMAND_CALLS) {
            diagnostics.extend(self.check_usr_local(&call));
            diagnostics.extend(self.check_zero_status(&call));
        }

        Ok(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formula_audit_core::{apply_edits, SourceParser};
    use formula_audit_ruby::RubyParser;

    fn formula(test_body: &str) -> String {
        format!("class Foo < Formula\n  url \"https://example.com/foo\"\n\n  test do\n{test_body}  end\nend\n")
    }

    fn audit(src: &str) -> Vec<Diagnostic> {
        let tree = RubyParser::new().parse(src).expect("valid ruby");
        FormulaNodes::collect(&tree)
            .iter()
            .flat_map(|f| TestBlockQuality::new().audit_formula(f).unwrap())
            .collect()
    }

    fn fix(src: &str) -> String {
        let edits: Vec<Edit> = audit(src).into_iter().filter_map(|d| d.edit).collect();
        apply_edits(src, &edits).unwrap()
    }

    fn messages(src: &str) -> Vec<String> {
        audit(src).into_iter().map(|d| d.message).collect()
    }

    #[test]
    fn test_no_test_block() {
        assert!(audit("class Foo < Formula\n  url \"x\"\nend\n").is_empty());
        assert!(audit("class Foo < Formula\nend\n").is_empty());
    }

    #[test]
    fn test_empty_block() {
        let src = formula("");
        let diagnostics = audit(&src);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "`test do` should not be empty");
        assert_eq!(diagnostics[0].anchor.slice(&src), Some("test do\n  end"));
        assert!(diagnostics[0].edit.is_none());
    }

    #[test]
    fn test_only_true() {
        let src = formula("    true\n");
        assert_eq!(messages(&src), vec!["`test do` should contain a real test"]);
    }

    #[test]
    fn test_true_with_other_statements() {
        let src = "class Foo < Formula\n  test do true; system \"ls\" end\nend\n";
        assert!(audit(src).is_empty());
    }

    #[test]
    fn test_usr_local_bin() {
        let src = formula("    system \"/usr/local/bin/foo\", \"--version\"\n");
        insta::assert_debug_snapshot!(messages(&src), @r###"
        [
            "Use `#{bin}` instead of `/usr/local/bin` in `system`",
        ]
        "###);
        assert_eq!(
            fix(&src),
            formula("    system \"#{bin}/foo\", \"--version\"\n")
        );
    }

    #[test]
    fn test_usr_local_sbin() {
        let src = formula("    assert_match \"ok\", shell_output(\"/usr/local/sbin/food -t\")\n");
        assert_eq!(
            messages(&src),
            vec!["Use `#{sbin}` instead of `/usr/local/sbin` in `shell_output`"]
        );
        assert_eq!(
            fix(&src),
            formula("    assert_match \"ok\", shell_output(\"#{sbin}/food -t\")\n")
        );
    }

    #[test]
    fn test_only_first_occurrence_replaced() {
        let src = formula("    system \"/usr/local/bin/a /usr/local/bin/b\"\n");
        assert_eq!(
            fix(&src),
            formula("    system \"#{bin}/a /usr/local/bin/b\"\n")
        );
    }

    #[test]
    fn test_usr_local_in_heredoc() {
        let src = formula("    system <<~EOS\n      /usr/local/bin/foo --help\n    EOS\n");
        let diagnostics = audit(&src);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "Use `#{bin}` instead of `/usr/local/bin` in `system`"
        );
        assert_eq!(diagnostics[0].anchor.slice(&src), Some("<<~EOS"));
        assert_eq!(
            fix(&src),
            formula("    system <<~EOS\n      #{bin}/foo --help\n    EOS\n")
        );
    }

    #[test]
    fn test_other_paths_ignored() {
        assert!(audit(&formula("    system \"/opt/foo\"\n")).is_empty());
        assert!(audit(&formula("    system \"#{bin}/foo\"\n")).is_empty());
    }

    #[test]
    fn test_calls_with_receiver_ignored() {
        let src = formula("    Utils.system \"/usr/local/bin/foo\"\n    true\n");
        assert!(audit(&src).is_empty());
    }

    #[test]
    fn test_shell_output_zero() {
        let src = formula("    assert_match \"1.0\", shell_output(\"cmd\", 0)\n");
        let diagnostics = audit(&src);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Passing 0 to `shell_output` is redundant");
        assert_eq!(diagnostics[0].anchor.slice(&src), Some("0"));
        assert_eq!(
            fix(&src),
            formula("    assert_match \"1.0\", shell_output(\"cmd\")\n")
        );
    }

    #[test]
    fn test_shell_output_other_status() {
        assert!(audit(&formula("    shell_output(\"cmd\", 1)\n")).is_empty());
        assert!(audit(&formula("    system(\"cmd\", 0)\n")).is_empty());
        assert!(audit(&formula("    shell_output(\"cmd\")\n")).is_empty());
    }

    #[test]
    fn test_nested_calls_found() {
        let src = formula(
            "    cd testpath do\n      if true\n        system \"/usr/local/bin/foo\"\n      end\n    end\n",
        );
        assert_eq!(audit(&src).len(), 1);
    }

    #[test]
    fn test_both_findings_in_one_call() {
        let src = formula("    shell_output(\"/usr/local/bin/foo\", 0)\n");
        let diagnostics = audit(&src);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(fix(&src), formula("    shell_output(\"#{bin}/foo\")\n"));
    }
}
