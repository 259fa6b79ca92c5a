//! Rule trait for defining formula audits.

use crate::formula::FormulaNodes;
use crate::node::NodeError;
use crate::types::{Diagnostic, Severity};

/// A rule evaluated once per formula class.
///
/// Rules are pure: the same [`FormulaNodes`] always yields the same
/// diagnostics, and nothing borrowed from the tree outlives the call.
///
/// # Example
///
/// ```ignore
/// use formula_audit_core::{Diagnostic, FormulaNodes, FormulaRule, NodeError};
///
/// pub struct NoEmptyBody;
///
/// impl FormulaRule for NoEmptyBody {
///     fn name(&self) -> &'static str { "no-empty-body" }
///     fn code(&self) -> &'static str { "FA100" }
///
///     fn audit_formula(&self, formula: &FormulaNodes<'_>) -> Result<Vec<Diagnostic>, NodeError> {
///         if formula.body_node.is_some() {
///             return Ok(Vec::new());
///         }
///         Ok(vec![Diagnostic::new(
///             self.code(),
///             self.name(),
///             self.default_severity(),
///             formula.class_node.range(),
///             "Formula body is empty",
///         )])
///     }
/// }
/// ```
pub trait FormulaRule: Send + Sync {
    /// Returns the kebab-case name of this rule (e.g., "deprecated-superclass").
    fn name(&self) -> &'static str;

    /// Returns the rule code (e.g., "FA001").
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the default severity for diagnostics from this rule.
    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    /// Audits one formula.
    ///
    /// Missing structure (no superclass, no body, too few arguments) means the
    /// rule does not apply and yields no diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError`] only when the tree violates the node contract,
    /// e.g. a node of an unexpected kind where a specific kind is required.
    fn audit_formula(&self, formula: &FormulaNodes<'_>) -> Result<Vec<Diagnostic>, NodeError>;
}

/// Type alias for boxed rule trait objects.
pub type RuleBox = Box<dyn FormulaRule>;
