//! # formula-audit-core
//!
//! Core framework for auditing Homebrew formula definitions.
//!
//! This crate provides the tree model, the traits and the host pipeline
//! shared by every formula rule. It includes:
//!
//! - [`Node`] for the syntax tree a front end produces
//! - [`FormulaNodes`] for locating the parts of a formula class
//! - [`CallSites`] for finding receiver-less method calls by selector
//! - [`Edit`] and the range helpers for building autocorrections
//! - [`FormulaRule`] trait for per-formula rules
//! - [`Analyzer`] for orchestrating discovery, auditing and fixing
//!
//! ## Example
//!
//! ```ignore
//! use formula_audit_core::Analyzer;
//!
//! let analyzer = Analyzer::builder()
//!     .root("./Formula")
//!     .parser(RubyParser::new())
//!     .rule(DeprecatedSuperclass::new())
//!     .build()?;
//!
//! let result = analyzer.analyze()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod call_site;
mod config;
mod context;
mod edit;
mod formula;
mod node;
mod parser;
mod range;
mod rule;
mod types;

pub use analyzer::{
    Analyzer, AnalyzerBuilder, AnalyzerError, FixOutcome, FixSummary, MAX_FIX_PASSES,
};
pub use call_site::{CallSite, CallSites};
pub use config::{AnalyzerConfig, Config, ConfigError, RuleConfig};
pub use context::FileContext;
pub use edit::{apply_edits, plan_edits, Edit, EditError, EditPlan};
pub use formula::{
    class_name, find_block, find_node_method_by_name, FormulaNodes, FORMULA_SUPERCLASSES,
};
pub use node::{Descendants, Field, Node, NodeError, NodeKind};
pub use parser::{ParseError, ParserBox, SourceParser};
pub use range::{range_with_surrounding_comma, range_with_surrounding_space, Side, TextRange};
pub use rule::{FormulaRule, RuleBox};
pub use types::{Diagnostic, LintResult, Location, Severity, Violation, ViolationDiagnostic};
