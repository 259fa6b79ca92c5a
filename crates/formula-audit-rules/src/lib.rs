//! # formula-audit-rules
//!
//! Built-in formula rules for formula-audit.
//!
//! ## Available Rules
//!
//! | Code | Name | Description |
//! |------|------|-------------|
//! | FA001 | `deprecated-superclass` | Replaces `GithubGistFormula`, `ScriptFileFormula` and `AmazonWebServicesFormula` with `Formula` |
//! | FA002 | `test-block-quality` | Flags empty or trivial `test do` blocks, hard-coded `/usr/local/bin` and `shell_output(cmd, 0)` |
//! | FA003 | `test-block-present` | Requires a `test do` block (strict preset only) |
//!
//! ## Usage
//!
//! ```ignore
//! use formula_audit_core::Analyzer;
//! use formula_audit_rules::Preset;
//! use formula_audit_ruby::RubyParser;
//!
//! let analyzer = Analyzer::builder()
//!     .root("./Formula")
//!     .parser(RubyParser::new())
//!     .rules(Preset::Strict.rules())
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod deprecated_superclass;
mod presets;
mod test_block_present;
mod test_block_quality;

pub use deprecated_superclass::{DeprecatedSuperclass, DEPRECATED_CLASSES};
pub use presets::{all_rules, audit_rules, strict_rules, Preset};
pub use test_block_present::TestBlockPresent;
pub use test_block_quality::TestBlockQuality;

/// Re-export core types for convenience.
pub use formula_audit_core::{Diagnostic, FormulaRule, Severity};
