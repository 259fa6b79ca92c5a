//! # formula-audit-ruby
//!
//! Tree-sitter based Ruby front end for formula-audit.
//!
//! [`RubyParser`] implements [`formula_audit_core::SourceParser`] and lowers
//! `tree-sitter-ruby` syntax trees into the core `Node` model: classes with
//! their name, superclass and body, calls with receiver, method and
//! arguments, and `do ... end` / `{ ... }` blocks wrapping their call.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod ruby;

pub use ruby::RubyParser;
