//! Per-file context used when turning diagnostics into violations.

use crate::types::{Diagnostic, Violation};
use std::path::{Path, PathBuf};

/// A source file being audited.
#[derive(Debug, Clone)]
pub struct FileContext<'a> {
    /// Path to the file as discovered.
    pub path: &'a Path,
    /// File contents as a string.
    pub content: &'a str,
    /// Path relative to the project root.
    pub relative_path: PathBuf,
}

impl<'a> FileContext<'a> {
    /// Creates a new file context.
    #[must_use]
    pub fn new(path: &'a Path, content: &'a str, root: &Path) -> Self {
        let relative_path = path
            .strip_prefix(root)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf);

        Self {
            path,
            content,
            relative_path,
        }
    }

    /// Places a rule diagnostic in this file.
    #[must_use]
    pub fn violation(&self, diagnostic: Diagnostic) -> Violation {
        Violation::from_diagnostic(self.relative_path.clone(), self.content, diagnostic)
    }
}
