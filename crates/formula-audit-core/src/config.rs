//! `formula-audit.toml` contents.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::Severity;

/// A parsed configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `"audit"` or `"strict"`; the CLI decides when unset.
    pub preset: Option<String>,

    /// Lowest severity that fails a run; errors when unset.
    pub fail_on: Option<Severity>,

    /// File discovery and error handling.
    pub analyzer: AnalyzerConfig,

    /// Overrides keyed by rule name (`test-block-present`) or code (`FA003`).
    pub rules: HashMap<String, RuleConfig>,
}

impl Config {
    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid config.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid config.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Override for a rule, looked up by name first, then by code.
    #[must_use]
    pub fn rule(&self, name: &str, code: &str) -> Option<&RuleConfig> {
        self.rules.get(name).or_else(|| {
            self.rules
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(code))
                .map(|(_, rule)| rule)
        })
    }

    /// Severity threshold for failing a run.
    #[must_use]
    pub fn fail_threshold(&self) -> Severity {
        self.fail_on.unwrap_or(Severity::Error)
    }
}

/// The `[analyzer]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Tap or formula directory used when no root is given.
    pub root: PathBuf,

    /// Glob patterns of files to skip.
    pub exclude: Vec<String>,

    /// Skip files ignored by git.
    pub respect_gitignore: bool,

    /// Abort on an unparsable formula instead of skipping it.
    pub fail_on_error: bool,

    /// Worker threads; rayon's global pool when unset.
    pub parallelism: Option<usize>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            exclude: vec!["**/vendor/**".to_string()],
            respect_gitignore: true,
            fail_on_error: false,
            parallelism: None,
        }
    }
}

/// A `[rules.<name>]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// `false` turns the rule off.
    pub enabled: Option<bool>,

    /// Replaces the rule's severity.
    pub severity: Option<Severity>,
}

impl RuleConfig {
    /// Rules are on unless disabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The TOML is malformed or has wrongly typed values.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
