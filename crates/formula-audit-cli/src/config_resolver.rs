//! Locates the configuration file for a checked path.
//!
//! A formula is usually checked from somewhere inside a tap, so the project
//! config is searched upward from the checked path and the search stops at
//! the tap root. Order:
//!
//! 1. `--config` flag
//! 2. `formula-audit.toml` or `.formula-audit.toml` between the checked path
//!    and its tap root
//! 3. `$FORMULA_AUDIT_CONFIG_DIR/config.toml` or `~/.formula-audit/config.toml`
//! 4. built-in defaults

use std::path::{Path, PathBuf};

/// Where the configuration was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given with `--config`.
    Explicit(PathBuf),
    /// Found in the tap or one of its directories.
    Project(PathBuf),
    /// Found in the global config directory.
    Global(PathBuf),
    /// Nothing found.
    Default,
}

impl ConfigSource {
    /// Returns the resolved path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Returns `true` if the config was loaded from the global directory.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global(_))
    }
}

const PROJECT_CONFIG_NAMES: &[&str] = &["formula-audit.toml", ".formula-audit.toml"];

const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Resolves the configuration for `checked`, a formula file or directory.
#[must_use]
pub fn resolve(checked: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_inner(checked, explicit, global_config_dir())
}

fn resolve_inner(
    checked: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> ConfigSource {
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }

    if let Some(found) = find_project_config(&start_dir(checked)) {
        tracing::debug!("Found project config: {}", found.display());
        return ConfigSource::Project(found);
    }

    global_dir
        .map(|dir| dir.join(GLOBAL_CONFIG_NAME))
        .filter(|candidate| candidate.is_file())
        .map_or(ConfigSource::Default, |candidate| {
            tracing::debug!("Found global config: {}", candidate.display());
            ConfigSource::Global(candidate)
        })
}

/// Returns the global config directory: `$FORMULA_AUDIT_CONFIG_DIR`, else
/// `~/.formula-audit/`.
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("FORMULA_AUDIT_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".formula-audit"))
}

/// Directory the upward search starts from.
fn start_dir(checked: &Path) -> PathBuf {
    let dir = if checked.is_file() {
        checked.parent().unwrap_or(Path::new(""))
    } else {
        checked
    };
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf())
}

/// A tap root holds a `Formula/` directory or is a git checkout.
fn is_tap_root(dir: &Path) -> bool {
    dir.join("Formula").is_dir() || dir.join(".git").exists()
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    for dir in start.ancestors() {
        let found = PROJECT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file());
        if found.is_some() {
            return found;
        }
        if is_tap_root(dir) {
            break;
        }
    }
    None
}
