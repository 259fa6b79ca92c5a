//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# formula-audit configuration

# Rule preset: "audit" (default) or "strict" (also requires a `test do` block)
preset = "audit"

# Minimum severity that makes `formula-audit check` exit non-zero
fail_on = "error"

[analyzer]
# Root directory to analyze (default: current directory)
# root = "./Formula"

# Glob patterns to exclude from analysis
exclude = [
    "**/vendor/**",
]

# Respect .gitignore files
respect_gitignore = true

# Abort on unparsable formulae instead of skipping them
fail_on_error = false

# Rule configurations
# Keyed by rule name or code; each can be disabled or given a new severity

[rules.deprecated-superclass]
enabled = true

[rules.test-block-quality]
enabled = true

# [rules.test-block-present]
# enabled = true
# severity = "warning"
"#;

/// Name of the config file written by `init`.
pub const CONFIG_FILE: &str = "formula-audit.toml";

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let config_path = Path::new(CONFIG_FILE);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Created {CONFIG_FILE}");
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_FILE} to configure rules");
    println!("  2. Run: formula-audit check Formula");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use formula_audit_core::{Config, Severity};

    #[test]
    fn default_config_parses() {
        let config = Config::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.preset.as_deref(), Some("audit"));
        assert_eq!(config.fail_threshold(), Severity::Error);
        assert!(config.rule("test-block-present", "FA003").is_none());
        assert_eq!(config.analyzer.exclude, vec!["**/vendor/**".to_string()]);
    }
}
