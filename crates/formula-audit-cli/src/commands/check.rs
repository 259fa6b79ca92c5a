//! Check command implementation.

use anyhow::{bail, Context, Result};
use formula_audit_core::{Analyzer, Config, RuleBox};
use formula_audit_rules::{all_rules, Preset};
use formula_audit_ruby::RubyParser;
use std::path::Path;

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Options collected from the command line.
pub struct CheckOptions<'a> {
    /// Formula file or directory to audit.
    pub path: &'a Path,
    /// Output format.
    pub format: OutputFormat,
    /// Comma-separated rule names or codes.
    pub rules_filter: Option<&'a str>,
    /// Preset name given on the command line.
    pub preset: Option<&'a str>,
    /// Extra exclude globs.
    pub exclude: Vec<String>,
    /// Apply autocorrections before reporting.
    pub fix: bool,
    /// Where the configuration comes from.
    pub source: &'a ConfigSource,
}

/// Runs the check command.
pub fn run(opts: &CheckOptions<'_>) -> Result<()> {
    let config = load_config(opts.source)?;
    let threshold = config.fail_threshold();

    let rules = match opts.rules_filter {
        Some(filter) => {
            let names: Vec<&str> = filter.split(',').map(str::trim).collect();
            filter_rules(&names)
        }
        None => {
            let name = opts.preset.or(config.preset.as_deref()).unwrap_or("audit");
            let Some(preset) = Preset::from_name(name) else {
                bail!("Unknown preset '{name}' (expected 'audit' or 'strict')");
            };
            preset.rules()
        }
    };

    let mut builder = Analyzer::builder()
        .root(opts.path)
        .parser(RubyParser::new())
        .config(config)
        .rules(rules);

    for pattern in &opts.exclude {
        builder = builder.exclude(pattern);
    }

    let analyzer = builder.build().context("Failed to build analyzer")?;

    tracing::info!(
        "Auditing {:?} with {} rules",
        opts.path,
        analyzer.rule_count()
    );

    if opts.fix {
        let summary = analyzer.fix().context("Autocorrect failed")?;
        tracing::info!(
            "Applied {} fix(es) in {} file(s)",
            summary.edits_applied,
            summary.files_changed
        );
    }

    let result = analyzer.analyze().context("Analysis failed")?;

    super::output::print(&result, opts.format, analyzer.base_dir())?;

    if result.has_violations_at(threshold) {
        std::process::exit(1);
    }

    Ok(())
}

fn load_config(source: &ConfigSource) -> Result<Config> {
    match source {
        ConfigSource::Default => Ok(Config::default()),
        other => {
            // Invariant: non-Default variants always have a path
            let p = other.path().context("resolved config has no path")?;
            if source.is_global() {
                tracing::info!("Using global config: {}", p.display());
            }
            Config::from_file(p).with_context(|| format!("Failed to load config: {}", p.display()))
        }
    }
}

/// Selects rules by name or code, ignoring unknown entries.
fn filter_rules(names: &[&str]) -> Vec<RuleBox> {
    let mut available = all_rules();
    let mut rules = Vec::new();

    for name in names.iter().filter(|n| !n.is_empty()) {
        let found = available
            .iter()
            .position(|r| r.name() == *name || r.code().eq_ignore_ascii_case(name));
        match found {
            Some(index) => rules.push(available.swap_remove(index)),
            None => tracing::warn!("Unknown rule: {}", name),
        }
    }

    rules
}
