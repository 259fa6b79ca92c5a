//! Shared output formatting for lint results.

use anyhow::{Context, Result};
use formula_audit_core::{LintResult, Severity, ViolationDiagnostic};
use miette::{NamedSource, Report};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::OutputFormat;

/// Print lint results in the specified format.
///
/// `base` is the directory violation paths are relative to.
pub fn print(result: &LintResult, format: OutputFormat, base: &Path) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(result),
        OutputFormat::Json => return print_json(result),
        OutputFormat::Compact => print_compact(result),
        OutputFormat::Pretty => return print_pretty(result, base),
    }
    Ok(())
}

fn print_text(result: &LintResult) {
    for violation in &result.violations {
        let severity_indicator = match violation.severity {
            Severity::Error => "\x1b[31merror\x1b[0m",
            Severity::Warning => "\x1b[33mwarning\x1b[0m",
            Severity::Info => "\x1b[34minfo\x1b[0m",
        };

        println!(
            "{} {} at {}:{}:{}",
            violation.code,
            violation.rule,
            violation.location.file.display(),
            violation.location.line,
            violation.location.column,
        );
        println!("  {}: {}", severity_indicator, violation.message);
        if let Some(edit) = &violation.edit {
            println!("  = fix: {edit}");
        }
        println!();
    }

    print_summary(result);
}

fn print_summary(result: &LintResult) {
    let (errors, warnings, infos) = result.count_by_severity();

    let summary_color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    println!(
        "{}Found {} error(s), {} warning(s), {} info(s) in {} formula(e), {} file(s)\x1b[0m",
        summary_color, errors, warnings, infos, result.formulae_checked, result.files_checked
    );

    let correctable = result.correctable_count();
    if correctable > 0 {
        println!("{correctable} issue(s) can be fixed with --fix");
    }
}

fn print_json(result: &LintResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

fn print_compact(result: &LintResult) {
    for violation in &result.violations {
        println!("{violation}");
    }
}

fn print_pretty(result: &LintResult, base: &Path) -> Result<()> {
    let mut sources: BTreeMap<&PathBuf, String> = BTreeMap::new();

    for violation in &result.violations {
        let file = &violation.location.file;
        if !sources.contains_key(file) {
            let full = base.join(file);
            let content = std::fs::read_to_string(&full)
                .with_context(|| format!("Failed to read {}", full.display()))?;
            sources.insert(file, content);
        }
        let content = sources.get(file).cloned().unwrap_or_default();

        let report = Report::new(ViolationDiagnostic::from(violation))
            .with_source_code(NamedSource::new(file.display().to_string(), content));
        println!("{report:?}");
    }

    print_summary(result);
    Ok(())
}
