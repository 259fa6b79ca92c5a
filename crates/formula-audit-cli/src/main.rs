//! formula-audit CLI tool.
//!
//! Usage:
//! ```bash
//! formula-audit check [OPTIONS] [PATH]
//! formula-audit list-rules
//! formula-audit init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Style and correctness auditor for Homebrew formulae
#[derive(Parser)]
#[command(name = "formula-audit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit formula files
    Check {
        /// Formula file or directory to audit (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Only run specific rules by name or code (comma-separated)
        #[arg(long)]
        rules: Option<String>,

        /// Rule preset: "audit" or "strict" (overrides the config file)
        #[arg(long)]
        preset: Option<String>,

        /// Exclude patterns (can be specified multiple times)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Apply autocorrections in place before reporting
        #[arg(long)]
        fix: bool,
    },

    /// List available rules
    ListRules,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for lint results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-violation compact format.
    Compact,
    /// Annotated source snippets.
    Pretty,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            path,
            format,
            rules,
            preset,
            exclude,
            fix,
        } => {
            let source = config_resolver::resolve(&path, cli.config.as_deref());
            commands::check::run(&commands::check::CheckOptions {
                path: &path,
                format,
                rules_filter: rules.as_deref(),
                preset: preset.as_deref(),
                exclude,
                fix,
                source: &source,
            })
        }
        Commands::ListRules => {
            commands::list_rules::run();
            Ok(())
        }
        Commands::Init { force } => commands::init::run(force),
    }
}
