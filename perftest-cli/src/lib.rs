#![warn(missing_docs)]
//! perftest CLI Library
//!
//! Command-line runner for check binaries. Call `perftest::run()` (or
//! `perftest_cli::run()`) from the `main` of a binary whose check modules
//! register functions with `#[perftest]`.
//!
//! # Example
//!
//! ```ignore
//! use perftest::prelude::*;
//!
//! #[perftest]
//! fn perftest_sum(ctx: &mut CheckContext<'_>) -> CheckResult {
//!     ctx.time_test(sum_values, (1000u64,), Limit::raw(1e-4))?;
//!     Ok(())
//! }
//!
//! fn main() {
//!     perftest::run().unwrap();
//! }
//! ```

mod config;
mod discovery;
mod session;

pub use config::{CONFIG_FILE, OutputConfig, PerftestConfig};
pub use discovery::{
    DiscoveredCheck, DiscoveryError, discover, discover_modules, is_check_module, match_checks,
};
pub use session::{Session, SessionState, run_session};

use anyhow::Context;
use clap::Parser;
use perftest_core::registered_checks;
use perftest_report::{OutputFormat, render};
use regex::Regex;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;

/// perftest CLI arguments
#[derive(Parser, Debug)]
#[command(name = "perftest")]
#[command(author, version, about = "perftest - time and memory limit checks for Rust functions")]
pub struct Cli {
    /// Check module or directory to discover from (defaults to the working directory)
    pub path: Option<PathBuf>,

    /// Output format: human, json (defaults to perftest.toml, then human)
    #[arg(long)]
    pub format: Option<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only run checks whose qualified name matches this regex
    #[arg(long)]
    pub filter: Option<String>,

    /// Dry run - list discovered checks without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Run the perftest CLI with the process arguments.
///
/// Exits with status 1 when any check failed.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the perftest CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Initialize logging
    let filter = if cli.verbose {
        "perftest=debug"
    } else {
        "perftest=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let root = match &cli.path {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };

    // Discover perftest.toml configuration (CLI flags override)
    let config = PerftestConfig::discover(&root)?.unwrap_or_default();

    let format: OutputFormat = cli
        .format
        .as_deref()
        .unwrap_or(config.output.format.as_str())
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let filter = cli
        .filter
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("invalid --filter pattern")?;

    // INIT: one fresh settings store per invocation
    let settings = config
        .settings_store()
        .context("invalid perftest.toml settings")?;
    let registry = registered_checks();

    if cli.dry_run {
        return list_checks(&root, &registry, filter.as_ref());
    }

    let report = run_session(
        settings,
        &root,
        &registry,
        filter.as_ref(),
        std::io::stderr().is_terminal(),
    )?;

    let output = render(&report, format)?;
    if let Some(path) = &cli.output {
        let mut file = std::fs::File::create(path)?;
        file.write_all(output.as_bytes())?;
        println!("Report written to: {}", path.display());
    } else {
        print!("{}", output);
    }

    if !report.all_passed() {
        std::process::exit(1);
    }

    Ok(())
}

fn list_checks(
    root: &std::path::Path,
    registry: &[&'static perftest_core::CheckDef],
    filter: Option<&Regex>,
) -> anyhow::Result<()> {
    println!("perftest Plan:");

    let checks = discover(root, registry, filter)?;
    let mut current: Option<&PathBuf> = None;
    for check in &checks {
        if current != Some(&check.module) {
            println!("├── {}", check.module.display());
            current = Some(&check.module);
        }
        println!(
            "│   ├── {} ({}:{})",
            check.qualified_name(),
            check.def.file,
            check.def.line
        );
    }

    println!("{} checks found.", checks.len());
    Ok(())
}
