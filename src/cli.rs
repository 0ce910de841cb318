//! Command-line interface for tsprobe.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::analyzer::Analyzer;
use crate::report;
use crate::workspace::ScanOptions;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 2;

/// Structural analysis of TypeScript codebases using tree-sitter.
///
/// tsprobe answers ad-hoc questions about a codebase: where a name is
/// imported, where a function is called, which classes exist, plus an
/// escape hatch for arbitrary tree-sitter queries and simple statistics.
#[derive(Parser)]
#[command(name = "tsprobe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find import statements referencing a name
    Imports(ImportsArgs),
    /// Find call sites of a function
    Calls(CallsArgs),
    /// List class declarations
    Classes(ClassesArgs),
    /// Run a raw tree-sitter query
    Query(QueryArgs),
    /// Summarize the codebase
    Stats(StatsArgs),
}

/// Options shared by every subcommand.
#[derive(Args)]
pub struct CommonOpts {
    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Skip .tsx files
    #[arg(long)]
    pub no_tsx: bool,

    /// Include files under node_modules
    #[arg(long)]
    pub node_modules: bool,

    /// Exclude files matching a glob, relative to the root (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,
}

#[derive(Parser)]
pub struct ImportsArgs {
    /// Class or module name to look for
    pub name: String,

    /// Codebase root (directory or a single .ts/.tsx file)
    pub path: PathBuf,

    #[command(flatten)]
    pub opts: CommonOpts,
}

#[derive(Parser)]
pub struct CallsArgs {
    /// Function name to look for
    pub name: String,

    /// Codebase root (directory or a single .ts/.tsx file)
    pub path: PathBuf,

    /// Also extract the first argument of each call
    #[arg(long)]
    pub first_arg: bool,

    #[command(flatten)]
    pub opts: CommonOpts,
}

#[derive(Parser)]
pub struct ClassesArgs {
    /// Codebase root (directory or a single .ts/.tsx file)
    pub path: PathBuf,

    /// Only show classes with this name
    #[arg(short, long)]
    pub name: Option<String>,

    #[command(flatten)]
    pub opts: CommonOpts,
}

#[derive(Parser)]
pub struct QueryArgs {
    /// Tree-sitter query pattern
    pub pattern: String,

    /// Codebase root (directory or a single .ts/.tsx file)
    pub path: PathBuf,

    #[command(flatten)]
    pub opts: CommonOpts,
}

#[derive(Parser)]
pub struct StatsArgs {
    /// Codebase root (directory or a single .ts/.tsx file)
    pub path: PathBuf,

    #[command(flatten)]
    pub opts: CommonOpts,
}

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Imports(args) => run_imports(&args),
        Commands::Calls(args) => run_calls(&args),
        Commands::Classes(args) => run_classes(&args),
        Commands::Query(args) => run_query(&args),
        Commands::Stats(args) => run_stats(&args),
    }
}

fn scan_options(opts: &CommonOpts) -> ScanOptions {
    ScanOptions {
        include_tsx: !opts.no_tsx,
        include_node_modules: opts.node_modules,
        exclude: opts.exclude.clone(),
    }
}

fn check_format(opts: &CommonOpts) -> Option<i32> {
    if opts.format != "pretty" && opts.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            opts.format
        );
        return Some(EXIT_ERROR);
    }
    None
}

fn run_imports(args: &ImportsArgs) -> anyhow::Result<i32> {
    if let Some(code) = check_format(&args.opts) {
        return Ok(code);
    }
    let mut analyzer = Analyzer::with_options(&args.path, scan_options(&args.opts))?;
    let scan = analyzer.find_imports(&args.name)?;

    report::warn_skipped(&scan.skipped);
    match args.opts.format.as_str() {
        "json" => report::write_json(&scan)?,
        _ => report::write_imports_pretty(&scan),
    }
    Ok(EXIT_SUCCESS)
}

fn run_calls(args: &CallsArgs) -> anyhow::Result<i32> {
    if let Some(code) = check_format(&args.opts) {
        return Ok(code);
    }
    let mut analyzer = Analyzer::with_options(&args.path, scan_options(&args.opts))?;
    let scan = analyzer.find_function_calls(&args.name, args.first_arg)?;

    report::warn_skipped(&scan.skipped);
    match args.opts.format.as_str() {
        "json" => report::write_json(&scan)?,
        _ => report::write_calls_pretty(&scan),
    }
    Ok(EXIT_SUCCESS)
}

fn run_classes(args: &ClassesArgs) -> anyhow::Result<i32> {
    if let Some(code) = check_format(&args.opts) {
        return Ok(code);
    }
    let mut analyzer = Analyzer::with_options(&args.path, scan_options(&args.opts))?;
    let scan = analyzer.find_class_definitions(args.name.as_deref())?;

    report::warn_skipped(&scan.skipped);
    match args.opts.format.as_str() {
        "json" => report::write_json(&scan)?,
        _ => report::write_classes_pretty(&scan),
    }
    Ok(EXIT_SUCCESS)
}

fn run_query(args: &QueryArgs) -> anyhow::Result<i32> {
    if let Some(code) = check_format(&args.opts) {
        return Ok(code);
    }
    let mut analyzer = Analyzer::with_options(&args.path, scan_options(&args.opts))?;

    // A bad pattern is an expected user error, not an internal failure.
    let scan = match analyzer.custom_query(&args.pattern) {
        Ok(scan) => scan,
        Err(e @ crate::error::Error::QuerySyntax { .. }) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
        Err(e) => return Err(e.into()),
    };

    report::warn_skipped(&scan.skipped);
    match args.opts.format.as_str() {
        "json" => report::write_json(&scan)?,
        _ => report::write_query_pretty(&scan),
    }
    Ok(EXIT_SUCCESS)
}

fn run_stats(args: &StatsArgs) -> anyhow::Result<i32> {
    if let Some(code) = check_format(&args.opts) {
        return Ok(code);
    }
    let mut analyzer = Analyzer::with_options(&args.path, scan_options(&args.opts))?;
    let scan = analyzer.stats()?;

    report::warn_skipped(&scan.skipped);
    match args.opts.format.as_str() {
        "json" => report::write_json(&scan)?,
        _ => report::write_stats_pretty(&scan),
    }
    Ok(EXIT_SUCCESS)
}
