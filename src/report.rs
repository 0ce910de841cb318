//! Output formatting for analysis results.
//!
//! Two formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: stable serde structures for programmatic consumption

use colored::*;
use serde::Serialize;
use std::path::Path;

use crate::analyzer::{CallMatch, ClassMatch, ImportMatch, Scan, SkippedFile, StatsScan};
use crate::query::RawMatch;

/// Write any result as pretty-printed JSON on stdout.
pub fn write_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print skipped-file warnings to stderr.
pub fn warn_skipped(skipped: &[SkippedFile]) {
    for s in skipped {
        eprintln!(
            "{} skipping {}: {}",
            "warning:".yellow().bold(),
            s.file.display(),
            s.error
        );
    }
}

fn write_file_header(path: &Path) {
    println!("{}", path.display().to_string().cyan().bold());
}

fn write_summary(total: usize, noun: &str, file_count: usize) {
    println!();
    if total == 0 {
        println!("{}", format!("no {} found", noun).dimmed());
    } else {
        println!(
            "{} {} in {} file(s)",
            total.to_string().green().bold(),
            noun,
            file_count
        );
    }
}

/// Write import matches in pretty format.
pub fn write_imports_pretty(scan: &Scan<ImportMatch>) {
    for file in &scan.files {
        write_file_header(&file.file);
        for m in &file.matches {
            println!("  {}  {}", format!("{}:", m.line).dimmed(), m.text);
        }
    }
    write_summary(scan.total(), "import(s)", scan.files.len());
}

/// Write call matches in pretty format.
pub fn write_calls_pretty(scan: &Scan<CallMatch>) {
    for file in &scan.files {
        write_file_header(&file.file);
        for m in &file.matches {
            println!(
                "  {}  {}",
                format!("{}:{}", m.line, m.column).dimmed(),
                m.text
            );
            if let Some(arg) = &m.first_arg {
                println!("        {} {}", "first arg:".dimmed(), arg);
            }
        }
    }
    write_summary(scan.total(), "call(s)", scan.files.len());
}

/// Write class matches in pretty format.
pub fn write_classes_pretty(scan: &Scan<ClassMatch>) {
    for file in &scan.files {
        write_file_header(&file.file);
        for m in &file.matches {
            println!(
                "  {}  {}  {}",
                format!("{}:{}", m.line, m.column).dimmed(),
                m.name.bold(),
                format!(
                    "body {}:{}-{}:{}",
                    m.body_span.start_line,
                    m.body_span.start_column,
                    m.body_span.end_line,
                    m.body_span.end_column
                )
                .dimmed()
            );
        }
    }
    write_summary(scan.total(), "class(es)", scan.files.len());
}

/// Write raw query matches in pretty format, one line per capture.
pub fn write_query_pretty(scan: &Scan<RawMatch>) {
    for file in &scan.files {
        write_file_header(&file.file);
        for m in &file.matches {
            for cap in &m.captures {
                println!(
                    "  {}  {}  {}",
                    format!("{}:{}", cap.span.start_line, cap.span.start_column).dimmed(),
                    format!("@{}", cap.name).green(),
                    first_line(&cap.text)
                );
            }
        }
    }
    write_summary(scan.total(), "match(es)", scan.files.len());
}

/// Write codebase statistics in pretty format.
pub fn write_stats_pretty(scan: &StatsScan) {
    let stats = &scan.stats;
    println!();
    println!("  {}{}", "Files:          ".dimmed(), stats.total_files);
    println!(
        "  {}{} {}",
        "Lines:          ".dimmed(),
        stats.total_lines,
        format!("(avg {:.1} per file)", stats.avg_lines_per_file).dimmed()
    );
    println!("  {}{}", "Imports:        ".dimmed(), stats.imports);
    println!("  {}{}", "Exports:        ".dimmed(), stats.exports);
    println!("  {}{}", "Classes:        ".dimmed(), stats.classes);
    println!("  {}{}", "Interfaces:     ".dimmed(), stats.interfaces);
    println!("  {}{}", "Functions:      ".dimmed(), stats.functions);
    println!("  {}{}", "Type aliases:   ".dimmed(), stats.type_aliases);
    println!();
}

/// Matched text can span many lines; pretty output shows only the first.
fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}
