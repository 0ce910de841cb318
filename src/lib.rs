//! tsprobe - structural analysis of TypeScript codebases.
//!
//! tsprobe is a thin facade over tree-sitter for ad-hoc questions about a
//! TypeScript codebase: where is a name imported, where is a function
//! called, which classes exist. A raw query escape hatch covers everything
//! the convenience methods don't, and `stats` gives a quick summary.
//! Parsing and query matching belong entirely to tree-sitter; this crate
//! only builds patterns and reshapes match results.
//!
//! # Architecture
//!
//! - `workspace`: file discovery and the per-file parse cache
//! - `query`: pattern compilation and raw match records
//! - `analyzer`: the facade with the convenience operations
//! - `stats`: codebase statistics
//! - `report`: output formatting (pretty, JSON)
//! - `cli`: command-line surface

pub mod analyzer;
pub mod cli;
pub mod error;
pub mod query;
pub mod report;
pub mod stats;
pub mod workspace;

pub use analyzer::{
    Analyzer, CallMatch, ClassMatch, FileMatches, ImportMatch, Scan, SkippedFile, StatsScan,
};
pub use error::{Error, Result};
pub use query::{CapturedNode, QueryPattern, RawMatch, Span};
pub use stats::CodebaseStats;
pub use workspace::{Dialect, ScanOptions, SourceFile, Workspace};
