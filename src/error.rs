//! Error types for analysis operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while analyzing a codebase.
#[derive(Error, Debug)]
pub enum Error {
    /// The codebase root or a source file could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The engine rejected a query pattern. The message is the engine's own.
    #[error("invalid query at row {row}, column {column}: {message}")]
    QuerySyntax {
        row: usize,
        column: usize,
        message: String,
    },

    /// The engine could not produce a tree for a file.
    #[error("failed to parse {}", .path.display())]
    Parse { path: PathBuf },

    /// A caller-supplied argument was unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Directory traversal failed.
    #[error("walking codebase: {0}")]
    Walk(#[from] walkdir::Error),

    /// An exclusion glob was malformed.
    #[error("invalid exclude pattern: {0}")]
    Glob(#[from] globset::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn query(err: tree_sitter::QueryError) -> Self {
        Error::QuerySyntax {
            row: err.row,
            column: err.column,
            message: err.message,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>) -> Self {
        Error::Parse { path: path.into() }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
