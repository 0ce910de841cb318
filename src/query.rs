//! Structural query compilation and execution.
//!
//! `QueryPattern` wraps a compiled tree-sitter query together with the
//! capture names it declares. Matches come back as plain records (capture
//! name, span, text) so callers never hold engine lifetimes.

use serde::Serialize;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor};

use crate::error::{Error, Result};
use crate::workspace::{Dialect, SourceFile};

/// Byte and line/column extent of a matched node.
///
/// Lines and columns are 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    pub(crate) fn of(node: &Node) -> Span {
        let start = node.start_position();
        let end = node.end_position();
        Span {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: start.row + 1,
            start_column: start.column + 1,
            end_line: end.row + 1,
            end_column: end.column + 1,
        }
    }
}

/// A named capture from one query match.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedNode {
    pub name: String,
    pub span: Span,
    pub text: String,
}

/// One match of a pattern against a file's tree.
///
/// Every capture name here is one of the pattern's declared captures.
#[derive(Debug, Clone, Serialize)]
pub struct RawMatch {
    pub captures: Vec<CapturedNode>,
}

/// A compiled structural query plus the capture names it declares.
#[derive(Debug)]
pub struct QueryPattern {
    query: Query,
    captures: Vec<String>,
}

impl QueryPattern {
    /// Compile a pattern for the given dialect.
    ///
    /// Fails with `Error::QuerySyntax` carrying the engine's row, column,
    /// and message when the pattern is rejected.
    pub fn compile(dialect: Dialect, pattern: &str) -> Result<QueryPattern> {
        let query = Query::new(dialect.language(), pattern).map_err(Error::query)?;
        let captures = query
            .capture_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        Ok(QueryPattern { query, captures })
    }

    /// Capture names declared by the pattern, in declaration order.
    pub fn captures(&self) -> &[String] {
        &self.captures
    }

    pub(crate) fn query(&self) -> &Query {
        &self.query
    }

    /// Run the pattern over a file's tree, one `RawMatch` per engine match.
    pub fn matches(&self, file: &SourceFile) -> Vec<RawMatch> {
        let source = file.text.as_bytes();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.query, file.tree().root_node(), source);

        let mut out = Vec::new();
        while let Some(m) = matches.next() {
            let mut captures = Vec::with_capacity(m.captures.len());
            for capture in m.captures {
                let name = self.query.capture_names()[capture.index as usize];
                let text = capture.node.utf8_text(source).unwrap_or("").to_string();
                captures.push(CapturedNode {
                    name: name.to_string(),
                    span: Span::of(&capture.node),
                    text,
                });
            }
            out.push(RawMatch { captures });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn fixture(text: &str) -> SourceFile {
        SourceFile::from_text(Path::new("test.ts"), Dialect::TypeScript, text.to_string())
            .unwrap()
    }

    #[test]
    fn test_compile_reports_declared_captures() {
        let pattern = QueryPattern::compile(
            Dialect::TypeScript,
            "(class_declaration name: (type_identifier) @name) @class",
        )
        .unwrap();
        assert_eq!(pattern.captures(), &["name".to_string(), "class".to_string()]);
    }

    #[test]
    fn test_compile_invalid_pattern() {
        let err = QueryPattern::compile(Dialect::TypeScript, "not a valid pattern (").unwrap_err();
        assert!(matches!(err, Error::QuerySyntax { .. }));
    }

    #[test]
    fn test_matches_capture_names_are_declared() {
        let file = fixture("class Foo {}\nclass Bar {}\n");
        let pattern = QueryPattern::compile(
            Dialect::TypeScript,
            "(class_declaration name: (type_identifier) @name) @class",
        )
        .unwrap();

        let matches = pattern.matches(&file);
        assert_eq!(matches.len(), 2);
        for m in &matches {
            for cap in &m.captures {
                assert!(pattern.captures().contains(&cap.name));
            }
        }
    }

    #[test]
    fn test_span_is_one_indexed() {
        let file = fixture("let a = 1;\nclass Foo {}\n");
        let pattern =
            QueryPattern::compile(Dialect::TypeScript, "(class_declaration) @class").unwrap();

        let matches = pattern.matches(&file);
        assert_eq!(matches.len(), 1);
        let cap = &matches[0].captures[0];
        assert_eq!(cap.span.start_line, 2);
        assert_eq!(cap.span.start_column, 1);
        assert_eq!(cap.text, "class Foo {}");
    }

    #[test]
    fn test_matches_empty_source() {
        let file = fixture("");
        let pattern =
            QueryPattern::compile(Dialect::TypeScript, "(class_declaration) @class").unwrap();
        assert!(pattern.matches(&file).is_empty());
    }
}
