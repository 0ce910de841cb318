//! The analysis facade: curated convenience queries plus a raw escape hatch.
//!
//! Every operation walks the workspace's discovered files, parses on
//! demand, runs a structural query, and groups matches per file. A file
//! that cannot be read or parsed lands in `Scan::skipped` and never aborts
//! the rest of the scan. Zero matches is an empty result, not an error.

use std::path::{Path, PathBuf};

use serde::Serialize;
use streaming_iterator::StreamingIterator;
use tree_sitter::QueryCursor;

use crate::error::{Error, Result};
use crate::query::{QueryPattern, RawMatch, Span};
use crate::stats::CodebaseStats;
use crate::workspace::{Dialect, ScanOptions, SourceFile, Workspace};

/// Query for import statements.
const IMPORT_QUERY: &str = "(import_statement) @import";

/// Query for call expressions with a plain or member callee.
///
/// Captures:
/// - `callee`: the called identifier, or the final property of a member chain
/// - `args`: the arguments node
/// - `call`: the whole call expression
const CALL_QUERY: &str = r#"
(call_expression
  function: (identifier) @callee
  arguments: (arguments) @args) @call
(call_expression
  function: (member_expression
    property: (property_identifier) @callee)
  arguments: (arguments) @args) @call
"#;

/// Query for class declarations.
const CLASS_QUERY: &str = r#"
(class_declaration
  name: (type_identifier) @name
  body: (class_body) @body) @class
"#;

/// An import statement referencing the requested name.
#[derive(Debug, Clone, Serialize)]
pub struct ImportMatch {
    pub line: usize,
    pub text: String,
    pub span: Span,
}

/// A call site of the requested function.
#[derive(Debug, Clone, Serialize)]
pub struct CallMatch {
    pub line: usize,
    pub column: usize,
    pub text: String,
    pub span: Span,
    /// Text of the first argument, when extraction was requested and the
    /// call has at least one argument.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_arg: Option<String>,
}

/// A class declaration with its name and body extent.
#[derive(Debug, Clone, Serialize)]
pub struct ClassMatch {
    pub name: String,
    pub line: usize,
    pub column: usize,
    pub span: Span,
    pub body_span: Span,
}

/// Matches found in one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileMatches<T> {
    pub file: PathBuf,
    pub matches: Vec<T>,
}

/// A file that could not be read or parsed during a scan.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub file: PathBuf,
    pub error: String,
}

/// Result of one operation across the codebase.
///
/// Matches are grouped per file; files with zero matches are omitted.
#[derive(Debug, Serialize)]
pub struct Scan<T> {
    pub files: Vec<FileMatches<T>>,
    pub skipped: Vec<SkippedFile>,
}

impl<T> Scan<T> {
    /// Total matches across all files.
    pub fn total(&self) -> usize {
        self.files.iter().map(|f| f.matches.len()).sum()
    }
}

/// Statistics plus the files that could not be analyzed.
#[derive(Debug, Serialize)]
pub struct StatsScan {
    pub stats: CodebaseStats,
    pub skipped: Vec<SkippedFile>,
}

/// Stateless analysis facade over a workspace of parsed trees.
#[derive(Debug)]
pub struct Analyzer {
    workspace: Workspace,
}

impl Analyzer {
    /// Open an analyzer over a codebase root (directory or single file).
    pub fn new(root: impl AsRef<Path>) -> Result<Analyzer> {
        Self::with_options(root, ScanOptions::default())
    }

    pub fn with_options(root: impl AsRef<Path>, options: ScanOptions) -> Result<Analyzer> {
        Ok(Analyzer {
            workspace: Workspace::with_options(root, options)?,
        })
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    /// Drop all cached parse trees.
    pub fn clear_cache(&mut self) {
        self.workspace.clear_cache();
    }

    /// Find import statements that reference `name`.
    ///
    /// Matching is substring containment over the statement text, so both
    /// named specifiers and module paths hit.
    pub fn find_imports(&mut self, name: &str) -> Result<Scan<ImportMatch>> {
        if name.is_empty() {
            return Err(Error::InvalidInput("import name must not be empty".into()));
        }

        self.scan(|file| {
            let pattern = QueryPattern::compile(file.dialect, IMPORT_QUERY)?;
            let mut out = Vec::new();
            for m in pattern.matches(file) {
                for cap in m.captures {
                    if cap.text.contains(name) {
                        out.push(ImportMatch {
                            line: cap.span.start_line,
                            text: cap.text.trim().to_string(),
                            span: cap.span,
                        });
                    }
                }
            }
            Ok(out)
        })
    }

    /// Find call sites of `name`, matching both `name(...)` and
    /// `receiver.name(...)`.
    ///
    /// With `extract_first_arg` set, each match also carries the text of
    /// its first argument; zero-argument calls still match, with no
    /// first argument.
    pub fn find_function_calls(
        &mut self,
        name: &str,
        extract_first_arg: bool,
    ) -> Result<Scan<CallMatch>> {
        if name.is_empty() {
            return Err(Error::InvalidInput(
                "function name must not be empty".into(),
            ));
        }

        self.scan(|file| {
            let pattern = QueryPattern::compile(file.dialect, CALL_QUERY)?;
            let query = pattern.query();
            let source = file.text.as_bytes();

            let mut cursor = QueryCursor::new();
            let mut matches = cursor.matches(query, file.tree().root_node(), source);

            let mut out = Vec::new();
            while let Some(m) = matches.next() {
                let mut callee = None;
                let mut call = None;
                let mut args = None;
                for capture in m.captures {
                    match query.capture_names()[capture.index as usize] {
                        "callee" => callee = Some(capture.node),
                        "call" => call = Some(capture.node),
                        "args" => args = Some(capture.node),
                        _ => {}
                    }
                }
                let (callee, call) = match (callee, call) {
                    (Some(callee), Some(call)) => (callee, call),
                    _ => continue,
                };
                if callee.utf8_text(source).unwrap_or("") != name {
                    continue;
                }

                let first_arg = if extract_first_arg {
                    args.and_then(|a| a.named_child(0))
                        .and_then(|n| n.utf8_text(source).ok())
                        .map(|s| s.trim().to_string())
                } else {
                    None
                };

                let span = Span::of(&call);
                out.push(CallMatch {
                    line: span.start_line,
                    column: span.start_column,
                    text: file.slice(span.start_byte, span.end_byte).trim().to_string(),
                    first_arg,
                    span,
                });
            }
            Ok(out)
        })
    }

    /// Find class declarations, optionally filtered by name.
    ///
    /// Each declaration present in the source yields exactly one match.
    pub fn find_class_definitions(
        &mut self,
        name_filter: Option<&str>,
    ) -> Result<Scan<ClassMatch>> {
        self.scan(|file| {
            let pattern = QueryPattern::compile(file.dialect, CLASS_QUERY)?;
            let query = pattern.query();
            let source = file.text.as_bytes();

            let mut cursor = QueryCursor::new();
            let mut matches = cursor.matches(query, file.tree().root_node(), source);

            let mut out = Vec::new();
            while let Some(m) = matches.next() {
                let mut name = None;
                let mut class = None;
                let mut body = None;
                for capture in m.captures {
                    match query.capture_names()[capture.index as usize] {
                        "name" => name = Some(capture.node),
                        "class" => class = Some(capture.node),
                        "body" => body = Some(capture.node),
                        _ => {}
                    }
                }
                let (name, class, body) = match (name, class, body) {
                    (Some(n), Some(c), Some(b)) => (n, c, b),
                    _ => continue,
                };
                let class_name = name.utf8_text(source).unwrap_or("").to_string();
                if let Some(filter) = name_filter {
                    if class_name != filter {
                        continue;
                    }
                }

                let span = Span::of(&class);
                out.push(ClassMatch {
                    name: class_name,
                    line: span.start_line,
                    column: span.start_column,
                    span,
                    body_span: Span::of(&body),
                });
            }
            Ok(out)
        })
    }

    /// Run a raw tree-sitter query across the codebase and return the
    /// engine's matches unmodified.
    ///
    /// A syntactically invalid pattern fails with `Error::QuerySyntax`
    /// before any file is touched. A pattern that compiles for plain
    /// TypeScript but not for a particular file's dialect skips that file.
    pub fn custom_query(&mut self, pattern: &str) -> Result<Scan<RawMatch>> {
        // Validate up front so a syntax error surfaces even over an empty
        // codebase.
        QueryPattern::compile(Dialect::TypeScript, pattern)?;

        self.scan(|file| {
            let compiled = QueryPattern::compile(file.dialect, pattern)?;
            Ok(compiled.matches(file))
        })
    }

    /// Summarize the codebase: file and line counts plus per-construct
    /// totals.
    pub fn stats(&mut self) -> Result<StatsScan> {
        let paths = self.workspace.discover()?;
        let mut stats = CodebaseStats::default();
        let mut skipped = Vec::new();

        for path in paths {
            match self.workspace.source(&path) {
                Ok(source) => stats.add_file(source)?,
                Err(e) => skipped.push(SkippedFile {
                    file: path,
                    error: e.to_string(),
                }),
            }
        }

        stats.finish();
        Ok(StatsScan { stats, skipped })
    }

    fn scan<T>(
        &mut self,
        per_file: impl Fn(&SourceFile) -> Result<Vec<T>>,
    ) -> Result<Scan<T>> {
        let paths = self.workspace.discover()?;
        let mut files = Vec::new();
        let mut skipped = Vec::new();

        for path in paths {
            // Any per-file failure (read, parse, or a query that does not
            // compile under this file's dialect) skips that file only.
            let result = self
                .workspace
                .source(&path)
                .and_then(|source| per_file(source));
            let matches = match result {
                Ok(matches) => matches,
                Err(e) => {
                    skipped.push(SkippedFile {
                        file: path,
                        error: e.to_string(),
                    });
                    continue;
                }
            };
            if !matches.is_empty() {
                files.push(FileMatches {
                    file: path,
                    matches,
                });
            }
        }

        Ok(Scan { files, skipped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_fixture(dir: &TempDir, name: &str, content: &str) {
        std::fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn test_find_imports_spanning_statement() {
        let temp = TempDir::new().unwrap();
        write_fixture(
            &temp,
            "app.ts",
            "import {UserService} from './x';\nnew UserService();\n",
        );

        let mut analyzer = Analyzer::new(temp.path()).unwrap();
        let scan = analyzer.find_imports("UserService").unwrap();

        assert_eq!(scan.total(), 1);
        let m = &scan.files[0].matches[0];
        assert_eq!(m.line, 1);
        assert_eq!(m.text, "import {UserService} from './x';");
    }

    #[test]
    fn test_find_imports_empty_name_rejected() {
        let temp = TempDir::new().unwrap();
        write_fixture(&temp, "app.ts", "let a = 1;\n");

        let mut analyzer = Analyzer::new(temp.path()).unwrap();
        let err = analyzer.find_imports("").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_find_function_calls_first_arg() {
        let temp = TempDir::new().unwrap();
        write_fixture(&temp, "api.ts", "fetchData('/api/x');\n");

        let mut analyzer = Analyzer::new(temp.path()).unwrap();
        let scan = analyzer.find_function_calls("fetchData", true).unwrap();

        assert_eq!(scan.total(), 1);
        let m = &scan.files[0].matches[0];
        assert_eq!(m.first_arg.as_deref(), Some("'/api/x'"));
        assert_eq!(m.text, "fetchData('/api/x')");
    }

    #[test]
    fn test_find_function_calls_zero_args() {
        let temp = TempDir::new().unwrap();
        write_fixture(&temp, "api.ts", "refresh();\n");

        let mut analyzer = Analyzer::new(temp.path()).unwrap();
        let scan = analyzer.find_function_calls("refresh", true).unwrap();

        assert_eq!(scan.total(), 1);
        assert_eq!(scan.files[0].matches[0].first_arg, None);
    }

    #[test]
    fn test_find_function_calls_member_callee() {
        let temp = TempDir::new().unwrap();
        write_fixture(
            &temp,
            "api.ts",
            "client.fetchData('/a');\nfetchData('/b');\nother('/c');\n",
        );

        let mut analyzer = Analyzer::new(temp.path()).unwrap();
        let scan = analyzer.find_function_calls("fetchData", false).unwrap();
        assert_eq!(scan.total(), 2);
    }

    #[test]
    fn test_find_class_definitions_one_per_class() {
        let temp = TempDir::new().unwrap();
        write_fixture(
            &temp,
            "models.ts",
            "class A {}\nclass B { method() { return 1; } }\n",
        );

        let mut analyzer = Analyzer::new(temp.path()).unwrap();
        let scan = analyzer.find_class_definitions(None).unwrap();

        assert_eq!(scan.total(), 2);
        let names: Vec<_> = scan.files[0].matches.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_find_class_definitions_name_filter() {
        let temp = TempDir::new().unwrap();
        write_fixture(&temp, "models.ts", "class A {}\nclass B {}\n");

        let mut analyzer = Analyzer::new(temp.path()).unwrap();
        let scan = analyzer.find_class_definitions(Some("B")).unwrap();

        assert_eq!(scan.total(), 1);
        assert_eq!(scan.files[0].matches[0].name, "B");
    }

    #[test]
    fn test_custom_query_invalid_pattern() {
        let temp = TempDir::new().unwrap();
        write_fixture(&temp, "app.ts", "let a = 1;\n");

        let mut analyzer = Analyzer::new(temp.path()).unwrap();
        let err = analyzer.custom_query("not a valid pattern (").unwrap_err();
        assert!(matches!(err, Error::QuerySyntax { .. }));
    }

    #[test]
    fn test_custom_query_dialect_mismatch_skips_file() {
        let temp = TempDir::new().unwrap();
        write_fixture(&temp, "cast.ts", "const n = <number>value;\n");
        write_fixture(&temp, "view.tsx", "export const x = 1;\n");

        let mut analyzer = Analyzer::new(temp.path()).unwrap();
        // type_assertion exists only in the plain TypeScript grammar; the
        // TSX grammar reserves angle brackets for JSX. The .tsx file is
        // skipped, the .ts file still matches.
        let scan = analyzer.custom_query("(type_assertion) @cast").unwrap();

        assert_eq!(scan.total(), 1);
        assert!(scan.files[0].file.ends_with("cast.ts"));
        assert_eq!(scan.skipped.len(), 1);
        assert!(scan.skipped[0].file.ends_with("view.tsx"));
        assert!(scan.skipped[0].error.contains("invalid query"));
    }

    #[test]
    fn test_custom_query_raw_matches() {
        let temp = TempDir::new().unwrap();
        write_fixture(&temp, "app.ts", "interface Foo { a: number; }\n");

        let mut analyzer = Analyzer::new(temp.path()).unwrap();
        let scan = analyzer
            .custom_query("(interface_declaration name: (type_identifier) @iface)")
            .unwrap();

        assert_eq!(scan.total(), 1);
        let cap = &scan.files[0].matches[0].captures[0];
        assert_eq!(cap.name, "iface");
        assert_eq!(cap.text, "Foo");
    }

    #[test]
    fn test_results_grouped_per_file() {
        let temp = TempDir::new().unwrap();
        write_fixture(&temp, "a.ts", "class A {}\n");
        write_fixture(&temp, "b.ts", "class B {}\n");
        write_fixture(&temp, "c.ts", "let c = 1;\n");

        let mut analyzer = Analyzer::new(temp.path()).unwrap();
        let scan = analyzer.find_class_definitions(None).unwrap();

        // Two files with matches; the match-free file is omitted.
        assert_eq!(scan.files.len(), 2);
        assert!(scan.files[0].file.ends_with("a.ts"));
        assert!(scan.files[1].file.ends_with("b.ts"));
    }

    #[test]
    fn test_idempotent_on_unchanged_source() {
        let temp = TempDir::new().unwrap();
        write_fixture(&temp, "app.ts", "import {A} from './a';\nimport {B} from './b';\n");

        let mut analyzer = Analyzer::new(temp.path()).unwrap();
        let first = analyzer.find_imports("A").unwrap();
        let second = analyzer.find_imports("A").unwrap();

        assert_eq!(first.total(), second.total());
        assert_eq!(
            first.files[0].matches[0].span,
            second.files[0].matches[0].span
        );
    }

    #[test]
    fn test_unreadable_file_skipped_scan_continues() {
        let temp = TempDir::new().unwrap();
        write_fixture(&temp, "good.ts", "class Good {}\n");
        // Invalid UTF-8 makes the file unreadable as text.
        std::fs::write(temp.path().join("bad.ts"), [0xff, 0xfe, 0x00, 0xff]).unwrap();

        let mut analyzer = Analyzer::new(temp.path()).unwrap();
        let scan = analyzer.find_class_definitions(None).unwrap();

        assert_eq!(scan.total(), 1);
        assert_eq!(scan.skipped.len(), 1);
        assert!(scan.skipped[0].file.ends_with("bad.ts"));
    }

    #[test]
    fn test_reparse_after_change() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("app.ts");
        std::fs::write(&file, "class A {}\n").unwrap();

        let mut analyzer = Analyzer::new(temp.path()).unwrap();
        assert_eq!(analyzer.find_class_definitions(None).unwrap().total(), 1);

        std::fs::write(&file, "class A {}\nclass B {}\n").unwrap();
        analyzer.clear_cache();
        assert_eq!(analyzer.find_class_definitions(None).unwrap().total(), 2);
    }
}
