//! Codebase statistics.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;
use crate::query::QueryPattern;
use crate::workspace::SourceFile;

/// Query for counting construct kinds across a file.
const STATS_QUERY: &str = r#"
(import_statement) @import
(export_statement) @export
(class_declaration) @class
(interface_declaration) @interface
(function_declaration) @function
(type_alias_declaration) @type_alias
"#;

/// Aggregate statistics over a codebase.
#[derive(Debug, Default, Serialize)]
pub struct CodebaseStats {
    pub total_files: usize,
    pub total_lines: usize,
    pub imports: usize,
    pub exports: usize,
    pub classes: usize,
    pub interfaces: usize,
    pub functions: usize,
    pub type_aliases: usize,
    pub avg_lines_per_file: f64,
    /// Line count per file, keyed by display path.
    pub file_sizes: BTreeMap<String, usize>,
}

impl CodebaseStats {
    /// Fold one file into the totals.
    pub(crate) fn add_file(&mut self, file: &SourceFile) -> Result<()> {
        self.total_files += 1;
        let lines = file.text.lines().count();
        self.total_lines += lines;
        self.file_sizes
            .insert(file.path.display().to_string(), lines);

        let pattern = QueryPattern::compile(file.dialect, STATS_QUERY)?;
        for m in pattern.matches(file) {
            for cap in &m.captures {
                match cap.name.as_str() {
                    "import" => self.imports += 1,
                    "export" => self.exports += 1,
                    "class" => self.classes += 1,
                    "interface" => self.interfaces += 1,
                    "function" => self.functions += 1,
                    "type_alias" => self.type_aliases += 1,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    pub(crate) fn finish(&mut self) {
        self.avg_lines_per_file = if self.total_files > 0 {
            self.total_lines as f64 / self.total_files as f64
        } else {
            0.0
        };
    }
}
