//! Codebase discovery and the per-file parse cache.
//!
//! A `Workspace` owns the set of `SourceFile`s for a codebase root. Files
//! are read and parsed on first access and cached until `clear_cache` or
//! `invalidate` drops them. A `SourceFile`'s tree is always the parse of
//! its current text; reparsing replaces both together.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use once_cell::sync::Lazy;
use tree_sitter::{Language, Parser as TsParser, Tree};
use walkdir::WalkDir;

use crate::error::{Error, Result};

static TYPESCRIPT: Lazy<Language> =
    Lazy::new(|| tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into());
static TSX: Lazy<Language> = Lazy::new(|| tree_sitter_typescript::LANGUAGE_TSX.into());

/// Grammar dialect for a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    TypeScript,
    Tsx,
}

impl Dialect {
    /// Pick a dialect from a file extension. `.tsx` gets the TSX grammar,
    /// anything else the plain TypeScript grammar.
    pub fn from_path(path: &Path) -> Option<Dialect> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ts") => Some(Dialect::TypeScript),
            Some("tsx") => Some(Dialect::Tsx),
            _ => None,
        }
    }

    pub(crate) fn language(self) -> &'static Language {
        match self {
            Dialect::TypeScript => &TYPESCRIPT,
            Dialect::Tsx => &TSX,
        }
    }

    /// Language name for display (e.g., "typescript").
    pub fn name(self) -> &'static str {
        match self {
            Dialect::TypeScript => "typescript",
            Dialect::Tsx => "tsx",
        }
    }
}

/// A source file with its owned syntax tree.
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub dialect: Dialect,
    pub text: String,
    tree: Tree,
}

impl SourceFile {
    /// Read a file from disk and parse it.
    pub fn load(path: &Path) -> Result<SourceFile> {
        let dialect = Dialect::from_path(path).unwrap_or(Dialect::TypeScript);
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_text(path, dialect, text)
    }

    /// Build a source file from in-memory text.
    pub fn from_text(path: &Path, dialect: Dialect, text: String) -> Result<SourceFile> {
        let tree = parse(dialect, &text, path)?;
        Ok(SourceFile {
            path: path.to_path_buf(),
            dialect,
            text,
            tree,
        })
    }

    /// The current syntax tree. Always consistent with `text`.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Replace the text and rebuild the tree. The old tree is never visible
    /// alongside the new text.
    pub fn reparse(&mut self, text: String) -> Result<()> {
        let tree = parse(self.dialect, &text, &self.path)?;
        self.text = text;
        self.tree = tree;
        Ok(())
    }

    /// Text for a byte range of this file. Offsets must come from nodes of
    /// this file's own tree.
    pub(crate) fn slice(&self, start_byte: usize, end_byte: usize) -> &str {
        &self.text[start_byte..end_byte]
    }
}

fn parse(dialect: Dialect, text: &str, path: &Path) -> Result<Tree> {
    let mut parser = TsParser::new();
    parser
        .set_language(dialect.language())
        .map_err(|_| Error::parse(path))?;
    parser
        .parse(text.as_bytes(), None)
        .ok_or_else(|| Error::parse(path))
}

/// Options controlling which files a workspace discovers.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Include `.tsx` files (default: true).
    pub include_tsx: bool,
    /// Include files under `node_modules` (default: false).
    pub include_node_modules: bool,
    /// Glob patterns, relative to the root, for files to skip.
    pub exclude: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            include_tsx: true,
            include_node_modules: false,
            exclude: Vec::new(),
        }
    }
}

/// A codebase root plus the parse cache for its files.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    options: ScanOptions,
    exclude: GlobSet,
    cache: HashMap<PathBuf, SourceFile>,
}

impl Workspace {
    /// Open a workspace with default options.
    pub fn open(root: impl AsRef<Path>) -> Result<Workspace> {
        Self::with_options(root, ScanOptions::default())
    }

    /// Open a workspace over a directory or a single file.
    pub fn with_options(root: impl AsRef<Path>, options: ScanOptions) -> Result<Workspace> {
        let root = root.as_ref();
        let root = root.canonicalize().map_err(|e| Error::io(root, e))?;

        let mut builder = GlobSetBuilder::new();
        for pattern in &options.exclude {
            builder.add(Glob::new(pattern)?);
        }
        let exclude = builder.build()?;

        Ok(Workspace {
            root,
            options,
            exclude,
            cache: HashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find all TypeScript files under the root, sorted by path.
    ///
    /// Hidden directories are always skipped; `node_modules` is skipped
    /// unless `include_node_modules` is set.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        if self.root.is_file() {
            return Ok(vec![self.root.clone()]);
        }

        let include_node_modules = self.options.include_node_modules;
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(move |e| {
                if e.depth() == 0 {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                if e.file_type().is_dir() && name.starts_with('.') {
                    return false;
                }
                if e.file_type().is_dir() && !include_node_modules && name == "node_modules" {
                    return false;
                }
                true
            })
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let dialect = match Dialect::from_path(path) {
                Some(d) => d,
                None => continue,
            };
            if dialect == Dialect::Tsx && !self.options.include_tsx {
                continue;
            }
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            if self.exclude.is_match(relative) {
                continue;
            }
            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    /// Parsed source for a path, parsing and caching on first access.
    pub fn source(&mut self, path: &Path) -> Result<&SourceFile> {
        if !self.cache.contains_key(path) {
            let file = SourceFile::load(path)?;
            self.cache.insert(path.to_path_buf(), file);
        }
        Ok(&self.cache[path])
    }

    /// Drop one cached file so the next access re-reads it from disk.
    pub fn invalidate(&mut self, path: &Path) {
        self.cache.remove(path);
    }

    /// Drop every cached file.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}
