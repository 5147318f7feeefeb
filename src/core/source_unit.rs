//! One analyzed source file and its syntax tree.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tree_sitter::{Node, Tree};

use super::Error;
use crate::parser::{self, Parser};

/// A Python source file with its parsed tree.
///
/// Files that cannot be read, decoded or parsed are still represented, with
/// `skipped` set and no tree. Analyzers return zero-valued metrics for them.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// Path to the file.
    pub path: PathBuf,
    /// Decoded file content (empty when decoding failed).
    pub source: String,
    /// Size in bytes.
    pub size: u64,
    /// Number of lines.
    pub line_count: usize,
    /// Whether the file was skipped.
    pub skipped: bool,
    /// Why the file was skipped.
    pub skip_reason: Option<String>,
    /// Byte offset where each line starts.
    line_starts: Vec<usize>,
    tree: Option<Arc<Tree>>,
}

impl SourceUnit {
    /// Read and parse a file from disk.
    ///
    /// Never fails: unreadable, oversized, undecodable or syntactically
    /// invalid files come back as skipped units.
    pub fn load(path: impl AsRef<Path>, parser: &Parser, max_size: u64) -> Self {
        let path = path.as_ref();
        if let Ok(metadata) = std::fs::metadata(path) {
            if metadata.len() > max_size {
                return Self::skipped(
                    path,
                    metadata.len(),
                    format!("File too large: {} bytes (max {max_size})", metadata.len()),
                );
            }
        }
        match std::fs::read(path) {
            Ok(bytes) => Self::from_bytes(path, bytes, parser),
            Err(e) => Self::skipped(path, 0, Error::from(e).to_string()),
        }
    }

    /// Build a unit from raw bytes.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>, parser: &Parser) -> Self {
        let path = path.into();
        let size = bytes.len() as u64;
        let source = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(_) => {
                let reason = Error::Decode { path: path.clone() }.to_string();
                return Self::skipped(&path, size, reason);
            }
        };
        let line_count = source.lines().count();

        let tree = match parser.parse(source.as_bytes(), &path) {
            Ok(tree) => tree,
            Err(e) => {
                let mut unit = Self::skipped(&path, size, e.to_string());
                unit.line_count = line_count;
                unit.line_starts = line_starts(&source);
                unit.source = source;
                return unit;
            }
        };

        if let Some(line) = parser::first_error_line(tree.root_node()) {
            let reason = Error::Parse {
                path: path.clone(),
                message: format!("syntax error at line {line}"),
            }
            .to_string();
            let mut unit = Self::skipped(&path, size, reason);
            unit.line_count = line_count;
            unit.line_starts = line_starts(&source);
            unit.source = source;
            return unit;
        }

        Self {
            path,
            line_starts: line_starts(&source),
            source,
            size,
            line_count,
            skipped: false,
            skip_reason: None,
            tree: Some(Arc::new(tree)),
        }
    }

    /// Build a unit from a source string.
    pub fn parse(path: impl Into<PathBuf>, source: &str, parser: &Parser) -> Self {
        Self::from_bytes(path, source.as_bytes().to_vec(), parser)
    }

    fn skipped(path: &Path, size: u64, reason: String) -> Self {
        tracing::debug!(file = %path.display(), reason = %reason, "unit skipped");
        Self {
            path: path.to_path_buf(),
            source: String::new(),
            size,
            line_count: 0,
            skipped: true,
            skip_reason: Some(reason),
            line_starts: vec![0],
            tree: None,
        }
    }

    /// Root node of the syntax tree, if the file parsed.
    pub fn root(&self) -> Option<Node<'_>> {
        self.tree.as_ref().map(|t| t.root_node())
    }

    /// Source text covered by a node.
    pub fn text(&self, node: &Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// The line at a 1-indexed line number.
    pub fn line(&self, line: u32) -> &str {
        let Some(&start) = (line as usize).checked_sub(1).and_then(|idx| self.line_starts.get(idx)) else {
            return "";
        };
        let end = self
            .line_starts
            .get(line as usize)
            .copied()
            .unwrap_or(self.source.len());
        self.source
            .get(start..end)
            .unwrap_or("")
            .trim_end_matches('\n')
            .trim_end_matches('\r')
    }

    /// Count lines that are comments (best effort, not tree-derived).
    pub fn comment_lines(&self) -> usize {
        self.source
            .lines()
            .filter(|line| line.trim_start().starts_with('#'))
            .count()
    }

    /// Path rendered for reports.
    pub fn display_path(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    /// Dotted module path this file provides when imported from `root`.
    ///
    /// `pkg/util.py` is `pkg.util`; a package's `pkg/__init__.py` is `pkg`.
    pub fn module_path(&self, root: &Path) -> String {
        let relative = self.path.strip_prefix(root).unwrap_or(&self.path);
        let mut parts: Vec<String> = relative
            .with_extension("")
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().to_string()),
                _ => None,
            })
            .collect();
        if parts.last().is_some_and(|p| p == "__init__") {
            parts.pop();
        }
        parts.join(".")
    }

    /// Whether this file is a package's `__init__`.
    pub fn is_package_init(&self) -> bool {
        self.path.file_stem().is_some_and(|s| s == "__init__")
    }
}

fn line_starts(source: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(
            source
                .match_indices('\n')
                .map(|(i, _)| i + 1)
                .filter(|&start| start < source.len()),
        )
        .collect()
}
