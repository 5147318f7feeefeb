//! Tree-sitter based Python parser.
//!
//! The parser is the external collaborator that turns source text into a
//! syntax tree. Everything downstream reads trees through [`NodeKind`] and the
//! [`visitor`] runtime rather than matching raw tree-sitter kind strings.

mod kind;
pub mod records;
pub mod visitor;

use std::path::Path;

use parking_lot::Mutex;
use tree_sitter::{Node, Parser as TsParser, Tree};

use crate::core::{Error, Result};

pub use kind::NodeKind;
pub use records::{AttributeRecord, ClassRecord, FunctionRecord, ImportRecord, ImportSet};
pub use visitor::{walk, Descend, Visitor};

/// Thread-safe Python parser.
pub struct Parser {
    /// Lazily initialized tree-sitter parser.
    inner: Mutex<Option<TsParser>>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Parse Python source into a syntax tree.
    ///
    /// Tree-sitter recovers from syntax errors, so a returned tree may still
    /// contain error nodes. See [`first_error_line`].
    pub fn parse(&self, content: &[u8], path: &Path) -> Result<Tree> {
        let mut guard = self.inner.lock();
        if guard.is_none() {
            let mut parser = TsParser::new();
            parser
                .set_language(&tree_sitter_python::LANGUAGE.into())
                .map_err(|e| Error::Parse {
                    path: path.to_path_buf(),
                    message: format!("Failed to load Python grammar: {e}"),
                })?;
            *guard = Some(parser);
        }
        let parser = guard.as_mut().ok_or_else(|| Error::Parse {
            path: path.to_path_buf(),
            message: "Parser unavailable".to_string(),
        })?;

        parser.parse(content, None).ok_or_else(|| Error::Parse {
            path: path.to_path_buf(),
            message: "Failed to parse file".to_string(),
        })
    }
}

/// Line (1-indexed) of the first error or missing node, if any.
pub fn first_error_line(root: Node<'_>) -> Option<u32> {
    if !root.has_error() {
        return None;
    }

    struct FirstError(Option<u32>);

    impl<'t> Visitor<'t> for FirstError {
        fn enter(&mut self, node: Node<'t>, _kind: NodeKind) -> Descend {
            if self.0.is_some() {
                return Descend::Skip;
            }
            if node.is_error() || node.is_missing() {
                self.0 = Some(start_line(&node));
                return Descend::Skip;
            }
            if node.has_error() {
                Descend::Continue
            } else {
                Descend::Skip
            }
        }
    }

    let mut finder = FirstError(None);
    walk(root, &mut finder);
    finder.0.or(Some(start_line(&root)))
}

/// Start line of a node (1-indexed).
pub fn start_line(node: &Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

/// End line of a node (1-indexed).
pub fn end_line(node: &Node<'_>) -> u32 {
    node.end_position().row as u32 + 1
}

/// Text of a node's named field.
pub fn field_text<'s>(node: &Node<'_>, field: &str, source: &'s str) -> Option<&'s str> {
    node.child_by_field_name(field)
        .and_then(|n| n.utf8_text(source.as_bytes()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(code: &str) -> Tree {
        Parser::new().parse(code.as_bytes(), Path::new("test.py")).unwrap()
    }

    #[test]
    fn test_parse_python() {
        let tree = parse("def hello():\n    print('Hello')\n");
        let root = tree.root_node();
        assert_eq!(root.kind(), "module");
        assert!(!root.has_error());
    }

    #[test]
    fn test_parser_is_reusable() {
        let parser = Parser::new();
        let first = parser.parse(b"x = 1\n", Path::new("a.py")).unwrap();
        let second = parser.parse(b"y = 2\n", Path::new("b.py")).unwrap();
        assert_eq!(first.root_node().kind(), "module");
        assert_eq!(second.root_node().kind(), "module");
    }

    #[test]
    fn test_first_error_line() {
        let tree = parse("x = 1\ny = 2\ndef broken(:\n    pass\n");
        let line = first_error_line(tree.root_node());
        assert!(line.is_some());
        assert!(line.unwrap() >= 3);

        let tree = parse("x = 1\n");
        assert_eq!(first_error_line(tree.root_node()), None);
    }

    #[test]
    fn test_lines_and_field_text() {
        let code = "\n\ndef f(a):\n    return a\n";
        let tree = parse(code);
        let func = tree.root_node().named_child(0).unwrap();
        assert_eq!(start_line(&func), 3);
        assert_eq!(end_line(&func), 4);
        assert_eq!(field_text(&func, "name", code), Some("f"));
    }
}
