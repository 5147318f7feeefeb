//! Closed set of Python node kinds the analyzers dispatch on.

use tree_sitter::Node;

/// Python syntax node kinds relevant to metrics.
///
/// Every tree-sitter kind string maps to exactly one variant; anything the
/// analyzers never look at is [`NodeKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Module,
    FunctionDef,
    ClassDef,
    Decorated,
    Decorator,
    If,
    Elif,
    Else,
    For,
    While,
    Try,
    Except,
    With,
    BoolOp,
    Call,
    Import,
    ImportFrom,
    Identifier,
    Attribute,
    Assignment,
    AugAssignment,
    ExpressionStatement,
    Block,
    Return,
    Await,
    Lambda,
    ListComp,
    SetComp,
    DictComp,
    GeneratorExp,
    List,
    Dict,
    Set,
    Str,
    Comment,
    Other,
}

impl NodeKind {
    /// Classify a tree-sitter node.
    pub fn of(node: &Node<'_>) -> Self {
        Self::from_kind(node.kind())
    }

    /// Classify a tree-sitter kind string.
    pub fn from_kind(kind: &str) -> Self {
        match kind {
            "module" => Self::Module,
            "function_definition" => Self::FunctionDef,
            "class_definition" => Self::ClassDef,
            "decorated_definition" => Self::Decorated,
            "decorator" => Self::Decorator,
            "if_statement" => Self::If,
            "elif_clause" => Self::Elif,
            "else_clause" => Self::Else,
            "for_statement" => Self::For,
            "while_statement" => Self::While,
            "try_statement" => Self::Try,
            "except_clause" | "except_group_clause" => Self::Except,
            "with_statement" => Self::With,
            "boolean_operator" => Self::BoolOp,
            "call" => Self::Call,
            "import_statement" => Self::Import,
            "import_from_statement" | "future_import_statement" => Self::ImportFrom,
            "identifier" => Self::Identifier,
            "attribute" => Self::Attribute,
            "assignment" => Self::Assignment,
            "augmented_assignment" => Self::AugAssignment,
            "expression_statement" => Self::ExpressionStatement,
            "block" => Self::Block,
            "return_statement" => Self::Return,
            "await" => Self::Await,
            "lambda" => Self::Lambda,
            "list_comprehension" => Self::ListComp,
            "set_comprehension" => Self::SetComp,
            "dictionary_comprehension" => Self::DictComp,
            "generator_expression" => Self::GeneratorExp,
            "list" => Self::List,
            "dictionary" => Self::Dict,
            "set" => Self::Set,
            "string" | "concatenated_string" => Self::Str,
            "comment" => Self::Comment,
            _ => Self::Other,
        }
    }

    /// Constructs that add a decision point to cyclomatic complexity.
    pub fn is_decision(self) -> bool {
        matches!(
            self,
            Self::If | Self::Elif | Self::For | Self::While | Self::Try | Self::With
        )
    }

    /// Constructs that open a nesting level.
    pub fn is_nesting(self) -> bool {
        matches!(
            self,
            Self::If | Self::For | Self::While | Self::Try | Self::With
        )
    }

    /// Loop constructs.
    pub fn is_loop(self) -> bool {
        matches!(self, Self::For | Self::While)
    }

    /// Comprehension-style expressions.
    pub fn is_comprehension(self) -> bool {
        matches!(
            self,
            Self::ListComp | Self::SetComp | Self::DictComp | Self::GeneratorExp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_kind() {
        assert_eq!(NodeKind::from_kind("function_definition"), NodeKind::FunctionDef);
        assert_eq!(NodeKind::from_kind("boolean_operator"), NodeKind::BoolOp);
        assert_eq!(NodeKind::from_kind("import_from_statement"), NodeKind::ImportFrom);
        assert_eq!(NodeKind::from_kind("pass_statement"), NodeKind::Other);
    }

    #[test]
    fn test_decision_kinds() {
        assert!(NodeKind::If.is_decision());
        assert!(NodeKind::Elif.is_decision());
        assert!(NodeKind::With.is_decision());
        assert!(!NodeKind::Else.is_decision());
        assert!(!NodeKind::BoolOp.is_decision());
    }

    #[test]
    fn test_nesting_kinds() {
        assert!(NodeKind::For.is_nesting());
        assert!(!NodeKind::Elif.is_nesting());
        assert!(NodeKind::While.is_loop());
        assert!(!NodeKind::If.is_loop());
        assert!(NodeKind::GeneratorExp.is_comprehension());
    }
}
