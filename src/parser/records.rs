//! Structural records extracted from a parsed unit.
//!
//! [`extract`] produces one [`FunctionRecord`] per function definition (methods
//! are attached to their [`ClassRecord`]) and [`extract_imports`] produces the
//! file's [`ImportSet`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use super::visitor::{walk, Descend, Visitor};
use super::{end_line, start_line, NodeKind};
use crate::analyzers::complexity;
use crate::core::SourceUnit;

/// A function or method definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Function name.
    pub name: String,
    /// Parameter names in declaration order.
    pub params: Vec<String>,
    /// Number of parameters carrying a type annotation, `self`/`cls` excluded.
    pub annotated_params: usize,
    /// Return annotation text (empty when absent).
    pub returns: String,
    /// Docstring text (empty when absent).
    pub docstring: String,
    /// Number of lines spanned.
    pub lines: u32,
    /// Cyclomatic complexity (at least 1).
    pub cyclomatic: u32,
    /// Cognitive complexity.
    pub cognitive: u32,
    /// Deepest nesting of branch constructs.
    pub max_nesting: u32,
    /// Names read in the body that are neither parameters nor locals.
    pub free_names: BTreeSet<String>,
    /// Number of top-level statements in the body.
    pub body_statements: usize,
    /// Declared with `async def`.
    pub is_async: bool,
    /// Decorator expressions without the leading `@`.
    pub decorators: Vec<String>,
    /// Start line (1-indexed).
    pub start_line: u32,
    /// End line (1-indexed).
    pub end_line: u32,
    /// Owning file.
    pub file: String,
}

impl FunctionRecord {
    /// Parameters that can carry an annotation (`self`/`cls` excluded).
    pub fn annotatable_params(&self) -> usize {
        self.params
            .iter()
            .filter(|p| !is_receiver(p))
            .count()
    }
}

/// A class attribute, declared in the class body or assigned through `self`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AttributeRecord {
    pub name: String,
    pub annotation: Option<String>,
    pub docstring: Option<String>,
    pub line: u32,
}

/// A class definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    pub bases: Vec<String>,
    pub docstring: String,
    pub methods: Vec<FunctionRecord>,
    pub attributes: Vec<AttributeRecord>,
    /// 1 plus the decision points of every method.
    pub complexity: u32,
    pub body_statements: usize,
    pub lines: u32,
    pub start_line: u32,
    pub end_line: u32,
    pub file: String,
}

impl ClassRecord {
    /// Find a method by name.
    pub fn method(&self, name: &str) -> Option<&FunctionRecord> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Find an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeRecord> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// Everything [`extract`] finds in one unit.
#[derive(Debug, Clone, Default)]
pub struct UnitRecords {
    /// Module docstring (empty when absent).
    pub module_docstring: String,
    /// Free functions, including nested ones.
    pub functions: Vec<FunctionRecord>,
    /// Classes, including nested ones.
    pub classes: Vec<ClassRecord>,
}

impl UnitRecords {
    /// Functions and methods together.
    pub fn all_functions(&self) -> impl Iterator<Item = &FunctionRecord> {
        self.functions
            .iter()
            .chain(self.classes.iter().flat_map(|c| c.methods.iter()))
    }
}

/// Extract function and class records from a unit.
pub fn extract(unit: &SourceUnit) -> UnitRecords {
    let Some(root) = unit.root() else {
        return UnitRecords::default();
    };

    let mut collector = RecordCollector {
        unit,
        records: UnitRecords {
            module_docstring: docstring_of(root, unit).unwrap_or_default(),
            ..Default::default()
        },
        class_index: HashMap::new(),
    };
    walk(root, &mut collector);

    let mut records = collector.records;
    for class in &mut records.classes {
        class.complexity = 1 + class
            .methods
            .iter()
            .map(|m| m.cyclomatic.saturating_sub(1))
            .sum::<u32>();
    }
    records
}

struct RecordCollector<'u> {
    unit: &'u SourceUnit,
    records: UnitRecords,
    /// Class node id to index in `records.classes`.
    class_index: HashMap<usize, usize>,
}

impl<'t> Visitor<'t> for RecordCollector<'_> {
    fn enter(&mut self, node: Node<'t>, kind: NodeKind) -> Descend {
        match kind {
            NodeKind::ClassDef => {
                let class = class_record(node, self.unit);
                self.class_index.insert(node.id(), self.records.classes.len());
                self.records.classes.push(class);
            }
            NodeKind::FunctionDef => {
                let record = function_record(node, self.unit);
                match enclosing_class(node).and_then(|c| self.class_index.get(&c.id())) {
                    Some(&idx) => self.records.classes[idx].methods.push(record),
                    None => self.records.functions.push(record),
                }
            }
            _ => {}
        }
        Descend::Continue
    }
}

/// The class whose body directly contains this definition, if any.
pub fn enclosing_class<'t>(def: Node<'t>) -> Option<Node<'t>> {
    let mut parent = def.parent()?;
    if parent.kind() == "decorated_definition" {
        parent = parent.parent()?;
    }
    if parent.kind() != "block" {
        return None;
    }
    parent.parent().filter(|p| p.kind() == "class_definition")
}

fn function_record(node: Node<'_>, unit: &SourceUnit) -> FunctionRecord {
    let name = field(node, "name", unit);
    let (params, annotated_params) = node
        .child_by_field_name("parameters")
        .map(|p| parameters(p, unit))
        .unwrap_or_default();
    let body = node.child_by_field_name("body");
    let measured = complexity::measure(node);

    let free_names = body
        .map(|b| free_names(b, &params, unit))
        .unwrap_or_default();

    FunctionRecord {
        name,
        annotated_params,
        returns: field(node, "return_type", unit),
        docstring: body.and_then(|b| docstring_of(b, unit)).unwrap_or_default(),
        lines: end_line(&node) - start_line(&node) + 1,
        cyclomatic: measured.cyclomatic,
        cognitive: measured.cognitive,
        max_nesting: measured.max_nesting,
        free_names,
        body_statements: body.map(|b| statement_count(b)).unwrap_or(0),
        is_async: node.child(0).is_some_and(|c| c.kind() == "async"),
        decorators: decorators(node, unit),
        start_line: start_line(&node),
        end_line: end_line(&node),
        file: unit.display_path(),
        params,
    }
}

fn class_record(node: Node<'_>, unit: &SourceUnit) -> ClassRecord {
    let body = node.child_by_field_name("body");
    let bases = node
        .child_by_field_name("superclasses")
        .map(|args| {
            let mut cursor = args.walk();
            args.named_children(&mut cursor)
                .filter(|c| c.kind() != "keyword_argument" && c.kind() != "comment")
                .map(|c| unit.text(&c).to_string())
                .collect()
        })
        .unwrap_or_default();

    ClassRecord {
        name: field(node, "name", unit),
        bases,
        docstring: body.and_then(|b| docstring_of(b, unit)).unwrap_or_default(),
        methods: Vec::new(),
        attributes: body.map(|b| attributes(b, unit)).unwrap_or_default(),
        complexity: 1,
        body_statements: body.map(|b| statement_count(b)).unwrap_or(0),
        lines: end_line(&node) - start_line(&node) + 1,
        start_line: start_line(&node),
        end_line: end_line(&node),
        file: unit.display_path(),
    }
}

fn field(node: Node<'_>, name: &str, unit: &SourceUnit) -> String {
    node.child_by_field_name(name)
        .map(|n| unit.text(&n).to_string())
        .unwrap_or_default()
}

fn is_receiver(name: &str) -> bool {
    name == "self" || name == "cls"
}

/// Parameter names and the number of annotated ones other than the receiver.
fn parameters(params: Node<'_>, unit: &SourceUnit) -> (Vec<String>, usize) {
    let mut names = Vec::new();
    let mut annotated = 0;
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        let (name, typed) = match param.kind() {
            "identifier" => (Some(unit.text(&param).to_string()), false),
            "default_parameter" => (
                param.child_by_field_name("name").map(|n| unit.text(&n).to_string()),
                false,
            ),
            "typed_parameter" => (param.named_child(0).map(|n| splat_name(n, unit)), true),
            "typed_default_parameter" => (
                param.child_by_field_name("name").map(|n| unit.text(&n).to_string()),
                true,
            ),
            "list_splat_pattern" | "dictionary_splat_pattern" => (Some(splat_name(param, unit)), false),
            _ => (None, false),
        };
        if let Some(name) = name {
            if typed && !is_receiver(&name) {
                annotated += 1;
            }
            names.push(name);
        }
    }
    (names, annotated)
}

fn splat_name(node: Node<'_>, unit: &SourceUnit) -> String {
    match node.kind() {
        "list_splat_pattern" | "dictionary_splat_pattern" => node
            .named_child(0)
            .map(|n| unit.text(&n).to_string())
            .unwrap_or_default(),
        _ => unit.text(&node).to_string(),
    }
}

fn decorators(def: Node<'_>, unit: &SourceUnit) -> Vec<String> {
    let Some(parent) = def.parent().filter(|p| p.kind() == "decorated_definition") else {
        return Vec::new();
    };
    let mut cursor = parent.walk();
    parent
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "decorator")
        .map(|c| unit.text(&c).trim_start_matches('@').trim().to_string())
        .collect()
}

/// Named statements in a block, comments excluded.
pub fn statement_count(block: Node<'_>) -> usize {
    let mut cursor = block.walk();
    block
        .named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .count()
}

/// Docstring of a module or block: a leading string expression statement.
pub fn docstring_of(container: Node<'_>, unit: &SourceUnit) -> Option<String> {
    let mut cursor = container.walk();
    let first = container
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment")?;
    string_statement(first, unit)
}

fn string_statement(stmt: Node<'_>, unit: &SourceUnit) -> Option<String> {
    if stmt.kind() != "expression_statement" || stmt.named_child_count() != 1 {
        return None;
    }
    let expr = stmt.named_child(0)?;
    if NodeKind::of(&expr) != NodeKind::Str {
        return None;
    }
    Some(strip_string_literal(unit.text(&expr)))
}

/// Remove prefix and quotes from a Python string literal.
pub fn strip_string_literal(text: &str) -> String {
    let text = text.trim();
    let body = text.trim_start_matches(|c: char| "rRuUbBfF".contains(c));
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if body.len() >= quote.len() * 2 && body.starts_with(quote) && body.ends_with(quote) {
            return body[quote.len()..body.len() - quote.len()].trim().to_string();
        }
    }
    body.trim().to_string()
}

/// Attributes declared in a class body or assigned through `self`.
fn attributes(body: Node<'_>, unit: &SourceUnit) -> Vec<AttributeRecord> {
    let mut found: Vec<AttributeRecord> = Vec::new();

    let mut cursor = body.walk();
    let statements: Vec<Node<'_>> = body.named_children(&mut cursor).collect();
    for (i, stmt) in statements.iter().enumerate() {
        let Some(assign) = single_assignment(*stmt) else {
            continue;
        };
        let Some(left) = assign.child_by_field_name("left") else {
            continue;
        };
        if left.kind() != "identifier" {
            continue;
        }
        let docstring = statements
            .get(i + 1)
            .and_then(|next| string_statement(*next, unit));
        push_attribute(&mut found, assign, unit.text(&left), docstring, unit);
    }

    struct SelfAssignments<'a, 'u> {
        unit: &'u SourceUnit,
        found: &'a mut Vec<AttributeRecord>,
    }

    impl<'t> Visitor<'t> for SelfAssignments<'_, '_> {
        fn enter(&mut self, node: Node<'t>, kind: NodeKind) -> Descend {
            match kind {
                NodeKind::ClassDef => Descend::Skip,
                NodeKind::Assignment => {
                    if let Some(name) = node
                        .child_by_field_name("left")
                        .and_then(|left| self_attribute_name(left, self.unit))
                    {
                        push_attribute(self.found, node, name, None, self.unit);
                    }
                    Descend::Continue
                }
                _ => Descend::Continue,
            }
        }
    }

    for stmt in &statements {
        let mut visitor = SelfAssignments {
            unit,
            found: &mut found,
        };
        walk(*stmt, &mut visitor);
    }
    found
}

fn push_attribute(
    found: &mut Vec<AttributeRecord>,
    assign: Node<'_>,
    name: &str,
    docstring: Option<String>,
    unit: &SourceUnit,
) {
    if found.iter().any(|a| a.name == name) {
        return;
    }
    found.push(AttributeRecord {
        name: name.to_string(),
        annotation: assign
            .child_by_field_name("type")
            .map(|t| unit.text(&t).to_string()),
        docstring,
        line: start_line(&assign),
    });
}

/// `self.name` on an assignment target.
fn self_attribute_name<'u>(left: Node<'_>, unit: &'u SourceUnit) -> Option<&'u str> {
    if left.kind() != "attribute" {
        return None;
    }
    let object = left.child_by_field_name("object")?;
    if unit.text(&object) != "self" {
        return None;
    }
    left.child_by_field_name("attribute").map(|a| unit.text(&a))
}

/// The assignment of an expression statement holding exactly one.
pub fn single_assignment(stmt: Node<'_>) -> Option<Node<'_>> {
    if stmt.kind() != "expression_statement" {
        return None;
    }
    stmt.named_child(0).filter(|c| c.kind() == "assignment")
}

/// How an identifier occurrence uses its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRole {
    Load,
    Store,
    Other,
}

/// Classify an identifier as read, written or purely syntactic.
pub fn name_role(ident: Node<'_>) -> NameRole {
    let Some(parent) = ident.parent() else {
        return NameRole::Load;
    };
    let is_field = |name: &str| parent.child_by_field_name(name) == Some(ident);

    match parent.kind() {
        "attribute" if is_field("attribute") => NameRole::Other,
        "keyword_argument" if is_field("name") => NameRole::Other,
        "function_definition" | "class_definition" if is_field("name") => NameRole::Store,
        "parameters" | "lambda_parameters" | "typed_parameter" => NameRole::Store,
        "default_parameter" | "typed_default_parameter" if is_field("name") => NameRole::Store,
        "list_splat_pattern" | "dictionary_splat_pattern" => NameRole::Store,
        "assignment" if is_field("left") => NameRole::Store,
        "for_statement" | "for_in_clause" if is_field("left") => NameRole::Store,
        "pattern_list" | "tuple_pattern" | "list_pattern" | "as_pattern_target" => NameRole::Store,
        "named_expression" if is_field("name") => NameRole::Store,
        "dotted_name" | "aliased_import" | "relative_import" | "import_statement"
        | "import_from_statement" | "global_statement" | "nonlocal_statement" => NameRole::Other,
        _ => NameRole::Load,
    }
}

fn free_names(body: Node<'_>, params: &[String], unit: &SourceUnit) -> BTreeSet<String> {
    struct Names<'u> {
        unit: &'u SourceUnit,
        loads: BTreeSet<String>,
        stores: BTreeSet<String>,
    }

    impl<'t> Visitor<'t> for Names<'_> {
        fn enter(&mut self, node: Node<'t>, kind: NodeKind) -> Descend {
            if kind == NodeKind::Identifier {
                let name = self.unit.text(&node).to_string();
                match name_role(node) {
                    NameRole::Load => {
                        self.loads.insert(name);
                    }
                    NameRole::Store => {
                        self.stores.insert(name);
                    }
                    NameRole::Other => {}
                }
            }
            Descend::Continue
        }
    }

    let mut names = Names {
        unit,
        loads: BTreeSet::new(),
        stores: BTreeSet::new(),
    };
    walk(body, &mut names);
    names
        .loads
        .into_iter()
        .filter(|n| !names.stores.contains(n) && !params.contains(n))
        .collect()
}

/// One import statement binding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportRecord {
    /// Top-level module name (`os` for `import os.path`).
    pub module: String,
    /// Full dotted module as written, without leading dots.
    pub target: String,
    /// Names pulled from `target` by a `from` import, before aliasing.
    pub names: Vec<String>,
    /// Local names the import binds (`*` for wildcard imports).
    pub bound: Vec<String>,
    /// Relative (`from . import x`) imports refer to the project itself.
    pub relative: bool,
    /// Leading dots of a relative import.
    pub level: usize,
    pub line: u32,
}

/// Imports of one file and the subset never referenced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSet {
    pub imports: Vec<ImportRecord>,
    /// Imported top-level module names.
    pub modules: BTreeSet<String>,
    /// Modules none of whose bound names is read anywhere in the file.
    pub unused: BTreeSet<String>,
}

/// Extract imports and compute the unused subset.
pub fn extract_imports(unit: &SourceUnit) -> ImportSet {
    let Some(root) = unit.root() else {
        return ImportSet::default();
    };

    struct Imports<'u> {
        unit: &'u SourceUnit,
        imports: Vec<ImportRecord>,
        referenced: BTreeSet<String>,
    }

    impl<'t> Visitor<'t> for Imports<'_> {
        fn enter(&mut self, node: Node<'t>, kind: NodeKind) -> Descend {
            match kind {
                NodeKind::Import => {
                    self.imports.extend(import_statement(node, self.unit));
                    Descend::Skip
                }
                NodeKind::ImportFrom => {
                    if node.kind() == "import_from_statement" {
                        self.imports.extend(import_from(node, self.unit));
                    }
                    Descend::Skip
                }
                NodeKind::Identifier => {
                    if name_role(node) == NameRole::Load {
                        self.referenced.insert(self.unit.text(&node).to_string());
                    }
                    Descend::Continue
                }
                _ => Descend::Continue,
            }
        }
    }

    let mut visitor = Imports {
        unit,
        imports: Vec::new(),
        referenced: BTreeSet::new(),
    };
    walk(root, &mut visitor);

    let mut bindings: BTreeMap<&str, bool> = BTreeMap::new();
    for import in &visitor.imports {
        let used = import
            .bound
            .iter()
            .any(|b| b == "*" || visitor.referenced.contains(b));
        let entry = bindings.entry(import.module.as_str()).or_insert(false);
        *entry = *entry || used;
    }

    ImportSet {
        modules: bindings.keys().map(|m| m.to_string()).collect(),
        unused: bindings
            .iter()
            .filter(|(_, used)| !**used)
            .map(|(m, _)| m.to_string())
            .collect(),
        imports: visitor.imports,
    }
}

fn top_level(dotted: &str) -> String {
    dotted.split('.').next().unwrap_or(dotted).trim().to_string()
}

fn import_statement(node: Node<'_>, unit: &SourceUnit) -> Vec<ImportRecord> {
    let line = start_line(&node);
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter_map(|child| match child.kind() {
            "dotted_name" => {
                let target = unit.text(&child).to_string();
                let module = top_level(&target);
                Some(ImportRecord {
                    bound: vec![module.clone()],
                    module,
                    target,
                    names: Vec::new(),
                    relative: false,
                    level: 0,
                    line,
                })
            }
            "aliased_import" => {
                let name = child.child_by_field_name("name")?;
                let alias = child.child_by_field_name("alias")?;
                let target = unit.text(&name).to_string();
                Some(ImportRecord {
                    module: top_level(&target),
                    target,
                    names: Vec::new(),
                    bound: vec![unit.text(&alias).to_string()],
                    relative: false,
                    level: 0,
                    line,
                })
            }
            _ => None,
        })
        .collect()
}

fn import_from(node: Node<'_>, unit: &SourceUnit) -> Vec<ImportRecord> {
    let line = start_line(&node);
    let Some(module_node) = node.child_by_field_name("module_name") else {
        return Vec::new();
    };
    let relative = module_node.kind() == "relative_import";
    let written = unit.text(&module_node).trim();
    let level = written.len() - written.trim_start_matches('.').len();
    let target = written.trim_start_matches('.').to_string();
    let module = top_level(&target);

    let mut names: Vec<(String, String)> = Vec::new();
    let mut cursor = node.walk();
    for child in node.children_by_field_name("name", &mut cursor) {
        match child.kind() {
            "aliased_import" => {
                if let (Some(name), Some(alias)) = (
                    child.child_by_field_name("name"),
                    child.child_by_field_name("alias"),
                ) {
                    names.push((unit.text(&name).to_string(), unit.text(&alias).to_string()));
                }
            }
            _ => {
                let name = unit.text(&child).to_string();
                names.push((name.clone(), name));
            }
        }
    }
    let mut wildcard_cursor = node.walk();
    if node
        .named_children(&mut wildcard_cursor)
        .any(|c| c.kind() == "wildcard_import")
    {
        names.push(("*".to_string(), "*".to_string()));
    }

    if module.is_empty() {
        // `from . import sibling` imports each name as a module.
        return names
            .into_iter()
            .filter(|(name, _)| name != "*")
            .map(|(name, bound)| ImportRecord {
                module: top_level(&name),
                target: name,
                names: Vec::new(),
                bound: vec![bound],
                relative,
                level,
                line,
            })
            .collect();
    }

    let (names, bound): (Vec<String>, Vec<String>) = names.into_iter().unzip();
    vec![ImportRecord {
        module,
        target,
        names: names.into_iter().filter(|n| n != "*").collect(),
        bound,
        relative,
        level,
        line,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn unit(code: &str) -> SourceUnit {
        SourceUnit::parse("sample.py", code, &Parser::new())
    }

    #[test]
    fn test_function_record_basics() {
        let u = unit(
            "def add(a: int, b, *rest, scale: float = 1.0, **kw) -> int:\n    \"\"\"Add numbers.\"\"\"\n    return (a + b) * scale\n",
        );
        let records = extract(&u);
        assert_eq!(records.functions.len(), 1);
        let f = &records.functions[0];
        assert_eq!(f.name, "add");
        assert_eq!(f.params, vec!["a", "b", "rest", "scale", "kw"]);
        assert_eq!(f.annotated_params, 2);
        assert_eq!(f.returns, "int");
        assert_eq!(f.docstring, "Add numbers.");
        assert_eq!(f.cyclomatic, 1);
        assert_eq!(f.lines, 3);
        assert_eq!(f.start_line, 1);
        assert_eq!(f.body_statements, 2);
        assert_eq!(f.file, "sample.py");
    }

    #[test]
    fn test_annotated_receiver_is_not_counted() {
        let u = unit("class A:\n    def m(self: \"A\", x, y) -> None:\n        pass\n\n    @classmethod\n    def c(cls: type, z: int):\n        pass\n");
        let records = extract(&u);
        let m = records.all_functions().find(|f| f.name == "m").unwrap();
        assert_eq!(m.annotated_params, 0);
        assert_eq!(m.annotatable_params(), 2);
        let c = records.all_functions().find(|f| f.name == "c").unwrap();
        assert_eq!(c.annotated_params, 1);
        assert_eq!(c.annotatable_params(), 1);
    }

    #[test]
    fn test_free_names_exclude_params_and_locals() {
        let u = unit("def f(a):\n    b = helper(a)\n    return b + CONSTANT\n");
        let records = extract(&u);
        let free: Vec<_> = records.functions[0].free_names.iter().cloned().collect();
        assert_eq!(free, vec!["CONSTANT", "helper"]);
    }

    #[test]
    fn test_async_and_decorators() {
        let u = unit("@app.route('/')\n@cached\nasync def index():\n    return 1\n");
        let f = &extract(&u).functions[0];
        assert!(f.is_async);
        assert_eq!(f.decorators, vec!["app.route('/')", "cached"]);
    }

    #[test]
    fn test_class_record_with_methods_and_attributes() {
        let code = r#"
class Repo(Base, metaclass=Meta):
    """Stores things."""
    limit: int = 10
    """Maximum size."""
    name = "repo"

    def __init__(self, store):
        self.store = store
        self.count: int = 0

    @property
    def size(self):
        if self.count:
            return self.count
        return 0
"#;
        let records = extract(&unit(code));
        assert!(records.functions.is_empty());
        assert_eq!(records.classes.len(), 1);
        let class = &records.classes[0];
        assert_eq!(class.name, "Repo");
        assert_eq!(class.bases, vec!["Base"]);
        assert_eq!(class.docstring, "Stores things.");
        assert_eq!(class.methods.len(), 2);
        assert_eq!(class.complexity, 2);

        let limit = class.attribute("limit").unwrap();
        assert_eq!(limit.annotation.as_deref(), Some("int"));
        assert_eq!(limit.docstring.as_deref(), Some("Maximum size."));
        assert!(class.attribute("name").is_some());
        assert!(class.attribute("store").is_some());
        assert_eq!(
            class.attribute("count").unwrap().annotation.as_deref(),
            Some("int")
        );
        assert!(class.method("size").is_some());
    }

    #[test]
    fn test_nested_function_is_a_free_function() {
        let code = "class A:\n    def m(self):\n        def inner():\n            return 1\n        return inner()\n";
        let records = extract(&unit(code));
        assert_eq!(records.classes[0].methods.len(), 1);
        assert_eq!(records.functions.len(), 1);
        assert_eq!(records.functions[0].name, "inner");
        assert_eq!(records.all_functions().count(), 2);
    }

    #[test]
    fn test_module_docstring() {
        let records = extract(&unit("# header\n'''Module doc.'''\nx = 1\n"));
        assert_eq!(records.module_docstring, "Module doc.");
        let records = extract(&unit("x = 1\n"));
        assert!(records.module_docstring.is_empty());
    }

    #[test]
    fn test_skipped_unit_has_no_records() {
        let records = extract(&unit("def broken(:\n"));
        assert!(records.functions.is_empty());
        assert!(records.classes.is_empty());
    }

    #[test]
    fn test_strip_string_literal() {
        assert_eq!(strip_string_literal("\"\"\" doc \"\"\""), "doc");
        assert_eq!(strip_string_literal("r'raw'"), "raw");
        assert_eq!(strip_string_literal("'x'"), "x");
    }

    #[test]
    fn test_imports_and_unused() {
        let code = "import os\nimport sys\nimport numpy as np\nfrom collections import OrderedDict\nfrom typing import *\n\nos.getcwd()\nnp.zeros(3)\n";
        let imports = extract_imports(&unit(code));
        let modules: Vec<_> = imports.modules.iter().cloned().collect();
        assert_eq!(modules, vec!["collections", "numpy", "os", "sys", "typing"]);
        let unused: Vec<_> = imports.unused.iter().cloned().collect();
        assert_eq!(unused, vec!["collections", "sys"]);
    }

    #[test]
    fn test_dotted_and_relative_imports() {
        let code = "import os.path\nfrom .models import User\nfrom . import views\nfrom ..core.db import session\n\nUser(views, session, os)\n";
        let imports = extract_imports(&unit(code));
        assert!(imports.modules.contains("os"));
        assert!(imports.modules.contains("models"));
        assert!(imports.modules.contains("views"));
        assert!(imports.modules.contains("core"));
        assert!(imports.unused.is_empty());
        let relative: Vec<_> = imports
            .imports
            .iter()
            .filter(|i| i.relative)
            .map(|i| i.module.as_str())
            .collect();
        assert_eq!(relative, vec!["models", "views", "core"]);

        let session = imports.imports.iter().find(|i| i.module == "core").unwrap();
        assert_eq!(session.level, 2);
        assert_eq!(session.target, "core.db");
        assert_eq!(session.names, vec!["session"]);
        let path = imports.imports.iter().find(|i| i.module == "os").unwrap();
        assert_eq!(path.target, "os.path");
        assert_eq!(path.level, 0);
    }

    #[test]
    fn test_import_names_are_not_references() {
        let imports = extract_imports(&unit("import json\n"));
        assert!(imports.unused.contains("json"));
    }

    #[test]
    fn test_name_roles() {
        let u = unit("x = y.z\n");
        let root = u.root().unwrap();
        let assign = root.named_child(0).unwrap().named_child(0).unwrap();
        let left = assign.child_by_field_name("left").unwrap();
        let right = assign.child_by_field_name("right").unwrap();
        assert_eq!(name_role(left), NameRole::Store);
        let object = right.child_by_field_name("object").unwrap();
        let attr = right.child_by_field_name("attribute").unwrap();
        assert_eq!(name_role(object), NameRole::Load);
        assert_eq!(name_role(attr), NameRole::Other);
    }
}
