//! Pattern analyzer - design-pattern matchers and architectural style.
//!
//! Each matcher is a structural predicate over one class definition. A
//! match's confidence is the share of the pattern's cues that were present,
//! scaled to [`MAX_CONFIDENCE`].
//! Strategy is the exception: it pairs a context class holding a
//! strategy-typed field with the strategy implementations of the same file.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::core::{AnalysisContext, Analyzer as AnalyzerTrait, Result, SourceUnit};
use crate::parser::records::{self, ClassRecord};
use crate::parser::visitor::{any_descendant, walk, Descend, Visitor};
use crate::parser::NodeKind;

/// Confidence of a match showing every cue of its pattern.
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Confidence for `present` of a pattern's `total` cues.
fn cue_confidence(present: usize, total: usize) -> f64 {
    MAX_CONFIDENCE * present as f64 / total as f64
}

/// Pattern analyzer.
#[derive(Default)]
pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }
}

impl AnalyzerTrait for Analyzer {
    type Output = FilePatterns;

    fn name(&self) -> &'static str {
        "patterns"
    }

    fn description(&self) -> &'static str {
        "Detect design patterns and architectural layering"
    }

    fn analyze(&self, unit: &SourceUnit, _ctx: &AnalysisContext<'_>) -> Result<Self::Output> {
        Ok(analyze_unit(unit))
    }
}

/// Recognized design patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PatternKind {
    Singleton,
    Factory,
    Strategy,
    Observer,
    Decorator,
    Adapter,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Singleton => "Singleton",
            PatternKind::Factory => "Factory",
            PatternKind::Strategy => "Strategy",
            PatternKind::Observer => "Observer",
            PatternKind::Decorator => "Decorator",
            PatternKind::Adapter => "Adapter",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected design pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignPatternMatch {
    pub pattern: PatternKind,
    /// Heuristic confidence in `[0, 1]`.
    pub confidence: f64,
    /// `file:line` of each participating class.
    pub locations: Vec<String>,
    pub description: String,
    pub notes: String,
}

/// Architectural layer suggested by a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Presentation,
    Business,
    Data,
}

impl Layer {
    /// Classify a file by name markers: `view`/`ui`, `service`/`logic`, `model`/`data`.
    pub fn of(path: &Path) -> Option<Layer> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        if name.contains("view") || name.contains("ui") {
            Some(Layer::Presentation)
        } else if name.contains("service") || name.contains("logic") {
            Some(Layer::Business)
        } else if name.contains("model") || name.contains("data") {
            Some(Layer::Data)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Presentation => "Presentation",
            Layer::Business => "Business",
            Layer::Data => "Data",
        }
    }
}

/// Best-guess architectural style of a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchitecturalStyle {
    pub name: String,
    pub confidence: f64,
    pub evidence: Vec<String>,
    pub suggestions: Vec<String>,
    /// Files found per layer.
    pub layers: BTreeMap<Layer, Vec<String>>,
}

impl Default for ArchitecturalStyle {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            confidence: 0.5,
            evidence: vec!["No clear architectural evidence found".to_string()],
            suggestions: vec!["Consider defining a clear architecture".to_string()],
            layers: BTreeMap::new(),
        }
    }
}

/// Per-file pattern result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilePatterns {
    pub path: String,
    pub skipped: bool,
    pub patterns: Vec<DesignPatternMatch>,
    /// Layer marker in the file name; set even for skipped files.
    pub layer: Option<Layer>,
}

/// Project-level pattern metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternMetrics {
    /// Sorted by confidence, highest first.
    pub design_patterns: Vec<DesignPatternMatch>,
    pub architectural_style: ArchitecturalStyle,
    /// Mean confidence of all matches, 0 when none were found.
    pub average_confidence: f64,
    pub total_files: usize,
}

impl PatternMetrics {
    /// Count of matches per pattern.
    pub fn counts(&self) -> BTreeMap<PatternKind, usize> {
        let mut counts = BTreeMap::new();
        for m in &self.design_patterns {
            *counts.entry(m.pattern).or_insert(0) += 1;
        }
        counts
    }
}

/// Analyze one unit.
pub fn analyze_unit(unit: &SourceUnit) -> FilePatterns {
    let path = unit.display_path();
    let layer = Layer::of(&unit.path);
    let Some(root) = unit.root() else {
        return FilePatterns {
            path,
            skipped: true,
            layer,
            ..Default::default()
        };
    };

    let classes = records::extract(unit).classes;
    let nodes = class_nodes(root);

    let mut patterns = Vec::new();
    for (class, node) in classes.iter().zip(nodes) {
        let cx = ClassView { class, node, unit };
        patterns.extend(
            [
                match_singleton(&cx),
                match_factory(&cx),
                match_observer(&cx),
                match_decorator(&cx),
                match_adapter(&cx),
            ]
            .into_iter()
            .flatten(),
        );
    }
    patterns.extend(match_strategy(&classes));

    FilePatterns {
        path,
        skipped: false,
        patterns,
        layer,
    }
}

/// Class definition nodes in the same pre-order as [`records::extract`].
fn class_nodes(root: Node<'_>) -> Vec<Node<'_>> {
    struct Classes<'t> {
        found: Vec<Node<'t>>,
    }

    impl<'t> Visitor<'t> for Classes<'t> {
        fn enter(&mut self, node: Node<'t>, kind: NodeKind) -> Descend {
            if kind == NodeKind::ClassDef {
                self.found.push(node);
            }
            Descend::Continue
        }
    }

    let mut classes = Classes { found: Vec::new() };
    walk(root, &mut classes);
    classes.found
}

struct ClassView<'a, 't> {
    class: &'a ClassRecord,
    node: Node<'t>,
    unit: &'a SourceUnit,
}

impl<'t> ClassView<'_, 't> {
    fn location(&self) -> String {
        format!("{}:{}", self.class.file, self.class.start_line)
    }

    fn has_attribute(&self, needle: &str) -> bool {
        self.class
            .attributes
            .iter()
            .any(|a| a.name.to_lowercase().contains(needle))
    }

    fn has_method(&self, needle: &str) -> bool {
        self.class
            .methods
            .iter()
            .any(|m| m.name.to_lowercase().contains(needle))
    }

    fn has_base(&self, needle: &str) -> bool {
        self.class.bases.iter().any(|b| b.contains(needle))
    }

    /// Whether a method calls through an object whose name contains `needle`.
    fn delegates_through(&self, needle: &str) -> bool {
        self.method_nodes().into_iter().any(|def| {
            any_descendant(def, |node| {
                node.kind() == "call"
                    && node
                        .child_by_field_name("function")
                        .filter(|f| f.kind() == "attribute")
                        .and_then(|f| f.child_by_field_name("object"))
                        .is_some_and(|object| self.unit.text(&object).to_lowercase().contains(needle))
            })
        })
    }

    /// Function definitions directly in the class body.
    fn method_nodes(&self) -> Vec<Node<'t>> {
        let Some(body) = self.node.child_by_field_name("body") else {
            return Vec::new();
        };
        let mut cursor = body.walk();
        body.named_children(&mut cursor)
            .filter_map(|child| match child.kind() {
                "function_definition" => Some(child),
                "decorated_definition" => child.child_by_field_name("definition"),
                _ => None,
            })
            .filter(|def| def.kind() == "function_definition")
            .collect()
    }

    fn method_name(&self, def: Node<'_>) -> String {
        def.child_by_field_name("name")
            .map(|n| self.unit.text(&n).to_string())
            .unwrap_or_default()
    }

    fn found(&self, pattern: PatternKind, confidence: f64, notes: impl Into<String>) -> DesignPatternMatch {
        DesignPatternMatch {
            pattern,
            confidence,
            locations: vec![self.location()],
            description: format!("{pattern} pattern detected in class {}", self.class.name),
            notes: notes.into(),
        }
    }
}

/// Class-level `_instance` field plus an accessor. An accessor bound to the
/// class and a private constructor add confidence.
fn match_singleton(cx: &ClassView<'_, '_>) -> Option<DesignPatternMatch> {
    let instance_field = cx.class.attributes.iter().any(|a| a.name == "_instance");
    let accessors: Vec<_> = ["get_instance", "instance", "__new__"]
        .iter()
        .filter_map(|name| cx.class.method(name))
        .collect();
    if !instance_field || accessors.is_empty() {
        return None;
    }
    let class_bound = accessors.iter().any(|m| {
        m.name == "__new__" || m.decorators.iter().any(|d| d == "classmethod" || d == "staticmethod")
    });
    let private_constructor = cx
        .class
        .method("__init__")
        .is_some_and(|init| init.decorators.iter().any(|d| d == "private"));
    let cues = 2 + usize::from(class_bound) + usize::from(private_constructor);
    Some(cx.found(
        PatternKind::Singleton,
        cue_confidence(cues, 4),
        "Controls instance creation through a class-level instance field",
    ))
}

/// A `*Factory*` class with a create/get/make method returning constructor
/// calls of at least two concrete types.
fn match_factory(cx: &ClassView<'_, '_>) -> Option<DesignPatternMatch> {
    if !cx.class.name.contains("Factory") {
        return None;
    }
    let mut created = Vec::new();
    for def in cx.method_nodes() {
        let name = cx.method_name(def).to_lowercase();
        if !["create", "get", "make"].iter().any(|verb| name.contains(verb)) {
            continue;
        }
        for ty in returned_constructors(def, cx.unit) {
            if !created.contains(&ty) {
                created.push(ty);
            }
        }
    }
    if created.len() < 2 {
        return None;
    }
    let cues = 3 + usize::from(created.len() >= 3);
    Some(cx.found(
        PatternKind::Factory,
        cue_confidence(cues, 4),
        format!("Creates objects of types: {}", created.join(", ")),
    ))
}

/// Names called directly in `return Name(...)` statements.
fn returned_constructors(def: Node<'_>, unit: &SourceUnit) -> Vec<String> {
    struct Returns<'u> {
        unit: &'u SourceUnit,
        types: Vec<String>,
    }

    impl<'t> Visitor<'t> for Returns<'_> {
        fn enter(&mut self, node: Node<'t>, kind: NodeKind) -> Descend {
            if kind == NodeKind::Return {
                let callee = node
                    .named_child(0)
                    .filter(|value| value.kind() == "call")
                    .and_then(|call| call.child_by_field_name("function"))
                    .filter(|f| f.kind() == "identifier");
                if let Some(callee) = callee {
                    self.types.push(self.unit.text(&callee).to_string());
                }
            }
            Descend::Continue
        }
    }

    let mut returns = Returns {
        unit,
        types: Vec::new(),
    };
    walk(def, &mut returns);
    returns.types
}

/// A context class with a `*Strategy*`-annotated field plus at least one
/// class in the same file deriving from a `*Strategy*` base.
fn match_strategy(classes: &[ClassRecord]) -> Vec<DesignPatternMatch> {
    let implementations: Vec<&ClassRecord> = classes
        .iter()
        .filter(|c| c.bases.iter().any(|b| b.contains("Strategy")))
        .collect();
    if implementations.is_empty() {
        return Vec::new();
    }
    let names: Vec<&str> = implementations.iter().map(|c| c.name.as_str()).collect();

    classes
        .iter()
        .filter(|c| {
            c.attributes
                .iter()
                .any(|a| a.annotation.as_deref().is_some_and(|t| t.contains("Strategy")))
        })
        .map(|context| {
            let mut locations = vec![format!("{}:{}", context.file, context.start_line)];
            locations.extend(
                implementations
                    .iter()
                    .map(|c| format!("{}:{}", c.file, c.start_line)),
            );
            DesignPatternMatch {
                pattern: PatternKind::Strategy,
                confidence: cue_confidence(2 + usize::from(implementations.len() >= 2), 3),
                locations,
                description: format!("Strategy pattern detected with context class {}", context.name),
                notes: format!("Strategy implementations: {}", names.join(", ")),
            }
        })
        .collect()
}

/// An observer collection plus a notify method; subscribe and unsubscribe
/// methods add confidence.
fn match_observer(cx: &ClassView<'_, '_>) -> Option<DesignPatternMatch> {
    if !(cx.has_attribute("observers") && cx.has_method("notify")) {
        return None;
    }
    let subscribe = ["attach", "subscribe", "register", "add"].iter().any(|m| cx.has_method(m));
    let unsubscribe = ["detach", "unsubscribe", "unregister", "remove"].iter().any(|m| cx.has_method(m));
    let cues = 2 + usize::from(subscribe) + usize::from(unsubscribe);
    Some(cx.found(
        PatternKind::Observer,
        cue_confidence(cues, 4),
        "Uses an observer list and a notify method",
    ))
}

/// A `*Component*` base plus a wrapped component field; calls delegated
/// through the component add confidence.
fn match_decorator(cx: &ClassView<'_, '_>) -> Option<DesignPatternMatch> {
    if !(cx.has_base("Component") && cx.has_attribute("component")) {
        return None;
    }
    let cues = 2 + usize::from(cx.delegates_through("component"));
    Some(cx.found(PatternKind::Decorator, cue_confidence(cues, 3), "Wraps a component object"))
}

/// An adaptee field plus calls delegated through it; a target base class
/// adds confidence.
fn match_adapter(cx: &ClassView<'_, '_>) -> Option<DesignPatternMatch> {
    if !(cx.has_attribute("adaptee") && cx.delegates_through("adaptee")) {
        return None;
    }
    let cues = 2 + usize::from(!cx.class.bases.is_empty());
    Some(cx.found(PatternKind::Adapter, cue_confidence(cues, 3), "Adapts an adaptee object"))
}

/// Infer the architectural style from per-file layer markers.
pub fn architectural_style(files: &[FilePatterns]) -> ArchitecturalStyle {
    let mut layers: BTreeMap<Layer, Vec<String>> = BTreeMap::new();
    let mut evidence = Vec::new();
    for file in files {
        if let Some(layer) = file.layer {
            evidence.push(format!("{} layer detected in {}", layer.as_str(), file.path));
            layers.entry(layer).or_default().push(file.path.clone());
        }
    }
    if evidence.is_empty() {
        return ArchitecturalStyle::default();
    }
    ArchitecturalStyle {
        name: "Layered".to_string(),
        confidence: (evidence.len() as f64 * 0.3).min(1.0),
        evidence,
        suggestions: vec!["Ensure clear separation of concerns between layers".to_string()],
        layers,
    }
}

/// Combine per-file results into project metrics.
pub fn summarize(files: &[FilePatterns]) -> PatternMetrics {
    let mut design_patterns: Vec<DesignPatternMatch> =
        files.iter().flat_map(|f| f.patterns.iter().cloned()).collect();
    design_patterns.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.locations.cmp(&b.locations))
    });

    let average_confidence = if design_patterns.is_empty() {
        0.0
    } else {
        design_patterns.iter().map(|p| p.confidence).sum::<f64>() / design_patterns.len() as f64
    };

    PatternMetrics {
        architectural_style: architectural_style(files),
        average_confidence,
        total_files: files.iter().filter(|f| !f.skipped).count(),
        design_patterns,
    }
}
