//! Complexity analyzer - cyclomatic and cognitive complexity.
//!
//! # Overview
//!
//! This analyzer computes, per function and per file:
//!
//! - **Cyclomatic Complexity**: 1 plus one per `if`/`elif`/`for`/`while`/`try`/`with`,
//!   plus `operands - 1` per `and`/`or` chain. Based on McCabe (1976).
//!
//! - **Cognitive Complexity**: the same branch constructs, each costing
//!   `1 + nesting depth`, so a construct nested deeper always costs more.
//!   Based on SonarSource's methodology.
//!
//! - **Halstead difficulty**: `(distinct operators / 2) * (operands / distinct operands)`
//!   over the function's tokens.
//!
//! The project maintainability index falls linearly with the average file
//! complexity and is clamped to `[0, 100]`.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use pymetrics::analyzers::complexity::Analyzer;
//! use pymetrics::config::Config;
//! use pymetrics::core::{AnalysisContext, Analyzer as AnalyzerTrait, SourceUnit};
//! use pymetrics::parser::Parser;
//!
//! let config = Config::default();
//! let ctx = AnalysisContext::new(Path::new("."), &config);
//! let unit = SourceUnit::load("app.py", &Parser::new(), config.max_file_size);
//!
//! let result = Analyzer::new().analyze(&unit, &ctx).unwrap();
//! println!("File complexity {}", result.complexity);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::config::ComplexityConfig;
use crate::core::{AnalysisContext, Analyzer as AnalyzerTrait, Result, SourceUnit};
use crate::parser::records;
use crate::parser::visitor::{walk, Descend, Visitor};
use crate::parser::{end_line, start_line, NodeKind};

/// Complexity analyzer.
#[derive(Default)]
pub struct Analyzer;

impl Analyzer {
    /// Create a new complexity analyzer.
    pub fn new() -> Self {
        Self
    }
}

impl AnalyzerTrait for Analyzer {
    type Output = FileComplexity;

    fn name(&self) -> &'static str {
        "complexity"
    }

    fn description(&self) -> &'static str {
        "Calculate cyclomatic and cognitive complexity per function"
    }

    fn analyze(&self, unit: &SourceUnit, _ctx: &AnalysisContext<'_>) -> Result<Self::Output> {
        Ok(analyze_unit(unit))
    }
}

/// Per-file complexity result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileComplexity {
    /// File path.
    pub path: String,
    /// Whether the file was skipped (no metrics).
    pub skipped: bool,
    /// 1 plus every decision point in the file.
    pub complexity: u32,
    /// Number of lines.
    pub lines: usize,
    /// Per-function results.
    pub functions: Vec<FunctionComplexity>,
    /// Per-class results.
    pub classes: Vec<ClassComplexity>,
    /// Average cyclomatic complexity of the file's functions.
    pub avg_cyclomatic: f64,
    /// Deepest nesting in the file.
    pub max_nesting: u32,
}

/// Per-function complexity result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionComplexity {
    /// Function name.
    pub name: String,
    /// File path.
    pub file: String,
    /// Start line (1-indexed).
    pub start_line: u32,
    /// End line (1-indexed).
    pub end_line: u32,
    /// Complexity metrics.
    pub metrics: Metrics,
}

/// Complexity metrics for a function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metrics {
    /// Cyclomatic complexity.
    pub cyclomatic: u32,
    /// Cognitive complexity.
    pub cognitive: u32,
    /// Maximum nesting depth.
    pub max_nesting: u32,
    /// Number of lines.
    pub lines: u32,
    /// Vocabulary-based difficulty.
    pub halstead: Halstead,
}

/// Halstead token counts and derived measures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Halstead {
    pub distinct_operators: usize,
    pub distinct_operands: usize,
    pub total_operators: usize,
    pub total_operands: usize,
    pub difficulty: f64,
    pub volume: f64,
}

/// Per-class complexity result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassComplexity {
    pub name: String,
    pub file: String,
    pub start_line: u32,
    pub lines: u32,
    pub methods: usize,
    /// 1 plus the decision points of every method.
    pub complexity: u32,
}

/// Project-level complexity metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplexityMetrics {
    /// Average file complexity.
    pub cyclomatic_complexity: f64,
    /// Maintainability index in `[0, 100]`.
    pub maintainability_index: f64,
    /// Total files with metrics.
    pub total_files: usize,
    /// Total functions analyzed.
    pub total_functions: usize,
    /// Total classes analyzed.
    pub total_classes: usize,
    /// Average cyclomatic complexity per function.
    pub avg_function_cyclomatic: f64,
    /// Average cognitive complexity per function.
    pub avg_cognitive: f64,
    /// Average Halstead difficulty per function.
    pub avg_difficulty: f64,
    /// Maximum function cyclomatic complexity.
    pub max_cyclomatic: u32,
    /// Deepest nesting anywhere.
    pub max_nesting: u32,
    /// P50 function cyclomatic complexity.
    pub p50_cyclomatic: u32,
    /// P90 function cyclomatic complexity.
    pub p90_cyclomatic: u32,
    /// P95 function cyclomatic complexity.
    pub p95_cyclomatic: u32,
    /// Functions and classes over the thresholds, most complex first.
    pub complex_functions: Vec<ComplexCandidate>,
}

/// A function or class reported as complex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexCandidate {
    pub name: String,
    /// `function` or `class`.
    pub kind: String,
    pub file: String,
    pub line: u32,
    pub complexity: u32,
    pub lines: u32,
}

/// Counts produced by [`measure`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Measured {
    pub cyclomatic: u32,
    pub cognitive: u32,
    pub max_nesting: u32,
}

/// Cyclomatic, cognitive and nesting measures of a subtree.
pub fn measure(root: Node<'_>) -> Measured {
    let mut visitor = ComplexityVisitor {
        measured: Measured {
            cyclomatic: 1,
            ..Default::default()
        },
        depth: 0,
    };
    walk(root, &mut visitor);
    visitor.measured
}

struct ComplexityVisitor {
    measured: Measured,
    depth: u32,
}

impl<'t> Visitor<'t> for ComplexityVisitor {
    fn enter(&mut self, node: Node<'t>, kind: NodeKind) -> Descend {
        if kind.is_decision() {
            self.measured.cyclomatic += 1;
        }
        match kind {
            k if k.is_nesting() => {
                self.measured.cognitive += 1 + self.depth;
                self.depth += 1;
                self.measured.max_nesting = self.measured.max_nesting.max(self.depth);
            }
            NodeKind::Elif => self.measured.cognitive += 1,
            NodeKind::BoolOp => {
                // Binary nodes: each one adds exactly one operand to its chain.
                self.measured.cyclomatic += 1;
                if !continues_chain(node) {
                    self.measured.cognitive += 1;
                }
            }
            _ => {}
        }
        Descend::Continue
    }

    fn leave(&mut self, _node: Node<'t>, kind: NodeKind) {
        if kind.is_nesting() {
            self.depth = self.depth.saturating_sub(1);
        }
    }
}

/// Whether a boolean operator extends a parent chain of the same operator.
fn continues_chain(node: Node<'_>) -> bool {
    let operator = |n: Node<'_>| n.child_by_field_name("operator").map(|o| o.kind());
    node.parent()
        .filter(|p| p.kind() == "boolean_operator")
        .is_some_and(|p| operator(p) == operator(node))
}

/// Halstead measures over the tokens of a subtree.
pub fn halstead(root: Node<'_>, unit: &SourceUnit) -> Halstead {
    struct Tokens<'u> {
        unit: &'u SourceUnit,
        operators: HashSet<String>,
        operands: HashSet<String>,
        total_operators: usize,
        total_operands: usize,
    }

    impl<'t> Visitor<'t> for Tokens<'_> {
        fn enter(&mut self, node: Node<'t>, kind: NodeKind) -> Descend {
            match kind {
                NodeKind::Comment => return Descend::Skip,
                NodeKind::Str => {
                    self.operands.insert(self.unit.text(&node).to_string());
                    self.total_operands += 1;
                    return Descend::Skip;
                }
                _ => {}
            }
            if node.child_count() > 0 {
                return Descend::Continue;
            }
            match node.kind() {
                "identifier" | "integer" | "float" | "true" | "false" | "none" => {
                    self.operands.insert(self.unit.text(&node).to_string());
                    self.total_operands += 1;
                }
                // Zero-width nodes (indent/dedent, newlines) are layout, not tokens.
                _ if node.start_byte() == node.end_byte() => {}
                other => {
                    self.operators.insert(other.to_string());
                    self.total_operators += 1;
                }
            }
            Descend::Continue
        }
    }

    let mut tokens = Tokens {
        unit,
        operators: HashSet::new(),
        operands: HashSet::new(),
        total_operators: 0,
        total_operands: 0,
    };
    walk(root, &mut tokens);

    let n1 = tokens.operators.len();
    let n2 = tokens.operands.len();
    let difficulty = if n2 > 0 {
        (n1 as f64 / 2.0) * (tokens.total_operands as f64 / n2 as f64)
    } else {
        0.0
    };
    let vocabulary = n1 + n2;
    let length = tokens.total_operators + tokens.total_operands;
    let volume = if vocabulary > 0 {
        length as f64 * (vocabulary as f64).log2()
    } else {
        0.0
    };

    Halstead {
        distinct_operators: n1,
        distinct_operands: n2,
        total_operators: tokens.total_operators,
        total_operands: tokens.total_operands,
        difficulty,
        volume,
    }
}

/// Analyze one unit.
pub fn analyze_unit(unit: &SourceUnit) -> FileComplexity {
    let Some(root) = unit.root() else {
        return FileComplexity {
            path: unit.display_path(),
            skipped: true,
            lines: unit.line_count,
            ..Default::default()
        };
    };

    struct FunctionNodes<'t>(Vec<Node<'t>>);

    impl<'t> Visitor<'t> for FunctionNodes<'t> {
        fn enter(&mut self, node: Node<'t>, kind: NodeKind) -> Descend {
            if kind == NodeKind::FunctionDef {
                self.0.push(node);
            }
            Descend::Continue
        }
    }

    let mut nodes = FunctionNodes(Vec::new());
    walk(root, &mut nodes);

    let functions: Vec<FunctionComplexity> = nodes
        .0
        .into_iter()
        .map(|node| {
            let measured = measure(node);
            let start = start_line(&node);
            let end = end_line(&node);
            FunctionComplexity {
                name: node
                    .child_by_field_name("name")
                    .map(|n| unit.text(&n).to_string())
                    .unwrap_or_default(),
                file: unit.display_path(),
                start_line: start,
                end_line: end,
                metrics: Metrics {
                    cyclomatic: measured.cyclomatic,
                    cognitive: measured.cognitive,
                    max_nesting: measured.max_nesting,
                    lines: end - start + 1,
                    halstead: halstead(node, unit),
                },
            }
        })
        .collect();

    let classes = records::extract(unit)
        .classes
        .into_iter()
        .map(|c| ClassComplexity {
            methods: c.methods.len(),
            name: c.name,
            file: c.file,
            start_line: c.start_line,
            lines: c.lines,
            complexity: c.complexity,
        })
        .collect();

    let file = measure(root);
    let avg_cyclomatic = if functions.is_empty() {
        0.0
    } else {
        functions.iter().map(|f| f.metrics.cyclomatic as f64).sum::<f64>() / functions.len() as f64
    };

    FileComplexity {
        path: unit.display_path(),
        skipped: false,
        complexity: file.cyclomatic,
        lines: unit.line_count,
        functions,
        classes,
        avg_cyclomatic,
        max_nesting: file.max_nesting,
    }
}

/// Combine per-file results into project metrics.
pub fn summarize(files: &[FileComplexity], config: &ComplexityConfig) -> ComplexityMetrics {
    let analyzed: Vec<&FileComplexity> = files.iter().filter(|f| !f.skipped).collect();
    if analyzed.is_empty() {
        return ComplexityMetrics::default();
    }

    let avg_file = analyzed.iter().map(|f| f.complexity as f64).sum::<f64>() / analyzed.len() as f64;
    let mut metrics = ComplexityMetrics {
        cyclomatic_complexity: avg_file,
        maintainability_index: maintainability_index(avg_file, config.maintainability_penalty),
        total_files: analyzed.len(),
        ..Default::default()
    };

    let mut all_cyclomatic = Vec::new();
    let mut total_cognitive: u64 = 0;
    let mut total_difficulty = 0.0;

    for file in &analyzed {
        metrics.total_classes += file.classes.len();
        metrics.max_nesting = metrics.max_nesting.max(file.max_nesting);

        for func in &file.functions {
            all_cyclomatic.push(func.metrics.cyclomatic);
            total_cognitive += func.metrics.cognitive as u64;
            total_difficulty += func.metrics.halstead.difficulty;
            metrics.max_cyclomatic = metrics.max_cyclomatic.max(func.metrics.cyclomatic);

            if func.metrics.cyclomatic > config.complex_cyclomatic
                || func.metrics.lines > config.complex_lines
            {
                metrics.complex_functions.push(ComplexCandidate {
                    name: func.name.clone(),
                    kind: "function".to_string(),
                    file: func.file.clone(),
                    line: func.start_line,
                    complexity: func.metrics.cyclomatic,
                    lines: func.metrics.lines,
                });
            }
        }

        for class in &file.classes {
            if class.complexity > config.complex_cyclomatic || class.lines > config.complex_lines {
                metrics.complex_functions.push(ComplexCandidate {
                    name: class.name.clone(),
                    kind: "class".to_string(),
                    file: class.file.clone(),
                    line: class.start_line,
                    complexity: class.complexity,
                    lines: class.lines,
                });
            }
        }
    }

    metrics.total_functions = all_cyclomatic.len();
    if !all_cyclomatic.is_empty() {
        let count = all_cyclomatic.len() as f64;
        metrics.avg_function_cyclomatic = all_cyclomatic.iter().map(|&c| c as f64).sum::<f64>() / count;
        metrics.avg_cognitive = total_cognitive as f64 / count;
        metrics.avg_difficulty = total_difficulty / count;

        all_cyclomatic.sort_unstable();
        metrics.p50_cyclomatic = percentile(&all_cyclomatic, 50);
        metrics.p90_cyclomatic = percentile(&all_cyclomatic, 90);
        metrics.p95_cyclomatic = percentile(&all_cyclomatic, 95);
    }

    metrics.complex_functions.sort_by(|a, b| {
        b.complexity
            .cmp(&a.complexity)
            .then_with(|| a.file.cmp(&b.file))
            .then_with(|| a.line.cmp(&b.line))
    });

    metrics
}

/// Maintainability index: falls linearly with average complexity, clamped to `[0, 100]`.
pub fn maintainability_index(avg_complexity: f64, penalty: f64) -> f64 {
    (100.0 - avg_complexity * penalty).clamp(0.0, 100.0)
}

/// Calculate percentile value from sorted slice.
fn percentile(sorted: &[u32], p: usize) -> u32 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = (p * sorted.len()) / 100;
    sorted[idx.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn analyze(code: &str) -> FileComplexity {
        let unit = SourceUnit::parse("test.py", code, &Parser::new());
        analyze_unit(&unit)
    }

    fn single(code: &str) -> Metrics {
        let result = analyze(code);
        assert_eq!(result.functions.len(), 1, "expected one function in {code}");
        result.functions[0].metrics.clone()
    }

    #[test]
    fn test_simple_function() {
        let m = single("def f(): return 1\n");
        assert_eq!(m.cyclomatic, 1);
        assert_eq!(m.cognitive, 0);
        assert_eq!(m.max_nesting, 0);
        assert_eq!(m.lines, 1);
    }

    #[test]
    fn test_each_branch_kind_adds_one() {
        let code = r#"
def f(x, items, path):
    if x:
        pass
    elif x > 1:
        pass
    else:
        pass
    for i in items:
        pass
    while x:
        x -= 1
    try:
        pass
    except ValueError:
        pass
    with open(path) as fh:
        pass
"#;
        assert_eq!(single(code).cyclomatic, 7);
    }

    #[test]
    fn test_boolean_chain_adds_operands_minus_one() {
        assert_eq!(single("def f(a, b, c):\n    return a and b and c\n").cyclomatic, 3);
        assert_eq!(single("def f(a, b, c):\n    return a and b or c\n").cyclomatic, 3);
        assert_eq!(single("def f(a, b):\n    if a or b:\n        pass\n").cyclomatic, 3);
    }

    #[test]
    fn test_cognitive_penalizes_nesting() {
        let flat = single("def f(a, b):\n    if a:\n        pass\n    if b:\n        pass\n");
        let nested = single("def f(a, b):\n    if a:\n        if b:\n            pass\n");
        assert_eq!(flat.cognitive, 2);
        assert_eq!(nested.cognitive, 3);
        assert_eq!(nested.max_nesting, 2);
        assert_eq!(flat.max_nesting, 1);
    }

    #[test]
    fn test_cognitive_bool_sequence_counts_once() {
        let m = single("def f(a, b, c):\n    return a and b and c\n");
        assert_eq!(m.cognitive, 1);
        let m = single("def f(a, b, c):\n    return a and b or c\n");
        assert_eq!(m.cognitive, 2);
    }

    #[test]
    fn test_deep_nesting() {
        let code = "def f(x):\n    for a in x:\n        for b in a:\n            while b:\n                if b:\n                    pass\n";
        let m = single(code);
        assert_eq!(m.cyclomatic, 5);
        assert_eq!(m.cognitive, 1 + 2 + 3 + 4);
        assert_eq!(m.max_nesting, 4);
    }

    #[test]
    fn test_file_complexity_counts_module_level_branches() {
        let result = analyze("import sys\nif sys.argv:\n    pass\ndef f():\n    for i in []:\n        pass\n");
        assert_eq!(result.complexity, 3);
        assert_eq!(result.functions.len(), 1);
    }

    #[test]
    fn test_methods_and_classes() {
        let code = "class A:\n    def a(self):\n        if self:\n            pass\n    def b(self):\n        return 1\n";
        let result = analyze(code);
        assert_eq!(result.functions.len(), 2);
        assert_eq!(result.classes.len(), 1);
        assert_eq!(result.classes[0].methods, 2);
        assert_eq!(result.classes[0].complexity, 2);
        assert!((result.avg_cyclomatic - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_halstead_difficulty() {
        let m = single("def f(a, b):\n    return a + b\n");
        let h = &m.halstead;
        assert!(h.distinct_operands >= 3);
        assert!(h.total_operands >= 5);
        assert!(h.difficulty > 0.0);
        assert!(h.volume > 0.0);

        let simple = single("def g(): return 1\n");
        assert!(simple.halstead.difficulty < h.difficulty);
    }

    #[test]
    fn test_skipped_file_yields_default_metrics() {
        let result = analyze("def broken(:\n    pass\n");
        assert!(result.skipped);
        assert!(result.functions.is_empty());
        assert_eq!(result.complexity, 0);
    }

    #[test]
    fn test_summarize_maintainability_and_candidates() {
        let simple = analyze("def f(): return 1\n");
        let branchy = analyze(
            "def g(a, b, c, d, e):\n    if a:\n        pass\n    if b:\n        pass\n    if c:\n        pass\n    if d:\n        pass\n    if e:\n        pass\n",
        );
        let config = ComplexityConfig::default();
        let metrics = summarize(&[simple, branchy], &config);

        assert_eq!(metrics.total_files, 2);
        assert_eq!(metrics.total_functions, 2);
        assert!((metrics.cyclomatic_complexity - 3.5).abs() < 1e-9);
        assert!((metrics.maintainability_index - 82.5).abs() < 1e-9);
        assert_eq!(metrics.max_cyclomatic, 6);
        assert_eq!(metrics.complex_functions.len(), 1);
        assert_eq!(metrics.complex_functions[0].name, "g");
        assert_eq!(metrics.complex_functions[0].kind, "function");
    }

    #[test]
    fn test_complex_candidates_sorted_descending() {
        let mut long_body = String::from("def long_one():\n");
        for i in 0..25 {
            long_body.push_str(&format!("    x{i} = {i}\n"));
        }
        let long = analyze(&long_body);
        let branchy = analyze(
            "def branchy(a):\n    if a: pass\n    if a: pass\n    if a: pass\n    if a: pass\n    if a: pass\n    if a: pass\n",
        );
        let metrics = summarize(&[long, branchy], &ComplexityConfig::default());
        let names: Vec<_> = metrics.complex_functions.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["branchy", "long_one"]);
    }

    #[test]
    fn test_summarize_empty() {
        let metrics = summarize(&[], &ComplexityConfig::default());
        assert_eq!(metrics.total_files, 0);
        assert_eq!(metrics.maintainability_index, 0.0);
        assert!(metrics.complex_functions.is_empty());
    }

    #[test]
    fn test_maintainability_index_clamped() {
        assert_eq!(maintainability_index(0.0, 5.0), 100.0);
        assert_eq!(maintainability_index(50.0, 5.0), 0.0);
        assert!(maintainability_index(2.0, 5.0) > maintainability_index(3.0, 5.0));
    }

    #[test]
    fn test_percentile() {
        assert_eq!(percentile(&[], 50), 0);
        assert_eq!(percentile(&[1, 2, 3, 4], 50), 3);
        assert_eq!(percentile(&[1, 2, 3, 4], 95), 4);
    }
}
