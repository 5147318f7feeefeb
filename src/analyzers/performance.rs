//! Performance analyzer - loop hotspots, allocation and I/O markers, caching opportunities.
//!
//! A loop's structural complexity is 1 plus the loops and branches nested
//! inside it. Loops over the hotspot threshold are reported with an
//! optimization category. Calls repeated within one function scope beyond
//! the repetition threshold are caching opportunities.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::config::PerformanceConfig;
use crate::core::{AnalysisContext, Analyzer as AnalyzerTrait, Result, SourceUnit};
use crate::parser::records::statement_count;
use crate::parser::visitor::{any_descendant, count_descendants, walk, Descend, Visitor};
use crate::parser::{start_line, NodeKind};

const IO_CALLS: &[&str] = &[
    "open",
    "read",
    "readline",
    "readlines",
    "write",
    "writelines",
    "print",
];

const CACHE_DECORATORS: &[&str] = &["lru_cache", "cache", "cached_property"];

/// Performance analyzer.
#[derive(Default)]
pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }
}

impl AnalyzerTrait for Analyzer {
    type Output = FilePerformance;

    fn name(&self) -> &'static str {
        "performance"
    }

    fn description(&self) -> &'static str {
        "Find loop hotspots, memory and I/O markers and caching opportunities"
    }

    fn analyze(&self, unit: &SourceUnit, ctx: &AnalysisContext<'_>) -> Result<Self::Output> {
        Ok(analyze_unit(unit, &ctx.config.performance))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopKind {
    For,
    While,
}

/// A loop whose nested structure makes it a likely runtime hotspot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotspot {
    pub file: String,
    pub line: u32,
    pub loop_kind: LoopKind,
    /// 1 plus nested loops and branches.
    pub complexity: u32,
    pub suggestion: String,
}

/// A loop with a mechanical rewrite available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopOptimization {
    pub file: String,
    pub line: u32,
    pub loop_kind: LoopKind,
    pub suggestion: String,
}

/// A memory or I/O marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub file: String,
    pub line: u32,
    pub description: String,
}

/// A callee invoked repeatedly within one scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachingOpportunity {
    pub callee: String,
    pub calls: usize,
    /// Enclosing function, or `<module>`.
    pub scope: String,
    pub file: String,
    /// Line of the first call.
    pub line: u32,
}

/// Per-file performance result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilePerformance {
    pub path: String,
    pub skipped: bool,
    pub hotspots: Vec<Hotspot>,
    pub loop_optimizations: Vec<LoopOptimization>,
    pub memory_markers: Vec<Observation>,
    pub io_markers: Vec<Observation>,
    pub caching_opportunities: Vec<CachingOpportunity>,
    /// Functions already decorated with a cache.
    pub existing_caches: Vec<String>,
    /// Functions calling themselves.
    pub recursive_functions: Vec<String>,
    /// Deepest nesting of loops.
    pub max_loop_depth: u32,
    pub comprehensions: usize,
    pub generators: usize,
    /// `async def`, `await`, `async for` and `async with`.
    pub async_constructs: usize,
    pub time_complexity: String,
    pub performance_score: f64,
}

/// Project-level performance metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub hotspots: Vec<Hotspot>,
    pub loop_optimizations: Vec<LoopOptimization>,
    pub memory_markers: Vec<Observation>,
    pub io_markers: Vec<Observation>,
    pub caching_opportunities: Vec<CachingOpportunity>,
    pub existing_caches: Vec<String>,
    pub recursive_functions: Vec<String>,
    pub max_loop_depth: u32,
    pub comprehensions: usize,
    pub generators: usize,
    pub async_constructs: usize,
    /// Worst estimated time complexity.
    pub time_complexity: String,
    /// Caching-opportunity impact in `[0, 1]`.
    pub caching_impact: f64,
    pub performance_score: f64,
    pub total_files: usize,
}

/// Estimated time complexity from loop depth and recursion.
pub fn time_complexity(max_loop_depth: u32, recursive: bool) -> String {
    match (recursive, max_loop_depth) {
        (true, _) => "O(n^k) - recursive".to_string(),
        (false, 0) => "O(1)".to_string(),
        (false, 1) => "O(n)".to_string(),
        (false, depth) => format!("O(n^{depth})"),
    }
}

/// Caching impact: opportunities normalized to `[0, 1]`.
pub fn caching_impact(opportunities: usize) -> f64 {
    (opportunities as f64 / 5.0).min(1.0)
}

/// Weighted performance score in `[0, 100]`.
///
/// Each marker family contributes the inverse of its normalized count.
pub fn performance_score(hotspots: usize, memory: usize, io: usize, caching: usize) -> f64 {
    let inverse = |count: usize, scale: f64| 1.0 - (count as f64 / scale).min(1.0);
    let score = inverse(hotspots, 5.0) * 0.35
        + inverse(memory, 50.0) * 0.25
        + inverse(io, 25.0) * 0.2
        + (1.0 - caching_impact(caching)) * 0.2;
    (score * 100.0).clamp(0.0, 100.0)
}

/// Analyze one unit.
pub fn analyze_unit(unit: &SourceUnit, config: &PerformanceConfig) -> FilePerformance {
    let Some(root) = unit.root() else {
        return FilePerformance {
            path: unit.display_path(),
            skipped: true,
            ..Default::default()
        };
    };

    let mut visitor = PerformanceVisitor {
        unit,
        config,
        result: FilePerformance {
            path: unit.display_path(),
            ..Default::default()
        },
        loop_depth: 0,
        scopes: vec![Scope::new("<module>")],
    };
    walk(root, &mut visitor);
    if let Some(module) = visitor.scopes.pop() {
        visitor.flush(module);
    }

    let mut result = visitor.result;
    result
        .caching_opportunities
        .sort_by(|a, b| b.calls.cmp(&a.calls).then_with(|| a.line.cmp(&b.line)));
    result.time_complexity = time_complexity(result.max_loop_depth, !result.recursive_functions.is_empty());
    result.performance_score = performance_score(
        result.hotspots.len(),
        result.memory_markers.len(),
        result.io_markers.len(),
        result.caching_opportunities.len(),
    );
    result
}

struct Scope {
    name: String,
    /// Callee text to (count, first line).
    calls: BTreeMap<String, (usize, u32)>,
}

impl Scope {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: BTreeMap::new(),
        }
    }
}

struct PerformanceVisitor<'u> {
    unit: &'u SourceUnit,
    config: &'u PerformanceConfig,
    result: FilePerformance,
    loop_depth: u32,
    scopes: Vec<Scope>,
}

impl PerformanceVisitor<'_> {
    fn observe(&mut self, node: Node<'_>, description: String, io: bool) {
        let observation = Observation {
            file: self.result.path.clone(),
            line: start_line(&node),
            description,
        };
        if io {
            self.result.io_markers.push(observation);
        } else {
            self.result.memory_markers.push(observation);
        }
    }

    fn flush(&mut self, scope: Scope) {
        for (callee, (calls, line)) in scope.calls {
            if calls > self.config.repeated_call_threshold {
                self.result.caching_opportunities.push(CachingOpportunity {
                    callee,
                    calls,
                    scope: scope.name.clone(),
                    file: self.result.path.clone(),
                    line,
                });
            }
        }
    }

    fn enter_function(&mut self, node: Node<'_>) {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.unit.text(&n).to_string())
            .unwrap_or_default();

        if node.child(0).is_some_and(|c| c.kind() == "async") {
            self.result.async_constructs += 1;
        }
        if has_cache_decorator(node, self.unit) {
            self.result.existing_caches.push(name.clone());
        }
        if let Some(body) = node.child_by_field_name("body") {
            if calls_itself(body, &name, self.unit) {
                self.result.recursive_functions.push(name.clone());
            }
        }
        self.scopes.push(Scope::new(&name));
    }

    fn enter_loop(&mut self, node: Node<'_>, kind: LoopKind) {
        self.loop_depth += 1;
        self.result.max_loop_depth = self.result.max_loop_depth.max(self.loop_depth);
        if node.child(0).is_some_and(|c| c.kind() == "async") {
            self.result.async_constructs += 1;
        }

        let line = start_line(&node);
        let complexity = 1 + count_descendants(node, |k| k.is_loop() || matches!(k, NodeKind::If | NodeKind::Elif));
        if complexity > self.config.hotspot_threshold {
            let suggestion = if complexity > self.config.hotspot_threshold * 2 {
                "Restructure into smaller functions"
            } else {
                match kind {
                    LoopKind::For => "Consider list comprehension or vectorization",
                    LoopKind::While => "Evaluate loop termination condition",
                }
            };
            self.result.hotspots.push(Hotspot {
                file: self.result.path.clone(),
                line,
                loop_kind: kind,
                complexity: complexity as u32,
                suggestion: suggestion.to_string(),
            });
        }

        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let suggestion = match kind {
            LoopKind::For if is_single_append(body, self.unit) => Some("Replace with list comprehension"),
            LoopKind::While if statement_count(body) > self.config.max_loop_statements => {
                Some("Consider breaking into smaller loops")
            }
            _ => None,
        };
        if let Some(suggestion) = suggestion {
            self.result.loop_optimizations.push(LoopOptimization {
                file: self.result.path.clone(),
                line,
                loop_kind: kind,
                suggestion: suggestion.to_string(),
            });
        }
    }

    fn enter_call(&mut self, node: Node<'_>) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        if !matches!(function.kind(), "identifier" | "attribute") {
            return;
        }
        let callee = self.unit.text(&function).to_string();
        let last = callee.rsplit('.').next().unwrap_or(&callee).to_string();

        if last == "deepcopy" || callee == "copy.copy" || callee == "copy" {
            self.observe(node, "Deep copy operation".to_string(), false);
        }
        if IO_CALLS.contains(&last.as_str()) {
            self.observe(node, format!("{callee} call"), true);
        }

        let line = start_line(&node);
        if let Some(scope) = self.scopes.last_mut() {
            let entry = scope.calls.entry(callee).or_insert((0, line));
            entry.0 += 1;
        }
    }
}

impl<'t> Visitor<'t> for PerformanceVisitor<'_> {
    fn enter(&mut self, node: Node<'t>, kind: NodeKind) -> Descend {
        match kind {
            NodeKind::FunctionDef => self.enter_function(node),
            NodeKind::For => self.enter_loop(node, LoopKind::For),
            NodeKind::While => self.enter_loop(node, LoopKind::While),
            NodeKind::With => {
                if node.child(0).is_some_and(|c| c.kind() == "async") {
                    self.result.async_constructs += 1;
                }
            }
            NodeKind::Await => self.result.async_constructs += 1,
            NodeKind::Call => self.enter_call(node),
            NodeKind::ListComp | NodeKind::SetComp | NodeKind::DictComp => {
                self.result.comprehensions += 1;
                self.observe(node, "Large comprehension".to_string(), false);
            }
            NodeKind::GeneratorExp => self.result.generators += 1,
            NodeKind::List => self.observe(node, "List allocation".to_string(), false),
            NodeKind::Dict => self.observe(node, "Dict allocation".to_string(), false),
            NodeKind::Set => self.observe(node, "Set allocation".to_string(), false),
            _ => {}
        }
        Descend::Continue
    }

    fn leave(&mut self, _node: Node<'t>, kind: NodeKind) {
        match kind {
            NodeKind::FunctionDef => {
                if self.scopes.len() > 1 {
                    if let Some(scope) = self.scopes.pop() {
                        self.flush(scope);
                    }
                }
            }
            NodeKind::For | NodeKind::While => self.loop_depth = self.loop_depth.saturating_sub(1),
            _ => {}
        }
    }
}

/// A loop body consisting solely of `target.append(...)`.
fn is_single_append(body: Node<'_>, unit: &SourceUnit) -> bool {
    if statement_count(body) != 1 {
        return false;
    }
    let mut cursor = body.walk();
    let Some(stmt) = body.named_children(&mut cursor).find(|c| c.kind() != "comment") else {
        return false;
    };
    stmt.kind() == "expression_statement"
        && stmt
            .named_child(0)
            .filter(|call| call.kind() == "call")
            .and_then(|call| call.child_by_field_name("function"))
            .filter(|f| f.kind() == "attribute")
            .and_then(|f| f.child_by_field_name("attribute"))
            .is_some_and(|attr| unit.text(&attr) == "append")
}

fn has_cache_decorator(def: Node<'_>, unit: &SourceUnit) -> bool {
    let Some(parent) = def.parent().filter(|p| p.kind() == "decorated_definition") else {
        return false;
    };
    let mut cursor = parent.walk();
    let found = parent.named_children(&mut cursor).any(|c| {
        if c.kind() != "decorator" {
            return false;
        }
        let text = unit.text(&c).trim_start_matches('@');
        let name = text.split('(').next().unwrap_or(text);
        let last = name.rsplit('.').next().unwrap_or(name).trim();
        CACHE_DECORATORS.contains(&last)
    });
    found
}

/// Whether a function body calls the function by name (`f()` or `self.f()`).
fn calls_itself(body: Node<'_>, name: &str, unit: &SourceUnit) -> bool {
    if name.is_empty() {
        return false;
    }
    let method = format!("self.{name}");
    any_descendant(body, |node| {
        node.kind() == "call"
            && node.child_by_field_name("function").is_some_and(|f| {
                let text = unit.text(&f);
                text == name || text == method
            })
    })
}

/// Combine per-file results into project metrics.
pub fn summarize(files: &[FilePerformance]) -> PerformanceMetrics {
    let analyzed: Vec<&FilePerformance> = files.iter().filter(|f| !f.skipped).collect();
    if analyzed.is_empty() {
        return PerformanceMetrics::default();
    }

    let mut metrics = PerformanceMetrics {
        total_files: analyzed.len(),
        ..Default::default()
    };
    for file in &analyzed {
        metrics.hotspots.extend(file.hotspots.iter().cloned());
        metrics.loop_optimizations.extend(file.loop_optimizations.iter().cloned());
        metrics.memory_markers.extend(file.memory_markers.iter().cloned());
        metrics.io_markers.extend(file.io_markers.iter().cloned());
        metrics.caching_opportunities.extend(file.caching_opportunities.iter().cloned());
        metrics.existing_caches.extend(file.existing_caches.iter().cloned());
        metrics.recursive_functions.extend(file.recursive_functions.iter().cloned());
        metrics.max_loop_depth = metrics.max_loop_depth.max(file.max_loop_depth);
        metrics.comprehensions += file.comprehensions;
        metrics.generators += file.generators;
        metrics.async_constructs += file.async_constructs;
    }
    metrics.hotspots.sort_by(|a, b| {
        b.complexity
            .cmp(&a.complexity)
            .then_with(|| a.file.cmp(&b.file))
            .then_with(|| a.line.cmp(&b.line))
    });

    metrics.time_complexity = time_complexity(metrics.max_loop_depth, !metrics.recursive_functions.is_empty());
    metrics.caching_impact = caching_impact(metrics.caching_opportunities.len());
    metrics.performance_score = performance_score(
        metrics.hotspots.len(),
        metrics.memory_markers.len(),
        metrics.io_markers.len(),
        metrics.caching_opportunities.len(),
    );
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn analyze(code: &str) -> FilePerformance {
        let unit = SourceUnit::parse("perf.py", code, &Parser::new());
        analyze_unit(&unit, &PerformanceConfig::default())
    }

    #[test]
    fn test_simple_function_has_no_findings() {
        let result = analyze("def f(): return 1\n");
        assert!(result.hotspots.is_empty());
        assert!(result.memory_markers.is_empty());
        assert!(result.io_markers.is_empty());
        assert_eq!(result.time_complexity, "O(1)");
        assert!((result.performance_score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_hotspot_detection() {
        let code = r#"
def scan(grid):
    for row in grid:
        for cell in row:
            if cell:
                for x in cell:
                    if x:
                        while x:
                            x -= 1
"#;
        let result = analyze(code);
        assert_eq!(result.hotspots.len(), 1);
        let hotspot = &result.hotspots[0];
        assert_eq!(hotspot.line, 3);
        assert_eq!(hotspot.loop_kind, LoopKind::For);
        assert_eq!(hotspot.complexity, 6);
        assert_eq!(hotspot.suggestion, "Consider list comprehension or vectorization");
        assert_eq!(result.max_loop_depth, 4);
        assert_eq!(result.time_complexity, "O(n^4)");
    }

    #[test]
    fn test_elif_chain_counts_like_nested_ifs() {
        let chain = r#"
def classify(items):
    for item in items:
        if item == 1:
            pass
        elif item == 2:
            pass
        elif item == 3:
            pass
        elif item == 4:
            pass
        elif item == 5:
            pass
"#;
        let nested = r#"
def classify(items):
    for item in items:
        if item == 1:
            pass
        else:
            if item == 2:
                pass
            else:
                if item == 3:
                    pass
                else:
                    if item == 4:
                        pass
                    else:
                        if item == 5:
                            pass
"#;
        let chain = analyze(chain);
        let nested = analyze(nested);
        assert_eq!(chain.hotspots.len(), 1);
        assert_eq!(nested.hotspots.len(), 1);
        assert_eq!(chain.hotspots[0].complexity, 6);
        assert_eq!(chain.hotspots[0].complexity, nested.hotspots[0].complexity);
    }

    #[test]
    fn test_single_append_loop() {
        let result = analyze("out = []\nfor x in items:\n    out.append(x * 2)\n");
        assert_eq!(result.loop_optimizations.len(), 1);
        assert_eq!(result.loop_optimizations[0].suggestion, "Replace with list comprehension");
        assert_eq!(result.time_complexity, "O(n)");
    }

    #[test]
    fn test_long_while_body() {
        let mut code = String::from("while running:\n");
        for i in 0..11 {
            code.push_str(&format!("    step_{i}()\n"));
        }
        let result = analyze(&code);
        assert_eq!(result.loop_optimizations.len(), 1);
        assert_eq!(result.loop_optimizations[0].loop_kind, LoopKind::While);
    }

    #[test]
    fn test_memory_and_io_markers() {
        let code = "import copy\nsquares = [x * x for x in range(10)]\nconfig = {'a': 1}\nclone = copy.deepcopy(config)\nwith open('f') as fh:\n    print(fh.read())\n";
        let result = analyze(code);
        let memory: Vec<_> = result.memory_markers.iter().map(|m| m.description.as_str()).collect();
        assert_eq!(memory, vec!["Large comprehension", "Dict allocation", "Deep copy operation"]);
        assert_eq!(result.io_markers.len(), 3);
        assert_eq!(result.comprehensions, 1);
    }

    #[test]
    fn test_caching_opportunity_per_scope() {
        let code = "def a():\n    load()\n    load()\n    load()\n\ndef b():\n    load()\n    load()\n";
        let result = analyze(code);
        assert_eq!(result.caching_opportunities.len(), 1);
        let opportunity = &result.caching_opportunities[0];
        assert_eq!(opportunity.callee, "load");
        assert_eq!(opportunity.calls, 3);
        assert_eq!(opportunity.scope, "a");
        assert_eq!(opportunity.line, 2);
    }

    #[test]
    fn test_recursion_async_and_caches() {
        let code = r#"
from functools import lru_cache

@lru_cache(maxsize=None)
def fib(n):
    return n if n < 2 else fib(n - 1) + fib(n - 2)

async def fetch(client):
    async with client.session() as s:
        return await s.get()
"#;
        let result = analyze(code);
        assert_eq!(result.recursive_functions, vec!["fib".to_string()]);
        assert_eq!(result.existing_caches, vec!["fib".to_string()]);
        assert_eq!(result.async_constructs, 3);
        assert_eq!(result.time_complexity, "O(n^k) - recursive");
    }

    #[test]
    fn test_generators_are_not_memory_markers() {
        let result = analyze("total = sum(x for x in items)\n");
        assert_eq!(result.generators, 1);
        assert!(result.memory_markers.is_empty());
    }

    #[test]
    fn test_score_bounds() {
        assert!((performance_score(0, 0, 0, 0) - 100.0).abs() < 1e-9);
        assert_eq!(performance_score(100, 100, 100, 100), 0.0);
        assert!(performance_score(1, 0, 0, 0) < 100.0);
    }

    #[test]
    fn test_time_complexity_labels() {
        assert_eq!(time_complexity(0, false), "O(1)");
        assert_eq!(time_complexity(1, false), "O(n)");
        assert_eq!(time_complexity(3, false), "O(n^3)");
        assert_eq!(time_complexity(1, true), "O(n^k) - recursive");
    }

    #[test]
    fn test_summarize() {
        let a = analyze("for x in a:\n    for y in b:\n        pass\n");
        let b = analyze("print(1)\n");
        let skipped = analyze("def broken(:\n");
        assert!(skipped.skipped);
        let metrics = summarize(&[a, b, skipped]);
        assert_eq!(metrics.total_files, 2);
        assert_eq!(metrics.max_loop_depth, 2);
        assert_eq!(metrics.time_complexity, "O(n^2)");
        assert_eq!(metrics.io_markers.len(), 1);
        assert!((0.0..=100.0).contains(&metrics.performance_score));
    }

    #[test]
    fn test_summarize_empty() {
        let metrics = summarize(&[]);
        assert_eq!(metrics.performance_score, 0.0);
        assert_eq!(metrics.total_files, 0);
    }
}
