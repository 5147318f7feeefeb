//! Dependency analyzer - imports, unused imports, the internal import graph and its cycles.
//!
//! Per file the analyzer records which top-level modules are imported and
//! which of them are never read. The project summary resolves imports to the
//! project's own modules by dotted path, builds a directed graph over them,
//! enumerates cycles and folds the external package health report into a
//! single health score.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::config::DependencyConfig;
use crate::core::{AnalysisContext, Analyzer as AnalyzerTrait, Result, SourceUnit};
use crate::health::HealthStatus;
use crate::parser::records::{extract_imports, ImportRecord, ImportSet};

/// Dependency analyzer.
#[derive(Default)]
pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }
}

impl AnalyzerTrait for Analyzer {
    type Output = FileDependencies;

    fn name(&self) -> &'static str {
        "dependency"
    }

    fn description(&self) -> &'static str {
        "Extract imports, find unused imports and import cycles"
    }

    fn analyze(&self, unit: &SourceUnit, ctx: &AnalysisContext<'_>) -> Result<Self::Output> {
        Ok(analyze_unit(unit, ctx.root))
    }
}

/// Per-file import result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileDependencies {
    pub path: String,
    pub skipped: bool,
    /// Dotted module path other files use to import this one.
    pub module: String,
    /// Whether the file is a package `__init__`.
    pub package: bool,
    pub imports: ImportSet,
}

/// Analyze one unit whose module path is taken relative to `root`.
pub fn analyze_unit(unit: &SourceUnit, root: &Path) -> FileDependencies {
    FileDependencies {
        path: unit.display_path(),
        skipped: unit.root().is_none(),
        module: unit.module_path(root),
        package: unit.is_package_init(),
        imports: extract_imports(unit),
    }
}

/// One line of a requirements manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,
    /// Version constraint as written (`==1.0`, `>=2`), empty when unpinned.
    pub spec: String,
}

/// Parse a `requirements.txt` body.
///
/// Comments, blank lines and pip options (`-r`, `-e`, `--index-url`) are
/// ignored; extras and environment markers are dropped from the name.
pub fn parse_requirements(text: &str) -> Vec<Requirement> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty() && !line.starts_with('-'))
        .filter_map(|line| {
            let line = line.split(';').next().unwrap_or(line).trim();
            let end = line
                .find(|c: char| matches!(c, '=' | '>' | '<' | '~' | '!' | '[' | ' '))
                .unwrap_or(line.len());
            let name = line[..end].trim();
            if name.is_empty() {
                return None;
            }
            let spec = line[end..].trim_start_matches(|c: char| c == '[' || c.is_whitespace());
            let spec = match spec.find(']') {
                Some(close) if line[end..].starts_with('[') => spec[close + 1..].trim(),
                _ => spec.trim(),
            };
            Some(Requirement {
                name: name.to_string(),
                spec: spec.to_string(),
            })
        })
        .collect()
}

/// Read a manifest; a missing or unreadable file has no requirements.
pub fn read_requirements(path: &Path) -> Vec<Requirement> {
    fs::read_to_string(path)
        .map(|text| parse_requirements(&text))
        .unwrap_or_default()
}

fn join(base: &str, name: &str) -> String {
    match (base.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{base}.{name}"),
    }
}

/// Package a relative import with `level` leading dots starts from.
fn package_of(file: &FileDependencies, level: usize) -> Option<String> {
    let mut parts: Vec<&str> = file.module.split('.').collect();
    if !file.package {
        parts.pop();
    }
    for _ in 1..level {
        parts.pop()?;
    }
    Some(parts.join("."))
}

/// The project's modules by dotted path.
struct ModuleIndex<'a> {
    modules: BTreeSet<&'a str>,
}

impl<'a> ModuleIndex<'a> {
    fn new(files: &'a [FileDependencies]) -> Self {
        Self {
            modules: files
                .iter()
                .filter(|f| !f.module.is_empty())
                .map(|f| f.module.as_str())
                .collect(),
        }
    }

    fn find(&self, dotted: &str, file: &FileDependencies, absolute: bool) -> Option<&'a str> {
        if let Some(module) = self.modules.get(dotted) {
            return Some(*module);
        }
        if !absolute {
            return None;
        }
        // A script imports its siblings from its own directory.
        if let Some(package) = package_of(file, 1).filter(|p| !p.is_empty()) {
            if let Some(module) = self.modules.get(join(&package, dotted).as_str()) {
                return Some(*module);
            }
        }
        // Packages below a plain source directory such as `src/`.
        if dotted.contains('.') {
            let suffix = format!(".{dotted}");
            let mut found = self.modules.iter().filter(|m| m.ends_with(&suffix));
            if let (Some(module), None) = (found.next(), found.next()) {
                return Some(*module);
            }
        }
        None
    }

    /// Longest prefix of `dotted` naming a project module.
    fn find_prefix(&self, dotted: &str, file: &FileDependencies, absolute: bool) -> Option<&'a str> {
        let parts: Vec<&str> = dotted.split('.').collect();
        (1..=parts.len())
            .rev()
            .find_map(|n| self.find(&parts[..n].join("."), file, absolute))
    }

    /// Project modules one import statement binding loads.
    ///
    /// `from pkg import b` targets the submodule `pkg.b` when the project
    /// defines it and falls back to the package itself otherwise.
    fn resolve(&self, file: &FileDependencies, import: &ImportRecord) -> BTreeSet<&'a str> {
        let absolute = import.level == 0;
        let base = if absolute {
            import.target.clone()
        } else {
            let Some(package) = package_of(file, import.level) else {
                return BTreeSet::new();
            };
            join(&package, &import.target)
        };
        if base.is_empty() {
            return BTreeSet::new();
        }

        let mut targets: BTreeSet<&'a str> = import
            .names
            .iter()
            .filter_map(|name| self.find(&join(&base, name), file, absolute))
            .collect();
        if targets.len() < import.names.len() || import.names.is_empty() {
            targets.extend(self.find_prefix(&base, file, absolute));
        }
        targets
    }
}

/// Directed "imports" graph over project-internal modules.
#[derive(Debug, Clone, Default)]
pub struct ImportGraph {
    graph: DiGraph<String, ()>,
    index: BTreeMap<String, NodeIndex>,
}

impl ImportGraph {
    /// Build the graph from per-file results. Only imports that resolve to a
    /// module defined in `files` become edges.
    pub fn build(files: &[FileDependencies]) -> Self {
        let index = ModuleIndex::new(files);
        let mut graph = Self::default();
        for module in &index.modules {
            graph.node(module);
        }

        for file in files.iter().filter(|f| !f.skipped && !f.module.is_empty()) {
            for import in &file.imports.imports {
                for target in index.resolve(file, import) {
                    graph.edge(&file.module, target);
                }
            }
        }
        graph
    }

    /// Build from explicit edges.
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut graph = Self::default();
        for (from, to) in edges {
            graph.node(from);
            graph.node(to);
            graph.edge(from, to);
        }
        graph
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    fn edge(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        let from = self.node(from);
        let to = self.node(to);
        self.graph.update_edge(from, to, ());
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Module to the modules it imports, both sorted.
    pub fn adjacency(&self) -> BTreeMap<String, Vec<String>> {
        self.index
            .iter()
            .map(|(name, &idx)| {
                let mut targets: Vec<String> = self
                    .graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .map(|n| self.graph[n].clone())
                    .collect();
                targets.sort();
                (name.clone(), targets)
            })
            .collect()
    }

    fn sorted_targets(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut targets: Vec<NodeIndex> = self.graph.neighbors_directed(idx, Direction::Outgoing).collect();
        // Descending so popping yields name order.
        targets.sort_by(|a, b| self.graph[*b].cmp(&self.graph[*a]));
        targets
    }

    /// Enumerate cycles with a depth-first search that tracks the active path.
    ///
    /// Reaching a node already on the path reports the path suffix starting
    /// at that node. Nodes finished earlier are never re-entered, so each
    /// back edge yields exactly one cycle. Traversal follows module names in
    /// sorted order, making the result deterministic.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let count = self.graph.node_count();
        let mut visited = vec![false; count];
        let mut on_path = vec![false; count];
        let mut cycles = Vec::new();

        for &start in self.index.values() {
            if visited[start.index()] {
                continue;
            }
            visited[start.index()] = true;
            on_path[start.index()] = true;
            let mut path = vec![start];
            let mut stack = vec![(start, self.sorted_targets(start))];

            while let Some((node, pending)) = stack.last_mut() {
                let node = *node;
                match pending.pop() {
                    Some(next) if on_path[next.index()] => {
                        if let Some(pos) = path.iter().position(|&n| n == next) {
                            cycles.push(path[pos..].iter().map(|&n| self.graph[n].clone()).collect());
                        }
                    }
                    Some(next) if !visited[next.index()] => {
                        visited[next.index()] = true;
                        on_path[next.index()] = true;
                        path.push(next);
                        stack.push((next, self.sorted_targets(next)));
                    }
                    Some(_) => {}
                    None => {
                        on_path[node.index()] = false;
                        path.pop();
                        stack.pop();
                    }
                }
            }
        }
        cycles
    }
}

/// An import never read in its file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusedImport {
    pub file: String,
    pub module: String,
}

/// Project-level dependency metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyMetrics {
    pub total_files: usize,
    /// Import bindings across all files.
    pub total_imports: usize,
    pub imported_modules: BTreeSet<String>,
    pub unused_imports: Vec<UnusedImport>,
    /// Modules defined by the project's own files.
    pub internal_modules: BTreeSet<String>,
    /// Imported modules not defined in the project, standard library included.
    pub external_modules: BTreeSet<String>,
    /// Requirements declared in the manifest.
    pub requirements: Vec<Requirement>,
    pub graph: BTreeMap<String, Vec<String>>,
    pub cycles: Vec<Vec<String>>,
    pub outdated_packages: Vec<String>,
    pub vulnerable_packages: Vec<String>,
    /// Whether an external health report informed the score.
    pub health_checked: bool,
    pub health_score: f64,
}

/// 100 minus fixed penalties per unused import, cycle and vulnerable package.
pub fn health_score(unused: usize, cycles: usize, vulnerable: usize, config: &DependencyConfig) -> f64 {
    let penalty = unused as f64 * config.unused_penalty
        + cycles as f64 * config.cycle_penalty
        + vulnerable as f64 * config.vulnerability_penalty;
    (100.0 - penalty).clamp(0.0, 100.0)
}

/// Combine per-file results, the manifest and an optional health report.
pub fn summarize(
    files: &[FileDependencies],
    requirements: Vec<Requirement>,
    health: Option<&HealthStatus>,
    config: &DependencyConfig,
) -> DependencyMetrics {
    let analyzed: Vec<&FileDependencies> = files.iter().filter(|f| !f.skipped).collect();
    let graph = ImportGraph::build(files);
    let index = ModuleIndex::new(files);

    let internal_modules: BTreeSet<String> = index.modules.iter().map(|m| m.to_string()).collect();
    let top_level_packages: BTreeSet<&str> = index.modules.iter().filter_map(|m| m.split('.').next()).collect();

    let mut metrics = DependencyMetrics {
        total_files: analyzed.len(),
        requirements,
        graph: graph.adjacency(),
        cycles: graph.cycles(),
        ..Default::default()
    };

    for file in &analyzed {
        metrics.total_imports += file.imports.imports.len();
        metrics.imported_modules.extend(file.imports.modules.iter().cloned());
        metrics.unused_imports.extend(file.imports.unused.iter().map(|module| UnusedImport {
            file: file.path.clone(),
            module: module.clone(),
        }));
        metrics.external_modules.extend(
            file.imports
                .imports
                .iter()
                .filter(|i| {
                    !i.relative
                        && i.module != "__future__"
                        && !top_level_packages.contains(i.module.as_str())
                        && index.resolve(file, i).is_empty()
                })
                .map(|i| i.module.clone()),
        );
    }
    metrics.internal_modules = internal_modules;

    if let Some(status) = health.filter(|s| !s.degraded) {
        metrics.health_checked = true;
        metrics.outdated_packages = status.outdated_packages.clone();
        metrics.vulnerable_packages = status.vulnerable_packages.clone();
    }

    metrics.health_score = health_score(
        metrics.unused_imports.len(),
        metrics.cycles.len(),
        metrics.vulnerable_packages.len(),
        config,
    );
    metrics
}
