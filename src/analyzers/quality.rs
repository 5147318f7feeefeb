//! Quality analyzer - type hints, documentation, comments and lint heuristics.
//!
//! Per file this counts annotation sites, docstrings and comment lines, checks
//! naming conventions and a handful of style rules. Test coverage is not
//! derived from structure: it is measured once per project by a
//! [`crate::coverage::CoverageProvider`] and folded in by [`summarize`].

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use super::{percentage, Severity};
use crate::config::QualityConfig;
use crate::core::{AnalysisContext, Analyzer as AnalyzerTrait, Result, SourceUnit};
use crate::parser::records::{self, name_role, NameRole, UnitRecords};
use crate::parser::visitor::{walk, Descend, Visitor};
use crate::parser::{start_line, NodeKind};

/// Quality analyzer.
#[derive(Default)]
pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }
}

impl AnalyzerTrait for Analyzer {
    type Output = FileQuality;

    fn name(&self) -> &'static str {
        "quality"
    }

    fn description(&self) -> &'static str {
        "Measure type-hint, documentation and comment coverage with lint heuristics"
    }

    fn analyze(&self, unit: &SourceUnit, ctx: &AnalysisContext<'_>) -> Result<Self::Output> {
        Ok(analyze_unit(unit, &ctx.config.quality))
    }
}

/// Per-file quality counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileQuality {
    pub path: String,
    pub skipped: bool,
    /// Annotated return types, parameters and variables.
    pub annotated: usize,
    /// Sites that could carry an annotation.
    pub annotatable: usize,
    /// Module, classes and functions with a docstring.
    pub documented: usize,
    /// Module, classes and functions.
    pub documentable: usize,
    /// Sum of per-docstring quality scores in `[0, 1]`.
    pub docstring_quality_total: f64,
    pub comment_lines: usize,
    pub total_lines: usize,
    /// Names following their kind's convention.
    pub naming_conforming: usize,
    pub naming_checked: usize,
    pub lint_issues: Vec<LintIssue>,
    pub smells: Vec<CodeSmell>,
    /// 100 minus a fixed penalty per lint issue, floored at 0.
    pub lint_score: f64,
}

impl FileQuality {
    pub fn type_hint_coverage(&self) -> f64 {
        percentage(self.annotated, self.annotatable)
    }

    pub fn documentation_coverage(&self) -> f64 {
        percentage(self.documented, self.documentable)
    }
}

/// Style rules counted against the lint score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LintRule {
    FunctionTooLong,
    TooManyParameters,
    BareExcept,
}

/// One lint violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintIssue {
    pub rule: LintRule,
    pub file: String,
    pub line: u32,
    pub message: String,
}

/// Code smell categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmellKind {
    LongFunction,
    TooManyArguments,
    LargeClass,
    DuplicateCode,
}

/// One detected code smell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSmell {
    pub kind: SmellKind,
    pub severity: Severity,
    pub file: String,
    pub line: u32,
    /// Function or class name, or the duplicated line.
    pub location: String,
}

/// Project-level quality metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Percentage of annotation sites annotated.
    pub type_hint_coverage: f64,
    /// Percentage of modules, classes and functions documented.
    pub documentation_coverage: f64,
    /// Measured test coverage percentage (0 when unavailable).
    pub test_coverage: f64,
    /// Average per-file lint score.
    pub lint_score: f64,
    /// Comment lines over total lines.
    pub code_to_comment_ratio: f64,
    /// Percentage of names following conventions.
    pub naming_adherence: f64,
    /// Average docstring quality in `[0, 1]`.
    pub docstring_quality: f64,
    pub total_files: usize,
    pub lint_issues: Vec<LintIssue>,
    pub smells: Vec<CodeSmell>,
    /// Average smell severity weight in `[0, 1]`.
    pub smell_severity: f64,
}

impl QualityMetrics {
    /// Weighted quality score in `[0, 100]`.
    pub fn quality_score(&self) -> f64 {
        let comment = (self.code_to_comment_ratio * 100.0).min(100.0);
        let score = self.type_hint_coverage * 0.3
            + self.documentation_coverage * 0.3
            + self.test_coverage * 0.2
            + self.lint_score * 0.15
            + comment * 0.05;
        score.clamp(0.0, 100.0)
    }
}

/// Analyze one unit.
pub fn analyze_unit(unit: &SourceUnit, config: &QualityConfig) -> FileQuality {
    let Some(root) = unit.root() else {
        return FileQuality {
            path: unit.display_path(),
            skipped: true,
            ..Default::default()
        };
    };

    let records = records::extract(unit);
    let mut quality = FileQuality {
        path: unit.display_path(),
        comment_lines: unit.comment_lines(),
        total_lines: unit.line_count,
        ..Default::default()
    };

    count_annotations(&records, &mut quality);
    let variables = annotated_variables(root);
    quality.annotated += variables;
    quality.annotatable += variables;
    count_docstrings(&records, &mut quality);
    check_naming(root, unit, &records, &mut quality);
    lint(root, &records, unit, config, &mut quality);
    detect_smells(&records, unit, config, &mut quality);

    quality.lint_score = (100.0 - quality.lint_issues.len() as f64 * config.lint_penalty).max(0.0);
    quality
}

fn count_annotations(records: &UnitRecords, quality: &mut FileQuality) {
    for func in records.all_functions() {
        let params = func.annotatable_params();
        quality.annotatable += 1 + params;
        quality.annotated += usize::from(!func.returns.is_empty()) + func.annotated_params.min(params);
    }
}

/// Annotated assignments (`x: int = 0`); each is an annotation site that is annotated.
fn annotated_variables(root: Node<'_>) -> usize {
    struct Annotated(usize);

    impl<'t> Visitor<'t> for Annotated {
        fn enter(&mut self, node: Node<'t>, kind: NodeKind) -> Descend {
            if kind == NodeKind::Assignment && node.child_by_field_name("type").is_some() {
                self.0 += 1;
            }
            Descend::Continue
        }
    }

    let mut counter = Annotated(0);
    walk(root, &mut counter);
    counter.0
}

fn count_docstrings(records: &UnitRecords, quality: &mut FileQuality) {
    let docstrings = std::iter::once(records.module_docstring.as_str())
        .chain(records.classes.iter().map(|c| c.docstring.as_str()))
        .chain(records.all_functions().map(|f| f.docstring.as_str()));

    for docstring in docstrings {
        quality.documentable += 1;
        if !docstring.is_empty() {
            quality.documented += 1;
            quality.docstring_quality_total += docstring_quality(docstring);
        }
    }
}

/// Score a docstring by the sections it carries and its length.
pub fn docstring_quality(docstring: &str) -> f64 {
    static SECTIONS: OnceLock<Vec<Regex>> = OnceLock::new();
    let sections = SECTIONS.get_or_init(|| {
        [
            r"Args:|Parameters:",
            r"Returns:|Yields:",
            r"Raises:|Exceptions:",
            r"Examples?:",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    });

    let mut score = sections.iter().filter(|re| re.is_match(docstring)).count() as f64 * 0.2;
    if docstring.split_whitespace().count() >= 10 {
        score += 0.2;
    }
    score
}

#[derive(Debug, Clone, Copy)]
enum NameKind {
    Function,
    Class,
    Variable,
}

/// Whether a name follows Python's convention for its kind.
///
/// Leading and trailing underscores (private names, dunders) are ignored.
fn follows_convention(name: &str, kind: NameKind) -> bool {
    let core = name.trim_matches('_');
    if core.is_empty() {
        return true;
    }
    let snake = || {
        core.starts_with(|c: char| c.is_ascii_lowercase())
            && core.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    };
    match kind {
        NameKind::Function => snake(),
        NameKind::Class => {
            core.starts_with(|c: char| c.is_ascii_uppercase()) && core.chars().all(|c| c.is_ascii_alphanumeric())
        }
        NameKind::Variable => {
            snake()
                || (core.starts_with(|c: char| c.is_ascii_uppercase())
                    && core.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'))
        }
    }
}

fn check_naming(root: Node<'_>, unit: &SourceUnit, records: &UnitRecords, quality: &mut FileQuality) {
    let mut record = |ok: bool| {
        quality.naming_checked += 1;
        quality.naming_conforming += usize::from(ok);
    };

    for func in records.all_functions() {
        record(follows_convention(&func.name, NameKind::Function));
    }
    for class in &records.classes {
        record(follows_convention(&class.name, NameKind::Class));
    }

    struct Variables<'u> {
        unit: &'u SourceUnit,
        seen: HashSet<String>,
    }

    impl<'t> Visitor<'t> for Variables<'_> {
        fn enter(&mut self, node: Node<'t>, kind: NodeKind) -> Descend {
            if kind == NodeKind::Identifier && name_role(node) == NameRole::Store && is_variable_target(node) {
                self.seen.insert(self.unit.text(&node).to_string());
            }
            Descend::Continue
        }
    }

    let mut variables = Variables {
        unit,
        seen: HashSet::new(),
    };
    walk(root, &mut variables);
    for name in &variables.seen {
        record(follows_convention(name, NameKind::Variable));
    }
}

/// Store-context identifiers that bind variables (not parameters or definitions).
fn is_variable_target(ident: Node<'_>) -> bool {
    !ident.parent().is_some_and(|p| {
        matches!(
            p.kind(),
            "function_definition"
                | "class_definition"
                | "parameters"
                | "lambda_parameters"
                | "typed_parameter"
                | "default_parameter"
                | "typed_default_parameter"
                | "list_splat_pattern"
                | "dictionary_splat_pattern"
        )
    })
}

fn lint(root: Node<'_>, records: &UnitRecords, unit: &SourceUnit, config: &QualityConfig, quality: &mut FileQuality) {
    let file = unit.display_path();

    for func in records.all_functions() {
        if func.body_statements > config.max_function_statements {
            quality.lint_issues.push(LintIssue {
                rule: LintRule::FunctionTooLong,
                file: file.clone(),
                line: func.start_line,
                message: format!(
                    "Function '{}' has {} statements (max {})",
                    func.name, func.body_statements, config.max_function_statements
                ),
            });
        }
        let params = func.annotatable_params();
        if params > config.max_parameters {
            quality.lint_issues.push(LintIssue {
                rule: LintRule::TooManyParameters,
                file: file.clone(),
                line: func.start_line,
                message: format!(
                    "Function '{}' takes {} parameters (max {})",
                    func.name, params, config.max_parameters
                ),
            });
        }
    }

    struct BareExcepts(Vec<u32>);

    impl<'t> Visitor<'t> for BareExcepts {
        fn enter(&mut self, node: Node<'t>, kind: NodeKind) -> Descend {
            if kind == NodeKind::Except && is_bare_except(node) {
                self.0.push(start_line(&node));
            }
            Descend::Continue
        }
    }

    let mut bare = BareExcepts(Vec::new());
    walk(root, &mut bare);
    for line in bare.0 {
        quality.lint_issues.push(LintIssue {
            rule: LintRule::BareExcept,
            file: file.clone(),
            line,
            message: "Bare 'except:' catches every exception".to_string(),
        });
    }

    quality.lint_issues.sort_by_key(|issue| issue.line);
}

/// An `except:` clause with no exception type.
fn is_bare_except(clause: Node<'_>) -> bool {
    let mut cursor = clause.walk();
    let bare = clause
        .named_children(&mut cursor)
        .all(|c| matches!(c.kind(), "block" | "comment"));
    bare
}

fn detect_smells(records: &UnitRecords, unit: &SourceUnit, config: &QualityConfig, quality: &mut FileQuality) {
    let file = unit.display_path();
    let smell = |kind, severity, line, location: String| CodeSmell {
        kind,
        severity,
        file: file.clone(),
        line,
        location,
    };

    let mut smells = Vec::new();
    for func in records.all_functions() {
        if func.body_statements > config.long_function_statements {
            smells.push(smell(
                SmellKind::LongFunction,
                Severity::Medium,
                func.start_line,
                format!("function {}", func.name),
            ));
        }
        if func.annotatable_params() > config.max_parameters {
            smells.push(smell(
                SmellKind::TooManyArguments,
                Severity::Medium,
                func.start_line,
                format!("function {}", func.name),
            ));
        }
    }
    for class in &records.classes {
        if class.body_statements > config.large_class_statements {
            smells.push(smell(
                SmellKind::LargeClass,
                Severity::High,
                class.start_line,
                format!("class {}", class.name),
            ));
        }
    }

    // Substantial lines repeated verbatim; each distinct line is reported once.
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for (idx, line) in unit.source.lines().enumerate() {
        let stripped = line.trim();
        if stripped.len() <= 20 || stripped.starts_with('#') {
            continue;
        }
        if !seen.insert(stripped) && reported.insert(stripped) {
            smells.push(smell(
                SmellKind::DuplicateCode,
                Severity::High,
                idx as u32 + 1,
                stripped.to_string(),
            ));
        }
    }

    smells.sort_by_key(|s| s.line);
    quality.smells = smells;
}

/// Combine per-file results and the project's measured test coverage.
///
/// Coverage ratios pool their counts across files; the lint score is the
/// average of per-file lint scores.
pub fn summarize(files: &[FileQuality], test_coverage: f64) -> QualityMetrics {
    let analyzed: Vec<&FileQuality> = files.iter().filter(|f| !f.skipped).collect();
    let test_coverage = test_coverage.clamp(0.0, 100.0);
    if analyzed.is_empty() {
        return QualityMetrics {
            test_coverage,
            naming_adherence: 100.0,
            ..Default::default()
        };
    }

    let sum = |f: fn(&FileQuality) -> usize| analyzed.iter().map(|q| f(q)).sum::<usize>();
    let documented = sum(|q| q.documented);
    let comment_lines = sum(|q| q.comment_lines);
    let total_lines = sum(|q| q.total_lines);
    let naming_checked = sum(|q| q.naming_checked);

    let mut metrics = QualityMetrics {
        type_hint_coverage: percentage(sum(|q| q.annotated), sum(|q| q.annotatable)),
        documentation_coverage: percentage(documented, sum(|q| q.documentable)),
        test_coverage,
        lint_score: analyzed.iter().map(|q| q.lint_score).sum::<f64>() / analyzed.len() as f64,
        code_to_comment_ratio: if total_lines > 0 {
            comment_lines as f64 / total_lines as f64
        } else {
            0.0
        },
        naming_adherence: if naming_checked > 0 {
            percentage(sum(|q| q.naming_conforming), naming_checked)
        } else {
            100.0
        },
        docstring_quality: if documented > 0 {
            analyzed.iter().map(|q| q.docstring_quality_total).sum::<f64>() / documented as f64
        } else {
            0.0
        },
        total_files: analyzed.len(),
        ..Default::default()
    };

    for file in &analyzed {
        metrics.lint_issues.extend(file.lint_issues.iter().cloned());
        metrics.smells.extend(file.smells.iter().cloned());
    }
    if !metrics.smells.is_empty() {
        metrics.smell_severity =
            metrics.smells.iter().map(|s| s.severity.weight()).sum::<f64>() / metrics.smells.len() as f64;
    }

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn analyze(code: &str) -> FileQuality {
        let unit = SourceUnit::parse("q.py", code, &Parser::new());
        analyze_unit(&unit, &QualityConfig::default())
    }

    #[test]
    fn test_undocumented_function() {
        let q = analyze("def f(): return 1\n");
        assert_eq!(q.documentable, 2);
        assert_eq!(q.documented, 0);
        assert_eq!(q.documentation_coverage(), 0.0);
        assert_eq!(q.annotatable, 1);
        assert_eq!(q.annotated, 0);
        assert_eq!(q.lint_score, 100.0);
    }

    #[test]
    fn test_type_hint_coverage() {
        let q = analyze("def f(a: int, b) -> int:\n    return a\n");
        assert_eq!(q.annotatable, 3);
        assert_eq!(q.annotated, 2);

        let q = analyze("class A:\n    def m(self, x: int) -> None:\n        self.y: int = x\n");
        assert_eq!(q.annotatable, 3);
        assert_eq!(q.annotated, 3);
        assert_eq!(q.type_hint_coverage(), 100.0);

        let q = analyze("class A:\n    def m(self: \"A\", x, y) -> None:\n        pass\n");
        assert_eq!(q.annotatable, 3);
        assert_eq!(q.annotated, 1);
    }

    #[test]
    fn test_documentation_counts_module_classes_functions() {
        let code = "\"\"\"Module.\"\"\"\n\nclass A:\n    \"\"\"A class.\"\"\"\n    def m(self):\n        pass\n";
        let q = analyze(code);
        assert_eq!(q.documentable, 3);
        assert_eq!(q.documented, 2);
    }

    #[test]
    fn test_lint_rules() {
        let code = "def many(a, b, c, d, e, f):\n    try:\n        pass\n    except:\n        pass\n";
        let q = analyze(code);
        let rules: Vec<_> = q.lint_issues.iter().map(|i| i.rule).collect();
        assert_eq!(rules, vec![LintRule::TooManyParameters, LintRule::BareExcept]);
        assert_eq!(q.lint_score, 90.0);
        assert_eq!(q.lint_issues[1].line, 4);
    }

    #[test]
    fn test_typed_except_is_not_bare() {
        let q = analyze("try:\n    pass\nexcept ValueError:\n    pass\nexcept (KeyError, IndexError) as e:\n    pass\n");
        assert!(q.lint_issues.is_empty());
    }

    #[test]
    fn test_self_is_not_a_parameter() {
        let q = analyze("class A:\n    def m(self, a, b, c, d, e):\n        pass\n");
        assert!(q.lint_issues.is_empty());
    }

    #[test]
    fn test_naming_conventions() {
        assert!(follows_convention("load_data", NameKind::Function));
        assert!(follows_convention("__init__", NameKind::Function));
        assert!(!follows_convention("LoadData", NameKind::Function));
        assert!(follows_convention("HttpClient", NameKind::Class));
        assert!(!follows_convention("http_client", NameKind::Class));
        assert!(follows_convention("MAX_SIZE", NameKind::Variable));
        assert!(!follows_convention("maxSize", NameKind::Variable));

        let q = analyze("def goodName():\n    badVar = 1\n    ok = 2\n");
        assert_eq!(q.naming_checked, 3);
        assert_eq!(q.naming_conforming, 1);
    }

    #[test]
    fn test_docstring_quality() {
        assert_eq!(docstring_quality("Short."), 0.0);
        let full = "Load the data from disk into memory for processing.\n\nArgs:\n    path: where\n\nReturns:\n    rows\n";
        assert!((docstring_quality(full) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_smells() {
        let mut code = String::from("def long_one():\n");
        for i in 0..21 {
            code.push_str(&format!("    value_{i} = {i}\n"));
        }
        code.push_str("def dup():\n    result = compute_something(alpha)\n    result = compute_something(alpha)\n");
        let q = analyze(&code);
        let kinds: Vec<_> = q.smells.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SmellKind::LongFunction, SmellKind::DuplicateCode]);
    }

    #[test]
    fn test_skipped_file() {
        let q = analyze("def broken(:\n");
        assert!(q.skipped);
        assert_eq!(q.documentable, 0);
    }

    #[test]
    fn test_summarize_pools_counts() {
        let a = analyze("\"\"\"Doc.\"\"\"\ndef f(x: int) -> int:\n    \"\"\"Doc.\"\"\"\n    return x\n");
        let b = analyze("# comment\ndef g(): return 1\n");
        let metrics = summarize(&[a, b], 40.0);

        assert_eq!(metrics.total_files, 2);
        assert!((metrics.documentation_coverage - 50.0).abs() < 1e-9);
        assert!((metrics.type_hint_coverage - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(metrics.test_coverage, 40.0);
        assert_eq!(metrics.lint_score, 100.0);
        assert!(metrics.code_to_comment_ratio > 0.0);
        let score = metrics.quality_score();
        assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn test_summarize_empty() {
        let metrics = summarize(&[], 0.0);
        assert_eq!(metrics.total_files, 0);
        assert_eq!(metrics.quality_score(), 0.0);
    }

    #[test]
    fn test_quality_score_weights() {
        let metrics = QualityMetrics {
            type_hint_coverage: 100.0,
            documentation_coverage: 100.0,
            test_coverage: 100.0,
            lint_score: 100.0,
            code_to_comment_ratio: 5.0,
            ..Default::default()
        };
        assert!((metrics.quality_score() - 100.0).abs() < 1e-9);

        let metrics = QualityMetrics {
            type_hint_coverage: 50.0,
            ..Default::default()
        };
        assert!((metrics.quality_score() - 15.0).abs() < 1e-9);
    }
}
