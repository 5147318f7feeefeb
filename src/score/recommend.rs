//! Threshold rules turning aggregated metrics into ranked recommendations.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ProjectMetrics;
use crate::analyzers::Severity;

/// Area a recommendation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Complexity,
    Quality,
    Security,
    Performance,
    Dependencies,
    Patterns,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Complexity => "Complexity",
            Category::Quality => "Quality",
            Category::Security => "Security",
            Category::Performance => "Performance",
            Category::Dependencies => "Dependencies",
            Category::Patterns => "Patterns",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One actionable finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Severity,
    pub category: Category,
    pub description: String,
    pub suggestion: String,
}

impl Recommendation {
    fn new(priority: Severity, category: Category, description: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            priority,
            category,
            description: description.into(),
            suggestion: suggestion.into(),
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}\n  Suggestion: {}",
            self.priority.as_str().to_uppercase(),
            self.category,
            self.description,
            self.suggestion
        )
    }
}

/// Generate recommendations, highest priority first.
///
/// Entries of equal priority keep rule order.
pub fn recommendations(metrics: &ProjectMetrics) -> Vec<Recommendation> {
    let mut found = Vec::new();
    complexity(metrics, &mut found);
    quality(metrics, &mut found);
    dependencies(metrics, &mut found);
    patterns(metrics, &mut found);
    security(metrics, &mut found);
    performance(metrics, &mut found);
    found.sort_by(|a, b| b.priority.cmp(&a.priority));
    found
}

fn complexity(metrics: &ProjectMetrics, out: &mut Vec<Recommendation>) {
    let c = &metrics.complexity;
    if c.avg_function_cyclomatic > 10.0 {
        out.push(Recommendation::new(
            Severity::Medium,
            Category::Complexity,
            "High average cyclomatic complexity detected",
            "Refactor complex functions to reduce decision points",
        ));
    }
    if c.maintainability_index < 50.0 && c.total_files > 0 {
        out.push(Recommendation::new(
            Severity::Medium,
            Category::Complexity,
            "Low maintainability index",
            "Simplify code structure and improve readability",
        ));
    }
    let excessive: Vec<_> = c.complex_functions.iter().filter(|f| f.complexity > 10).collect();
    if let Some(worst) = excessive.first() {
        out.push(Recommendation::new(
            Severity::High,
            Category::Complexity,
            format!("{} functions with excessive complexity", excessive.len()),
            format!("Refactor functions like {} at {}:{}", worst.name, worst.file, worst.line),
        ));
    }
}

fn quality(metrics: &ProjectMetrics, out: &mut Vec<Recommendation>) {
    let q = &metrics.quality;
    if q.total_files == 0 {
        return;
    }
    if q.type_hint_coverage < 50.0 {
        out.push(Recommendation::new(
            Severity::Medium,
            Category::Quality,
            "Low type hint coverage",
            "Add type annotations to improve code reliability and IDE support",
        ));
    }
    if q.documentation_coverage < 50.0 {
        out.push(Recommendation::new(
            Severity::Medium,
            Category::Quality,
            "Insufficient documentation coverage",
            "Add docstrings to functions, classes, and modules",
        ));
    }
    if q.test_coverage < 50.0 {
        out.push(Recommendation::new(
            Severity::High,
            Category::Quality,
            "Insufficient test coverage",
            "Increase unit test coverage to ensure code reliability",
        ));
    }
    if q.lint_score < 75.0 {
        out.push(Recommendation::new(
            Severity::Medium,
            Category::Quality,
            "Low lint score",
            "Address style issues like long functions or bare excepts",
        ));
    }
}

fn dependencies(metrics: &ProjectMetrics, out: &mut Vec<Recommendation>) {
    let d = &metrics.dependency;
    if d.health_score < 75.0 {
        out.push(Recommendation::new(
            Severity::High,
            Category::Dependencies,
            "Low dependency health score",
            "Update or replace outdated/vulnerable dependencies",
        ));
    }
    if let Some(cycle) = d.cycles.first() {
        out.push(Recommendation::new(
            Severity::Medium,
            Category::Dependencies,
            format!("{} import cycles detected", d.cycles.len()),
            format!("Break the cycle {} by moving shared code into its own module", cycle.join(" -> ")),
        ));
    }
}

fn patterns(metrics: &ProjectMetrics, out: &mut Vec<Recommendation>) {
    if metrics.patterns.design_patterns.is_empty() && metrics.total_files > 0 {
        out.push(Recommendation::new(
            Severity::Low,
            Category::Patterns,
            "No design patterns detected",
            "Consider applying appropriate design patterns for better structure",
        ));
    }
}

fn security(metrics: &ProjectMetrics, out: &mut Vec<Recommendation>) {
    let s = &metrics.security;
    let vulnerabilities = &s.signals.vulnerabilities;
    if let Some(first) = vulnerabilities.first() {
        let priority = if s.has_critical() { Severity::Critical } else { Severity::High };
        out.push(Recommendation::new(
            priority,
            Category::Security,
            format!("{} security vulnerabilities detected", vulnerabilities.len()),
            format!("Address {} at {} first: {}", first.description, first.location(), first.recommendation),
        ));
    }
    if !s.signals.exposures.is_empty() {
        out.push(Recommendation::new(
            Severity::High,
            Category::Security,
            format!("{} possible sensitive data exposures", s.signals.exposures.len()),
            "Load credentials from the environment or a secrets manager instead of source code",
        ));
    }
    if s.security_score < 75.0 && s.total_files > 0 {
        out.push(Recommendation::new(
            Severity::Medium,
            Category::Security,
            "Low security score",
            "Review code for insecure practices and apply security patterns",
        ));
    }
}

fn performance(metrics: &ProjectMetrics, out: &mut Vec<Recommendation>) {
    let p = &metrics.performance;
    if let Some(first) = p.hotspots.first() {
        out.push(Recommendation::new(
            Severity::Medium,
            Category::Performance,
            format!("{} performance hotspots identified", p.hotspots.len()),
            format!("Optimize the loop at {}:{}: {}", first.file, first.line, first.suggestion),
        ));
    }
    if p.performance_score < 75.0 && p.total_files > 0 {
        out.push(Recommendation::new(
            Severity::Medium,
            Category::Performance,
            "Low performance score",
            "Review hotspots and optimize loops or I/O operations",
        ));
    }
}
