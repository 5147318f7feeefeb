//! Aggregator and scorer.
//!
//! Folds per-file features into one [`ProjectMetrics`] value, derives the
//! weighted overall score and letter grade, and ranks recommendations.

mod recommend;

use std::path::PathBuf;

use serde::Serialize;

use crate::analyzers::complexity::{self, ComplexityMetrics};
use crate::analyzers::dependency::{self, DependencyMetrics, Requirement};
use crate::analyzers::patterns::{self, PatternMetrics};
use crate::analyzers::performance::{self, PerformanceMetrics};
use crate::analyzers::quality::{self, QualityMetrics};
use crate::analyzers::security::{self, SecurityMetrics};
use crate::config::{Config, ScoreWeights};
use crate::coordinator::{AnalyzerError, ProjectFeatures};
use crate::core::{Error, Result, Summary};
use crate::health::HealthStatus;

pub use recommend::{recommendations, Category, Recommendation};

/// Component scores feeding the overall score, each in `[0, 100]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreComponents {
    pub maintainability: f64,
    pub quality: f64,
    pub security: f64,
    pub performance: f64,
    pub dependency: f64,
    pub patterns: f64,
}

impl ScoreComponents {
    pub fn from_metrics(
        complexity: &ComplexityMetrics,
        quality: &QualityMetrics,
        security: &SecurityMetrics,
        performance: &PerformanceMetrics,
        dependency: &DependencyMetrics,
        patterns: &PatternMetrics,
    ) -> Self {
        Self {
            maintainability: bounded(complexity.maintainability_index),
            quality: bounded(quality.quality_score()),
            security: bounded(security.security_score),
            performance: bounded(performance.performance_score),
            dependency: bounded(dependency.health_score),
            patterns: bounded(patterns.average_confidence * 100.0),
        }
    }

    /// Weighted mean of the components, 0 when every weight is 0.
    pub fn overall(&self, weights: &ScoreWeights) -> f64 {
        let total = weights.total();
        if total <= 0.0 {
            return 0.0;
        }
        let sum = self.maintainability * weights.complexity
            + self.quality * weights.quality
            + self.security * weights.security
            + self.performance * weights.performance
            + self.dependency * weights.dependency
            + self.patterns * weights.patterns;
        bounded(sum / total)
    }
}

fn bounded(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

/// Letter grade for a score.
pub fn grade(score: f64) -> &'static str {
    if score >= 90.0 {
        "A"
    } else if score >= 80.0 {
        "B"
    } else if score >= 70.0 {
        "C"
    } else if score >= 60.0 {
        "D"
    } else {
        "F"
    }
}

/// Aggregated metrics of one analysis run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectMetrics {
    pub root: PathBuf,
    /// Files analyzed, skipped files excluded.
    pub total_files: usize,
    pub files_skipped: usize,
    pub total_lines: usize,
    pub complexity: ComplexityMetrics,
    pub quality: QualityMetrics,
    pub security: SecurityMetrics,
    pub performance: PerformanceMetrics,
    pub patterns: PatternMetrics,
    pub dependency: DependencyMetrics,
    pub components: ScoreComponents,
    pub overall_score: f64,
    pub grade: String,
}

impl ProjectMetrics {
    /// Recompute the components, overall score and grade.
    pub fn rescore(&mut self, weights: &ScoreWeights) {
        self.components = ScoreComponents::from_metrics(
            &self.complexity,
            &self.quality,
            &self.security,
            &self.performance,
            &self.dependency,
            &self.patterns,
        );
        self.overall_score = self.components.overall(weights);
        self.grade = grade(self.overall_score).to_string();
    }

    /// Findings counted toward the run summary.
    pub fn issue_count(&self) -> usize {
        self.security.signals.vulnerabilities.len()
            + self.security.signals.exposures.len()
            + self.quality.lint_issues.len()
            + self.performance.hotspots.len()
            + self.dependency.unused_imports.len()
            + self.dependency.cycles.len()
    }
}

/// Everything a full analysis produces.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    pub metrics: ProjectMetrics,
    pub recommendations: Vec<Recommendation>,
    /// Analyzer failures recovered during the run.
    pub errors: Vec<AnalyzerError>,
    pub summary: Summary,
    /// Dependency health as consulted, `None` when disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthStatus>,
}

impl ProjectReport {
    /// Aggregate extracted features with the project-level collaborator results.
    pub fn build(
        features: ProjectFeatures,
        test_coverage: f64,
        health: Option<&HealthStatus>,
        requirements: Vec<Requirement>,
        config: &Config,
    ) -> Self {
        let ProjectFeatures {
            root,
            files,
            errors,
            mut summary,
        } = features;

        let total_files = files.iter().filter(|f| !f.skipped).count();
        let files_skipped = files.len() - total_files;
        let total_lines = files.iter().filter(|f| !f.skipped).map(|f| f.line_count).sum();

        let mut complexity_files = Vec::with_capacity(files.len());
        let mut quality_files = Vec::with_capacity(files.len());
        let mut security_files = Vec::with_capacity(files.len());
        let mut performance_files = Vec::with_capacity(files.len());
        let mut pattern_files = Vec::with_capacity(files.len());
        let mut dependency_files = Vec::with_capacity(files.len());
        for file in files {
            complexity_files.push(file.complexity);
            quality_files.push(file.quality);
            security_files.push(file.security);
            performance_files.push(file.performance);
            pattern_files.push(file.patterns);
            dependency_files.push(file.dependency);
        }

        let mut metrics = ProjectMetrics {
            root,
            total_files,
            files_skipped,
            total_lines,
            complexity: complexity::summarize(&complexity_files, &config.complexity),
            quality: quality::summarize(&quality_files, test_coverage),
            security: security::summarize(&security_files),
            performance: performance::summarize(&performance_files),
            patterns: patterns::summarize(&pattern_files),
            dependency: dependency::summarize(&dependency_files, requirements, health, &config.dependency),
            ..Default::default()
        };
        metrics.rescore(&config.score.weights);
        summary.issues_found = metrics.issue_count();

        let recommendations = recommendations(&metrics);
        Self {
            metrics,
            recommendations,
            errors,
            summary,
            health: health.cloned(),
        }
    }

    /// Fail when the overall score is below `fail_under`.
    pub fn check_threshold(&self, fail_under: Option<f64>) -> Result<()> {
        match fail_under {
            Some(minimum) if self.metrics.overall_score < minimum => Err(Error::threshold_violation(
                format!(
                    "overall score {:.1} is below the minimum of {:.1}",
                    self.metrics.overall_score, minimum
                ),
                self.metrics.overall_score,
            )),
            _ => Ok(()),
        }
    }
}
