//! Per-file code analyzers.
//!
//! Each analyzer implements [`crate::core::Analyzer`] over one
//! [`crate::core::SourceUnit`] and exposes a `summarize` function that folds
//! per-file outputs into project metrics.

pub mod complexity;
pub mod dependency;
pub mod patterns;
pub mod performance;
pub mod quality;
pub mod security;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use complexity::Analyzer as ComplexityAnalyzer;
pub use dependency::Analyzer as DependencyAnalyzer;
pub use patterns::Analyzer as PatternAnalyzer;
pub use performance::Analyzer as PerformanceAnalyzer;
pub use quality::Analyzer as QualityAnalyzer;
pub use security::Analyzer as SecurityAnalyzer;

/// Severity level shared by findings and recommendations.
///
/// Ordered so that `Critical` is the greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Relative weight used when averaging severities.
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Low => 0.3,
            Severity::Medium => 0.6,
            Severity::High | Severity::Critical => 1.0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fraction of `part` in `whole` as a percentage; 0 when `whole` is 0.
pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        let mut severities = vec![Severity::Medium, Severity::Critical, Severity::Low, Severity::High];
        severities.sort_by(|a, b| b.cmp(a));
        assert_eq!(
            severities,
            vec![Severity::Critical, Severity::High, Severity::Medium, Severity::Low]
        );
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"critical\"");
        assert_eq!(Severity::High.to_string(), "high");
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }
}
