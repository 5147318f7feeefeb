//! Analyzer trait and common types.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use super::{Result, SourceUnit};
use crate::config::Config;

/// Trait implemented by all per-file analyzers.
///
/// An analyzer is a pure function over one parsed unit. It owns no state
/// shared with other analyzers, so several can run over the same unit at once.
pub trait Analyzer: Send + Sync {
    /// The per-file result produced by this analyzer.
    ///
    /// `Default` is the zero-valued metrics substituted for skipped files and
    /// for failed runs.
    type Output: Serialize + Default + Send;

    /// Unique identifier for this analyzer.
    fn name(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;

    /// Analyze one source unit.
    fn analyze(&self, unit: &SourceUnit, ctx: &AnalysisContext<'_>) -> Result<Self::Output>;
}

/// Context shared by all analyzers during analysis.
pub struct AnalysisContext<'a> {
    /// Root directory being analyzed.
    pub root: &'a Path,
    /// Configuration.
    pub config: &'a Config,
    /// Progress callback.
    pub on_progress: Option<Box<dyn Fn(usize, usize) + Send + Sync + 'a>>,
}

impl<'a> AnalysisContext<'a> {
    /// Create a new analysis context.
    pub fn new(root: &'a Path, config: &'a Config) -> Self {
        Self {
            root,
            config,
            on_progress: None,
        }
    }

    /// Add progress callback.
    pub fn with_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'a,
    {
        self.on_progress = Some(Box::new(f));
        self
    }

    /// Report progress if callback is set.
    pub fn report_progress(&self, current: usize, total: usize) {
        if let Some(ref f) = self.on_progress {
            f(current, total);
        }
    }
}

/// Quick summary statistics for a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    /// Number of files analyzed.
    pub files_analyzed: usize,
    /// Number of files skipped (unreadable or unparsable).
    pub files_skipped: usize,
    /// Number of issues found.
    pub issues_found: usize,
    /// Analysis duration.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl Summary {
    /// Create a new summary.
    pub fn new(files_analyzed: usize, files_skipped: usize, issues_found: usize, duration: Duration) -> Self {
        Self {
            files_analyzed,
            files_skipped,
            issues_found,
            duration,
        }
    }
}

mod duration_serde {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}
