//! Feature-extraction coordinator.
//!
//! Runs every analyzer over one [`SourceUnit`] in parallel on a bounded
//! rayon pool. An analyzer that returns an error or panics is recorded in
//! [`FileFeatures::errors`] and its default metrics take its place, so the
//! result always carries all six sections. Substituted sections are marked
//! skipped and stay out of project averages.

mod pipeline;

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analyzers::complexity::FileComplexity;
use crate::analyzers::dependency::FileDependencies;
use crate::analyzers::patterns::FilePatterns;
use crate::analyzers::performance::FilePerformance;
use crate::analyzers::quality::FileQuality;
use crate::analyzers::security::FileSecurity;
use crate::analyzers::{
    ComplexityAnalyzer, DependencyAnalyzer, PatternAnalyzer, PerformanceAnalyzer, QualityAnalyzer,
    SecurityAnalyzer,
};
use crate::core::{AnalysisContext, Analyzer, Error, Result, SourceUnit};

pub use pipeline::{Pipeline, ProjectFeatures};

/// One analyzer's per-file output.
#[derive(Debug, Clone)]
pub enum Feature {
    Complexity(FileComplexity),
    Quality(FileQuality),
    Security(FileSecurity),
    Performance(FilePerformance),
    Patterns(FilePatterns),
    Dependency(FileDependencies),
}

macro_rules! feature_from {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Feature {
                fn from(output: $ty) -> Self {
                    Feature::$variant(output)
                }
            }
        )*
    };
}

feature_from! {
    Complexity => FileComplexity,
    Quality => FileQuality,
    Security => FileSecurity,
    Performance => FilePerformance,
    Patterns => FilePatterns,
    Dependency => FileDependencies,
}

/// Object-safe view of an [`Analyzer`] the coordinator can hold in a list.
pub trait FeatureExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, unit: &SourceUnit, ctx: &AnalysisContext<'_>) -> Result<Feature>;

    /// Zero-valued metrics, marked skipped, used when extraction fails.
    fn fallback(&self, unit: &SourceUnit) -> Feature;
}

impl<A> FeatureExtractor for A
where
    A: Analyzer,
    A::Output: Into<Feature>,
{
    fn name(&self) -> &'static str {
        Analyzer::name(self)
    }

    fn extract(&self, unit: &SourceUnit, ctx: &AnalysisContext<'_>) -> Result<Feature> {
        self.analyze(unit, ctx).map(Into::into)
    }

    fn fallback(&self, unit: &SourceUnit) -> Feature {
        let mut feature: Feature = A::Output::default().into();
        feature.mark_unavailable(unit.display_path());
        feature
    }
}

impl Feature {
    fn mark_unavailable(&mut self, path: String) {
        macro_rules! mark {
            ($f:expr) => {{
                $f.path = path;
                $f.skipped = true;
            }};
        }
        match self {
            Feature::Complexity(f) => mark!(f),
            Feature::Quality(f) => mark!(f),
            Feature::Security(f) => mark!(f),
            Feature::Performance(f) => mark!(f),
            Feature::Patterns(f) => mark!(f),
            Feature::Dependency(f) => mark!(f),
        }
    }
}

/// An analyzer failure recorded instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerError {
    pub analyzer: String,
    pub file: String,
    pub error: String,
}

/// Every analyzer's output for one file.
#[derive(Debug, Clone, Default)]
pub struct FileFeatures {
    pub path: String,
    pub skipped: bool,
    pub line_count: usize,
    pub complexity: FileComplexity,
    pub quality: FileQuality,
    pub security: FileSecurity,
    pub performance: FilePerformance,
    pub patterns: FilePatterns,
    pub dependency: FileDependencies,
    pub errors: Vec<AnalyzerError>,
}

impl FileFeatures {
    fn store(&mut self, feature: Feature) {
        match feature {
            Feature::Complexity(f) => self.complexity = f,
            Feature::Quality(f) => self.quality = f,
            Feature::Security(f) => self.security = f,
            Feature::Performance(f) => self.performance = f,
            Feature::Patterns(f) => self.patterns = f,
            Feature::Dependency(f) => self.dependency = f,
        }
    }
}

/// Runs a fixed set of extractors over each unit.
pub struct Coordinator {
    extractors: Vec<Box<dyn FeatureExtractor>>,
    pool: rayon::ThreadPool,
}

impl Coordinator {
    /// All six analyzers on a pool of `jobs` threads (0 = one per CPU).
    pub fn new(jobs: usize) -> Result<Self> {
        let extractors: Vec<Box<dyn FeatureExtractor>> = vec![
            Box::new(ComplexityAnalyzer::new()),
            Box::new(QualityAnalyzer::new()),
            Box::new(SecurityAnalyzer::new()),
            Box::new(PerformanceAnalyzer::new()),
            Box::new(PatternAnalyzer::new()),
            Box::new(DependencyAnalyzer::new()),
        ];
        Self::with_extractors(jobs, extractors)
    }

    pub fn with_extractors(jobs: usize, extractors: Vec<Box<dyn FeatureExtractor>>) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .map_err(|e| Error::analysis(format!("could not start worker pool: {e}")))?;
        Ok(Self { extractors, pool })
    }

    /// Replace the extractor with the same name, or add it.
    pub fn with_extractor(mut self, extractor: Box<dyn FeatureExtractor>) -> Self {
        match self.extractors.iter().position(|e| e.name() == extractor.name()) {
            Some(idx) => self.extractors[idx] = extractor,
            None => self.extractors.push(extractor),
        }
        self
    }

    /// Keep only the named extractors.
    pub fn only(mut self, names: &[&str]) -> Self {
        self.extractors.retain(|e| names.contains(&e.name()));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    /// Run a closure on the coordinator's pool.
    pub fn install<R: Send>(&self, f: impl FnOnce() -> R + Send) -> R {
        self.pool.install(f)
    }

    /// Run every extractor over one unit and merge the results.
    ///
    /// Results are merged in extractor order, independent of completion order.
    pub fn extract(&self, unit: &SourceUnit, ctx: &AnalysisContext<'_>) -> FileFeatures {
        let outcomes: Vec<(&dyn FeatureExtractor, Result<Feature>)> = self.pool.install(|| {
            self.extractors
                .par_iter()
                .map(|extractor| (&**extractor, run_isolated(&**extractor, unit, ctx)))
                .collect()
        });

        let mut features = FileFeatures {
            path: unit.display_path(),
            skipped: unit.skipped,
            line_count: unit.line_count,
            ..Default::default()
        };
        for extractor in &self.extractors {
            features.store(extractor.fallback(unit));
        }
        for (extractor, outcome) in outcomes {
            match outcome {
                Ok(feature) => features.store(feature),
                Err(e) => {
                    warn!(analyzer = extractor.name(), file = %features.path, error = %e, "analyzer failed");
                    features.errors.push(AnalyzerError {
                        analyzer: extractor.name().to_string(),
                        file: features.path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        features
    }
}

fn run_isolated(extractor: &dyn FeatureExtractor, unit: &SourceUnit, ctx: &AnalysisContext<'_>) -> Result<Feature> {
    catch_unwind(AssertUnwindSafe(|| extractor.extract(unit, ctx)))
        .unwrap_or_else(|payload| Err(Error::analysis(format!("panicked: {}", panic_message(&*payload)))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
