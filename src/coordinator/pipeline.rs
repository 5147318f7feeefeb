//! Project pipeline: discover files, load them in parallel, run the
//! coordinator per file, then consult the project-level collaborators.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use super::{AnalyzerError, Coordinator, FileFeatures};
use crate::analyzers::dependency::read_requirements;
use crate::config::Config;
use crate::core::progress::ProgressTracker;
use crate::core::{AnalysisContext, FileSet, Result, SourceUnit, Summary};
use crate::coverage::{measure_or_zero, CoverageProvider, CoveragePyProvider};
use crate::health::{DependencyHealth, HealthStatus};
use crate::parser::Parser;
use crate::score::ProjectReport;

/// Per-file features of a whole project.
#[derive(Debug, Clone, Default)]
pub struct ProjectFeatures {
    pub root: PathBuf,
    /// Sorted by path.
    pub files: Vec<FileFeatures>,
    /// Analyzer failures across all files.
    pub errors: Vec<AnalyzerError>,
    pub summary: Summary,
}

/// Analysis of one project directory with injected collaborators.
pub struct Pipeline {
    root: PathBuf,
    config: Config,
    coordinator: Coordinator,
    coverage: Option<Box<dyn CoverageProvider>>,
    health: Option<DependencyHealth>,
    refresh_health: bool,
    show_progress: bool,
}

impl Pipeline {
    /// Pipeline with the default collaborators enabled by `config`.
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Result<Self> {
        let root = root.into();
        let coordinator = Coordinator::new(config.effective_jobs())?;
        let coverage: Option<Box<dyn CoverageProvider>> = if config.quality.run_coverage {
            Some(Box::new(CoveragePyProvider::new(config.quality.coverage_timeout_secs)))
        } else {
            None
        };
        let health = config
            .dependency
            .health_check
            .then(|| DependencyHealth::for_project(&root, &config.dependency));

        Ok(Self {
            root,
            config,
            coordinator,
            coverage,
            health,
            refresh_health: false,
            show_progress: false,
        })
    }

    pub fn with_coordinator(mut self, coordinator: Coordinator) -> Self {
        self.coordinator = coordinator;
        self
    }

    pub fn with_coverage(mut self, coverage: Option<Box<dyn CoverageProvider>>) -> Self {
        self.coverage = coverage;
        self
    }

    pub fn with_health(mut self, health: Option<DependencyHealth>) -> Self {
        self.health = health;
        self
    }

    /// Ignore the health cache and always run the checker.
    pub fn refresh_health(mut self, refresh: bool) -> Self {
        self.refresh_health = refresh;
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the coordinator over every Python file under the root.
    pub fn extract(&self) -> Result<ProjectFeatures> {
        let start = Instant::now();
        let files = FileSet::from_path(&self.root, &self.config)?;
        let total = files.len();

        let tracker = if self.show_progress {
            ProgressTracker::for_terminal("Analyzing files")
        } else {
            ProgressTracker::hidden()
        };
        let ctx = AnalysisContext::new(files.root(), &self.config).with_progress(|current, total| {
            tracker.update(current, total);
        });

        let done = AtomicUsize::new(0);
        let max_size = self.config.max_file_size;
        let coordinator = &self.coordinator;
        let mut features: Vec<FileFeatures> = coordinator.install(|| {
            files
                .files()
                .par_iter()
                .map_init(Parser::new, |parser, path| {
                    let mut unit = SourceUnit::load(path, parser, max_size);
                    unit.path = files.relative_path(path);
                    if let Some(reason) = &unit.skip_reason {
                        warn!(file = %unit.path.display(), reason = %reason, "skipping file");
                    }
                    let result = coordinator.extract(&unit, &ctx);
                    ctx.report_progress(done.fetch_add(1, Ordering::Relaxed) + 1, total);
                    result
                })
                .collect()
        });
        tracker.finish_and_clear();

        features.sort_by(|a, b| a.path.cmp(&b.path));
        let errors: Vec<AnalyzerError> = features.iter().flat_map(|f| f.errors.iter().cloned()).collect();
        let skipped = features.iter().filter(|f| f.skipped).count();
        let summary = Summary::new(total - skipped, skipped, errors.len(), start.elapsed());
        info!(
            files = summary.files_analyzed,
            skipped = summary.files_skipped,
            elapsed_ms = summary.duration.as_millis() as u64,
            "feature extraction complete"
        );

        Ok(ProjectFeatures {
            root: files.root().to_path_buf(),
            files: features,
            errors,
            summary,
        })
    }

    /// Project test coverage, 0 when disabled or unavailable.
    pub fn coverage(&self, root: &Path) -> f64 {
        self.coverage
            .as_deref()
            .map(|provider| measure_or_zero(provider, root))
            .unwrap_or(0.0)
    }

    /// Cache-gated dependency health, `None` when disabled.
    pub fn health(&self, root: &Path) -> Option<HealthStatus> {
        let manifest = root.join(&self.config.dependency.manifest);
        self.health
            .as_ref()
            .map(|health| health.check(&manifest, self.refresh_health))
    }

    /// Full analysis: features, collaborators, aggregation and recommendations.
    pub fn run(&self) -> Result<ProjectReport> {
        let features = self.extract()?;
        let coverage = self.coverage(&features.root);
        let health = self.health(&features.root);
        let requirements = read_requirements(&features.root.join(&self.config.dependency.manifest));
        Ok(ProjectReport::build(features, coverage, health.as_ref(), requirements, &self.config))
    }
}
