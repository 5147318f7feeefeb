//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::core::Result;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Exclude patterns (glob).
    #[serde(rename = "exclude")]
    pub exclude_patterns: Vec<String>,
    /// Worker pool size (0 = number of CPUs).
    pub jobs: usize,
    /// Files larger than this many bytes are skipped.
    pub max_file_size: u64,
    /// Complexity thresholds.
    pub complexity: ComplexityConfig,
    /// Quality thresholds and coverage collaborator settings.
    pub quality: QualityConfig,
    /// Performance thresholds.
    pub performance: PerformanceConfig,
    /// Dependency analysis and health-check settings.
    pub dependency: DependencyConfig,
    /// Score weights and gates.
    pub score: ScoreConfig,
    /// Output configuration.
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude_patterns: Vec::new(),
            jobs: 0,
            max_file_size: 1_000_000,
            complexity: ComplexityConfig::default(),
            quality: QualityConfig::default(),
            performance: PerformanceConfig::default(),
            dependency: DependencyConfig::default(),
            score: ScoreConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file path.
    ///
    /// Errors if the file does not exist. Use this for explicit `--config` flags.
    /// Env vars with `PYMETRICS_` prefix override file values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(crate::core::Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file_exact(path))
            .merge(Env::prefixed("PYMETRICS_").split("__"))
            .extract()
            .map_err(|e| crate::core::Error::Config(e.to_string()))
    }

    /// Load configuration from directory, looking for pymetrics.toml or .pymetrics/pymetrics.toml.
    ///
    /// Missing files are silently skipped (defaults are used).
    /// Env vars with `PYMETRICS_` prefix override file/default values.
    pub fn load_default(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(dir.join("pymetrics.toml")))
            .merge(Toml::file(dir.join(".pymetrics/pymetrics.toml")))
            .merge(Env::prefixed("PYMETRICS_").split("__"))
            .extract()
            .map_err(|e| crate::core::Error::Config(e.to_string()))
    }

    /// Create default config file content.
    pub fn default_toml() -> &'static str {
        include_str!("default_config.toml")
    }

    /// Worker count to use, resolving 0 to the number of CPUs.
    pub fn effective_jobs(&self) -> usize {
        if self.jobs > 0 {
            self.jobs
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

/// Complexity analyzer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityConfig {
    /// Functions above this cyclomatic complexity are reported as complex.
    pub complex_cyclomatic: u32,
    /// Functions longer than this many lines are reported as complex.
    pub complex_lines: u32,
    /// Maintainability points lost per unit of average complexity.
    pub maintainability_penalty: f64,
}

impl Default for ComplexityConfig {
    fn default() -> Self {
        Self {
            complex_cyclomatic: 5,
            complex_lines: 20,
            maintainability_penalty: 5.0,
        }
    }
}

/// Quality analyzer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Lint violation when a function body has more statements than this.
    pub max_function_statements: usize,
    /// Lint violation when a function takes more parameters than this.
    pub max_parameters: usize,
    /// Lint points lost per violation.
    pub lint_penalty: f64,
    /// Code smell when a function body has more statements than this.
    pub long_function_statements: usize,
    /// Code smell when a class body has more statements than this.
    pub large_class_statements: usize,
    /// Run the test suite under coverage.py to measure coverage.
    pub run_coverage: bool,
    /// Give up on the coverage run after this many seconds.
    pub coverage_timeout_secs: u64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            max_function_statements: 50,
            max_parameters: 5,
            lint_penalty: 5.0,
            long_function_statements: 20,
            large_class_statements: 30,
            run_coverage: true,
            coverage_timeout_secs: 300,
        }
    }
}

/// Performance analyzer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Loops with structural complexity above this are hotspots.
    pub hotspot_threshold: usize,
    /// Loop bodies with more statements than this should be split.
    pub max_loop_statements: usize,
    /// A callee called more often than this in one scope may need caching.
    pub repeated_call_threshold: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            hotspot_threshold: 5,
            max_loop_statements: 10,
            repeated_call_threshold: 2,
        }
    }
}

/// Dependency analyzer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyConfig {
    /// Manifest file, relative to the project root.
    pub manifest: PathBuf,
    /// Health-check cache file, relative to the project root.
    pub cache_path: PathBuf,
    /// Health points lost per unused import.
    pub unused_penalty: f64,
    /// Health points lost per import cycle.
    pub cycle_penalty: f64,
    /// Health points lost per vulnerable package.
    pub vulnerability_penalty: f64,
    /// Run the external package health check.
    pub health_check: bool,
    /// Give up on each external tool after this many seconds.
    pub health_timeout_secs: u64,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("requirements.txt"),
            cache_path: PathBuf::from(".pymetrics/health_cache.json"),
            unused_penalty: 2.0,
            cycle_penalty: 5.0,
            vulnerability_penalty: 10.0,
            health_check: true,
            health_timeout_secs: 120,
        }
    }
}

/// Score configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Minimum overall score to pass.
    pub fail_under: Option<f64>,
    /// Component weights.
    pub weights: ScoreWeights,
}

/// Weights for combining component scores into the overall score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub complexity: f64,
    pub quality: f64,
    pub security: f64,
    pub performance: f64,
    pub dependency: f64,
    pub patterns: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            complexity: 0.2,
            quality: 0.3,
            security: 0.3,
            performance: 0.2,
            dependency: 0.1,
            patterns: 0.05,
        }
    }
}

impl ScoreWeights {
    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.complexity
            + self.quality
            + self.security
            + self.performance
            + self.dependency
            + self.patterns
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format.
    pub format: OutputFormat,
    /// Color output.
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Markdown,
            color: true,
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// JSON format.
    Json,
    /// Markdown format.
    #[default]
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = crate::core::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(crate::core::Error::InvalidArgument(format!(
                "unknown output format '{other}'"
            ))),
        }
    }
}
