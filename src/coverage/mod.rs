//! Test coverage collaborator.
//!
//! Coverage is measured once per project by running the test suite under
//! `coverage.py`. Projects without a discoverable suite, or runs that fail,
//! report 0.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::core::process::run_with_timeout;
use crate::core::{is_python_source, Error, Result};

/// Measures test coverage of a whole project.
pub trait CoverageProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Line coverage percentage in `[0, 100]`.
    fn measure(&self, root: &Path) -> Result<f64>;
}

/// Run a provider, degrading any failure to 0.
pub fn measure_or_zero(provider: &dyn CoverageProvider, root: &Path) -> f64 {
    match provider.measure(root) {
        Ok(percent) => {
            info!(provider = provider.name(), percent, "test coverage measured");
            percent.clamp(0.0, 100.0)
        }
        Err(e) => {
            warn!(provider = provider.name(), error = %e, "coverage run failed, reporting 0");
            0.0
        }
    }
}

/// Whether `root` looks like it has a pytest-discoverable suite.
pub fn has_test_suite(root: &Path) -> bool {
    if ["pytest.ini", "conftest.py", "tox.ini"].iter().any(|f| root.join(f).is_file()) {
        return true;
    }
    if root.join("tests").is_dir() || root.join("test").is_dir() {
        return true;
    }
    fs::read_dir(root)
        .map(|entries| {
            entries.filter_map(|e| e.ok()).any(|entry| {
                let path = entry.path();
                let name = entry.file_name().to_string_lossy().to_string();
                is_python_source(&path) && (name.starts_with("test_") || name.ends_with("_test.py"))
            })
        })
        .unwrap_or(false)
}

/// `coverage run -m pytest` followed by `coverage json`.
#[derive(Debug, Clone)]
pub struct CoveragePyProvider {
    timeout: Duration,
}

impl CoveragePyProvider {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl CoverageProvider for CoveragePyProvider {
    fn name(&self) -> &'static str {
        "coverage.py"
    }

    fn measure(&self, root: &Path) -> Result<f64> {
        if !has_test_suite(root) {
            debug!(root = %root.display(), "no test suite found");
            return Ok(0.0);
        }

        let mut run = Command::new("coverage");
        run.args(["run", "-m", "pytest", "-q"]).current_dir(root);
        let output = run_with_timeout("coverage run", &mut run, self.timeout)?;
        if !output.success {
            // Failing tests still produce data worth reporting.
            debug!(stderr = %output.stderr, "test run exited with failure");
        }

        let report_path = root.join(".pymetrics").join("coverage.json");
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut json = Command::new("coverage");
        json.arg("json").arg("-o").arg(&report_path).current_dir(root);
        let output = run_with_timeout("coverage json", &mut json, self.timeout)?;
        if !output.success {
            return Err(Error::collaborator("coverage json", output.stderr.trim().to_string()));
        }

        let content = fs::read_to_string(&report_path)?;
        let _ = fs::remove_file(&report_path);
        parse_total(&content)
    }
}

#[derive(Deserialize)]
struct CoverageReport {
    totals: CoverageTotals,
}

#[derive(Deserialize)]
struct CoverageTotals {
    percent_covered: f64,
}

/// Extract `totals.percent_covered` from a coverage.py JSON report.
pub fn parse_total(content: &str) -> Result<f64> {
    let report: CoverageReport = serde_json::from_str(content)
        .map_err(|e| Error::collaborator("coverage.py", format!("unreadable JSON report: {e}")))?;
    Ok(report.totals.percent_covered.clamp(0.0, 100.0))
}
