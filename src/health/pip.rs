//! `pip list --outdated` plus `safety check` as the package-health tool.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use tracing::{debug, warn};

use super::{HealthChecker, HealthReport};
use crate::core::process::run_with_timeout;
use crate::core::{Error, Result};

/// Runs `pip` and `safety`, each bounded by a timeout.
#[derive(Debug, Clone)]
pub struct PipHealthChecker {
    timeout: Duration,
}

impl PipHealthChecker {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn outdated(&self) -> Result<String> {
        let mut cmd = Command::new("pip");
        cmd.args(["list", "--outdated"]);
        let output = run_with_timeout("pip", &mut cmd, self.timeout)?;
        if !output.success {
            debug!(stderr = %output.stderr, "pip list exited with failure");
        }
        Ok(output.stdout)
    }

    fn vulnerabilities(&self, manifest: &Path) -> Result<String> {
        let mut cmd = Command::new("safety");
        cmd.args(["check", "-r"]).arg(manifest);
        // safety exits non-zero when it finds vulnerabilities, so the exit
        // status alone says nothing about whether the run worked.
        let output = run_with_timeout("safety", &mut cmd, self.timeout)?;
        if output.stdout.trim().is_empty() && !output.success {
            return Err(Error::collaborator("safety", output.stderr.trim().to_string()));
        }
        Ok(output.stdout)
    }
}

impl HealthChecker for PipHealthChecker {
    fn name(&self) -> &'static str {
        "pip"
    }

    fn check(&self, manifest: &Path) -> Result<HealthReport> {
        let outdated = self.outdated();
        let vulnerabilities = self.vulnerabilities(manifest);

        match (outdated, vulnerabilities) {
            (Err(e), Err(_)) => Err(e),
            (outdated, vulnerabilities) => Ok(HealthReport {
                outdated: outdated.unwrap_or_else(|e| {
                    warn!(error = %e, "outdated package check failed");
                    format!("Outdated check unavailable: {e}")
                }),
                vulnerabilities: vulnerabilities.unwrap_or_else(|e| {
                    warn!(error = %e, "vulnerability check failed");
                    format!("Vulnerability check unavailable: {e}")
                }),
            }),
        }
    }
}
