//! Dependency health: outdated and vulnerable third-party packages.
//!
//! The check itself is an external collaborator behind [`HealthChecker`].
//! [`DependencyHealth`] gates it with a [`HealthCache`] keyed by the
//! manifest's content hash, so an unchanged manifest is never rechecked.
//! Failures degrade to placeholder text and are never propagated.

mod cache;
mod pip;

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DependencyConfig;
use crate::core::Result;

pub use cache::HealthCache;
pub use pip::PipHealthChecker;

/// Text used when the manifest does not exist.
pub const NO_MANIFEST: &str = "No dependency manifest found";

/// Raw reports returned by a checker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    pub outdated: String,
    pub vulnerabilities: String,
}

/// External package-health tool.
pub trait HealthChecker: Send + Sync {
    fn name(&self) -> &'static str;

    /// Inspect the packages declared in `manifest`.
    fn check(&self, manifest: &Path) -> Result<HealthReport>;
}

/// The cached unit: reports plus the hash of the manifest they describe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyHealthRecord {
    pub manifest_hash: String,
    pub outdated: String,
    pub vulnerabilities: String,
}

impl DependencyHealthRecord {
    fn placeholder(manifest_hash: String, reason: &str) -> Self {
        Self {
            manifest_hash,
            outdated: reason.to_string(),
            vulnerabilities: reason.to_string(),
        }
    }

    /// Package names listed in a `pip list --outdated` table.
    pub fn outdated_packages(&self) -> Vec<String> {
        let mut lines = self.outdated.lines().skip_while(|l| !l.trim_start().starts_with("---"));
        lines.next();
        lines
            .filter_map(|l| l.split_whitespace().next())
            .map(str::to_string)
            .collect()
    }

    /// Distinct package names named in a vulnerability report.
    pub fn vulnerable_packages(&self) -> Vec<String> {
        static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
        let patterns = PATTERNS.get_or_init(|| {
            [
                r"(?i)vulnerability found in ([A-Za-z0-9_.\-]+)",
                r"^\|\s*([A-Za-z0-9_.\-]+)\s*\|\s*\d[\w.]*\s*\|",
            ]
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
        });

        let mut found = BTreeSet::new();
        for line in self.vulnerabilities.lines() {
            for re in patterns {
                if let Some(name) = re.captures(line.trim()).and_then(|c| c.get(1)) {
                    found.insert(name.as_str().to_lowercase());
                }
            }
        }
        found.into_iter().collect()
    }
}

/// Content hash of a manifest file.
pub fn manifest_hash(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}

/// Result of a cache-gated health check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(flatten)]
    pub record: DependencyHealthRecord,
    /// Served from the cache without running the checker.
    pub cached: bool,
    /// The checker ran and failed, or there was nothing to check.
    pub degraded: bool,
    pub outdated_packages: Vec<String>,
    pub vulnerable_packages: Vec<String>,
}

impl HealthStatus {
    fn new(record: DependencyHealthRecord, cached: bool, degraded: bool) -> Self {
        Self {
            outdated_packages: if degraded { Vec::new() } else { record.outdated_packages() },
            vulnerable_packages: if degraded { Vec::new() } else { record.vulnerable_packages() },
            record,
            cached,
            degraded,
        }
    }
}

/// Cache-gated dependency health check.
pub struct DependencyHealth {
    checker: Box<dyn HealthChecker>,
    cache: HealthCache,
}

impl DependencyHealth {
    pub fn new(checker: Box<dyn HealthChecker>, cache: HealthCache) -> Self {
        Self { checker, cache }
    }

    /// `pip`/`safety` checker with the cache under the project root.
    pub fn for_project(root: &Path, config: &DependencyConfig) -> Self {
        Self::new(
            Box::new(PipHealthChecker::new(config.health_timeout_secs)),
            HealthCache::new(root.join(&config.cache_path)),
        )
    }

    pub fn cache(&self) -> &HealthCache {
        &self.cache
    }

    /// Check `manifest`, reusing the cached record while its hash matches.
    ///
    /// `refresh` bypasses the cache lookup; the fresh result is still stored.
    pub fn check(&self, manifest: &Path, refresh: bool) -> HealthStatus {
        let content = match fs::read(manifest) {
            Ok(content) => content,
            Err(_) => {
                debug!(manifest = %manifest.display(), "no manifest, skipping health check");
                return HealthStatus::new(DependencyHealthRecord::placeholder(String::new(), NO_MANIFEST), false, true);
            }
        };
        let hash = manifest_hash(&content);

        if !refresh {
            if let Some(record) = self.cache.lookup(&hash) {
                debug!(cache = %self.cache.path().display(), "health cache hit");
                return HealthStatus::new(record, true, false);
            }
        }
        debug!(cache = %self.cache.path().display(), refresh, "health cache miss");

        match self.checker.check(manifest) {
            Ok(report) => {
                let record = DependencyHealthRecord {
                    manifest_hash: hash,
                    outdated: report.outdated,
                    vulnerabilities: report.vulnerabilities,
                };
                if let Err(e) = self.cache.store(&record) {
                    warn!(error = %e, "could not write health cache");
                }
                info!(checker = self.checker.name(), "dependency health checked");
                HealthStatus::new(record, false, false)
            }
            Err(e) => {
                warn!(checker = self.checker.name(), error = %e, "dependency health check failed");
                let reason = format!("Health check unavailable: {e}");
                HealthStatus::new(DependencyHealthRecord::placeholder(hash, &reason), false, true)
            }
        }
    }
}
