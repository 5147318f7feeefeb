//! On-disk cache of the last dependency health check.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::DependencyHealthRecord;
use crate::core::{Error, Result};

/// JSON record stored at a fixed path, keyed by manifest hash.
#[derive(Debug, Clone)]
pub struct HealthCache {
    path: PathBuf,
}

impl HealthCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored record. A missing or unreadable file is a miss.
    pub fn load(&self) -> Option<DependencyHealthRecord> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "ignoring corrupt health cache");
                None
            }
        }
    }

    /// The stored record if it was computed for `manifest_hash`.
    pub fn lookup(&self, manifest_hash: &str) -> Option<DependencyHealthRecord> {
        self.load().filter(|r| r.manifest_hash == manifest_hash)
    }

    /// Persist a record, replacing any previous one.
    pub fn store(&self, record: &DependencyHealthRecord) -> Result<()> {
        let json = serde_json::to_vec_pretty(record)?;
        atomic_write(&self.path, &json)
    }
}

/// Write through a temporary sibling file and rename it over the target so
/// readers never observe a partial record.
fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidArgument(format!("cache path has no file name: {}", path.display())))?;
    let temp_path = parent.join(format!(
        ".{}.{}.tmp",
        file_name.to_string_lossy(),
        std::process::id()
    ));

    let mut file = File::create(&temp_path)?;
    file.write_all(content)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)?;
    Ok(())
}
