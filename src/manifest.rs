//! On-disk `file -> (mtime, size)` map, diffed against the live tree to
//! drive incremental sync (spec §4.3).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to write manifest to '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

pub type ManifestResult<T> = Result<T, ManifestError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    pub mtime: u64,
    pub size: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    version: u32,
    files: HashMap<String, FileStat>,
}

/// Result of diffing the manifest against the files currently on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDiff {
    /// Present in both, but `(mtime, size)` differs.
    pub stale: Vec<String>,
    /// In the manifest but no longer on disk.
    pub deleted: Vec<String>,
    /// On disk but not yet in the manifest.
    pub added: Vec<String>,
}

impl ManifestDiff {
    pub fn is_empty(&self) -> bool {
        self.stale.is_empty() && self.deleted.is_empty() && self.added.is_empty()
    }
}

impl Manifest {
    pub fn new() -> Self {
        Self {
            version: MANIFEST_VERSION,
            files: HashMap::new(),
        }
    }

    /// Load `manifest.json` from `path`. A missing file, a version
    /// mismatch, or a parse failure all fall back to an empty manifest —
    /// the next sync then treats every file as `added`.
    pub fn load(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::new();
        };
        match serde_json::from_str::<Manifest>(&content) {
            Ok(m) if m.version == MANIFEST_VERSION => m,
            Ok(_) => {
                tracing::warn!("manifest version mismatch at {}, starting fresh", path.display());
                Self::new()
            }
            Err(e) => {
                tracing::warn!("failed to parse manifest at {}: {e}, starting fresh", path.display());
                Self::new()
            }
        }
    }

    /// Write-temp-then-rename for atomicity.
    pub fn save(&self, path: &Path) -> ManifestResult<()> {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let json = serde_json::to_string_pretty(self).unwrap_or_default();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| ManifestError::Write {
            path: tmp.display().to_string(),
            source: e,
        })?;
        fs::rename(&tmp, path).map_err(|e| ManifestError::Write {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(())
    }

    pub fn get(&self, relative_path: &str) -> Option<FileStat> {
        self.files.get(relative_path).copied()
    }

    pub fn set(&mut self, relative_path: impl Into<String>, stat: FileStat) {
        self.files.insert(relative_path.into(), stat);
    }

    pub fn remove(&mut self, relative_path: &str) {
        self.files.remove(relative_path);
    }

    /// Diff against the current set of files on disk (relative path ->
    /// stat), classifying each as stale/deleted/added.
    pub fn diff(&self, current: &HashMap<String, FileStat>) -> ManifestDiff {
        let mut diff = ManifestDiff::default();
        for (path, stat) in current {
            match self.files.get(path) {
                Some(existing) if existing == stat => {}
                Some(_) => diff.stale.push(path.clone()),
                None => diff.added.push(path.clone()),
            }
        }
        for path in self.files.keys() {
            if !current.contains_key(path) {
                diff.deleted.push(path.clone());
            }
        }
        diff.stale.sort();
        diff.deleted.sort();
        diff.added.sort();
        diff
    }
}
