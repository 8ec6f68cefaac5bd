//! Startup reconciliation: diffs the on-disk tree against the manifest and
//! drives `IndexPipeline` over whatever changed (spec §4.11).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::indexing::pipeline::IndexPipeline;
use crate::indexing::walker::FileWalker;
use crate::id_space::normalize_path;
use crate::manifest::{FileStat, Manifest};
use crate::Settings;

/// One file's `indexFile` failure, surfaced but never fatal to the sync
/// run as a whole (spec §7 kind 3).
#[derive(Debug, Clone)]
pub struct SyncFileError {
    pub file: String,
    pub message: String,
}

/// `{staleCount, deletedCount, addedCount, durationMs, errors?}` (spec §4.11).
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub stale_count: usize,
    pub deleted_count: usize,
    pub added_count: usize,
    pub duration_ms: u128,
    pub errors: Vec<SyncFileError>,
}

pub struct SyncEngine {
    settings: Arc<Settings>,
    pipeline: IndexPipeline,
    project_root: PathBuf,
    manifest_path: PathBuf,
}

impl SyncEngine {
    pub fn new(
        settings: Arc<Settings>,
        pipeline: IndexPipeline,
        project_root: PathBuf,
        manifest_path: PathBuf,
    ) -> Self {
        Self {
            settings,
            pipeline,
            project_root,
            manifest_path,
        }
    }

    /// Walk every configured package root (or the project root, if no
    /// packages are configured — a single-package workspace), diff against
    /// the manifest, and apply the result through `IndexPipeline`.
    pub fn run(&self) -> SyncReport {
        let started = std::time::Instant::now();
        let mut manifest = Manifest::load(&self.manifest_path);

        let roots: Vec<(PathBuf, Option<String>)> = if self.settings.packages.is_empty() {
            vec![(self.project_root.clone(), None)]
        } else {
            self.settings
                .packages
                .iter()
                .map(|p| {
                    let root = self
                        .project_root
                        .join(&p.tsconfig)
                        .parent()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.project_root.clone());
                    (root, Some(p.name.clone()))
                })
                .collect()
        };

        let walker = FileWalker::new(self.settings.clone());
        let mut current: HashMap<String, FileStat> = HashMap::new();
        let mut package_of: HashMap<String, Option<String>> = HashMap::new();

        for (root, package) in &roots {
            if !root.is_dir() {
                continue;
            }
            for abs_path in walker.walk(root) {
                let Ok(meta) = std::fs::metadata(&abs_path) else { continue };
                let Ok(relative) = abs_path.strip_prefix(&self.project_root) else { continue };
                let rel_str = normalize_path(relative);
                let stat = FileStat {
                    mtime: meta
                        .modified()
                        .ok()
                        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                        .map(|d| d.as_millis() as u64)
                        .unwrap_or(0),
                    size: meta.len(),
                };
                current.insert(rel_str.clone(), stat);
                package_of.insert(rel_str, package.clone());
            }
        }

        let diff = manifest.diff(&current);
        let mut report = SyncReport {
            deleted_count: diff.deleted.len(),
            stale_count: diff.stale.len(),
            added_count: diff.added.len(),
            ..Default::default()
        };

        for path in &diff.deleted {
            if let Err(e) = self.pipeline.remove_file(path) {
                report.errors.push(SyncFileError {
                    file: path.clone(),
                    message: e.to_string(),
                });
            }
            manifest.remove(path);
        }

        for path in diff.stale.iter().chain(diff.added.iter()) {
            let abs_path = self.project_root.join(path);
            let package = package_of.get(path).cloned().flatten();
            match self.pipeline.index_file(&abs_path, &self.project_root, package.as_deref()) {
                Ok(_) => {
                    if let Some(stat) = current.get(path) {
                        manifest.set(path.clone(), *stat);
                    }
                }
                Err(e) => report.errors.push(SyncFileError {
                    file: path.clone(),
                    message: e.to_string(),
                }),
            }
        }

        if let Err(e) = manifest.save(&self.manifest_path) {
            report.errors.push(SyncFileError {
                file: self.manifest_path.display().to_string(),
                message: e.to_string(),
            });
        }

        report.duration_ms = started.elapsed().as_millis();
        tracing::info!(
            stale_count = report.stale_count,
            deleted_count = report.deleted_count,
            added_count = report.added_count,
            duration_ms = report.duration_ms,
            "sync complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id_space::IdSpace;
    use crate::search::SearchBackend;
    use crate::storage::Store;
    use crate::vector::{EmbeddingCache, StubEmbedder};

    fn pipeline() -> IndexPipeline {
        IndexPipeline::new(
            Arc::new(Settings::default()),
            Arc::new(Store::open_in_memory().unwrap()),
            Arc::new(SearchBackend::open_in_ram().unwrap()),
            Arc::new(StubEmbedder { dimensions: 8 }),
            Arc::new(EmbeddingCache::open_in_memory().unwrap()),
            IdSpace::new(),
        )
    }

    #[test]
    fn sync_indexes_added_files_and_records_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ts"), "export function main() {}").unwrap();

        let settings = Arc::new(Settings::default());
        let manifest_path = dir.path().join("manifest.json");
        let engine = SyncEngine::new(settings, pipeline(), dir.path().to_path_buf(), manifest_path.clone());

        let report = engine.run();
        assert_eq!(report.added_count, 1);
        assert_eq!(report.deleted_count, 0);
        assert!(report.errors.is_empty());
        assert!(manifest_path.exists());
    }

    #[test]
    fn sync_second_run_finds_nothing_stale() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ts"), "export function main() {}").unwrap();

        let settings = Arc::new(Settings::default());
        let manifest_path = dir.path().join("manifest.json");
        let engine = SyncEngine::new(settings, pipeline(), dir.path().to_path_buf(), manifest_path);

        engine.run();
        let second = engine.run();
        assert_eq!(second.added_count, 0);
        assert_eq!(second.stale_count, 0);
    }
}
