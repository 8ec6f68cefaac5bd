//! The Watcher: keeps the graph in sync with the live file tree after
//! startup reconciliation has run (spec §4.12).
//!
//! Two mutually exclusive modes:
//! - `event+debounce` — OS events via `notify`, coalesced per path by
//!   [`Debouncer`] before reindexing.
//! - `polling` — re-runs [`SyncEngine`] on a fixed interval; it already
//!   diffs the tree against the manifest, so a tick with nothing changed
//!   is just a cheap no-op report.

mod debouncer;
mod error;

pub use debouncer::Debouncer;
pub use error::WatchError;

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use globset::{Glob, GlobSet, GlobSetBuilder};
use notify::{RecursiveMode, Watcher as NotifyWatcher};

use crate::id_space::normalize_path;
use crate::indexing::pipeline::IndexPipeline;
use crate::indexing::sync::SyncEngine;
use crate::parsing::Language;
use crate::Settings;

pub type WatchResult<T> = Result<T, WatchError>;

/// One coalesced batch of reindex work, handed to the caller's callback.
#[derive(Debug, Clone, Default)]
pub struct ReindexReport {
    pub files: Vec<String>,
    pub errors: Vec<(String, String)>,
}

pub struct Watcher {
    settings: Arc<Settings>,
    pipeline: IndexPipeline,
    project_root: PathBuf,
    exclude: GlobSet,
}

impl Watcher {
    pub fn new(settings: Arc<Settings>, pipeline: IndexPipeline, project_root: PathBuf) -> WatchResult<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in settings
            .watch
            .exclude_directories
            .iter()
            .chain(settings.watch.exclude_files.iter())
        {
            let glob = Glob::new(pattern).map_err(|e| WatchError::ConfigError {
                reason: format!("invalid watch exclude pattern '{pattern}': {e}"),
            })?;
            builder.add(glob);
        }
        let exclude = builder.build().map_err(|e| WatchError::ConfigError {
            reason: e.to_string(),
        })?;

        Ok(Self {
            settings,
            pipeline,
            project_root,
            exclude,
        })
    }

    fn excluded(&self, path: &Path) -> bool {
        self.exclude.is_match(path)
    }

    /// Run the watch loop until `should_stop` returns true, invoking
    /// `on_reindex` once per coalesced batch of file changes.
    ///
    /// Cancellation is cooperative: `should_stop` is polled between ticks,
    /// never mid-reindex, so SIGINT/SIGTERM handling can set a flag this
    /// closure reads and the in-flight reindex always finishes (spec §5).
    pub fn run(
        &self,
        mut on_reindex: impl FnMut(ReindexReport),
        mut should_stop: impl FnMut() -> bool,
    ) -> WatchResult<()> {
        if self.settings.watch.polling {
            self.run_polling(&mut on_reindex, &mut should_stop)
        } else {
            self.run_event_debounce(&mut on_reindex, &mut should_stop)
        }
    }

    fn run_polling(
        &self,
        on_reindex: &mut impl FnMut(ReindexReport),
        should_stop: &mut impl FnMut() -> bool,
    ) -> WatchResult<()> {
        let interval = Duration::from_millis(self.settings.watch.polling_interval.unwrap_or(1000));
        let manifest_path = self
            .project_root
            .join(crate::config::CACHE_DIR_NAME)
            .join("manifest.json");
        let engine = SyncEngine::new(
            self.settings.clone(),
            self.pipeline.clone(),
            self.project_root.clone(),
            manifest_path,
        );

        while !should_stop() {
            let report = engine.run();
            if report.stale_count + report.deleted_count + report.added_count > 0 {
                on_reindex(ReindexReport {
                    files: Vec::new(),
                    errors: report
                        .errors
                        .into_iter()
                        .map(|e| (e.file, e.message))
                        .collect(),
                });
            }
            std::thread::sleep(interval);
        }
        Ok(())
    }

    fn run_event_debounce(
        &self,
        on_reindex: &mut impl FnMut(ReindexReport),
        should_stop: &mut impl FnMut() -> bool,
    ) -> WatchResult<()> {
        let (tx, rx) = channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        })
        .map_err(|e| WatchError::InitFailed { reason: e.to_string() })?;
        watcher
            .watch(&self.project_root, RecursiveMode::Recursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: self.project_root.clone(),
                reason: e.to_string(),
            })?;

        let mut debouncer = Debouncer::new(self.settings.watch.debounce_interval_ms());
        let tick = Duration::from_millis(50);

        while !should_stop() {
            match rx.recv_timeout(tick) {
                Ok(event) => {
                    for path in event.paths {
                        if Language::from_path(&path).is_none() || self.excluded(&path) {
                            continue;
                        }
                        tracing::debug!(path = %path.display(), "watch event -> pending");
                        debouncer.record(path);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Err(WatchError::ChannelClosed),
            }

            let ready = debouncer.take_ready();
            if ready.is_empty() {
                continue;
            }
            tracing::info!(batch_size = ready.len(), "reindexing coalesced batch");
            on_reindex(self.reindex_batch(&ready));
        }
        Ok(())
    }

    fn reindex_batch(&self, paths: &[PathBuf]) -> ReindexReport {
        let mut report = ReindexReport::default();
        for abs_path in paths {
            let Ok(relative) = abs_path.strip_prefix(&self.project_root) else {
                continue;
            };
            let rel_str = normalize_path(relative);
            let result = if abs_path.exists() {
                self.pipeline
                    .index_file(abs_path, &self.project_root, None)
                    .map(|_| ())
            } else {
                self.pipeline.remove_file(&rel_str)
            };
            match result {
                Ok(()) => report.files.push(rel_str),
                Err(e) => report.errors.push((rel_str, e.to_string())),
            }
        }
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
    use std::sync::atomic::{AtomicUsize, Ordering};

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
    fn rapid_double_write_coalesces_into_one_reindex_callback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("src").join("rapid.ts");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "export function a() {}").unwrap();

        let mut settings = Settings::default();
        settings.watch.debounce_interval = Some(80);
        let settings = Arc::new(settings);

        let watcher = Watcher::new(settings, pipeline(), dir.path().to_path_buf()).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let seen_files: Arc<std::sync::Mutex<Vec<String>>> = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_files_clone = seen_files.clone();

        let start = std::time::Instant::now();
        std::thread::spawn({
            let path = path.clone();
            move || {
                std::thread::sleep(Duration::from_millis(10));
                std::fs::write(&path, "export function a() { return 1; }").unwrap();
                std::thread::sleep(Duration::from_millis(10));
                std::fs::write(&path, "export function a() { return 2; }").unwrap();
            }
        });

        watcher
            .run(
                move |report| {
                    calls_clone.fetch_add(1, Ordering::SeqCst);
                    seen_files_clone.lock().unwrap().extend(report.files);
                },
                move || start.elapsed() > Duration::from_millis(500),
            )
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(seen_files.lock().unwrap().as_slice(), ["src/rapid.ts"]);
    }
}
