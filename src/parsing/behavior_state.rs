//! Shared, thread-safe bookkeeping backing `LanguageBehavior`'s file/import
//! tracking methods. Every `LanguageBehavior` impl owns one `BehaviorState`
//! and exposes it through `StatefulBehavior` so the default
//! `register_file`/`add_import`/`get_imports_for_file` plumbing only needs
//! writing once.
//!
//! `&self` throughout: the pipeline's PARSE/CONTEXT stages run one behavior
//! instance across many files concurrently via `rayon`, so every map is a
//! `DashMap` rather than a `RefCell`-guarded `HashMap`.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;

use super::resolution::Import;
use crate::types::FileId;

#[derive(Default)]
struct Inner {
    file_paths: DashMap<FileId, PathBuf>,
    module_paths: DashMap<FileId, String>,
    imports: DashMap<FileId, Vec<Import>>,
}

#[derive(Clone, Default)]
pub struct BehaviorState {
    inner: Arc<Inner>,
}

impl BehaviorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_file(&self, path: PathBuf, file_id: FileId, module_path: String) {
        self.inner.file_paths.insert(file_id, path);
        self.inner.module_paths.insert(file_id, module_path);
    }

    pub fn add_import(&self, import: Import) {
        self.inner.imports.entry(import.file_id).or_default().push(import);
    }

    pub fn get_imports(&self, file_id: FileId) -> Vec<Import> {
        self.inner
            .imports
            .get(&file_id)
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    pub fn get_file_path(&self, file_id: FileId) -> Option<PathBuf> {
        self.inner.file_paths.get(&file_id).map(|p| p.clone())
    }

    pub fn get_module_path(&self, file_id: FileId) -> Option<String> {
        self.inner.module_paths.get(&file_id).map(|p| p.clone())
    }
}

/// Bridges `LanguageBehavior`'s file/import-tracking methods to a shared
/// `BehaviorState`. Implement `state()`; the rest follows for free.
pub trait StatefulBehavior: Send + Sync {
    fn state(&self) -> &BehaviorState;

    fn register_file_with_state(&self, path: PathBuf, file_id: FileId, module_path: String) {
        self.state().register_file(path, file_id, module_path);
    }

    fn add_import_with_state(&self, import: Import) {
        self.state().add_import(import);
    }

    fn get_imports_from_state(&self, file_id: FileId) -> Vec<Import> {
        self.state().get_imports(file_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_lookup_roundtrips() {
        let state = BehaviorState::new();
        let file_id = FileId::new(1).unwrap();
        state.register_file(PathBuf::from("src/a.ts"), file_id, "a".into());

        assert_eq!(state.get_file_path(file_id), Some(PathBuf::from("src/a.ts")));
        assert_eq!(state.get_module_path(file_id), Some("a".to_string()));
    }

    #[test]
    fn imports_accumulate_per_file() {
        let state = BehaviorState::new();
        let file_id = FileId::new(1).unwrap();
        state.add_import(Import {
            path: "./b".into(),
            file_id,
            alias: None,
            is_glob: false,
            is_type_only: false,
        });
        state.add_import(Import {
            path: "./c".into(),
            file_id,
            alias: Some("C".into()),
            is_glob: false,
            is_type_only: false,
        });

        assert_eq!(state.get_imports(file_id).len(), 2);
    }

    #[test]
    fn clone_shares_underlying_state() {
        let state = BehaviorState::new();
        let file_id = FileId::new(1).unwrap();
        let cloned = state.clone();
        cloned.register_file(PathBuf::from("src/a.ts"), file_id, "a".into());
        assert_eq!(state.get_file_path(file_id), Some(PathBuf::from("src/a.ts")));
    }
}
