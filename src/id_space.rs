//! The seam between the canonical string node id used everywhere in the
//! public data model and the interned [`SymbolId`]/[`FileId`] pair used
//! internally for cache-friendly graph traversal.
//!
//! A node id is `"<relative_file_path>:<qualified_name>"`, or just the
//! relative file path for File nodes. Paths are always forward-slash
//! normalized so ids are stable across platforms (grounded on the
//! teacher's `parsing::paths` helpers, which do the same normalization
//! for module paths).

use dashmap::DashMap;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

use crate::types::{FileId, SymbolId};

/// Normalize a filesystem path into the forward-slash relative form used
/// in node ids, regardless of host platform.
pub fn normalize_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Build a canonical node id from a relative file path and an optional
/// qualified symbol name.
pub fn node_id(relative_file_path: &str, qualified_name: Option<&str>) -> String {
    match qualified_name {
        Some(name) if !name.is_empty() => format!("{relative_file_path}:{name}"),
        _ => relative_file_path.to_string(),
    }
}

/// Split a node id back into its file-path and qualified-name parts.
/// File nodes round-trip with `qualified_name = None`.
pub fn split_node_id(id: &str) -> (&str, Option<&str>) {
    match id.split_once(':') {
        Some((file, name)) => (file, Some(name)),
        None => (id, None),
    }
}

#[derive(Debug, Default)]
struct Interner {
    symbol_ids: DashMap<String, SymbolId>,
    symbol_names: DashMap<SymbolId, String>,
    file_ids: DashMap<String, FileId>,
    file_paths: DashMap<FileId, String>,
    next_symbol: RwLock<u32>,
    next_file: RwLock<u32>,
}

/// Bidirectional mapping between canonical string node ids and the
/// interned integer ids used for in-process traversal. One `IdSpace` is
/// shared (via `Arc`) across the Store, Extractor, and QueryEngine within
/// a single process.
#[derive(Debug, Clone)]
pub struct IdSpace {
    inner: Arc<Interner>,
}

impl Default for IdSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSpace {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Interner {
                symbol_ids: DashMap::new(),
                symbol_names: DashMap::new(),
                file_ids: DashMap::new(),
                file_paths: DashMap::new(),
                next_symbol: RwLock::new(1),
                next_file: RwLock::new(1),
            }),
        }
    }

    /// Intern a file path, returning its stable `FileId`. Re-interning the
    /// same path returns the same id.
    pub fn intern_file(&self, relative_path: &str) -> FileId {
        if let Some(id) = self.inner.file_ids.get(relative_path) {
            return *id;
        }
        let mut next = self.inner.next_file.write();
        // Re-check under the lock in case of a race between the read above
        // and acquiring the write lock.
        if let Some(id) = self.inner.file_ids.get(relative_path) {
            return *id;
        }
        let id = FileId::new(*next).expect("file id counter never reaches zero");
        *next += 1;
        self.inner.file_ids.insert(relative_path.to_string(), id);
        self.inner.file_paths.insert(id, relative_path.to_string());
        id
    }

    pub fn file_path(&self, id: FileId) -> Option<String> {
        self.inner.file_paths.get(&id).map(|v| v.clone())
    }

    pub fn file_id(&self, relative_path: &str) -> Option<FileId> {
        self.inner.file_ids.get(relative_path).map(|v| *v)
    }

    /// Intern a canonical node id, returning its stable `SymbolId`.
    pub fn intern_node(&self, node_id: &str) -> SymbolId {
        if let Some(id) = self.inner.symbol_ids.get(node_id) {
            return *id;
        }
        let mut next = self.inner.next_symbol.write();
        if let Some(id) = self.inner.symbol_ids.get(node_id) {
            return *id;
        }
        let id = SymbolId::new(*next).expect("symbol id counter never reaches zero");
        *next += 1;
        self.inner.symbol_ids.insert(node_id.to_string(), id);
        self.inner.symbol_names.insert(id, node_id.to_string());
        id
    }

    pub fn node_id_of(&self, id: SymbolId) -> Option<String> {
        self.inner.symbol_names.get(&id).map(|v| v.clone())
    }

    pub fn symbol_id(&self, node_id: &str) -> Option<SymbolId> {
        self.inner.symbol_ids.get(node_id).map(|v| *v)
    }

    /// Drop every interned node id that belongs to the given file (node id
    /// starts with `"{file_path}:"` or equals `file_path` exactly). Used by
    /// the IndexPipeline before re-extracting a file so removed symbols do
    /// not linger as orphaned interned ids.
    pub fn forget_file(&self, relative_path: &str) {
        let prefix = format!("{relative_path}:");
        let stale: Vec<String> = self
            .inner
            .symbol_ids
            .iter()
            .filter(|entry| entry.key() == relative_path || entry.key().starts_with(&prefix))
            .map(|entry| entry.key().clone())
            .collect();
        for node_id in stale {
            if let Some((_, id)) = self.inner.symbol_ids.remove(&node_id) {
                self.inner.symbol_names.remove(&id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_formats_file_plus_qualified_name() {
        assert_eq!(node_id("src/a.ts", Some("Foo.bar")), "src/a.ts:Foo.bar");
        assert_eq!(node_id("src/a.ts", None), "src/a.ts");
    }

    #[test]
    fn split_node_id_round_trips() {
        assert_eq!(split_node_id("src/a.ts:Foo.bar"), ("src/a.ts", Some("Foo.bar")));
        assert_eq!(split_node_id("src/a.ts"), ("src/a.ts", None));
    }

    #[test]
    fn interning_is_stable() {
        let space = IdSpace::new();
        let a = space.intern_node("src/a.ts:Foo");
        let b = space.intern_node("src/a.ts:Foo");
        assert_eq!(a, b);
        assert_eq!(space.node_id_of(a).as_deref(), Some("src/a.ts:Foo"));
    }

    #[test]
    fn forget_file_drops_only_that_files_symbols() {
        let space = IdSpace::new();
        let kept = space.intern_node("src/b.ts:Keep");
        space.intern_node("src/a.ts:Foo");
        space.intern_node("src/a.ts:Bar");
        space.intern_node("src/a.ts");
        space.forget_file("src/a.ts");
        assert!(space.symbol_id("src/a.ts:Foo").is_none());
        assert!(space.symbol_id("src/a.ts:Bar").is_none());
        assert!(space.symbol_id("src/a.ts").is_none());
        assert_eq!(space.node_id_of(kept).as_deref(), Some("src/b.ts:Keep"));
    }
}
