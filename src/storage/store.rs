//! The persistent code graph: `nodes` and `edges` tables in a single
//! SQLite file (`graph.db`), opened with WAL for concurrent readers while
//! the Watcher holds the write lock.
//!
//! Edges carry no physical foreign key to `nodes` — packages are processed
//! in arbitrary order, so an edge may point at a node that is written
//! later in the same `indexProject` run. Dangling edges are filtered at
//! read time with an inner join instead.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use thiserror::Error;

use crate::relationship::RelationKind;

pub const SCHEMA_VERSION: i64 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open store at '{path}': {source}")]
    Open {
        path: String,
        source: rusqlite::Error,
    },
    #[error("store schema version {on_disk} is newer than this build's {supported}; refusing to start")]
    SchemaTooNew { on_disk: i64, supported: i64 },
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("node '{0}' not found")]
    NodeNotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One entity of the code graph (spec §3 `Node`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub node_type: String,
    pub name: String,
    pub package: Option<String>,
    pub module: Option<String>,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub exported: bool,
    pub properties: Json,
}

/// A directed typed relation between two node ids (spec §3 `Edge`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub kind: RelationKind,
    pub call_count: Option<u32>,
    pub is_type_only: Option<bool>,
    pub imported_symbols: Option<Vec<String>>,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// A node id reached during a traversal, with the depth (in hops) at
/// which it was first discovered and the edge that discovered it.
#[derive(Debug, Clone)]
pub struct ReachedNode {
    pub id: String,
    pub depth: u32,
}

/// Result of a reachability traversal: the reached nodes plus every edge
/// with both endpoints inside the reached set, for the Formatter to
/// render chains from.
#[derive(Debug, Clone, Default)]
pub struct Reachability {
    pub nodes: Vec<ReachedNode>,
    pub edges: Vec<Edge>,
}

/// Node ids plus connecting edges along one shortest path.
#[derive(Debug, Clone)]
pub struct PathResult {
    pub nodes: Vec<String>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Default)]
pub struct NodeFilter {
    pub file_path: Option<String>,
    pub node_type: Option<String>,
    pub name: Option<String>,
}

/// The persistent graph store. One `Store` per cache directory; the
/// `Connection` is behind a `Mutex` because `rusqlite::Connection` is
/// `!Sync` and the Watcher/QueryEngine share one instance across threads.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open `path`, creating the schema if the file is new.
    pub fn open_or_create(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path).map_err(|e| StoreError::Open {
            path: path.display().to_string(),
            source: e,
        })?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "OFF")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store, for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_meta (key TEXT PRIMARY KEY, value TEXT NOT NULL);
             CREATE TABLE IF NOT EXISTS nodes (
                 id TEXT PRIMARY KEY,
                 node_type TEXT NOT NULL,
                 name TEXT NOT NULL,
                 package TEXT,
                 module TEXT,
                 file_path TEXT NOT NULL,
                 start_line INTEGER NOT NULL,
                 end_line INTEGER NOT NULL,
                 exported INTEGER NOT NULL,
                 properties TEXT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_nodes_file_path ON nodes(file_path);
             CREATE INDEX IF NOT EXISTS idx_nodes_name ON nodes(name);
             CREATE TABLE IF NOT EXISTS edges (
                 source TEXT NOT NULL,
                 target TEXT NOT NULL,
                 kind TEXT NOT NULL,
                 call_count INTEGER,
                 is_type_only INTEGER,
                 imported_symbols TEXT,
                 context TEXT,
                 PRIMARY KEY (source, target, kind)
             );
             CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source, kind);
             CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target, kind);",
        )?;

        let on_disk: Option<String> = conn
            .query_row(
                "SELECT value FROM schema_meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match on_disk {
            None => {
                conn.execute(
                    "INSERT INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
                    [SCHEMA_VERSION.to_string()],
                )?;
            }
            Some(v) => {
                let on_disk: i64 = v.parse().unwrap_or(SCHEMA_VERSION);
                if on_disk > SCHEMA_VERSION {
                    return Err(StoreError::SchemaTooNew {
                        on_disk,
                        supported: SCHEMA_VERSION,
                    });
                }
            }
        }
        Ok(())
    }

    /// Delete every node whose `file_path` equals `path`, and every edge
    /// incident to those nodes, in one transaction.
    pub fn remove_file(&self, path: &str) -> StoreResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("SELECT id FROM nodes WHERE file_path = ?1")?;
            let ids: Vec<String> = stmt
                .query_map([path], |row| row.get(0))?
                .collect::<Result<_, _>>()?;
            for id in &ids {
                tx.execute("DELETE FROM edges WHERE source = ?1 OR target = ?1", [id])?;
            }
        }
        tx.execute("DELETE FROM nodes WHERE file_path = ?1", [path])?;
        tx.commit()?;
        Ok(())
    }

    /// Upsert by id, in one transaction.
    pub fn write_nodes(&self, nodes: &[Node]) -> StoreResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO nodes (id, node_type, name, package, module, file_path, start_line, end_line, exported, properties)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(id) DO UPDATE SET
                    node_type = excluded.node_type,
                    name = excluded.name,
                    package = excluded.package,
                    module = excluded.module,
                    file_path = excluded.file_path,
                    start_line = excluded.start_line,
                    end_line = excluded.end_line,
                    exported = excluded.exported,
                    properties = excluded.properties",
            )?;
            for n in nodes {
                stmt.execute(rusqlite::params![
                    n.id,
                    n.node_type,
                    n.name,
                    n.package,
                    n.module,
                    n.file_path,
                    n.start_line,
                    n.end_line,
                    n.exported as i64,
                    n.properties.to_string(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Insert, aggregating `call_count` when the same `(source, target,
    /// kind)` edge is observed again (re-index of a file that calls the
    /// same target more than once).
    pub fn write_edges(&self, edges: &[Edge]) -> StoreResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO edges (source, target, kind, call_count, is_type_only, imported_symbols, context)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(source, target, kind) DO UPDATE SET
                    call_count = COALESCE(edges.call_count, 0) + COALESCE(excluded.call_count, 0),
                    is_type_only = excluded.is_type_only,
                    imported_symbols = excluded.imported_symbols,
                    context = excluded.context",
            )?;
            for e in edges {
                let imported = e
                    .imported_symbols
                    .as_ref()
                    .map(|v| serde_json::to_string(v).unwrap_or_default());
                stmt.execute(rusqlite::params![
                    e.source,
                    e.target,
                    e.kind.as_str(),
                    e.call_count,
                    e.is_type_only.map(|b| b as i64),
                    imported,
                    e.context,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get_node(&self, id: &str) -> StoreResult<Option<Node>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, node_type, name, package, module, file_path, start_line, end_line, exported, properties
             FROM nodes WHERE id = ?1",
            [id],
            row_to_node,
        )
        .optional()
        .map_err(StoreError::from)
    }

    /// Find a node's id by `(file_path, symbol_name)`: an exact id match
    /// first (`"<file>:<qualified.name>"`), falling back to the first node
    /// in that file whose `name` matches, so a caller need not know the
    /// fully qualified form.
    pub fn resolve_node_id(&self, file_path: &str, symbol: &str) -> StoreResult<Option<String>> {
        let exact = crate::id_space::node_id(file_path, Some(symbol));
        if self.get_node(&exact)?.is_some() {
            return Ok(Some(exact));
        }
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id FROM nodes WHERE file_path = ?1 AND name = ?2 ORDER BY id LIMIT 1",
            [file_path, symbol],
            |row| row.get(0),
        )
        .optional()
        .map_err(StoreError::from)
    }

    pub fn query_nodes(&self, filter: &NodeFilter) -> StoreResult<Vec<Node>> {
        let conn = self.conn.lock();
        let mut sql = "SELECT id, node_type, name, package, module, file_path, start_line, end_line, exported, properties FROM nodes WHERE 1=1".to_string();
        let mut params: Vec<String> = Vec::new();
        if let Some(fp) = &filter.file_path {
            sql.push_str(" AND file_path = ?");
            params.push(fp.clone());
        }
        if let Some(t) = &filter.node_type {
            sql.push_str(" AND node_type = ?");
            params.push(t.clone());
        }
        if let Some(n) = &filter.name {
            sql.push_str(" AND name = ?");
            params.push(n.clone());
        }
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), row_to_node)?;
        rows.collect::<Result<_, _>>().map_err(StoreError::from)
    }

    /// Outgoing or incoming reachability from/to `start`, over the given
    /// edge kinds, bounded by `max_depth` hops. Implemented as a recursive
    /// CTE; `start` itself is included at depth 0.
    pub fn reachable(
        &self,
        start: &str,
        kinds: &[RelationKind],
        direction: Direction,
        max_depth: u32,
    ) -> StoreResult<Reachability> {
        if kinds.is_empty() {
            return Ok(Reachability {
                nodes: vec![ReachedNode {
                    id: start.to_string(),
                    depth: 0,
                }],
                edges: Vec::new(),
            });
        }
        let conn = self.conn.lock();
        let kind_strs: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
        let placeholders = kind_strs.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let (self_col, other_col) = match direction {
            Direction::Outgoing => ("source", "target"),
            Direction::Incoming => ("target", "source"),
        };
        let sql = format!(
            "WITH RECURSIVE reach(id, depth) AS (
                SELECT ?1, 0
                UNION
                SELECT e.{other_col}, r.depth + 1
                FROM reach r
                JOIN edges e ON e.{self_col} = r.id
                WHERE e.kind IN ({placeholders}) AND r.depth < ?2
             )
             SELECT id, MIN(depth) FROM reach GROUP BY id"
        );
        let mut query_params: Vec<String> = vec![start.to_string(), max_depth.to_string()];
        query_params.extend(kind_strs.iter().map(|s| s.to_string()));
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(query_params.iter()), |row| {
            Ok(ReachedNode {
                id: row.get(0)?,
                depth: row.get::<_, i64>(1)? as u32,
            })
        })?;
        let nodes: Vec<ReachedNode> = rows.collect::<Result<_, _>>()?;
        let reached: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

        let edge_placeholders = placeholders.clone();
        let edge_sql = format!(
            "SELECT source, target, kind, call_count, is_type_only, imported_symbols, context
             FROM edges WHERE kind IN ({edge_placeholders})"
        );
        let mut estmt = conn.prepare(&edge_sql)?;
        let mut eparams: Vec<String> = kind_strs.iter().map(|s| s.to_string()).collect();
        let all_edges: Vec<Edge> = estmt
            .query_map(params_from_iter(eparams.drain(..)), row_to_edge)?
            .collect::<Result<_, _>>()?;
        let edges = all_edges
            .into_iter()
            .filter(|e| reached.contains(e.source.as_str()) && reached.contains(e.target.as_str()))
            .collect();

        Ok(Reachability { nodes, edges })
    }

    /// Bidirectional shortest path between two node ids, direction-agnostic
    /// (tries `from -> to` first, then `to -> from`). Ties are broken by
    /// depth, then by lexicographic node id.
    pub fn shortest_path(
        &self,
        from: &str,
        to: &str,
        max_depth: u32,
    ) -> StoreResult<Option<PathResult>> {
        if let Some(path) = self.directed_shortest_path(from, to, max_depth)? {
            return Ok(Some(path));
        }
        if let Some(path) = self.directed_shortest_path(to, from, max_depth)? {
            return Ok(Some(path));
        }
        Ok(None)
    }

    fn directed_shortest_path(
        &self,
        from: &str,
        to: &str,
        max_depth: u32,
    ) -> StoreResult<Option<PathResult>> {
        if from == to {
            return Ok(None);
        }
        let conn = self.conn.lock();
        let mut frontier: VecDeque<String> = VecDeque::new();
        frontier.push_back(from.to_string());
        let mut predecessor: HashMap<String, (String, Edge)> = HashMap::new();
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(from.to_string());

        let mut depth = 0;
        let mut found = false;
        while !frontier.is_empty() && depth < max_depth {
            let mut next_frontier = Vec::new();
            // Stable order: process the current frontier sorted by id.
            let mut level: Vec<String> = frontier.drain(..).collect();
            level.sort();
            for node in level.drain(..) {
                let mut stmt = conn.prepare(
                    "SELECT source, target, kind, call_count, is_type_only, imported_symbols, context
                     FROM edges WHERE source = ?1 ORDER BY target",
                )?;
                let out: Vec<Edge> = stmt
                    .query_map([&node], row_to_edge)?
                    .collect::<Result<_, _>>()?;
                for edge in out {
                    if visited.contains(&edge.target) {
                        continue;
                    }
                    visited.insert(edge.target.clone());
                    predecessor.insert(edge.target.clone(), (node.clone(), edge.clone()));
                    if edge.target == to {
                        found = true;
                    }
                    next_frontier.push(edge.target);
                }
            }
            if found {
                break;
            }
            frontier = next_frontier.into();
            depth += 1;
        }

        if !found {
            return Ok(None);
        }

        let mut nodes = vec![to.to_string()];
        let mut edges = Vec::new();
        let mut cursor = to.to_string();
        while cursor != from {
            let (prev, edge) = predecessor.get(&cursor).expect("path reconstructible").clone();
            edges.push(edge);
            nodes.push(prev.clone());
            cursor = prev;
        }
        nodes.reverse();
        edges.reverse();
        Ok(Some(PathResult { nodes, edges }))
    }

    pub fn close(self) {
        drop(self);
    }
}

fn row_to_node(row: &rusqlite::Row) -> rusqlite::Result<Node> {
    let properties_str: String = row.get(9)?;
    Ok(Node {
        id: row.get(0)?,
        node_type: row.get(1)?,
        name: row.get(2)?,
        package: row.get(3)?,
        module: row.get(4)?,
        file_path: row.get(5)?,
        start_line: row.get::<_, i64>(6)? as u32,
        end_line: row.get::<_, i64>(7)? as u32,
        exported: row.get::<_, i64>(8)? != 0,
        properties: serde_json::from_str(&properties_str).unwrap_or(Json::Null),
    })
}

fn row_to_edge(row: &rusqlite::Row) -> rusqlite::Result<Edge> {
    let kind_str: String = row.get(2)?;
    let imported: Option<String> = row.get(5)?;
    Ok(Edge {
        source: row.get(0)?,
        target: row.get(1)?,
        kind: RelationKind::from_str(&kind_str).unwrap_or(RelationKind::Uses),
        call_count: row.get::<_, Option<i64>>(3)?.map(|v| v as u32),
        is_type_only: row.get::<_, Option<i64>>(4)?.map(|v| v != 0),
        imported_symbols: imported.and_then(|s| serde_json::from_str(&s).ok()),
        context: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, file: &str) -> Node {
        Node {
            id: id.to_string(),
            node_type: "Function".to_string(),
            name: id.rsplit(':').next().unwrap().to_string(),
            package: None,
            module: None,
            file_path: file.to_string(),
            start_line: 1,
            end_line: 2,
            exported: true,
            properties: Json::Null,
        }
    }

    fn edge(source: &str, target: &str, kind: RelationKind) -> Edge {
        Edge {
            source: source.to_string(),
            target: target.to_string(),
            kind,
            call_count: Some(1),
            is_type_only: None,
            imported_symbols: None,
            context: None,
        }
    }

    #[test]
    fn write_and_read_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        store.write_nodes(&[node("a.ts:foo", "a.ts")]).unwrap();
        let n = store.get_node("a.ts:foo").unwrap().unwrap();
        assert_eq!(n.name, "foo");
    }

    #[test]
    fn remove_file_cascades_edges() {
        let store = Store::open_in_memory().unwrap();
        store
            .write_nodes(&[node("a.ts:foo", "a.ts"), node("b.ts:bar", "b.ts")])
            .unwrap();
        store
            .write_edges(&[edge("a.ts:foo", "b.ts:bar", RelationKind::Calls)])
            .unwrap();
        store.remove_file("a.ts").unwrap();
        assert!(store.get_node("a.ts:foo").unwrap().is_none());
        let reach = store
            .reachable("b.ts:bar", &[RelationKind::Calls], Direction::Incoming, 10)
            .unwrap();
        assert_eq!(reach.edges.len(), 0);
    }

    #[test]
    fn write_edges_aggregates_call_count() {
        let store = Store::open_in_memory().unwrap();
        store
            .write_nodes(&[node("a.ts:foo", "a.ts"), node("b.ts:bar", "b.ts")])
            .unwrap();
        store
            .write_edges(&[edge("a.ts:foo", "b.ts:bar", RelationKind::Calls)])
            .unwrap();
        store
            .write_edges(&[edge("a.ts:foo", "b.ts:bar", RelationKind::Calls)])
            .unwrap();
        let reach = store
            .reachable("a.ts:foo", &[RelationKind::Calls], Direction::Outgoing, 10)
            .unwrap();
        assert_eq!(reach.edges[0].call_count, Some(2));
    }

    #[test]
    fn reachable_respects_max_depth() {
        let store = Store::open_in_memory().unwrap();
        store
            .write_nodes(&[
                node("a.ts:a", "a.ts"),
                node("a.ts:b", "a.ts"),
                node("a.ts:c", "a.ts"),
            ])
            .unwrap();
        store
            .write_edges(&[
                edge("a.ts:a", "a.ts:b", RelationKind::Calls),
                edge("a.ts:b", "a.ts:c", RelationKind::Calls),
            ])
            .unwrap();
        let reach = store
            .reachable("a.ts:a", &[RelationKind::Calls], Direction::Outgoing, 1)
            .unwrap();
        let ids: HashSet<_> = reach.nodes.iter().map(|n| n.id.as_str()).collect();
        assert!(ids.contains("a.ts:b"));
        assert!(!ids.contains("a.ts:c"));
    }

    #[test]
    fn shortest_path_is_direction_agnostic() {
        let store = Store::open_in_memory().unwrap();
        store
            .write_nodes(&[node("a.ts:a", "a.ts"), node("a.ts:b", "a.ts")])
            .unwrap();
        store
            .write_edges(&[edge("a.ts:b", "a.ts:a", RelationKind::Calls)])
            .unwrap();
        let path = store.shortest_path("a.ts:a", "a.ts:b", 10).unwrap().unwrap();
        assert_eq!(path.nodes, vec!["a.ts:a".to_string(), "a.ts:b".to_string()]);
    }

    #[test]
    fn schema_too_new_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.db");
        {
            let store = Store::open_or_create(&path).unwrap();
            drop(store);
        }
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute(
                "UPDATE schema_meta SET value = ?1 WHERE key = 'schema_version'",
                [(SCHEMA_VERSION + 1).to_string()],
            )
            .unwrap();
        }
        let err = Store::open_or_create(&path).unwrap_err();
        assert!(matches!(err, StoreError::SchemaTooNew { .. }));
    }
}
