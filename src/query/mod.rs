//! Read-side traversals over the Store: `dependenciesOf`, `dependentsOf`,
//! `pathsBetween` (spec §4.13), plus an optional topic filter that prunes
//! dead branches using the SearchBackend's hybrid ranking.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use thiserror::Error;

use crate::relationship::RelationKind;
use crate::search::{SearchBackend, SearchError, SearchOptions};
use crate::storage::{Direction, Edge, Node, PathResult, Reachability, Store, StoreError};
use crate::vector::{Embedder, EmbedderError, EmbeddingCache};

/// Edge kinds a dependency/dependent traversal follows (spec §4.13).
const DEPENDENCY_KINDS: [RelationKind; 5] = [
    RelationKind::Calls,
    RelationKind::References,
    RelationKind::Extends,
    RelationKind::Implements,
    RelationKind::UsesType,
];

const MAX_DEPTH: u32 = 100;
const TOPIC_SEARCH_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("failed to embed topic: {0}")]
    Embed(#[from] EmbedderError),
    #[error("{file}:{symbol} not indexed")]
    NotIndexed { file: String, symbol: String },
    #[error("Invalid query: source and target are the same symbol.")]
    SameSymbol,
    #[error("no path found between {from} and {to}")]
    NoPath { from: String, to: String },
}

pub type QueryResult<T> = Result<T, QueryError>;

/// A `dependenciesOf`/`dependentsOf` result, with the resolved start node
/// id kept alongside the reachability set so callers (the Formatter) can
/// tell the anchor apart from the rest.
pub struct Traversal {
    pub start: String,
    pub reachability: Reachability,
}

/// Traversals over the committed graph; reads are never blocked by the
/// Watcher's reindex work (spec §5).
pub struct QueryEngine {
    store: Arc<Store>,
    search: Arc<SearchBackend>,
    embedder: Arc<dyn Embedder>,
    cache: Arc<EmbeddingCache>,
}

impl QueryEngine {
    pub fn new(
        store: Arc<Store>,
        search: Arc<SearchBackend>,
        embedder: Arc<dyn Embedder>,
        cache: Arc<EmbeddingCache>,
    ) -> Self {
        Self { store, search, embedder, cache }
    }

    pub fn dependencies_of(&self, file: &str, symbol: &str, topic: Option<&str>) -> QueryResult<Traversal> {
        self.traverse(file, symbol, Direction::Outgoing, topic)
    }

    pub fn dependents_of(&self, file: &str, symbol: &str, topic: Option<&str>) -> QueryResult<Traversal> {
        self.traverse(file, symbol, Direction::Incoming, topic)
    }

    /// Loads the full `Node` rows for a reachability set's ids, in the
    /// order the Formatter should render them (the Store is the only
    /// source of `type`/`file`/line-range data; `Reachability` itself
    /// carries only ids and depth).
    pub fn load_nodes(&self, reachability: &Reachability) -> QueryResult<Vec<Node>> {
        let mut nodes = Vec::with_capacity(reachability.nodes.len());
        for reached in &reachability.nodes {
            if let Some(node) = self.store.get_node(&reached.id)? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    pub fn load_path_nodes(&self, path: &PathResult) -> QueryResult<Vec<Node>> {
        let mut nodes = Vec::with_capacity(path.nodes.len());
        for id in &path.nodes {
            if let Some(node) = self.store.get_node(id)? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    fn traverse(
        &self,
        file: &str,
        symbol: &str,
        direction: Direction,
        topic: Option<&str>,
    ) -> QueryResult<Traversal> {
        let _span = tracing::info_span!("query_traverse", file, symbol, ?direction).entered();
        let start = self.resolve(file, symbol)?;
        let mut reach = self
            .store
            .reachable(&start, &DEPENDENCY_KINDS, direction, MAX_DEPTH)?;

        if let Some(topic) = topic {
            let relevant = self.topic_relevant_ids(topic)?;
            reach.edges = filter_edges_to_topic_relevant(&reach.edges, &relevant, direction);
            let kept: HashSet<&str> = reach
                .edges
                .iter()
                .flat_map(|e| [e.source.as_str(), e.target.as_str()])
                .collect();
            reach.nodes.retain(|n| n.id == start || kept.contains(n.id.as_str()));
        }

        tracing::debug!(nodes = reach.nodes.len(), edges = reach.edges.len(), "traversal complete");
        Ok(Traversal {
            start,
            reachability: reach,
        })
    }

    /// Embeds `topic` and runs it through the SearchBackend's hybrid ranking
    /// (spec §4.13's topic filter over §4.7's `SearchBackend.search`), so the
    /// vector half of hybrid search is actually exercised rather than always
    /// falling back to pure BM25; BM25-only hits get cosine backfill
    /// (spec §4.8) against their stored content instead of being dropped.
    fn topic_relevant_ids(&self, topic: &str) -> QueryResult<HashSet<String>> {
        let vector = self.embedder.embed(topic)?;
        let backfill = |id: &str| self.backfill_vector(id);
        let hits = self.search.hybrid_search(
            topic,
            Some(&vector),
            TOPIC_SEARCH_LIMIT,
            &SearchOptions::default(),
            Some(&backfill),
        )?;
        Ok(hits.into_iter().map(|h| h.id).collect())
    }

    /// Cosine backfill (spec §4.8) for one BM25-only hit: re-derive its
    /// vector from the SearchBackend's own stored content, going through the
    /// EmbeddingCache first and only calling the Embedder on a miss.
    fn backfill_vector(&self, id: &str) -> Option<Vec<f32>> {
        let content = self.search.content_for(id).ok().flatten()?;
        let hash = crate::vector::compute_content_hash(&content);
        if let Ok(Some(cached)) = self.cache.get(&hash) {
            return Some(cached);
        }
        let vector = self.embedder.embed(&content).ok()?;
        if let Err(e) = self.cache.set(&hash, &vector) {
            tracing::warn!("failed to cache backfilled embedding for {id}: {e}");
        }
        Some(vector)
    }

    /// Bidirectional shortest path (spec §4.2/§4.13): tries `from -> to`
    /// first, then `to -> from`; arrows in the result always reflect the
    /// edges' actual stored orientation.
    pub fn paths_between(
        &self,
        from: (&str, &str),
        to: (&str, &str),
    ) -> QueryResult<PathResult> {
        let _span = tracing::info_span!("query_paths_between", from = from.1, to = to.1).entered();
        let from_id = self.resolve(from.0, from.1)?;
        let to_id = self.resolve(to.0, to.1)?;
        if from_id == to_id {
            return Err(QueryError::SameSymbol);
        }
        let path = self
            .store
            .shortest_path(&from_id, &to_id, MAX_DEPTH)?
            .ok_or(QueryError::NoPath {
                from: from_id,
                to: to_id,
            })?;
        tracing::debug!(hops = path.nodes.len(), "path found");
        Ok(path)
    }

    fn resolve(&self, file: &str, symbol: &str) -> QueryResult<String> {
        self.store
            .resolve_node_id(file, symbol)?
            .ok_or_else(|| QueryError::NotIndexed {
                file: file.to_string(),
                symbol: symbol.to_string(),
            })
    }
}

/// Keeps the start node's outgoing chain iff it can reach a topic-relevant
/// node; removes dead branches otherwise (spec §8 testable property).
///
/// `direction` picks which endpoint continues the chain away from the
/// start: `Outgoing` walks `source -> target`, `Incoming` walks the same
/// edges backwards (`target -> source`), matching the direction the
/// reachability traversal used to collect `edges`.
fn filter_edges_to_topic_relevant(
    edges: &[Edge],
    relevant: &HashSet<String>,
    direction: Direction,
) -> Vec<Edge> {
    let chain_ends = |e: &Edge| -> (&str, &str) {
        match direction {
            Direction::Outgoing => (e.source.as_str(), e.target.as_str()),
            Direction::Incoming => (e.target.as_str(), e.source.as_str()),
        }
    };

    // Reverse adjacency over the chain direction: `to -> [from, ...]`.
    let mut reverse: HashMap<&str, Vec<&str>> = HashMap::new();
    for e in edges {
        let (from, to) = chain_ends(e);
        reverse.entry(to).or_default().push(from);
    }

    // BFS backward from every topic-relevant node reached; a node ends up
    // `visited` exactly when it can reach a relevant node along the chain.
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    for id in relevant {
        if visited.insert(id.as_str()) {
            queue.push_back(id.as_str());
        }
    }
    while let Some(node) = queue.pop_front() {
        if let Some(froms) = reverse.get(node) {
            for &f in froms {
                if visited.insert(f) {
                    queue.push_back(f);
                }
            }
        }
    }

    edges
        .iter()
        .filter(|e| visited.contains(chain_ends(e).1))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchBackend;
    use crate::storage::{Node, Store};
    use serde_json::json;

    struct StubEmbedder;

    impl Embedder for StubEmbedder {
        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn model_name(&self) -> &str {
            "stub-test-embedder"
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    fn node(id: &str, name: &str, file: &str) -> Node {
        Node {
            id: id.to_string(),
            node_type: "Function".to_string(),
            name: name.to_string(),
            package: None,
            module: None,
            file_path: file.to_string(),
            start_line: 0,
            end_line: 1,
            exported: true,
            properties: json!({}),
        }
    }

    fn edge(source: &str, target: &str, kind: RelationKind) -> Edge {
        Edge {
            source: source.to_string(),
            target: target.to_string(),
            kind,
            call_count: None,
            is_type_only: None,
            imported_symbols: None,
            context: None,
        }
    }

    fn chain_engine() -> (QueryEngine, Arc<Store>) {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let search = Arc::new(SearchBackend::open_in_ram().unwrap());
        let names = ["entry", "step02", "step03", "step04", "step05"];
        let nodes: Vec<Node> = names
            .iter()
            .map(|n| node(&format!("chain.ts:{n}"), n, "chain.ts"))
            .collect();
        store.write_nodes(&nodes).unwrap();
        let edges: Vec<Edge> = names
            .windows(2)
            .map(|w| {
                edge(
                    &format!("chain.ts:{}", w[0]),
                    &format!("chain.ts:{}", w[1]),
                    RelationKind::Calls,
                )
            })
            .collect();
        store.write_edges(&edges).unwrap();
        let embedder: Arc<dyn Embedder> = Arc::new(StubEmbedder);
        let cache = Arc::new(EmbeddingCache::open_in_memory().unwrap());
        (QueryEngine::new(store.clone(), search, embedder, cache), store)
    }

    #[test]
    fn paths_between_is_direction_agnostic() {
        let (engine, _store) = chain_engine();
        let forward = engine
            .paths_between(("chain.ts", "entry"), ("chain.ts", "step05"))
            .unwrap();
        assert_eq!(
            forward.nodes,
            vec![
                "chain.ts:entry",
                "chain.ts:step02",
                "chain.ts:step03",
                "chain.ts:step04",
                "chain.ts:step05",
            ]
        );

        let backward = engine
            .paths_between(("chain.ts", "step05"), ("chain.ts", "entry"))
            .unwrap();
        assert_eq!(backward.nodes, forward.nodes);
    }

    #[test]
    fn paths_between_same_symbol_is_an_error() {
        let (engine, _store) = chain_engine();
        let err = engine
            .paths_between(("chain.ts", "entry"), ("chain.ts", "entry"))
            .unwrap_err();
        assert!(matches!(err, QueryError::SameSymbol));
    }

    #[test]
    fn dependents_of_missing_symbol_reports_not_indexed() {
        let (engine, _store) = chain_engine();
        let err = engine
            .dependents_of("chain.ts", "ghost", None)
            .unwrap_err();
        assert!(matches!(err, QueryError::NotIndexed { .. }));
    }

    #[test]
    fn dependencies_of_finds_full_outgoing_chain() {
        let (engine, _store) = chain_engine();
        let traversal = engine.dependencies_of("chain.ts", "entry", None).unwrap();
        assert_eq!(traversal.start, "chain.ts:entry");
        assert_eq!(traversal.reachability.nodes.len(), 5);
        assert_eq!(traversal.reachability.edges.len(), 4);

        let nodes = engine.load_nodes(&traversal.reachability).unwrap();
        assert_eq!(nodes.len(), 5);
    }

    #[test]
    fn topic_filter_keeps_relevant_chain_and_drops_dead_branch() {
        let edges = vec![
            edge("a", "b", RelationKind::Calls),
            edge("b", "c", RelationKind::Calls),
            edge("a", "dead", RelationKind::Calls),
        ];
        let relevant: HashSet<String> = ["c".to_string()].into_iter().collect();
        let kept = filter_edges_to_topic_relevant(&edges, &relevant, Direction::Outgoing);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|e| e.target != "dead"));
    }
}
