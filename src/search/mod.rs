//! Hybrid BM25 + vector search over the graph's non-File nodes (spec
//! §4.7/4.8). The lexical half is a `tantivy` index keyed by node id; the
//! vector half is a plain in-memory map, since the corpus size this crate
//! targets (a single repository) never needs sub-linear nearest-neighbor
//! search.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use globset::Glob;
use serde::{Deserialize, Serialize};
use tantivy::collector::TopDocs;
use tantivy::query::{QueryParser, TermQuery};
use tantivy::schema::{IndexRecordOption, Schema, Value, FAST, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, Term};
use thiserror::Error;

use crate::vector::cosine_similarity;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("failed to open search index at '{path}': {source}")]
    Open {
        path: String,
        source: tantivy::TantivyError,
    },
    #[error("tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),
    #[error("query parse error: {0}")]
    QueryParse(#[from] tantivy::query::QueryParserError),
}

pub type SearchResult<T> = Result<T, SearchError>;

/// A single indexed node, matching spec's `SearchDocument`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: String,
    pub symbol: String,
    pub file: String,
    pub node_type: String,
    pub content: String,
}

/// One hit from a search: the node id and its relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
}

/// A wide-net hit carrying the stored fields `search` (spec §4.7) filters
/// on, before they're dropped down to the plain `SearchHit` the caller sees.
struct WideHit {
    id: String,
    score: f32,
    node_type: String,
    file: String,
}

/// Optional narrowing for `hybrid_search`/`bm25_search` (spec §4.7's
/// `{nodeTypes?, filePattern?, similarityThreshold?}`).
#[derive(Debug, Clone, Default)]
pub struct SearchOptions<'a> {
    pub node_types: Option<&'a [String]>,
    pub file_pattern: Option<&'a str>,
    pub similarity_threshold: Option<f32>,
}

const WIDE_NET_LIMIT: usize = 1000;
const VECTOR_SIMILARITY_THRESHOLD: f32 = 0.6;

/// Split `camelCase`/`PascalCase`/`snake_case`/`kebab-case` identifiers into
/// their constituent words, so `getUserById` contributes `get User By Id`
/// and an already-split or acronym-bearing name like `XMLParser` becomes
/// `XML Parser` rather than losing the acronym boundary. Case is preserved:
/// tantivy's default tokenizer lowercases at index time, so this only needs
/// to get word boundaries right, and preserving case keeps the function
/// idempotent on input that is already split.
pub fn split_identifier(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c == '.' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        let prev = if i > 0 { Some(chars[i - 1]) } else { None };
        let next = chars.get(i + 1).copied();
        let boundary = match prev {
            None => false,
            Some(p) => {
                (p.is_lowercase() && c.is_uppercase())
                    || (p.is_uppercase() && c.is_uppercase() && next.is_some_and(|n| n.is_lowercase()))
                    || (p.is_alphabetic() && c.is_ascii_digit())
                    || (p.is_ascii_digit() && c.is_alphabetic())
            }
        };
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words.join(" ")
}

/// Build a `SearchDocument.content` string: split identifier, then the
/// literal symbol name, then the prepared snippet.
pub fn build_content(symbol: &str, prepared_snippet: &str) -> String {
    format!("{} {} {}", split_identifier(symbol), symbol, prepared_snippet)
}

struct TantivyFields {
    id: tantivy::schema::Field,
    symbol: tantivy::schema::Field,
    file: tantivy::schema::Field,
    node_type: tantivy::schema::Field,
    content: tantivy::schema::Field,
}

fn build_schema() -> (Schema, TantivyFields) {
    let mut builder = Schema::builder();
    let id = builder.add_text_field("id", STRING | STORED | FAST);
    let symbol = builder.add_text_field("symbol", STRING | STORED);
    let file = builder.add_text_field("file", STRING | STORED);
    let node_type = builder.add_text_field("node_type", STRING | STORED);
    let content = builder.add_text_field("content", TEXT | STORED);
    let schema = builder.build();
    (schema, TantivyFields { id, symbol, file, node_type, content })
}

pub struct SearchBackend {
    index: Index,
    fields: TantivyFields,
    writer: RwLock<IndexWriter>,
    reader: IndexReader,
    vectors: RwLock<HashMap<String, Vec<f32>>>,
}

impl SearchBackend {
    pub fn open_or_create(path: &Path) -> SearchResult<Self> {
        std::fs::create_dir_all(path).ok();
        let (schema, fields) = build_schema();
        let dir = tantivy::directory::MmapDirectory::open(path)?;
        let index = Index::open_or_create(dir, schema).map_err(|e| SearchError::Open {
            path: path.display().to_string(),
            source: e,
        })?;
        let writer = index.writer(50_000_000)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;
        Ok(Self {
            index,
            fields,
            writer: RwLock::new(writer),
            reader,
            vectors: RwLock::new(HashMap::new()),
        })
    }

    pub fn open_in_ram() -> SearchResult<Self> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        let writer = index.writer(50_000_000)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;
        Ok(Self {
            index,
            fields,
            writer: RwLock::new(writer),
            reader,
            vectors: RwLock::new(HashMap::new()),
        })
    }

    /// Add (or replace) a document's lexical entry. Vectors are stored
    /// separately via [`Self::set_vector`] once the embedder has produced
    /// one for the node (embedding may fail and fall back to lexical-only).
    pub fn add_document(&self, doc: &SearchDocument) -> SearchResult<()> {
        let writer = self.writer.write().unwrap();
        writer.delete_term(Term::from_field_text(self.fields.id, &doc.id));
        writer.add_document(doc!(
            self.fields.id => doc.id.clone(),
            self.fields.symbol => doc.symbol.clone(),
            self.fields.file => doc.file.clone(),
            self.fields.node_type => doc.node_type.clone(),
            self.fields.content => doc.content.clone(),
        ))?;
        Ok(())
    }

    pub fn set_vector(&self, id: &str, vector: Vec<f32>) {
        self.vectors.write().unwrap().insert(id.to_string(), vector);
    }

    pub fn vector(&self, id: &str) -> Option<Vec<f32>> {
        self.vectors.read().unwrap().get(id).cloned()
    }

    /// Remove every document (lexical + vector) belonging to one file.
    pub fn remove_by_file(&self, file_path: &str) -> SearchResult<()> {
        let writer = self.writer.write().unwrap();
        writer.delete_term(Term::from_field_text(self.fields.file, file_path));
        let mut vectors = self.vectors.write().unwrap();
        vectors.retain(|id, _| !id.starts_with(&format!("{file_path}:")) && id != file_path);
        Ok(())
    }

    pub fn commit(&self) -> SearchResult<()> {
        self.writer.write().unwrap().commit()?;
        self.reader.reload()?;
        Ok(())
    }

    /// Wide-net BM25 over `content`, uncapped by vector similarity.
    pub fn bm25_search(&self, query_text: &str, limit: usize) -> SearchResult<Vec<SearchHit>> {
        Ok(self
            .bm25_search_with_fields(query_text, limit)?
            .into_iter()
            .map(|h| SearchHit { id: h.id, score: h.score })
            .collect())
    }

    fn bm25_search_with_fields(&self, query_text: &str, limit: usize) -> SearchResult<Vec<WideHit>> {
        let searcher = self.reader.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.fields.content]);
        let query = parser.parse_query(query_text)?;
        let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let retrieved = searcher.doc::<tantivy::TantivyDocument>(address)?;
            let id = retrieved.get_first(self.fields.id).and_then(|v| v.as_str());
            let node_type = retrieved.get_first(self.fields.node_type).and_then(|v| v.as_str());
            let file = retrieved.get_first(self.fields.file).and_then(|v| v.as_str());
            if let (Some(id), Some(node_type), Some(file)) = (id, node_type, file) {
                hits.push(WideHit {
                    id: id.to_string(),
                    score,
                    node_type: node_type.to_string(),
                    file: file.to_string(),
                });
            }
        }
        Ok(hits)
    }

    /// The exact indexed `content` text for one document, used by cosine
    /// backfill (spec §4.8) to re-derive a missing vector's source text.
    pub fn content_for(&self, id: &str) -> SearchResult<Option<String>> {
        let searcher = self.reader.searcher();
        let term = Term::from_field_text(self.fields.id, id);
        let query = TermQuery::new(term, IndexRecordOption::Basic);
        let top_docs = searcher.search(&query, &TopDocs::with_limit(1))?;
        for (_, address) in top_docs {
            let retrieved = searcher.doc::<tantivy::TantivyDocument>(address)?;
            if let Some(content) = retrieved.get_first(self.fields.content).and_then(|v| v.as_str()) {
                return Ok(Some(content.to_string()));
            }
        }
        Ok(None)
    }

    fn apply_filters(&self, hits: Vec<WideHit>, options: &SearchOptions) -> Vec<WideHit> {
        let file_matcher = options
            .file_pattern
            .and_then(|p| Glob::new(p).ok())
            .map(|g| g.compile_matcher());

        hits.into_iter()
            .filter(|h| {
                let node_type_ok = options
                    .node_types
                    .is_none_or(|types| types.iter().any(|t| t == &h.node_type));
                let file_ok = file_matcher.as_ref().is_none_or(|m| m.is_match(&h.file));
                node_type_ok && file_ok
            })
            .collect()
    }

    /// Hybrid search (spec §4.7): a wide BM25 net (limit 1000), optionally
    /// narrowed by `options.nodeTypes`/`filePattern`, combined with cosine
    /// similarity against `query_vector`, scored
    /// `0.5 * cosine + 0.5 * (bm25 / max_bm25)`. Without `query_vector` this
    /// is pure BM25. Hits below `options.similarityThreshold` (default 0.6)
    /// are dropped; a BM25-only hit with no stored vector is given to
    /// `backfill` (spec §4.8: EmbeddingCache via Embedder on miss) before
    /// being dropped for lack of one.
    pub fn hybrid_search(
        &self,
        query_text: &str,
        query_vector: Option<&[f32]>,
        limit: usize,
        options: &SearchOptions,
        backfill: Option<&dyn Fn(&str) -> Option<Vec<f32>>>,
    ) -> SearchResult<Vec<SearchHit>> {
        let wide = self.apply_filters(self.bm25_search_with_fields(query_text, WIDE_NET_LIMIT)?, options);
        let max_bm25 = wide.iter().map(|h| h.score).fold(0.0f32, f32::max);

        let Some(query_vector) = query_vector else {
            let mut ranked: Vec<SearchHit> = wide
                .into_iter()
                .map(|h| SearchHit { id: h.id, score: h.score })
                .collect();
            ranked.truncate(limit);
            return Ok(ranked);
        };

        let threshold = options.similarity_threshold.unwrap_or(VECTOR_SIMILARITY_THRESHOLD);
        let mut scored: Vec<SearchHit> = Vec::new();
        for hit in wide {
            let vector = match self.vector(&hit.id) {
                Some(v) => Some(v),
                None => match backfill {
                    Some(f) => {
                        let found = f(&hit.id);
                        match &found {
                            Some(v) => self.set_vector(&hit.id, v.clone()),
                            None => tracing::warn!("no cached embedding to backfill vector for node {}", hit.id),
                        }
                        found
                    }
                    None => None,
                },
            };
            let Some(vector) = vector else { continue };
            let cosine = cosine_similarity(query_vector, &vector);
            if cosine < threshold {
                continue;
            }
            let normalized_bm25 = if max_bm25 > 0.0 { hit.score / max_bm25 } else { 0.0 };
            let score = 0.5 * cosine + 0.5 * normalized_bm25;
            scored.push(SearchHit { id: hit.id, score });
        }
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_identifier_handles_camel_case() {
        assert_eq!(split_identifier("getUserById"), "get User By Id");
    }

    #[test]
    fn split_identifier_handles_snake_case() {
        assert_eq!(split_identifier("get_user_by_id"), "get user by id");
    }

    #[test]
    fn split_identifier_handles_pascal_case() {
        assert_eq!(split_identifier("UserController"), "User Controller");
    }

    #[test]
    fn split_identifier_preserves_acronyms() {
        assert_eq!(split_identifier("XMLParser"), "XML Parser");
        assert_eq!(split_identifier("parseJSON"), "parse JSON");
    }

    #[test]
    fn split_identifier_is_idempotent_on_already_split_input() {
        let once = split_identifier("XMLParser");
        let twice = split_identifier(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn bm25_search_finds_indexed_document() {
        let backend = SearchBackend::open_in_ram().unwrap();
        backend
            .add_document(&SearchDocument {
                id: "src/a.ts:fetchUser".to_string(),
                symbol: "fetchUser".to_string(),
                file: "src/a.ts".to_string(),
                node_type: "Function".to_string(),
                content: build_content("fetchUser", "async function fetchUser(id) { ... }"),
            })
            .unwrap();
        backend.commit().unwrap();

        let hits = backend.bm25_search("fetch user", 10).unwrap();
        assert!(hits.iter().any(|h| h.id == "src/a.ts:fetchUser"));
    }

    #[test]
    fn remove_by_file_drops_lexical_and_vector_entries() {
        let backend = SearchBackend::open_in_ram().unwrap();
        backend
            .add_document(&SearchDocument {
                id: "src/a.ts:foo".to_string(),
                symbol: "foo".to_string(),
                file: "src/a.ts".to_string(),
                node_type: "Function".to_string(),
                content: build_content("foo", "function foo() {}"),
            })
            .unwrap();
        backend.set_vector("src/a.ts:foo", vec![1.0, 0.0]);
        backend.commit().unwrap();

        backend.remove_by_file("src/a.ts").unwrap();
        backend.commit().unwrap();

        assert!(backend.vector("src/a.ts:foo").is_none());
        let hits = backend.bm25_search("foo", 10).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn hybrid_search_filters_below_similarity_threshold() {
        let backend = SearchBackend::open_in_ram().unwrap();
        backend
            .add_document(&SearchDocument {
                id: "src/a.ts:near".to_string(),
                symbol: "near".to_string(),
                file: "src/a.ts".to_string(),
                node_type: "Function".to_string(),
                content: build_content("near", "matches query"),
            })
            .unwrap();
        backend
            .add_document(&SearchDocument {
                id: "src/a.ts:far".to_string(),
                symbol: "far".to_string(),
                file: "src/a.ts".to_string(),
                node_type: "Function".to_string(),
                content: build_content("far", "matches query"),
            })
            .unwrap();
        backend.set_vector("src/a.ts:near", vec![1.0, 0.0]);
        backend.set_vector("src/a.ts:far", vec![0.0, 1.0]);
        backend.commit().unwrap();

        let hits = backend
            .hybrid_search("matches query", Some(&[1.0, 0.0]), 10, &SearchOptions::default(), None)
            .unwrap();
        assert!(hits.iter().any(|h| h.id == "src/a.ts:near"));
        assert!(!hits.iter().any(|h| h.id == "src/a.ts:far"));
    }

    #[test]
    fn hybrid_search_honors_node_type_and_file_pattern_filters() {
        let backend = SearchBackend::open_in_ram().unwrap();
        backend
            .add_document(&SearchDocument {
                id: "src/a.ts:Widget".to_string(),
                symbol: "Widget".to_string(),
                file: "src/a.ts".to_string(),
                node_type: "Class".to_string(),
                content: build_content("Widget", "render widget"),
            })
            .unwrap();
        backend
            .add_document(&SearchDocument {
                id: "src/b.ts:renderWidget".to_string(),
                symbol: "renderWidget".to_string(),
                file: "src/b.ts".to_string(),
                node_type: "Function".to_string(),
                content: build_content("renderWidget", "render widget"),
            })
            .unwrap();
        backend.commit().unwrap();

        let node_types = vec!["Class".to_string()];
        let options = SearchOptions {
            node_types: Some(&node_types),
            ..Default::default()
        };
        let hits = backend.bm25_search("widget", 10).unwrap();
        assert_eq!(hits.len(), 2, "both documents should match the text query");

        let filtered = backend
            .hybrid_search("widget", None, 10, &options, None)
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "src/a.ts:Widget");

        let options = SearchOptions {
            file_pattern: Some("src/b.*"),
            ..Default::default()
        };
        let filtered = backend
            .hybrid_search("widget", None, 10, &options, None)
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "src/b.ts:renderWidget");
    }

    #[test]
    fn hybrid_search_backfills_a_bm25_only_hit_instead_of_dropping_it() {
        let backend = SearchBackend::open_in_ram().unwrap();
        backend
            .add_document(&SearchDocument {
                id: "src/a.ts:near".to_string(),
                symbol: "near".to_string(),
                file: "src/a.ts".to_string(),
                node_type: "Function".to_string(),
                content: build_content("near", "matches query"),
            })
            .unwrap();
        backend.commit().unwrap();

        let backfilled = std::cell::Cell::new(false);
        let backfill = |_id: &str| -> Option<Vec<f32>> {
            backfilled.set(true);
            Some(vec![1.0, 0.0])
        };

        let hits = backend
            .hybrid_search(
                "matches query",
                Some(&[1.0, 0.0]),
                10,
                &SearchOptions::default(),
                Some(&backfill),
            )
            .unwrap();

        assert!(backfilled.get(), "backfill should be consulted for the vector-less hit");
        assert!(hits.iter().any(|h| h.id == "src/a.ts:near"));
        assert!(backend.vector("src/a.ts:near").is_some(), "backfilled vector should be cached");
    }
}
