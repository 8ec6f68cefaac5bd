//! Integration coverage for the literal end-to-end scenarios: real files on
//! disk indexed through the full `IndexPipeline`, not unit-level helpers.

use std::sync::Arc;

use codetrace_engine::id_space::IdSpace;
use codetrace_engine::indexing::pipeline::{IndexPipeline, IndexPipelineError};
use codetrace_engine::query::{QueryEngine, QueryError};
use codetrace_engine::relationship::RelationKind;
use codetrace_engine::search::SearchBackend;
use codetrace_engine::storage::{Direction, NodeFilter, Store};
use codetrace_engine::vector::{Embedder, EmbedderError, EmbeddingCache};
use codetrace_engine::Settings;

/// Fixed-dimension embedder that simulates a `maxContentLength` overflow:
/// any prepared text longer than `max_len` fails the same way a real
/// provider rejects an over-budget prompt.
struct OverflowEmbedder {
    max_len: usize,
}

impl Embedder for OverflowEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        texts
            .iter()
            .map(|t| {
                if t.chars().count() > self.max_len {
                    Err(EmbedderError::Generate("context too long for model".to_string()))
                } else {
                    Ok(vec![0.1_f32; 4])
                }
            })
            .collect()
    }

    fn model_name(&self) -> &str {
        "overflow-test-embedder"
    }

    fn dimensions(&self) -> usize {
        4
    }
}

fn make_pipeline(embedder: Arc<dyn Embedder>) -> (IndexPipeline, Arc<Store>, Arc<SearchBackend>) {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let search = Arc::new(SearchBackend::open_in_ram().unwrap());
    let cache = Arc::new(EmbeddingCache::open_in_memory().unwrap());
    let settings = Arc::new(Settings::default());
    let pipeline = IndexPipeline::new(settings, store.clone(), search.clone(), embedder, cache, IdSpace::new());
    (pipeline, store, search)
}

#[test]
fn cross_file_calls_aggregate_call_count() {
    let embedder: Arc<dyn Embedder> = Arc::new(OverflowEmbedder { max_len: 4000 });
    let (pipeline, store, _search) = make_pipeline(embedder);

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("b.ts"),
        "export function helper() {}\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("a.ts"),
        r#"import { helper } from "./b.js";
export function main() {
  helper();
}
export function multiCaller() {
  helper();
  helper();
}
"#,
    )
    .unwrap();

    pipeline
        .index_file(&dir.path().join("b.ts"), dir.path(), None)
        .unwrap();
    pipeline
        .index_file(&dir.path().join("a.ts"), dir.path(), None)
        .unwrap();

    let a_nodes = store
        .query_nodes(&NodeFilter {
            file_path: Some("a.ts".to_string()),
            node_type: None,
            name: None,
        })
        .unwrap();
    assert!(!a_nodes.is_empty(), "a.ts symbols should have been indexed");

    let reach = store
        .reachable("a.ts:main", &[RelationKind::Calls], Direction::Outgoing, 5)
        .unwrap();
    let main_to_helper = reach
        .edges
        .iter()
        .find(|e| e.source == "a.ts:main" && e.target == "b.ts:helper")
        .expect("main should call helper once");
    assert_eq!(main_to_helper.call_count, Some(1));

    let reach = store
        .reachable("a.ts:multiCaller", &[RelationKind::Calls], Direction::Outgoing, 5)
        .unwrap();
    let multi_to_helper = reach
        .edges
        .iter()
        .find(|e| e.source == "a.ts:multiCaller" && e.target == "b.ts:helper")
        .expect("multiCaller should call helper twice");
    assert_eq!(multi_to_helper.call_count, Some(2));
}

#[test]
fn embedding_fallback_succeeds_via_metadata_only_then_overflows_when_even_that_is_too_long() {
    let dir = tempfile::tempdir().unwrap();
    let huge_body = "const x = 1;\n".repeat(2000);
    std::fs::write(
        dir.path().join("huge.ts"),
        format!("export function huge() {{\n{huge_body}}}\n"),
    )
    .unwrap();

    // metadata-only fallback text is "// Function: huge\n// File: src/huge.ts"
    // (well under a generous threshold), so a ceiling above that length but
    // below the full/halved snippet lengths exercises the fallback ladder.
    let embedder: Arc<dyn Embedder> = Arc::new(OverflowEmbedder { max_len: 200 });
    let (pipeline, store, search) = make_pipeline(embedder);

    let report = pipeline
        .index_file(&dir.path().join("huge.ts"), dir.path(), None)
        .unwrap();
    assert!(report.warnings.is_empty());
    assert!(search.vector("huge.ts:huge").is_some());
    assert!(store.get_node("huge.ts:huge").unwrap().is_some());

    // An embedder whose ceiling is below even the metadata-only fallback
    // text can never succeed.
    let doom_embedder: Arc<dyn Embedder> = Arc::new(OverflowEmbedder { max_len: 5 });
    let (doom_pipeline, doom_store, _doom_search) = make_pipeline(doom_embedder);
    std::fs::write(dir.path().join("doom.ts"), "export function doom() {}\n").unwrap();
    let doom_report = doom_pipeline
        .index_file(&dir.path().join("doom.ts"), dir.path(), None)
        .unwrap();
    assert_eq!(
        doom_report.warnings,
        vec!["Failed to embed doom.ts:doom even with minimal content".to_string()]
    );
    // The node still lands in the Store even though it couldn't be embedded.
    assert!(doom_store.get_node("doom.ts:doom").unwrap().is_some());
}

#[test]
fn non_overflow_embed_error_is_surfaced_as_a_warning_not_a_failure() {
    struct AlwaysFails;
    impl Embedder for AlwaysFails {
        fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError> {
            Err(EmbedderError::Generate("network timeout".to_string()))
        }
        fn model_name(&self) -> &str {
            "always-fails"
        }
        fn dimensions(&self) -> usize {
            4
        }
    }

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("flaky.ts"), "export function flaky() {}\n").unwrap();

    let (pipeline, store, search) = make_pipeline(Arc::new(AlwaysFails));
    let report = pipeline
        .index_file(&dir.path().join("flaky.ts"), dir.path(), None)
        .unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("network timeout"));
    // node is still indexed, just not embedded
    assert!(store.get_node("flaky.ts:flaky").unwrap().is_some());
    assert!(search.vector("flaky.ts:flaky").is_none());
}

#[test]
fn deleted_file_reports_not_indexed_on_query() {
    let embedder: Arc<dyn Embedder> = Arc::new(OverflowEmbedder { max_len: 4000 });
    let (pipeline, store, search) = make_pipeline(embedder);

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("gone.ts"), "export function gone() {}\n").unwrap();
    pipeline
        .index_file(&dir.path().join("gone.ts"), dir.path(), None)
        .unwrap();
    assert!(store.get_node("gone.ts:gone").unwrap().is_some());

    pipeline.remove_file("gone.ts").unwrap();
    assert!(store.get_node("gone.ts:gone").unwrap().is_none());

    let query_embedder: Arc<dyn Embedder> = Arc::new(OverflowEmbedder { max_len: 4000 });
    let query_cache = Arc::new(EmbeddingCache::open_in_memory().unwrap());
    let engine = QueryEngine::new(store, search, query_embedder, query_cache);
    let err = engine.dependents_of("gone.ts", "gone", None).unwrap_err();
    assert!(matches!(
        err,
        QueryError::NotIndexed { file, symbol } if file == "gone.ts" && symbol == "gone"
    ));
}

#[test]
fn type_alias_edges_survive_the_full_index_file_path() {
    let embedder: Arc<dyn Embedder> = Arc::new(OverflowEmbedder { max_len: 4000 });
    let (pipeline, store, _search) = make_pipeline(embedder);

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("types.ts"),
        "interface User { name: string }\ntype Person = User;\n",
    )
    .unwrap();
    pipeline
        .index_file(&dir.path().join("types.ts"), dir.path(), None)
        .unwrap();

    let path = store
        .shortest_path("types.ts:TypeAlias:Person", "types.ts:Interface:User", 5)
        .unwrap()
        .expect("Person should derive from User");
    assert_eq!(path.nodes.len(), 2);
}

#[test]
fn barrel_reexport_through_path_alias_resolves_to_definition_site() {
    let embedder: Arc<dyn Embedder> = Arc::new(OverflowEmbedder { max_len: 4000 });
    let (pipeline, store, _search) = make_pipeline(embedder);

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    std::fs::write(
        root.join("tsconfig.json"),
        r#"{ "compilerOptions": { "baseUrl": ".", "paths": { "@libs/ui": ["libs/ui/src/index.ts"] } } }"#,
    )
    .unwrap();

    std::fs::create_dir_all(root.join("libs/ui/src/components/LoadingWrapper")).unwrap();
    std::fs::write(
        root.join("libs/ui/tsconfig.json"),
        r#"{ "compilerOptions": { "baseUrl": ".", "paths": { "@/components/*": ["src/components/*"] } } }"#,
    )
    .unwrap();
    std::fs::write(
        root.join("libs/ui/src/index.ts"),
        r#"export { LoadingWrapper } from "@/components/LoadingWrapper/LoadingWrapper";"#,
    )
    .unwrap();
    std::fs::write(
        root.join("libs/ui/src/components/LoadingWrapper/LoadingWrapper.ts"),
        "export function LoadingWrapper() {}\n",
    )
    .unwrap();

    std::fs::create_dir_all(root.join("apps/web/src")).unwrap();
    std::fs::write(
        root.join("apps/web/src/page.ts"),
        r#"import { LoadingWrapper } from "@libs/ui";
export function Page() {
  LoadingWrapper();
}
"#,
    )
    .unwrap();

    pipeline
        .index_file(
            &root.join("libs/ui/src/components/LoadingWrapper/LoadingWrapper.ts"),
            root,
            None,
        )
        .unwrap();
    pipeline
        .index_file(&root.join("apps/web/src/page.ts"), root, None)
        .unwrap();

    let reach = store
        .reachable(
            "apps/web/src/page.ts:Page",
            &[RelationKind::Calls],
            Direction::Outgoing,
            5,
        )
        .unwrap();
    assert!(reach.edges.iter().any(|e| {
        e.source == "apps/web/src/page.ts:Page"
            && e.target == "libs/ui/src/components/LoadingWrapper/LoadingWrapper.ts:LoadingWrapper"
    }));
}

#[test]
fn unsupported_file_extension_is_rejected() {
    let embedder: Arc<dyn Embedder> = Arc::new(OverflowEmbedder { max_len: 4000 });
    let (pipeline, _store, _search) = make_pipeline(embedder);

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    let err = pipeline
        .index_file(&dir.path().join("notes.txt"), dir.path(), None)
        .unwrap_err();
    assert!(matches!(err, IndexPipelineError::UnsupportedFile { .. }));
}
