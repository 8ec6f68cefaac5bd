use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use rmcp::transport::stdio;
use rmcp::ServiceExt;

use codetrace_engine::cli::{Cli, Commands, QueryCommand};
use codetrace_engine::config::{CACHE_DIR_NAME, StorageConfig};
use codetrace_engine::indexing::pipeline::IndexPipeline;
use codetrace_engine::indexing::sync::SyncEngine;
use codetrace_engine::mcp::CodeGraphServer;
use codetrace_engine::search::SearchBackend;
use codetrace_engine::server_registry::{ServerInfo, SpawnLock};
use codetrace_engine::storage::Store;
use codetrace_engine::vector::{EmbeddingCache, FastEmbedEmbedder};
use codetrace_engine::watcher::Watcher;
use codetrace_engine::{format_markdown, id_space::IdSpace, init, logging, FormatInput, QueryEngine, Settings};

const EXIT_OK: i32 = 0;
const EXIT_FATAL: i32 = 1;
const EXIT_SCHEMA_TOO_NEW: i32 = 2;

fn main() {
    let cli = Cli::parse();
    let root = cli
        .root
        .clone()
        .unwrap_or_else(|| std::env::current_dir().expect("cannot determine current directory"));

    if cli.debug {
        codetrace_engine::config::set_global_debug_enabled(true);
    }

    let code = run(cli, root);
    std::process::exit(code);
}

fn run(cli: Cli, root: PathBuf) -> i32 {
    if let Commands::Init { force } = &cli.command {
        return match init::init_workspace(&root, *force) {
            Ok(cache_dir) => {
                println!("Initialized workspace at {}", cache_dir.display());
                EXIT_OK
            }
            Err(e) => {
                eprintln!("init: {e}");
                EXIT_FATAL
            }
        };
    }

    let settings_path = root.join(CACHE_DIR_NAME).join("settings.toml");
    let settings = match Settings::load_from(&settings_path) {
        Ok(settings) => Arc::new(settings),
        Err(e) => {
            eprintln!("fatal: failed to load {}: {e}", settings_path.display());
            return EXIT_FATAL;
        }
    };

    logging::init_with_config(&settings.logging);

    let cache_dir = root.join(&settings.cache_dir);
    let context = match Context::build(settings.clone(), &root, &cache_dir) {
        Ok(context) => context,
        Err(ContextError::SchemaTooNew) => return EXIT_SCHEMA_TOO_NEW,
        Err(ContextError::Fatal(msg)) => {
            eprintln!("fatal: {msg}");
            return EXIT_FATAL;
        }
    };

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::Sync => with_spawn_lock(&cache_dir, || run_sync(&context)),
        Commands::Watch => with_spawn_lock(&cache_dir, || run_watch(&context)),
        Commands::Serve => with_spawn_lock(&cache_dir, || run_serve(&context, &cache_dir)),
        Commands::Query(query) => run_query(&context, query),
    }
}

/// Acquires `server.lock` for the lifetime of `f` (spec §5 "Spawn
/// exclusion"); a concurrent writer for the same cache directory fails
/// fast rather than corrupting the Store.
fn with_spawn_lock(cache_dir: &Path, f: impl FnOnce() -> i32) -> i32 {
    match SpawnLock::acquire(cache_dir) {
        Ok(_lock) => f(),
        Err(e) => {
            eprintln!("fatal: {e}");
            EXIT_FATAL
        }
    }
}

/// Everything a subcommand needs, assembled once per process. Mirrors the
/// teacher's own collaborator-wiring block in `main.rs`, generalized to
/// this crate's Store/SearchBackend/Embedder/QueryEngine seams.
struct Context {
    settings: Arc<Settings>,
    store: Arc<Store>,
    search: Arc<SearchBackend>,
    embedder: Arc<dyn codetrace_engine::vector::Embedder>,
    cache: Arc<EmbeddingCache>,
    pipeline: IndexPipeline,
    project_root: PathBuf,
    manifest_path: PathBuf,
}

enum ContextError {
    SchemaTooNew,
    Fatal(String),
}

impl Context {
    fn build(settings: Arc<Settings>, project_root: &Path, cache_dir: &Path) -> Result<Self, ContextError> {
        let store_path = match &settings.storage {
            StorageConfig::Sqlite { path } => path
                .clone()
                .unwrap_or_else(|| cache_dir.join("graph.db")),
            StorageConfig::Memgraph { .. } => {
                return Err(ContextError::Fatal(
                    "storage.type = \"memgraph\" is not supported by this build; use sqlite".to_string(),
                ))
            }
        };

        let store = Store::open_or_create(&store_path).map_err(|e| {
            if matches!(e, codetrace_engine::storage::StoreError::SchemaTooNew { .. }) {
                ContextError::SchemaTooNew
            } else {
                ContextError::Fatal(e.to_string())
            }
        })?;
        let store = Arc::new(store);

        let search = SearchBackend::open_or_create(&cache_dir.join("search-index"))
            .map_err(|e| ContextError::Fatal(e.to_string()))?;
        let search = Arc::new(search);

        let embedder: Arc<dyn codetrace_engine::vector::Embedder> = Arc::new(
            FastEmbedEmbedder::new().map_err(|e| ContextError::Fatal(e.to_string()))?,
        );
        let cache_path = cache_dir.join("embedding-cache");
        let cache = Arc::new(
            EmbeddingCache::open(&cache_path, embedder.model_name())
                .map_err(|e| ContextError::Fatal(e.to_string()))?,
        );

        let pipeline = IndexPipeline::new(
            settings.clone(),
            store.clone(),
            search.clone(),
            embedder.clone(),
            cache.clone(),
            IdSpace::new(),
        );

        Ok(Self {
            settings,
            store,
            search,
            embedder,
            cache,
            pipeline,
            project_root: project_root.to_path_buf(),
            manifest_path: cache_dir.join("manifest.json"),
        })
    }

    fn sync_engine(&self) -> SyncEngine {
        SyncEngine::new(
            self.settings.clone(),
            self.pipeline.clone(),
            self.project_root.clone(),
            self.manifest_path.clone(),
        )
    }

    fn query_engine(&self) -> QueryEngine {
        QueryEngine::new(
            self.store.clone(),
            self.search.clone(),
            self.embedder.clone(),
            self.cache.clone(),
        )
    }
}

fn run_sync(context: &Context) -> i32 {
    let report = context.sync_engine().run();
    println!(
        "synced: {} added, {} stale, {} deleted ({} ms)",
        report.added_count, report.stale_count, report.deleted_count, report.duration_ms
    );
    for error in &report.errors {
        eprintln!("sync: {}: {}", error.file, error.message);
    }
    if report.errors.is_empty() {
        EXIT_OK
    } else {
        EXIT_FATAL
    }
}

fn run_watch(context: &Context) -> i32 {
    context.sync_engine().run();
    let watcher = match Watcher::new(
        context.settings.clone(),
        context.pipeline.clone(),
        context.project_root.clone(),
    ) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("fatal: {e}");
            return EXIT_FATAL;
        }
    };

    let stop = install_signal_handler();
    let result = watcher.run(
        |report| {
            if !report.files.is_empty() {
                println!("reindexed {} file(s)", report.files.len());
            }
            for (file, message) in &report.errors {
                eprintln!("watch: {file}: {message}");
            }
        },
        move || stop.load(std::sync::atomic::Ordering::Relaxed),
    );

    match result {
        Ok(()) => EXIT_OK,
        Err(e) => {
            eprintln!("fatal: {e}");
            EXIT_FATAL
        }
    }
}

/// `apiVersion` recorded in `server.json`, bumped whenever the MCP query
/// tool surface's request/response shapes change incompatibly.
const SERVER_API_VERSION: u32 = 1;

fn run_serve(context: &Context, cache_dir: &Path) -> i32 {
    context.sync_engine().run();

    let settings = context.settings.clone();
    let pipeline = context.pipeline.clone();
    let project_root = context.project_root.clone();
    let stop = install_signal_handler();
    let stop_for_watcher = stop.clone();
    std::thread::spawn(move || {
        if let Ok(watcher) = Watcher::new(settings, pipeline, project_root) {
            let _ = watcher.run(|_| {}, move || stop_for_watcher.load(std::sync::atomic::Ordering::Relaxed));
        }
    });

    let query = Arc::new(context.query_engine());
    let server = CodeGraphServer::new(query, context.project_root.clone());

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("fatal: failed to start async runtime: {e}");
            return EXIT_FATAL;
        }
    };

    // `host` is a discovery sentinel rather than a bindable address: this
    // build speaks MCP over stdio, not TCP, so there's no socket to report.
    let info = ServerInfo {
        host: "stdio".to_string(),
        port: context.settings.mcp.port,
        pid: std::process::id(),
        ready: true,
        api_version: SERVER_API_VERSION,
    };
    if let Err(e) = info.write(cache_dir) {
        eprintln!("warning: failed to write server.json: {e}");
    }

    let result = runtime.block_on(async move {
        let service = server
            .serve(stdio())
            .await
            .map_err(|e| e.to_string())?;
        service.waiting().await.map_err(|e| e.to_string())
    });

    stop.store(true, std::sync::atomic::Ordering::Relaxed);
    ServerInfo::remove(cache_dir);
    match result {
        Ok(_) => EXIT_OK,
        Err(e) => {
            eprintln!("fatal: mcp server error: {e}");
            EXIT_FATAL
        }
    }
}

fn run_query(context: &Context, query: QueryCommand) -> i32 {
    let engine = context.query_engine();
    let read_file = |relative: &str| std::fs::read_to_string(context.project_root.join(relative)).ok();

    let rendered = match query {
        QueryCommand::DependenciesOf { file_path, symbol, topic } => engine
            .dependencies_of(&file_path, &symbol, topic.as_deref())
            .and_then(|t| engine.load_nodes(&t.reachability).map(|n| (t, n)))
            .map(|(t, nodes)| {
                let input = FormatInput {
                    nodes: &nodes,
                    edges: &t.reachability.edges,
                    start: Some(&t.start),
                };
                format_markdown(&input, read_file)
            }),
        QueryCommand::DependentsOf { file_path, symbol, topic } => engine
            .dependents_of(&file_path, &symbol, topic.as_deref())
            .and_then(|t| engine.load_nodes(&t.reachability).map(|n| (t, n)))
            .map(|(t, nodes)| {
                let input = FormatInput {
                    nodes: &nodes,
                    edges: &t.reachability.edges,
                    start: Some(&t.start),
                };
                format_markdown(&input, read_file)
            }),
        QueryCommand::PathsBetween { from_file, from_symbol, to_file, to_symbol } => engine
            .paths_between((&from_file, &from_symbol), (&to_file, &to_symbol))
            .and_then(|path| engine.load_path_nodes(&path).map(|n| (path, n)))
            .map(|(path, nodes)| {
                let start = path.nodes.first().cloned();
                let input = FormatInput {
                    nodes: &nodes,
                    edges: &path.edges,
                    start: start.as_deref(),
                };
                format_markdown(&input, read_file)
            }),
    };

    match rendered {
        Ok(text) => {
            println!("{text}");
            EXIT_OK
        }
        Err(e) => {
            eprintln!("query: {e}");
            EXIT_FATAL
        }
    }
}

/// SIGINT sets this flag; `Watcher::run` only observes it between ticks,
/// so an in-flight reindex always finishes (spec §5). Spawns its own
/// single-threaded runtime since `tokio::signal` needs one and the
/// `watch` subcommand otherwise runs synchronously.
fn install_signal_handler() -> Arc<std::sync::atomic::AtomicBool> {
    let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let handler_flag = stop.clone();
    std::thread::spawn(move || {
        if let Ok(rt) = tokio::runtime::Runtime::new() {
            rt.block_on(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    handler_flag.store(true, std::sync::atomic::Ordering::Relaxed);
                }
            });
        }
    });
    stop
}
