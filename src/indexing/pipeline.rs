//! Turns one parsed source file into graph nodes/edges/search documents
//! (spec §4.9) and runs the progressive embedding fallback ladder (§4.10).
//!
//! **Scope decision** (see DESIGN.md): this crate's `indexFile` resolves
//! CALLS/EXTENDS/IMPLEMENTS/USES_TYPE/DEFINES/DERIVES_FROM/ALIAS_FOR edges
//! against symbols declared in the *same file* by name. Cross-file edges
//! are produced for two shapes: the common "named relative import then
//! call" case (resolved against the file's single relative import target),
//! and a bare/aliased import resolved through the nearest tsconfig/jsconfig
//! path-alias table, chasing `export { X } from`/`export * from` barrel
//! re-exports up to depth 3 to the file that actually defines the callee
//! (spec §4's barrel re-export handling, §8 scenario 6). Neither case
//! requires the target file to already be indexed, since ids are
//! deterministic strings and dangling edges are filtered at read time
//! (spec §4.2). Anything else (multiple ambiguous relative imports, or a
//! type alias referencing a type from another file) is left unresolved
//! rather than guessed at.

use std::path::Path;

use regex::Regex;
use serde_json::json;
use thiserror::Error;

use crate::id_space::{node_id, normalize_path, IdSpace};
use crate::parsing::{Language, LanguageParser, ParserFactory};
use crate::relationship::RelationKind;
use crate::search::{build_content, SearchBackend, SearchDocument};
use crate::storage::{Edge, Node, Store, StoreError};
use crate::symbol::{Symbol, Visibility};
use crate::types::{Range, SymbolCounter, SymbolKind};
use crate::vector::{Embedder, EmbeddingCache};
use crate::Settings;

#[derive(Debug, Error)]
pub enum IndexPipelineError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("no parser registered for '{path}'")]
    UnsupportedFile { path: String },
    #[error("failed to create parser: {0}")]
    ParserUnavailable(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("search backend error: {0}")]
    Search(#[from] crate::search::SearchError),
    #[error("embedding cache error: {0}")]
    Cache(#[from] crate::vector::EmbeddingCacheError),
    #[error("failed to embed content: {0}")]
    Embed(#[from] crate::vector::EmbedderError),
    #[error("Failed to embed {file}:{name} even with minimal content")]
    EmbedOverflow { file: String, name: String },
}

pub type IndexPipelineResult<T> = Result<T, IndexPipelineError>;

/// Result of indexing one file.
#[derive(Debug, Default, Clone)]
pub struct IndexFileReport {
    pub nodes_added: usize,
    pub edges_added: usize,
    /// Non-fatal problems (e.g. a non-overflow embed failure for one node —
    /// spec §7 kind 5: the node still lands in the Store, just not in
    /// SearchBackend for this run).
    pub warnings: Vec<String>,
}

const OVERFLOW_THRESHOLD_CHARS: usize = 4000;
const MIN_SNIPPET_CHARS: usize = 100;

fn looks_like_overflow(err: &crate::vector::EmbedderError) -> bool {
    let msg = err.to_string().to_lowercase();
    msg.contains("token") || msg.contains("context") || msg.contains("too long") || msg.contains("overflow")
}

#[derive(Clone)]
pub struct IndexPipeline {
    settings: std::sync::Arc<Settings>,
    store: std::sync::Arc<Store>,
    search: std::sync::Arc<SearchBackend>,
    embedder: std::sync::Arc<dyn Embedder>,
    cache: std::sync::Arc<EmbeddingCache>,
    id_space: IdSpace,
}

impl IndexPipeline {
    pub fn new(
        settings: std::sync::Arc<Settings>,
        store: std::sync::Arc<Store>,
        search: std::sync::Arc<SearchBackend>,
        embedder: std::sync::Arc<dyn Embedder>,
        cache: std::sync::Arc<EmbeddingCache>,
        id_space: IdSpace,
    ) -> Self {
        Self {
            settings,
            store,
            search,
            embedder,
            cache,
            id_space,
        }
    }

    /// `removeFile` (spec §4.11 `deleted` branch): drops a file's nodes,
    /// incident edges, and search documents without re-extracting it.
    pub fn remove_file(&self, relative_path: &str) -> IndexPipelineResult<()> {
        self.store.remove_file(relative_path)?;
        self.search.remove_by_file(relative_path)?;
        self.id_space.forget_file(relative_path);
        self.search.commit()?;
        Ok(())
    }

    /// `indexFile` (spec §4.9). `project_root` anchors relative-import
    /// resolution; `package` tags the written nodes for multi-package
    /// workspaces.
    pub fn index_file(
        &self,
        abs_path: &Path,
        project_root: &Path,
        package: Option<&str>,
    ) -> IndexPipelineResult<IndexFileReport> {
        let result = self.index_file_inner(abs_path, project_root, package);
        if let Err(e) = &result {
            tracing::warn!(file = %abs_path.display(), "extraction failed: {e}");
        }
        result
    }

    fn index_file_inner(
        &self,
        abs_path: &Path,
        project_root: &Path,
        package: Option<&str>,
    ) -> IndexPipelineResult<IndexFileReport> {
        let relative = abs_path
            .strip_prefix(project_root)
            .unwrap_or(abs_path)
            .to_path_buf();
        let rel_str = normalize_path(&relative);
        let _span = tracing::info_span!("index_file", file = %rel_str).entered();

        let code = std::fs::read_to_string(abs_path).map_err(|e| IndexPipelineError::Read {
            path: rel_str.clone(),
            source: e,
        })?;

        let language = Language::from_path(abs_path)
            .ok_or_else(|| IndexPipelineError::UnsupportedFile { path: rel_str.clone() })?;

        let factory = ParserFactory::new(self.settings.clone());
        let mut parser = factory
            .create_parser(language)
            .map_err(IndexPipelineError::ParserUnavailable)?;
        let behavior = factory
            .create_behavior_from_registry(language.to_language_id())
            .map_err(IndexPipelineError::ParserUnavailable)?;

        // Step 2: remove-old, happens-before everything else (spec §5).
        self.store.remove_file(&rel_str)?;
        self.search.remove_by_file(&rel_str)?;
        self.id_space.forget_file(&rel_str);

        let file_id = self.id_space.intern_file(&rel_str);
        let mut counter = SymbolCounter::new();
        let mut symbols = parser.parse(&code, file_id, &mut counter);
        for symbol in &mut symbols {
            let module_path = behavior
                .module_path_from_file(&relative, project_root)
                .unwrap_or_else(|| rel_str.clone());
            behavior.configure_symbol(symbol, Some(&module_path));
        }

        let mut nodes = Vec::with_capacity(symbols.len() + 1);
        nodes.push(file_node(&rel_str, package));

        let mut edges = Vec::new();
        for symbol in &symbols {
            let node = symbol_to_node(symbol, &rel_str, package);
            edges.push(Edge {
                source: rel_str.clone(),
                target: node.id.clone(),
                kind: RelationKind::Contains,
                call_count: None,
                is_type_only: None,
                imported_symbols: None,
                context: None,
            });
            nodes.push(node);
        }

        let imports = parser.find_imports(&code, file_id);
        let relative_import_targets: Vec<String> = imports
            .iter()
            .filter(|i| !i.is_glob && !i.is_type_only)
            .filter_map(|i| resolve_relative_import(&relative, &i.path, project_root))
            .collect();

        for import in &imports {
            if let Some(target_file) = resolve_relative_import(&relative, &import.path, project_root) {
                edges.push(Edge {
                    source: rel_str.clone(),
                    target: target_file,
                    kind: RelationKind::Imports,
                    call_count: None,
                    is_type_only: Some(import.is_type_only),
                    imported_symbols: import.alias.clone().map(|a| vec![a]),
                    context: None,
                });
            }
        }

        edges.extend(resolve_same_file_edges(
            &symbols,
            &rel_str,
            &relative_import_targets,
            parser.as_mut(),
            &code,
            project_root,
            &imports,
        ));

        // Steps 4: writeNodes then writeEdges, one transaction each (the
        // Store's own write_nodes/write_edges are already transactional;
        // ordering between them is preserved by calling them in sequence).
        self.store.write_nodes(&nodes)?;
        self.store.write_edges(&edges)?;

        let nodes_added = nodes.len();
        let edges_added = edges.len();
        let mut warnings = Vec::new();

        for symbol in &symbols {
            let node_id_str = symbol_node_id(&rel_str, symbol);
            let snippet = extract_snippet(&code, &symbol.range);
            match self.embed_with_fallback(symbol, &rel_str, &snippet) {
                Ok(vector) => {
                    self.search.add_document(&SearchDocument {
                        id: node_id_str.clone(),
                        symbol: symbol.name.to_string(),
                        file: rel_str.clone(),
                        node_type: symbol.kind.node_type_str().to_string(),
                        content: build_content(&symbol.name, &prepared_snippet(symbol, &rel_str, &snippet)),
                    })?;
                    self.search.set_vector(&node_id_str, vector);
                }
                Err(IndexPipelineError::EmbedOverflow { .. }) => {
                    let message = format!(
                        "Failed to embed {rel_str}:{} even with minimal content",
                        symbol.name
                    );
                    tracing::warn!("{message}");
                    warnings.push(message);
                }
                Err(e) => {
                    // spec §7 kind 5: non-overflow embedder failure — node
                    // stays in the Store, just not searchable this run.
                    let message = format!("failed to embed {rel_str}:{}: {e}", symbol.name);
                    tracing::warn!("{message}");
                    warnings.push(message);
                }
            }
        }
        self.search.commit()?;

        tracing::info!(nodes_added, edges_added, "indexed file");
        Ok(IndexFileReport {
            nodes_added,
            edges_added,
            warnings,
        })
    }

    /// `embedWithFallback` (spec §4.10).
    fn embed_with_fallback(
        &self,
        symbol: &Symbol,
        file_path: &str,
        snippet: &str,
    ) -> IndexPipelineResult<Vec<f32>> {
        let node_type = symbol.kind.node_type_str();
        let name = symbol.name.as_ref();

        // 1. full prepared content.
        let full = prepared_snippet_text(node_type, name, file_path, snippet);
        match self.try_embed(&full) {
            Ok(v) => return Ok(v),
            Err(Attempt::Overflow) => {}
            Err(Attempt::Other(e)) => return Err(e),
        }

        // 2. for Class nodes, collapse method bodies first.
        if node_type == "Class" {
            let collapsed = collapse_method_bodies(snippet);
            let text = prepared_snippet_text(node_type, name, file_path, &collapsed);
            match self.try_embed(&text) {
                Ok(v) => return Ok(v),
                Err(Attempt::Overflow) => {}
                Err(Attempt::Other(e)) => return Err(e),
            }
        }

        // 3. halve the snippet repeatedly until it fits or falls below the floor.
        let mut window = snippet;
        loop {
            let half_len = window.len() / 2;
            if half_len < MIN_SNIPPET_CHARS {
                break;
            }
            window = crate::parsing::parser::safe_truncate_str(window, half_len);
            let text = prepared_snippet_text(node_type, name, file_path, window);
            match self.try_embed(&text) {
                Ok(v) => return Ok(v),
                Err(Attempt::Overflow) => continue,
                Err(Attempt::Other(e)) => return Err(e),
            }
        }

        // 4. metadata-only fallback.
        let metadata_only = format!("// {node_type}: {name}\n// File: {file_path}");
        match self.try_embed(&metadata_only) {
            Ok(v) => Ok(v),
            Err(Attempt::Overflow) => Err(IndexPipelineError::EmbedOverflow {
                file: file_path.to_string(),
                name: name.to_string(),
            }),
            Err(Attempt::Other(e)) => Err(e),
        }
    }

    fn try_embed(&self, text: &str) -> Result<Vec<f32>, Attempt> {
        if text.chars().count() > OVERFLOW_THRESHOLD_CHARS {
            return Err(Attempt::Overflow);
        }
        let hash = crate::vector::compute_content_hash(text);
        if let Some(cached) = self.cache.get(&hash).map_err(|e| Attempt::Other(e.into()))? {
            return Ok(cached);
        }
        match self.embedder.embed(text) {
            Ok(vector) => {
                self.cache
                    .set(&hash, &vector)
                    .map_err(|e| Attempt::Other(e.into()))?;
                Ok(vector)
            }
            Err(e) if looks_like_overflow(&e) => Err(Attempt::Overflow),
            Err(e) => Err(Attempt::Other(e.into())),
        }
    }
}

enum Attempt {
    Overflow,
    Other(IndexPipelineError),
}

fn file_node(rel_path: &str, package: Option<&str>) -> Node {
    Node {
        id: rel_path.to_string(),
        node_type: "File".to_string(),
        name: rel_path.to_string(),
        package: package.map(str::to_string),
        module: None,
        file_path: rel_path.to_string(),
        start_line: 0,
        end_line: 0,
        exported: false,
        properties: json!({}),
    }
}

/// Node id for a declared symbol. `TypeAlias`/`Interface` carry a kind
/// segment (`"file:Kind:Name"`, spec §8 scenario 1's literal
/// `"test.ts:TypeAlias:Person"`/`"test.ts:Interface:User"`) so an
/// ALIAS_FOR/DERIVES_FROM edge's endpoints match the id the Node itself is
/// stored under; every other kind keeps the plain `"file:Name"` form.
fn symbol_node_id(rel_path: &str, symbol: &Symbol) -> String {
    match symbol.kind {
        SymbolKind::TypeAlias | SymbolKind::Interface => node_id(
            rel_path,
            Some(&format!("{}:{}", symbol.kind.node_type_str(), symbol.name)),
        ),
        _ => node_id(rel_path, Some(symbol.name.as_ref())),
    }
}

fn symbol_to_node(symbol: &Symbol, rel_path: &str, package: Option<&str>) -> Node {
    Node {
        id: symbol_node_id(rel_path, symbol),
        node_type: symbol.kind.node_type_str().to_string(),
        name: symbol.name.to_string(),
        package: package.map(str::to_string),
        module: symbol.as_module_path().map(str::to_string),
        file_path: rel_path.to_string(),
        start_line: symbol.range.start_line,
        end_line: symbol.range.end_line,
        exported: symbol.visibility == Visibility::Public,
        properties: json!({
            "signature": symbol.as_signature(),
            "docComment": symbol.as_doc_comment(),
        }),
    }
}

/// Resolve `import.path` (a TS/JS module specifier) relative to the
/// importing file, trying the extension variants a TypeScript project
/// commonly uses (source files imported with a `.js` specifier, or no
/// extension at all resolving to an `index` file).
fn resolve_relative_import(from_file: &Path, spec: &str, project_root: &Path) -> Option<String> {
    if !spec.starts_with('.') {
        return None; // bare/node_modules specifier: not our non-goal to resolve.
    }
    let dir = from_file.parent().unwrap_or_else(|| Path::new(""));
    let joined = dir.join(spec);
    let joined_str = joined.to_string_lossy().into_owned();

    let mut candidates: Vec<String> = Vec::new();
    for (from_ext, to_ext) in [("js", "ts"), ("jsx", "tsx")] {
        if let Some(stripped) = joined_str.strip_suffix(&format!(".{from_ext}")) {
            candidates.push(format!("{stripped}.{to_ext}"));
        }
    }
    candidates.push(joined_str.clone());
    for ext in ["ts", "tsx", "js", "jsx"] {
        candidates.push(format!("{joined_str}.{ext}"));
        candidates.push(format!("{joined_str}/index.{ext}"));
    }

    for candidate in candidates {
        let abs = project_root.join(&candidate);
        if abs.is_file() {
            return Some(normalize_path(Path::new(&candidate)));
        }
    }
    None
}

const BARREL_CHASE_DEPTH: u8 = 3;

/// Best-effort bare/aliased import + barrel re-export resolution for
/// cross-file CALLS edges (spec §4's barrel re-export handling, §8
/// scenario 6). Tries every non-relative import specifier in the file
/// against the nearest enclosing tsconfig/jsconfig path-alias table, then
/// follows `export { X } from` / `export * from` re-exports up to depth
/// [`BARREL_CHASE_DEPTH`] to find the file that actually defines `callee`.
fn resolve_barrel_call_target(
    project_root: &Path,
    rel_path: &str,
    imports: &[crate::parsing::Import],
    callee: &str,
) -> Option<String> {
    let from_dir = project_root.join(Path::new(rel_path).parent().unwrap_or_else(|| Path::new("")));
    for import in imports {
        if import.path.starts_with('.') {
            continue;
        }
        if let Some(entry) = resolve_aliased_specifier(project_root, &from_dir, &import.path) {
            if let Some((target_file, target_name)) =
                chase_barrel(project_root, &entry, callee, BARREL_CHASE_DEPTH)
            {
                return Some(node_id(&target_file, Some(&target_name)));
            }
        }
    }
    None
}

/// Resolves a bare specifier (`@libs/ui`, `@/components/X`, ...) against the
/// nearest tsconfig/jsconfig path-alias table walking up from `from_dir` to
/// `project_root`, returning a project-relative file path.
fn resolve_aliased_specifier(project_root: &Path, from_dir: &Path, specifier: &str) -> Option<String> {
    let (resolver, config_dir) = load_path_alias_resolver_near(project_root, from_dir)?;
    for candidate in resolver.resolve_import(specifier) {
        for expanded in resolver.expand_extensions(&candidate) {
            let abs = config_dir.join(&expanded);
            if abs.is_file() {
                let rel = abs.strip_prefix(project_root).unwrap_or(&abs);
                return Some(normalize_path(rel));
            }
        }
    }
    None
}

/// Finds the nearest `tsconfig.json`/`jsconfig.json` at or above `start_dir`
/// (never above `project_root`) and compiles its path-alias table. Returns
/// the resolver plus the directory its `baseUrl`/relative paths resolve
/// against, so callers can honor "path-alias rules are evaluated in the
/// re-exported file's owning package" (spec §4) by re-deriving the resolver
/// from each barrel hop's own directory.
fn load_path_alias_resolver_near(
    project_root: &Path,
    start_dir: &Path,
) -> Option<(
    crate::parsing::typescript::tsconfig::PathAliasResolver,
    std::path::PathBuf,
)> {
    let mut dir = start_dir.to_path_buf();
    loop {
        for name in ["tsconfig.json", "jsconfig.json"] {
            let candidate = dir.join(name);
            if candidate.is_file() {
                let mut visited = std::collections::HashSet::new();
                if let Ok(config) =
                    crate::parsing::typescript::tsconfig::resolve_extends_chain(&candidate, &mut visited)
                {
                    if let Ok(resolver) =
                        crate::parsing::typescript::tsconfig::PathAliasResolver::from_tsconfig(&config)
                    {
                        return Some((resolver, dir.clone()));
                    }
                }
            }
        }
        if dir == project_root || !dir.pop() {
            break;
        }
    }
    None
}

/// Follows barrel re-exports for `symbol_name` starting at `entry_file`
/// (project-relative), up to `depth` hops. Returns the project-relative file
/// that actually defines the symbol, and the name it is declared under
/// there (differs from `symbol_name` only when a hop renames it via
/// `export { X as Y } from`).
///
/// Re-export specifiers are recovered with a raw-text scan rather than
/// through [`LanguageParser::find_imports`], which records only a re-export
/// statement's module path, not which identifiers it re-exports.
fn chase_barrel(
    project_root: &Path,
    entry_file: &str,
    symbol_name: &str,
    depth: u8,
) -> Option<(String, String)> {
    let abs = project_root.join(entry_file);
    let content = std::fs::read_to_string(&abs).ok()?;

    if let Some(defined_name) = declared_symbol_name(&content, symbol_name) {
        return Some((entry_file.to_string(), defined_name));
    }
    if depth == 0 {
        return None;
    }

    let entry_path = Path::new(entry_file);
    for (target_spec, next_name) in named_reexport_targets(&content, symbol_name) {
        if let Some(target) = resolve_reexport_specifier(project_root, entry_path, &target_spec) {
            if let Some(found) = chase_barrel(project_root, &target, &next_name, depth - 1) {
                return Some(found);
            }
        }
    }
    for target_spec in glob_reexport_targets(&content) {
        if let Some(target) = resolve_reexport_specifier(project_root, entry_path, &target_spec) {
            if let Some(found) = chase_barrel(project_root, &target, symbol_name, depth - 1) {
                return Some(found);
            }
        }
    }
    None
}

fn resolve_reexport_specifier(project_root: &Path, from_file: &Path, spec: &str) -> Option<String> {
    if spec.starts_with('.') {
        resolve_relative_import(from_file, spec, project_root)
    } else {
        let from_dir = project_root.join(from_file.parent().unwrap_or_else(|| Path::new("")));
        resolve_aliased_specifier(project_root, &from_dir, spec)
    }
}

/// True when `content` declares `name` directly (`export function/class/
/// interface/type/const/...`) or locally re-exports it (`export { name };`,
/// no `from` clause); returns the name it is actually declared under (differs
/// from `name` for `export { Foo as name };`).
fn declared_symbol_name(content: &str, name: &str) -> Option<String> {
    let direct = Regex::new(&format!(
        r"export\s+(?:default\s+)?(?:async\s+)?(?:function\*?|class|interface|type|const|let|var|enum|namespace)\s+{}\b",
        regex::escape(name)
    ))
    .ok()?;
    if direct.is_match(content) {
        return Some(name.to_string());
    }
    let local_export = Regex::new(r"export\s*\{([^}]*)\}\s*;").ok()?;
    for caps in local_export.captures_iter(content) {
        if let Some(orig) = specifier_list_has(&caps[1], name) {
            return Some(orig);
        }
    }
    None
}

/// `export { A, B as C } from "spec"` statements that re-export `name`,
/// paired with the name to look for in `spec` (the pre-`as` original).
fn named_reexport_targets(content: &str, name: &str) -> Vec<(String, String)> {
    let Ok(re) = Regex::new(r#"export\s*\{([^}]*)\}\s*from\s*["']([^"']+)["']"#) else {
        return Vec::new();
    };
    re.captures_iter(content)
        .filter_map(|caps| specifier_list_has(&caps[1], name).map(|orig| (caps[2].to_string(), orig)))
        .collect()
}

/// `export * from "spec"` statements, spec §4's depth-3 fallback chase.
fn glob_reexport_targets(content: &str) -> Vec<String> {
    let Ok(re) = Regex::new(r#"export\s*\*\s*from\s*["']([^"']+)["']"#) else {
        return Vec::new();
    };
    re.captures_iter(content).map(|caps| caps[1].to_string()).collect()
}

/// Matches `name` (possibly under a `Foo as name` alias) inside a
/// `{ A, B as C }` specifier list; returns the pre-`as` original name.
fn specifier_list_has(list: &str, name: &str) -> Option<String> {
    list.split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .find_map(|entry| {
            let tokens: Vec<&str> = entry.split_whitespace().collect();
            let (original, exported) = match tokens.as_slice() {
                [orig, "as", alias] => (*orig, *alias),
                [only] => (*only, *only),
                _ => return None,
            };
            (exported == name).then(|| original.to_string())
        })
}

/// Same-file CALLS/EXTENDS/IMPLEMENTS/USES_TYPE/DEFINES edges, plus the
/// best-effort cross-file CALLS fallback documented on [`IndexPipeline`].
fn resolve_same_file_edges(
    symbols: &[Symbol],
    rel_path: &str,
    relative_import_targets: &[String],
    parser: &mut dyn LanguageParser,
    code: &str,
    project_root: &Path,
    imports: &[crate::parsing::Import],
) -> Vec<Edge> {
    let local: std::collections::HashMap<&str, &Symbol> =
        symbols.iter().map(|s| (s.name.as_ref(), s)).collect();
    let mut edges = Vec::new();

    let make_edge = |source: String, target: String, kind: RelationKind, is_type_only: bool| Edge {
        source,
        target,
        kind,
        call_count: Some(1),
        is_type_only: Some(is_type_only),
        imported_symbols: None,
        context: None,
    };

    for (caller, callee, _range) in parser.find_calls(code) {
        let Some(caller_symbol) = local.get(caller) else { continue };
        let source = symbol_node_id(rel_path, caller_symbol);
        if let Some(callee_symbol) = local.get(callee) {
            let target = symbol_node_id(rel_path, callee_symbol);
            push_or_merge_call(&mut edges, source, target);
        } else if let Some(target_file) = relative_import_targets.first() {
            let target = node_id(target_file, Some(callee));
            push_or_merge_call(&mut edges, source, target);
        } else if let Some(target) = resolve_barrel_call_target(project_root, rel_path, imports, callee) {
            push_or_merge_call(&mut edges, source, target);
        }
    }

    for (derived, base, _range) in parser.find_extends(code) {
        if let (Some(a), Some(b)) = (local.get(derived), local.get(base)) {
            edges.push(make_edge(
                symbol_node_id(rel_path, a),
                symbol_node_id(rel_path, b),
                RelationKind::Extends,
                false,
            ));
        }
    }

    for (implementor, iface, _range) in parser.find_implementations(code) {
        if let (Some(a), Some(b)) = (local.get(implementor), local.get(iface)) {
            edges.push(make_edge(
                symbol_node_id(rel_path, a),
                symbol_node_id(rel_path, b),
                RelationKind::Implements,
                false,
            ));
        }
    }

    for (context_name, used_type, _range) in parser.find_uses(code) {
        if let (Some(a), Some(b)) = (local.get(context_name), local.get(used_type)) {
            edges.push(make_edge(
                symbol_node_id(rel_path, a),
                symbol_node_id(rel_path, b),
                RelationKind::UsesType,
                true,
            ));
        }
    }

    for (definer, method, _range) in parser.find_defines(code) {
        if let (Some(a), Some(b)) = (local.get(definer), local.get(method)) {
            edges.push(make_edge(
                symbol_node_id(rel_path, a),
                symbol_node_id(rel_path, b),
                RelationKind::Defines,
                false,
            ));
        }
    }

    for type_edge in parser.find_type_alias_edges(code) {
        let Some(alias_symbol) = local.get(type_edge.alias.as_str()) else { continue };
        let target = match &type_edge.target {
            crate::parsing::TypeAliasTarget::Named(name) => match local.get(name.as_str()) {
                Some(sym) => symbol_node_id(rel_path, sym),
                // Unresolved local reference (cross-file alias targets are out of
                // scope, see module doc): skip rather than guess.
                None => continue,
            },
            crate::parsing::TypeAliasTarget::Synthetic(printed) => {
                node_id(rel_path, Some(&format!("SyntheticType:{printed}")))
            }
        };
        edges.push(make_edge(
            symbol_node_id(rel_path, alias_symbol),
            target,
            type_edge.kind,
            false,
        ));
    }

    edges
}

fn push_or_merge_call(edges: &mut Vec<Edge>, source: String, target: String) {
    if let Some(existing) = edges
        .iter_mut()
        .find(|e| e.kind == RelationKind::Calls && e.source == source && e.target == target)
    {
        existing.call_count = Some(existing.call_count.unwrap_or(0) + 1);
        return;
    }
    edges.push(Edge {
        source,
        target,
        kind: RelationKind::Calls,
        call_count: Some(1),
        is_type_only: Some(false),
        imported_symbols: None,
        context: None,
    });
}

fn prepared_snippet(symbol: &Symbol, file_path: &str, snippet: &str) -> String {
    prepared_snippet_text(symbol.kind.node_type_str(), symbol.name.as_ref(), file_path, snippet)
}

fn prepared_snippet_text(node_type: &str, name: &str, file_path: &str, snippet: &str) -> String {
    format!("// {node_type}: {name}\n// File: {file_path}\n\n{snippet}")
}

fn extract_snippet(code: &str, range: &Range) -> String {
    let lines: Vec<&str> = code.lines().collect();
    let start = range.start_line as usize;
    let end = (range.end_line as usize).min(lines.len().saturating_sub(1));
    if start >= lines.len() {
        return String::new();
    }
    if start == end {
        let line = lines[start];
        let s = (range.start_column as usize).min(line.len());
        let e = (range.end_column as usize).min(line.len()).max(s);
        return line[s..e].to_string();
    }
    let mut out = String::new();
    for (i, line) in lines[start..=end].iter().enumerate() {
        let idx = start + i;
        if idx == start {
            let s = (range.start_column as usize).min(line.len());
            out.push_str(&line[s..]);
        } else if idx == end {
            let e = (range.end_column as usize).min(line.len());
            out.push_str(&line[..e]);
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

/// Replace every method/function body in `snippet` with `{ ... }` (spec
/// §4.10 step 2). A body start is a `{` whose preceding non-whitespace text
/// ends with `)`, a return-type annotation (`): Type`), or `=>`.
fn collapse_method_bodies(snippet: &str) -> String {
    let body_start = Regex::new(r"(\)|\)\s*:\s*[A-Za-z_][A-Za-z0-9_<>\[\],.\s]*|=>)\s*\{").unwrap();

    let mut out = String::with_capacity(snippet.len());
    let mut last_end = 0;
    let bytes = snippet.as_bytes();

    for m in body_start.find_iter(snippet) {
        if m.end() < last_end {
            continue;
        }
        let open_brace = m.end() - 1;
        // Find the matching closing brace by depth counting.
        let mut depth = 0i32;
        let mut close = None;
        for (i, &b) in bytes.iter().enumerate().skip(open_brace) {
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(close) = close else { continue };
        out.push_str(&snippet[last_end..=open_brace]);
        out.push_str(" ... }");
        last_end = close + 1;
    }
    out.push_str(&snippet[last_end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FileId, SymbolKind};

    #[test]
    fn collapse_method_bodies_replaces_function_body() {
        let src = "class Foo {\n  bar(): void {\n    doWork();\n  }\n}";
        let collapsed = collapse_method_bodies(src);
        assert!(collapsed.contains("bar(): void { ... }"));
        assert!(!collapsed.contains("doWork"));
    }

    #[test]
    fn collapse_method_bodies_handles_arrow_functions() {
        let src = "const f = () => {\n  return 1;\n};";
        let collapsed = collapse_method_bodies(src);
        assert!(collapsed.contains("() => { ... }"));
    }

    #[test]
    fn extract_snippet_single_line() {
        let code = "function foo() { return 1; }";
        let range = Range::new(0, 0, 0, code.len() as u16);
        assert_eq!(extract_snippet(code, &range), code);
    }

    #[test]
    fn resolve_relative_import_finds_ts_sibling() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.ts"), "export function helper() {}").unwrap();
        let from = Path::new("a.ts");
        let resolved = resolve_relative_import(from, "./b.js", dir.path());
        assert_eq!(resolved.as_deref(), Some("b.ts"));
    }

    #[test]
    fn symbol_to_node_marks_public_visibility_exported() {
        let symbol = Symbol::new(
            crate::types::SymbolId::new(1).unwrap(),
            "helper",
            SymbolKind::Function,
            FileId::new(1).unwrap(),
            Range::new(0, 0, 0, 10),
        )
        .with_visibility(Visibility::Public);
        let node = symbol_to_node(&symbol, "b.ts", None);
        assert!(node.exported);
        assert_eq!(node.id, "b.ts:helper");
    }

    #[test]
    fn type_alias_edges_cover_direct_intersection_and_array_wrapper() {
        use crate::parsing::typescript::TypeScriptParser;

        let code = r#"
interface User { name: string }
type Person = User;
type ID = string;
type Customer = User & { id: string };
type Users = Array<User>;
"#;
        let mut parser: Box<dyn LanguageParser> = Box::new(TypeScriptParser::new().unwrap());
        let mut counter = SymbolCounter::new();
        let file_id = FileId::new(1).unwrap();
        let symbols = parser.parse(code, file_id, &mut counter);

        let project_root = tempfile::tempdir().unwrap();
        let edges = resolve_same_file_edges(
            &symbols,
            "test.ts",
            &[],
            parser.as_mut(),
            code,
            project_root.path(),
            &[],
        );

        assert!(edges.iter().any(|e| e.source == "test.ts:TypeAlias:Person"
            && e.target == "test.ts:Interface:User"
            && e.kind == RelationKind::AliasFor));
        assert!(!edges.iter().any(|e| e.source == "test.ts:TypeAlias:ID"));
        assert!(edges.iter().any(|e| e.source == "test.ts:TypeAlias:Customer"
            && e.target == "test.ts:Interface:User"
            && e.kind == RelationKind::DerivesFrom));
        assert!(edges.iter().any(|e| e.source == "test.ts:TypeAlias:Users"
            && e.target == "test.ts:Interface:User"
            && e.kind == RelationKind::AliasFor));
    }

    #[test]
    fn barrel_reexport_through_path_alias_resolves_to_definition_site() {
        let root = tempfile::tempdir().unwrap();
        let root = root.path();

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
            "export function LoadingWrapper() {}",
        )
        .unwrap();

        std::fs::create_dir_all(root.join("apps/web/src")).unwrap();
        let code = r#"
import { LoadingWrapper } from "@libs/ui";
function Page() { LoadingWrapper(); }
"#;
        std::fs::write(root.join("apps/web/src/page.ts"), code).unwrap();

        use crate::parsing::typescript::TypeScriptParser;
        let mut parser: Box<dyn LanguageParser> = Box::new(TypeScriptParser::new().unwrap());
        let mut counter = SymbolCounter::new();
        let file_id = FileId::new(1).unwrap();
        let symbols = parser.parse(code, file_id, &mut counter);
        let imports = parser.find_imports(code, file_id);

        let edges = resolve_same_file_edges(
            &symbols,
            "apps/web/src/page.ts",
            &[],
            parser.as_mut(),
            code,
            root,
            &imports,
        );

        assert!(edges.iter().any(|e| {
            e.kind == RelationKind::Calls
                && e.source == "apps/web/src/page.ts:Page"
                && e.target
                    == "libs/ui/src/components/LoadingWrapper/LoadingWrapper.ts:LoadingWrapper"
        }));
    }
}
