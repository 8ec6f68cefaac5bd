//! Generic resolution scaffolding shared by every language: import
//! records, scope bookkeeping, and the symbol-cache interface the
//! pipeline's resolve stage queries against. Each language builds its own
//! `ResolutionScope`/`InheritanceResolver` (see `javascript::resolution`,
//! `typescript::resolution`) but falls back to the `Generic*` types here
//! when it has nothing special to add.

use std::any::Any;
use std::collections::HashMap;

use crate::relationship::RelationKind;
use crate::types::{CompactString, Range};
use crate::{FileId, SymbolId};

use super::registry::LanguageId;
use super::language_behavior::default_relationship_compatibility;

/// One `import`/`require` statement as extracted from source, independent
/// of whether it ultimately resolves to a project file or an external
/// package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub path: String,
    pub file_id: FileId,
    pub alias: Option<String>,
    pub is_glob: bool,
    pub is_type_only: bool,
}

/// The level at which a binding is visible for name resolution, from
/// innermost to outermost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeLevel {
    Local,
    Module,
    Package,
    Global,
}

/// Kind of lexical scope pushed/popped while walking a file's AST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeType {
    Global,
    Module,
    /// `hoisting: true` for `function`-declaration scopes (var hoists to
    /// here); `false` for arrow/method scopes (no var hoisting).
    Function { hoisting: bool },
    Block,
    Class,
}

impl ScopeType {
    pub fn function() -> Self {
        ScopeType::Function { hoisting: false }
    }

    pub fn hoisting_function() -> Self {
        ScopeType::Function { hoisting: true }
    }
}

/// Whether a resolved import target lives in this project or outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOrigin {
    Internal,
    External,
    Unknown,
}

/// A resolved binding introduced by an import: which name it exposes in
/// the importing file's scope, and what it was found to point at.
#[derive(Debug, Clone)]
pub struct ImportBinding {
    pub import: Import,
    pub exposed_name: String,
    pub origin: ImportOrigin,
    pub resolved_symbol: Option<SymbolId>,
}

/// Language-specific scope tracking during symbol resolution. Each
/// language implements this to encode its own hoisting, shadowing and
/// relationship-compatibility rules.
pub trait ResolutionScope: Send + Sync {
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn add_symbol(&mut self, name: String, symbol_id: SymbolId, scope_level: ScopeLevel);
    fn resolve(&self, name: &str) -> Option<SymbolId>;
    fn clear_local_scope(&mut self);
    fn enter_scope(&mut self, scope_type: ScopeType);
    fn exit_scope(&mut self);
    fn symbols_in_scope(&self) -> Vec<(String, SymbolId, ScopeLevel)>;

    fn resolve_relationship(
        &self,
        from_name: &str,
        to_name: &str,
        kind: RelationKind,
        from_file: FileId,
    ) -> Option<SymbolId>;

    fn is_compatible_relationship(
        &self,
        from_kind: crate::SymbolKind,
        to_kind: crate::SymbolKind,
        rel_kind: RelationKind,
    ) -> bool;

    fn populate_imports(&mut self, imports: &[Import]);
    fn register_import_binding(&mut self, binding: ImportBinding);
    fn import_binding(&self, name: &str) -> Option<ImportBinding>;
}

/// Language-specific type-hierarchy tracking: `extends`/`implements`
/// edges, method lookup across the chain, and subtype checks.
pub trait InheritanceResolver: Send + Sync {
    fn add_inheritance(&mut self, child: String, parent: String, kind: &str);
    fn resolve_method(&self, type_name: &str, method_name: &str) -> Option<String>;
    fn get_inheritance_chain(&self, type_name: &str) -> Vec<String>;
    fn is_subtype(&self, child: &str, parent: &str) -> bool;
    fn add_type_methods(&mut self, type_name: String, methods: Vec<String>);
    fn get_all_methods(&self, type_name: &str) -> Vec<String>;
}

/// Project-level import enhancement (tsconfig/jsconfig path aliases,
/// barrel re-exports). Optional: languages with no project-level
/// resolution rules never construct one.
pub trait ProjectResolutionEnhancer: Send + Sync {
    fn enhance_import_path(&self, import_path: &str, from_file: FileId) -> Option<String>;
    fn get_import_candidates(&self, import_path: &str, from_file: FileId) -> Vec<String>;
}

/// Outcome of a `PipelineSymbolCache::resolve` lookup.
#[derive(Debug, Clone)]
pub enum ResolveResult {
    Found(SymbolId),
    Ambiguous(Vec<SymbolId>),
    NotFound,
}

/// Identity of the file (and, when known, the calling symbol) performing a
/// resolution lookup, passed to `PipelineSymbolCache::resolve` so
/// multi-tier (same-file / same-module / cross-language) visibility rules
/// can apply.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub file_id: FileId,
    pub module_path: Option<CompactString>,
    pub language_id: LanguageId,
}

impl CallerContext {
    pub fn new(file_id: FileId, module_path: Option<CompactString>, language_id: LanguageId) -> Self {
        Self { file_id, module_path, language_id }
    }

    pub fn from_file(file_id: FileId, language_id: LanguageId) -> Self {
        Self { file_id, module_path: None, language_id }
    }

    /// Whether `module_path` names the same module this caller belongs to.
    /// A caller with no known module path is only ever "same module" as
    /// another symbol with no module path either.
    pub fn is_same_module(&self, module_path: Option<&str>) -> bool {
        self.module_path.as_deref() == module_path
    }
}

/// Read-only view of the symbol set a pipeline worker needs during the
/// parallel RESOLVE stage — no `DocumentIndex`/Tantivy access, just
/// whatever the CONTEXT stage already collected in memory.
pub trait PipelineSymbolCache: Send + Sync {
    fn lookup_candidates(&self, name: &str) -> Vec<SymbolId>;
    fn get(&self, id: SymbolId) -> Option<crate::Symbol>;
    fn symbols_in_file(&self, file_id: FileId) -> Vec<SymbolId>;
    fn resolve(
        &self,
        name: &str,
        caller: &CallerContext,
        to_range: Option<&Range>,
        imports: &[Import],
    ) -> ResolveResult;
}

/// Scope-level bookkeeping any language can use as-is: last-write-wins
/// per level, resolved innermost-first, with the universal relationship
/// compatibility rules. Languages with hoisting, namespaces or qualified
/// (`A.b`) lookup build their own context instead (see
/// `javascript::resolution::JavaScriptResolutionContext`).
pub struct GenericResolutionContext {
    #[allow(dead_code)]
    file_id: FileId,
    local: HashMap<String, SymbolId>,
    module: HashMap<String, SymbolId>,
    package: HashMap<String, SymbolId>,
    global: HashMap<String, SymbolId>,
    scope_stack: Vec<ScopeType>,
    imports: Vec<Import>,
    import_bindings: HashMap<String, ImportBinding>,
}

impl GenericResolutionContext {
    pub fn new(file_id: FileId) -> Self {
        Self {
            file_id,
            local: HashMap::new(),
            module: HashMap::new(),
            package: HashMap::new(),
            global: HashMap::new(),
            scope_stack: Vec::new(),
            imports: Vec::new(),
            import_bindings: HashMap::new(),
        }
    }
}

impl ResolutionScope for GenericResolutionContext {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn add_symbol(&mut self, name: String, symbol_id: SymbolId, scope_level: ScopeLevel) {
        match scope_level {
            ScopeLevel::Local => self.local.insert(name, symbol_id),
            ScopeLevel::Module => self.module.insert(name, symbol_id),
            ScopeLevel::Package => self.package.insert(name, symbol_id),
            ScopeLevel::Global => self.global.insert(name, symbol_id),
        };
    }

    fn resolve(&self, name: &str) -> Option<SymbolId> {
        self.local
            .get(name)
            .or_else(|| self.module.get(name))
            .or_else(|| self.package.get(name))
            .or_else(|| self.global.get(name))
            .copied()
    }

    fn clear_local_scope(&mut self) {
        self.local.clear();
    }

    fn enter_scope(&mut self, scope_type: ScopeType) {
        self.scope_stack.push(scope_type);
    }

    fn exit_scope(&mut self) {
        self.scope_stack.pop();
        if matches!(self.scope_stack.last(), None | Some(ScopeType::Module | ScopeType::Global)) {
            self.clear_local_scope();
        }
    }

    fn symbols_in_scope(&self) -> Vec<(String, SymbolId, ScopeLevel)> {
        let mut out = Vec::new();
        for (n, &id) in &self.local {
            out.push((n.clone(), id, ScopeLevel::Local));
        }
        for (n, &id) in &self.module {
            out.push((n.clone(), id, ScopeLevel::Module));
        }
        for (n, &id) in &self.package {
            out.push((n.clone(), id, ScopeLevel::Package));
        }
        for (n, &id) in &self.global {
            out.push((n.clone(), id, ScopeLevel::Global));
        }
        out
    }

    fn resolve_relationship(
        &self,
        _from_name: &str,
        to_name: &str,
        _kind: RelationKind,
        _from_file: FileId,
    ) -> Option<SymbolId> {
        self.resolve(to_name)
    }

    fn is_compatible_relationship(
        &self,
        from_kind: crate::SymbolKind,
        to_kind: crate::SymbolKind,
        rel_kind: RelationKind,
    ) -> bool {
        default_relationship_compatibility(from_kind, to_kind, rel_kind)
    }

    fn populate_imports(&mut self, imports: &[Import]) {
        self.imports = imports.to_vec();
    }

    fn register_import_binding(&mut self, binding: ImportBinding) {
        self.import_bindings.insert(binding.exposed_name.clone(), binding);
    }

    fn import_binding(&self, name: &str) -> Option<ImportBinding> {
        self.import_bindings.get(name).cloned()
    }
}

/// Single-inheritance-chain tracking for languages with nothing fancier
/// than "child extends parent".
#[derive(Default)]
pub struct GenericInheritanceResolver {
    parents: HashMap<String, String>,
    methods: HashMap<String, Vec<String>>,
}

impl GenericInheritanceResolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InheritanceResolver for GenericInheritanceResolver {
    fn add_inheritance(&mut self, child: String, parent: String, _kind: &str) {
        self.parents.insert(child, parent);
    }

    fn resolve_method(&self, type_name: &str, method_name: &str) -> Option<String> {
        if self.methods.get(type_name).is_some_and(|m| m.iter().any(|x| x == method_name)) {
            return Some(type_name.to_string());
        }
        let parent = self.parents.get(type_name)?;
        self.resolve_method(parent, method_name)
    }

    fn get_inheritance_chain(&self, type_name: &str) -> Vec<String> {
        let mut chain = vec![type_name.to_string()];
        let mut current = type_name.to_string();
        while let Some(parent) = self.parents.get(&current) {
            if chain.contains(parent) {
                break;
            }
            chain.push(parent.clone());
            current = parent.clone();
        }
        chain
    }

    fn is_subtype(&self, child: &str, parent: &str) -> bool {
        self.get_inheritance_chain(child).iter().skip(1).any(|a| a == parent)
    }

    fn add_type_methods(&mut self, type_name: String, methods: Vec<String>) {
        self.methods.entry(type_name).or_default().extend(methods);
    }

    fn get_all_methods(&self, type_name: &str) -> Vec<String> {
        let mut all = Vec::new();
        for t in self.get_inheritance_chain(type_name) {
            if let Some(methods) = self.methods.get(&t) {
                for m in methods {
                    if !all.contains(m) {
                        all.push(m.clone());
                    }
                }
            }
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileId;

    #[test]
    fn generic_context_resolves_innermost_first() {
        let mut ctx = GenericResolutionContext::new(FileId::new(1).unwrap());
        ctx.add_symbol("x".into(), SymbolId::new(1).unwrap(), ScopeLevel::Global);
        ctx.add_symbol("x".into(), SymbolId::new(2).unwrap(), ScopeLevel::Local);
        assert_eq!(ctx.resolve("x"), Some(SymbolId::new(2).unwrap()));
    }

    #[test]
    fn generic_inheritance_chain_and_subtype() {
        let mut resolver = GenericInheritanceResolver::new();
        resolver.add_inheritance("Dog".into(), "Animal".into(), "extends");
        resolver.add_type_methods("Animal".into(), vec!["speak".into()]);
        assert!(resolver.is_subtype("Dog", "Animal"));
        assert_eq!(resolver.resolve_method("Dog", "speak"), Some("Animal".into()));
        assert_eq!(resolver.get_all_methods("Dog"), vec!["speak".to_string()]);
    }
}
