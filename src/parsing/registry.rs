//! Language registry: the single place a supported language registers its
//! extensions, parser and behavior. Parallel to the teacher's per-language
//! `factory.rs` match arm, but data-driven so adding a language doesn't
//! require touching the factory itself.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::{IndexResult, Settings};

use super::language_behavior::LanguageBehavior;
use super::parser::LanguageParser;

/// Stable identifier for a supported language, e.g. `"typescript"`. Cheap
/// to copy and compare; backed by a `&'static str` rather than an enum so
/// new languages don't require changing every match over `Language`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LanguageId(&'static str);

impl LanguageId {
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for LanguageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Everything the registry needs to know about one supported language:
/// how to recognize its files and how to build its parser/behavior pair.
pub trait LanguageDefinition: Send + Sync {
    fn id(&self) -> LanguageId;
    fn name(&self) -> &'static str;
    fn extensions(&self) -> &'static [&'static str];
    fn create_parser(&self, settings: &Settings) -> IndexResult<Box<dyn LanguageParser>>;
    fn create_behavior(&self) -> Box<dyn LanguageBehavior>;

    /// Whether this language is on when a workspace has no explicit
    /// `languages.<id>` entry in `settings.toml`.
    fn default_enabled(&self) -> bool {
        true
    }

    fn is_enabled(&self, settings: &Settings) -> bool {
        settings
            .languages
            .get(self.id().as_str())
            .map(|config| config.enabled)
            .unwrap_or_else(|| self.default_enabled())
    }
}

/// Registry of every [`LanguageDefinition`] this build supports, indexed
/// both by id and by file extension for `Language::from_path` lookups.
#[derive(Default)]
pub struct LanguageRegistry {
    by_id: HashMap<LanguageId, Arc<dyn LanguageDefinition>>,
    by_extension: HashMap<&'static str, LanguageId>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: Arc<dyn LanguageDefinition>) {
        let id = definition.id();
        for ext in definition.extensions() {
            self.by_extension.insert(ext, id);
        }
        self.by_id.insert(id, definition);
    }

    pub fn get(&self, id: LanguageId) -> Option<&Arc<dyn LanguageDefinition>> {
        self.by_id.get(&id)
    }

    pub fn get_by_extension(&self, extension: &str) -> Option<&Arc<dyn LanguageDefinition>> {
        let id = self.by_extension.get(extension)?;
        self.by_id.get(id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn LanguageDefinition>> {
        self.by_id.values()
    }
}

static REGISTRY: OnceLock<Mutex<LanguageRegistry>> = OnceLock::new();

/// The process-wide registry, populated once with every built-in language.
pub fn get_registry() -> &'static Mutex<LanguageRegistry> {
    REGISTRY.get_or_init(|| {
        let mut registry = LanguageRegistry::new();
        super::javascript::register(&mut registry);
        super::typescript::register(&mut registry);
        Mutex::new(registry)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_typescript_by_extension() {
        let registry = get_registry();
        let registry = registry.lock().unwrap();
        let def = registry.get_by_extension("ts").expect("ts registered");
        assert_eq!(def.id().as_str(), "typescript");
    }

    #[test]
    fn registry_resolves_javascript_by_extension() {
        let registry = get_registry();
        let registry = registry.lock().unwrap();
        let def = registry.get_by_extension("jsx").expect("jsx registered");
        assert_eq!(def.id().as_str(), "javascript");
    }

    #[test]
    fn unknown_extension_is_none() {
        let registry = get_registry();
        let registry = registry.lock().unwrap();
        assert!(registry.get_by_extension("rb").is_none());
    }
}
