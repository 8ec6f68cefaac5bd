//! Parser factory for creating language-specific parsers
//!
//! Creates parsers and behaviors by going through the `LanguageRegistry`
//! rather than switching on `Language` directly, so a new language only
//! needs a `LanguageDefinition` + `register()` call, never a change here.

use std::sync::Arc;

use super::registry::{LanguageId, get_registry};
use super::{Language, LanguageBehavior, LanguageParser};
use crate::Settings;

/// Factory for creating language parsers and behaviors based on configuration
pub struct ParserFactory {
    settings: Arc<Settings>,
}

impl ParserFactory {
    /// Create a new parser factory with the given settings
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Create a parser for the specified language
    pub fn create_parser(&self, language: Language) -> Result<Box<dyn LanguageParser>, String> {
        self.create_parser_for_id(language.to_language_id())
    }

    /// Create a parser for a language id, looked up in the registry
    pub fn create_parser_for_id(
        &self,
        language_id: LanguageId,
    ) -> Result<Box<dyn LanguageParser>, String> {
        let registry = get_registry().lock().map_err(|e| e.to_string())?;
        let def = registry
            .get(language_id)
            .ok_or_else(|| format!("Language {language_id} is not registered"))?;

        if !def.is_enabled(&self.settings) {
            return Err(format!("Language {} is disabled in configuration", def.name()));
        }

        def.create_parser(&self.settings).map_err(|e| e.to_string())
    }

    /// Create the behavior for a registered language id, independent of a parser instance.
    pub fn create_behavior_from_registry(
        &self,
        language_id: LanguageId,
    ) -> Result<Box<dyn LanguageBehavior>, String> {
        let registry = get_registry().lock().map_err(|e| e.to_string())?;
        let def = registry
            .get(language_id)
            .ok_or_else(|| format!("Language {language_id} is not registered"))?;
        Ok(def.create_behavior())
    }

    /// Check if a language is enabled
    pub fn is_language_enabled(&self, language: Language) -> bool {
        let lang_key = language.config_key();
        self.settings
            .languages
            .get(lang_key)
            .map(|config| config.enabled)
            .unwrap_or(false)
    }

    /// Get all enabled languages
    pub fn enabled_languages(&self) -> Vec<Language> {
        let registry = match get_registry().lock() {
            Ok(r) => r,
            Err(_) => return Vec::new(),
        };
        registry
            .all()
            .filter(|def| def.is_enabled(&self.settings))
            .filter_map(|def| Language::from_language_id(def.id()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_typescript_parser() {
        let settings = Arc::new(Settings::default());
        let factory = ParserFactory::new(settings);

        let parser = factory.create_parser(Language::TypeScript);
        assert!(parser.is_ok());

        let parser = parser.unwrap();
        assert_eq!(parser.language(), Language::TypeScript);
    }

    #[test]
    fn test_disabled_language() {
        let mut settings = Settings::default();
        if let Some(config) = settings.languages.get_mut("typescript") {
            config.enabled = false;
        }

        let factory = ParserFactory::new(Arc::new(settings));
        let result = factory.create_parser(Language::TypeScript);

        assert!(result.is_err());
        if let Err(err_msg) = result {
            assert!(err_msg.contains("disabled"));
        }
    }

    #[test]
    fn test_enabled_languages_includes_javascript_and_typescript() {
        let settings = Arc::new(Settings::default());
        let factory = ParserFactory::new(settings);

        let enabled = factory.enabled_languages();
        assert!(enabled.contains(&Language::JavaScript));
        assert!(enabled.contains(&Language::TypeScript));
    }
}
