//! The trait each language-specific project-resolution provider implements.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::Settings;

use super::{ResolutionResult, Sha256Hash};

/// A source of project-level path resolution rules (tsconfig/jsconfig
/// `baseUrl`+`paths`, barrel re-exports) for one language.
pub trait ProjectResolutionProvider {
    /// Stable identifier matching `[languages.<id>]` in config (§1a).
    fn language_id(&self) -> &'static str;

    /// Whether this language is enabled given the current settings.
    fn is_enabled(&self, settings: &Settings) -> bool;

    /// Config files (tsconfig.json, jsconfig.json, ...) this provider
    /// reads resolution rules from, per settings.
    fn config_paths(&self, settings: &Settings) -> Vec<PathBuf>;

    /// SHA-256 of each existing config file, for invalidation detection.
    fn compute_shas(&self, configs: &[PathBuf]) -> ResolutionResult<HashMap<PathBuf, Sha256Hash>>;

    /// Re-parse any config file whose SHA has changed and persist the
    /// resulting resolution rules.
    fn rebuild_cache(&self, settings: &Settings) -> ResolutionResult<()>;

    /// Files/directories that should be re-extracted after a config
    /// change (the sync engine folds these into its `stale` set).
    fn select_affected_files(&self, settings: &Settings) -> Vec<PathBuf>;
}
