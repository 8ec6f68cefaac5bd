//! Configuration for the indexing/query engine.
//!
//! Layered the teacher's way: defaults, then a TOML file, then environment
//! variables, via `figment`. Recognizes the options named in the external
//! interface (`packages`, `storage`, `watch`) plus the ambient indexing and
//! MCP settings every run needs.
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CODETRACE_` and use double
//! underscores to separate nested levels:
//! - `CODETRACE_WATCH__DEBOUNCE_INTERVAL=500` sets `watch.debounce_interval`
//! - `CODETRACE_MCP__PORT=9999` sets `mcp.port`

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide debug flag, set once by `--debug`/`CODETRACE_DEBUG` at
/// startup and read from parser/behavior code far from any `Settings`
/// value, via `debug_print!`.
static GLOBAL_DEBUG: AtomicBool = AtomicBool::new(false);

pub fn set_global_debug_enabled(enabled: bool) {
    GLOBAL_DEBUG.store(enabled, Ordering::Relaxed);
}

pub fn is_global_debug_enabled() -> bool {
    GLOBAL_DEBUG.load(Ordering::Relaxed)
}

/// Print a debug line, gated on the global debug flag, from parser and
/// behavior code that has no direct handle to `Settings`. The leading
/// expression is conventionally `self`, kept for readability at call
/// sites even though the message doesn't reference it.
#[macro_export]
macro_rules! debug_print {
    ($self:expr, $($arg:tt)*) => {{
        let _ = &$self;
        if $crate::config::is_global_debug_enabled() {
            eprintln!($($arg)*);
        }
    }};
}

/// Name of the cache directory created by `init` and used by every other
/// subcommand (`graph.db`, `manifest.json`, `embedding-cache/`, `server.json`,
/// `server.lock` all live under it — see §6).
pub const CACHE_DIR_NAME: &str = ".codetrace";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory holding `graph.db`, `manifest.json`, etc. Relative to the
    /// workspace root unless absolute.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Non-empty in a multi-package workspace; each entry names a package
    /// root and the compiler-options file (tsconfig.json/jsconfig.json)
    /// that governs path-alias resolution for it.
    #[serde(default)]
    pub packages: Vec<PackageConfig>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub languages: HashMap<String, LanguageConfig>,

    #[serde(default)]
    pub mcp: McpConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PackageConfig {
    pub name: String,
    pub tsconfig: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    Sqlite { path: Option<PathBuf> },
    Memgraph {
        host: Option<String>,
        port: Option<u16>,
        username: Option<String>,
        password: Option<String>,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite { path: None }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct WatchConfig {
    #[serde(default)]
    pub polling: bool,
    #[serde(default)]
    pub polling_interval: Option<u64>,
    #[serde(default)]
    pub debounce: bool,
    #[serde(default)]
    pub debounce_interval: Option<u64>,
    #[serde(default)]
    pub exclude_directories: Vec<String>,
    #[serde(default)]
    pub exclude_files: Vec<String>,
    #[serde(default)]
    pub silent: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("watch.polling and watch.debounce are mutually exclusive")]
    PollingAndDebounceBothSet,
    #[error("watch.{field} must be non-negative")]
    NegativeInterval { field: &'static str },
    #[error("storage.port must be non-negative")]
    NegativePort,
}

impl WatchConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.polling && self.debounce {
            return Err(ConfigValidationError::PollingAndDebounceBothSet);
        }
        Ok(())
    }

    /// Effective debounce window, defaulting to the teacher's own
    /// `Debouncer` default when unset.
    pub fn debounce_interval_ms(&self) -> u64 {
        self.debounce_interval.unwrap_or(300)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexingConfig {
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default = "default_true")]
    pub include_tests: bool,
    #[serde(default = "default_false")]
    pub include_docs: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LanguageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub parser_options: HashMap<String, serde_json::Value>,
    /// tsconfig.json/jsconfig.json files this language's provider reads.
    #[serde(default)]
    pub config_files: Vec<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct McpConfig {
    #[serde(default = "default_mcp_port")]
    pub port: u16,
    #[serde(default = "default_max_context_size")]
    pub max_context_size: usize,
    #[serde(default = "default_false")]
    pub debug: bool,
}

/// `[logging]` table: a default level plus per-module overrides, consumed
/// by `crate::logging::init_with_config`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub default: String,
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_version() -> u32 {
    1
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from(CACHE_DIR_NAME)
}
fn default_parallel_threads() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_mcp_port() -> u16 {
    7777
}
fn default_max_context_size() -> usize {
    100_000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            cache_dir: default_cache_dir(),
            packages: Vec::new(),
            storage: StorageConfig::default(),
            watch: WatchConfig::default(),
            indexing: IndexingConfig::default(),
            languages: default_languages(),
            mcp: McpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            parallel_threads: default_parallel_threads(),
            ignore_patterns: vec![
                "node_modules/**".to_string(),
                ".git/**".to_string(),
                "dist/**".to_string(),
                "*.generated.*".to_string(),
            ],
            include_tests: true,
            include_docs: false,
        }
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            port: default_mcp_port(),
            max_context_size: default_max_context_size(),
            debug: false,
        }
    }
}

fn default_languages() -> HashMap<String, LanguageConfig> {
    let mut langs = HashMap::new();
    langs.insert(
        "typescript".to_string(),
        LanguageConfig {
            enabled: true,
            extensions: vec!["ts".to_string(), "tsx".to_string()],
            parser_options: HashMap::new(),
            config_files: vec![PathBuf::from("tsconfig.json")],
        },
    );
    langs.insert(
        "javascript".to_string(),
        LanguageConfig {
            enabled: true,
            extensions: vec!["js".to_string(), "jsx".to_string(), "mjs".to_string(), "cjs".to_string()],
            parser_options: HashMap::new(),
            config_files: vec![PathBuf::from("jsconfig.json")],
        },
    );
    langs
}

impl Settings {
    pub fn load() -> Result<Self, figment::Error> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CACHE_DIR_NAME).join("settings.toml"));
        Self::load_from(config_path)
    }

    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CACHE_DIR_NAME);
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }
        None
    }

    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, figment::Error> {
        let settings: Settings = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("CODETRACE_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()?;
        settings
            .watch
            .validate()
            .map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(settings)
    }

    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        for ancestor in current.ancestors() {
            if ancestor.join(CACHE_DIR_NAME).is_dir() {
                return Some(ancestor.to_path_buf());
            }
        }
        None
    }

    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("invalid path")?;
        std::fs::create_dir_all(parent)?;
        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CACHE_DIR_NAME).join("settings.toml");
        if !force && config_path.exists() {
            return Err("configuration file already exists, use --force to overwrite".into());
        }
        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_settings_enable_typescript_and_javascript() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert!(settings.languages["typescript"].enabled);
        assert!(settings.languages["javascript"].enabled);
    }

    #[test]
    fn load_from_toml_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        std::fs::write(
            &config_path,
            r#"
version = 1

[[packages]]
name = "app"
tsconfig = "tsconfig.json"

[watch]
debounce = true
debounce_interval = 500

[mcp]
port = 8888
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.packages.len(), 1);
        assert_eq!(settings.packages[0].name, "app");
        assert!(settings.watch.debounce);
        assert_eq!(settings.watch.debounce_interval_ms(), 500);
        assert_eq!(settings.mcp.port, 8888);
    }

    #[test]
    fn polling_and_debounce_together_is_rejected() {
        let mut watch = WatchConfig::default();
        watch.polling = true;
        watch.debounce = true;
        assert!(watch.validate().is_err());
    }

    #[test]
    fn save_then_load_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let mut settings = Settings::default();
        settings.mcp.port = 9999;
        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.mcp.port, 9999);
    }
}
