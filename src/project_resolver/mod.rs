//! The ProjectRegistry component: workspace/path-alias/barrel re-export
//! resolution for TypeScript/JavaScript projects (tsconfig.json /
//! jsconfig.json `baseUrl` + `paths`), with SHA-256-based cache
//! invalidation so a config file is only re-parsed when it actually
//! changes.

pub mod helpers;
pub mod memo;
pub mod persist;
pub mod provider;
pub mod providers;
pub mod sha;

pub use memo::ResolutionMemo;
pub use persist::{ResolutionIndex, ResolutionPersistence, ResolutionRules};
pub use provider::ProjectResolutionProvider;
pub use providers::JavaScriptProvider;
pub use sha::{Sha256Hash, compute_file_sha};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file '{path}': {reason}")]
    Parse {
        path: std::path::PathBuf,
        reason: String,
    },
    #[error("failed to persist resolution cache to '{path}': {source}")]
    Persist {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to deserialize resolution cache: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("invalid resolution cache: {0}")]
    InvalidCache(String),
}

impl ResolutionError {
    /// I/O error while reading a config file during resolution-cache work.
    pub fn cache_io(path: std::path::PathBuf, source: std::io::Error) -> Self {
        ResolutionError::Read { path, source }
    }

    /// A config file exists but its content could not be used (bad JSON,
    /// circular `extends`, invalid path pattern).
    pub fn invalid_cache(reason: impl Into<String>) -> Self {
        ResolutionError::InvalidCache(reason.into())
    }
}

pub type ResolutionResult<T> = Result<T, ResolutionError>;
