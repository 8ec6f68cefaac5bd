//! Workspace bootstrap: creates the cache directory and default config.

use std::path::{Path, PathBuf};

use crate::config::{Settings, CACHE_DIR_NAME};

/// Name of the per-workspace cache directory, as a `&str` for path joining
/// by modules (`project_resolver`, `parsing`) that don't otherwise depend
/// on `config`.
pub fn local_dir_name() -> &'static str {
    CACHE_DIR_NAME
}

/// Create `<root>/.codetrace/` and a default `settings.toml` inside it, if
/// not already present (or always, when `force` is set).
pub fn init_workspace(root: &Path, force: bool) -> anyhow::Result<PathBuf> {
    let cache_dir = root.join(CACHE_DIR_NAME);
    std::fs::create_dir_all(&cache_dir)?;

    let settings_path = cache_dir.join("settings.toml");
    if force || !settings_path.exists() {
        Settings::default().save(&settings_path).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    }
    Ok(cache_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_cache_dir_and_settings() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = init_workspace(dir.path(), false).unwrap();
        assert!(cache_dir.join("settings.toml").exists());
    }

    #[test]
    fn init_is_idempotent_without_force() {
        let dir = tempfile::tempdir().unwrap();
        init_workspace(dir.path(), false).unwrap();
        let cache_dir = init_workspace(dir.path(), false).unwrap();
        assert!(cache_dir.join("settings.toml").exists());
    }
}
