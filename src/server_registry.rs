//! Peer-discovery file (`server.json`) and the spawn-exclusion lock
//! (`server.lock`) kept in the cache directory (spec §6 "External
//! interfaces", §5 "Spawn exclusion").

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerRegistryError {
    #[error(
        "another instance appears to be running for this workspace (pid {pid}); \
         remove '{lock_path}' if that process is gone"
    )]
    AlreadyRunning { pid: u32, lock_path: String },
    #[error("io error at '{path}': {source}")]
    Io { path: String, source: std::io::Error },
}

/// `server.json`: `{host, port, pid, ready, apiVersion}`, written by the
/// process holding the [`SpawnLock`] so sibling invocations (or an agent
/// shelling out repeatedly) can discover a running server instead of
/// spawning their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub host: String,
    pub port: u16,
    pub pid: u32,
    pub ready: bool,
    #[serde(rename = "apiVersion")]
    pub api_version: u32,
}

impl ServerInfo {
    pub fn write(&self, cache_dir: &Path) -> Result<(), ServerRegistryError> {
        let path = cache_dir.join("server.json");
        let body = serde_json::to_string_pretty(self).unwrap_or_default();
        fs::write(&path, body).map_err(|source| ServerRegistryError::Io {
            path: path.to_string_lossy().into_owned(),
            source,
        })
    }

    pub fn remove(cache_dir: &Path) {
        let _ = fs::remove_file(cache_dir.join("server.json"));
    }
}

/// RAII guard over `server.lock`: one writer per cache directory at a
/// time (spec §5 "Spawn exclusion"). Released on drop.
///
/// A lock file older than [`STALE_AFTER`] is reclaimed rather than left
/// to block forever, since this crate's dependency stack has no portable
/// `kill(pid, 0)` liveness probe to detect a crashed holder outright.
pub struct SpawnLock {
    path: PathBuf,
}

const STALE_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

impl SpawnLock {
    pub fn acquire(cache_dir: &Path) -> Result<Self, ServerRegistryError> {
        let path = cache_dir.join("server.lock");
        match Self::try_create(&path) {
            Ok(()) => Ok(Self { path }),
            Err(ServerRegistryError::AlreadyRunning { pid, .. }) => {
                if Self::is_stale(&path) {
                    let _ = fs::remove_file(&path);
                    Self::try_create(&path)?;
                    Ok(Self { path })
                } else {
                    Err(ServerRegistryError::AlreadyRunning {
                        pid,
                        lock_path: path.to_string_lossy().into_owned(),
                    })
                }
            }
            Err(e) => Err(e),
        }
    }

    fn try_create(path: &Path) -> Result<(), ServerRegistryError> {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                let _ = write!(file, "{}", std::process::id());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let pid = fs::read_to_string(path)
                    .ok()
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(0);
                Err(ServerRegistryError::AlreadyRunning {
                    pid,
                    lock_path: path.to_string_lossy().into_owned(),
                })
            }
            Err(source) => Err(ServerRegistryError::Io {
                path: path.to_string_lossy().into_owned(),
                source,
            }),
        }
    }

    fn is_stale(path: &Path) -> bool {
        fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .map(|age| age > STALE_AFTER)
            .unwrap_or(false)
    }
}

impl Drop for SpawnLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_then_drop_releases_the_lock() {
        let dir = tempfile::tempdir().unwrap();
        {
            let _lock = SpawnLock::acquire(dir.path()).unwrap();
            assert!(dir.path().join("server.lock").exists());
        }
        assert!(!dir.path().join("server.lock").exists());
    }

    #[test]
    fn second_acquire_is_rejected_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let _lock = SpawnLock::acquire(dir.path()).unwrap();
        let err = SpawnLock::acquire(dir.path()).unwrap_err();
        assert!(matches!(err, ServerRegistryError::AlreadyRunning { .. }));
    }

    #[test]
    fn stale_lock_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("server.lock");
        let mut file = std::fs::File::create(&lock_path).unwrap();
        file.write_all(b"999999999").unwrap();
        let old = std::time::SystemTime::now() - STALE_AFTER - Duration::from_secs(60);
        file.set_modified(old).unwrap();
        drop(file);

        let _lock = SpawnLock::acquire(dir.path()).unwrap();
        assert!(lock_path.exists());
    }

    #[test]
    fn server_info_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let info = ServerInfo {
            host: "stdio".to_string(),
            port: 8888,
            pid: std::process::id(),
            ready: true,
            api_version: 1,
        };
        info.write(dir.path()).unwrap();
        let raw = fs::read_to_string(dir.path().join("server.json")).unwrap();
        let parsed: ServerInfo = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.port, 8888);
        assert!(parsed.ready);

        ServerInfo::remove(dir.path());
        assert!(!dir.path().join("server.json").exists());
    }
}
