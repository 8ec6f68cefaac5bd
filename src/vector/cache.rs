//! Content-hash-keyed vector cache, one SQLite file per embedding model
//! (`embedding-cache/<model-name>.db`, spec §6). Entries are written once
//! on first successful embed and never evicted — the hash keys on the
//! exact text submitted to the embedder, so the same snippet under the
//! same model always maps to the same vector.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingCacheError {
    #[error("failed to open embedding cache at '{path}': {source}")]
    Open {
        path: String,
        source: rusqlite::Error,
    },
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type EmbeddingCacheResult<T> = Result<T, EmbeddingCacheError>;

/// SHA-256 of the exact UTF-8 text submitted to the embedder.
pub fn compute_content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// `Connection` is `!Sync`; the cache is shared (via `Arc`) across the
/// Watcher's background thread and the pipeline's own thread, same
/// reasoning as `Store`'s `Mutex<Connection>`.
pub struct EmbeddingCache {
    conn: Mutex<Connection>,
}

impl EmbeddingCache {
    /// Open (or create) the cache file for one embedding model.
    pub fn open(cache_dir: &Path, model_name: &str) -> EmbeddingCacheResult<Self> {
        std::fs::create_dir_all(cache_dir).ok();
        let path = cache_dir.join(format!("{model_name}.db"));
        let conn = Connection::open(&path).map_err(|e| EmbeddingCacheError::Open {
            path: path.display().to_string(),
            source: e,
        })?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS embeddings (
                content_hash TEXT PRIMARY KEY,
                vector BLOB NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> EmbeddingCacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS embeddings (
                content_hash TEXT PRIMARY KEY,
                vector BLOB NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn get(&self, hash: &str) -> EmbeddingCacheResult<Option<Vec<f32>>> {
        self.conn
            .lock()
            .unwrap()
            .query_row(
                "SELECT vector FROM embeddings WHERE content_hash = ?1",
                [hash],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()
            .map(|opt| opt.map(|bytes| decode_vector(&bytes)))
            .map_err(EmbeddingCacheError::from)
    }

    /// Batched lookup; missing hashes are simply absent from the result
    /// map, not errors.
    pub fn get_batch(
        &self,
        hashes: &[String],
    ) -> EmbeddingCacheResult<std::collections::HashMap<String, Vec<f32>>> {
        let mut out = std::collections::HashMap::new();
        for hash in hashes {
            if let Some(v) = self.get(hash)? {
                out.insert(hash.clone(), v);
            }
        }
        Ok(out)
    }

    pub fn set(&self, hash: &str, vector: &[f32]) -> EmbeddingCacheResult<()> {
        self.conn.lock().unwrap().execute(
            "INSERT INTO embeddings (content_hash, vector) VALUES (?1, ?2)
             ON CONFLICT(content_hash) DO UPDATE SET vector = excluded.vector",
            params![hash, encode_vector(vector)],
        )?;
        Ok(())
    }

    pub fn close(self) {
        drop(self);
    }
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for f in vector {
        bytes.extend_from_slice(&f.to_le_bytes());
    }
    bytes
}

fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_stable() {
        assert_eq!(compute_content_hash("hello"), compute_content_hash("hello"));
        assert_ne!(compute_content_hash("hello"), compute_content_hash("world"));
    }

    #[test]
    fn set_then_get_round_trips() {
        let cache = EmbeddingCache::open_in_memory().unwrap();
        let hash = compute_content_hash("some snippet");
        cache.set(&hash, &[0.1, 0.2, 0.3]).unwrap();
        let got = cache.get(&hash).unwrap().unwrap();
        assert!((got[0] - 0.1).abs() < 1e-6);
        assert!((got[1] - 0.2).abs() < 1e-6);
        assert!((got[2] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn missing_hash_returns_none() {
        let cache = EmbeddingCache::open_in_memory().unwrap();
        assert!(cache.get("nonexistent").unwrap().is_none());
    }

    #[test]
    fn get_batch_skips_misses() {
        let cache = EmbeddingCache::open_in_memory().unwrap();
        let h1 = compute_content_hash("a");
        cache.set(&h1, &[1.0]).unwrap();
        let h2 = compute_content_hash("b");
        let batch = cache.get_batch(&[h1.clone(), h2]).unwrap();
        assert_eq!(batch.len(), 1);
        assert!(batch.contains_key(&h1));
    }

    #[test]
    fn set_overwrites_existing_entry() {
        let cache = EmbeddingCache::open_in_memory().unwrap();
        let hash = compute_content_hash("x");
        cache.set(&hash, &[1.0]).unwrap();
        cache.set(&hash, &[2.0]).unwrap();
        assert_eq!(cache.get(&hash).unwrap().unwrap(), vec![2.0]);
    }
}
