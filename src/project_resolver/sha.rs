//! SHA-256 content hashing for resolution-cache invalidation.

use sha2::{Digest, Sha256};
use std::path::Path;

use super::{ResolutionError, ResolutionResult};

/// Hex-encoded SHA-256 digest of a config file's contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Sha256Hash(String);

impl Sha256Hash {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn __for_test(hex: &str) -> Self {
        Self(hex.to_string())
    }
}

impl std::fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the SHA-256 digest of a file's contents, hex-encoded.
pub fn compute_file_sha(path: &Path) -> ResolutionResult<Sha256Hash> {
    let bytes = std::fs::read(path).map_err(|source| ResolutionError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hasher.finalize();
    Ok(Sha256Hash(hex_encode(&digest)))
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(s, "{b:02x}").expect("writing to a String never fails");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn same_content_same_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"{\"a\":1}").unwrap();

        let h1 = compute_file_sha(&path).unwrap();
        let h2 = compute_file_sha(&path).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn different_content_different_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");

        std::fs::write(&path, b"{\"a\":1}").unwrap();
        let h1 = compute_file_sha(&path).unwrap();

        std::fs::write(&path, b"{\"a\":2}").unwrap();
        let h2 = compute_file_sha(&path).unwrap();

        assert_ne!(h1, h2);
    }

    #[test]
    fn missing_file_errors() {
        let path = std::path::Path::new("/definitely/does/not/exist.json");
        assert!(compute_file_sha(path).is_err());
    }
}
