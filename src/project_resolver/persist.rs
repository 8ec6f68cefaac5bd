//! On-disk cache of resolution rules, keyed by config file, plus the
//! glob-pattern → config-file mapping used to find which config governs a
//! given source file. Persisted as JSON next to the manifest (grounded on
//! the teacher's atomic write-temp-then-rename persistence pattern, see
//! `storage/persistence.rs`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use globset::Glob;

use super::{ResolutionError, ResolutionResult, Sha256Hash};

/// `baseUrl` + `paths` extracted from one tsconfig/jsconfig, generalized
/// across both (the teacher's `jsconfig.rs::CompilerOptions` shape).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionRules {
    pub base_url: Option<String>,
    pub paths: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolutionIndex {
    shas: HashMap<PathBuf, Sha256Hash>,
    pub rules: HashMap<PathBuf, ResolutionRules>,
    /// (glob pattern, owning config path), checked longest-prefix-first.
    mappings: Vec<(String, PathBuf)>,
}

impl ResolutionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn needs_rebuild(&self, config_path: &Path, sha: &Sha256Hash) -> bool {
        self.shas.get(config_path) != Some(sha)
    }

    pub fn update_sha(&mut self, config_path: &Path, sha: &Sha256Hash) {
        self.shas.insert(config_path.to_path_buf(), sha.clone());
    }

    pub fn set_rules(&mut self, config_path: &Path, rules: ResolutionRules) {
        self.rules.insert(config_path.to_path_buf(), rules);
    }

    pub fn add_mapping(&mut self, pattern: &str, config_path: &Path) {
        self.mappings.push((pattern.to_string(), config_path.to_path_buf()));
    }

    /// Find the config file governing `file_path`, preferring the mapping
    /// with the longest literal (non-wildcard) prefix — the same
    /// longest-prefix-match rule used for tsconfig path aliases.
    pub fn get_config_for_file(&self, file_path: &Path) -> Option<&PathBuf> {
        let file_str = file_path.to_string_lossy();
        self.mappings
            .iter()
            .filter(|(pattern, _)| {
                Glob::new(pattern)
                    .ok()
                    .map(|g| g.compile_matcher().is_match(file_str.as_ref()))
                    .unwrap_or(false)
            })
            .max_by_key(|(pattern, _)| literal_prefix_len(pattern))
            .map(|(_, config)| config)
    }
}

fn literal_prefix_len(pattern: &str) -> usize {
    pattern
        .find(|c| c == '*' || c == '?' || c == '[')
        .unwrap_or(pattern.len())
}

pub struct ResolutionPersistence {
    base_dir: PathBuf,
}

impl ResolutionPersistence {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    fn path_for(&self, language_id: &str) -> PathBuf {
        self.base_dir.join(format!("resolution-{language_id}.json"))
    }

    pub fn load(&self, language_id: &str) -> ResolutionResult<ResolutionIndex> {
        let path = self.path_for(language_id);
        let bytes = std::fs::read(&path).map_err(|source| ResolutionError::Read { path: path.clone(), source })?;
        let index: ResolutionIndex = serde_json::from_slice(&bytes)?;
        Ok(index)
    }

    pub fn save(&self, language_id: &str, index: &ResolutionIndex) -> ResolutionResult<()> {
        std::fs::create_dir_all(&self.base_dir).map_err(|source| ResolutionError::Persist {
            path: self.base_dir.clone(),
            source,
        })?;
        let path = self.path_for(language_id);
        let temp_path = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(index)?;
        std::fs::write(&temp_path, &bytes).map_err(|source| ResolutionError::Persist {
            path: temp_path.clone(),
            source,
        })?;
        std::fs::rename(&temp_path, &path).map_err(|source| ResolutionError::Persist { path, source })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_prefix_wins_over_broader_mapping() {
        let mut index = ResolutionIndex::new();
        index.add_mapping("src/**/*.ts", Path::new("tsconfig.json"));
        index.add_mapping("src/app/**/*.ts", Path::new("src/app/tsconfig.json"));

        let config = index.get_config_for_file(Path::new("src/app/widgets/button.ts"));
        assert_eq!(config, Some(&PathBuf::from("src/app/tsconfig.json")));
    }

    #[test]
    fn needs_rebuild_when_sha_differs_or_missing() {
        let mut index = ResolutionIndex::new();
        let path = Path::new("tsconfig.json");
        let sha = Sha256Hash::__for_test("abc");
        assert!(index.needs_rebuild(path, &sha));
        index.update_sha(path, &sha);
        assert!(!index.needs_rebuild(path, &sha));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = ResolutionPersistence::new(dir.path());

        let mut index = ResolutionIndex::new();
        index.set_rules(
            Path::new("tsconfig.json"),
            ResolutionRules {
                base_url: Some(".".to_string()),
                paths: HashMap::from([("@/*".to_string(), vec!["src/*".to_string()])]),
            },
        );
        persistence.save("typescript", &index).unwrap();

        let loaded = persistence.load("typescript").unwrap();
        assert_eq!(loaded.rules.get(Path::new("tsconfig.json")), index.rules.get(Path::new("tsconfig.json")));
    }
}
