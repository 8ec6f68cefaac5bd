//! `Embedder`: the adapter over `fastembed`'s `TextEmbedding`, grounded on
//! the teacher's `semantic::simple::SimpleSemanticSearch`.

use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbedderError {
    #[error("failed to initialize embedding model: {0}")]
    Init(String),
    #[error("failed to generate embedding: {0}")]
    Generate(String),
}

/// Generates vector embeddings for prepared text. Implemented so the
/// IndexPipeline and SearchBackend can be tested against a stub without
/// downloading a model.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        Ok(self.embed_batch(std::slice::from_ref(&text.to_string()))?
            .into_iter()
            .next()
            .unwrap_or_default())
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError>;

    /// Stable model name, used to key `embedding-cache/<model-name>.db`.
    fn model_name(&self) -> &str;

    fn dimensions(&self) -> usize;
}

/// `fastembed`-backed embedder. `TextEmbedding` is `!Sync`, so access is
/// serialized behind a `Mutex`, matching the teacher's pattern.
pub struct FastEmbedEmbedder {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimensions: usize,
}

impl FastEmbedEmbedder {
    /// `AllMiniLML6V2`: the model the teacher settled on after benchmarking.
    pub fn new() -> Result<Self, EmbedderError> {
        Self::with_model(EmbeddingModel::AllMiniLML6V2, "all-MiniLM-L6-v2")
    }

    pub fn with_model(model: EmbeddingModel, name: &str) -> Result<Self, EmbedderError> {
        let mut text_model = TextEmbedding::try_new(InitOptions::new(model))
            .map_err(|e| EmbedderError::Init(e.to_string()))?;

        let probe = text_model
            .embed(vec!["probe"], None)
            .map_err(|e| EmbedderError::Generate(e.to_string()))?;
        let dimensions = probe.into_iter().next().map(|v| v.len()).unwrap_or(0);

        Ok(Self {
            model: Mutex::new(text_model),
            model_name: name.to_string(),
            dimensions,
        })
    }
}

impl Embedder for FastEmbedEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        self.model
            .lock()
            .unwrap()
            .embed(refs, None)
            .map_err(|e| EmbedderError::Generate(e.to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
pub struct StubEmbedder {
    pub dimensions: usize,
}

#[cfg(test)]
impl Embedder for StubEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0.0f32; self.dimensions];
                for (i, b) in t.bytes().enumerate() {
                    v[i % self.dimensions] += b as f32;
                }
                v
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        "stub"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_embedder_produces_fixed_dimensions() {
        let embedder = StubEmbedder { dimensions: 8 };
        let out = embedder.embed("hello world").unwrap();
        assert_eq!(out.len(), 8);
    }

    #[test]
    fn stub_embed_batch_is_deterministic() {
        let embedder = StubEmbedder { dimensions: 4 };
        let a = embedder.embed("same text").unwrap();
        let b = embedder.embed("same text").unwrap();
        assert_eq!(a, b);
    }
}
