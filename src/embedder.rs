use std::path::PathBuf;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::debug;

use crate::error::{Result, VocabError};

/// Name recorded in the persisted index for the default model.
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";
const DEFAULT_DIMENSION: usize = 384;

/// Maps text to fixed-dimension vectors.
pub trait Embedder: Send + Sync {
    /// Identifier stored alongside persisted vectors.
    fn model_name(&self) -> &str;

    fn dimension(&self) -> usize;

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Convenience wrapper around batch.
    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| VocabError::Embedding("no embedding returned".to_string()))
    }
}

/// Local sentence-transformer model. Weights are downloaded on first use
/// and cached.
pub struct FastEmbedder {
    model: TextEmbedding,
    name: String,
    dimension: usize,
}

impl FastEmbedder {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        debug!("Loading embedding model {} from {}", DEFAULT_MODEL_NAME, cache_dir.display());

        let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_cache_dir(cache_dir)
            .with_show_download_progress(true);
        let model = TextEmbedding::try_new(options)
            .map_err(|e| VocabError::Embedding(format!("failed to initialize model: {e}")))?;

        Ok(Self {
            model,
            name: DEFAULT_MODEL_NAME.to_string(),
            dimension: DEFAULT_DIMENSION,
        })
    }
}

impl Embedder for FastEmbedder {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .model
            .embed(texts.to_vec(), None)
            .map_err(|e| VocabError::Embedding(e.to_string()))?;

        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimension) {
            return Err(VocabError::Embedding(format!(
                "expected {} dimensions, model returned {}",
                self.dimension,
                bad.len()
            )));
        }
        Ok(embeddings)
    }
}
