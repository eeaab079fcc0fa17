//! Embedding generation for record similarity
//!
//! Uses fastembed with the BGE-M3 model (1024 dimensions, multilingual) so
//! Chinese and English reports land in the same vector space.

pub mod error;
mod record_embedder;

use std::sync::Mutex;

use disaster_dedup_core::EMBEDDING_DIMENSION;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

pub use error::EmbeddingError;
pub use record_embedder::{FieldWeights, RecordEmbedder, WeightedFieldEmbedder};

/// Text → vector capability. Implementations must be deterministic for
/// identical input.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed several texts in one model call. Output order matches input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Output dimension.
    fn dimension(&self) -> usize;
}

/// fastembed-backed provider. The ONNX session is not re-entrant, so calls are
/// serialized behind a mutex.
pub struct EmbeddingService {
    model: Mutex<TextEmbedding>,
}

impl std::fmt::Debug for EmbeddingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingService").field("model", &"BGE-M3").finish()
    }
}

impl EmbeddingService {
    /// Load the model, downloading it on first use.
    ///
    /// # Errors
    /// Returns `EmbeddingError::ModelInit` if the model cannot be loaded.
    pub fn new() -> Result<Self, EmbeddingError> {
        let mut options = InitOptions::new(EmbeddingModel::BGEM3).with_show_download_progress(false);
        if let Ok(dir) = std::env::var("DISASTER_DEDUP_MODEL_CACHE_DIR") {
            options = options.with_cache_dir(dir.into());
        }
        let model =
            TextEmbedding::try_new(options).map_err(|e| EmbeddingError::ModelInit(e.to_string()))?;
        tracing::info!(dimension = EMBEDDING_DIMENSION, "Embedding model loaded");
        Ok(Self { model: Mutex::new(model) })
    }
}

impl EmbeddingProvider for EmbeddingService {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_batch(&[text])?.into_iter().next().ok_or(EmbeddingError::EmptyResult)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let owned: Vec<String> = texts.iter().map(|t| (*t).to_owned()).collect();
        #[allow(unused_mut, reason = "embed takes &mut self on newer fastembed releases")]
        let mut model = self.model.lock().map_err(|_| EmbeddingError::LockPoisoned)?;
        let vectors =
            model.embed(owned, None).map_err(|e| EmbeddingError::Generation(e.to_string()))?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::EmptyResult);
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION
    }
}
