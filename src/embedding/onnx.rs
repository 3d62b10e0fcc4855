//! FastEmbed (ONNX Runtime) sentence embeddings.

use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::{DEFAULT_DIMENSIONS, Embedder};
use crate::error::EmbeddingError;

/// Sentence embedder backed by all-MiniLM-L6-v2.
///
/// The model is downloaded and cached on first construction. Inference
/// needs exclusive access to the ONNX session, so calls are serialized.
pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
}

impl FastEmbedder {
    /// Loads the model.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::ModelInit`] if the model cannot be
    /// downloaded or loaded.
    pub fn new() -> Result<Self, EmbeddingError> {
        let options =
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false);
        let model =
            TextEmbedding::try_new(options).map_err(|e| EmbeddingError::ModelInit(e.to_string()))?;
        tracing::debug!("loaded fastembed model all-MiniLM-L6-v2");
        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

impl Embedder for FastEmbedder {
    fn name(&self) -> &'static str {
        "fastembed"
    }

    fn dimensions(&self) -> usize {
        DEFAULT_DIMENSIONS
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut model = self
            .model
            .lock()
            .map_err(|_| EmbeddingError::Inference("model lock poisoned".to_string()))?;
        model
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::Inference(e.to_string()))
    }
}
