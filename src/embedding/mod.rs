//! Text embedding backends.
//!
//! The store embeds documents on write and queries on search through the
//! [`Embedder`] trait. Two backends exist:
//!
//! - [`FastEmbedder`]: ONNX sentence embeddings (feature `fastembed-embeddings`)
//! - [`HashEmbedder`]: deterministic hashed bag-of-words, always available
//!
//! `DOCSEARCH_EMBEDDER` (`fastembed` or `hash`) overrides the default choice.

mod hash;

#[cfg(feature = "fastembed-embeddings")]
mod onnx;

#[cfg(feature = "fastembed-embeddings")]
pub use onnx::FastEmbedder;
pub use hash::HashEmbedder;

use crate::error::EmbeddingError;

/// Embedding dimension shared by both backends.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Environment variable selecting the embedder.
pub const EMBEDDER_ENV: &str = "DOCSEARCH_EMBEDDER";

/// Converts text into fixed-size vectors.
pub trait Embedder: Send + Sync {
    /// Stable backend name, recorded in the store.
    fn name(&self) -> &'static str;

    /// Output vector length.
    fn dimensions(&self) -> usize;

    /// Embeds a batch of texts, returning one vector per input in order.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::Inference`] if the model fails.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embeds a single text.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::Inference`] if the model fails.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| EmbeddingError::Inference("model returned no vector".to_string()))
    }
}

/// Creates the configured embedder.
///
/// Uses `DOCSEARCH_EMBEDDER` when set, otherwise FastEmbed if compiled in,
/// otherwise the hash fallback.
///
/// # Errors
///
/// Returns an error if the requested backend is unknown, not compiled in,
/// or fails to load.
pub fn create_embedder() -> Result<Box<dyn Embedder>, EmbeddingError> {
    let requested = std::env::var(EMBEDDER_ENV).ok();
    create_named_embedder(requested.as_deref())
}

/// Creates an embedder by name (`"hash"` or `"fastembed"`); `None` picks the default.
///
/// # Errors
///
/// See [`create_embedder`].
pub fn create_named_embedder(name: Option<&str>) -> Result<Box<dyn Embedder>, EmbeddingError> {
    match name.map(str::to_lowercase).as_deref() {
        Some("hash") => Ok(Box::new(HashEmbedder::new())),
        #[cfg(feature = "fastembed-embeddings")]
        Some("fastembed") | None => Ok(Box::new(FastEmbedder::new()?)),
        #[cfg(not(feature = "fastembed-embeddings"))]
        None => Ok(Box::new(HashEmbedder::new())),
        Some(other) => Err(EmbeddingError::Unsupported {
            name: other.to_string(),
        }),
    }
}

/// Cosine distance between two vectors, in `[0, 2]`.
///
/// A zero vector has no direction, so its distance to anything is `1.0`
/// (orthogonal).
#[must_use]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    (1.0 - similarity).clamp(0.0, 2.0)
}
