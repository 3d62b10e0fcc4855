//! Hashed bag-of-words embedder.
//!
//! Needs no model download and is fully deterministic, which makes it the
//! backend for tests and for builds without `fastembed-embeddings`. Words
//! are lowercased, hashed into buckets, counted, and the vector is
//! L2-normalized. All components are non-negative, so cosine distance
//! between two hash embeddings stays within `[0, 1]`.

use unicode_segmentation::UnicodeSegmentation;

use super::{DEFAULT_DIMENSIONS, Embedder};
use crate::error::EmbeddingError;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Deterministic hashed bag-of-words embedder.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    /// Creates an embedder with [`DEFAULT_DIMENSIONS`] buckets.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dimensions: DEFAULT_DIMENSIONS,
        }
    }

    /// Creates an embedder with a custom bucket count (minimum 1).
    #[must_use]
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn bucket(&self, word: &str) -> usize {
        let mut hash = FNV_OFFSET;
        for byte in word.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        (hash % self.dimensions as u64) as usize
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimensions];
        for word in text.unicode_words() {
            let word = word.to_lowercase();
            vector[self.bucket(&word)] += 1.0;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for HashEmbedder {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
