//! Embedder trait and shared vector post-conditions.
//!
//! Every implementation must return unit-normalized vectors so that inner
//! product equals cosine similarity. Normalization is enforced here, at the
//! component boundary, rather than assumed from the underlying model:
//! indexing-time and query-time embeddings go through the same code path,
//! keeping retrieval ranking consistent.

pub mod download;
pub mod mock;
pub mod onnx;

use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    #[error("model load failed: {0}")]
    ModelLoadFailed(String),

    #[error("tokenizer error: {0}")]
    TokenizerError(String),
}

/// Trait for text embedding implementations.
///
/// Implementations must be `Send + Sync` and must return L2-normalized
/// vectors of exactly [`Embedder::dimensions`] length.
pub trait Embedder: Send + Sync {
    /// Embed a single text string (used for ad-hoc queries).
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;

    /// Embed multiple text strings (used at indexing time).
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Dimensionality of the embedding vectors.
    fn dimensions(&self) -> usize;
}

/// L2-normalize a vector in place. A zero vector is left untouched.
pub fn l2_normalize(vec: &mut [f32]) {
    let norm_sq: f32 = vec.iter().map(|v| v * v).sum();
    if norm_sq == 0.0 {
        return;
    }
    let inv_norm = 1.0 / norm_sq.sqrt();
    for v in vec {
        *v *= inv_norm;
    }
}

/// L2 norm of a vector. Exposed for post-condition checks in tests.
#[must_use]
pub fn l2_norm(vec: &[f32]) -> f32 {
    vec.iter().map(|v| v * v).sum::<f32>().sqrt()
}
