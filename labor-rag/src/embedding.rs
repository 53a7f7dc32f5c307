//! Embedder trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that maps text to a fixed-length dense vector.
///
/// Implementations wrap a specific embedding backend behind a unified async
/// interface. The default [`embed_batch`](Embedder::embed_batch) calls
/// [`embed`](Embedder::embed) sequentially; backends that support native
/// batching should override it.
///
/// [`dimensions`](Embedder::dimensions) must equal the vector size of the
/// collection being queried. The check happens once at startup through
/// [`Augmenter::check_dimensions`](crate::Augmenter::check_dimensions), not
/// on every call.
///
/// # Example
///
/// ```rust,ignore
/// use labor_rag::Embedder;
///
/// let embedding = embedder.embed("annual leave entitlement").await?;
/// assert_eq!(embedding.len(), embedder.dimensions());
/// ```
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Short name used in logs and `/stats`.
    fn model_name(&self) -> &str {
        "unknown"
    }
}
