//! Vector index trait for storing and searching chunk embeddings.

use async_trait::async_trait;

use crate::document::{CollectionStats, IndexHit, IndexedPoint};
use crate::error::Result;

/// A storage backend for chunk vectors with cosine similarity search.
///
/// Implementations manage named collections of [`IndexedPoint`]s. Query
/// traffic only calls [`search`](VectorIndex::search) and
/// [`collection_stats`](VectorIndex::collection_stats); the write methods
/// belong to the ingestion job.
///
/// # Example
///
/// ```rust,ignore
/// use labor_rag::{InMemoryVectorIndex, VectorIndex};
///
/// let index = InMemoryVectorIndex::new();
/// index.create_collection("saudi_labor_law", 384).await?;
/// index.upsert("saudi_labor_law", &points).await?;
/// let hits = index.search("saudi_labor_law", &query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create a named cosine collection. No-op if it already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Upsert points into a collection, replacing points with the same id.
    async fn upsert(&self, collection: &str, points: &[IndexedPoint]) -> Result<()>;

    /// Search for the `top_k` nearest points to `embedding`.
    ///
    /// Returns hits with payloads but without vectors, ordered by descending
    /// score. Tie order is backend-defined.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexHit>>;

    /// Report point count, vector size, and distance for a collection.
    async fn collection_stats(&self, collection: &str) -> Result<CollectionStats>;
}
