//! Fakes shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use labor_rag::{
    ChunkPayload, CollectionStats, Embedder, IndexHit, IndexedPoint, LanguageModel, RagError,
    Result, VectorIndex,
};

/// Always returns the same vector, whatever the text.
pub struct FixedEmbedder {
    pub vector: Vec<f32>,
}

impl FixedEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self { vector }
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(self.vector.clone())
    }

    fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

/// Deterministic hash-based embedder, L2-normalised.
pub struct HashEmbedder {
    pub dimensions: usize,
    pub calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut emb = vec![0.0f32; self.dimensions];
        for (i, v) in emb.iter_mut().enumerate() {
            *v = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(emb)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::EmbeddingError {
            provider: "fake".into(),
            message: "model server unreachable".into(),
        })
    }

    fn dimensions(&self) -> usize {
        4
    }
}

/// Returns canned hits regardless of the query vector.
pub struct StaticIndex {
    pub hits: Vec<IndexHit>,
    pub vector_size: usize,
}

impl StaticIndex {
    pub fn new(hits: Vec<IndexHit>) -> Self {
        Self { hits, vector_size: 4 }
    }
}

#[async_trait]
impl VectorIndex for StaticIndex {
    async fn create_collection(&self, _name: &str, _dimensions: usize) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, _collection: &str, _points: &[IndexedPoint]) -> Result<()> {
        Ok(())
    }

    async fn search(
        &self,
        _collection: &str,
        _embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexHit>> {
        Ok(self.hits.iter().take(top_k).cloned().collect())
    }

    async fn collection_stats(&self, collection: &str) -> Result<CollectionStats> {
        Ok(CollectionStats {
            name: collection.to_string(),
            points_count: self.hits.len() as u64,
            vector_size: self.vector_size,
            distance: "Cosine".into(),
        })
    }
}

/// Fails every call as if the database connection were refused.
pub struct UnreachableIndex;

fn connection_refused() -> RagError {
    RagError::VectorStoreError {
        backend: "fake".into(),
        message: "connection refused".into(),
    }
}

#[async_trait]
impl VectorIndex for UnreachableIndex {
    async fn create_collection(&self, _name: &str, _dimensions: usize) -> Result<()> {
        Err(connection_refused())
    }

    async fn upsert(&self, _collection: &str, _points: &[IndexedPoint]) -> Result<()> {
        Err(connection_refused())
    }

    async fn search(
        &self,
        _collection: &str,
        _embedding: &[f32],
        _top_k: usize,
    ) -> Result<Vec<IndexHit>> {
        Err(connection_refused())
    }

    async fn collection_stats(&self, _collection: &str) -> Result<CollectionStats> {
        Err(connection_refused())
    }
}

/// Never answers a search within any reasonable timeout.
pub struct StalledIndex;

#[async_trait]
impl VectorIndex for StalledIndex {
    async fn create_collection(&self, _name: &str, _dimensions: usize) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, _collection: &str, _points: &[IndexedPoint]) -> Result<()> {
        Ok(())
    }

    async fn search(
        &self,
        _collection: &str,
        _embedding: &[f32],
        _top_k: usize,
    ) -> Result<Vec<IndexHit>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }

    async fn collection_stats(&self, _collection: &str) -> Result<CollectionStats> {
        Err(connection_refused())
    }
}

/// Echoes the prompt length so tests can see the prompt arrived.
pub struct EchoModel;

#[async_trait]
impl LanguageModel for EchoModel {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(format!("received {} bytes", prompt.len()))
    }
}

pub struct FailingModel;

#[async_trait]
impl LanguageModel for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(RagError::GenerationFailure {
            provider: "fake".into(),
            message: "model overloaded".into(),
        })
    }
}

pub fn hit(chunk_id: u64, score: f32, text: &str, source_file: &str, page: u64) -> IndexHit {
    IndexHit {
        point_id: Some(chunk_id),
        score,
        payload: ChunkPayload {
            text: text.to_string(),
            source_file: source_file.to_string(),
            page,
            chunk_id,
        }
        .into(),
    }
}

pub fn point(chunk_id: u64, vector: Vec<f32>, text: &str) -> IndexedPoint {
    IndexedPoint::new(
        vector,
        ChunkPayload {
            text: text.to_string(),
            source_file: "labor_law.txt".to_string(),
            page: chunk_id / 10,
            chunk_id,
        },
    )
}
