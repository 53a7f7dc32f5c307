//! In-memory vector index using cosine similarity.
//!
//! This module provides [`InMemoryVectorIndex`], a dependency-free index
//! backed by a `BTreeMap` protected by a `tokio::sync::RwLock`. It is a
//! stand-in for Qdrant in development and tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{CollectionStats, IndexHit, IndexedPoint};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorIndex;

const BACKEND: &str = "InMemory";

#[derive(Debug)]
struct Collection {
    dimensions: usize,
    points: BTreeMap<u64, IndexedPoint>,
}

/// An in-memory vector index using cosine similarity for search.
///
/// Points are keyed by id, so ties in score come back in ascending point-id
/// order. Vector length is checked against the collection's dimensionality
/// on both upsert and search, mirroring what a real vector database enforces.
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorIndex {
    /// Create a new empty in-memory index.
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing_collection(name: &str) -> RagError {
    RagError::VectorStoreError {
        backend: BACKEND.to_string(),
        message: format!("collection '{name}' does not exist"),
    }
}

fn check_dimensions(collection: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(RagError::VectorStoreError {
            backend: BACKEND.to_string(),
            message: format!(
                "vector of size {actual} does not match collection '{collection}' size {expected}"
            ),
        });
    }
    Ok(())
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(name.to_string())
            .or_insert_with(|| Collection { dimensions, points: BTreeMap::new() });
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: &[IndexedPoint]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing_collection(collection))?;
        for point in points {
            check_dimensions(collection, store.dimensions, point.vector.len())?;
        }
        for point in points {
            store.points.insert(point.id, point.clone());
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexHit>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing_collection(collection))?;
        check_dimensions(collection, store.dimensions, embedding.len())?;

        let mut hits: Vec<IndexHit> = store
            .points
            .values()
            .map(|point| IndexHit {
                point_id: Some(point.id),
                score: cosine_similarity(&point.vector, embedding),
                payload: point.payload.clone().into(),
            })
            .collect();

        // Stable sort keeps ascending point-id order among equal scores.
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn collection_stats(&self, collection: &str) -> Result<CollectionStats> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing_collection(collection))?;
        Ok(CollectionStats {
            name: collection.to_string(),
            points_count: store.points.len() as u64,
            vector_size: store.dimensions,
            distance: "Cosine".to_string(),
        })
    }
}
