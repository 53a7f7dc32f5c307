//! Data types for chunks, index points, search hits, and augmented responses.

use serde::{Deserialize, Serialize};

use crate::retriever::RetrievalStatus;

/// A unit of retrievable evidence returned to callers.
///
/// `chunk_id` is assigned at ingestion and carried through unchanged so an
/// answer's cited evidence can be traced back to the exact source chunk.
/// `score` belongs to the (query, chunk) pair, not to the chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkRecord {
    /// The chunk's raw content. Never empty.
    pub text: String,
    /// Name of the originating document.
    pub source_file: String,
    /// Page within the originating document.
    pub page: u64,
    /// Stable identifier, unique within a collection.
    pub chunk_id: u64,
    /// Cosine similarity to the query (higher is more relevant).
    pub score: f32,
}

/// Chunks for one query, ordered by descending score, at most `top_k` long.
pub type RetrievalResult = Vec<ChunkRecord>;

/// Output bundle of [`Augmenter::augment`](crate::Augmenter::augment).
///
/// `formatted_context` and `rag_prompt` are pure functions of `query` and
/// `context_chunks`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AugmentedResponse {
    /// The original question.
    pub query: String,
    /// Evidence in the order it was retrieved.
    pub context_chunks: RetrievalResult,
    /// Number of entries in `context_chunks`.
    pub num_context_chunks: usize,
    /// Evidence block rendered by [`format_context`](crate::format_context).
    pub formatted_context: String,
    /// Final prompt rendered by [`compose`](crate::compose).
    pub rag_prompt: String,
    /// Version of the instruction template used for `rag_prompt`.
    pub prompt_version: String,
    /// Whether retrieval found evidence, found none, or was unavailable.
    pub retrieval_status: RetrievalStatus,
}

/// Payload written for every indexed chunk.
///
/// Keys are the storage contract shared by the ingestion job and the
/// retriever: `text`, `source_file`, `page`, `chunk_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkPayload {
    pub text: String,
    pub source_file: String,
    pub page: u64,
    pub chunk_id: u64,
}

/// A point to be upserted into a [`VectorIndex`](crate::VectorIndex).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedPoint {
    /// Point identifier. Ingestion sets it equal to `payload.chunk_id`.
    pub id: u64,
    /// Embedding of `payload.text`.
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

impl IndexedPoint {
    /// Build a point whose id matches the payload's `chunk_id`.
    pub fn new(vector: Vec<f32>, payload: ChunkPayload) -> Self {
        Self { id: payload.chunk_id, vector, payload }
    }
}

/// Payload as read back from the index. Any key may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HitPayload {
    pub text: Option<String>,
    pub source_file: Option<String>,
    pub page: Option<u64>,
    pub chunk_id: Option<u64>,
}

impl From<ChunkPayload> for HitPayload {
    fn from(payload: ChunkPayload) -> Self {
        Self {
            text: Some(payload.text),
            source_file: Some(payload.source_file),
            page: Some(payload.page),
            chunk_id: Some(payload.chunk_id),
        }
    }
}

/// A raw nearest-neighbor hit, before validation by the retriever.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexHit {
    /// The index's internal point id, when it is numeric.
    pub point_id: Option<u64>,
    pub score: f32,
    pub payload: HitPayload,
}

/// Facts about a collection, as reported by the index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionStats {
    pub name: String,
    pub points_count: u64,
    pub vector_size: usize,
    /// Distance metric name as reported by the backend (e.g. `Cosine`).
    pub distance: String,
}

/// One page of extracted source text, the unit the ingestion job chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourcePage {
    pub source_file: String,
    /// 0-based page number.
    pub page: u64,
    pub text: String,
}
