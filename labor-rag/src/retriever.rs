//! Chunk retrieval: embed the query, search the index, validate the hits.
//!
//! Retrieval fails open. Embedder errors, index errors, and timeouts are
//! logged and turned into an empty result so the rest of the pipeline always
//! receives a well-formed (possibly empty) chunk list. Callers that need to
//! tell a true miss from an outage use
//! [`ChunkRetriever::retrieve_outcome`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::document::{ChunkRecord, IndexHit, RetrievalResult};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorIndex;

/// Default for a hit whose payload has no `source_file`.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Coarse retrieval status carried on responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStatus {
    Found,
    NoMatch,
    Unavailable,
}

/// Which stage of retrieval failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    Embedding,
    Search,
    Timeout,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Embedding => "embedding failed",
            Self::Search => "vector search failed",
            Self::Timeout => "retrieval timed out",
        };
        f.write_str(s)
    }
}

/// Typed result of a retrieval attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    /// At least one valid chunk was found.
    Found(RetrievalResult),
    /// The index answered but nothing usable came back.
    NoMatch,
    /// The embedder or index could not be reached in time.
    Unavailable(UnavailableReason),
}

impl RetrievalOutcome {
    pub fn status(&self) -> RetrievalStatus {
        match self {
            Self::Found(_) => RetrievalStatus::Found,
            Self::NoMatch => RetrievalStatus::NoMatch,
            Self::Unavailable(_) => RetrievalStatus::Unavailable,
        }
    }

    pub fn chunks(&self) -> &[ChunkRecord] {
        match self {
            Self::Found(chunks) => chunks,
            _ => &[],
        }
    }

    /// Collapse to the fail-open chunk list.
    pub fn into_chunks(self) -> RetrievalResult {
        match self {
            Self::Found(chunks) => chunks,
            _ => Vec::new(),
        }
    }
}

/// Reject blank queries and a zero `top_k`.
pub(crate) fn validate_request(query: &str, top_k: usize) -> Result<()> {
    if query.trim().is_empty() {
        return Err(RagError::InvalidQuery("query must not be empty".to_string()));
    }
    if top_k == 0 {
        return Err(RagError::InvalidQuery("top_k must be at least 1".to_string()));
    }
    Ok(())
}

/// Issues similarity queries against one collection of a [`VectorIndex`].
///
/// Holds only shared handles and immutable settings, so one retriever can
/// serve any number of concurrent requests.
pub struct ChunkRetriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    collection: String,
    timeout: Duration,
}

impl ChunkRetriever {
    /// Create a retriever over `collection`.
    ///
    /// `timeout` bounds the embed-and-search step of every call.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        collection: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self { embedder, index, collection: collection.into(), timeout }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Retrieve up to `top_k` chunks for `query`, most relevant first.
    ///
    /// Backend failures produce `Ok(vec![])`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidQuery`] if `query` is blank or `top_k == 0`.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<RetrievalResult> {
        Ok(self.retrieve_outcome(query, top_k).await?.into_chunks())
    }

    /// Like [`retrieve`](Self::retrieve), but keeps misses and outages apart.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidQuery`] if `query` is blank or `top_k == 0`.
    pub async fn retrieve_outcome(&self, query: &str, top_k: usize) -> Result<RetrievalOutcome> {
        validate_request(query, top_k)?;

        let hits = match tokio::time::timeout(self.timeout, self.search(query, top_k)).await {
            Ok(Ok(hits)) => hits,
            Ok(Err(reason)) => return Ok(RetrievalOutcome::Unavailable(reason)),
            Err(_) => {
                error!(
                    collection = %self.collection,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "retrieval timed out"
                );
                return Ok(RetrievalOutcome::Unavailable(UnavailableReason::Timeout));
            }
        };

        let chunks: RetrievalResult =
            hits.into_iter().take(top_k).filter_map(to_chunk_record).collect();
        info!(
            collection = %self.collection,
            top_k,
            result_count = chunks.len(),
            "retrieval completed"
        );

        if chunks.is_empty() {
            Ok(RetrievalOutcome::NoMatch)
        } else {
            Ok(RetrievalOutcome::Found(chunks))
        }
    }

    async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> std::result::Result<Vec<IndexHit>, UnavailableReason> {
        let embedding = self.embedder.embed(query).await.map_err(|e| {
            error!(error = %e, "query embedding failed");
            UnavailableReason::Embedding
        })?;

        self.index.search(&self.collection, &embedding, top_k).await.map_err(|e| {
            error!(collection = %self.collection, error = %e, "vector search failed");
            UnavailableReason::Search
        })
    }
}

/// Validate a raw hit and apply payload defaults.
///
/// Missing `source_file` becomes `"unknown"`, missing `page` becomes 0, and
/// missing `chunk_id` falls back to the point id. A hit without text is
/// dropped, since it carries no evidence.
fn to_chunk_record(hit: IndexHit) -> Option<ChunkRecord> {
    let IndexHit { point_id, score, payload } = hit;

    let text = match payload.text {
        Some(text) if !text.trim().is_empty() => text,
        _ => {
            warn!(?point_id, "dropping hit without text");
            return None;
        }
    };

    let source_file = payload.source_file.unwrap_or_else(|| {
        debug!(?point_id, "hit missing source_file, using default");
        UNKNOWN_SOURCE.to_string()
    });
    let page = payload.page.unwrap_or_else(|| {
        debug!(?point_id, "hit missing page, using default");
        0
    });
    let chunk_id = match payload.chunk_id.or(point_id) {
        Some(id) => id,
        None => {
            debug!("hit has neither chunk_id nor numeric point id, using 0");
            0
        }
    };

    Some(ChunkRecord { text, source_file, page, chunk_id, score })
}
