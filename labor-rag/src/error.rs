//! Error types for the `labor-rag` crate.

use thiserror::Error;

/// Errors that can occur in retrieval-augmentation operations.
///
/// Only [`RagError::InvalidQuery`] and [`RagError::GenerationFailure`] are
/// expected to reach request handlers. Embedding and vector store errors are
/// absorbed by the [`ChunkRetriever`](crate::ChunkRetriever) on the query path
/// and only escalate from startup checks and ingestion.
#[derive(Debug, Error)]
pub enum RagError {
    /// The query was empty or `top_k` was zero.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector index backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The language model call failed.
    #[error("Generation failure ({provider}): {message}")]
    GenerationFailure {
        /// The language model provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The embedder and the collection disagree on vector size.
    #[error("Dimension mismatch: embedder produces {actual}-d vectors, collection expects {expected}")]
    DimensionMismatch {
        /// Vector size configured on the collection.
        expected: usize,
        /// Vector size reported by the embedder.
        actual: usize,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error while loading or indexing source documents.
    #[error("Ingestion error: {0}")]
    IngestError(String),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
