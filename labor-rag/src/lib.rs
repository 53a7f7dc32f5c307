//! Retrieval-augmentation core for the labor-law question answering service.
//!
//! A question flows strictly forward through four stages:
//!
//! ```text
//! query -> Embedder -> VectorIndex (cosine top-k) -> ChunkRecord list
//!       -> format_context -> compose -> AugmentedResponse
//! ```
//!
//! The [`Augmenter`] sequences the stages. Capability handles (embedder,
//! vector index, language model) are injected as `Arc<dyn Trait>` so the
//! whole pipeline runs against fakes in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use labor_rag::{Augmenter, InMemoryVectorIndex, RagConfig};
//!
//! let augmenter = Augmenter::builder()
//!     .config(RagConfig::default())
//!     .embedder(Arc::new(my_embedder))
//!     .vector_index(Arc::new(InMemoryVectorIndex::new()))
//!     .build()?;
//!
//! let response = augmenter.augment("What are the working hours?").await?;
//! println!("{}", response.rag_prompt);
//! ```
//!
//! # Features
//!
//! - `openai`: OpenAI-compatible HTTP embedder and chat model (`reqwest`).
//! - `qdrant`: [`qdrant::QdrantVectorIndex`] over gRPC.
//! - `pdf`: PDF page extraction for ingestion (`lopdf`).

pub mod answer;
pub mod augment;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod formatter;
pub mod ingest;
pub mod inmemory;
pub mod llm;
pub mod prompt;
pub mod retriever;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "qdrant")]
pub mod qdrant;

#[cfg(feature = "pdf")]
pub mod pdf;

pub use answer::{Answer, AnswerService};
pub use augment::{Augmenter, AugmenterBuilder};
pub use chunking::{TextChunk, TextSplitter};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{
    AugmentedResponse, ChunkPayload, ChunkRecord, CollectionStats, HitPayload, IndexHit,
    IndexedPoint, RetrievalResult, SourcePage,
};
pub use embedding::Embedder;
pub use error::{RagError, Result};
pub use formatter::{NO_CONTEXT_SENTINEL, format_context};
pub use ingest::{IngestReport, Ingestor, load_documents, load_text_directory};
pub use inmemory::InMemoryVectorIndex;
pub use llm::{LanguageModel, normalize_content};
pub use prompt::{PromptTemplate, compose};
pub use retriever::{ChunkRetriever, RetrievalOutcome, RetrievalStatus, UnavailableReason};
pub use vectorstore::VectorIndex;
