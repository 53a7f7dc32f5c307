//! Augmentation orchestrator.
//!
//! The [`Augmenter`] sequences retrieve → format → compose for one question
//! and bundles the result as an [`AugmentedResponse`]. It carries no
//! per-request state; the collection name, `top_k`, and retrieval timeout
//! are fixed at construction.
//!
//! # Example
//!
//! ```rust,ignore
//! use labor_rag::{Augmenter, RagConfig};
//!
//! let augmenter = Augmenter::builder()
//!     .config(RagConfig::builder().top_k(5).build()?)
//!     .embedder(Arc::new(embedder))
//!     .vector_index(Arc::new(index))
//!     .build()?;
//!
//! augmenter.check_dimensions().await?;
//! let response = augmenter.augment("How many days of annual leave?").await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::config::RagConfig;
use crate::document::{AugmentedResponse, CollectionStats, RetrievalResult};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::formatter::format_context;
use crate::prompt::PromptTemplate;
use crate::retriever::{ChunkRetriever, RetrievalOutcome};
use crate::vectorstore::VectorIndex;

/// Stateless retrieval-augmentation façade.
///
/// Construct one via [`Augmenter::builder()`] and share it behind an `Arc`.
pub struct Augmenter {
    config: RagConfig,
    retriever: ChunkRetriever,
    template: PromptTemplate,
}

impl Augmenter {
    /// Create a new [`AugmenterBuilder`].
    pub fn builder() -> AugmenterBuilder {
        AugmenterBuilder::default()
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the underlying retriever.
    pub fn retriever(&self) -> &ChunkRetriever {
        &self.retriever
    }

    /// The prompt template used by [`augment`](Self::augment).
    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Verify that the embedder matches the collection's vector size.
    ///
    /// Run once at startup; the query path does not repeat the check.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] on disagreement, or the index
    /// error if the collection cannot be inspected.
    pub async fn check_dimensions(&self) -> Result<CollectionStats> {
        let stats = self.collection_stats().await?;
        let actual = self.retriever.embedder().dimensions();
        if stats.vector_size != actual {
            error!(
                collection = %stats.name,
                expected = stats.vector_size,
                actual,
                "embedder dimensionality does not match collection"
            );
            return Err(RagError::DimensionMismatch { expected: stats.vector_size, actual });
        }
        info!(collection = %stats.name, dimensions = actual, "embedder matches collection");
        Ok(stats)
    }

    /// Stats for the configured collection.
    ///
    /// # Errors
    ///
    /// Propagates the vector index error.
    pub async fn collection_stats(&self) -> Result<CollectionStats> {
        self.retriever.index().collection_stats(self.retriever.collection()).await
    }

    /// Search-only entry point. See [`ChunkRetriever::retrieve`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidQuery`] if `query` is blank or `top_k == 0`.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<RetrievalResult> {
        self.retriever.retrieve(query, top_k).await
    }

    /// Search-only entry point with a typed outcome.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidQuery`] if `query` is blank or `top_k == 0`.
    pub async fn retrieve_outcome(&self, query: &str, top_k: usize) -> Result<RetrievalOutcome> {
        self.retriever.retrieve_outcome(query, top_k).await
    }

    /// Retrieve with the configured `top_k`, format, and compose.
    ///
    /// An empty retrieval is not an error: the prompt then carries the
    /// no-information sentinel so the model is told no context was found.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidQuery`] if `query` is blank.
    pub async fn augment(&self, query: &str) -> Result<AugmentedResponse> {
        let outcome = self.retriever.retrieve_outcome(query, self.config.top_k).await?;
        let retrieval_status = outcome.status();
        let context_chunks = outcome.into_chunks();

        let formatted_context = format_context(&context_chunks);
        let rag_prompt = self.template.render(query, &formatted_context);

        info!(
            result_count = context_chunks.len(),
            status = ?retrieval_status,
            prompt_len = rag_prompt.len(),
            "augmented query"
        );

        Ok(AugmentedResponse {
            query: query.to_string(),
            num_context_chunks: context_chunks.len(),
            context_chunks,
            formatted_context,
            rag_prompt,
            prompt_version: self.template.version.to_string(),
            retrieval_status,
        })
    }
}

/// Builder for constructing an [`Augmenter`].
///
/// `embedder` and `vector_index` are required. `config` defaults to
/// [`RagConfig::default()`] and `template` to [`PromptTemplate::CURRENT`].
#[derive(Default)]
pub struct AugmenterBuilder {
    config: Option<RagConfig>,
    embedder: Option<Arc<dyn Embedder>>,
    vector_index: Option<Arc<dyn VectorIndex>>,
    template: Option<PromptTemplate>,
}

impl AugmenterBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the query embedder.
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the vector index backend.
    pub fn vector_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.vector_index = Some(index);
        self
    }

    /// Pin a specific prompt template version.
    pub fn template(mut self, template: PromptTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Build the [`Augmenter`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or
    /// the configuration is invalid.
    pub fn build(self) -> Result<Augmenter> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedder =
            self.embedder.ok_or_else(|| RagError::ConfigError("embedder is required".to_string()))?;
        let vector_index = self
            .vector_index
            .ok_or_else(|| RagError::ConfigError("vector_index is required".to_string()))?;

        let retriever = ChunkRetriever::new(
            embedder,
            vector_index,
            config.collection.clone(),
            config.retrieval_timeout(),
        );

        Ok(Augmenter { config, retriever, template: self.template.unwrap_or_default() })
    }
}
