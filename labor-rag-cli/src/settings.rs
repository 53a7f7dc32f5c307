//! Command-line and environment configuration.
//!
//! Every setting can come from a flag, an environment variable, or a `.env`
//! file loaded before parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use labor_rag::{RagConfig, RagError};
use labor_rag::config::DEFAULT_COLLECTION;
use labor_rag::openai::{
    DEFAULT_CHAT_MODEL, DEFAULT_CHAT_URL, DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_EMBEDDING_URL, OpenAICompatibleChatModel, OpenAICompatibleEmbedder,
};
use labor_rag::qdrant::QdrantVectorIndex;

use crate::server::ServerConfig;
use crate::telemetry::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "labor-rag")]
#[command(about = "Saudi Labor Law question answering with retrieval-augmented generation")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP API
    Serve,
    /// Chunk, embed, and store every .pdf and .txt document in a directory
    Ingest {
        /// Directory holding PDFs or extracted page text (form feed between pages)
        dir: PathBuf,
        /// First chunk id to assign
        #[arg(long, default_value_t = 0)]
        start_id: u64,
        /// Maximum characters per chunk
        #[arg(long, env = "CHUNK_SIZE", default_value_t = 500)]
        chunk_size: usize,
        /// Characters shared by consecutive chunks
        #[arg(long, env = "CHUNK_OVERLAP", default_value_t = 50)]
        chunk_overlap: usize,
        /// Chunks embedded and upserted per request
        #[arg(long, env = "BATCH_SIZE", default_value_t = 100)]
        batch_size: usize,
    },
    /// Print the chunks retrieved for a query
    Search {
        query: String,
        /// Number of chunks to return (defaults to TOP_K)
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Answer a question using retrieved context
    Ask { query: String },
}

#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Qdrant gRPC endpoint
    #[arg(long, env = "QDRANT_URL", default_value = "http://localhost:6334", global = true)]
    pub qdrant_url: String,

    #[arg(long, env = "QDRANT_API_KEY", global = true, hide_env_values = true)]
    pub qdrant_api_key: Option<String>,

    #[arg(long, env = "COLLECTION_NAME", default_value = DEFAULT_COLLECTION, global = true)]
    pub collection: String,

    /// Chunks retrieved per question
    #[arg(long, env = "TOP_K", default_value_t = 5, global = true)]
    pub default_top_k: usize,

    #[arg(long, env = "RETRIEVAL_TIMEOUT_MS", default_value_t = 10_000, global = true)]
    pub retrieval_timeout_ms: u64,

    /// OpenAI-compatible embeddings base URL
    #[arg(long, env = "EMBEDDING_URL", default_value = DEFAULT_EMBEDDING_URL, global = true)]
    pub embedding_url: String,

    #[arg(long, env = "EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL, global = true)]
    pub embedding_model: String,

    /// Must match the collection's vector size
    #[arg(
        long,
        env = "EMBEDDING_DIM",
        default_value_t = DEFAULT_EMBEDDING_DIMENSIONS,
        global = true
    )]
    pub embedding_dim: usize,

    #[arg(long, env = "EMBEDDING_API_KEY", global = true, hide_env_values = true)]
    pub embedding_api_key: Option<String>,

    /// OpenAI-compatible chat completions base URL
    #[arg(long, env = "LLM_BASE_URL", default_value = DEFAULT_CHAT_URL, global = true)]
    pub llm_base_url: String,

    #[arg(long, env = "LLM_MODEL", default_value = DEFAULT_CHAT_MODEL, global = true)]
    pub llm_model: String,

    #[arg(
        long,
        env = "LLM_API_KEY",
        default_value = "EMPTY",
        global = true,
        hide_env_values = true
    )]
    pub llm_api_key: String,

    /// Sampling temperature; the server default when unset
    #[arg(long, env = "LLM_TEMPERATURE", global = true)]
    pub llm_temperature: Option<f32>,

    /// Completion length cap; the server default when unset
    #[arg(long, env = "LLM_MAX_TOKENS", global = true)]
    pub llm_max_tokens: Option<u32>,

    /// Timeout for each embedding and chat HTTP request
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 120, global = true)]
    pub request_timeout_secs: u64,

    #[arg(long, env = "HOST", default_value = "0.0.0.0", global = true)]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 7500, global = true)]
    pub port: u16,

    /// Origin allowed by CORS
    #[arg(long, env = "CORS_ORIGIN", default_value = "http://localhost:5173", global = true)]
    pub cors_origin: String,

    #[arg(
        long,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty,
        global = true
    )]
    pub log_format: LogFormat,
}

impl Settings {
    /// Retrieval settings with default chunking.
    pub fn rag_config(&self) -> labor_rag::Result<RagConfig> {
        self.rag_config_builder().build()
    }

    /// Retrieval settings with explicit chunking, for ingestion.
    pub fn ingest_config(
        &self,
        chunk_size: usize,
        chunk_overlap: usize,
        batch_size: usize,
    ) -> labor_rag::Result<RagConfig> {
        self.rag_config_builder()
            .chunk_size(chunk_size)
            .chunk_overlap(chunk_overlap)
            .batch_size(batch_size)
            .build()
    }

    fn rag_config_builder(&self) -> labor_rag::RagConfigBuilder {
        RagConfig::builder()
            .collection(&self.collection)
            .top_k(self.default_top_k)
            .retrieval_timeout(Duration::from_millis(self.retrieval_timeout_ms))
    }

    /// HTTP client shared by the embedding and chat adapters.
    fn http_client(&self) -> labor_rag::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .build()
            .map_err(|e| RagError::ConfigError(format!("failed to build HTTP client: {e}")))
    }

    pub fn embedder(&self) -> labor_rag::Result<OpenAICompatibleEmbedder> {
        let embedder = OpenAICompatibleEmbedder::new(&self.embedding_url)
            .with_model(&self.embedding_model, self.embedding_dim)
            .with_client(self.http_client()?);
        Ok(match &self.embedding_api_key {
            Some(key) => embedder.with_api_key(key),
            None => embedder,
        })
    }

    pub fn vector_index(&self) -> labor_rag::Result<QdrantVectorIndex> {
        match &self.qdrant_api_key {
            Some(key) if !key.is_empty() => QdrantVectorIndex::with_api_key(&self.qdrant_url, key),
            _ => QdrantVectorIndex::new(&self.qdrant_url),
        }
    }

    pub fn chat_model(&self) -> labor_rag::Result<OpenAICompatibleChatModel> {
        let mut model = OpenAICompatibleChatModel::new(&self.llm_base_url, &self.llm_model)
            .with_api_key(&self.llm_api_key)
            .with_client(self.http_client()?);
        if let Some(temperature) = self.llm_temperature {
            model = model.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.llm_max_tokens {
            model = model.with_max_tokens(max_tokens);
        }
        Ok(model)
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            cors_origin: self.cors_origin.clone(),
        }
    }
}
