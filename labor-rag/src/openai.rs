//! OpenAI-compatible HTTP adapters for embeddings and chat completions.
//!
//! Both adapters talk to any server exposing the OpenAI REST shape (vLLM,
//! text-embeddings-inference, llama.cpp server, OpenAI itself). This module is
//! only available when the `openai` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::llm::{LanguageModel, normalize_content};

/// Default base URL for a locally served embedding model.
pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:8080/v1";

/// Default embedding model: a 384-dimensional sentence transformer.
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Dimensionality of [`DEFAULT_EMBEDDING_MODEL`].
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;

/// Default base URL for a locally served chat model (vLLM).
pub const DEFAULT_CHAT_URL: &str = "http://localhost:9090/v1";

/// Default served chat model name.
pub const DEFAULT_CHAT_MODEL: &str = "my-model";

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}

fn with_auth(request: reqwest::RequestBuilder, api_key: Option<&str>) -> reqwest::RequestBuilder {
    match api_key {
        Some(key) if !key.is_empty() => request.bearer_auth(key),
        _ => request,
    }
}

/// Pull a readable message out of an error body, falling back to the raw text.
fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

// ── API request/response types ─────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Value,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── Embedder ───────────────────────────────────────────────────────

/// An [`Embedder`] backed by an OpenAI-compatible `/embeddings` endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use labor_rag::openai::OpenAICompatibleEmbedder;
///
/// let embedder = OpenAICompatibleEmbedder::new("http://localhost:8080/v1")
///     .with_model("sentence-transformers/all-MiniLM-L6-v2", 384);
/// let embedding = embedder.embed("end of service award").await?;
/// ```
pub struct OpenAICompatibleEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    dimensions: usize,
}

impl OpenAICompatibleEmbedder {
    /// Create an embedder for `base_url` with the default model and dimensions.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: None,
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }

    /// Set the model name and the dimensionality it produces.
    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }

    /// Send a bearer token with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies, TLS).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn embedding_error(message: String) -> RagError {
        RagError::EmbeddingError { provider: "openai-compatible".into(), message }
    }
}

#[async_trait]
impl Embedder for OpenAICompatibleEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(model = %self.model, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| Self::embedding_error("API returned empty response".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(batch_size = texts.len(), model = %self.model, "embedding batch");

        let request_body = EmbeddingRequest { model: &self.model, input: texts.to_vec() };
        let request = self.client.post(endpoint(&self.base_url, "embeddings")).json(&request_body);

        let response = with_auth(request, self.api_key.as_deref()).send().await.map_err(|e| {
            error!(error = %e, "embedding request failed");
            Self::embedding_error(format!("request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, "embedding API error");
            return Err(Self::embedding_error(format!(
                "API returned {status}: {}",
                error_detail(body)
            )));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(error = %e, "failed to parse embedding response");
            Self::embedding_error(format!("failed to parse response: {e}"))
        })?;

        // Servers may return items out of order; `index` restores input order.
        parsed.data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ── Language model ─────────────────────────────────────────────────

/// A [`LanguageModel`] backed by an OpenAI-compatible `/chat/completions`
/// endpoint. The prompt is sent as a single user message.
///
/// # Example
///
/// ```rust,ignore
/// use labor_rag::openai::OpenAICompatibleChatModel;
///
/// let model = OpenAICompatibleChatModel::new("http://localhost:9090/v1", "my-model")
///     .with_api_key("EMPTY");
/// let text = model.generate(&prompt).await?;
/// ```
pub struct OpenAICompatibleChatModel {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl OpenAICompatibleChatModel {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: None,
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Send a bearer token with every request. vLLM accepts any value.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies, TLS).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn generation_failure(message: String) -> RagError {
        RagError::GenerationFailure { provider: "openai-compatible".into(), message }
    }
}

#[async_trait]
impl LanguageModel for OpenAICompatibleChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, prompt_len = prompt.len(), "requesting completion");

        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let request =
            self.client.post(endpoint(&self.base_url, "chat/completions")).json(&request_body);

        let response = with_auth(request, self.api_key.as_deref()).send().await.map_err(|e| {
            error!(error = %e, "chat request failed");
            Self::generation_failure(format!("request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, "chat API error");
            return Err(Self::generation_failure(format!(
                "API returned {status}: {}",
                error_detail(body)
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!(error = %e, "failed to parse chat response");
            Self::generation_failure(format!("failed to parse response: {e}"))
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Self::generation_failure("API returned no choices".into()))?;

        Ok(normalize_content(&choice.message.content))
    }
}
