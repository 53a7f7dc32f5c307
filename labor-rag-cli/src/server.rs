//! HTTP transport: an axum router over the answer service.
//!
//! Request and response bodies keep the field names existing clients send
//! and read (`question`, `max_context_chunks`, `relevance_score`, ...).

use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{
        FromRequest, FromRequestParts, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use labor_rag::{Answer, AnswerService, Augmenter, ChunkRecord, RagError, RetrievalOutcome};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Characters of chunk text returned by `/ask` before truncation.
const CONTEXT_PREVIEW_CHARS: usize = 500;

#[derive(Clone)]
pub struct AppState {
    pub answers: AnswerService,
}

impl AppState {
    pub fn new(answers: AnswerService) -> Self {
        Self { answers }
    }

    fn augmenter(&self) -> &Augmenter {
        self.answers.augmenter()
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7500,
            cors_origin: "http://localhost:5173".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
    #[serde(default)]
    pub include_context: bool,
    #[serde(default = "default_max_context_chunks")]
    pub max_context_chunks: usize,
}

fn default_max_context_chunks() -> usize {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextChunk {
    pub text: String,
    pub source_file: String,
    pub page: u64,
    pub score: f32,
    pub chunk_id: u64,
}

impl From<&ChunkRecord> for ContextChunk {
    fn from(chunk: &ChunkRecord) -> Self {
        Self {
            text: preview(&chunk.text),
            source_file: chunk.source_file.clone(),
            page: chunk.page,
            score: chunk.score,
            chunk_id: chunk.chunk_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub question: String,
    pub answer: String,
    pub processing_time: f64,
    pub context_used: bool,
    pub context_chunks: Option<Vec<ContextChunk>>,
    pub num_context_chunks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub text: String,
    pub source_file: String,
    pub page: u64,
    pub relevance_score: f32,
    pub chunk_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub num_results: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SimpleQuestion {
    question: String,
}

/// Truncate to [`CONTEXT_PREVIEW_CHARS`] chars, marking the cut with `...`.
fn preview(text: &str) -> String {
    match text.char_indices().nth(CONTEXT_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// An error rendered as `{"detail": ...}` with a matching status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self { status, detail: detail.into() }
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        let status = match &err {
            RagError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            RagError::GenerationFailure { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(detail = %self.detail, status = %self.status, "request failed");
        } else {
            debug!(detail = %self.detail, status = %self.status, "request rejected");
        }
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// JSON body extractor whose rejections use the `{"detail"}` error shape.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections use the `{"detail"}` error shape.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);
    match HeaderValue::from_str(origin) {
        Ok(value) => cors.allow_origin(AllowOrigin::exact(value)),
        Err(_) => {
            warn!(origin, "invalid CORS origin, cross-origin requests will be refused");
            cors
        }
    }
}

pub fn app_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/ask", post(ask))
        .route("/search", post(search))
        .route("/ask-simple", post(ask_simple))
        .route("/stats", get(stats))
        .with_state(state)
        .layer(cors_layer(&config.cors_origin))
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = app_router(state, &config);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for labor-rag server")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("labor-rag listening on http://{}", addr);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn index() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to Saudi Labor Law Chatbot with RAG",
        "version": env!("CARGO_PKG_VERSION"),
        "features": [
            "Retrieval-Augmented Generation",
            "Saudi Labor Law expertise",
            "Context-aware responses"
        ],
        "endpoints": {
            "/ask": "POST - Ask questions about Saudi Labor Law",
            "/ask-simple": "POST - Ask with a minimal response",
            "/search": "POST - Search for relevant law sections",
            "/stats": "GET - Collection statistics",
            "/health": "GET - Health check"
        }
    }))
}

async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let augmenter = state.augmenter();
    let collection = augmenter.config().collection.as_str();
    let outcome = augmenter.retrieve_outcome("health check", 1).await?;

    if let RetrievalOutcome::Unavailable(reason) = outcome {
        warn!(collection, %reason, "health check failed");
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Service unhealthy: {reason}"),
        ));
    }

    let timestamp = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
    Ok(Json(json!({
        "status": "healthy",
        "rag_system": "operational",
        "collection": collection,
        "timestamp": timestamp,
    })))
}

async fn ask(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<QuestionRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Answer {
        question,
        answer,
        processing_time,
        context_used,
        context_chunks,
        num_context_chunks,
        ..
    } = state.answers.answer(&request.question).await?;

    let context_chunks = request
        .include_context
        .then(|| context_chunks.iter().map(ContextChunk::from).collect());

    Ok(Json(ChatResponse {
        question,
        answer,
        processing_time,
        context_used,
        context_chunks,
        num_context_chunks,
    }))
}

async fn search(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<QuestionRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let chunks = state
        .augmenter()
        .retrieve(&request.question, request.max_context_chunks)
        .await?;

    let results: Vec<SearchHit> = chunks
        .into_iter()
        .map(|chunk| SearchHit {
            text: chunk.text,
            source_file: chunk.source_file,
            page: chunk.page,
            relevance_score: chunk.score,
            chunk_id: chunk.chunk_id,
        })
        .collect();

    Ok(Json(SearchResponse {
        query: request.question,
        num_results: results.len(),
        results,
    }))
}

async fn ask_simple(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SimpleQuestion>,
) -> Result<impl IntoResponse, ApiError> {
    let answer = state.answers.answer(&params.question).await?;
    Ok(Json(json!({
        "question": answer.question,
        "answer": answer.answer,
        "context_sources": answer.num_context_chunks,
    })))
}

async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let augmenter = state.augmenter();
    let stats = augmenter.collection_stats().await?;
    Ok(Json(json!({
        "collection_name": stats.name,
        "total_documents": stats.points_count,
        "vector_dimension": stats.vector_size,
        "distance_metric": stats.distance,
        "rag_settings": {
            "default_top_k": augmenter.config().top_k,
            "embedding_model": augmenter.retriever().embedder().model_name(),
            "prompt_template": augmenter.template().version,
        }
    })))
}
