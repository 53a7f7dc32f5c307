//! HTTP API and command-line launcher for the labor-law question answering
//! service.
//!
//! The binary wires Qdrant, an OpenAI-compatible embedder, and an
//! OpenAI-compatible chat model into [`labor_rag`] and exposes them over
//! axum. The router is public so tests can serve it with in-memory parts.

pub mod server;
pub mod settings;
pub mod telemetry;

pub use server::{AppState, ServerConfig, app_router, run_server};
pub use settings::{Cli, Command, Settings};
pub use telemetry::{LogFormat, init_tracing};
