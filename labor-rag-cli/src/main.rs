use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use labor_rag::formatter::provenance_tag;
use labor_rag::{
    AnswerService, Augmenter, Ingestor, RagError, RetrievalOutcome, format_context, load_documents,
};
use labor_rag_cli::{AppState, Cli, Command, Settings, init_tracing, run_server};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.settings.log_format);

    match cli.command {
        Command::Serve => serve(&cli.settings).await,
        Command::Ingest { dir, start_id, chunk_size, chunk_overlap, batch_size } => {
            let config = cli
                .settings
                .ingest_config(chunk_size, chunk_overlap, batch_size)
                .context("invalid ingestion settings")?;
            ingest(&cli.settings, &config, &dir, start_id).await
        }
        Command::Search { query, top_k } => {
            search(&cli.settings, &query, top_k.unwrap_or(cli.settings.default_top_k)).await
        }
        Command::Ask { query } => ask(&cli.settings, &query).await,
    }
}

fn build_augmenter(settings: &Settings) -> anyhow::Result<Augmenter> {
    let config = settings.rag_config().context("invalid retrieval settings")?;
    let index = settings.vector_index().context("failed to create Qdrant client")?;
    let embedder = settings.embedder().context("failed to create embedder")?;
    Augmenter::builder()
        .config(config)
        .embedder(Arc::new(embedder))
        .vector_index(Arc::new(index))
        .build()
        .context("failed to build augmenter")
}

/// Refuse to start on a dimension mismatch; tolerate an unreachable index.
async fn verify_dimensions(augmenter: &Augmenter) -> anyhow::Result<()> {
    match augmenter.check_dimensions().await {
        Ok(stats) => {
            info!(collection = %stats.name, points = stats.points_count, "collection ready");
            Ok(())
        }
        Err(e @ RagError::DimensionMismatch { .. }) => {
            Err(e).context("EMBEDDING_DIM does not match the collection")
        }
        Err(e) => {
            warn!(error = %e, "could not inspect collection, retrieval will fail open");
            Ok(())
        }
    }
}

async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let augmenter = Arc::new(build_augmenter(settings)?);
    verify_dimensions(&augmenter).await?;

    let answers = AnswerService::new(augmenter, Arc::new(settings.chat_model()?));
    let state = AppState::new(answers);
    run_server(settings.server_config(), state).await
}

async fn ingest(
    settings: &Settings,
    config: &labor_rag::RagConfig,
    dir: &Path,
    start_id: u64,
) -> anyhow::Result<()> {
    let pages = load_documents(dir)
        .await
        .with_context(|| format!("failed to load documents from {}", dir.display()))?;
    let index = settings.vector_index().context("failed to create Qdrant client")?;

    let ingestor = Ingestor::new(Arc::new(settings.embedder()?), Arc::new(index), config);
    let report = ingestor.ingest(&pages, start_id).await?;

    if !report.failed_batches.is_empty() {
        warn!(
            failed_batches = ?report.failed_batches,
            "some batches were not stored; re-run with --start-id {} to append",
            report.next_chunk_id
        );
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn search(settings: &Settings, query: &str, top_k: usize) -> anyhow::Result<()> {
    let augmenter = build_augmenter(settings)?;
    let outcome = augmenter.retrieve_outcome(query, top_k).await?;

    if let RetrievalOutcome::Unavailable(reason) = &outcome {
        warn!(%reason, "retrieval unavailable");
    }
    println!("{}", format_context(outcome.chunks()));
    Ok(())
}

async fn ask(settings: &Settings, query: &str) -> anyhow::Result<()> {
    let augmenter = Arc::new(build_augmenter(settings)?);
    let service = AnswerService::new(augmenter, Arc::new(settings.chat_model()?));
    let answer = service.answer(query).await?;

    println!("{}\n", answer.answer);
    for chunk in &answer.context_chunks {
        println!("  {}", provenance_tag(chunk));
    }
    info!(processing_time = answer.processing_time, "done");
    Ok(())
}
