//! Offline ingestion: source pages → chunks → embeddings → index.
//!
//! Source documents are PDFs (with the `pdf` feature, see [`crate::pdf`]) or
//! plain-text extractions such as `pdftotext` output, one `.txt` file per
//! document with pages separated by form feeds. Every chunk gets a sequential `chunk_id` that doubles as its point id, so
//! the payload written here is exactly what the retriever reads back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::chunking::{TextChunk, TextSplitter};
use crate::config::RagConfig;
use crate::document::{ChunkPayload, IndexedPoint, SourcePage};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorIndex;

/// Page separator emitted by `pdftotext`.
pub const PAGE_BREAK: char = '\x0c';

/// Summary of one ingestion run.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct IngestReport {
    pub chunks_total: usize,
    pub points_stored: usize,
    /// Zero-based indices of batches that failed to embed or upsert.
    pub failed_batches: Vec<usize>,
    /// First `chunk_id` not assigned by this run.
    pub next_chunk_id: u64,
}

/// Paths in `dir` with extension `ext` (case-insensitive), sorted by name.
pub(crate) async fn list_files(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        RagError::IngestError(format!("cannot read directory '{}': {e}", dir.display()))
    })?;

    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| {
        RagError::IngestError(format!("cannot list directory '{}': {e}", dir.display()))
    })? {
        let path = entry.path();
        if path.extension().is_some_and(|found| found.eq_ignore_ascii_case(ext)) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// File name stored as `source_file` in chunk payloads.
pub(crate) fn source_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Read every `*.txt` file in `dir` (sorted by name) into pages.
///
/// Pages are numbered from 0 in file order. Blank pages keep their number
/// but are not returned.
///
/// # Errors
///
/// Returns [`RagError::IngestError`] if the directory or a file cannot be read.
pub async fn load_text_directory(dir: impl AsRef<Path>) -> Result<Vec<SourcePage>> {
    let mut pages = Vec::new();
    for path in list_files(dir.as_ref(), "txt").await? {
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            RagError::IngestError(format!("cannot read '{}': {e}", path.display()))
        })?;
        let source_file = source_label(&path);

        let before = pages.len();
        pages.extend(split_pages(&source_file, &content));
        info!(file = %source_file, pages = pages.len() - before, "loaded document");
    }
    Ok(pages)
}

/// Read every supported document in `dir`: `*.pdf` files when the `pdf`
/// feature is enabled, and `*.txt` extractions.
///
/// Pages are grouped by file name in sorted order.
///
/// # Errors
///
/// Returns [`RagError::IngestError`] if the directory or a file cannot be read.
pub async fn load_documents(dir: impl AsRef<Path>) -> Result<Vec<SourcePage>> {
    let dir = dir.as_ref();
    #[cfg(feature = "pdf")]
    let mut pages = crate::pdf::load_pdf_directory(dir).await?;
    #[cfg(not(feature = "pdf"))]
    let mut pages = Vec::new();

    pages.extend(load_text_directory(dir).await?);
    pages.sort_by(|a, b| a.source_file.cmp(&b.source_file));

    if pages.is_empty() {
        warn!(dir = %dir.display(), "no document pages found");
    }
    Ok(pages)
}

/// Split one document's text on [`PAGE_BREAK`] into numbered pages.
pub fn split_pages(source_file: &str, content: &str) -> Vec<SourcePage> {
    content
        .split(PAGE_BREAK)
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(page, text)| SourcePage {
            source_file: source_file.to_string(),
            page: page as u64,
            text: text.to_string(),
        })
        .collect()
}

/// Populates one collection from source pages.
///
/// Ingestion is the only writer to the index and runs out of band from
/// query traffic.
pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    collection: String,
    splitter: TextSplitter,
    batch_size: usize,
}

impl Ingestor {
    /// Create an ingestor using the collection, chunking, and batch settings
    /// from `config`.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        config: &RagConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            collection: config.collection.clone(),
            splitter: TextSplitter::new(config.chunk_size, config.chunk_overlap),
            batch_size: config.batch_size.max(1),
        }
    }

    /// Chunk, embed, and upsert `pages`, numbering chunks from `start_id`.
    ///
    /// Chunk ids are assigned from each chunk's global position, so a failed
    /// batch leaves a gap instead of shifting the ids of later batches.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IngestError`] if the collection cannot be created.
    /// Per-batch embedding or upsert failures are logged and reported in
    /// [`IngestReport::failed_batches`].
    pub async fn ingest(&self, pages: &[SourcePage], start_id: u64) -> Result<IngestReport> {
        let chunks = self.splitter.split_pages(pages);
        let mut report = IngestReport {
            chunks_total: chunks.len(),
            next_chunk_id: start_id + chunks.len() as u64,
            ..IngestReport::default()
        };
        if chunks.is_empty() {
            warn!(collection = %self.collection, "nothing to ingest");
            return Ok(report);
        }

        let dimensions = self.embedder.dimensions();
        self.index.create_collection(&self.collection, dimensions).await.map_err(|e| {
            error!(collection = %self.collection, error = %e, "failed to create collection");
            RagError::IngestError(format!("failed to create collection '{}': {e}", self.collection))
        })?;

        for (batch_no, batch) in chunks.chunks(self.batch_size).enumerate() {
            let first_id = start_id + (batch_no * self.batch_size) as u64;
            match self.store_batch(batch, first_id).await {
                Ok(stored) => {
                    report.points_stored += stored;
                    info!(batch = batch_no + 1, points = stored, "stored batch");
                }
                Err(e) => {
                    error!(batch = batch_no + 1, error = %e, "batch failed, skipping");
                    report.failed_batches.push(batch_no);
                }
            }
        }

        info!(
            collection = %self.collection,
            chunks_total = report.chunks_total,
            points_stored = report.points_stored,
            failed_batches = report.failed_batches.len(),
            "ingestion finished"
        );
        Ok(report)
    }

    async fn store_batch(&self, batch: &[TextChunk], first_id: u64) -> Result<usize> {
        let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != batch.len() {
            return Err(RagError::IngestError(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                batch.len()
            )));
        }

        let points: Vec<IndexedPoint> = batch
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (chunk, vector))| {
                IndexedPoint::new(
                    vector,
                    ChunkPayload {
                        text: chunk.text.clone(),
                        source_file: chunk.source_file.clone(),
                        page: chunk.page,
                        chunk_id: first_id + i as u64,
                    },
                )
            })
            .collect();

        self.index.upsert(&self.collection, &points).await?;
        Ok(points.len())
    }
}
