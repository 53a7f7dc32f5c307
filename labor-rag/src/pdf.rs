//! PDF page extraction for ingestion.
//!
//! Each PDF page becomes one [`SourcePage`] numbered from 0. Text comes from
//! [lopdf](https://docs.rs/lopdf)'s content-stream extraction, so scanned
//! pages without a text layer come back blank and are skipped. This module is
//! only available when the `pdf` feature is enabled.

use std::path::{Path, PathBuf};

use lopdf::Document;
use tracing::{info, warn};

use crate::document::SourcePage;
use crate::error::{RagError, Result};
use crate::ingest::{list_files, source_label};

/// Read every `*.pdf` file in `dir` (sorted by name) into pages.
///
/// # Errors
///
/// Returns [`RagError::IngestError`] if the directory cannot be listed or a
/// file is not a readable PDF.
pub async fn load_pdf_directory(dir: impl AsRef<Path>) -> Result<Vec<SourcePage>> {
    let mut pages = Vec::new();
    for path in list_files(dir.as_ref(), "pdf").await? {
        let document_pages = load_pdf(path).await?;
        pages.extend(document_pages);
    }
    Ok(pages)
}

/// Extract the non-blank pages of one PDF off the async runtime.
///
/// # Errors
///
/// Returns [`RagError::IngestError`] if the file cannot be parsed.
pub async fn load_pdf(path: PathBuf) -> Result<Vec<SourcePage>> {
    tokio::task::spawn_blocking(move || extract_pdf_pages(&path))
        .await
        .map_err(|e| RagError::IngestError(format!("PDF extraction task failed: {e}")))?
}

/// Synchronous core of [`load_pdf`].
///
/// A page whose text cannot be decoded is skipped with a warning; the rest of
/// the document is still returned.
///
/// # Errors
///
/// Returns [`RagError::IngestError`] if the file cannot be parsed.
pub fn extract_pdf_pages(path: &Path) -> Result<Vec<SourcePage>> {
    let document = Document::load(path).map_err(|e| {
        RagError::IngestError(format!("cannot read PDF '{}': {e}", path.display()))
    })?;
    let source_file = source_label(path);

    let numbers: Vec<u32> = document.get_pages().into_keys().collect();
    let mut pages = Vec::with_capacity(numbers.len());
    for number in &numbers {
        let page = u64::from(number.saturating_sub(1));
        match document.extract_text(&[*number]) {
            Ok(text) if !text.trim().is_empty() => {
                pages.push(SourcePage { source_file: source_file.clone(), page, text });
            }
            Ok(_) => {}
            Err(e) => warn!(file = %source_file, page, error = %e, "skipping unreadable page"),
        }
    }

    info!(file = %source_file, total_pages = numbers.len(), pages = pages.len(), "loaded PDF");
    Ok(pages)
}
