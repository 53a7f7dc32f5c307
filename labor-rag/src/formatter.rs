//! Renders retrieved chunks into the evidence block handed to the prompt.

use crate::document::ChunkRecord;

/// Returned for an empty chunk list. Signals zero evidence, not citable content.
pub const NO_CONTEXT_SENTINEL: &str =
    "No relevant information found in the Saudi Labor Law documents.";

const HEADER: &str = "=== RELEVANT SAUDI LABOR LAW INFORMATION ===\n";
const SEPARATOR: &str = "---";
const FOOTER: &str = "=== END CONTEXT ===";

/// Render `chunks` in the given order with 1-based sequence numbers.
///
/// Each entry is a provenance line
/// `Context {n}: [Source: {source_file}, Page: {page}, Relevance: {score:.3}]`,
/// then the chunk text, then a `---` separator. The output depends only on
/// the input, so identical lists render byte-identically.
///
/// ```
/// use labor_rag::{format_context, NO_CONTEXT_SENTINEL};
///
/// assert_eq!(format_context(&[]), NO_CONTEXT_SENTINEL);
/// ```
pub fn format_context(chunks: &[ChunkRecord]) -> String {
    if chunks.is_empty() {
        return NO_CONTEXT_SENTINEL.to_string();
    }

    let mut lines: Vec<String> = Vec::with_capacity(chunks.len() * 3 + 2);
    lines.push(HEADER.to_string());
    for (i, chunk) in chunks.iter().enumerate() {
        lines.push(format!("Context {}: {}", i + 1, provenance_tag(chunk)));
        lines.push(chunk.text.clone());
        lines.push(SEPARATOR.to_string());
    }
    lines.push(FOOTER.to_string());

    lines.join("\n")
}

/// `[Source: ..., Page: ..., Relevance: ...]` for one chunk.
pub fn provenance_tag(chunk: &ChunkRecord) -> String {
    format!(
        "[Source: {}, Page: {}, Relevance: {:.3}]",
        chunk.source_file, chunk.page, chunk.score
    )
}
