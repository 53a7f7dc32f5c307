//! Recursive text splitting for the ingestion job.
//!
//! Text is split on paragraph breaks first, then line breaks, then spaces,
//! and finally by raw character windows. Sizes are counted in `char`s, so
//! Arabic and other multi-byte text is never cut inside a code point.

use crate::document::SourcePage;

const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// A chunk of one source page, before embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub source_file: String,
    pub page: u64,
    pub text: String,
}

/// Splits text hierarchically: paragraphs → lines → words → characters.
///
/// Consecutive chunks share up to `chunk_overlap` trailing characters of the
/// previous chunk, trimmed forward to a word boundary.
///
/// # Example
///
/// ```rust
/// use labor_rag::TextSplitter;
///
/// let splitter = TextSplitter::new(40, 10);
/// let chunks = splitter.split("Article 98\n\nA worker may not work more than eight hours a day.");
/// assert!(chunks.iter().all(|c| c.chars().count() <= 40));
/// ```
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Create a new `TextSplitter`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk (at least 1)
    /// * `chunk_overlap`: characters carried over between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }

    /// Split `text` into trimmed, non-empty chunks of at most `chunk_size` chars.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.split_and_merge(text, &SEPARATORS)
            .into_iter()
            .map(|chunk| chunk.trim().to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }

    /// Split every page, keeping page order and provenance.
    pub fn split_pages(&self, pages: &[SourcePage]) -> Vec<TextChunk> {
        pages
            .iter()
            .flat_map(|page| {
                self.split(&page.text).into_iter().map(move |text| TextChunk {
                    source_file: page.source_file.clone(),
                    page: page.page,
                    text,
                })
            })
            .collect()
    }

    /// Split by the first separator, merge segments up to `chunk_size`, and
    /// recurse with the remaining separators on anything still too large.
    fn split_and_merge(&self, text: &str, separators: &[&str]) -> Vec<String> {
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }
        let Some((separator, remaining)) = separators.split_first() else {
            return self.split_by_size(text);
        };

        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();

        for segment in split_keeping_separator(text, separator) {
            if current.is_empty() || char_len(&current) + char_len(segment) <= self.chunk_size {
                current.push_str(segment);
                continue;
            }

            self.flush(&mut chunks, std::mem::take(&mut current), remaining);

            let overlap = chunks.last().map(|last| self.overlap_tail(last)).unwrap_or_default();
            if !overlap.is_empty() && char_len(overlap) + char_len(segment) <= self.chunk_size {
                current.push_str(overlap);
            }
            current.push_str(segment);
        }

        if !current.is_empty() {
            self.flush(&mut chunks, current, remaining);
        }

        chunks
    }

    fn flush(&self, chunks: &mut Vec<String>, text: String, separators: &[&str]) {
        if char_len(&text) > self.chunk_size {
            chunks.extend(self.split_and_merge(&text, separators));
        } else {
            chunks.push(text);
        }
    }

    /// Last `chunk_overlap` chars of `chunk`, starting after the first
    /// whitespace so the carried-over text begins on a word.
    fn overlap_tail<'a>(&self, chunk: &'a str) -> &'a str {
        if self.chunk_overlap == 0 {
            return "";
        }
        let total = char_len(chunk);
        let start = byte_offset(chunk, total.saturating_sub(self.chunk_overlap));
        let tail = &chunk[start..];
        match tail.find(char::is_whitespace) {
            Some(pos) if start > 0 => tail[pos..].trim_start(),
            _ => tail,
        }
    }

    /// Character windows of `chunk_size` with `chunk_overlap` shared chars.
    fn split_by_size(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(500, 50)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the `n`th char, or `s.len()` past the end.
fn byte_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

/// Split text at a separator while keeping the separator attached to the
/// preceding segment, so concatenating the segments restores the input.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}
