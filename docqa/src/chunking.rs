//! Document segmentation.
//!
//! This module provides the [`Chunker`] trait and [`FixedSizeChunker`], which
//! walks each page with a fixed-size window and configurable overlap.

use crate::config::{RagConfig, validate_chunking};
use crate::document::{Page, Segment};
use crate::error::Result;

/// A strategy for splitting extracted pages into segments.
///
/// Implementations must be deterministic: identical pages and parameters
/// always produce identical segments, because index cache keys depend on it.
pub trait Chunker: Send + Sync {
    /// Split pages into segments owned by `document_id`.
    ///
    /// Segments are returned in page order, then in position order within a
    /// page. Empty pages contribute no segments.
    fn chunk(&self, document_id: &str, pages: &[Page]) -> Vec<Segment>;

    /// A stable description of the chunking parameters, used in cache keys.
    fn cache_key(&self) -> String;
}

/// Splits each page into windows of at most `chunk_size` characters.
///
/// Consecutive segments of the same page share `chunk_overlap` characters.
/// Lengths are counted in Unicode scalar values, so a window never cuts a
/// multi-byte character. Segment source IDs are `{page}-{n}` where `n`
/// restarts at zero on every page.
///
/// # Example
///
/// ```rust,ignore
/// use docqa::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(300, 0)?;
/// let document = Document::from_pages("tender.pdf", &pages, &chunker)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per segment
    /// * `chunk_overlap`: number of characters shared by consecutive segments
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`](crate::RagError::ConfigError) if
    /// `chunk_size` is zero or `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_chunking(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Create a chunker from the `chunk_size` and `chunk_overlap` of `config`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`FixedSizeChunker::new`].
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Return `(chunk_size, chunk_overlap)`.
    pub fn params(&self) -> (usize, usize) {
        (self.chunk_size, self.chunk_overlap)
    }

    /// Split a single string into overlapping windows.
    pub fn split_text<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every character boundary, including the end.
        let boundaries: Vec<usize> =
            text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        let char_count = boundaries.len() - 1;
        let step = self.chunk_size - self.chunk_overlap;

        let mut windows = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(char_count);
            windows.push(&text[boundaries[start]..boundaries[end]]);
            if end == char_count {
                break;
            }
            start += step;
        }
        windows
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document_id: &str, pages: &[Page]) -> Vec<Segment> {
        pages
            .iter()
            .flat_map(|page| {
                self.split_text(&page.text).into_iter().enumerate().map(move |(index, text)| {
                    Segment {
                        source_id: Segment::source_id_for(page.number, index),
                        text: text.to_string(),
                        document_id: document_id.to_string(),
                        page: page.number,
                        index,
                    }
                })
            })
            .collect()
    }

    fn cache_key(&self) -> String {
        format!("fixed:{}:{}", self.chunk_size, self.chunk_overlap)
    }
}
