//! Data types for pages, segments, documents and query results.

use serde::{Deserialize, Serialize};

use crate::chunking::Chunker;
use crate::error::{RagError, Result};
use crate::fingerprint;

/// Raw text extracted from one page (or other logical unit) of an upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub number: u32,
    /// The extracted text of the page.
    pub text: String,
}

impl Page {
    /// Create a page from its number and text.
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self { number, text: text.into() }
    }
}

/// A bounded, source-traceable slice of document text.
///
/// Segments are created once by a [`Chunker`] and never modified afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Segment {
    /// Citation token of the form `"{page}-{index}"`, unique within its document.
    pub source_id: String,
    /// The literal segment text.
    pub text: String,
    /// The ID of the owning [`Document`].
    pub document_id: String,
    /// Page the segment was cut from.
    pub page: u32,
    /// Position of the segment within its page.
    pub index: usize,
}

impl Segment {
    /// Format the source identifier for a page and per-page index.
    pub fn source_id_for(page: u32, index: usize) -> String {
        format!("{page}-{index}")
    }
}

/// An ordered sequence of segments derived from one uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Content fingerprint of the extracted pages.
    pub id: String,
    /// Display name, usually the uploaded file name.
    pub name: String,
    /// Cache key of the chunker that produced the segments.
    pub chunking: String,
    /// Segments in original document order.
    pub segments: Vec<Segment>,
}

impl Document {
    /// Segment extracted pages into a document.
    ///
    /// The document ID is derived from the page contents, so the same pages
    /// always produce the same ID and the same segments.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidDocument`] if page numbers are not strictly
    /// increasing, since that would break source identifier uniqueness.
    pub fn from_pages(
        name: impl Into<String>,
        pages: &[Page],
        chunker: &dyn Chunker,
    ) -> Result<Self> {
        if let Some(pair) = pages.windows(2).find(|w| w[0].number >= w[1].number) {
            return Err(RagError::InvalidDocument(format!(
                "page numbers must be strictly increasing (page {} follows page {})",
                pair[1].number, pair[0].number
            )));
        }

        let id = fingerprint::pages_fingerprint(pages);
        let segments = chunker.chunk(&id, pages);
        Ok(Self { id, name: name.into(), chunking: chunker.cache_key(), segments })
    }

    /// Segment a plain-text upload, treated as a single page numbered 1.
    pub fn from_text(
        name: impl Into<String>,
        text: impl Into<String>,
        chunker: &dyn Chunker,
    ) -> Self {
        let pages = [Page::new(1, text)];
        let id = fingerprint::pages_fingerprint(&pages);
        let segments = chunker.chunk(&id, &pages);
        Self { id, name: name.into(), chunking: chunker.cache_key(), segments }
    }

    /// Look up a segment by its source identifier.
    pub fn segment(&self, source_id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.source_id == source_id)
    }
}

/// A retrieved [`Segment`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved segment.
    pub segment: Segment,
    /// Cosine similarity to the query (higher is more relevant).
    pub score: f32,
}

/// The outcome of one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryResult {
    /// Answer text with the citation line removed.
    pub answer: String,
    /// Cited segments, or every retrieved segment in return-all mode.
    pub sources: Vec<Segment>,
    /// Cited source identifiers that matched no known segment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved_citations: Vec<String>,
}
