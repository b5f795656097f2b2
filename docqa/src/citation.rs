//! Citation extraction and resolution.
//!
//! The model is asked to end its answer with `SOURCES: id1, id2`. This module
//! is the only place that knows that format: [`extract`] splits a raw model
//! response into answer text and cited source identifiers, and [`resolve`]
//! maps those identifiers back onto known segments.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::document::{Document, Segment};

/// Marker that introduces the citation line.
pub const SOURCES_MARKER: &str = "SOURCES: ";

/// Separator between cited source identifiers.
pub const SOURCE_SEPARATOR: &str = ", ";

/// A model response split into answer text and citations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Extraction {
    /// Answer text before the marker, trimmed.
    pub answer: String,
    /// Cited source identifiers in citation order, without duplicates.
    pub cited_source_ids: Vec<String>,
}

/// Split a raw model response at the first [`SOURCES_MARKER`].
///
/// Everything before the marker (trimmed) is the answer. The rest of the
/// marker's line is split on [`SOURCE_SEPARATOR`]; identifiers are trimmed,
/// a trailing period on the line is ignored and empty entries are dropped.
/// A missing marker means nothing was cited, which is not an error. A bare
/// `SOURCES:` as the final line (the empty list with its trailing space
/// trimmed away) is treated the same way.
///
/// # Example
///
/// ```rust,ignore
/// let extraction = extract("The answer is X.\nSOURCES: 1-0, 1-1");
/// assert_eq!(extraction.answer, "The answer is X.");
/// assert_eq!(extraction.cited_source_ids, vec!["1-0", "1-1"]);
/// ```
pub fn extract(raw_model_output: &str) -> Extraction {
    let Some((answer, rest)) = raw_model_output.split_once(SOURCES_MARKER) else {
        let trimmed = raw_model_output.trim();
        let answer = trimmed.strip_suffix(SOURCES_MARKER.trim_end()).unwrap_or(trimmed);
        return Extraction { answer: answer.trim().to_string(), cited_source_ids: Vec::new() };
    };

    let line = rest.lines().next().unwrap_or_default().trim();
    let line = line.strip_suffix('.').unwrap_or(line);

    let mut seen = HashSet::new();
    let cited_source_ids = line
        .split(SOURCE_SEPARATOR)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect();

    Extraction { answer: answer.trim().to_string(), cited_source_ids }
}

/// Cited segments plus the identifiers that matched nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Matching segments in document order.
    pub segments: Vec<Segment>,
    /// Cited identifiers with no matching segment, in citation order.
    pub unresolved: Vec<String>,
}

/// Map cited source identifiers back onto the segments of `documents`.
///
/// Scans every segment of every document in order and keeps those whose
/// source identifier was cited. Identifiers that match no segment are left
/// out of the segments and reported in [`Resolution::unresolved`].
pub fn resolve(cited_source_ids: &[String], documents: &[Document]) -> Resolution {
    let cited: HashSet<&str> = cited_source_ids.iter().map(String::as_str).collect();
    let mut matched: HashSet<&str> = HashSet::new();

    let segments = documents
        .iter()
        .flat_map(|document| document.segments.iter())
        .filter(|segment| cited.contains(segment.source_id.as_str()))
        .inspect(|segment| {
            matched.insert(segment.source_id.as_str());
        })
        .cloned()
        .collect();

    let unresolved = cited_source_ids
        .iter()
        .filter(|id| !matched.contains(id.as_str()))
        .cloned()
        .collect();

    Resolution { segments, unresolved }
}
