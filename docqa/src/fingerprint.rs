//! Content fingerprints used as document IDs and cache keys.

use sha2::{Digest, Sha256};

use crate::document::{Document, Page};

/// Fingerprint extracted pages.
///
/// Page numbers and lengths are hashed alongside the text so that moving a
/// page boundary changes the fingerprint even when the concatenated text
/// does not.
pub fn pages_fingerprint(pages: &[Page]) -> String {
    let mut hasher = Sha256::new();
    for page in pages {
        hasher.update(page.number.to_le_bytes());
        hasher.update((page.text.len() as u64).to_le_bytes());
        hasher.update(page.text.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Fingerprint a built index: every document plus its chunking parameters.
pub fn index_fingerprint(documents: &[Document]) -> String {
    let mut hasher = Sha256::new();
    for document in documents {
        hasher.update(document.id.as_bytes());
        hasher.update([0]);
        hasher.update(document.chunking.as_bytes());
        hasher.update([0]);
    }
    hex::encode(hasher.finalize())
}

/// Fingerprint one question asked against one index.
pub fn query_fingerprint(
    index_fingerprint: &str,
    question: &str,
    k: usize,
    return_all: bool,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(index_fingerprint.as_bytes());
    hasher.update([0]);
    hasher.update(question.as_bytes());
    hasher.update((k as u64).to_le_bytes());
    hasher.update([u8::from(return_all)]);
    hex::encode(hasher.finalize())
}
