//! Explicit memoization of built indexes and answers.
//!
//! Both caches are keyed by content fingerprints (see [`crate::fingerprint`])
//! and are only ever invalidated explicitly, by [`IndexCache::clear`] and
//! [`AnswerCache::clear`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::document::QueryResult;
use crate::index::SegmentIndex;

/// Built indexes keyed by [`SegmentIndex::fingerprint`].
#[derive(Default)]
pub struct IndexCache {
    entries: HashMap<String, Arc<SegmentIndex>>,
}

impl IndexCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached index for `fingerprint`, if any.
    pub fn get(&self, fingerprint: &str) -> Option<Arc<SegmentIndex>> {
        self.entries.get(fingerprint).cloned()
    }

    /// Cache `index` under its own fingerprint and return it.
    pub fn insert(&mut self, index: Arc<SegmentIndex>) -> Arc<SegmentIndex> {
        debug!(fingerprint = index.fingerprint(), "caching index");
        self.entries.insert(index.fingerprint().to_string(), Arc::clone(&index));
        index
    }

    /// Drop every cached index.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached indexes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Answers keyed by [`query_fingerprint`](crate::fingerprint::query_fingerprint).
#[derive(Debug, Default)]
pub struct AnswerCache {
    entries: HashMap<String, QueryResult>,
}

impl AnswerCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached answer for `fingerprint`, if any.
    pub fn get(&self, fingerprint: &str) -> Option<&QueryResult> {
        self.entries.get(fingerprint)
    }

    /// Cache `result` under `fingerprint`.
    pub fn insert(&mut self, fingerprint: String, result: QueryResult) {
        self.entries.insert(fingerprint, result);
    }

    /// Drop every cached answer.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached answers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
