//! Tests for index construction and similarity search.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{FailingEmbedder, KeywordEmbedder, ShapedEmbedder, ShortBatchEmbedder};
use docqa::{
    DebugEmbeddingProvider, Document, FixedSizeChunker, InMemoryVectorStore, Page, RagError,
    SegmentIndex, StoredVector, VectorStore,
};
use proptest::prelude::*;

fn document(name: &str, pages: &[(u32, &str)], size: usize) -> Document {
    let chunker = FixedSizeChunker::new(size, 0).unwrap();
    let pages: Vec<Page> = pages.iter().map(|(n, t)| Page::new(*n, *t)).collect();
    Document::from_pages(name, &pages, &chunker).unwrap()
}

#[tokio::test]
async fn nearest_segment_comes_first() {
    let doc = document("d", &[(1, "budget budget"), (2, "deadline"), (3, "budget deadline")], 50);
    let embedder = Arc::new(KeywordEmbedder::new(&["budget", "deadline"]));
    let index = SegmentIndex::build(vec![doc], embedder).await.unwrap();

    let results = index.search("deadline", 2).await.unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.segment.source_id.as_str()).collect();
    assert_eq!(ids, vec!["2-0", "3-0"]);
    assert!(results[0].score >= results[1].score);
}

#[tokio::test]
async fn ties_are_broken_by_segment_order() {
    let doc = document("d", &[(1, "same"), (2, "same"), (3, "same")], 50);
    let index = SegmentIndex::build(vec![doc], Arc::new(KeywordEmbedder::new(&["same"])))
        .await
        .unwrap();

    let ids: Vec<String> =
        index.search("same", 3).await.unwrap().into_iter().map(|r| r.segment.source_id).collect();
    assert_eq!(ids, vec!["1-0", "2-0", "3-0"]);
}

#[tokio::test]
async fn documents_share_one_search_space() {
    let first = document("a.pdf", &[(1, "alpha")], 50);
    let second = document("b.pdf", &[(1, "beta")], 50);
    let second_id = second.id.clone();
    let embedder = Arc::new(KeywordEmbedder::new(&["alpha", "beta"]));
    let index = SegmentIndex::build(vec![first, second], embedder).await.unwrap();

    assert_eq!(index.len(), 2);
    let top = &index.search("beta", 1).await.unwrap()[0];
    assert_eq!(top.segment.source_id, "1-0");
    assert_eq!(top.segment.document_id, second_id);
}

#[tokio::test]
async fn zero_k_and_empty_index_return_nothing() {
    let doc = document("d", &[(1, "text")], 50);
    let index = SegmentIndex::build(vec![doc], Arc::new(DebugEmbeddingProvider::default()))
        .await
        .unwrap();
    assert!(index.search("text", 0).await.unwrap().is_empty());

    let empty = document("e", &[(1, "")], 50);
    let index = SegmentIndex::build(vec![empty], Arc::new(DebugEmbeddingProvider::default()))
        .await
        .unwrap();
    assert!(index.is_empty());
    assert!(index.search("text", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn transient_embedding_failure_aborts_build_and_stays_retryable() {
    let doc = document("d", &[(1, "text")], 50);
    let err = SegmentIndex::build(vec![doc], Arc::new(FailingEmbedder { transient: true }))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, RagError::PipelineError { .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn permanent_embedding_failure_is_fatal() {
    let doc = document("d", &[(1, "text")], 50);
    let err = SegmentIndex::build(vec![doc], Arc::new(FailingEmbedder { transient: false }))
        .await
        .err()
        .unwrap();
    assert!(!err.is_transient());
}

#[tokio::test]
async fn missing_embeddings_abort_build() {
    let doc = document("d", &[(1, "abcdef")], 2);
    let err = SegmentIndex::build(vec![doc], Arc::new(ShortBatchEmbedder)).await.err().unwrap();
    assert!(err.to_string().contains("expected 3 embeddings"));
}

#[tokio::test]
async fn ragged_embeddings_are_an_embedding_error() {
    let doc = document("d", &[(1, "abcd")], 3);
    let embedder = ShapedEmbedder {
        declared: 1,
        segments: vec![vec![1.0], vec![1.0, 0.0]],
        query: vec![1.0],
    };
    let err = SegmentIndex::build(vec![doc], Arc::new(embedder)).await.err().unwrap();
    assert!(matches!(err, RagError::EmbeddingError { transient: false, .. }), "{err}");
    assert!(err.to_string().contains("1-1 has 2 dimensions, expected 1"));
}

#[tokio::test]
async fn embeddings_must_match_declared_dimensions() {
    let doc = document("d", &[(1, "text")], 50);
    let embedder =
        ShapedEmbedder { declared: 2, segments: vec![vec![1.0; 5]], query: vec![1.0, 0.0] };
    let err = SegmentIndex::build(vec![doc], Arc::new(embedder)).await.err().unwrap();
    assert!(matches!(err, RagError::EmbeddingError { transient: false, .. }), "{err}");
}

#[tokio::test]
async fn non_finite_embeddings_abort_build() {
    let doc = document("d", &[(1, "abcdef")], 2);
    let embedder = ShapedEmbedder {
        declared: 2,
        segments: vec![vec![1.0, 0.0], vec![f32::NAN, 1.0]],
        query: vec![1.0, 0.0],
    };
    let err = SegmentIndex::build(vec![doc], Arc::new(embedder)).await.err().unwrap();
    assert!(matches!(err, RagError::EmbeddingError { .. }), "{err}");
    assert!(err.to_string().contains("non-finite"));
}

#[tokio::test]
async fn query_embedding_must_match_declared_dimensions() {
    let doc = document("d", &[(1, "text")], 50);
    let embedder =
        ShapedEmbedder { declared: 2, segments: vec![vec![1.0, 0.0]], query: vec![1.0, 0.0, 0.0] };
    let index = SegmentIndex::build(vec![doc], Arc::new(embedder)).await.unwrap();
    let err = index.search("text", 1).await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingError { transient: false, .. }), "{err}");
}

#[tokio::test]
async fn duplicate_documents_are_rejected() {
    let doc = document("d", &[(1, "text")], 50);
    let embedder = Arc::new(DebugEmbeddingProvider::default());
    let err = SegmentIndex::build(vec![doc.clone(), doc], embedder).await.err().unwrap();
    assert!(matches!(err, RagError::InvalidDocument(_)));
}

#[tokio::test]
async fn building_into_a_used_store_is_rejected() {
    let store = Arc::new(InMemoryVectorStore::new());
    store.upsert(vec![StoredVector { ordinal: 0, embedding: vec![1.0] }]).await.unwrap();
    let doc = document("d", &[(1, "text")], 50);
    let err = SegmentIndex::build_with_store(
        vec![doc],
        Arc::new(DebugEmbeddingProvider::default()),
        store,
    )
    .await
    .err()
    .unwrap();
    assert!(matches!(err, RagError::VectorStoreError { .. }));
}

#[tokio::test]
async fn fingerprint_is_stable_across_rebuilds() {
    let build = || async {
        let doc = document("d", &[(1, "stable text"), (2, "more")], 4);
        SegmentIndex::build(vec![doc], Arc::new(DebugEmbeddingProvider::default())).await.unwrap()
    };
    assert_eq!(build().await.fingerprint(), build().await.fingerprint());
}

/// **Search soundness**: every result was inserted by `build`, results are
/// ordered by descending score, and at most `k` are returned.
mod prop_search_soundness {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn results_come_from_the_index(
            texts in proptest::collection::vec("[a-e ]{0,40}", 1..6),
            query in "[a-e ]{1,10}",
            k in 0usize..20,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (results, indexed) = rt.block_on(async {
                let pages: Vec<(u32, &str)> =
                    texts.iter().enumerate().map(|(i, t)| (i as u32 + 1, t.as_str())).collect();
                let doc = document("d", &pages, 7);
                let embedder = Arc::new(DebugEmbeddingProvider::new(16));
                let index = SegmentIndex::build(vec![doc], embedder).await.unwrap();
                let results = index.search(&query, k).await.unwrap();
                (results, index.segments().to_vec())
            });

            prop_assert!(results.len() <= k);
            prop_assert!(results.len() <= indexed.len());
            let known: HashSet<(&str, &str)> =
                indexed.iter().map(|s| (s.document_id.as_str(), s.source_id.as_str())).collect();
            for result in &results {
                let key = (result.segment.document_id.as_str(), result.segment.source_id.as_str());
                prop_assert!(known.contains(&key));
                prop_assert!(indexed.contains(&result.segment));
            }
            for window in results.windows(2) {
                prop_assert!(window[0].score >= window[1].score);
            }
        }
    }
}
