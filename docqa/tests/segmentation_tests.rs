//! Property tests for fixed-size segmentation.

use docqa::{Chunker, Document, FixedSizeChunker, Page, RagError};
use proptest::prelude::*;

/// Chunking parameters with `overlap < size`.
fn arb_params() -> impl Strategy<Value = (usize, usize)> {
    (1usize..40).prop_flat_map(|size| (Just(size), 0..size))
}

/// Page text including multi-byte characters and whitespace.
fn arb_text() -> impl Strategy<Value = String> {
    "[a-zäöé \n.]{0,200}"
}

fn arb_pages() -> impl Strategy<Value = Vec<Page>> {
    proptest::collection::vec(arb_text(), 0..5).prop_map(|texts| {
        texts.into_iter().enumerate().map(|(i, text)| Page::new(i as u32 + 1, text)).collect()
    })
}

/// Rebuild one page from its segments by dropping each overlap prefix.
fn reconstruct(segments: &[&docqa::Segment], overlap: usize) -> String {
    let mut text = String::new();
    for (i, segment) in segments.iter().enumerate() {
        let skip = if i == 0 { 0 } else { overlap };
        text.extend(segment.text.chars().skip(skip));
    }
    text
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn segmentation_is_deterministic((size, overlap) in arb_params(), pages in arb_pages()) {
        let chunker = FixedSizeChunker::new(size, overlap).unwrap();
        let first = Document::from_pages("doc", &pages, &chunker).unwrap();
        let second = Document::from_pages("doc", &pages, &chunker).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn non_overlapping_parts_reconstruct_each_page(
        (size, overlap) in arb_params(),
        pages in arb_pages(),
    ) {
        let chunker = FixedSizeChunker::new(size, overlap).unwrap();
        let segments = chunker.chunk("doc", &pages);
        for page in &pages {
            let own: Vec<_> = segments.iter().filter(|s| s.page == page.number).collect();
            prop_assert_eq!(reconstruct(&own, overlap), page.text.clone());
        }
    }

    #[test]
    fn consecutive_segments_share_the_overlap(
        (size, overlap) in arb_params(),
        pages in arb_pages(),
    ) {
        let chunker = FixedSizeChunker::new(size, overlap).unwrap();
        let segments = chunker.chunk("doc", &pages);
        for pair in segments.windows(2) {
            if pair[0].page != pair[1].page {
                continue;
            }
            let first: Vec<char> = pair[0].text.chars().collect();
            let tail: String = first[first.len() - overlap..].iter().collect();
            let head: String = pair[1].text.chars().take(overlap).collect();
            prop_assert_eq!(tail, head);
        }
    }

    #[test]
    fn segments_respect_size_and_have_unique_ids(
        (size, overlap) in arb_params(),
        pages in arb_pages(),
    ) {
        let chunker = FixedSizeChunker::new(size, overlap).unwrap();
        let segments = chunker.chunk("doc", &pages);
        let mut ids = std::collections::HashSet::new();
        for segment in &segments {
            prop_assert!(segment.text.chars().count() <= size);
            prop_assert!(!segment.text.is_empty());
            prop_assert!(ids.insert(segment.source_id.clone()));
            prop_assert_eq!(
                segment.source_id.clone(),
                format!("{}-{}", segment.page, segment.index)
            );
        }
    }
}

#[test]
fn two_short_pages_yield_one_segment_each() {
    let chunker = FixedSizeChunker::new(300, 0).unwrap();
    let pages = [Page::new(1, "Page1 text..."), Page::new(2, "Page2 text...")];
    let document = Document::from_pages("tender.pdf", &pages, &chunker).unwrap();
    let ids: Vec<&str> = document.segments.iter().map(|s| s.source_id.as_str()).collect();
    assert_eq!(ids, vec!["1-0", "2-0"]);
    assert!(document.segments.iter().all(|s| s.document_id == document.id));
}

#[test]
fn overlap_not_smaller_than_size_fails_fast() {
    let err = FixedSizeChunker::new(100, 150).unwrap_err();
    assert!(matches!(err, RagError::ConfigError(_)));
}

#[test]
fn page_numbers_must_increase() {
    let chunker = FixedSizeChunker::new(10, 0).unwrap();
    let pages = [Page::new(2, "a"), Page::new(2, "b")];
    let err = Document::from_pages("doc", &pages, &chunker).unwrap_err();
    assert!(matches!(err, RagError::InvalidDocument(_)));
}

#[test]
fn plain_text_is_page_one() {
    let chunker = FixedSizeChunker::new(5, 0).unwrap();
    let document = Document::from_text("notes.txt", "hello world", &chunker);
    let ids: Vec<&str> = document.segments.iter().map(|s| s.source_id.as_str()).collect();
    assert_eq!(ids, vec!["1-0", "1-1", "1-2"]);
    assert_eq!(document.segment("1-1").map(|s| s.text.as_str()), Some(" worl"));
}

#[test]
fn different_chunking_changes_nothing_but_segments() {
    let pages = [Page::new(1, "abcdefgh")];
    let small = Document::from_pages("d", &pages, &FixedSizeChunker::new(2, 0).unwrap()).unwrap();
    let large = Document::from_pages("d", &pages, &FixedSizeChunker::new(4, 1).unwrap()).unwrap();
    assert_eq!(small.id, large.id);
    assert_ne!(small.chunking, large.chunking);
    assert_ne!(small.segments.len(), large.segments.len());
}
