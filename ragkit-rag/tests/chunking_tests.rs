//! Property and scenario tests for the text chunker.

use ragkit_rag::chunking::{Chunker, TextChunker, chunk};
use ragkit_rag::{Document, RagConfig, RagError, Segment};
use proptest::prelude::*;

/// Rebuild the text by dropping each segment's leading overlap.
fn reassemble(segments: &[Segment], overlap: usize) -> String {
    segments
        .iter()
        .enumerate()
        .map(|(i, s)| if i == 0 { s.text.clone() } else { s.text.chars().skip(overlap).collect() })
        .collect()
}

/// Sizes with `overlap < max_size`.
fn arb_sizes() -> impl Strategy<Value = (usize, usize)> {
    (1usize..40).prop_flat_map(|max_size| (Just(max_size), 0..max_size))
}

/// Text mixing ASCII, multi-byte characters and newlines.
fn arb_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            4 => proptest::char::range('a', 'z'),
            1 => Just(' '),
            1 => Just('\n'),
            1 => Just('é'),
            1 => Just('日'),
        ],
        0..300,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

mod prop_fixed_width {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn segments_are_bounded_and_overlap_exactly(
            text in arb_text(),
            (max_size, overlap) in arb_sizes(),
        ) {
            let document = Document::new("doc", text.clone());
            let segments = chunk(&document, max_size, overlap).unwrap();

            for s in &segments {
                prop_assert!(s.length <= max_size);
                prop_assert_eq!(s.length, s.text.chars().count());
            }
            for pair in segments.windows(2) {
                prop_assert_eq!(pair[0].end() - pair[1].start, overlap);
            }
            if let Some(last) = segments.last() {
                prop_assert_eq!(last.end(), text.chars().count());
            } else {
                prop_assert!(text.is_empty());
            }
        }

        #[test]
        fn segments_reassemble_to_source_text(
            text in arb_text(),
            (max_size, overlap) in arb_sizes(),
        ) {
            let document = Document::new("doc", text.clone());
            let segments = chunk(&document, max_size, overlap).unwrap();
            prop_assert_eq!(reassemble(&segments, overlap), text);
        }
    }
}

mod prop_separator {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn separator_keeps_invariants(
            text in arb_text(),
            (max_size, overlap) in arb_sizes(),
            separator in prop_oneof![Just("\n"), Just(" "), Just("é ")],
        ) {
            let document = Document::new("doc", text.clone());
            let chunker = TextChunker::new(max_size, overlap).unwrap().with_separator(separator);
            let segments = chunker.chunk(&document);

            for (i, s) in segments.iter().enumerate() {
                prop_assert!(s.length <= max_size);
                prop_assert_eq!(s.index, i);
            }
            for pair in segments.windows(2) {
                prop_assert_eq!(pair[0].end() - pair[1].start, overlap);
                prop_assert!(pair[1].end() > pair[0].end());
            }
            prop_assert_eq!(reassemble(&segments, overlap), text);
        }
    }
}

#[test]
fn quick_brown_fox() {
    let document = Document::new("fox", "The quick brown fox jumps over the lazy dog");
    let segments = chunk(&document, 10, 2).unwrap();

    assert_eq!(segments[0].text, "The quick ");
    assert_eq!(segments[0].start, 0);
    assert_eq!(segments[1].start, 8);
    assert_eq!(segments[1].text, "k brown fo");
    assert_eq!(segments.last().unwrap().end(), 43);
}

#[test]
fn separator_cuts_after_last_newline_in_window() {
    let document = Document::new("lines", "alpha\nbeta\ngamma\ndelta");
    let chunker = TextChunker::new(12, 0).unwrap().with_separator("\n");
    let texts: Vec<String> = chunker.segments(&document).map(|s| s.text).collect();

    assert_eq!(texts, vec!["alpha\nbeta\n", "gamma\ndelta"]);
}

#[test]
fn separator_falls_back_to_hard_cut() {
    let document = Document::new("words", "abcdefghij\nk");
    let chunker = TextChunker::new(4, 1).unwrap().with_separator("\n");
    let first = chunker.segments(&document).next().unwrap();

    assert_eq!(first.text, "abcd");
}

#[test]
fn segments_iterator_restarts() {
    let document = Document::new("doc", "0123456789");
    let chunker = TextChunker::new(4, 1).unwrap();

    let first: Vec<Segment> = chunker.segments(&document).collect();
    let second: Vec<Segment> = chunker.segments(&document).collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[test]
fn empty_document_has_no_segments() {
    let document = Document::new("empty", "");
    assert!(chunk(&document, 10, 2).unwrap().is_empty());
}

#[test]
fn segments_inherit_document_metadata() {
    let document = Document::new("doc", "some text here").with_metadata("source", "notes.txt");
    let segments = chunk(&document, 5, 0).unwrap();

    assert!(segments.iter().all(|s| s.metadata.get("source").map(String::as_str) == Some("notes.txt")));
    assert!(segments.iter().all(|s| s.document_id == "doc"));
}

#[test]
fn overlap_not_below_max_size_is_rejected() {
    assert!(matches!(TextChunker::new(10, 10), Err(RagError::ConfigError(_))));
    assert!(matches!(TextChunker::new(0, 0), Err(RagError::ConfigError(_))));
}

#[test]
fn chunker_from_config() {
    let config = RagConfig::builder().chunk_size(300).chunk_overlap(0).separator("\n").build().unwrap();
    let chunker = TextChunker::from_config(&config).unwrap();

    assert_eq!(chunker.max_size(), 300);
    assert_eq!(chunker.overlap(), 0);
    assert_eq!(chunker.separator(), Some("\n"));
}
