//! Document chunking.
//!
//! [`TextChunker`] cuts a document into segments of at most `max_size`
//! characters, each sharing exactly `overlap` characters with its predecessor.
//! With a separator configured, a segment ends right after the last separator
//! that fits in its window, so `"\n"` keeps lines together where possible.

use crate::config::RagConfig;
use crate::document::{Document, Segment};
use crate::error::{RagError, Result};

/// A strategy for splitting documents into segments.
pub trait Chunker: Send + Sync {
    /// Split a document into segments, in document order.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document) -> Vec<Segment>;
}

/// Splits text into bounded, overlapping segments by character count.
///
/// Invariants for every document:
/// - each segment has at most `max_size` characters;
/// - consecutive segments overlap by exactly `overlap` characters;
/// - the last segment ends at the end of the text, so dropping the first
///   `overlap` characters of every segment but the first and concatenating
///   gives back the original text.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_rag::{Document, TextChunker};
///
/// let chunker = TextChunker::new(300, 0)?.with_separator("\n");
/// let segments: Vec<_> = chunker.segments(&document).collect();
/// ```
#[derive(Debug, Clone)]
pub struct TextChunker {
    max_size: usize,
    overlap: usize,
    separator: Option<String>,
}

impl TextChunker {
    /// Create a fixed-width chunker.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `max_size == 0` or
    /// `overlap >= max_size`.
    pub fn new(max_size: usize, overlap: usize) -> Result<Self> {
        if max_size == 0 {
            return Err(RagError::ConfigError("max chunk size must be greater than zero".into()));
        }
        if overlap >= max_size {
            return Err(RagError::ConfigError(format!(
                "chunk overlap ({overlap}) must be less than max chunk size ({max_size})"
            )));
        }
        Ok(Self { max_size, overlap, separator: None })
    }

    /// Build a chunker from the chunking fields of a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let chunker = Self::new(config.chunk_size, config.chunk_overlap)?;
        Ok(match &config.separator {
            Some(separator) => chunker.with_separator(separator.clone()),
            None => chunker,
        })
    }

    /// Prefer cutting right after `separator`. An empty string disables it.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        self.separator = if separator.is_empty() { None } else { Some(separator) };
        self
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn separator(&self) -> Option<&str> {
        self.separator.as_deref()
    }

    /// Lazily iterate over the segments of `document`.
    ///
    /// Calling this again restarts from the beginning.
    pub fn segments<'a>(&'a self, document: &'a Document) -> Segments<'a> {
        let mut boundaries: Vec<usize> = document.text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(document.text.len());
        Segments { chunker: self, document, boundaries, start: 0, index: 0, done: false }
    }
}

impl Chunker for TextChunker {
    fn chunk(&self, document: &Document) -> Vec<Segment> {
        self.segments(document).collect()
    }
}

/// Split `document` with a fixed-width [`TextChunker`].
///
/// # Errors
///
/// Returns [`RagError::ConfigError`] if `overlap >= max_size` or `max_size == 0`.
pub fn chunk(document: &Document, max_size: usize, overlap: usize) -> Result<Vec<Segment>> {
    Ok(TextChunker::new(max_size, overlap)?.chunk(document))
}

/// Iterator over the segments of one document, see [`TextChunker::segments`].
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    chunker: &'a TextChunker,
    document: &'a Document,
    /// Byte offset of every character, followed by the text length.
    boundaries: Vec<usize>,
    /// Character offset of the next segment.
    start: usize,
    index: usize,
    done: bool,
}

impl Segments<'_> {
    fn char_count(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Choose where the segment starting at `self.start` ends, given that its
    /// window ends at `window_end` before the end of the text.
    fn cut_point(&self, window_end: usize) -> usize {
        let Some(separator) = self.chunker.separator.as_deref() else {
            return window_end;
        };

        let byte_start = self.boundaries[self.start];
        let window = &self.document.text[byte_start..self.boundaries[window_end]];

        // The last match ends furthest right; if it leaves the segment no
        // longer than the overlap, every earlier match does too.
        if let Some(pos) = window.rfind(separator) {
            let cut_byte = byte_start + pos + separator.len();
            let cut = self.boundaries.partition_point(|&b| b < cut_byte);
            if cut > self.start + self.chunker.overlap {
                return cut;
            }
        }
        window_end
    }
}

impl Iterator for Segments<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        let total = self.char_count();
        if self.done || self.start >= total {
            self.done = true;
            return None;
        }

        let window_end = (self.start + self.chunker.max_size).min(total);
        let end = if window_end < total { self.cut_point(window_end) } else { total };

        let text = &self.document.text[self.boundaries[self.start]..self.boundaries[end]];
        let segment = Segment {
            document_id: self.document.id.clone(),
            index: self.index,
            start: self.start,
            length: end - self.start,
            text: text.to_string(),
            metadata: self.document.metadata.clone(),
        };

        self.index += 1;
        if end >= total {
            self.done = true;
        } else {
            self.start = end - self.chunker.overlap;
        }

        Some(segment)
    }
}

impl std::iter::FusedIterator for Segments<'_> {}
