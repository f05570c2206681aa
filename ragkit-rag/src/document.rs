//! Data types for documents, segments, index entries and results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A fixed-length embedding vector.
pub type Embedding = Vec<f32>;

/// A source document: raw text plus the identifier it was loaded from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Source identifier, typically a file path or URL.
    pub id: String,
    /// The text content of the document.
    pub text: String,
    /// Key-value metadata copied onto every segment cut from this document.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document with no metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: HashMap::new() }
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A contiguous slice of a [`Document`]'s text.
///
/// Offsets and lengths count characters (Unicode scalar values), not bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// Position of this segment among its document's segments.
    pub index: usize,
    /// Character offset of the first character in the document text.
    pub start: usize,
    /// Number of characters in `text`.
    pub length: usize,
    /// The text content of the segment.
    pub text: String,
    /// Metadata inherited from the parent document.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl Segment {
    /// Character offset one past the last character.
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// A stored (segment, vector) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    /// Insertion sequence number, unique within an index.
    pub id: u64,
    /// The indexed segment.
    pub segment: Segment,
    /// The segment's embedding. Remote backends may leave this empty in
    /// query results.
    pub vector: Embedding,
    /// Distance to the query vector; only set on query results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// A retrieval request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Query {
    /// The question or search text.
    pub text: String,
    /// Number of results wanted; the pipeline's `top_k` when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<usize>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), k: None }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = Some(k);
        self
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Query::new(text)
    }
}

/// A retrieved [`Segment`] paired with its distance to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredSegment {
    /// The retrieved segment.
    pub segment: Segment,
    /// Distance to the query (lower is more relevant, never negative).
    pub score: f32,
}

/// Summary of a successful ingest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestReport {
    pub document_id: String,
    /// Number of segments embedded and stored.
    pub segment_count: usize,
    /// Index size after the ingest.
    pub index_size: usize,
}

/// A generated answer and the context it was generated from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// The generator's output, verbatim.
    pub text: String,
    /// The context string substituted into the prompt.
    pub context: String,
    /// The retrieved segments, best match first.
    pub sources: Vec<ScoredSegment>,
}
