//! # ragkit-rag
//!
//! Retrieval over plain-text documents: chunk, embed, index, query, answer.
//!
//! ## Overview
//!
//! - [`TextChunker`] - bounded, overlapping segments with an optional preferred separator
//! - [`Embedder`] - text to vector; [`HashingEmbedder`] works offline,
//!   [`openai::OpenAIEmbedder`] calls the OpenAI API (feature `openai`)
//! - [`VectorIndex`] - exact [`InMemoryIndex`] or [`qdrant::QdrantIndex`] (feature `qdrant`)
//! - [`RetrievalPipeline`] - ties them together and optionally asks a
//!   [`Generator`](ragkit_model::Generator) to answer from the retrieved context
//!
//! Scores are distances under the index's [`DistanceMetric`]: lower is
//! better and results come best match first.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragkit_rag::{Document, HashingEmbedder, Query, RagConfig, RetrievalPipeline};
//!
//! let pipeline = RetrievalPipeline::builder()
//!     .config(RagConfig::from_env()?)
//!     .embedder(Arc::new(HashingEmbedder::new(256)?))
//!     .build()?;
//!
//! pipeline.ingest(&Document::new("notes.txt", std::fs::read_to_string("notes.txt")?)).await?;
//! for hit in pipeline.retrieve(&Query::new("transfer learning").with_k(3)).await? {
//!     println!("{:.3} {}", hit.score, hit.segment.text);
//! }
//! ```
//!
//! ## Features
//!
//! - `openai` - [`openai::OpenAIEmbedder`]
//! - `qdrant` - [`qdrant::QdrantIndex`]
//! - `full` - both

pub mod chunking;
pub mod config;
pub mod distance;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod inmemory;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod prompt;
#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use chunking::{Chunker, Segments, TextChunker, chunk};
pub use config::{RagConfig, RagConfigBuilder};
pub use distance::DistanceMetric;
pub use document::{
    Answer, Document, Embedding, IndexEntry, IngestReport, Query, ScoredSegment, Segment,
};
pub use embedding::{ConcurrentEmbedder, Embedder, HashingEmbedder};
pub use error::{RagError, Result};
pub use index::VectorIndex;
pub use inmemory::InMemoryIndex;
#[cfg(feature = "openai")]
pub use openai::OpenAIEmbedder;
pub use pipeline::{PipelineState, RetrievalPipeline, RetrievalPipelineBuilder};
pub use prompt::{PromptTemplate, build_context};
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantIndex;
