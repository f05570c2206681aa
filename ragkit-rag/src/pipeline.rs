//! Retrieval pipeline orchestrator.
//!
//! The [`RetrievalPipeline`] coordinates the full ingest-and-query workflow by
//! composing a [`TextChunker`], an [`Embedder`], a [`VectorIndex`] and an
//! optional [`Generator`].
//!
//! # Example
//!
//! ```rust,ignore
//! use ragkit_rag::{Document, HashingEmbedder, Query, RagConfig, RetrievalPipeline};
//!
//! let pipeline = RetrievalPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedder(Arc::new(HashingEmbedder::new(256)?))
//!     .generator(Arc::new(my_llm))
//!     .build()?;
//!
//! pipeline.ingest(&Document::new("notes.txt", text)).await?;
//! let hits = pipeline.retrieve(&Query::new("What is transfer learning?")).await?;
//! let answer = pipeline.answer(&Query::new("What is transfer learning?")).await?;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ragkit_model::Generator;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::chunking::{Chunker, TextChunker};
use crate::config::RagConfig;
use crate::document::{Answer, Document, IngestReport, Query, ScoredSegment};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;
use crate::inmemory::InMemoryIndex;
use crate::prompt::{PromptTemplate, build_context};

/// Lifecycle of a [`RetrievalPipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// No document has been ingested yet.
    Empty,
    /// At least one ingest succeeded; retrieval is available.
    Ingested,
    /// Ingested and a generator is attached; answering is available.
    Ready,
}

/// The retrieval pipeline orchestrator.
///
/// Coordinates document ingestion (chunk → embed → index) and query
/// execution (embed → search, then optionally generate). Construct one via
/// [`RetrievalPipeline::builder()`].
///
/// Calls are not retried. Ingests are serialised and all-or-nothing: a
/// failed ingest leaves the index exactly as it was.
pub struct RetrievalPipeline {
    config: RagConfig,
    chunker: TextChunker,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    generator: Option<Arc<dyn Generator>>,
    prompt_template: PromptTemplate,
    ingested: AtomicBool,
    ingest_lock: Mutex<()>,
}

impl RetrievalPipeline {
    /// Create a new [`RetrievalPipelineBuilder`].
    pub fn builder() -> RetrievalPipelineBuilder {
        RetrievalPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedder.
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Return a reference to the vector index.
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        if !self.ingested.load(Ordering::Acquire) {
            PipelineState::Empty
        } else if self.generator.is_some() {
            PipelineState::Ready
        } else {
            PipelineState::Ingested
        }
    }

    fn ensure_ingested(&self, operation: &'static str) -> Result<()> {
        if self.state() == PipelineState::Empty {
            error!(operation, "pipeline used before ingest");
            return Err(RagError::NotReady { operation });
        }
        Ok(())
    }

    fn ingest_failed(document: &Document, cause: RagError) -> RagError {
        error!(document.id = %document.id, error = %cause, "ingest failed, index unchanged");
        RagError::IngestFailed { document_id: document.id.clone(), cause: Box::new(cause) }
    }

    /// Ingest a single document: chunk → embed → index.
    ///
    /// An empty document stores nothing but still moves the pipeline out of
    /// [`PipelineState::Empty`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IngestFailed`] if embedding or indexing fails. No
    /// segment of the document is stored in that case.
    pub async fn ingest(&self, document: &Document) -> Result<IngestReport> {
        let _guard = self.ingest_lock.lock().await;

        let before = self.index.size().await.map_err(|e| Self::ingest_failed(document, e))?;

        // 1. Chunk the document
        let segments = self.chunker.chunk(document);
        let segment_count = segments.len();

        if !segments.is_empty() {
            // 2. Embed every segment before touching the index
            let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
            let vectors = self
                .embedder
                .embed_batch(&texts)
                .await
                .map_err(|e| Self::ingest_failed(document, e))?;

            if vectors.len() != segments.len() {
                return Err(Self::ingest_failed(
                    document,
                    RagError::EmbeddingUnavailable {
                        provider: "pipeline".into(),
                        message: format!(
                            "embedder returned {} vectors for {} segments",
                            vectors.len(),
                            segments.len()
                        ),
                    },
                ));
            }
            let dimensions = self.embedder.dimensions();
            if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
                return Err(Self::ingest_failed(
                    document,
                    RagError::EmbeddingUnavailable {
                        provider: "pipeline".into(),
                        message: format!(
                            "embedder returned a {}-dimensional vector, expected {dimensions}",
                            bad.len()
                        ),
                    },
                ));
            }

            if let Some(position) = vectors.iter().position(|v| v.iter().any(|x| !x.is_finite())) {
                return Err(Self::ingest_failed(
                    document,
                    RagError::EmbeddingUnavailable {
                        provider: "pipeline".into(),
                        message: format!("embedder returned a non-finite vector for segment {position}"),
                    },
                ));
            }

            // 3. Store all segments at once
            let items = segments.into_iter().zip(vectors).collect::<Vec<_>>();
            self.index.insert_batch(items).await.map_err(|e| Self::ingest_failed(document, e))?;
        }

        self.ingested.store(true, Ordering::Release);

        let index_size = before + segment_count;
        info!(document.id = %document.id, segment_count, index_size, "ingested document");

        Ok(IngestReport { document_id: document.id.clone(), segment_count, index_size })
    }

    /// Ingest documents in order, stopping at the first failure.
    ///
    /// Documents before the failing one stay ingested.
    pub async fn ingest_batch(&self, documents: &[Document]) -> Result<Vec<IngestReport>> {
        let mut reports = Vec::with_capacity(documents.len());
        for document in documents {
            reports.push(self.ingest(document).await?);
        }
        Ok(reports)
    }

    /// Retrieve the segments closest to the query, best match first.
    ///
    /// # Errors
    ///
    /// - [`RagError::NotReady`] if nothing has been ingested
    /// - [`RagError::InvalidArgument`] for blank query text or `k == 0`
    /// - [`RagError::EmbeddingUnavailable`] if the query cannot be embedded
    /// - [`RagError::IndexError`] if the index search fails
    pub async fn retrieve(&self, query: &Query) -> Result<Vec<ScoredSegment>> {
        self.ensure_ingested("retrieve")?;

        if query.text.trim().is_empty() {
            return Err(RagError::invalid_argument("retrieve", "query text must not be empty"));
        }
        let k = query.k.unwrap_or(self.config.top_k);
        if k == 0 {
            return Err(RagError::invalid_argument("retrieve", "k must be greater than zero"));
        }

        // 1. Embed the query
        let query_embedding = self.embedder.embed(&query.text).await.map_err(|e| {
            error!(error = %e, "embedding failed during retrieval");
            e
        })?;

        // 2. Search the index
        let entries = self.index.query(&query_embedding, k).await.map_err(|e| {
            error!(k, error = %e, "vector index query failed");
            e
        })?;

        let results: Vec<ScoredSegment> = entries
            .into_iter()
            .map(|entry| ScoredSegment { segment: entry.segment, score: entry.score.unwrap_or_default() })
            .collect();

        info!(k, result_count = results.len(), "retrieval completed");
        Ok(results)
    }

    /// Retrieve context for the query and ask the generator to answer it.
    ///
    /// The top segments are joined into a context of at most
    /// `context_char_budget` characters and rendered into the prompt
    /// template. The generator's output is returned verbatim.
    ///
    /// # Errors
    ///
    /// - [`RagError::ConfigError`] if the pipeline has no generator
    /// - any error of [`retrieve`](Self::retrieve)
    /// - [`RagError::GenerationUnavailable`] if generation fails; the
    ///   retrieved segments are carried in the error
    pub async fn answer(&self, query: &Query) -> Result<Answer> {
        let generator = self.generator.as_ref().ok_or_else(|| {
            RagError::ConfigError("answer requires a generator, none was configured".into())
        })?;

        let sources = self.retrieve(query).await?;
        let context = build_context(
            sources.iter().map(|s| s.segment.text.as_str()),
            self.config.context_char_budget,
        );
        let prompt = self.prompt_template.render(&context, query.text.trim());

        match generator.generate(&prompt).await {
            Ok(text) => {
                info!(
                    generator = generator.name(),
                    source_count = sources.len(),
                    context_chars = context.chars().count(),
                    "answer generated"
                );
                Ok(Answer { text, context, sources })
            }
            Err(e) => {
                error!(generator = generator.name(), error = %e, "generation failed");
                Err(RagError::GenerationUnavailable { message: e.to_string(), retrieved: sources })
            }
        }
    }
}

/// Builder for constructing a [`RetrievalPipeline`].
///
/// `config` and `embedder` are required. Without an explicit index the
/// pipeline creates an [`InMemoryIndex`] matching the embedder and the
/// configured metric.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RetrievalPipeline::builder()
///     .config(RagConfig::default())
///     .embedder(Arc::new(embedder))
///     .index(Arc::new(index))        // optional
///     .generator(Arc::new(llm))      // optional, enables `answer`
///     .build()?;
/// ```
#[derive(Default)]
pub struct RetrievalPipelineBuilder {
    config: Option<RagConfig>,
    embedder: Option<Arc<dyn Embedder>>,
    index: Option<Arc<dyn VectorIndex>>,
    generator: Option<Arc<dyn Generator>>,
    prompt_template: Option<PromptTemplate>,
}

impl RetrievalPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedder.
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the vector index backend.
    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the generator used by [`RetrievalPipeline::answer`].
    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Replace the default question-answering prompt.
    pub fn prompt_template(mut self, template: PromptTemplate) -> Self {
        self.prompt_template = Some(template);
        self
    }

    /// Build the [`RetrievalPipeline`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing, the
    /// configuration is invalid, or the index does not match the embedder's
    /// dimensionality or the configured distance metric.
    pub fn build(self) -> Result<RetrievalPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        config.validate()?;
        let embedder =
            self.embedder.ok_or_else(|| RagError::ConfigError("embedder is required".to_string()))?;
        let chunker = TextChunker::from_config(&config)?;

        let index = self.index.unwrap_or_else(|| {
            Arc::new(InMemoryIndex::new(embedder.dimensions(), config.distance_metric))
        });
        if index.dimensions() != embedder.dimensions() {
            return Err(RagError::ConfigError(format!(
                "index expects {}-dimensional vectors but the embedder produces {}",
                index.dimensions(),
                embedder.dimensions()
            )));
        }
        if index.metric() != config.distance_metric {
            return Err(RagError::ConfigError(format!(
                "index ranks by {} but the configuration asks for {}",
                index.metric(),
                config.distance_metric
            )));
        }

        Ok(RetrievalPipeline {
            config,
            chunker,
            embedder,
            index,
            generator: self.generator,
            prompt_template: self.prompt_template.unwrap_or_default(),
            ingested: AtomicBool::new(false),
            ingest_lock: Mutex::new(()),
        })
    }
}
