//! Tests for the retrieval pipeline: lifecycle, ingest atomicity, retrieval and answering.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ragkit_model::MockGenerator;
use ragkit_rag::{
    DistanceMetric, Document, Embedder, Embedding, HashingEmbedder, InMemoryIndex, IndexEntry,
    PipelineState, PromptTemplate, Query, RagConfig, RagError, RetrievalPipeline, Segment,
    VectorIndex,
};
use ragkit_telemetry::EventCapture;
use tracing_subscriber::prelude::*;

const DIM: usize = 256;

const NOTES: &str = "Transfer learning reuses a model trained on one task for another task.\n\
Gradient descent minimises a loss by following its negative gradient.\n\
A convolutional network shares weights across spatial positions.\n\
Dropout randomly disables units during training to reduce overfitting.";

fn config() -> RagConfig {
    RagConfig::builder().chunk_size(80).chunk_overlap(0).separator("\n").top_k(2).build().unwrap()
}

fn hashing() -> Arc<dyn Embedder> {
    Arc::new(HashingEmbedder::new(DIM).unwrap())
}

/// Embeds like [`HashingEmbedder`] but fails on any text containing `poison`.
struct PoisonedEmbedder {
    inner: HashingEmbedder,
}

#[async_trait]
impl Embedder for PoisonedEmbedder {
    async fn embed(&self, text: &str) -> ragkit_rag::Result<Embedding> {
        if text.contains("poison") {
            return Err(RagError::EmbeddingUnavailable {
                provider: "test".into(),
                message: "refusing poisoned text".into(),
            });
        }
        self.inner.embed(text).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

/// Returns NaN components for any text mentioning `nan`.
struct NanEmbedder {
    inner: HashingEmbedder,
}

#[async_trait]
impl Embedder for NanEmbedder {
    async fn embed(&self, text: &str) -> ragkit_rag::Result<Embedding> {
        let mut vector = self.inner.embed(text).await?;
        if text.contains("nan") {
            vector[0] = f32::NAN;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

/// An index that stops accepting inserts after `budget` successful ones and
/// relies on the trait's default batch rollback.
struct FlakyIndex {
    inner: InMemoryIndex,
    budget: AtomicUsize,
}

#[async_trait]
impl VectorIndex for FlakyIndex {
    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn metric(&self) -> DistanceMetric {
        self.inner.metric()
    }

    async fn insert(&self, segment: Segment, vector: Embedding) -> ragkit_rag::Result<IndexEntry> {
        if self.budget.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |b| b.checked_sub(1)).is_err() {
            return Err(RagError::IndexError { backend: "flaky".into(), message: "disk full".into() });
        }
        self.inner.insert(segment, vector).await
    }

    async fn query(&self, vector: &[f32], k: usize) -> ragkit_rag::Result<Vec<IndexEntry>> {
        self.inner.query(vector, k).await
    }

    async fn size(&self) -> ragkit_rag::Result<usize> {
        self.inner.size().await
    }

    async fn truncate(&self, len: usize) -> ragkit_rag::Result<()> {
        self.inner.truncate(len).await
    }
}

#[tokio::test]
async fn retrieve_before_ingest_is_not_ready() {
    let pipeline = RetrievalPipeline::builder().config(config()).embedder(hashing()).build().unwrap();

    assert_eq!(pipeline.state(), PipelineState::Empty);
    let err = pipeline.retrieve(&Query::new("anything")).await.unwrap_err();
    assert!(matches!(err, RagError::NotReady { operation: "retrieve" }));
}

#[tokio::test]
async fn ingest_then_retrieve_finds_relevant_segment() {
    let pipeline = RetrievalPipeline::builder().config(config()).embedder(hashing()).build().unwrap();

    let report = pipeline.ingest(&Document::new("notes.txt", NOTES)).await.unwrap();
    assert_eq!(report.document_id, "notes.txt");
    assert_eq!(report.segment_count, 4);
    assert_eq!(report.index_size, 4);
    assert_eq!(pipeline.state(), PipelineState::Ingested);

    let hits = pipeline.retrieve(&Query::new("what is dropout during training")).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits[0].segment.text.starts_with("Dropout"));
    assert!(hits[0].score <= hits[1].score);
    assert!(hits.iter().all(|h| h.segment.document_id == "notes.txt"));
}

#[tokio::test]
async fn query_k_overrides_top_k() {
    let pipeline = RetrievalPipeline::builder().config(config()).embedder(hashing()).build().unwrap();
    pipeline.ingest(&Document::new("notes.txt", NOTES)).await.unwrap();

    let hits = pipeline.retrieve(&Query::new("gradient").with_k(10)).await.unwrap();
    assert_eq!(hits.len(), 4);
}

#[tokio::test]
async fn retrieve_rejects_blank_query_and_zero_k() {
    let pipeline = RetrievalPipeline::builder().config(config()).embedder(hashing()).build().unwrap();
    pipeline.ingest(&Document::new("notes.txt", NOTES)).await.unwrap();

    let err = pipeline.retrieve(&Query::new("   ")).await.unwrap_err();
    assert!(matches!(err, RagError::InvalidArgument { operation: "retrieve", .. }));

    let err = pipeline.retrieve(&Query::new("gradient").with_k(0)).await.unwrap_err();
    assert!(matches!(err, RagError::InvalidArgument { operation: "retrieve", .. }));
}

#[tokio::test]
async fn embedding_failure_midway_leaves_index_unchanged() {
    let index = Arc::new(InMemoryIndex::new(DIM, DistanceMetric::Cosine));
    let pipeline = RetrievalPipeline::builder()
        .config(config())
        .embedder(Arc::new(PoisonedEmbedder { inner: HashingEmbedder::new(DIM).unwrap() }))
        .index(index.clone())
        .build()
        .unwrap();

    pipeline.ingest(&Document::new("clean", "clean text")).await.unwrap();
    assert_eq!(index.size().await.unwrap(), 1);

    let poisoned = Document::new(
        "bad",
        "the first line is perfectly fine and will embed without any trouble\n\
         the second line is poison and the embedder gives up on it",
    );
    let err = pipeline.ingest(&poisoned).await.unwrap_err();

    match err {
        RagError::IngestFailed { document_id, cause } => {
            assert_eq!(document_id, "bad");
            assert!(matches!(*cause, RagError::EmbeddingUnavailable { .. }));
        }
        other => panic!("expected IngestFailed, got {other:?}"),
    }
    assert_eq!(index.size().await.unwrap(), 1);
}

#[tokio::test]
async fn index_failure_midway_rolls_back() {
    let index = Arc::new(FlakyIndex {
        inner: InMemoryIndex::new(DIM, DistanceMetric::Cosine),
        budget: AtomicUsize::new(2),
    });
    let pipeline =
        RetrievalPipeline::builder().config(config()).embedder(hashing()).index(index.clone()).build().unwrap();

    let err = pipeline.ingest(&Document::new("notes.txt", NOTES)).await.unwrap_err();

    assert!(matches!(err, RagError::IngestFailed { .. }));
    assert_eq!(index.size().await.unwrap(), 0);
    assert_eq!(pipeline.state(), PipelineState::Empty);
}

#[tokio::test]
async fn ingest_batch_stops_at_first_failure() {
    let index = Arc::new(InMemoryIndex::new(DIM, DistanceMetric::Cosine));
    let pipeline = RetrievalPipeline::builder()
        .config(config())
        .embedder(Arc::new(PoisonedEmbedder { inner: HashingEmbedder::new(DIM).unwrap() }))
        .index(index.clone())
        .build()
        .unwrap();

    let documents = vec![
        Document::new("a", "alpha"),
        Document::new("b", "poison"),
        Document::new("c", "gamma"),
    ];
    let err = pipeline.ingest_batch(&documents).await.unwrap_err();

    assert!(matches!(err, RagError::IngestFailed { ref document_id, .. } if document_id == "b"));
    assert_eq!(index.size().await.unwrap(), 1);
}

#[tokio::test]
async fn non_finite_embedding_fails_ingest() {
    let index = Arc::new(InMemoryIndex::new(DIM, DistanceMetric::Cosine));
    let pipeline = RetrievalPipeline::builder()
        .config(config())
        .embedder(Arc::new(NanEmbedder { inner: HashingEmbedder::new(DIM).unwrap() }))
        .index(index.clone())
        .build()
        .unwrap();

    let err = pipeline.ingest(&Document::new("broken", "a fine line\nthen a nan line")).await.unwrap_err();

    match err {
        RagError::IngestFailed { document_id, cause } => {
            assert_eq!(document_id, "broken");
            assert!(matches!(*cause, RagError::EmbeddingUnavailable { .. }));
        }
        other => panic!("expected IngestFailed, got {other:?}"),
    }
    assert_eq!(index.size().await.unwrap(), 0);
    assert_eq!(pipeline.state(), PipelineState::Empty);
}

#[tokio::test]
async fn empty_document_marks_pipeline_ingested() {
    let pipeline = RetrievalPipeline::builder().config(config()).embedder(hashing()).build().unwrap();

    let report = pipeline.ingest(&Document::new("empty", "")).await.unwrap();
    assert_eq!(report.segment_count, 0);
    assert_eq!(pipeline.state(), PipelineState::Ingested);
    assert!(pipeline.retrieve(&Query::new("anything")).await.unwrap().is_empty());
}

#[tokio::test]
async fn answer_renders_context_into_prompt() {
    let generator = Arc::new(MockGenerator::with_reply("Dropout disables units."));
    let pipeline = RetrievalPipeline::builder()
        .config(config())
        .embedder(hashing())
        .generator(generator.clone())
        .prompt_template(PromptTemplate::new("CONTEXT:\n{context}\nQ: {question}").unwrap())
        .build()
        .unwrap();
    pipeline.ingest(&Document::new("notes.txt", NOTES)).await.unwrap();
    assert_eq!(pipeline.state(), PipelineState::Ready);

    let answer = pipeline.answer(&Query::new("what is dropout")).await.unwrap();

    assert_eq!(answer.text, "Dropout disables units.");
    assert_eq!(answer.sources.len(), 2);
    assert!(answer.context.starts_with(&answer.sources[0].segment.text));
    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0], format!("CONTEXT:\n{}\nQ: what is dropout", answer.context));
}

#[tokio::test]
async fn answer_context_respects_char_budget() {
    let config = RagConfig::builder()
        .chunk_size(80)
        .chunk_overlap(0)
        .separator("\n")
        .top_k(4)
        .context_char_budget(50)
        .build()
        .unwrap();
    let pipeline = RetrievalPipeline::builder()
        .config(config)
        .embedder(hashing())
        .generator(Arc::new(MockGenerator::echo()))
        .build()
        .unwrap();
    pipeline.ingest(&Document::new("notes.txt", NOTES)).await.unwrap();

    let answer = pipeline.answer(&Query::new("training")).await.unwrap();
    assert_eq!(answer.context.chars().count(), 50);
    assert!(answer.text.contains(&answer.context));
}

#[tokio::test]
async fn answer_without_generator_is_config_error() {
    let pipeline = RetrievalPipeline::builder().config(config()).embedder(hashing()).build().unwrap();
    pipeline.ingest(&Document::new("notes.txt", NOTES)).await.unwrap();

    let err = pipeline.answer(&Query::new("dropout")).await.unwrap_err();
    assert!(matches!(err, RagError::ConfigError(_)));
}

#[tokio::test]
async fn answer_before_ingest_is_not_ready() {
    let pipeline = RetrievalPipeline::builder()
        .config(config())
        .embedder(hashing())
        .generator(Arc::new(MockGenerator::echo()))
        .build()
        .unwrap();

    let err = pipeline.answer(&Query::new("dropout")).await.unwrap_err();
    assert!(matches!(err, RagError::NotReady { .. }));
}

#[tokio::test]
async fn generation_failure_keeps_retrieved_segments() {
    let pipeline = RetrievalPipeline::builder()
        .config(config())
        .embedder(hashing())
        .generator(Arc::new(MockGenerator::failing("rate limited")))
        .build()
        .unwrap();
    pipeline.ingest(&Document::new("notes.txt", NOTES)).await.unwrap();

    let err = pipeline.answer(&Query::new("convolutional weights")).await.unwrap_err();

    match err {
        RagError::GenerationUnavailable { message, retrieved } => {
            assert!(message.contains("rate limited"));
            assert_eq!(retrieved.len(), 2);
        }
        other => panic!("expected GenerationUnavailable, got {other:?}"),
    }
}

#[test]
fn build_requires_config_and_embedder() {
    let err = RetrievalPipeline::builder().embedder(hashing()).build().err().unwrap();
    assert!(matches!(err, RagError::ConfigError(_)));

    let err = RetrievalPipeline::builder().config(config()).build().err().unwrap();
    assert!(matches!(err, RagError::ConfigError(_)));
}

#[test]
fn build_rejects_mismatched_index() {
    let err = RetrievalPipeline::builder()
        .config(config())
        .embedder(hashing())
        .index(Arc::new(InMemoryIndex::new(DIM + 1, DistanceMetric::Cosine)))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, RagError::ConfigError(_)));

    let err = RetrievalPipeline::builder()
        .config(config())
        .embedder(hashing())
        .index(Arc::new(InMemoryIndex::new(DIM, DistanceMetric::Euclidean)))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, RagError::ConfigError(_)));
}

#[test]
fn default_index_follows_config() {
    let config = RagConfig::builder().distance_metric(DistanceMetric::Euclidean).build().unwrap();
    let pipeline = RetrievalPipeline::builder().config(config).embedder(hashing()).build().unwrap();

    assert_eq!(pipeline.index().dimensions(), DIM);
    assert_eq!(pipeline.index().metric(), DistanceMetric::Euclidean);
    assert_eq!(pipeline.embedder().dimensions(), DIM);
    assert_eq!(pipeline.config().distance_metric, DistanceMetric::Euclidean);
}

#[tokio::test]
async fn ingest_and_failures_are_logged() {
    let capture = EventCapture::new();
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(capture.clone()));

    let pipeline = RetrievalPipeline::builder()
        .config(config())
        .embedder(Arc::new(PoisonedEmbedder { inner: HashingEmbedder::new(DIM).unwrap() }))
        .build()
        .unwrap();
    pipeline.ingest(&Document::new("notes.txt", NOTES)).await.unwrap();
    let _ = pipeline.ingest(&Document::new("bad.txt", "poison")).await;

    let ingested = capture.find("ingested document");
    assert_eq!(ingested.len(), 1);
    assert_eq!(ingested[0].level, "INFO");
    assert_eq!(ingested[0].field("document.id").as_deref(), Some("notes.txt"));
    assert_eq!(ingested[0].field("segment_count").as_deref(), Some("4"));

    let failed = capture.find("ingest failed");
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].level, "ERROR");
    assert_eq!(failed[0].field("document.id").as_deref(), Some("bad.txt"));
}
