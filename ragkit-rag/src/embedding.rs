//! Embedding capability and the embedders that ship with the crate.

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use tracing::debug;

use crate::document::Embedding;
use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. The default [`embed_batch`](Embedder::embed_batch)
/// implementation calls [`embed`](Embedder::embed) sequentially;
/// backends that support native batching should override it.
///
/// Failures are reported as [`RagError::EmbeddingUnavailable`] and are never
/// retried by the pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_rag::Embedder;
///
/// let embedding = embedder.embed("hello world").await?;
/// assert_eq!(embedding.len(), embedder.dimensions());
/// ```
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Generate embedding vectors for a batch of text inputs, in input order.
    ///
    /// The default implementation calls [`embed`](Embedder::embed)
    /// sequentially for each input.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this embedder.
    fn dimensions(&self) -> usize;
}

/// Deterministic offline embedder based on feature hashing.
///
/// Each lowercase alphanumeric word is hashed into one of `dimensions`
/// buckets with a hash-derived sign, and the result is L2-normalised. Texts
/// sharing words land close together under cosine distance, which is enough
/// for demos and tests that must run without network access.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `dimensions` is zero.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::ConfigError("embedding dimensions must be greater than zero".into()));
        }
        Ok(Self { dimensions })
    }

    fn embed_sync(&self, text: &str) -> Embedding {
        let mut embedding = vec![0.0f32; self.dimensions];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let hash = fnv1a(&word.to_lowercase());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        embedding
    }
}

fn fnv1a(word: &str) -> u64 {
    word.bytes()
        .fold(0xcbf2_9ce4_8422_2325u64, |acc, b| (acc ^ b as u64).wrapping_mul(0x0100_0000_01b3))
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(self.embed_sync(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|text| self.embed_sync(text)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Runs up to `concurrency` [`embed`](Embedder::embed) calls of the wrapped
/// embedder at once.
///
/// Output order always matches input order. The first failure aborts the
/// batch and is returned unchanged.
///
/// ```rust,ignore
/// let embedder = ConcurrentEmbedder::new(Arc::new(remote)).with_concurrency(8);
/// let vectors = embedder.embed_batch(&texts).await?;
/// ```
pub struct ConcurrentEmbedder {
    inner: Arc<dyn Embedder>,
    concurrency: usize,
}

impl ConcurrentEmbedder {
    /// Wrap `inner` with a concurrency equal to the available parallelism.
    pub fn new(inner: Arc<dyn Embedder>) -> Self {
        let concurrency =
            std::thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1);
        Self { inner, concurrency }
    }

    /// Set the maximum number of in-flight calls (at least one).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }
}

#[async_trait]
impl Embedder for ConcurrentEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        debug!(batch_size = texts.len(), concurrency = self.concurrency, "embedding batch concurrently");

        let calls: Vec<_> = texts.iter().map(|text| self.inner.embed(text)).collect();
        stream::iter(calls).buffered(self.concurrency).try_collect().await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}
