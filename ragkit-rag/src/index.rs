//! Vector index trait for storing and searching embeddings.

use async_trait::async_trait;
use tracing::warn;

use crate::distance::DistanceMetric;
use crate::document::{Embedding, IndexEntry, Segment};
use crate::error::Result;

/// A storage backend for segment embeddings with nearest-neighbour search.
///
/// Entries are append-only and numbered in insertion order. Queries rank by
/// the index's [`DistanceMetric`], closest first, with ties broken by
/// insertion order. Writes are serialised; reads may run concurrently.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_rag::{DistanceMetric, InMemoryIndex, VectorIndex};
///
/// let index = InMemoryIndex::new(384, DistanceMetric::Cosine);
/// index.insert(segment, embedding).await?;
/// let hits = index.query(&query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Dimensionality every stored and queried vector must have.
    fn dimensions(&self) -> usize;

    /// The distance this index ranks by.
    fn metric(&self) -> DistanceMetric;

    /// Append one entry. Never overwrites.
    ///
    /// Fails with [`RagError::IndexError`](crate::RagError::IndexError) if the
    /// vector has the wrong dimensionality.
    async fn insert(&self, segment: Segment, vector: Embedding) -> Result<IndexEntry>;

    /// Append several entries, all or nothing.
    ///
    /// The default implementation inserts one by one and, on failure,
    /// truncates back to the size observed before the call. It relies on the
    /// caller not interleaving other writes.
    async fn insert_batch(&self, items: Vec<(Segment, Embedding)>) -> Result<Vec<IndexEntry>> {
        let before = self.size().await?;
        let mut entries = Vec::with_capacity(items.len());
        for (segment, vector) in items {
            match self.insert(segment, vector).await {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    if let Err(rollback) = self.truncate(before).await {
                        warn!(error = %rollback, size = before, "rollback after failed batch insert failed");
                    }
                    return Err(e);
                }
            }
        }
        Ok(entries)
    }

    /// Return up to `k` entries closest to `vector`, best match first, each
    /// with its distance in [`IndexEntry::score`].
    ///
    /// An empty index yields an empty `Vec`. `k == 0` fails with
    /// [`RagError::InvalidArgument`](crate::RagError::InvalidArgument).
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<IndexEntry>>;

    /// Number of stored entries.
    async fn size(&self) -> Result<usize>;

    /// Remove every entry beyond the first `len`. No-op if `len >= size`.
    async fn truncate(&self, len: usize) -> Result<()>;
}
