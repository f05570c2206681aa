//! In-memory vector index using exact search.
//!
//! This module provides [`InMemoryIndex`], a vector index backed by a `Vec`
//! protected by a `tokio::sync::RwLock`. Queries scan every entry, which is
//! fine for single-document corpora, development and tests.

use std::cmp::Ordering;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::distance::DistanceMetric;
use crate::document::{Embedding, IndexEntry, Segment};
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

const BACKEND: &str = "InMemory";

/// An in-memory vector index ranking by exact distance.
///
/// Entry ids equal their position, so they stay dense across truncation.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_rag::{DistanceMetric, InMemoryIndex};
///
/// let index = InMemoryIndex::new(384, DistanceMetric::Cosine);
/// ```
#[derive(Debug)]
pub struct InMemoryIndex {
    dimensions: usize,
    metric: DistanceMetric,
    entries: RwLock<Vec<IndexEntry>>,
}

impl InMemoryIndex {
    /// Create a new empty index.
    pub fn new(dimensions: usize, metric: DistanceMetric) -> Self {
        Self { dimensions, metric, entries: RwLock::new(Vec::new()) }
    }

    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(RagError::index(
                BACKEND,
                format!(
                    "vector has {} dimensions, index expects {}",
                    vector.len(),
                    self.dimensions
                ),
            ));
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(RagError::index(BACKEND, "vector contains NaN or infinite components"));
        }
        Ok(())
    }
}

/// Closest first, then earliest inserted.
fn rank(a: &(f32, usize), b: &(f32, usize)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn metric(&self) -> DistanceMetric {
        self.metric
    }

    async fn insert(&self, segment: Segment, vector: Embedding) -> Result<IndexEntry> {
        self.check_vector(&vector)?;
        let mut entries = self.entries.write().await;
        let entry = IndexEntry { id: entries.len() as u64, segment, vector, score: None };
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn insert_batch(&self, items: Vec<(Segment, Embedding)>) -> Result<Vec<IndexEntry>> {
        // validate everything before taking the lock so a bad item leaves no trace
        for (_, vector) in &items {
            self.check_vector(vector)?;
        }

        let mut entries = self.entries.write().await;
        let first_id = entries.len() as u64;
        let inserted: Vec<IndexEntry> = items
            .into_iter()
            .enumerate()
            .map(|(i, (segment, vector))| IndexEntry {
                id: first_id + i as u64,
                segment,
                vector,
                score: None,
            })
            .collect();
        entries.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<IndexEntry>> {
        if k == 0 {
            return Err(RagError::invalid_argument("query", "k must be greater than zero"));
        }
        self.check_vector(vector)?;

        let entries = self.entries.read().await;
        let mut scored: Vec<(f32, usize)> = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (self.metric.distance(&entry.vector, vector), position))
            .collect();

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank);
            scored.truncate(k);
        }
        scored.sort_by(rank);

        Ok(scored
            .into_iter()
            .map(|(distance, position)| IndexEntry {
                score: Some(distance),
                ..entries[position].clone()
            })
            .collect())
    }

    async fn size(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }

    async fn truncate(&self, len: usize) -> Result<()> {
        self.entries.write().await.truncate(len);
        Ok(())
    }
}
