//! Qdrant vector index backend.
//!
//! Provides [`QdrantIndex`] which implements [`VectorIndex`] on top of a single
//! Qdrant collection using the [qdrant-client](https://docs.rs/qdrant-client)
//! crate over gRPC.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragkit_rag::DistanceMetric;
//! use ragkit_rag::qdrant::QdrantIndex;
//!
//! let index = QdrantIndex::connect("http://localhost:6334", None, "docs", 384, DistanceMetric::Cosine).await?;
//! index.insert(segment, embedding).await?;
//! let hits = index.query(&query_embedding, 5).await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance, PointId,
    PointStruct, PointsIdsList, ScoredPoint, SearchPointsBuilder, UpsertPointsBuilder,
    Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::distance::DistanceMetric;
use crate::document::{Embedding, IndexEntry, Segment};
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

const BACKEND: &str = "qdrant";

/// Extra results fetched per query so ties at the k-th distance can be
/// re-ordered by sequence number.
const TIE_SLACK: usize = 8;

/// A [`VectorIndex`] stored in a [Qdrant](https://qdrant.tech/) collection.
///
/// Point ids are insertion sequence numbers, also kept in the `seq` payload
/// field. Segment fields and metadata are stored as payload; query results
/// carry an empty vector.
///
/// Queries fetch `k + 8` points and order them by (distance, sequence number)
/// before cutting to `k`. A tie group at the k-th distance larger than that
/// slack can still lose a lower-numbered point, since Qdrant itself does not
/// order ties by id.
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    dimensions: usize,
    metric: DistanceMetric,
    next_id: Mutex<u64>,
}

impl QdrantIndex {
    /// Connect to `url` and open `collection`, creating it if it does not
    /// exist yet.
    ///
    /// Sequence numbering resumes after the points already in the collection.
    pub async fn connect(
        url: &str,
        api_key: Option<String>,
        collection: impl Into<String>,
        dimensions: usize,
        metric: DistanceMetric,
    ) -> Result<Self> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        let client = builder.build().map_err(Self::map_err)?;
        Self::from_client(client, collection, dimensions, metric).await
    }

    /// Open `collection` through an existing client, creating it if needed.
    pub async fn from_client(
        client: Qdrant,
        collection: impl Into<String>,
        dimensions: usize,
        metric: DistanceMetric,
    ) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::ConfigError("index dimensions must be greater than zero".into()));
        }
        let collection = collection.into();

        if client.collection_exists(&collection).await.map_err(Self::map_err)? {
            debug!(collection = %collection, "qdrant collection already exists, skipping creation");
        } else {
            let distance = match metric {
                DistanceMetric::Cosine => Distance::Cosine,
                DistanceMetric::Euclidean => Distance::Euclid,
            };
            client
                .create_collection(
                    CreateCollectionBuilder::new(&collection)
                        .vectors_config(VectorParamsBuilder::new(dimensions as u64, distance)),
                )
                .await
                .map_err(Self::map_err)?;
            info!(collection = %collection, dimensions, %metric, "created qdrant collection");
        }

        let index = Self { client, collection, dimensions, metric, next_id: Mutex::new(0) };
        let existing = index.count().await?;
        *index.next_id.lock().await = existing as u64;
        Ok(index)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::index(BACKEND, e.to_string())
    }

    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(RagError::index(
                BACKEND,
                format!("vector has {} dimensions, index expects {}", vector.len(), self.dimensions),
            ));
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(RagError::index(BACKEND, "vector contains NaN or infinite components"));
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection).exact(true))
            .await
            .map_err(Self::map_err)?;
        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }

    fn to_point(id: u64, segment: &Segment, vector: Embedding) -> Result<PointStruct> {
        let payload = Payload::try_from(json!({
            "seq": id,
            "document_id": segment.document_id,
            "index": segment.index,
            "start": segment.start,
            "length": segment.length,
            "text": segment.text,
            "metadata": segment.metadata,
        }))
        .map_err(|e| RagError::index(BACKEND, format!("invalid payload: {e}")))?;
        Ok(PointStruct::new(id, vector, payload))
    }

    async fn upsert(&self, points: Vec<PointStruct>) -> Result<()> {
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    fn string_field(payload: &HashMap<String, QdrantValue>, key: &str) -> String {
        match payload.get(key).and_then(|v| v.kind.as_ref()) {
            Some(Kind::StringValue(s)) => s.clone(),
            _ => String::new(),
        }
    }

    fn integer_field(payload: &HashMap<String, QdrantValue>, key: &str) -> u64 {
        match payload.get(key).and_then(|v| v.kind.as_ref()) {
            Some(Kind::IntegerValue(n)) => (*n).max(0) as u64,
            Some(Kind::DoubleValue(d)) => d.max(0.0) as u64,
            _ => 0,
        }
    }

    fn to_entry(&self, point: ScoredPoint) -> IndexEntry {
        let payload = &point.payload;
        let metadata = match payload.get("metadata").and_then(|v| v.kind.as_ref()) {
            Some(Kind::StructValue(s)) => s
                .fields
                .iter()
                .filter_map(|(k, v)| match &v.kind {
                    Some(Kind::StringValue(s)) => Some((k.clone(), s.clone())),
                    _ => None,
                })
                .collect(),
            _ => HashMap::new(),
        };

        // qdrant reports cosine similarity; the index contract is a distance
        let score = match self.metric {
            DistanceMetric::Cosine => (1.0 - point.score).clamp(0.0, 2.0),
            DistanceMetric::Euclidean => point.score.max(0.0),
        };

        IndexEntry {
            id: Self::integer_field(payload, "seq"),
            segment: Segment {
                document_id: Self::string_field(payload, "document_id"),
                index: Self::integer_field(payload, "index") as usize,
                start: Self::integer_field(payload, "start") as usize,
                length: Self::integer_field(payload, "length") as usize,
                text: Self::string_field(payload, "text"),
                metadata,
            },
            vector: Vec::new(),
            score: Some(score),
        }
    }
}

/// Order a result page by (distance, sequence number) and keep the first `k`.
fn top_k(mut entries: Vec<IndexEntry>, k: usize) -> Vec<IndexEntry> {
    entries.sort_by(|a, b| {
        let (sa, sb) = (a.score.unwrap_or_default(), b.score.unwrap_or_default());
        sa.total_cmp(&sb).then(a.id.cmp(&b.id))
    });
    entries.truncate(k);
    entries
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn metric(&self) -> DistanceMetric {
        self.metric
    }

    async fn insert(&self, segment: Segment, vector: Embedding) -> Result<IndexEntry> {
        self.check_vector(&vector)?;
        let mut next_id = self.next_id.lock().await;
        let id = *next_id;

        self.upsert(vec![Self::to_point(id, &segment, vector.clone())?]).await?;
        *next_id += 1;

        debug!(collection = %self.collection, id, "inserted point into qdrant");
        Ok(IndexEntry { id, segment, vector, score: None })
    }

    async fn insert_batch(&self, items: Vec<(Segment, Embedding)>) -> Result<Vec<IndexEntry>> {
        for (_, vector) in &items {
            self.check_vector(vector)?;
        }
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut next_id = self.next_id.lock().await;
        let first_id = *next_id;
        let points = items
            .iter()
            .enumerate()
            .map(|(i, (segment, vector))| Self::to_point(first_id + i as u64, segment, vector.clone()))
            .collect::<Result<Vec<_>>>()?;

        if let Err(e) = self.upsert(points).await {
            // a failed upsert may still have written some points
            let ids: Vec<PointId> =
                (first_id..first_id + items.len() as u64).map(PointId::from).collect();
            if let Err(rollback) = self
                .client
                .delete_points(
                    DeletePointsBuilder::new(&self.collection)
                        .points(PointsIdsList { ids })
                        .wait(true),
                )
                .await
            {
                warn!(collection = %self.collection, error = %rollback, "rollback after failed batch upsert failed");
            }
            return Err(e);
        }

        *next_id += items.len() as u64;
        debug!(collection = %self.collection, count = items.len(), "upserted points into qdrant");

        Ok(items
            .into_iter()
            .enumerate()
            .map(|(i, (segment, vector))| IndexEntry {
                id: first_id + i as u64,
                segment,
                vector,
                score: None,
            })
            .collect())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<IndexEntry>> {
        if k == 0 {
            return Err(RagError::invalid_argument("query", "k must be greater than zero"));
        }
        self.check_vector(vector)?;

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, vector.to_vec(), (k + TIE_SLACK) as u64)
                    .with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        let entries = response.result.into_iter().map(|point| self.to_entry(point)).collect();
        Ok(top_k(entries, k))
    }

    async fn size(&self) -> Result<usize> {
        self.count().await
    }

    async fn truncate(&self, len: usize) -> Result<()> {
        let mut next_id = self.next_id.lock().await;
        let len = len as u64;
        if len >= *next_id {
            return Ok(());
        }

        let ids: Vec<PointId> = (len..*next_id).map(PointId::from).collect();
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection).points(PointsIdsList { ids }).wait(true),
            )
            .await
            .map_err(Self::map_err)?;
        *next_id = len;

        debug!(collection = %self.collection, size = len, "truncated qdrant collection");
        Ok(())
    }
}
