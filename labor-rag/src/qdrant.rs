//! Qdrant vector index backend.
//!
//! Provides [`QdrantVectorIndex`] which implements [`VectorIndex`] using
//! the [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC.
//!
//! # Example
//!
//! ```rust,ignore
//! use labor_rag::qdrant::QdrantVectorIndex;
//!
//! let index = QdrantVectorIndex::new("http://localhost:6334")?;
//! index.create_collection("saudi_labor_law", 384).await?;
//! let hits = index.search("saudi_labor_law", &query_embedding, 5).await?;
//! ```

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointId, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::json;
use tracing::debug;

use crate::document::{CollectionStats, HitPayload, IndexHit, IndexedPoint};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorIndex;

/// A [`VectorIndex`] backed by [Qdrant](https://qdrant.tech/).
///
/// Collections use cosine distance and integer point ids. Chunk metadata is
/// stored as flat payload keys (`text`, `source_file`, `page`, `chunk_id`).
pub struct QdrantVectorIndex {
    client: Qdrant,
}

impl QdrantVectorIndex {
    /// Create a new Qdrant index connecting to the given gRPC URL.
    pub fn new(url: &str) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(Self::map_err)?;
        Ok(Self { client })
    }

    /// Create a new Qdrant index with an API key.
    pub fn with_api_key(url: &str, api_key: &str) -> Result<Self> {
        let client = Qdrant::from_url(url).api_key(api_key).build().map_err(Self::map_err)?;
        Ok(Self { client })
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::VectorStoreError { backend: "qdrant".to_string(), message: e.to_string() }
    }

    fn extract_string(value: &QdrantValue) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }

    /// Accept integers, whole doubles, and numeric strings as `u64`.
    fn extract_u64(value: &QdrantValue) -> Option<u64> {
        match &value.kind {
            Some(Kind::IntegerValue(n)) => u64::try_from(*n).ok(),
            Some(Kind::DoubleValue(d)) if *d >= 0.0 && d.fract() == 0.0 => Some(*d as u64),
            Some(Kind::StringValue(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn numeric_id(id: Option<&PointId>) -> Option<u64> {
        match id.and_then(|pid| pid.point_id_options.as_ref()) {
            Some(PointIdOptions::Num(n)) => Some(*n),
            _ => None,
        }
    }
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let collections = self.client.list_collections().await.map_err(Self::map_err)?;
        let exists = collections.collections.iter().any(|c| c.name == name);
        if exists {
            debug!(collection = name, "qdrant collection already exists, skipping creation");
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dimensions as u64, Distance::Cosine)),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = name, dimensions, "created qdrant collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: &[IndexedPoint]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let mut qdrant_points = Vec::with_capacity(points.len());
        for point in points {
            let payload = Payload::try_from(json!({
                "text": point.payload.text,
                "source_file": point.payload.source_file,
                "page": point.payload.page,
                "chunk_id": point.payload.chunk_id,
            }))
            .map_err(Self::map_err)?;
            qdrant_points.push(PointStruct::new(point.id, point.vector.clone(), payload));
        }

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, qdrant_points).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection, count = points.len(), "upserted points to qdrant");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexHit>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, embedding.to_vec(), top_k as u64)
                    .with_payload(true)
                    .with_vectors(false),
            )
            .await
            .map_err(Self::map_err)?;

        let hits = response
            .result
            .into_iter()
            .map(|scored| {
                let payload = HitPayload {
                    text: scored.payload.get("text").and_then(Self::extract_string),
                    source_file: scored.payload.get("source_file").and_then(Self::extract_string),
                    page: scored.payload.get("page").and_then(Self::extract_u64),
                    chunk_id: scored.payload.get("chunk_id").and_then(Self::extract_u64),
                };
                IndexHit {
                    point_id: Self::numeric_id(scored.id.as_ref()),
                    score: scored.score,
                    payload,
                }
            })
            .collect();

        Ok(hits)
    }

    async fn collection_stats(&self, collection: &str) -> Result<CollectionStats> {
        let response = self.client.collection_info(collection).await.map_err(Self::map_err)?;
        let info = response.result.ok_or_else(|| RagError::VectorStoreError {
            backend: "qdrant".to_string(),
            message: format!("no info returned for collection '{collection}'"),
        })?;

        let vector_params = info
            .config
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .and_then(|config| match config {
                VectorsConfigKind::Params(params) => Some(params),
                VectorsConfigKind::ParamsMap(_) => None,
            })
            .ok_or_else(|| RagError::VectorStoreError {
                backend: "qdrant".to_string(),
                message: format!("collection '{collection}' has no single unnamed vector config"),
            })?;

        let distance = Distance::try_from(vector_params.distance)
            .map(|d| d.as_str_name().to_string())
            .unwrap_or_else(|_| "Unknown".to_string());

        Ok(CollectionStats {
            name: collection.to_string(),
            points_count: info.points_count.unwrap_or_default(),
            vector_size: vector_params.size as usize,
            distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(kind: Kind) -> QdrantValue {
        QdrantValue { kind: Some(kind) }
    }

    fn point_id(options: PointIdOptions) -> PointId {
        PointId { point_id_options: Some(options) }
    }

    #[test]
    fn payload_integers_accept_loose_numeric_forms() {
        let extract = QdrantVectorIndex::extract_u64;
        assert_eq!(extract(&value(Kind::IntegerValue(42))), Some(42));
        assert_eq!(extract(&value(Kind::DoubleValue(7.0))), Some(7));
        assert_eq!(extract(&value(Kind::StringValue(" 13 ".into()))), Some(13));
    }

    #[test]
    fn payload_integers_reject_negative_fractional_and_text() {
        let extract = QdrantVectorIndex::extract_u64;
        assert_eq!(extract(&value(Kind::IntegerValue(-1))), None);
        assert_eq!(extract(&value(Kind::DoubleValue(-3.0))), None);
        assert_eq!(extract(&value(Kind::DoubleValue(2.5))), None);
        assert_eq!(extract(&value(Kind::StringValue("page one".into()))), None);
        assert_eq!(extract(&value(Kind::BoolValue(true))), None);
        assert_eq!(extract(&QdrantValue { kind: None }), None);
    }

    #[test]
    fn only_numeric_point_ids_become_chunk_ids() {
        let numeric = point_id(PointIdOptions::Num(1000));
        assert_eq!(QdrantVectorIndex::numeric_id(Some(&numeric)), Some(1000));

        let uuid = point_id(PointIdOptions::Uuid("5c56c793-69f3-4fbf-87e6-c4bf54c28c26".into()));
        assert_eq!(QdrantVectorIndex::numeric_id(Some(&uuid)), None);
        assert_eq!(QdrantVectorIndex::numeric_id(Some(&PointId { point_id_options: None })), None);
        assert_eq!(QdrantVectorIndex::numeric_id(None), None);
    }

    #[test]
    fn payload_strings_only_match_string_values() {
        let text = value(Kind::StringValue("Article 98".into()));
        assert_eq!(QdrantVectorIndex::extract_string(&text).as_deref(), Some("Article 98"));
        assert_eq!(QdrantVectorIndex::extract_string(&value(Kind::IntegerValue(98))), None);
    }
}
