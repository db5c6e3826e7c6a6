//! Qdrant storage backend
//!
//! The adapter is the only component that speaks the store's protocol.
//! Collections are keyed by repository identifier; chunk ids follow the
//! `chunk_{identifier}_{ordinal}` scheme with ordinals allocated from
//! the collection count at write time, making appends id-disjoint
//! across ingests.

use crate::error::{VectorDataError, VectorDataResult};
use crate::traits::VectorStore;
use crate::types::{
    point_uuid_for, sanitize_metadata, HealthReport, NewDocument, SearchHit, StoredDocument,
};
use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CollectionExistsRequest, CountPoints, CreateCollection, DeleteCollection, Distance,
    PointStruct, ScrollPoints, SearchPoints, UpsertPoints, Value as QdrantValue, VectorParams,
};
use qdrant_client::{Payload, Qdrant};
use repoinsight_config::VectorStorageConfig;
use serde_json::{Map, Value};
use std::time::Duration;

const SCROLL_PAGE_SIZE: u32 = 256;

/// Vector store backed by Qdrant
pub struct QdrantStore {
    client: Qdrant,
}

impl QdrantStore {
    /// Connect to Qdrant, retrying with a fixed delay.
    ///
    /// # Errors
    ///
    /// Returns `VectorDataError::Unavailable` once every attempt has
    /// failed.
    pub async fn connect(config: &VectorStorageConfig) -> VectorDataResult<Self> {
        let retry_delay = Duration::from_secs(config.retry_delay_seconds);
        let attempts = config.max_retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match Self::try_connect(&config.url).await {
                Ok(store) => {
                    tracing::info!(url = %config.url, "Connected to Qdrant");
                    return Ok(store);
                }
                Err(e) => {
                    last_error = e.to_string();
                    tracing::warn!(
                        attempt,
                        attempts,
                        "Qdrant connection attempt failed: {last_error}"
                    );
                    if attempt < attempts {
                        tokio::time::sleep(retry_delay).await;
                    }
                }
            }
        }

        Err(VectorDataError::Unavailable(format!(
            "failed to connect to Qdrant at {} after {attempts} attempts: {last_error}",
            config.url
        )))
    }

    async fn try_connect(url: &str) -> VectorDataResult<Self> {
        let mut builder = Qdrant::from_url(url);
        if let Ok(api_key) = std::env::var("QDRANT_API_KEY") {
            if !api_key.is_empty() {
                builder = builder.api_key(api_key);
            }
        }
        let client = builder
            .build()
            .map_err(|e| VectorDataError::Unavailable(format!("client build failed: {e}")))?;

        client
            .health_check()
            .await
            .map_err(|e| VectorDataError::Unavailable(format!("health check failed: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    #[tracing::instrument(skip(self))]
    async fn create_collection(&self, name: &str, dimension: usize) -> VectorDataResult<()> {
        if self.collection_exists(name).await? {
            return Ok(());
        }

        let request = CreateCollection {
            collection_name: name.to_string(),
            vectors_config: Some(
                VectorParams {
                    size: dimension as u64,
                    distance: Distance::Cosine as i32,
                    ..Default::default()
                }
                .into(),
            ),
            ..Default::default()
        };

        match self.client.create_collection(request).await {
            Ok(_) => Ok(()),
            Err(e) => {
                // Another ingest may have won the creation race
                if e.to_string().contains("already exists") {
                    Ok(())
                } else {
                    Err(VectorDataError::Storage(format!(
                        "failed to create collection '{name}': {e}"
                    )))
                }
            }
        }
    }

    async fn delete_collection(&self, name: &str) -> VectorDataResult<bool> {
        if !self.collection_exists(name).await? {
            return Ok(false);
        }
        let request = DeleteCollection {
            collection_name: name.to_string(),
            ..Default::default()
        };
        self.client
            .delete_collection(request)
            .await
            .map_err(|e| VectorDataError::Storage(format!("failed to drop '{name}': {e}")))?;
        tracing::info!(collection = name, "Dropped collection");
        Ok(true)
    }

    async fn collection_exists(&self, name: &str) -> VectorDataResult<bool> {
        let request = CollectionExistsRequest {
            collection_name: name.to_string(),
        };
        self.client
            .collection_exists(request)
            .await
            .map_err(|e| VectorDataError::Unavailable(format!("exists check failed: {e}")))
    }

    #[tracing::instrument(skip(self, documents, embeddings), fields(batch = documents.len()))]
    async fn add_documents(
        &self,
        name: &str,
        documents: &[NewDocument],
        embeddings: &[Vec<f32>],
    ) -> VectorDataResult<Vec<String>> {
        if documents.len() != embeddings.len() {
            return Err(VectorDataError::InvalidBatch(format!(
                "{} documents but {} embeddings",
                documents.len(),
                embeddings.len()
            )));
        }
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        // Ordinal allocation from the live count keeps ids disjoint
        // across repeated ingests into the same collection.
        let start_ordinal = self.count(name).await?;

        let mut ids = Vec::with_capacity(documents.len());
        let mut points = Vec::with_capacity(documents.len());

        for (offset, (document, embedding)) in documents.iter().zip(embeddings).enumerate() {
            let chunk_id = format!("chunk_{name}_{}", start_ordinal + offset);

            let mut payload_map = sanitize_metadata(&document.metadata);
            payload_map.insert("id".to_string(), Value::String(chunk_id.clone()));
            payload_map.insert("content".to_string(), Value::String(document.content.clone()));

            let payload = Payload::try_from(Value::Object(payload_map))
                .map_err(|e| VectorDataError::InvalidBatch(format!("bad payload: {e}")))?;

            points.push(PointStruct::new(
                point_uuid_for(&chunk_id).to_string(),
                embedding.clone(),
                payload,
            ));
            ids.push(chunk_id);
        }

        let request = UpsertPoints {
            collection_name: name.to_string(),
            points,
            wait: Some(true),
            ..Default::default()
        };
        self.client
            .upsert_points(request)
            .await
            .map_err(|e| VectorDataError::Storage(format!("upsert into '{name}' failed: {e}")))?;

        tracing::debug!(
            collection = name,
            first = ids.first().map(String::as_str),
            last = ids.last().map(String::as_str),
            "Appended batch"
        );
        Ok(ids)
    }

    async fn query(
        &self,
        name: &str,
        query_vector: &[f32],
        k: usize,
    ) -> VectorDataResult<Vec<SearchHit>> {
        let request = SearchPoints {
            collection_name: name.to_string(),
            vector: query_vector.to_vec(),
            limit: k as u64,
            with_payload: Some(true.into()),
            ..Default::default()
        };

        let response = self
            .client
            .search_points(request)
            .await
            .map_err(|e| VectorDataError::Storage(format!("search in '{name}' failed: {e}")))?;

        Ok(response
            .result
            .into_iter()
            .map(|point| {
                let (id, content, metadata) = split_payload(point.payload);
                SearchHit {
                    id,
                    content,
                    metadata,
                    // Cosine similarity -> cosine distance
                    distance: 1.0 - point.score,
                }
            })
            .collect())
    }

    async fn get_all_documents(&self, name: &str) -> VectorDataResult<Vec<StoredDocument>> {
        let mut documents = Vec::new();
        let mut offset = None;

        loop {
            let request = ScrollPoints {
                collection_name: name.to_string(),
                limit: Some(SCROLL_PAGE_SIZE),
                offset: offset.clone(),
                with_payload: Some(true.into()),
                with_vectors: Some(false.into()),
                ..Default::default()
            };

            let response = self
                .client
                .scroll(request)
                .await
                .map_err(|e| VectorDataError::Storage(format!("scroll of '{name}' failed: {e}")))?;

            for point in response.result {
                let (id, content, metadata) = split_payload(point.payload);
                documents.push(StoredDocument {
                    id,
                    content,
                    metadata,
                });
            }

            match response.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        // Scroll order is unspecified; ordinal order keeps BM25 indices
        // stable between rebuilds.
        documents.sort_by_key(|d| chunk_ordinal(&d.id));
        Ok(documents)
    }

    async fn count(&self, name: &str) -> VectorDataResult<usize> {
        let request = CountPoints {
            collection_name: name.to_string(),
            exact: Some(true),
            ..Default::default()
        };
        let response = self
            .client
            .count(request)
            .await
            .map_err(|e| VectorDataError::Storage(format!("count of '{name}' failed: {e}")))?;
        Ok(response.result.map_or(0, |r| r.count as usize))
    }

    async fn list_collections(&self) -> VectorDataResult<Vec<String>> {
        let response = self
            .client
            .list_collections()
            .await
            .map_err(|e| VectorDataError::Unavailable(format!("list collections failed: {e}")))?;
        Ok(response
            .collections
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    async fn health_check(&self) -> VectorDataResult<HealthReport> {
        match self.client.health_check().await {
            Ok(_) => {
                let collections = self.list_collections().await.unwrap_or_default();
                Ok(HealthReport {
                    healthy: true,
                    collections_count: collections.len(),
                    detail: None,
                })
            }
            Err(e) => Ok(HealthReport {
                healthy: false,
                collections_count: 0,
                detail: Some(e.to_string()),
            }),
        }
    }
}

/// Ordinal suffix of a `chunk_{identifier}_{ordinal}` id; ids that do
/// not match sort first.
fn chunk_ordinal(id: &str) -> usize {
    id.rsplit('_')
        .next()
        .and_then(|tail| tail.parse().ok())
        .unwrap_or(0)
}

/// Pull the chunk id and content out of a point payload, leaving the
/// remaining keys (which include the duplicated content) as metadata.
fn split_payload(
    payload: std::collections::HashMap<String, QdrantValue>,
) -> (String, String, Map<String, Value>) {
    let mut metadata = Map::new();
    let mut id = String::new();
    let mut content = String::new();

    for (key, value) in payload {
        let json = qdrant_value_to_json(value);
        match key.as_str() {
            "id" => {
                if let Value::String(s) = &json {
                    id = s.clone();
                }
            }
            "content" => {
                if let Value::String(s) = &json {
                    content = s.clone();
                }
                metadata.insert(key, json);
            }
            _ => {
                metadata.insert(key, json);
            }
        }
    }

    (id, content, metadata)
}

fn qdrant_value_to_json(value: QdrantValue) -> Value {
    match value.kind {
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::IntegerValue(i)) => Value::from(i),
        Some(Kind::DoubleValue(d)) => {
            serde_json::Number::from_f64(d).map_or(Value::Null, Value::Number)
        }
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(qdrant_value_to_json).collect())
        }
        Some(Kind::StructValue(fields)) => Value::Object(
            fields
                .fields
                .into_iter()
                .map(|(k, v)| (k, qdrant_value_to_json(v)))
                .collect(),
        ),
        Some(Kind::NullValue(_)) | None => Value::Null,
    }
}
