//! Record types and the metadata sanitizer

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Namespace for deriving point UUIDs from chunk id strings.
/// Qdrant point ids must be UUIDs or integers; the chunk id string
/// (`chunk_<identifier>_<ordinal>`) stays the public identity in the
/// payload.
pub const CHUNK_ID_NAMESPACE: Uuid = uuid::uuid!("6ba7b811-9dad-11d1-80b4-00c04fd430c8");

/// Derive the deterministic point UUID for a chunk id string
pub fn point_uuid_for(chunk_id: &str) -> Uuid {
    Uuid::new_v5(&CHUNK_ID_NAMESPACE, chunk_id.as_bytes())
}

/// A chunk headed for storage: content plus scalar metadata.
/// Embeddings travel in a parallel slice so the id allocator can
/// assign ordinals at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub content: String,
    pub metadata: Map<String, Value>,
}

/// A chunk as read back from a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub content: String,
    pub metadata: Map<String, Value>,
}

/// A similarity search hit
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub content: String,
    pub metadata: Map<String, Value>,
    /// Cosine distance (lower is closer); the retriever converts this
    /// to a score via `1 / (1 + distance)`
    pub distance: f32,
}

/// Health report for the backing store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub collections_count: usize,
    pub detail: Option<String>,
}

/// Force every metadata value into a storable scalar.
///
/// `null` becomes the empty string, scalars pass through, and anything
/// structured is JSON-encoded to a string.
pub fn sanitize_metadata(metadata: &Map<String, Value>) -> Map<String, Value> {
    metadata
        .iter()
        .map(|(key, value)| {
            let cleaned = match value {
                Value::Null => Value::String(String::new()),
                Value::String(_) | Value::Bool(_) | Value::Number(_) => value.clone(),
                other => Value::String(other.to_string()),
            };
            (key.clone(), cleaned)
        })
        .collect()
}
