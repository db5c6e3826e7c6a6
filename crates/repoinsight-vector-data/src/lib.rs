//! RepoInsight vector storage crate
//!
//! Collection-keyed vector storage behind the `VectorStore` trait,
//! with a Qdrant backend for production and an in-memory mock for
//! tests. Collections are named by repository identifier; chunk ids
//! are `chunk_{identifier}_{ordinal}` with ordinals allocated from the
//! live collection count.

pub mod error;
pub mod mock;
pub mod qdrant;
pub mod traits;
pub mod types;

pub use error::{VectorDataError, VectorDataResult};
pub use mock::MockVectorStore;
pub use qdrant::QdrantStore;
pub use traits::VectorStore;
pub use types::{
    point_uuid_for, sanitize_metadata, HealthReport, NewDocument, SearchHit, StoredDocument,
};
