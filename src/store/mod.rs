//! Document store abstraction.
//!
//! The pipeline only needs one capability from the backing database: append a new document
//! with a store-assigned identity to a named collection. Backends implement
//! [`DocumentStore`]; two are bundled:
//!
//! - [`MemoryStore`]: in-process, for tests and previews
//! - [`LocalDocumentStore`]: one JSON file per document under a root directory

mod local;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{DocumentId, UploadDocument};

pub use local::LocalDocumentStore;
pub use memory::{MemoryStore, StoredDocument};

/// Collection the pipeline writes to unless configured otherwise.
pub const DEFAULT_COLLECTION: &str = "datasets";

/// Store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("Write rejected: {0}")]
    Rejected(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A document database that can append to a collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Append `document` to `collection`, returning the identity assigned to it.
    async fn append(&self, collection: &str, document: &UploadDocument) -> StoreResult<DocumentId>;
}

/// Reject names that are empty or could escape a collection namespace.
pub(crate) fn validate_collection(collection: &str) -> StoreResult<()> {
    if collection.trim().is_empty()
        || collection.contains("..")
        || collection.contains('/')
        || collection.contains('\\')
    {
        return Err(StoreError::InvalidCollection(collection.to_string()));
    }
    Ok(())
}
