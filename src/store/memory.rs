use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::types::{DocumentId, UploadDocument};

use super::{validate_collection, DocumentStore, StoreError, StoreResult};

/// A document together with the id it was stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub document: UploadDocument,
}

/// In-memory [`DocumentStore`].
///
/// Documents with a name registered through [`MemoryStore::reject_name`] fail to append, which
/// lets tests exercise persistence faults for a single file of a batch.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<StoredDocument>>>,
    rejected_names: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every append of a document named `name` fail with [`StoreError::Rejected`].
    pub fn reject_name(self, name: impl Into<String>) -> Self {
        if let Ok(mut names) = self.rejected_names.lock() {
            names.insert(name.into());
        }
        self
    }

    /// Snapshot the documents of a collection in append order.
    pub fn documents(&self, collection: &str) -> Vec<StoredDocument> {
        self.collections
            .lock()
            .map(|c| c.get(collection).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .map(|c| c.get(collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn append(&self, collection: &str, document: &UploadDocument) -> StoreResult<DocumentId> {
        validate_collection(collection)?;

        let rejected = self
            .rejected_names
            .lock()
            .map(|names| names.contains(&document.name))
            .unwrap_or(false);
        if rejected {
            return Err(StoreError::Rejected(format!(
                "document '{}' refused by store",
                document.name
            )));
        }

        let id = DocumentId(Uuid::new_v4().to_string());
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| StoreError::Rejected("store lock poisoned".to_string()))?;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(StoredDocument {
                id: id.clone(),
                document: document.clone(),
            });
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_assigns_distinct_ids() {
        let store = MemoryStore::new();
        let doc = UploadDocument::new("a.csv", vec![]);

        let first = store.append("datasets", &doc).await.unwrap();
        let second = store.append("datasets", &doc).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(store.len("datasets"), 2);
        assert!(store.is_empty("other"));
    }

    #[tokio::test]
    async fn rejected_names_fail_without_storing() {
        let store = MemoryStore::new().reject_name("bad.csv");

        let err = store
            .append("datasets", &UploadDocument::new("bad.csv", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));

        store
            .append("datasets", &UploadDocument::new("good.csv", vec![]))
            .await
            .unwrap();
        let names: Vec<String> = store
            .documents("datasets")
            .into_iter()
            .map(|d| d.document.name)
            .collect();
        assert_eq!(names, vec!["good.csv".to_string()]);
    }

    #[tokio::test]
    async fn invalid_collection_is_refused() {
        let store = MemoryStore::new();
        let err = store
            .append("../x", &UploadDocument::new("a.csv", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidCollection(_)));
    }
}
