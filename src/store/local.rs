use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::types::{DocumentId, UploadDocument};

use super::{validate_collection, DocumentStore, StoreError, StoreResult};

/// Local filesystem document store.
///
/// Each document is written as pretty-printed JSON to `<root>/<collection>/<id>.json`.
#[derive(Debug, Clone)]
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a document with `id` in `collection` is (or would be) stored at.
    pub fn document_path(&self, collection: &str, id: &DocumentId) -> StoreResult<PathBuf> {
        validate_collection(collection)?;
        Ok(self.root.join(collection).join(format!("{id}.json")))
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn append(&self, collection: &str, document: &UploadDocument) -> StoreResult<DocumentId> {
        let id = DocumentId(Uuid::new_v4().to_string());
        let path = self.document_path(collection, &id)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let body = serde_json::to_vec_pretty(document)?;

        write_atomically(&path, &body).await?;

        tracing::debug!(collection, id = %id, path = %path.display(), "document written");
        Ok(id)
    }
}

/// Write `body` to a sibling temp file, then rename it over `path`.
///
/// Readers never observe a partial document; on failure the temp file is removed.
async fn write_atomically(path: &Path, body: &[u8]) -> StoreResult<()> {
    let tmp = path.with_extension("json.tmp");
    let result = write_then_rename(&tmp, path, body).await;
    if result.is_err() {
        let _ = fs::remove_file(&tmp).await;
    }
    result
}

async fn write_then_rename(tmp: &Path, path: &Path, body: &[u8]) -> StoreResult<()> {
    let mut file = fs::File::create(tmp).await?;
    file.write_all(body).await?;
    file.flush().await?;
    drop(file);
    fs::rename(tmp, path).await.map_err(|e| {
        StoreError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to finalize {}: {e}", path.display()),
        ))
    })
}
