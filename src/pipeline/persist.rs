//! Per-file pipeline instance: read → decode → persist → report.

use std::sync::Arc;

use crate::error::{IntakeError, IntakeResult};
use crate::intake::observability::{IntakeContext, IntakeObserver, IntakeSeverity, IntakeStats};
use crate::intake::selection::AcceptedFile;
use crate::intake::decode_rows;
use crate::store::DocumentStore;
use crate::types::{DocumentId, UploadDocument};

/// Generic failure message shown for any per-file fault.
pub const FAILURE_MESSAGE: &str = "Error uploading file!";

/// How one file's pipeline ended.
#[derive(Debug)]
pub enum FileOutcome {
    /// Decoded and persisted.
    Uploaded {
        file_name: String,
        document_id: DocumentId,
        rows: usize,
    },
    /// Decoding or persisting failed.
    Failed { file_name: String, error: IntakeError },
}

impl FileOutcome {
    pub fn file_name(&self) -> &str {
        match self {
            FileOutcome::Uploaded { file_name, .. } | FileOutcome::Failed { file_name, .. } => file_name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Uploaded { .. })
    }

    /// The error, if the file failed.
    pub fn error(&self) -> Option<&IntakeError> {
        match self {
            FileOutcome::Failed { error, .. } => Some(error),
            FileOutcome::Uploaded { .. } => None,
        }
    }

    /// User-facing message. Decode and persist faults share [`FAILURE_MESSAGE`].
    pub fn message(&self) -> String {
        match self {
            FileOutcome::Uploaded { file_name, .. } => format!("{file_name} uploaded & saved!"),
            FileOutcome::Failed { .. } => FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Everything a spawned file task needs; cheap to clone per file.
#[derive(Clone)]
pub(crate) struct FileTask {
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) observer: Option<Arc<dyn IntakeObserver>>,
    pub(crate) collection: Arc<str>,
    pub(crate) alert_at_or_above: IntakeSeverity,
}

impl FileTask {
    /// Run one accepted file to completion. Never returns an error: every fault becomes a
    /// [`FileOutcome::Failed`] and an observer callback.
    pub(crate) async fn run(self, accepted: AcceptedFile) -> FileOutcome {
        let ctx = IntakeContext {
            file_name: accepted.file.name.clone(),
            format: accepted.format,
            size_bytes: accepted.file.size_bytes,
        };

        match self.decode_and_persist(accepted).await {
            Ok(stats) => {
                tracing::info!(rows = stats.rows, document_id = %stats.document_id, "file persisted");
                if let Some(obs) = self.observer.as_ref() {
                    obs.on_success(&ctx, &stats);
                }
                FileOutcome::Uploaded {
                    file_name: ctx.file_name,
                    document_id: stats.document_id,
                    rows: stats.rows,
                }
            }
            Err(error) => {
                let severity = error.severity();
                tracing::warn!(?severity, error = %error, "file pipeline failed");
                if let Some(obs) = self.observer.as_ref() {
                    obs.on_failure(&ctx, severity, &error);
                    if severity >= self.alert_at_or_above {
                        obs.on_alert(&ctx, severity, &error);
                    }
                }
                FileOutcome::Failed {
                    file_name: ctx.file_name,
                    error,
                }
            }
        }
    }

    async fn decode_and_persist(&self, accepted: AcceptedFile) -> IntakeResult<IntakeStats> {
        let AcceptedFile { file, format } = accepted;

        let bytes = file.content.read().await?;
        tracing::debug!(bytes = bytes.len(), "content read");

        // Decoding is CPU-bound; keep it off the async workers.
        let rows = tokio::task::spawn_blocking(move || decode_rows(format, &bytes))
            .await
            .map_err(|e| IntakeError::Task {
                message: e.to_string(),
            })??;

        let document = UploadDocument::new(file.name, rows);
        let document_id = self.store.append(&self.collection, &document).await?;

        Ok(IntakeStats {
            rows: document.row_count(),
            document_id,
        })
    }
}
