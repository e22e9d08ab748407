use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::IntakeError;
use crate::types::DocumentId;

use super::decode::IntakeFormat;
use super::selection::Rejection;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntakeSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (the file's pipeline failed).
    Error,
    /// Critical error (I/O or store failures).
    Critical,
}

impl IntakeError {
    /// Severity of a per-file failure.
    ///
    /// Decode faults are `Error`; anything involving I/O, the store, or a crashed task is
    /// `Critical`.
    pub fn severity(&self) -> IntakeSeverity {
        match self {
            IntakeError::Io(_) => IntakeSeverity::Critical,
            IntakeError::Store(_) => IntakeSeverity::Critical,
            IntakeError::Task { .. } => IntakeSeverity::Critical,
            IntakeError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => IntakeSeverity::Critical,
                _ => IntakeSeverity::Error,
            },
            #[cfg(feature = "excel")]
            IntakeError::Excel(_) => IntakeSeverity::Error,
            IntakeError::Workbook { .. } => IntakeSeverity::Error,
            IntakeError::UnsupportedFormat { .. } => IntakeSeverity::Error,
            IntakeError::EmptyBatch { .. } => IntakeSeverity::Warning,
        }
    }
}

/// Context about one file's pipeline.
#[derive(Debug, Clone)]
pub struct IntakeContext {
    /// Original file name.
    pub file_name: String,
    /// Format the file is decoded as.
    pub format: IntakeFormat,
    /// Reported size in bytes.
    pub size_bytes: u64,
}

/// Stats reported on a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeStats {
    /// Number of data rows persisted (header excluded).
    pub rows: usize,
    /// Identity the store assigned to the document.
    pub document_id: DocumentId,
}

/// Observer interface for intake outcomes.
///
/// This is the structured replacement for modal alerts: a UI layer shows a toast from
/// `on_success`/`on_failure`, a test harness records them.
pub trait IntakeObserver: Send + Sync {
    /// Called once when no file of a batch passed selection.
    fn on_batch_rejected(&self, _rejections: &[Rejection]) {}

    /// Called for each file dropped from a batch that still had valid files.
    fn on_rejected(&self, _rejection: &Rejection) {}

    /// Called when a file was decoded and persisted.
    fn on_success(&self, _ctx: &IntakeContext, _stats: &IntakeStats) {}

    /// Called when a file's pipeline fails (decode or persist).
    fn on_failure(&self, _ctx: &IntakeContext, _severity: IntakeSeverity, _error: &IntakeError) {}

    /// Called in addition to `on_failure` when a failure meets the alert threshold.
    fn on_alert(&self, _ctx: &IntakeContext, _severity: IntakeSeverity, _error: &IntakeError) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IntakeObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IntakeObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IntakeObserver for CompositeObserver {
    fn on_batch_rejected(&self, rejections: &[Rejection]) {
        for o in &self.observers {
            o.on_batch_rejected(rejections);
        }
    }

    fn on_rejected(&self, rejection: &Rejection) {
        for o in &self.observers {
            o.on_rejected(rejection);
        }
    }

    fn on_success(&self, ctx: &IntakeContext, stats: &IntakeStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IntakeContext, severity: IntakeSeverity, error: &IntakeError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IntakeContext, severity: IntakeSeverity, error: &IntakeError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Emits intake events as `tracing` events under the `sheet_intake` target.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IntakeObserver for TracingObserver {
    fn on_batch_rejected(&self, rejections: &[Rejection]) {
        tracing::warn!(rejected = rejections.len(), "invalid file type or size, nothing to upload");
    }

    fn on_rejected(&self, rejection: &Rejection) {
        tracing::debug!(file = %rejection.file_name, reason = %rejection.reason, "file dropped from batch");
    }

    fn on_success(&self, ctx: &IntakeContext, stats: &IntakeStats) {
        tracing::info!(
            file = %ctx.file_name,
            format = %ctx.format,
            rows = stats.rows,
            document_id = %stats.document_id,
            "uploaded and saved"
        );
    }

    fn on_failure(&self, ctx: &IntakeContext, severity: IntakeSeverity, error: &IntakeError) {
        tracing::warn!(
            file = %ctx.file_name,
            format = %ctx.format,
            ?severity,
            error = %error,
            "error uploading file"
        );
    }

    fn on_alert(&self, ctx: &IntakeContext, severity: IntakeSeverity, error: &IntakeError) {
        tracing::error!(
            file = %ctx.file_name,
            format = %ctx.format,
            ?severity,
            error = %error,
            "intake alert"
        );
    }
}
