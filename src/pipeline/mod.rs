//! Batch dispatch for the intake pipeline.
//!
//! This module sits "above" [`crate::intake`] and [`crate::store`] and provides:
//!
//! - [`IntakePipeline::submit`]: validate a batch and spawn one task per accepted file
//! - [`BusyTracker`]: a reference-counted idle/busy indicator
//! - [`BatchHandle`] / [`BatchReport`]: optional waiting on a batch's outcomes
//!
//! Tasks are fire-and-forget: dropping a [`BatchHandle`] does not cancel anything, and files of
//! one batch complete in no particular order.

mod busy;
mod persist;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::error::{IntakeError, IntakeResult};
use crate::intake::observability::{IntakeObserver, IntakeSeverity};
use crate::intake::selection::{
    Rejection, Selection, SelectionPolicy, DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_FILE_SIZE,
};
use crate::store::{DocumentStore, DEFAULT_COLLECTION};
use crate::types::{CandidateFile, DocumentId};

pub use busy::{BusyGuard, BusyTracker};
pub use persist::{FileOutcome, FAILURE_MESSAGE};

use persist::FileTask;

/// Options controlling the intake pipeline.
///
/// Use [`Default`] for the standard allowlist (`.xls`, `.xlsx`, `.csv`), a 10 MiB ceiling and
/// the `datasets` collection. Deserializes with missing fields taking their defaults, so a host
/// can load partial settings from JSON or TOML.
///
/// ```
/// use sheet_intake::pipeline::IntakeOptions;
///
/// let opts: IntakeOptions = serde_json::from_str(r#"{ "collection": "imports" }"#).unwrap();
/// assert_eq!(opts.collection, "imports");
/// assert_eq!(opts.max_file_size, 10 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeOptions {
    /// Dotted, case-insensitive extensions accepted by selection.
    pub allowed_extensions: Vec<String>,
    /// Inclusive size ceiling in bytes.
    pub max_file_size: u64,
    /// Collection documents are appended to.
    pub collection: String,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IntakeSeverity,
}

impl Default for IntakeOptions {
    fn default() -> Self {
        Self {
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            collection: DEFAULT_COLLECTION.to_string(),
            alert_at_or_above: IntakeSeverity::Critical,
        }
    }
}

impl IntakeOptions {
    /// Build the selection policy described by these options.
    pub fn selection_policy(&self) -> SelectionPolicy {
        SelectionPolicy::new(self.allowed_extensions.iter().cloned(), self.max_file_size)
    }
}

/// The intake component: selection, per-file decode/persist tasks, and the busy indicator.
pub struct IntakePipeline {
    store: Arc<dyn DocumentStore>,
    observer: Option<Arc<dyn IntakeObserver>>,
    options: IntakeOptions,
    policy: SelectionPolicy,
    busy: Arc<BusyTracker>,
}

impl fmt::Debug for IntakePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntakePipeline")
            .field("options", &self.options)
            .field("observer_set", &self.observer.is_some())
            .field("busy", &self.busy)
            .finish()
    }
}

impl IntakePipeline {
    /// Create a pipeline writing to `store` with default options.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_options(store, IntakeOptions::default())
    }

    /// Create a pipeline with explicit options.
    pub fn with_options(store: Arc<dyn DocumentStore>, options: IntakeOptions) -> Self {
        let policy = options.selection_policy();
        Self {
            store,
            observer: None,
            options,
            policy,
            busy: Arc::new(BusyTracker::new()),
        }
    }

    /// Attach an observer for outcomes (the alert/toast layer).
    pub fn with_observer(mut self, observer: Arc<dyn IntakeObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn options(&self) -> &IntakeOptions {
        &self.options
    }

    /// Handle to the busy indicator shared by every batch of this pipeline.
    pub fn busy(&self) -> Arc<BusyTracker> {
        Arc::clone(&self.busy)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Partition a batch without dispatching anything.
    pub fn select(&self, files: Vec<CandidateFile>) -> Selection {
        self.policy.partition(files)
    }

    /// Validate a batch and dispatch one task per accepted file.
    ///
    /// Returns [`IntakeError::EmptyBatch`] (after notifying the observer once) when no file
    /// passes selection; nothing is dispatched in that case. Otherwise rejected files are dropped
    /// and reported via [`IntakeObserver::on_rejected`].
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn submit(&self, files: Vec<CandidateFile>) -> IntakeResult<BatchHandle> {
        let Selection { accepted, rejected } = self.policy.partition(files);

        if accepted.is_empty() {
            tracing::warn!(rejected = rejected.len(), "batch has no valid files");
            if let Some(obs) = self.observer.as_ref() {
                obs.on_batch_rejected(&rejected);
            }
            return Err(IntakeError::EmptyBatch { rejections: rejected });
        }

        for rejection in &rejected {
            tracing::debug!(file = %rejection.file_name, reason = %rejection.reason, "dropping file");
            if let Some(obs) = self.observer.as_ref() {
                obs.on_rejected(rejection);
            }
        }

        tracing::info!(accepted = accepted.len(), rejected = rejected.len(), "dispatching batch");

        let task = FileTask {
            store: Arc::clone(&self.store),
            observer: self.observer.clone(),
            collection: Arc::from(self.options.collection.as_str()),
            alert_at_or_above: self.options.alert_at_or_above,
        };

        let tasks = accepted
            .into_iter()
            .map(|accepted| {
                let name = accepted.file.name.clone();
                let span = tracing::info_span!("intake_file", file = %name, format = %accepted.format);
                let guard = self.busy.begin();
                let task = task.clone();
                let handle = tokio::spawn(
                    async move {
                        let _guard = guard;
                        task.run(accepted).await
                    }
                    .instrument(span),
                );
                (name, handle)
            })
            .collect();

        Ok(BatchHandle { rejected, tasks })
    }

    /// Submit a batch and wait for every dispatched file to settle.
    pub async fn upload_batch(&self, files: Vec<CandidateFile>) -> IntakeResult<BatchReport> {
        Ok(self.submit(files)?.settle().await)
    }
}

/// The dispatched part of a batch.
///
/// Dropping the handle detaches the tasks; they still run to completion.
#[derive(Debug)]
pub struct BatchHandle {
    rejected: Vec<Rejection>,
    tasks: Vec<(String, JoinHandle<FileOutcome>)>,
}

impl BatchHandle {
    /// Number of files dispatched.
    pub fn accepted(&self) -> usize {
        self.tasks.len()
    }

    /// Files dropped by selection.
    pub fn rejected(&self) -> &[Rejection] {
        &self.rejected
    }

    /// Wait for every dispatched file to settle.
    ///
    /// A task that panicked is reported as a failed outcome rather than propagated.
    pub async fn settle(self) -> BatchReport {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for (file_name, handle) in self.tasks {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(file = %file_name, error = %e, "intake task did not complete");
                    FileOutcome::Failed {
                        file_name,
                        error: IntakeError::Task {
                            message: e.to_string(),
                        },
                    }
                }
            };
            outcomes.push(outcome);
        }
        BatchReport {
            outcomes,
            rejected: self.rejected,
        }
    }
}

/// Settled outcomes of one batch, in dispatch order.
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
    pub rejected: Vec<Rejection>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Ids of the documents written by this batch.
    pub fn document_ids(&self) -> Vec<&DocumentId> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                FileOutcome::Uploaded { document_id, .. } => Some(document_id),
                FileOutcome::Failed { .. } => None,
            })
            .collect()
    }

    /// Find the outcome for a file name.
    pub fn outcome(&self, file_name: &str) -> Option<&FileOutcome> {
        self.outcomes.iter().find(|o| o.file_name() == file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_matches_component_constants() {
        let opts = IntakeOptions::default();
        assert_eq!(opts.allowed_extensions, vec![".xls", ".xlsx", ".csv"]);
        assert_eq!(opts.max_file_size, 10 * 1024 * 1024);
        assert_eq!(opts.collection, "datasets");
        assert_eq!(opts.alert_at_or_above, IntakeSeverity::Critical);
    }

    #[test]
    fn options_deserialize_partially() {
        let opts: IntakeOptions =
            serde_json::from_str(r#"{ "max_file_size": 1024, "alert_at_or_above": "error" }"#).unwrap();
        assert_eq!(opts.max_file_size, 1024);
        assert_eq!(opts.alert_at_or_above, IntakeSeverity::Error);
        assert_eq!(opts.collection, "datasets");
        assert_eq!(opts.selection_policy().max_file_size(), 1024);
    }
}
