//! Batch selection: extension allowlist + size ceiling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::CandidateFile;

use super::decode::IntakeFormat;

/// Default size ceiling (inclusive): 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default extension allowlist.
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 3] = [".xls", ".xlsx", ".csv"];

/// Why a file was dropped from a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// The name has no `.` at all.
    #[error("file name has no extension")]
    MissingExtension,
    /// The extension is not on the allowlist (or has no decoder).
    #[error("extension '{extension}' is not allowed")]
    UnsupportedExtension { extension: String },
    /// The reported size exceeds the ceiling.
    #[error("file is {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },
}

/// A dropped file and the reason it was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub file_name: String,
    pub reason: RejectReason,
}

/// A file that passed selection, with the format it will be decoded as.
#[derive(Debug, Clone)]
pub struct AcceptedFile {
    pub file: CandidateFile,
    pub format: IntakeFormat,
}

/// Result of partitioning a batch.
#[derive(Debug, Default)]
pub struct Selection {
    pub accepted: Vec<AcceptedFile>,
    pub rejected: Vec<Rejection>,
}

impl Selection {
    /// `true` when nothing in the batch may proceed.
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// Extract the dotted, lowercased extension of a file name.
///
/// The extension is everything after the final `.`, prefixed with `.`. Returns `None` when the
/// name contains no `.`.
///
/// ```
/// use sheet_intake::intake::selection::extension_of;
///
/// assert_eq!(extension_of("Data.XLSX").as_deref(), Some(".xlsx"));
/// assert_eq!(extension_of("archive.tar.csv").as_deref(), Some(".csv"));
/// assert_eq!(extension_of("report"), None);
/// ```
pub fn extension_of(name: &str) -> Option<String> {
    name.rfind('.')
        .map(|idx| format!(".{}", name[idx + 1..].to_lowercase()))
}

/// Validation rules applied to every candidate file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    allowed_extensions: Vec<String>,
    max_file_size: u64,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_ALLOWED_EXTENSIONS.iter().map(|s| s.to_string()),
            DEFAULT_MAX_FILE_SIZE,
        )
    }
}

impl SelectionPolicy {
    /// Create a policy. Extensions are normalized to lowercase with a leading `.`.
    pub fn new(allowed_extensions: impl IntoIterator<Item = String>, max_file_size: u64) -> Self {
        let allowed_extensions = allowed_extensions
            .into_iter()
            .map(|e| {
                let e = e.trim().to_lowercase();
                if e.starts_with('.') { e } else { format!(".{e}") }
            })
            .collect();
        Self {
            allowed_extensions,
            max_file_size,
        }
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Check a single file against the extension and size predicates.
    pub fn check(&self, file: &CandidateFile) -> Result<IntakeFormat, RejectReason> {
        let extension = extension_of(&file.name).ok_or(RejectReason::MissingExtension)?;

        let format = self
            .allowed_extensions
            .iter()
            .any(|allowed| allowed == &extension)
            .then(|| IntakeFormat::from_extension(&extension[1..]))
            .flatten()
            .ok_or_else(|| RejectReason::UnsupportedExtension {
                extension: extension.clone(),
            })?;

        if file.size_bytes > self.max_file_size {
            return Err(RejectReason::TooLarge {
                size: file.size_bytes,
                max: self.max_file_size,
            });
        }

        Ok(format)
    }

    /// Partition a batch into accepted and rejected files, preserving input order.
    pub fn partition(&self, files: Vec<CandidateFile>) -> Selection {
        let mut selection = Selection::default();
        for file in files {
            match self.check(&file) {
                Ok(format) => selection.accepted.push(AcceptedFile { file, format }),
                Err(reason) => selection.rejected.push(Rejection {
                    file_name: file.name,
                    reason,
                }),
            }
        }
        selection
    }
}
