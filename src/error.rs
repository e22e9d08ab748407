use thiserror::Error;

use crate::intake::selection::Rejection;
use crate::store::StoreError;

/// Convenience result type for intake operations.
pub type IntakeResult<T> = Result<T, IntakeError>;

/// Error type returned by intake functions.
///
/// This is a single error enum shared across selection, CSV/workbook decoding and persistence.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Workbook decoding error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV decoding error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The document store refused or failed the write.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Every file in a batch failed validation; nothing was dispatched.
    #[error("no valid files in batch ({} rejected)", .rejections.len())]
    EmptyBatch { rejections: Vec<Rejection> },

    /// The file name does not map to a decodable format.
    #[error("unsupported format for '{name}'")]
    UnsupportedFormat { name: String },

    /// The bytes decoded, but the workbook has no usable sheet/header.
    #[error("workbook error: {message}")]
    Workbook { message: String },

    /// The decode task was cancelled or panicked.
    #[error("intake task failed: {message}")]
    Task { message: String },
}
