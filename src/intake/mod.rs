//! Intake stages that run without side effects on the store.
//!
//! - [`selection`]: extension allowlist + size ceiling, partitioning a batch
//! - [`decode`] (via [`decode_rows`]): first-sheet decoding for CSV and workbook formats
//! - [`observability`]: observer callbacks that replace modal alerts
//!
//! Format-specific decoders live under [`csv`] and `excel` (feature `excel`).

pub mod csv;
pub mod decode;
#[cfg(feature = "excel")]
pub mod excel;
pub mod observability;
mod rows;
pub mod selection;

use std::path::Path;

use walkdir::WalkDir;

use crate::error::IntakeResult;
use crate::types::{ByteSource, CandidateFile, file_name_of};

pub use decode::{decode_file_bytes, decode_rows, IntakeFormat};
pub use observability::{
    CompositeObserver, IntakeContext, IntakeObserver, IntakeSeverity, IntakeStats, TracingObserver,
};
pub use selection::{
    extension_of, AcceptedFile, RejectReason, Rejection, Selection, SelectionPolicy,
    DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_FILE_SIZE,
};

/// Collect every regular file under `dir` as a candidate, sorted by path.
///
/// This is the headless counterpart of a file picker: nothing is filtered here, so the batch
/// goes through the same selection rules as a drop.
pub fn collect_candidates(dir: impl AsRef<Path>) -> IntakeResult<Vec<CandidateFile>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let size = entry.metadata().map_err(std::io::Error::from)?.len();
        files.push(CandidateFile::new(
            file_name_of(entry.path()),
            size,
            ByteSource::Path(entry.path().to_path_buf()),
        ));
    }
    Ok(files)
}
