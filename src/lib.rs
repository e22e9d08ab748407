//! `sheet-intake` takes spreadsheet files dropped onto an upload surface, validates them,
//! decodes the first sheet of each into header-keyed rows, and persists one document per file to
//! a document store.
//!
//! The primary entrypoint is [`pipeline::IntakePipeline`]: hand it a batch of
//! [`types::CandidateFile`]s and it dispatches one asynchronous task per accepted file.
//!
//! ## What you can upload
//!
//! **File formats (selected by extension, case-insensitive):**
//!
//! - **CSV**: `.csv`
//! - **Workbooks** (requires the Cargo feature `excel`, on by default): `.xls`, `.xlsx`
//!   (`.xlsm`, `.xlsb` and `.ods` can be enabled through [`pipeline::IntakeOptions`])
//!
//! Files larger than 10 MiB (inclusive ceiling) or with any other extension are dropped from the
//! batch. A batch where nothing passes is reported once as [`IntakeError::EmptyBatch`].
//!
//! **Row model:**
//!
//! Only the first sheet is read. Its first non-empty row is the header; every following row
//! becomes a [`types::RowRecord`] mapping header → [`types::CellValue`]
//! (`Empty`, `Text`, `Number` or `Bool`). CSV cells stay text.
//!
//! ## Quick example: upload a batch
//!
//! ```
//! use std::sync::Arc;
//!
//! use sheet_intake::pipeline::IntakePipeline;
//! use sheet_intake::store::MemoryStore;
//! use sheet_intake::types::CandidateFile;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), sheet_intake::IntakeError> {
//! let store = Arc::new(MemoryStore::new());
//! let pipeline = IntakePipeline::new(store.clone());
//!
//! let report = pipeline
//!     .upload_batch(vec![
//!         CandidateFile::from_bytes("people.csv", &b"id,name\n1,Ada\n2,Grace"[..]),
//!         CandidateFile::from_bytes("notes.txt", &b"ignored"[..]),
//!     ])
//!     .await?;
//!
//! assert_eq!(report.succeeded(), 1);
//! assert_eq!(report.rejected.len(), 1);
//! assert!(!pipeline.is_busy());
//! assert_eq!(store.documents("datasets")[0].document.rows.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Decoding without persisting
//!
//! ```rust
//! use sheet_intake::intake::{decode_rows, IntakeFormat};
//! use sheet_intake::types::CellValue;
//!
//! let rows = decode_rows(IntakeFormat::Csv, b"a,b\n1,2\n3,4").unwrap();
//! assert_eq!(rows[1].get("a"), Some(&CellValue::from("3")));
//! ```
//!
//! ## Modules
//!
//! - [`intake`]: selection, decoding, and observer callbacks
//! - [`pipeline`]: batch dispatch, per-file tasks, and the busy indicator
//! - [`store`]: the document store trait and bundled stores
//! - [`types`]: candidate files, row records, and documents
//! - [`error`]: error types used across the crate
//!
//! Logging goes through `tracing`; install any subscriber to see it.

pub mod error;
pub mod intake;
pub mod pipeline;
pub mod store;
pub mod types;

pub use error::{IntakeError, IntakeResult};
