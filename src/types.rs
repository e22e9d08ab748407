//! Core data model types for intake.
//!
//! A dropped file is a [`CandidateFile`]. Decoding its first sheet yields a list of
//! [`RowRecord`]s (header-keyed [`CellValue`]s), which are persisted as one [`UploadDocument`].

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::IntakeResult;

/// A single untyped spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Missing/empty cell. Serializes as `null`.
    Empty,
    /// Text cell.
    Text(String),
    /// Numeric cell (integers, floats and date serials).
    Number(f64),
    /// Boolean cell.
    Bool(bool),
}

impl CellValue {
    /// Returns `true` for [`CellValue::Empty`] and for zero-length text. Whitespace is content.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Render the cell as a column header.
    ///
    /// Integral numbers render without a fractional part (`2024`, not `2024.0`).
    pub fn to_header_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_owned(),
            CellValue::Number(f) => {
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            CellValue::Bool(b) => b.to_string().to_ascii_uppercase(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Number(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// One data row: an ordered mapping from column header to cell value.
///
/// Columns keep the order of the sheet's header row. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowRecord {
    columns: Vec<(String, CellValue)>,
}

impl RowRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Callers are responsible for header uniqueness.
    pub fn push(&mut self, header: impl Into<String>, value: CellValue) {
        self.columns.push((header.into(), value));
    }

    /// Look up a cell by header.
    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.columns
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate headers in column order.
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(h, _)| h.as_str())
    }

    /// Iterate `(header, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.columns.iter().map(|(h, v)| (h.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for RowRecord {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl Serialize for RowRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (header, value) in &self.columns {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}

/// Where a candidate file's bytes come from.
#[derive(Debug, Clone)]
pub enum ByteSource {
    /// Bytes already in memory (e.g. handed over by a browser or multipart form).
    Memory(Bytes),
    /// A file on the local filesystem, read when the file's pipeline runs.
    Path(PathBuf),
}

impl ByteSource {
    /// Acquire the full byte content.
    pub async fn read(&self) -> IntakeResult<Bytes> {
        match self {
            ByteSource::Memory(bytes) => Ok(bytes.clone()),
            ByteSource::Path(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
        }
    }
}

/// A file offered for intake.
///
/// `size_bytes` is the size the selection surface reported; validation uses it without
/// reading the content.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    /// Original file name, including extension.
    pub name: String,
    /// Reported size in bytes.
    pub size_bytes: u64,
    /// Byte content.
    pub content: ByteSource,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, size_bytes: u64, content: ByteSource) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            content,
        }
    }

    /// Create an in-memory candidate; the size is the byte length.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self::new(name, bytes.len() as u64, ByteSource::Memory(bytes))
    }

    /// Create a candidate backed by a filesystem path. Only metadata is read here.
    pub async fn from_path(path: impl AsRef<Path>) -> IntakeResult<Self> {
        let path = path.as_ref();
        let meta = tokio::fs::metadata(path).await?;
        Ok(Self::new(
            file_name_of(path),
            meta.len(),
            ByteSource::Path(path.to_path_buf()),
        ))
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Identity assigned to a document by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The document written to the store for every successfully decoded file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDocument {
    /// Original file name.
    pub name: String,
    /// Data rows of the first sheet, header excluded.
    pub rows: Vec<RowRecord>,
    /// Client clock at persistence time.
    pub created_at: DateTime<Utc>,
}

impl UploadDocument {
    /// Build a document stamped with the current time.
    pub fn new(name: impl Into<String>, rows: Vec<RowRecord>) -> Self {
        Self {
            name: name.into(),
            rows,
            created_at: Utc::now(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_record_serializes_in_column_order() {
        let row: RowRecord = [
            ("b", CellValue::from("x")),
            ("a", CellValue::Number(2.5)),
            ("c", CellValue::Empty),
            ("d", CellValue::Bool(true)),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"b":"x","a":2.5,"c":null,"d":true}"#);
    }

    #[test]
    fn header_string_drops_integral_fraction() {
        assert_eq!(CellValue::Number(2024.0).to_header_string(), "2024");
        assert_eq!(CellValue::Number(1.5).to_header_string(), "1.5");
        assert_eq!(CellValue::from("  name ").to_header_string(), "name");
        assert_eq!(CellValue::Empty.to_header_string(), "");
    }

    #[test]
    fn upload_document_uses_camel_case_timestamp() {
        let doc = UploadDocument::new("people.csv", vec![RowRecord::new()]);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["name"], "people.csv");
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["rows"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn from_bytes_reports_byte_length() {
        let f = CandidateFile::from_bytes("a.csv", &b"a,b\n1,2"[..]);
        assert_eq!(f.size_bytes, 7);
    }
}
