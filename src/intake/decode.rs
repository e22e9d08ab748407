//! Unified decoding entrypoint.
//!
//! Most callers should use [`decode_rows`], which turns the raw bytes of an accepted file into
//! row records of its first sheet.
//!
//! - [`IntakeFormat::Csv`] is decoded with the `csv` crate.
//! - Workbook formats are decoded with `calamine` (cargo feature `excel`, on by default).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IntakeError, IntakeResult};
use crate::types::RowRecord;

use super::csv;
use super::selection::extension_of;

/// Supported intake formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntakeFormat {
    /// Comma-separated values.
    Csv,
    /// Legacy binary workbook (BIFF).
    Xls,
    /// Office Open XML workbook.
    Xlsx,
    /// Macro-enabled Office Open XML workbook.
    Xlsm,
    /// Binary Office Open XML workbook.
    Xlsb,
    /// OpenDocument spreadsheet.
    Ods,
}

impl IntakeFormat {
    /// Parse an intake format from a file extension without the leading dot (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xls" => Some(Self::Xls),
            "xlsx" => Some(Self::Xlsx),
            "xlsm" => Some(Self::Xlsm),
            "xlsb" => Some(Self::Xlsb),
            "ods" => Some(Self::Ods),
            _ => None,
        }
    }

    /// Infer the format from a file name's final extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        extension_of(name).and_then(|ext| Self::from_extension(&ext[1..]))
    }

    /// Parse a MIME type hint (parameters such as `; charset=utf-8` are ignored).
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        [
            Self::Csv,
            Self::Xls,
            Self::Xlsx,
            Self::Xlsm,
            Self::Xlsb,
            Self::Ods,
        ]
        .into_iter()
        .find(|f| f.mime_type() == essence)
    }

    /// Canonical MIME type for the format.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Xls => "application/vnd.ms-excel",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Xlsm => "application/vnd.ms-excel.sheet.macroenabled.12",
            Self::Xlsb => "application/vnd.ms-excel.sheet.binary.macroenabled.12",
            Self::Ods => "application/vnd.oasis.opendocument.spreadsheet",
        }
    }

    /// `true` for formats decoded as workbooks rather than delimited text.
    pub fn is_workbook(self) -> bool {
        !matches!(self, Self::Csv)
    }
}

impl fmt::Display for IntakeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Csv => "csv",
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
            Self::Xlsm => "xlsm",
            Self::Xlsb => "xlsb",
            Self::Ods => "ods",
        };
        f.write_str(s)
    }
}

/// Decode the first sheet of `bytes` into row records.
///
/// This is a pure function of its input; it never touches the filesystem or the network.
///
/// # Examples
///
/// ```
/// use sheet_intake::intake::{decode_rows, IntakeFormat};
/// use sheet_intake::types::CellValue;
///
/// # fn main() -> Result<(), sheet_intake::IntakeError> {
/// let rows = decode_rows(IntakeFormat::Csv, b"a,b\n1,2\n3,4")?;
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[0].get("a"), Some(&CellValue::from("1")));
/// # Ok(())
/// # }
/// ```
pub fn decode_rows(format: IntakeFormat, bytes: &[u8]) -> IntakeResult<Vec<RowRecord>> {
    match format {
        IntakeFormat::Csv => csv::decode_csv(bytes),
        _ => decode_workbook_dispatch(bytes),
    }
}

/// Like [`decode_rows`], inferring the format from the file name.
pub fn decode_file_bytes(name: &str, bytes: &[u8]) -> IntakeResult<Vec<RowRecord>> {
    let format = IntakeFormat::from_file_name(name).ok_or_else(|| IntakeError::UnsupportedFormat {
        name: name.to_string(),
    })?;
    decode_rows(format, bytes)
}

fn decode_workbook_dispatch(bytes: &[u8]) -> IntakeResult<Vec<RowRecord>> {
    // Avoid unused warnings when the feature is off.
    let _ = bytes;

    #[cfg(feature = "excel")]
    {
        super::excel::decode_workbook(bytes)
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(IntakeError::Workbook {
            message: "workbook decoding not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}
