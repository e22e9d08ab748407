#![cfg(feature = "excel")]

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::error::{IntakeError, IntakeResult};
use crate::types::{CellValue, RowRecord};

use super::rows::records_from_grid;

/// Decode a workbook (`.xlsx`, `.xls`, `.ods`, etc.) into row records.
///
/// Behavior:
/// - The container format is sniffed from the bytes, not the file name
/// - Uses the first sheet in workbook order; other sheets are ignored
/// - Detects the first non-empty row as the header row
/// - Converts remaining rows into [`CellValue`]s keyed by header
pub fn decode_workbook(bytes: &[u8]) -> IntakeResult<Vec<RowRecord>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IntakeError::Workbook {
            message: "workbook has no sheets".to_string(),
        })?;

    let range = workbook.worksheet_range(&first)?;
    decode_sheet_range(&first, &range)
}

fn decode_sheet_range(sheet: &str, range: &calamine::Range<Data>) -> IntakeResult<Vec<RowRecord>> {
    let grid = range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect::<Vec<_>>());
    records_from_grid(grid).map_err(|e| wrap_err_with_sheet(sheet, e))
}

fn wrap_err_with_sheet(sheet: &str, err: IntakeError) -> IntakeError {
    match err {
        IntakeError::Workbook { message } => IntakeError::Workbook {
            message: format!("sheet '{sheet}': {message}"),
        },
        other => other,
    }
}

fn convert_cell(c: &Data) -> CellValue {
    match c {
        Data::Empty => CellValue::Empty,
        Data::String(s) => {
            if s.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(s.clone())
            }
        }
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        // Date cells keep their serial value.
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_a_decode_fault() {
        let err = decode_workbook(b"definitely not a workbook").unwrap_err();
        assert!(matches!(err, IntakeError::Excel(_)));
    }

    #[test]
    fn cells_convert_to_tagged_values() {
        assert_eq!(convert_cell(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(convert_cell(&Data::Float(2.5)), CellValue::Number(2.5));
        assert_eq!(convert_cell(&Data::Bool(false)), CellValue::Bool(false));
        assert_eq!(convert_cell(&Data::String("".into())), CellValue::Empty);
        assert_eq!(convert_cell(&Data::String("  ".into())), CellValue::from("  "));
        assert_eq!(convert_cell(&Data::String("Ada".into())), CellValue::from("Ada"));
        assert_eq!(convert_cell(&Data::Empty), CellValue::Empty);
    }
}
