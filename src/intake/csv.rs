//! CSV decoding implementation.

use crate::error::IntakeResult;
use crate::types::{CellValue, RowRecord};

use super::rows::records_from_grid;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode comma-separated bytes into row records.
///
/// Rules:
///
/// - The first non-empty row is the header.
/// - Cells are kept as text (no type inference); zero-length cells are [`CellValue::Empty`].
/// - Ragged rows are accepted; cells past the header get generated `__EMPTY` columns. A leading UTF-8 BOM is ignored; invalid UTF-8 is replaced
///   lossily rather than failing the file.
///
/// ```
/// use sheet_intake::intake::csv::decode_csv;
/// use sheet_intake::types::CellValue;
///
/// let rows = decode_csv(b"a,b\n1,2\n3,4").unwrap();
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[1].get("b"), Some(&CellValue::from("4")));
/// ```
pub fn decode_csv(bytes: &[u8]) -> IntakeResult<Vec<RowRecord>> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    decode_csv_from_reader(&mut rdr)
}

/// Decode CSV data from an existing CSV reader.
///
/// The reader should be built with `has_headers(false)`: header detection happens here.
pub fn decode_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
) -> IntakeResult<Vec<RowRecord>> {
    let mut grid: Vec<Vec<CellValue>> = Vec::new();
    for result in rdr.byte_records() {
        let record = result?;
        grid.push(record.iter().map(cell_from_field).collect());
    }
    records_from_grid(grid)
}

fn cell_from_field(raw: &[u8]) -> CellValue {
    let text = String::from_utf8_lossy(raw);
    if text.is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(text.into_owned())
    }
}
