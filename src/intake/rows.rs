//! Grid → [`RowRecord`] conversion shared by the CSV and workbook decoders.
//!
//! Header rules:
//!
//! - the first non-empty row is the header row
//! - an empty header cell is named `__EMPTY`, then `__EMPTY_1`, `__EMPTY_2`, ...
//! - a repeated header name gets a `_1`, `_2`, ... suffix
//! - rows whose cells are all empty are skipped
//! - the header is widened to the widest row, extra columns are named like empty header cells
//! - short rows are padded with [`CellValue::Empty`]

use std::collections::HashSet;

use crate::error::{IntakeError, IntakeResult};
use crate::types::{CellValue, RowRecord};

const EMPTY_HEADER: &str = "__EMPTY";

/// Build row records from a grid of cells, using the first non-empty row as the header.
///
/// Returns an error if the grid has no non-empty row at all.
pub(crate) fn records_from_grid<I>(grid: I) -> IntakeResult<Vec<RowRecord>>
where
    I: IntoIterator<Item = Vec<CellValue>>,
{
    let mut rows = grid
        .into_iter()
        .filter(|row| row.iter().any(|c| !c.is_empty()));

    let mut header_cells = rows.next().ok_or_else(|| IntakeError::Workbook {
        message: "sheet has no non-empty rows (no header row found)".to_string(),
    })?;
    let data: Vec<Vec<CellValue>> = rows.collect();

    let width = data.iter().map(Vec::len).max().unwrap_or(0);
    if width > header_cells.len() {
        header_cells.resize(width, CellValue::Empty);
    }
    let headers = unique_headers(header_cells.iter().map(CellValue::to_header_string));

    let records = data
        .into_iter()
        .map(|row| {
            let mut cells = row.into_iter();
            headers
                .iter()
                .map(|h| (h.clone(), cells.next().unwrap_or(CellValue::Empty)))
                .collect::<RowRecord>()
        })
        .collect();

    Ok(records)
}

fn unique_headers(raw: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for name in raw {
        let base = if name.is_empty() {
            EMPTY_HEADER.to_string()
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(cells: &[&str]) -> Vec<CellValue> {
        cells
            .iter()
            .map(|c| {
                if c.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::from(*c)
                }
            })
            .collect()
    }

    #[test]
    fn first_non_empty_row_is_header() {
        let grid = vec![
            text_row(&["", ""]),
            text_row(&["a", "b"]),
            text_row(&["1", "2"]),
        ];
        let rows = records_from_grid(grid).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("a"), Some(&CellValue::from("1")));
        assert_eq!(rows[0].get("b"), Some(&CellValue::from("2")));
    }

    #[test]
    fn duplicate_and_empty_headers_are_renamed() {
        let grid = vec![text_row(&["a", "", "a", "", "a"]), text_row(&["1", "2", "3", "4", "5"])];
        let rows = records_from_grid(grid).unwrap();
        let headers: Vec<&str> = rows[0].headers().collect();
        assert_eq!(headers, vec!["a", "__EMPTY", "a_1", "__EMPTY_1", "a_2"]);
    }

    #[test]
    fn blank_rows_skipped_and_short_rows_padded() {
        let grid = vec![
            text_row(&["a", "b", "c"]),
            text_row(&["1"]),
            text_row(&["", "", ""]),
            text_row(&["2", "3", "4", "extra"]),
        ];
        let rows = records_from_grid(grid).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("b"), Some(&CellValue::Empty));
        assert_eq!(rows[0].get("c"), Some(&CellValue::Empty));
        assert_eq!(rows[0].get("__EMPTY"), Some(&CellValue::Empty));
        assert_eq!(rows[1].get("c"), Some(&CellValue::from("4")));
    }

    #[test]
    fn cells_past_the_header_get_generated_columns() {
        let grid = vec![
            text_row(&["a", ""]),
            text_row(&["1", "2", "3"]),
            text_row(&["4"]),
        ];
        let rows = records_from_grid(grid).unwrap();
        let headers: Vec<&str> = rows[0].headers().collect();
        assert_eq!(headers, vec!["a", "__EMPTY", "__EMPTY_1"]);
        assert_eq!(rows[0].get("__EMPTY_1"), Some(&CellValue::from("3")));
        assert_eq!(rows[1].get("__EMPTY_1"), Some(&CellValue::Empty));
    }

    #[test]
    fn whitespace_only_row_is_kept() {
        let grid = vec![text_row(&["a", "b"]), vec![CellValue::from(" "), CellValue::Empty]];
        let rows = records_from_grid(grid).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("a"), Some(&CellValue::from(" ")));
    }

    #[test]
    fn empty_grid_is_an_error() {
        let err = records_from_grid(Vec::<Vec<CellValue>>::new()).unwrap_err();
        assert!(err.to_string().contains("no header row"));
    }
}
