use std::io::Cursor;

use bytes::Bytes;
use calamine::{open_workbook_auto_from_rs, Data, Reader};

use super::{DecodeError, DecodeResult, Row};
use crate::record::Cell;

/// Reads every row of the workbook's first sheet. The format (xlsx, xlsb,
/// xls, ods) is detected from the content.
pub(crate) fn first_sheet_rows(bytes: Bytes) -> DecodeResult<Vec<Row>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(DecodeError::NoSheets)??;

    // the range is rectangular; a row ends at its last non-empty cell
    Ok(range
        .rows()
        .map(|row| {
            let len = row
                .iter()
                .rposition(|data| !matches!(data, Data::Empty))
                .map_or(0, |last| last + 1);
            row[..len].iter().map(cell_from_data).collect()
        })
        .collect())
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Bool(*b),
        Data::Empty => Cell::Empty,
        // dates, durations and error cells show as their rendered text
        other => Cell::Text(other.to_string()),
    }
}
