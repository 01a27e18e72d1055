//! Structured-spreadsheet ingestion.

use std::path::Path;

use calamine::{Reader, open_workbook_auto};
use cargue_model::{CanonicalRecord, REQUIRED_COLUMNS, RecordField};
use tracing::{debug, warn};

use crate::cell::CellValue;
use crate::error::{Result, TransformError};
use crate::fields::{FieldError, format_date, normalize_digits, normalize_header};

/// Only this many physical rows are searched for the header.
pub const MAX_HEADER_SCAN_ROWS: usize = 20;

/// Cells of the first worksheet, starting at its first used row.
#[derive(Debug, Clone, Default)]
pub struct SheetRows {
    /// Zero-based physical index of `rows[0]`.
    pub first_row: usize,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetRows {
    /// Rows starting at physical row 1.
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { first_row: 0, rows }
    }

    /// One-based physical row number for an index into `rows`.
    pub fn row_number(&self, idx: usize) -> usize {
        self.first_row + idx + 1
    }
}

/// Location of the header row and the column of each required field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderRow {
    /// Index into [`SheetRows::rows`].
    pub index: usize,
    /// Column per field, in [`RecordField::ALL`] order.
    pub columns: [usize; 4],
}

impl HeaderRow {
    pub fn column(&self, field: RecordField) -> usize {
        match field {
            RecordField::IdentityNumber => self.columns[0],
            RecordField::Amount => self.columns[1],
            RecordField::TermMonths => self.columns[2],
            RecordField::RequestDate => self.columns[3],
        }
    }
}

/// Reads every row of the first worksheet.
pub fn read_first_sheet(path: &Path) -> Result<SheetRows> {
    let mut workbook = open_workbook_auto(path).map_err(|source| TransformError::Workbook {
        path: path.to_path_buf(),
        source,
    })?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| TransformError::EmptyWorkbook {
            path: path.to_path_buf(),
        })?
        .map_err(|source| TransformError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;

    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    let rows = range
        .rows()
        .map(|row| row.iter().map(CellValue::from).collect())
        .collect();
    Ok(SheetRows { first_row, rows })
}

/// Finds the first row, within the scan window, naming every required column.
///
/// Header cells are compared after trimming, uppercasing and removing spaces. When a name
/// appears twice in the row the right-most column is used.
pub fn find_header_row(sheet: &SheetRows) -> Option<HeaderRow> {
    let window = MAX_HEADER_SCAN_ROWS.saturating_sub(sheet.first_row);
    sheet
        .rows
        .iter()
        .take(window)
        .enumerate()
        .find_map(|(index, row)| {
            let names: Vec<String> = row.iter().map(normalize_header).collect();
            let mut columns = [0usize; 4];
            for (slot, required) in columns.iter_mut().zip(REQUIRED_COLUMNS) {
                *slot = names.iter().rposition(|name| name == required)?;
            }
            Some(HeaderRow { index, columns })
        })
}

/// Builds canonical records from every non-blank row after the header.
///
/// Any malformed row fails the whole sheet; only fully blank rows are skipped.
pub fn parse_sheet(sheet: &SheetRows, source: &Path) -> Result<Vec<CanonicalRecord>> {
    let header = find_header_row(sheet).ok_or_else(|| TransformError::HeaderNotFound {
        path: source.to_path_buf(),
        scanned: sheet.rows.len().min(MAX_HEADER_SCAN_ROWS.saturating_sub(sheet.first_row)),
    })?;
    debug!(
        header_row = sheet.row_number(header.index),
        columns = ?header.columns,
        "header row detected"
    );

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (idx, row) in sheet.rows.iter().enumerate().skip(header.index + 1) {
        if row.iter().all(CellValue::is_blank) {
            skipped += 1;
            continue;
        }
        let row_number = sheet.row_number(idx);
        let record = parse_row(row, &header, row_number)?;
        if record.has_non_digit_fields() {
            warn!(
                row = row_number,
                fields = ?record.non_digit_fields(),
                "numeric field kept non-digit text"
            );
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(TransformError::NoDataRows {
            path: source.to_path_buf(),
        });
    }
    debug!(records = records.len(), blank_rows = skipped, "sheet parsed");
    Ok(records)
}

fn parse_row(row: &[CellValue], header: &HeaderRow, row_number: usize) -> Result<CanonicalRecord> {
    let cell = |field: RecordField| row.get(header.column(field)).unwrap_or(&CellValue::Empty);
    let digits = |field: RecordField| {
        normalize_digits(cell(field)).map_err(|err| field_error(err, field, row_number))
    };

    let identity = digits(RecordField::IdentityNumber)?;
    let amount = digits(RecordField::Amount)?;
    let term = digits(RecordField::TermMonths)?;
    let date = format_date(cell(RecordField::RequestDate))
        .map_err(|err| field_error(err, RecordField::RequestDate, row_number))?;

    CanonicalRecord::new(identity, amount, term, date).map_err(|source| {
        TransformError::InvalidRecord {
            row: row_number,
            source,
        }
    })
}

fn field_error(err: FieldError, field: RecordField, row: usize) -> TransformError {
    match err {
        FieldError::Empty => TransformError::EmptyField { row, field },
        FieldError::NonFinite => TransformError::NonFiniteNumber { row, field },
        FieldError::UnsupportedDate(value) => TransformError::UnsupportedDate { row, value },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(cells: &[&str]) -> Vec<CellValue> {
        cells.iter().map(|cell| CellValue::from(*cell)).collect()
    }

    #[test]
    fn header_columns_resolve_by_name() {
        let sheet = SheetRows::new(vec![text_row(&[
            "plazo",
            "Fecha Solicitud",
            "",
            "IDENTIFICACION",
            "monto",
        ])]);
        let header = find_header_row(&sheet).unwrap();
        assert_eq!(header.index, 0);
        assert_eq!(header.column(RecordField::IdentityNumber), 3);
        assert_eq!(header.column(RecordField::Amount), 4);
        assert_eq!(header.column(RecordField::TermMonths), 0);
        assert_eq!(header.column(RecordField::RequestDate), 1);
    }

    #[test]
    fn duplicate_header_uses_last_column() {
        let sheet = SheetRows::new(vec![text_row(&[
            "MONTO",
            "IDENTIFICACION",
            "PLAZO",
            "FECHASOLICITUD",
            "MONTO",
        ])]);
        assert_eq!(
            find_header_row(&sheet).unwrap().column(RecordField::Amount),
            4
        );
    }

    #[test]
    fn header_window_respects_sheet_offset() {
        let mut rows = vec![text_row(&["titulo"]); 5];
        rows.push(text_row(&["IDENTIFICACION", "MONTO", "PLAZO", "FECHASOLICITUD"]));
        // Used range starts at physical row 16, so the header sits on row 21.
        let sheet = SheetRows {
            first_row: 15,
            rows,
        };
        assert!(find_header_row(&sheet).is_none());
    }

    #[test]
    fn missing_trailing_cell_is_empty_field() {
        let sheet = SheetRows::new(vec![
            text_row(&["IDENTIFICACION", "MONTO", "PLAZO", "FECHASOLICITUD"]),
            text_row(&["123", "456", "12"]),
        ]);
        let err = parse_sheet(&sheet, Path::new("r.xlsx")).unwrap_err();
        assert!(matches!(
            err,
            TransformError::EmptyField {
                row: 2,
                field: RecordField::RequestDate
            }
        ));
    }
}
