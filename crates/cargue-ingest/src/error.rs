//! Error types for report ingestion.

use std::path::PathBuf;

use cargue_model::{RecordError, RecordField};
use cargue_output::OutputError;
use thiserror::Error;

/// Errors that can occur while turning a raw report into canonical records.
#[derive(Debug, Error)]
pub enum TransformError {
    // === File System Errors ===
    /// Input report not found.
    #[error("report file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read the input report.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Spreadsheet Errors ===
    /// The workbook could not be opened or parsed.
    #[error("failed to open workbook {path}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    /// The workbook has no worksheet to read.
    #[error("workbook has no worksheets: {path}")]
    EmptyWorkbook { path: PathBuf },

    /// None of the scanned rows carries every required column.
    #[error("required columns not found in the first {scanned} rows of {path}")]
    HeaderNotFound { path: PathBuf, scanned: usize },

    /// No non-blank rows follow the header row.
    #[error("no data rows after the header in {path}")]
    NoDataRows { path: PathBuf },

    // === Field Errors ===
    /// A required field is empty or missing.
    #[error("row {row}: field '{field}' is empty")]
    EmptyField { row: usize, field: RecordField },

    /// A numeric cell holds NaN or infinity.
    #[error("row {row}: field '{field}' holds a non-finite number")]
    NonFiniteNumber { row: usize, field: RecordField },

    /// The request date matches none of the supported representations.
    #[error("row {row}: unsupported date format '{value}'")]
    UnsupportedDate { row: usize, value: String },

    /// The normalized values do not form a valid record.
    #[error("row {row}: {source}")]
    InvalidRecord {
        row: usize,
        #[source]
        source: RecordError,
    },

    // === Plain-text Errors ===
    /// No known delimiter in the sampled lines; the input was copied aside.
    #[error("no supported delimiter found; original kept at {preserved}")]
    UnrecognizedDelimiter { preserved: PathBuf },

    /// Copying an unreadable input aside failed.
    #[error("failed to preserve {path} as {target}: {source}")]
    Preserve {
        path: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Output Errors ===
    /// Writing the normalized artifact failed.
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, TransformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransformError::EmptyField {
            row: 7,
            field: RecordField::Amount,
        };
        assert_eq!(err.to_string(), "row 7: field 'monto' is empty");
    }

    #[test]
    fn test_error_from_output() {
        let output_err = OutputError::UnknownEncoding {
            label: "bogus".to_string(),
        };
        let err: TransformError = output_err.into();
        assert!(matches!(err, TransformError::Output(_)));
    }
}
