//! Report ingestion for the Linix load pipeline.
//!
//! Turns the portal export into canonical records and the delimited artifact Linix loads.
//! One of two strategies is chosen per input:
//!
//! - **Spreadsheet**: locate the header row among the first 20 rows, normalize identity,
//!   amount, term and request date for every non-blank row, write
//!   `cargue linix produccion.csv`.
//! - **Delimiter sniffing**: for plain text, detect the separator and re-join every line with
//!   `" | "` into `<stem>_normalized.csv`.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use cargue_ingest::{NormalizeOptions, normalize_report};
//!
//! let result = normalize_report(
//!     Path::new("runs/20240315_080000/downloads/reporte.xlsx"),
//!     Path::new("runs/20240315_080000/outputs"),
//!     &NormalizeOptions::default(),
//! )?;
//! println!("{} records -> {}", result.records().len(), result.artifact().display());
//! ```

mod cell;
mod error;
mod fields;
mod normalizer;
mod sniff;
mod spreadsheet;

// === Error Types ===
pub use error::{Result, TransformError};

// === Cells and Fields ===
pub use cell::CellValue;
pub use fields::{
    DATE_PATTERNS, FieldError, excel_serial_to_datetime, format_date, normalize_digits,
    normalize_header, parse_text_date, strip_non_digits,
};

// === Strategies ===
pub use normalizer::{NormalizeOptions, SPREADSHEET_EXTENSIONS, detect_mode, normalize_report};
pub use sniff::{
    DELIMITER_CANDIDATES, SNIFF_SAMPLE_LINES, decode_report_text, normalize_plain_text,
    sniff_delimiter, split_lines,
};
pub use spreadsheet::{
    HeaderRow, MAX_HEADER_SCAN_ROWS, SheetRows, find_header_row, parse_sheet, read_first_sheet,
};
