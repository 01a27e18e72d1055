//! Format-neutral cell values.

use calamine::Data;
use chrono::{NaiveDate, NaiveDateTime};

/// A single worksheet cell, detached from the workbook reader.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// True for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Plain-text rendering used for header matching and text fallbacks.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) => text.clone(),
            CellValue::Number(value) => value.to_string(),
            CellValue::Bool(true) => "TRUE".to_string(),
            CellValue::Bool(false) => "FALSE".to_string(),
            CellValue::DateTime(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        CellValue::Text(text.to_string())
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(text) => CellValue::Text(text.clone()),
            Data::Int(value) => CellValue::Number(*value as f64),
            Data::Float(value) => CellValue::Number(*value),
            Data::Bool(value) => CellValue::Bool(*value),
            Data::DateTime(value) if value.is_datetime() => value
                .as_datetime()
                .map_or(CellValue::Number(value.as_f64()), CellValue::DateTime),
            Data::DateTime(value) => CellValue::Number(value.as_f64()),
            Data::DateTimeIso(text) => {
                parse_iso(text).map_or_else(|| CellValue::Text(text.clone()), CellValue::DateTime)
            }
            Data::DurationIso(text) => CellValue::Text(text.clone()),
            Data::Error(err) => CellValue::Text(err.to_string()),
        }
    }
}

fn parse_iso(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
