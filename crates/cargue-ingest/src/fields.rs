//! Field-level normalization rules.

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};

use crate::cell::CellValue;

/// Textual date patterns, tried in order; the first that parses wins.
pub const DATE_PATTERNS: [&str; 4] = ["%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%Y-%m-%d"];

/// Output layout for request dates.
const OUTPUT_DATE_FORMAT: &str = "%d%m%Y";

/// Why a single cell could not be normalized.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldError {
    Empty,
    NonFinite,
    UnsupportedDate(String),
}

/// Normalizes a header cell: trim, uppercase, drop spaces.
pub fn normalize_header(cell: &CellValue) -> String {
    cell.to_text().trim().to_uppercase().replace(' ', "")
}

/// Normalizes an identity, amount or term cell.
///
/// Numbers render as integers (half-to-even rounding). Text keeps only its ASCII digits; text
/// without any digit is kept trimmed as-is.
pub fn normalize_digits(cell: &CellValue) -> Result<String, FieldError> {
    match cell {
        CellValue::Empty => Err(FieldError::Empty),
        CellValue::Number(value) => integer_string(*value),
        CellValue::Bool(value) => Ok(if *value { "1" } else { "0" }.to_string()),
        CellValue::Text(_) | CellValue::DateTime(_) => {
            let text = cell.to_text();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(FieldError::Empty);
            }
            Ok(strip_non_digits(trimmed))
        }
    }
}

/// Keeps ASCII digits, falling back to the input when none are present.
pub fn strip_non_digits(text: &str) -> String {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        text.to_string()
    } else {
        digits
    }
}

fn integer_string(value: f64) -> Result<String, FieldError> {
    if !value.is_finite() {
        return Err(FieldError::NonFinite);
    }
    let rounded = value.round_ties_even();
    // Avoid rendering negative zero as "-0".
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    Ok(format!("{rounded:.0}"))
}

/// Formats a request date cell as `DDMMYYYY`.
///
/// Accepts, in order: native date/time values, spreadsheet serial numbers, then text matching
/// one of [`DATE_PATTERNS`].
pub fn format_date(cell: &CellValue) -> Result<String, FieldError> {
    match cell {
        CellValue::Empty => return Err(FieldError::Empty),
        CellValue::DateTime(value) => return Ok(value.format(OUTPUT_DATE_FORMAT).to_string()),
        CellValue::Number(serial) => {
            if let Some(value) = excel_serial_to_datetime(*serial) {
                return Ok(value.format(OUTPUT_DATE_FORMAT).to_string());
            }
        }
        CellValue::Text(_) | CellValue::Bool(_) => {}
    }

    let text = cell.to_text();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Empty);
    }
    parse_text_date(trimmed)
        .map(|date| date.format(OUTPUT_DATE_FORMAT).to_string())
        .ok_or_else(|| FieldError::UnsupportedDate(trimmed.to_string()))
}

/// Parses text against [`DATE_PATTERNS`].
///
/// Day and month take one or two digits and the year exactly four, so `15/03/24` matches no
/// pattern.
pub fn parse_text_date(text: &str) -> Option<NaiveDate> {
    DATE_PATTERNS
        .iter()
        .filter(|pattern| has_date_shape(text, pattern))
        .find_map(|pattern| NaiveDate::parse_from_str(text, pattern).ok())
        .filter(|date| (1..=9999).contains(&date.year()))
}

fn has_date_shape(text: &str, pattern: &str) -> bool {
    let separator = if pattern.contains('/') { '/' } else { '-' };
    let tokens: Vec<&str> = pattern.split(separator).collect();
    let parts: Vec<&str> = text.split(separator).collect();
    parts.len() == tokens.len()
        && tokens.iter().zip(&parts).all(|(token, part)| {
            let width = if *token == "%Y" { 4..=4 } else { 1..=2 };
            width.contains(&part.len()) && part.bytes().all(|byte| byte.is_ascii_digit())
        })
}

/// Converts a 1900-system spreadsheet serial to a timestamp.
///
/// Serials below 60 are shifted by a day to undo the fictitious 1900-02-29. Values below 1
/// (pure times), negative values and results outside years 1..=9999 are rejected.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let mut days = serial.trunc();
    if days < 60.0 {
        days += 1.0;
    }
    if days > 3_000_000.0 {
        return None;
    }
    let millis = (serial.fract() * 86_400_000.0).round() as i64;
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let value = epoch
        .checked_add_signed(TimeDelta::try_days(days as i64)?)?
        .checked_add_signed(TimeDelta::try_milliseconds(millis)?)?;
    (1..=9999).contains(&value.year()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> CellValue {
        CellValue::from(value)
    }

    #[test]
    fn header_normalization() {
        assert_eq!(normalize_header(&text("  Fecha Solicitud ")), "FECHASOLICITUD");
        assert_eq!(normalize_header(&text("monto")), "MONTO");
        assert_eq!(normalize_header(&CellValue::Empty), "");
    }

    #[test]
    fn digits_from_numbers() {
        assert_eq!(normalize_digits(&CellValue::Number(500000.0)).unwrap(), "500000");
        assert_eq!(normalize_digits(&CellValue::Number(12.4)).unwrap(), "12");
        assert_eq!(normalize_digits(&CellValue::Number(2.5)).unwrap(), "2");
        assert_eq!(normalize_digits(&CellValue::Number(3.5)).unwrap(), "4");
        assert_eq!(normalize_digits(&CellValue::Number(-0.2)).unwrap(), "0");
    }

    #[test]
    fn digits_from_text() {
        assert_eq!(normalize_digits(&text("1.234.567")).unwrap(), "1234567");
        assert_eq!(normalize_digits(&text(" CC 12-345 ")).unwrap(), "12345");
        assert_eq!(normalize_digits(&text("$ 500,000")).unwrap(), "500000");
    }

    #[test]
    fn digits_fall_back_to_trimmed_text() {
        assert_eq!(normalize_digits(&text("  N/A ")).unwrap(), "N/A");
    }

    #[test]
    fn digits_reject_empty() {
        assert_eq!(normalize_digits(&CellValue::Empty), Err(FieldError::Empty));
        assert_eq!(normalize_digits(&text("   ")), Err(FieldError::Empty));
        assert_eq!(
            normalize_digits(&CellValue::Number(f64::NAN)),
            Err(FieldError::NonFinite)
        );
    }

    #[test]
    fn dates_from_every_text_pattern() {
        assert_eq!(format_date(&text("15/03/2024")).unwrap(), "15032024");
        // Day 31 cannot be a month, so DD/MM fails and MM/DD wins.
        assert_eq!(format_date(&text("03/31/2024")).unwrap(), "31032024");
        assert_eq!(format_date(&text("15-03-2024")).unwrap(), "15032024");
        assert_eq!(format_date(&text("2024-03-15")).unwrap(), "15032024");
    }

    #[test]
    fn two_digit_years_are_rejected() {
        assert_eq!(
            format_date(&text("15/03/24")),
            Err(FieldError::UnsupportedDate("15/03/24".to_string()))
        );
        assert!(matches!(
            format_date(&text("15-03-24")),
            Err(FieldError::UnsupportedDate(_))
        ));
        assert!(matches!(
            format_date(&text("24-03-15")),
            Err(FieldError::UnsupportedDate(_))
        ));
        assert!(matches!(
            format_date(&text("15/03/02024")),
            Err(FieldError::UnsupportedDate(_))
        ));
    }

    #[test]
    fn single_digit_day_and_month_are_accepted() {
        assert_eq!(format_date(&text("5/3/2024")).unwrap(), "05032024");
        assert_eq!(format_date(&text("2024-3-5")).unwrap(), "05032024");
    }

    #[test]
    fn ambiguous_text_prefers_day_first() {
        assert_eq!(format_date(&text("04/05/2024")).unwrap(), "04052024");
    }

    #[test]
    fn dates_from_native_values() {
        let value = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(13, 45, 0)
            .unwrap();
        assert_eq!(format_date(&CellValue::DateTime(value)).unwrap(), "15032024");
    }

    #[test]
    fn dates_from_serials() {
        assert_eq!(format_date(&CellValue::Number(45366.0)).unwrap(), "15032024");
        assert_eq!(format_date(&CellValue::Number(45366.75)).unwrap(), "15032024");
        assert_eq!(format_date(&CellValue::Number(61.0)).unwrap(), "01031900");
        assert_eq!(format_date(&CellValue::Number(59.0)).unwrap(), "28021900");
        assert_eq!(format_date(&CellValue::Number(1.0)).unwrap(), "01011900");
    }

    #[test]
    fn unparseable_dates_fail() {
        assert_eq!(
            format_date(&text("mañana")),
            Err(FieldError::UnsupportedDate("mañana".to_string()))
        );
        assert!(matches!(
            format_date(&CellValue::Number(15_032_024.0)),
            Err(FieldError::UnsupportedDate(_))
        ));
        assert_eq!(format_date(&text("  ")), Err(FieldError::Empty));
    }
}
