use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RecordError, Result};

/// Required report columns, in canonical output order.
pub const REQUIRED_COLUMNS: [&str; 4] = ["IDENTIFICACION", "MONTO", "PLAZO", "FECHASOLICITUD"];

/// The four fields of a canonical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordField {
    IdentityNumber,
    Amount,
    TermMonths,
    RequestDate,
}

impl RecordField {
    pub const ALL: [RecordField; 4] = [
        RecordField::IdentityNumber,
        RecordField::Amount,
        RecordField::TermMonths,
        RecordField::RequestDate,
    ];

    /// Report column header that feeds this field.
    pub fn column_name(self) -> &'static str {
        match self {
            RecordField::IdentityNumber => REQUIRED_COLUMNS[0],
            RecordField::Amount => REQUIRED_COLUMNS[1],
            RecordField::TermMonths => REQUIRED_COLUMNS[2],
            RecordField::RequestDate => REQUIRED_COLUMNS[3],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RecordField::IdentityNumber => "identificacion",
            RecordField::Amount => "monto",
            RecordField::TermMonths => "plazo",
            RecordField::RequestDate => "fecha solicitud",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One validated, normalized report row.
///
/// Fields are private so that every instance has gone through [`CanonicalRecord::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalRecord {
    identity_number: String,
    amount: String,
    term_months: String,
    request_date: String,
}

impl CanonicalRecord {
    /// Validates and builds a record.
    ///
    /// Numeric fields must be non-empty. They normally hold digits only, but text that had no
    /// digits at all is carried through unchanged; see [`Self::has_non_digit_fields`].
    /// The request date must be exactly eight ASCII digits (`DDMMYYYY`).
    pub fn new(
        identity_number: impl Into<String>,
        amount: impl Into<String>,
        term_months: impl Into<String>,
        request_date: impl Into<String>,
    ) -> Result<Self> {
        let identity_number = non_empty(identity_number.into(), RecordField::IdentityNumber)?;
        let amount = non_empty(amount.into(), RecordField::Amount)?;
        let term_months = non_empty(term_months.into(), RecordField::TermMonths)?;
        let request_date = request_date.into();
        if request_date.is_empty() {
            return Err(RecordError::EmptyField {
                field: RecordField::RequestDate,
            });
        }
        if request_date.len() != 8 || !is_digits(&request_date) {
            return Err(RecordError::InvalidDate {
                value: request_date,
            });
        }
        Ok(Self {
            identity_number,
            amount,
            term_months,
            request_date,
        })
    }

    pub fn identity_number(&self) -> &str {
        &self.identity_number
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn term_months(&self) -> &str {
        &self.term_months
    }

    /// Request date as `DDMMYYYY`.
    pub fn request_date(&self) -> &str {
        &self.request_date
    }

    pub fn field(&self, field: RecordField) -> &str {
        match field {
            RecordField::IdentityNumber => &self.identity_number,
            RecordField::Amount => &self.amount,
            RecordField::TermMonths => &self.term_months,
            RecordField::RequestDate => &self.request_date,
        }
    }

    /// Numeric fields that kept non-digit text.
    pub fn non_digit_fields(&self) -> Vec<RecordField> {
        [
            RecordField::IdentityNumber,
            RecordField::Amount,
            RecordField::TermMonths,
        ]
        .into_iter()
        .filter(|field| !is_digits(self.field(*field)))
        .collect()
    }

    pub fn has_non_digit_fields(&self) -> bool {
        !self.non_digit_fields().is_empty()
    }
}

fn non_empty(value: String, field: RecordField) -> Result<String> {
    if value.trim().is_empty() {
        return Err(RecordError::EmptyField { field });
    }
    Ok(value)
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_valid_record() {
        let record = CanonicalRecord::new("12345678", "500000", "12", "15032024").unwrap();
        assert_eq!(record.identity_number(), "12345678");
        assert_eq!(record.request_date(), "15032024");
        assert!(!record.has_non_digit_fields());
    }

    #[test]
    fn rejects_empty_numeric_field() {
        let err = CanonicalRecord::new("12345678", "  ", "12", "15032024").unwrap_err();
        assert_eq!(
            err,
            RecordError::EmptyField {
                field: RecordField::Amount
            }
        );
    }

    #[test]
    fn rejects_short_date() {
        let err = CanonicalRecord::new("1", "2", "3", "1532024").unwrap_err();
        assert!(matches!(err, RecordError::InvalidDate { .. }));
    }

    #[test]
    fn flags_fallback_text() {
        let record = CanonicalRecord::new("N/A", "500000", "doce", "15032024").unwrap();
        assert_eq!(
            record.non_digit_fields(),
            vec![RecordField::IdentityNumber, RecordField::TermMonths]
        );
    }

    #[test]
    fn field_column_names_follow_required_order() {
        let names: Vec<_> = RecordField::ALL.iter().map(|f| f.column_name()).collect();
        assert_eq!(names, REQUIRED_COLUMNS);
    }
}
