//! Database seams used by the batch processor.

use crate::error::DatabaseError;

/// One row returned through a procedure's output cursor. `None` is SQL NULL.
pub type ResultRow = Vec<Option<String>>;

/// Base name of the supporting-documents procedure.
pub const DOCUMENTS_PROCEDURE: &str = "SP_DOCUMENTOSOPO";
/// Base name of the savings-accounts procedure.
pub const SAVINGS_PROCEDURE: &str = "SP_CTAHORRO";

/// An open database session.
pub trait ProcedureSession {
    /// Calls `name(identity, amount, <out cursor>)` and fetches every cursor row.
    fn call_procedure(
        &mut self,
        name: &str,
        identity: i64,
        amount: i64,
    ) -> Result<Vec<ResultRow>, DatabaseError>;

    /// Releases the session.
    fn close(self: Box<Self>) -> Result<(), DatabaseError>;
}

/// Opens sessions on demand.
pub trait ProcedureConnector {
    fn connect(&self) -> Result<Box<dyn ProcedureSession>, DatabaseError>;
}

/// Fully qualified names of the two enrichment procedures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureNames {
    pub documents: String,
    pub savings: String,
}

impl ProcedureNames {
    /// Qualifies both procedures with `schema` when one is given.
    pub fn with_schema(schema: Option<&str>) -> Self {
        let qualify = |base: &str| match schema.map(str::trim) {
            Some(schema) if !schema.is_empty() => format!("{schema}.{base}"),
            _ => base.to_string(),
        };
        Self {
            documents: qualify(DOCUMENTS_PROCEDURE),
            savings: qualify(SAVINGS_PROCEDURE),
        }
    }
}

impl Default for ProcedureNames {
    fn default() -> Self {
        Self::with_schema(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_without_schema() {
        let names = ProcedureNames::default();
        assert_eq!(names.documents, "SP_DOCUMENTOSOPO");
        assert_eq!(names.savings, "SP_CTAHORRO");
    }

    #[test]
    fn names_with_schema() {
        let names = ProcedureNames::with_schema(Some("LINIX"));
        assert_eq!(names.documents, "LINIX.SP_DOCUMENTOSOPO");
        assert_eq!(names.savings, "LINIX.SP_CTAHORRO");
        assert_eq!(ProcedureNames::with_schema(Some("  ")), ProcedureNames::default());
    }
}
