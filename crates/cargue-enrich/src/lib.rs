//! Stored-procedure enrichment for the Linix load pipeline.
//!
//! For every canonical record the supporting-documents procedure and then the savings-accounts
//! procedure are called with the record's identity and amount. Rows from each procedure's output
//! cursor are concatenated in call order into `documentos_soporte.csv` and `ahorros.csv`.
//!
//! The database sits behind [`ProcedureConnector`]; the Oracle implementation is compiled with
//! the `oracle` feature.

mod error;
#[cfg(feature = "oracle")]
mod oracle_db;
mod processor;
mod session;

pub use error::{DatabaseError, EnrichError, Result};
#[cfg(feature = "oracle")]
pub use oracle_db::OracleConnector;
pub use processor::BatchEnrichmentProcessor;
pub use session::{
    DOCUMENTS_PROCEDURE, ProcedureConnector, ProcedureNames, ProcedureSession, ResultRow,
    SAVINGS_PROCEDURE,
};
