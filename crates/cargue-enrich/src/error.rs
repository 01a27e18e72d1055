//! Error types for stored-procedure enrichment.

use cargue_model::RecordField;
use cargue_output::OutputError;
use thiserror::Error;

/// Failure reported by a database session.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Driver-independent failure, used by non-Oracle sessions.
    #[error("{message}")]
    Driver { message: String },

    /// Error raised by the Oracle client.
    #[cfg(feature = "oracle")]
    #[error(transparent)]
    Oracle(#[from] oracle::Error),
}

impl DatabaseError {
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }
}

/// Errors that abort an enrichment batch.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// The database session could not be opened.
    #[error("failed to connect to the database: {source}")]
    Connect {
        #[source]
        source: DatabaseError,
    },

    /// A stored-procedure call failed.
    #[error("procedure {procedure} failed for identity {identity}: {source}")]
    Procedure {
        procedure: String,
        identity: String,
        #[source]
        source: DatabaseError,
    },

    /// A record field is not a valid integer procedure argument.
    #[error("record {index}: field '{field}' is not an integer: '{value}'")]
    InvalidRecord {
        index: usize,
        field: RecordField,
        value: String,
    },

    /// Writing an enrichment artifact failed.
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Result type for enrichment operations.
pub type Result<T> = std::result::Result<T, EnrichError>;
