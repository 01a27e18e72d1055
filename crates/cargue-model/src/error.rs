use std::path::PathBuf;

use thiserror::Error;

use crate::record::RecordField;

/// Reasons a canonical record cannot be constructed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("field '{field}' is empty")]
    EmptyField { field: RecordField },

    #[error("request date '{value}' is not an 8-digit DDMMYYYY value")]
    InvalidDate { value: String },
}

/// Failures while laying out the per-run directory tree.
#[derive(Debug, Error)]
pub enum RunContextError {
    #[error("failed to create run directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, RecordError>;
