//! Error types for artifact writing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while serializing an artifact to disk.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The configured label is not a known encoding.
    #[error("unknown output encoding '{label}'")]
    UnknownEncoding { label: String },

    /// The encoding exists but cannot be produced by the writer.
    #[error("output encoding '{label}' is not supported for artifacts")]
    UnsupportedEncoding { label: String },

    /// A line holds characters the output encoding cannot represent.
    #[error("line {line} of {path} cannot be encoded as {encoding}")]
    Unmappable {
        path: PathBuf,
        line: usize,
        encoding: &'static str,
    },

    /// Failed to create, write or persist the file.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OutputError::Unmappable {
            path: PathBuf::from("out/ahorros.csv"),
            line: 3,
            encoding: "windows-1252",
        };
        assert_eq!(
            err.to_string(),
            "line 3 of out/ahorros.csv cannot be encoded as windows-1252"
        );
    }
}
