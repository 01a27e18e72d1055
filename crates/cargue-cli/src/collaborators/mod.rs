//! External systems the workflow drives, behind narrow traits.
//!
//! The portal download, the diagnostic capture and the legacy desktop upload are all
//! infrastructure the pipeline does not own. Each is a trait here so the orchestrator can run
//! against stand-ins in tests and against the shipped adapters in production.

mod capture;
mod command;
mod staged;

use std::io;
use std::path::PathBuf;

use cargue_model::{EnrichmentOutputs, RunContext};
use thiserror::Error;

pub use capture::RunDirectoryCapture;
pub use command::CommandUploader;
pub use staged::StagedReportSource;

/// Produces the raw portal report for a run.
pub trait ReportSource {
    /// Places the report under the run's downloads directory and returns its path.
    fn download(&mut self, run: &RunContext) -> Result<PathBuf, DownloadError>;

    /// Releases the session. Called once normalization succeeds and on every failure path;
    /// must tolerate repeated calls.
    fn close(&mut self);
}

/// Captures diagnostic state when a run fails.
pub trait DiagnosticCapture {
    fn capture(&self, run: &RunContext, tag: &str) -> anyhow::Result<()>;
}

/// Hands the artifacts to the legacy load step.
pub trait LegacyUploader {
    fn upload(&self, request: &LegacyUploadRequest) -> Result<(), LegacyUploadError>;
}

/// Artifacts handed to the legacy upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyUploadRequest {
    pub canonical: PathBuf,
    pub documents: Option<PathBuf>,
    pub savings: Option<PathBuf>,
}

impl LegacyUploadRequest {
    pub fn new(canonical: PathBuf, enrichment: Option<&EnrichmentOutputs>) -> Self {
        Self {
            canonical,
            documents: enrichment.map(|outputs| outputs.documents_file.clone()),
            savings: enrichment.map(|outputs| outputs.savings_file.clone()),
        }
    }
}

/// Errors while obtaining the report.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The export did not appear in time.
    #[error("report not available at {path} after {timeout_ms} ms")]
    Timeout { path: PathBuf, timeout_ms: u64 },

    /// The export could not be copied into the run.
    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The report source failed for another reason.
    #[error("{message}")]
    Failed { message: String },
}

impl DownloadError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Errors from the legacy upload step.
#[derive(Debug, Error)]
pub enum LegacyUploadError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed while waiting for {program}: {source}")]
    Wait {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{program} did not finish within {timeout_ms} ms")]
    Timeout { program: PathBuf, timeout_ms: u64 },

    #[error("{program} exited with {}", describe_code(.code))]
    Exited { program: PathBuf, code: Option<i32> },

    /// The upload was rejected for another reason.
    #[error("{message}")]
    Rejected { message: String },
}

fn describe_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_string(), |code| format!("status {code}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_without_enrichment_has_no_extra_paths() {
        let request = LegacyUploadRequest::new(PathBuf::from("c.csv"), None);
        assert_eq!(request.documents, None);
        assert_eq!(request.savings, None);
    }

    #[test]
    fn request_carries_enrichment_paths() {
        let outputs = EnrichmentOutputs {
            documents_file: PathBuf::from("d.csv"),
            savings_file: PathBuf::from("a.csv"),
            document_rows: 0,
            savings_rows: 0,
        };
        let request = LegacyUploadRequest::new(PathBuf::from("c.csv"), Some(&outputs));
        assert_eq!(request.documents, Some(PathBuf::from("d.csv")));
        assert_eq!(request.savings, Some(PathBuf::from("a.csv")));
    }

    #[test]
    fn exit_error_display() {
        let err = LegacyUploadError::Exited {
            program: PathBuf::from("linix-upload"),
            code: Some(3),
        };
        assert_eq!(err.to_string(), "linix-upload exited with status 3");
    }
}
