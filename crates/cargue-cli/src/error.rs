//! Failure taxonomy of a pipeline run and its exit-code mapping.

use cargue_enrich::EnrichError;
use cargue_ingest::TransformError;
use thiserror::Error;

use crate::collaborators::{DownloadError, LegacyUploadError};

/// Exit status of a successful run.
pub const EXIT_OK: i32 = 0;
/// Exit status of a known domain failure.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status of an unexpected failure.
pub const EXIT_UNEXPECTED: i32 = 2;

/// Why a run stopped.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The report could not be obtained.
    #[error("report download failed: {source}")]
    Download {
        #[source]
        source: DownloadError,
    },

    /// The report did not show up within the navigation timeout.
    #[error("navigation timed out: {source}")]
    NavigationTimeout {
        #[source]
        source: DownloadError,
    },

    #[error("normalization failed: {0}")]
    Transform(#[from] TransformError),

    #[error("enrichment failed: {0}")]
    Enrich(#[from] EnrichError),

    #[error("legacy upload failed: {0}")]
    LegacyUpload(#[from] LegacyUploadError),

    /// Anything outside the known stage failures.
    #[error("unexpected error: {0:#}")]
    Unexpected(#[from] anyhow::Error),

    /// A stage panicked.
    #[error("unexpected panic: {message}")]
    Panicked { message: String },
}

impl From<DownloadError> for PipelineError {
    fn from(source: DownloadError) -> Self {
        if source.is_timeout() {
            Self::NavigationTimeout { source }
        } else {
            Self::Download { source }
        }
    }
}

impl PipelineError {
    pub fn is_unexpected(&self) -> bool {
        matches!(self, Self::Unexpected(_) | Self::Panicked { .. })
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_unexpected() {
            EXIT_UNEXPECTED
        } else {
            EXIT_FAILURE
        }
    }

    /// Tag used for the diagnostic capture taken on failure.
    pub fn capture_tag(&self) -> &'static str {
        if self.is_unexpected() {
            "error_unexpected"
        } else {
            "error"
        }
    }
}
