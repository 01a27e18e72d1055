use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::record::CanonicalRecord;

/// File name of the canonical Linix load artifact.
pub const CANONICAL_ARTIFACT_NAME: &str = "cargue linix produccion.csv";

/// File name of the supporting-documents enrichment artifact.
pub const DOCUMENTS_ARTIFACT_NAME: &str = "documentos_soporte.csv";

/// File name of the savings-accounts enrichment artifact.
pub const SAVINGS_ARTIFACT_NAME: &str = "ahorros.csv";

/// Ingestion strategy committed to for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestionMode {
    /// Structured workbook with a detectable header row.
    Spreadsheet,
    /// Plain text whose field delimiter is sniffed from the first lines.
    DelimiterSniff,
}

impl fmt::Display for IngestionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestionMode::Spreadsheet => f.write_str("spreadsheet"),
            IngestionMode::DelimiterSniff => f.write_str("delimiter-sniff"),
        }
    }
}

/// Output of the normalization stage. Immutable once built.
#[derive(Debug, Clone)]
pub struct NormalizationResult {
    artifact: PathBuf,
    records: Vec<CanonicalRecord>,
    mode: IngestionMode,
}

impl NormalizationResult {
    pub fn new(artifact: PathBuf, records: Vec<CanonicalRecord>, mode: IngestionMode) -> Self {
        Self {
            artifact,
            records,
            mode,
        }
    }

    /// Path of the delimited artifact produced by normalization.
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Records in input order. Empty for delimiter-sniffed inputs.
    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn mode(&self) -> IngestionMode {
        self.mode
    }
}

/// The pair of enrichment artifacts; always produced together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichmentOutputs {
    pub documents_file: PathBuf,
    pub savings_file: PathBuf,
    pub document_rows: usize,
    pub savings_rows: usize,
}
