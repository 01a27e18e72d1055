//! Layout of the canonical Linix load file.

use std::path::{Path, PathBuf};

use cargue_model::{CANONICAL_ARTIFACT_NAME, CanonicalRecord};

use crate::encoding::ArtifactEncoding;
use crate::error::Result;
use crate::writer::{PIPE, write_delimited};

/// The eight pipe-separated fields for one record.
///
/// Positions 5 and 6 are fixed blanks, 7 carries the configured periodicidad and 8 is a trailing
/// empty field.
pub fn canonical_fields<'a>(record: &'a CanonicalRecord, periodicidad: &'a str) -> [&'a str; 8] {
    [
        record.identity_number(),
        record.amount(),
        record.term_months(),
        record.request_date(),
        "",
        "",
        periodicidad,
        "",
    ]
}

/// Writes `cargue linix produccion.csv` into `output_dir` and returns its path.
pub fn write_canonical_artifact(
    output_dir: &Path,
    records: &[CanonicalRecord],
    periodicidad: &str,
    encoding: ArtifactEncoding,
) -> Result<PathBuf> {
    let path = output_dir.join(CANONICAL_ARTIFACT_NAME);
    write_delimited(
        &path,
        records
            .iter()
            .map(|record| canonical_fields(record, periodicidad)),
        PIPE,
        encoding,
    )?;
    Ok(path)
}
