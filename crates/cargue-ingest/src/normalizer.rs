//! Strategy selection and the normalization entry point.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

use cargue_model::{IngestionMode, NormalizationResult};
use cargue_output::{ArtifactEncoding, write_canonical_artifact};
use tracing::{info, info_span};

use crate::error::{Result, TransformError};
use crate::sniff::normalize_plain_text;
use crate::spreadsheet::{parse_sheet, read_first_sheet};

/// Workbook extensions always read as spreadsheets.
pub const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = b"\xD0\xCF\x11\xE0";

/// Output settings supplied by configuration.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Value written in position 7 of every canonical line.
    pub periodicidad: String,
    pub encoding: ArtifactEncoding,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            periodicidad: "1".to_string(),
            encoding: ArtifactEncoding::default(),
        }
    }
}

/// Chooses the ingestion strategy from the extension, then the leading bytes.
pub fn detect_mode(path: &Path) -> Result<IngestionMode> {
    let by_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SPREADSHEET_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        });
    if by_extension {
        return Ok(IngestionMode::Spreadsheet);
    }

    let mut file = File::open(path).map_err(|source| TransformError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut magic = [0u8; 4];
    let read = file
        .read(&mut magic)
        .map_err(|source| TransformError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
    let magic = &magic[..read];
    if magic == ZIP_MAGIC || magic == OLE_MAGIC {
        Ok(IngestionMode::Spreadsheet)
    } else {
        Ok(IngestionMode::DelimiterSniff)
    }
}

/// Normalizes a raw report into canonical artifacts under `output_dir`.
///
/// Spreadsheets yield `cargue linix produccion.csv` plus the parsed records; plain text yields
/// `<stem>_normalized.csv` and no records.
pub fn normalize_report(
    input: &Path,
    output_dir: &Path,
    options: &NormalizeOptions,
) -> Result<NormalizationResult> {
    if !input.is_file() {
        return Err(TransformError::FileNotFound {
            path: input.to_path_buf(),
        });
    }
    let mode = detect_mode(input)?;
    let span = info_span!("normalize", mode = %mode, source = %input.display());
    let _guard = span.enter();
    let start = Instant::now();

    let result = match mode {
        IngestionMode::Spreadsheet => {
            let sheet = read_first_sheet(input)?;
            let records = parse_sheet(&sheet, input)?;
            let artifact = write_canonical_artifact(
                output_dir,
                &records,
                &options.periodicidad,
                options.encoding,
            )?;
            NormalizationResult::new(artifact, records, mode)
        }
        IngestionMode::DelimiterSniff => normalize_plain_text(input, output_dir, options.encoding)?,
    };

    info!(
        artifact = %result.artifact().display(),
        records = result.records().len(),
        duration_ms = start.elapsed().as_millis(),
        "normalization complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn extension_selects_spreadsheet() {
        assert_eq!(
            detect_mode(Path::new("does-not-matter/reporte.XLSX")).unwrap(),
            IngestionMode::Spreadsheet
        );
    }

    #[test]
    fn zip_signature_selects_spreadsheet() {
        let mut file = NamedTempFile::with_suffix(".bin").unwrap();
        file.write_all(b"PK\x03\x04rest").unwrap();
        assert_eq!(detect_mode(file.path()).unwrap(), IngestionMode::Spreadsheet);
    }

    #[test]
    fn text_selects_sniffing() {
        let mut file = NamedTempFile::with_suffix(".txt").unwrap();
        file.write_all(b"a|b\n").unwrap();
        assert_eq!(
            detect_mode(file.path()).unwrap(),
            IngestionMode::DelimiterSniff
        );
    }

    #[test]
    fn missing_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = normalize_report(
            &dir.path().join("nope.xlsx"),
            dir.path(),
            &NormalizeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::FileNotFound { .. }));
    }
}
