//! Delimiter-sniffing ingestion for plain-text reports.

use std::fs;
use std::path::{Path, PathBuf};

use cargue_model::{IngestionMode, NormalizationResult};
use cargue_output::{ArtifactEncoding, SPACED_PIPE, write_delimited};
use encoding_rs::{UTF_8, WINDOWS_1252};
use tracing::{debug, info, warn};

use crate::error::{Result, TransformError};

/// Number of non-blank lines inspected when sniffing.
pub const SNIFF_SAMPLE_LINES: usize = 20;

/// Candidate delimiters in priority order.
pub const DELIMITER_CANDIDATES: [&str; 4] = [" | ", "|", "\t", ","];

/// Decodes report bytes as UTF-8 (BOM stripped), falling back to windows-1252.
pub fn decode_report_text(bytes: &[u8]) -> (String, &'static str) {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => (text.into_owned(), UTF_8.name()),
        None => {
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            (text.into_owned(), WINDOWS_1252.name())
        }
    }
}

/// Picks the first candidate present in any sampled non-blank line.
pub fn sniff_delimiter(text: &str) -> Option<&'static str> {
    let sample: Vec<&str> = non_blank_lines(text).take(SNIFF_SAMPLE_LINES).collect();
    DELIMITER_CANDIDATES
        .into_iter()
        .find(|candidate| sample.iter().any(|line| line.contains(candidate)))
}

/// Splits every non-blank line on `delimiter` and trims each field.
pub fn split_lines<'a>(text: &'a str, delimiter: &'a str) -> Vec<Vec<&'a str>> {
    non_blank_lines(text)
        .map(|line| line.split(delimiter).map(str::trim).collect())
        .collect()
}

fn non_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().filter(|line| !line.trim().is_empty())
}

/// Rewrites a plain-text report as `<stem>_normalized.csv` with `" | "` separators.
///
/// When no delimiter is recognized the input is copied to `original_<name>` in `output_dir`
/// and the error names that copy.
pub fn normalize_plain_text(
    input: &Path,
    output_dir: &Path,
    encoding: ArtifactEncoding,
) -> Result<NormalizationResult> {
    let bytes = fs::read(input).map_err(|source| TransformError::FileRead {
        path: input.to_path_buf(),
        source,
    })?;
    let (text, decoded_as) = decode_report_text(&bytes);
    debug!(path = %input.display(), encoding = decoded_as, "plain-text report decoded");

    let Some(delimiter) = sniff_delimiter(&text) else {
        let preserved = preserve_original(input, output_dir)?;
        warn!(preserved = %preserved.display(), "no supported delimiter in report");
        return Err(TransformError::UnrecognizedDelimiter { preserved });
    };

    let rows = split_lines(&text, delimiter);
    let artifact = output_dir.join(format!("{}_normalized.csv", file_stem(input)));
    let lines = write_delimited(&artifact, &rows, SPACED_PIPE, encoding)?;
    info!(
        artifact = %artifact.display(),
        delimiter = ?delimiter,
        lines,
        "plain-text report normalized"
    );
    Ok(NormalizationResult::new(
        artifact,
        Vec::new(),
        IngestionMode::DelimiterSniff,
    ))
}

fn preserve_original(input: &Path, output_dir: &Path) -> Result<PathBuf> {
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    let target = output_dir.join(format!("original_{name}"));
    fs::create_dir_all(output_dir)
        .and_then(|()| fs::copy(input, &target))
        .map_err(|source| TransformError::Preserve {
            path: input.to_path_buf(),
            target: target.clone(),
            source,
        })?;
    Ok(target)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string())
}
