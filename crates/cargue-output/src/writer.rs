//! Stateless delimited-text writer.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::encoding::ArtifactEncoding;
use crate::error::{OutputError, Result};

/// Pipe separator used by the Linix artifacts.
pub const PIPE: &str = "|";

/// Spaced pipe used when re-joining delimiter-sniffed text.
pub const SPACED_PIPE: &str = " | ";

/// A fully encoded artifact waiting next to its target path.
///
/// Nothing exists at the target until [`StagedArtifact::persist`]; dropping it discards the
/// staged bytes.
#[derive(Debug)]
pub struct StagedArtifact {
    staging: NamedTempFile,
    path: PathBuf,
    lines: usize,
}

impl StagedArtifact {
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Moves the staged file to its target path and returns the line count.
    pub fn persist(self) -> Result<usize> {
        let Self {
            staging,
            path,
            lines,
        } = self;
        match staging.persist(&path) {
            Ok(_) => Ok(lines),
            Err(err) => Err(OutputError::Write {
                path,
                source: err.error,
            }),
        }
    }
}

/// Encodes one `\n`-terminated line per row into a temp file beside `path`.
///
/// Cells are joined with `separator`. Nothing is written at `path` itself.
pub fn stage_delimited<R, C, S>(
    path: &Path,
    rows: R,
    separator: &str,
    encoding: ArtifactEncoding,
) -> Result<StagedArtifact>
where
    R: IntoIterator<Item = C>,
    C: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let write_err = |source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = ensure_parent_dir(path)?;
    let staging = NamedTempFile::new_in(dir).map_err(write_err)?;
    let mut writer = BufWriter::new(staging);

    let mut line = String::new();
    let mut count = 0usize;
    for row in rows {
        line.clear();
        for (idx, cell) in row.into_iter().enumerate() {
            if idx > 0 {
                line.push_str(separator);
            }
            line.push_str(cell.as_ref());
        }
        line.push('\n');
        count += 1;
        let bytes = encoding.encode(&line).ok_or_else(|| OutputError::Unmappable {
            path: path.to_path_buf(),
            line: count,
            encoding: encoding.name(),
        })?;
        writer.write_all(&bytes).map_err(write_err)?;
    }

    let staging = writer
        .into_inner()
        .map_err(|err| write_err(err.into_error()))?;
    Ok(StagedArtifact {
        staging,
        path: path.to_path_buf(),
        lines: count,
    })
}

/// Writes one `\n`-terminated line per row, joining cells with `separator`.
///
/// The file appears at `path` only once every line has been encoded and flushed; on failure any
/// previous file at `path` is left untouched. Returns the number of lines written.
pub fn write_delimited<R, C, S>(
    path: &Path,
    rows: R,
    separator: &str,
    encoding: ArtifactEncoding,
) -> Result<usize>
where
    R: IntoIterator<Item = C>,
    C: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let count = stage_delimited(path, rows, separator, encoding)?.persist()?;
    tracing::debug!(path = %path.display(), lines = count, encoding = encoding.name(), "artifact written");
    Ok(count)
}

/// Stages raw result rows with `|`, rendering `None` cells as empty strings.
pub fn stage_nullable_rows(
    path: &Path,
    rows: &[Vec<Option<String>>],
    encoding: ArtifactEncoding,
) -> Result<StagedArtifact> {
    stage_delimited(
        path,
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.as_deref().unwrap_or(""))),
        PIPE,
        encoding,
    )
}

/// Ensure the parent directory of `path` exists and return it.
fn ensure_parent_dir(path: &Path) -> Result<&Path> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|source| OutputError::Write {
        path: parent.to_path_buf(),
        source,
    })?;
    Ok(parent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_rows_with_separator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let rows = vec![vec!["a", "b"], vec!["c", "", "d"]];

        let written = write_delimited(&path, rows, SPACED_PIPE, ArtifactEncoding::utf8()).unwrap();

        assert_eq!(written, 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "a | b\nc |  | d\n");
    }

    #[test]
    fn renders_null_cells_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.csv");
        let rows = vec![
            vec![Some("1".to_string()), None, Some("x".to_string())],
            vec![None],
        ];

        stage_nullable_rows(&path, &rows, ArtifactEncoding::utf8())
            .unwrap()
            .persist()
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "1||x\n\n");
    }

    #[test]
    fn empty_input_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        let written = stage_nullable_rows(&path, &[], ArtifactEncoding::utf8())
            .unwrap()
            .persist()
            .unwrap();

        assert_eq!(written, 0);
        assert_eq!(fs::read(&path).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn unmappable_line_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cp1252.csv");
        let encoding = ArtifactEncoding::from_label("windows-1252").unwrap();
        let rows = vec![vec!["ok"], vec!["犬"]];

        let err = write_delimited(&path, rows, PIPE, encoding).unwrap_err();

        assert!(matches!(err, OutputError::Unmappable { line: 2, .. }));
        assert!(!path.exists());
    }

    #[test]
    fn staged_artifact_appears_only_on_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("staged.csv");

        let staged = stage_delimited(&path, vec![vec!["a", "b"]], PIPE, ArtifactEncoding::utf8())
            .unwrap();
        assert_eq!(staged.lines(), 1);
        assert!(!path.exists());

        assert_eq!(staged.persist().unwrap(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "a|b\n");
    }

    #[test]
    fn dropped_staging_leaves_directory_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dropped.csv");

        drop(stage_delimited(&path, vec![vec!["x"]], PIPE, ArtifactEncoding::utf8()).unwrap());

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("out.csv");

        write_delimited(&path, vec![vec!["x"]], PIPE, ArtifactEncoding::utf8()).unwrap();

        assert!(path.is_file());
    }
}
