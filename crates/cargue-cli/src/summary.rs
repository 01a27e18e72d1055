//! Run summary: the `run_summary.json` record and the console table.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::Context;
use cargue_model::{EnrichmentOutputs, IngestionMode};
use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::pipeline::Stage;

/// Final state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// What an artifact holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// `cargue linix produccion.csv`.
    Canonical,
    /// `<stem>_normalized.csv` from a plain-text report.
    Normalized,
    Documents,
    Savings,
}

impl ArtifactKind {
    fn label(self) -> &'static str {
        match self {
            ArtifactKind::Canonical => "canonical",
            ArtifactKind::Normalized => "normalized",
            ArtifactKind::Documents => "documents",
            ArtifactKind::Savings => "savings",
        }
    }
}

/// A written artifact with its content digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDigest {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    /// Data rows, when the writer reported them.
    pub rows: Option<usize>,
    pub bytes: u64,
    pub sha256: String,
}

impl ArtifactDigest {
    /// Reads `path` and records its size and SHA-256.
    pub fn compute(kind: ArtifactKind, path: &Path, rows: Option<usize>) -> io::Result<Self> {
        let content = fs::read(path)?;
        Ok(Self {
            kind,
            path: path.to_path_buf(),
            rows,
            bytes: content.len() as u64,
            sha256: sha256_hex(&content),
        })
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Everything persisted about one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub run_dir: PathBuf,
    pub status: RunStatus,
    pub exit_code: i32,
    pub started_at: String,
    pub duration_ms: u64,
    /// Stages entered, in order.
    pub stages: Vec<Stage>,
    pub failed_stage: Option<Stage>,
    pub error: Option<String>,
    pub report: Option<PathBuf>,
    pub ingestion_mode: Option<IngestionMode>,
    pub records: usize,
    pub enrichment: Option<EnrichmentOutputs>,
    pub legacy_upload: bool,
    pub artifacts: Vec<ArtifactDigest>,
}

/// Writes the summary as pretty-printed JSON.
pub fn write_run_summary(path: &Path, summary: &RunSummary) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create run summary {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)
        .with_context(|| format!("failed to write run summary {}", path.display()))?;
    Ok(())
}

pub fn print_summary(summary: &RunSummary) {
    println!("Run: {}", summary.run_id);
    println!("Directory: {}", summary.run_dir.display());
    if let Some(mode) = summary.ingestion_mode {
        println!("Report: {mode}, {} records", summary.records);
    }

    if !summary.artifacts.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Artifact"),
            header_cell("Rows"),
            header_cell("Bytes"),
            header_cell("SHA-256"),
            header_cell("Path"),
        ]);
        apply_summary_table_style(&mut table);
        align_column(&mut table, 1, CellAlignment::Right);
        align_column(&mut table, 2, CellAlignment::Right);
        for artifact in &summary.artifacts {
            table.add_row(vec![
                Cell::new(artifact.kind.label())
                    .fg(Color::Blue)
                    .add_attribute(Attribute::Bold),
                artifact.rows.map_or_else(|| dim_cell("-"), Cell::new),
                Cell::new(artifact.bytes),
                Cell::new(&artifact.sha256[..artifact.sha256.len().min(12)]),
                Cell::new(artifact.path.display()),
            ]);
        }
        println!("{table}");
    }

    match summary.status {
        RunStatus::Completed => println!("Status: completed"),
        RunStatus::Failed => {
            let stage = summary
                .failed_stage
                .map_or_else(|| "-".to_string(), |stage| stage.to_string());
            eprintln!("Status: failed during {stage} (exit {})", summary.exit_code);
            if let Some(error) = &summary.error {
                eprintln!("- {error}");
            }
        }
    }
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_of_known_content() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn computes_artifact_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ahorros.csv");
        fs::write(&path, "abc").unwrap();

        let digest = ArtifactDigest::compute(ArtifactKind::Savings, &path, Some(1)).unwrap();

        assert_eq!(digest.bytes, 3);
        assert!(digest.sha256.starts_with("ba7816bf"));
    }

    #[test]
    fn summary_serializes_snake_case() {
        let summary = RunSummary {
            run_id: "20240315_080000".to_string(),
            run_dir: PathBuf::from("runs/20240315_080000"),
            status: RunStatus::Failed,
            exit_code: 1,
            started_at: "2024-03-15T08:00:00-05:00".to_string(),
            duration_ms: 12,
            stages: vec![Stage::Idle, Stage::Downloading, Stage::Failed],
            failed_stage: Some(Stage::Downloading),
            error: Some("report download failed".to_string()),
            report: None,
            ingestion_mode: None,
            records: 0,
            enrichment: None,
            legacy_upload: false,
            artifacts: Vec::new(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["failed_stage"], "downloading");
        assert_eq!(json["stages"][2], "failed");
    }
}
