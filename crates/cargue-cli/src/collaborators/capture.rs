use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use cargue_model::RunContext;
use chrono::Local;
use tracing::info;

use super::DiagnosticCapture;

/// Writes a small marker file to `screenshots/<tag>.txt` for each failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunDirectoryCapture;

impl RunDirectoryCapture {
    pub fn capture_path(run: &RunContext, tag: &str) -> PathBuf {
        run.screenshots_dir().join(format!("{tag}.txt"))
    }
}

impl DiagnosticCapture for RunDirectoryCapture {
    fn capture(&self, run: &RunContext, tag: &str) -> anyhow::Result<()> {
        let path = Self::capture_path(run, tag);
        let body = format!(
            "captured_at={}\nrun_id={}\ntag={tag}\n",
            Local::now().format("%Y-%m-%dT%H:%M:%S%:z"),
            run.run_id()
        );
        fs::write(&path, body)
            .with_context(|| format!("failed to write diagnostic capture {}", path.display()))?;
        info!(capture = %path.display(), "diagnostic capture saved");
        Ok(())
    }
}
