//! Per-run directory tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::error::RunContextError;

/// Runs started within the same second get `_2`, `_3`, ... suffixes up to this count.
const MAX_RUNS_PER_SECOND: u32 = 100;

/// Directories scoping every file one pipeline run produces.
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: String,
    run_dir: PathBuf,
    downloads_dir: PathBuf,
    outputs_dir: PathBuf,
    screenshots_dir: PathBuf,
}

impl RunContext {
    /// Creates `<runs_root>/<YYYYMMDD_HHMMSS>/{downloads,outputs,screenshots}` for the current
    /// local time.
    pub fn create(runs_root: &Path) -> Result<Self, RunContextError> {
        Self::create_at(runs_root, Local::now().naive_local())
    }

    /// Same as [`RunContext::create`] with an explicit timestamp.
    ///
    /// An existing run folder is never reused: a second run in the same second is suffixed
    /// `_2`, then `_3`, and so on.
    pub fn create_at(runs_root: &Path, started: NaiveDateTime) -> Result<Self, RunContextError> {
        let create_err = |path: &Path, source| RunContextError::CreateDir {
            path: path.to_path_buf(),
            source,
        };
        fs::create_dir_all(runs_root).map_err(|source| create_err(runs_root, source))?;

        let base_id = started.format("%Y%m%d_%H%M%S").to_string();
        let mut attempt = 1;
        let (run_id, run_dir) = loop {
            let run_id = if attempt == 1 {
                base_id.clone()
            } else {
                format!("{base_id}_{attempt}")
            };
            let run_dir = runs_root.join(&run_id);
            match fs::create_dir(&run_dir) {
                Ok(()) => break (run_id, run_dir),
                Err(err)
                    if err.kind() == io::ErrorKind::AlreadyExists
                        && attempt < MAX_RUNS_PER_SECOND =>
                {
                    attempt += 1;
                }
                Err(source) => return Err(create_err(run_dir.as_path(), source)),
            }
        };

        let context = Self {
            downloads_dir: run_dir.join("downloads"),
            outputs_dir: run_dir.join("outputs"),
            screenshots_dir: run_dir.join("screenshots"),
            run_dir,
            run_id,
        };
        for dir in [
            &context.downloads_dir,
            &context.outputs_dir,
            &context.screenshots_dir,
        ] {
            fs::create_dir(dir).map_err(|source| create_err(dir.as_path(), source))?;
        }
        Ok(context)
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }

    pub fn outputs_dir(&self) -> &Path {
        &self.outputs_dir
    }

    pub fn screenshots_dir(&self) -> &Path {
        &self.screenshots_dir
    }

    /// Log file mirrored from the console for this run.
    pub fn log_file(&self) -> PathBuf {
        self.run_dir.join("pipeline.log")
    }

    pub fn summary_file(&self) -> PathBuf {
        self.run_dir.join("run_summary.json")
    }
}
