use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use cargue_model::RunContext;
use tracing::{debug, info};

use super::{DownloadError, ReportSource};

const DEFAULT_REPORT_NAME: &str = "reporte.xlsx";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Picks up a portal export staged on disk by an external downloader.
///
/// Waits for `export_path` to exist, then copies it to `downloads/<run_id>_<file name>`.
#[derive(Debug, Clone)]
pub struct StagedReportSource {
    export_path: PathBuf,
    timeout: Duration,
    poll_interval: Duration,
    open: bool,
}

impl StagedReportSource {
    pub fn new(export_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            export_path: export_path.into(),
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
            open: true,
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn wait_for_export(&self) -> Result<(), DownloadError> {
        let start = Instant::now();
        while !self.export_path.is_file() {
            if start.elapsed() >= self.timeout {
                return Err(DownloadError::Timeout {
                    path: self.export_path.clone(),
                    timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
            thread::sleep(self.poll_interval.min(self.timeout.saturating_sub(start.elapsed())));
        }
        Ok(())
    }
}

impl ReportSource for StagedReportSource {
    fn download(&mut self, run: &RunContext) -> Result<PathBuf, DownloadError> {
        if !self.open {
            return Err(DownloadError::Failed {
                message: "report source already closed".to_string(),
            });
        }
        debug!(export = %self.export_path.display(), "waiting for portal export");
        self.wait_for_export()?;

        let target = run
            .downloads_dir()
            .join(format!("{}_{}", run.run_id(), report_name(&self.export_path)));
        fs::copy(&self.export_path, &target).map_err(|source| DownloadError::Copy {
            from: self.export_path.clone(),
            to: target.clone(),
            source,
        })?;
        info!(report = %target.display(), "report downloaded");
        Ok(target)
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            debug!("report source closed");
        }
    }
}

fn report_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_REPORT_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn run_in(root: &Path) -> RunContext {
        let at = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        RunContext::create_at(root, at).unwrap()
    }

    #[test]
    fn copies_export_with_run_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let export = dir.path().join("Solicitudes.xlsx");
        fs::write(&export, b"data").unwrap();
        let run = run_in(&dir.path().join("runs"));
        let mut source = StagedReportSource::new(&export, Duration::from_millis(50));

        let path = source.download(&run).unwrap();

        assert_eq!(
            path,
            run.downloads_dir().join("20240315_080000_Solicitudes.xlsx")
        );
        assert_eq!(fs::read(&path).unwrap(), b"data");
    }

    #[test]
    fn missing_export_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let run = run_in(&dir.path().join("runs"));
        let mut source = StagedReportSource::new(dir.path().join("never.xlsx"), Duration::from_millis(30))
            .with_poll_interval(Duration::from_millis(5));

        let err = source.download(&run).unwrap_err();

        assert!(err.is_timeout());
    }

    #[test]
    fn close_is_idempotent() {
        let mut source = StagedReportSource::new("x.xlsx", Duration::ZERO);
        source.close();
        source.close();
        assert!(!source.is_open());
    }
}
