use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::{LegacyUploadError, LegacyUploadRequest, LegacyUploader};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs the desktop-automation program that loads the artifacts into Linix.
///
/// The program receives `--canonical <path>` plus `--documents <path>` and `--savings <path>`
/// when enrichment produced them. It is killed once `timeout` elapses.
#[derive(Debug, Clone)]
pub struct CommandUploader {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
    dry_run: bool,
}

impl CommandUploader {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
            dry_run: false,
        }
    }

    /// Arguments placed before the artifact flags.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Log the command instead of running it.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn command(&self, request: &LegacyUploadRequest) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("--canonical")
            .arg(&request.canonical);
        if let Some(path) = &request.documents {
            command.arg("--documents").arg(path);
        }
        if let Some(path) = &request.savings {
            command.arg("--savings").arg(path);
        }
        command.stdin(Stdio::null());
        command
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl LegacyUploader for CommandUploader {
    fn upload(&self, request: &LegacyUploadRequest) -> Result<(), LegacyUploadError> {
        let mut command = self.command(request);
        if self.dry_run {
            info!(command = ?command, "dry run: legacy upload skipped");
            return Ok(());
        }

        debug!(command = ?command, "starting legacy upload");
        let mut child = command.spawn().map_err(|source| LegacyUploadError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        let wait_error = |source: std::io::Error| LegacyUploadError::Wait {
            program: self.program.clone(),
            source,
        };

        let start = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait().map_err(wait_error)? {
                break status;
            }
            if start.elapsed() >= self.timeout {
                // The child may exit between the check and the kill.
                let _ = child.kill();
                child.wait().map_err(wait_error)?;
                return Err(LegacyUploadError::Timeout {
                    program: self.program.clone(),
                    timeout_ms: self.timeout_ms(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        if !status.success() {
            return Err(LegacyUploadError::Exited {
                program: self.program.clone(),
                code: status.code(),
            });
        }
        info!(
            program = %self.program.display(),
            duration_ms = start.elapsed().as_millis(),
            "legacy upload finished"
        );
        Ok(())
    }
}
