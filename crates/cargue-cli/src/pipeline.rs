//! The workflow orchestrator.
//!
//! A run moves through `Idle -> Downloading -> Normalizing -> Enriching -> LegacyUpload ->
//! Completed`. Enriching and LegacyUpload are skipped when their collaborator is not
//! configured. Any failure moves the run to `Failed`, triggers a best-effort diagnostic capture
//! and releases the report source.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use cargue_enrich::BatchEnrichmentProcessor;
use cargue_ingest::{NormalizeOptions, normalize_report};
use cargue_model::{EnrichmentOutputs, IngestionMode, NormalizationResult, RunContext};
use chrono::Local;
use serde::Serialize;
use tracing::{debug, error, info, info_span, trace, warn};

use crate::collaborators::{DiagnosticCapture, LegacyUploadRequest, LegacyUploader, ReportSource};
use crate::error::{EXIT_OK, PipelineError};
use crate::logging::redact_value;
use crate::summary::{ArtifactDigest, ArtifactKind, RunStatus, RunSummary, write_run_summary};

/// Workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Downloading,
    Normalizing,
    Enriching,
    LegacyUpload,
    Completed,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Downloading => "downloading",
            Stage::Normalizing => "normalizing",
            Stage::Enriching => "enriching",
            Stage::LegacyUpload => "legacy upload",
            Stage::Completed => "completed",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct StageTracker {
    current: Stage,
    history: Vec<Stage>,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            current: Stage::Idle,
            history: vec![Stage::Idle],
        }
    }

    fn enter(&mut self, stage: Stage) {
        debug!(from = %self.current, to = %stage, "stage transition");
        self.current = stage;
        self.history.push(stage);
    }
}

/// What a run produced before it ended, successful or not.
#[derive(Debug, Default)]
struct RunProgress {
    report: Option<PathBuf>,
    normalized: Option<NormalizationResult>,
    enrichment: Option<EnrichmentOutputs>,
    uploaded: bool,
}

/// Result of [`WorkflowOrchestrator::run`].
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub error: Option<PipelineError>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn exit_code(&self) -> i32 {
        self.error.as_ref().map_or(EXIT_OK, PipelineError::exit_code)
    }
}

/// Drives one run through its stages. Single use.
pub struct WorkflowOrchestrator {
    source: Box<dyn ReportSource>,
    capture: Box<dyn DiagnosticCapture>,
    normalize: NormalizeOptions,
    enrichment: Option<BatchEnrichmentProcessor>,
    uploader: Option<Box<dyn LegacyUploader>>,
    stages: StageTracker,
}

impl WorkflowOrchestrator {
    pub fn new(
        source: Box<dyn ReportSource>,
        capture: Box<dyn DiagnosticCapture>,
        normalize: NormalizeOptions,
    ) -> Self {
        Self {
            source,
            capture,
            normalize,
            enrichment: None,
            uploader: None,
            stages: StageTracker::new(),
        }
    }

    #[must_use]
    pub fn with_enrichment(mut self, processor: BatchEnrichmentProcessor) -> Self {
        self.enrichment = Some(processor);
        self
    }

    #[must_use]
    pub fn with_uploader(mut self, uploader: Box<dyn LegacyUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub fn stage(&self) -> Stage {
        self.stages.current
    }

    /// Stages entered so far, starting with `Idle`.
    pub fn stages(&self) -> &[Stage] {
        &self.stages.history
    }

    /// Runs every stage, then writes `run_summary.json` into the run directory.
    ///
    /// Never panics: panics raised by a stage or collaborator are reported as
    /// [`PipelineError::Panicked`].
    pub fn run(&mut self, run: &RunContext) -> RunOutcome {
        let span = info_span!("run", run_id = %run.run_id());
        let _guard = span.enter();
        let started_at = Local::now();
        let start = Instant::now();
        info!(run_dir = %run.run_dir().display(), "run started");

        let mut progress = RunProgress::default();
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.execute(run, &mut progress)))
            .unwrap_or_else(|payload| {
                Err(PipelineError::Panicked {
                    message: panic_message(payload.as_ref()),
                })
            });

        let failed_stage = match &result {
            Ok(()) => {
                self.stages.enter(Stage::Completed);
                info!(duration_ms = start.elapsed().as_millis(), "run completed OK");
                None
            }
            Err(err) => {
                let stage = self.stages.current;
                self.stages.enter(Stage::Failed);
                error!(stage = %stage, error = %err, "run failed");
                self.capture_diagnostics(run, err.capture_tag());
                self.source.close();
                Some(stage)
            }
        };
        let error = result.err();

        let summary = self.summarize(
            run,
            &progress,
            failed_stage,
            error.as_ref(),
            started_at.to_rfc3339(),
            start.elapsed(),
        );
        if let Err(err) = write_run_summary(&run.summary_file(), &summary) {
            let message = format!("{err:#}");
            warn!(error = %message, "run summary not written");
        }
        RunOutcome { summary, error }
    }

    fn execute(&mut self, run: &RunContext, progress: &mut RunProgress) -> Result<(), PipelineError> {
        self.stages.enter(Stage::Downloading);
        let report = info_span!("download").in_scope(|| self.source.download(run))?;
        progress.report = Some(report.clone());

        self.stages.enter(Stage::Normalizing);
        let normalized = normalize_report(&report, run.outputs_dir(), &self.normalize)?;
        self.source.close();
        for (index, record) in normalized.records().iter().enumerate() {
            trace!(
                record = index,
                identity = redact_value(record.identity_number()),
                "record normalized"
            );
        }
        let normalized = progress.normalized.insert(normalized);

        match &self.enrichment {
            Some(processor) => {
                self.stages.enter(Stage::Enriching);
                info!(
                    documents = %processor.procedure_names().documents,
                    savings = %processor.procedure_names().savings,
                    "enrichment enabled"
                );
                if normalized.mode() == IngestionMode::DelimiterSniff {
                    warn!("plain-text report has no records; enrichment artifacts will be empty");
                }
                let outputs = processor.run(normalized.records(), run.outputs_dir())?;
                progress.enrichment = Some(outputs);
            }
            None => info!("enrichment disabled"),
        }

        match &self.uploader {
            Some(uploader) => {
                self.stages.enter(Stage::LegacyUpload);
                let request = LegacyUploadRequest::new(
                    normalized.artifact().to_path_buf(),
                    progress.enrichment.as_ref(),
                );
                info_span!("legacy_upload").in_scope(|| uploader.upload(&request))?;
                progress.uploaded = true;
            }
            None => info!("legacy upload disabled"),
        }
        Ok(())
    }

    /// Capture failures are logged and swallowed so they never replace the run's error.
    fn capture_diagnostics(&self, run: &RunContext, tag: &str) {
        match panic::catch_unwind(AssertUnwindSafe(|| self.capture.capture(run, tag))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                let message = format!("{err:#}");
                warn!(tag, error = %message, "diagnostic capture failed");
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(tag, error = %message, "diagnostic capture panicked");
            }
        }
    }

    fn summarize(
        &self,
        run: &RunContext,
        progress: &RunProgress,
        failed_stage: Option<Stage>,
        error: Option<&PipelineError>,
        started_at: String,
        elapsed: Duration,
    ) -> RunSummary {
        let mut artifacts = Vec::new();
        let mut push = |kind: ArtifactKind, path: &Path, rows: Option<usize>| {
            match ArtifactDigest::compute(kind, path, rows) {
                Ok(digest) => artifacts.push(digest),
                Err(err) => warn!(path = %path.display(), error = %err, "artifact digest failed"),
            }
        };
        if let Some(normalized) = &progress.normalized {
            match normalized.mode() {
                IngestionMode::Spreadsheet => push(
                    ArtifactKind::Canonical,
                    normalized.artifact(),
                    Some(normalized.records().len()),
                ),
                IngestionMode::DelimiterSniff => {
                    push(ArtifactKind::Normalized, normalized.artifact(), None);
                }
            }
        }
        if let Some(outputs) = &progress.enrichment {
            push(
                ArtifactKind::Documents,
                &outputs.documents_file,
                Some(outputs.document_rows),
            );
            push(
                ArtifactKind::Savings,
                &outputs.savings_file,
                Some(outputs.savings_rows),
            );
        }

        RunSummary {
            run_id: run.run_id().to_string(),
            run_dir: run.run_dir().to_path_buf(),
            status: if error.is_some() {
                RunStatus::Failed
            } else {
                RunStatus::Completed
            },
            exit_code: error.map_or(EXIT_OK, PipelineError::exit_code),
            started_at,
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            stages: self.stages.history.clone(),
            failed_stage,
            error: error.map(ToString::to_string),
            report: progress.report.clone(),
            ingestion_mode: progress.normalized.as_ref().map(NormalizationResult::mode),
            records: progress
                .normalized
                .as_ref()
                .map_or(0, |normalized| normalized.records().len()),
            enrichment: progress.enrichment.clone(),
            legacy_upload: progress.uploaded,
            artifacts,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_messages_are_extracted() {
        let payload = panic::catch_unwind(|| -> i32 { panic!("static message") }).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static message");
        let payload = panic::catch_unwind(|| -> i32 { panic!("formatted {}", 7) }).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 7");
    }

    #[test]
    fn tracker_records_history() {
        let mut tracker = StageTracker::new();
        tracker.enter(Stage::Downloading);
        tracker.enter(Stage::Failed);
        assert_eq!(tracker.current, Stage::Failed);
        assert_eq!(
            tracker.history,
            vec![Stage::Idle, Stage::Downloading, Stage::Failed]
        );
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::LegacyUpload.to_string(), "legacy upload");
    }
}
