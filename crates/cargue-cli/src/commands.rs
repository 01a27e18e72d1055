use std::path::{Path, PathBuf};

use anyhow::Context;
use cargue_cli::collaborators::{CommandUploader, RunDirectoryCapture, StagedReportSource};
use cargue_cli::config::{OracleSettings, PipelineConfig, RunSettings};
use cargue_cli::error::{EXIT_FAILURE, EXIT_OK, EXIT_UNEXPECTED};
use cargue_cli::logging::init_logging;
use cargue_cli::pipeline::WorkflowOrchestrator;
use cargue_cli::summary::print_summary;
use cargue_enrich::{BatchEnrichmentProcessor, ProcedureConnector};
use cargue_ingest::normalize_report;
use cargue_model::RunContext;

use crate::cli::{Cli, NormalizeArgs};
use crate::log_config_from_cli;

/// Runs the full workflow and returns the process exit code.
pub fn run_workflow(cli: &Cli, settings: &RunSettings) -> i32 {
    let config = match PipelineConfig::from_settings(settings) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err:#}");
            return EXIT_UNEXPECTED;
        }
    };
    let (mut orchestrator, run) = match prepare_run(&config) {
        Ok(prepared) => prepared,
        Err(err) => {
            eprintln!("error: {err:#}");
            return EXIT_UNEXPECTED;
        }
    };
    if let Err(err) = init_logging(&log_config_from_cli(cli, Some(run.log_file()))) {
        eprintln!("error: failed to initialize logging: {err}");
        return EXIT_UNEXPECTED;
    }

    let outcome = orchestrator.run(&run);
    print_summary(&outcome.summary);
    outcome.exit_code()
}

/// Normalizes a local report and prints where the artifact went.
pub fn run_normalize(cli: &Cli, args: &NormalizeArgs) -> i32 {
    if let Err(err) = init_logging(&log_config_from_cli(cli, None)) {
        eprintln!("error: failed to initialize logging: {err}");
        return EXIT_UNEXPECTED;
    }
    let options = match args.output.normalize_options() {
        Ok(options) => options,
        Err(err) => {
            eprintln!("error: {err:#}");
            return EXIT_UNEXPECTED;
        }
    };
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| default_output_dir(&args.input));

    match normalize_report(&args.input, &output_dir, &options) {
        Ok(result) => {
            println!("Mode: {}", result.mode());
            println!("Records: {}", result.records().len());
            println!("Artifact: {}", result.artifact().display());
            EXIT_OK
        }
        Err(err) => {
            eprintln!("error: {err}");
            EXIT_FAILURE
        }
    }
}

fn default_output_dir(input: &Path) -> PathBuf {
    input
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Builds every collaborator before creating the run folder, so a setup failure leaves no
/// folder behind.
fn prepare_run(config: &PipelineConfig) -> anyhow::Result<(WorkflowOrchestrator, RunContext)> {
    let orchestrator = build_orchestrator(config)?;
    let run = RunContext::create(&config.runs_dir).context("failed to create the run folder")?;
    Ok((orchestrator, run))
}

fn build_orchestrator(config: &PipelineConfig) -> anyhow::Result<WorkflowOrchestrator> {
    let source = StagedReportSource::new(&config.report_path, config.nav_timeout);
    let mut orchestrator = WorkflowOrchestrator::new(
        Box::new(source),
        Box::new(RunDirectoryCapture),
        config.normalize.clone(),
    );

    if let Some(settings) = &config.enrichment {
        let connector = oracle_connector(settings).context("enrichment is enabled")?;
        let processor = BatchEnrichmentProcessor::new(connector)
            .with_procedure_names(config.procedure_names.clone())
            .with_encoding(config.normalize.encoding);
        orchestrator = orchestrator.with_enrichment(processor);
    }

    if let Some(program) = &config.upload_command {
        let uploader = CommandUploader::new(program, config.timeout).with_dry_run(config.dry_run);
        orchestrator = orchestrator.with_uploader(Box::new(uploader));
    }
    Ok(orchestrator)
}

#[cfg(feature = "oracle")]
fn oracle_connector(settings: &OracleSettings) -> anyhow::Result<Box<dyn ProcedureConnector>> {
    Ok(Box::new(cargue_enrich::OracleConnector {
        user: settings.user.clone(),
        password: settings.password.clone(),
        dsn: settings.dsn.clone(),
        lib_dir: settings.lib_dir.clone(),
    }))
}

#[cfg(not(feature = "oracle"))]
fn oracle_connector(_settings: &OracleSettings) -> anyhow::Result<Box<dyn ProcedureConnector>> {
    anyhow::bail!("this build has no Oracle support; rebuild with `--features oracle`")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_dir_defaults_to_report_folder() {
        assert_eq!(
            default_output_dir(Path::new("exports/reporte.xlsx")),
            PathBuf::from("exports")
        );
        assert_eq!(default_output_dir(Path::new("reporte.xlsx")), PathBuf::from("."));
    }

    #[cfg(not(feature = "oracle"))]
    #[test]
    fn setup_failure_leaves_no_run_folder() {
        use std::time::Duration;

        use cargue_enrich::ProcedureNames;
        use cargue_ingest::NormalizeOptions;

        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            runs_dir: dir.path().join("runs"),
            report_path: dir.path().join("reporte.xlsx"),
            normalize: NormalizeOptions::default(),
            enrichment: Some(OracleSettings {
                user: "bot".to_string(),
                password: "secret".to_string(),
                dsn: "db:1521/core".to_string(),
                lib_dir: None,
            }),
            procedure_names: ProcedureNames::default(),
            upload_command: None,
            dry_run: false,
            timeout: Duration::from_millis(30_000),
            nav_timeout: Duration::from_millis(60_000),
        };

        let err = match prepare_run(&config) {
            Ok(_) => panic!("enrichment without Oracle support must fail"),
            Err(err) => err,
        };

        assert!(format!("{err:#}").contains("--features oracle"));
        assert!(!config.runs_dir.exists());
    }
}
