//! Run configuration: command-line flags with environment fallbacks.
//!
//! Every setting can come from a flag, an environment variable, or a `.env` file in the
//! working directory (loaded before parsing). Flags win over the environment.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use cargue_enrich::ProcedureNames;
use cargue_ingest::NormalizeOptions;
use cargue_output::ArtifactEncoding;
use clap::{ArgAction, Args};

/// Values accepted as "true" for boolean settings; anything else is false.
pub const TRUTHY_VALUES: [&str; 5] = ["1", "true", "yes", "y", "on"];

/// Parses a boolean setting the way operators write them in `.env` files.
pub fn parse_flag(value: &str) -> Result<bool, std::convert::Infallible> {
    let value = value.trim().to_ascii_lowercase();
    Ok(TRUTHY_VALUES.contains(&value.as_str()))
}

/// Layout settings shared by every command that writes artifacts.
#[derive(Debug, Clone, Args)]
pub struct OutputSettings {
    /// Encoding of every written artifact (any WHATWG label, e.g. windows-1252, utf-8).
    #[arg(long = "output-encoding", env = "OUTPUT_ENCODING", default_value = "windows-1252")]
    pub output_encoding: String,

    /// Value written in the periodicidad field of each canonical line.
    #[arg(long = "periodicidad", env = "PERIODICIDAD", default_value = "1")]
    pub periodicidad: String,
}

impl OutputSettings {
    pub fn normalize_options(&self) -> anyhow::Result<NormalizeOptions> {
        let encoding = ArtifactEncoding::from_label(&self.output_encoding)
            .context("invalid OUTPUT_ENCODING")?;
        Ok(NormalizeOptions {
            periodicidad: self.periodicidad.clone(),
            encoding,
        })
    }
}

/// Settings of a full workflow run.
#[derive(Debug, Clone, Args)]
pub struct RunSettings {
    /// Directory under which each run gets its own timestamped folder.
    #[arg(long = "runs-dir", env = "RUNS_DIR", default_value = "runs", value_name = "DIR")]
    pub runs_dir: PathBuf,

    /// Where the portal export is staged for pickup.
    #[arg(long = "report-path", env = "REPORT_PATH", value_name = "PATH")]
    pub report_path: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputSettings,

    /// Call the enrichment procedures and write their artifacts.
    #[arg(
        long = "enable-enrichment",
        env = "ENABLE_ENRICHMENT",
        action = ArgAction::Set,
        value_parser = parse_flag,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub enable_enrichment: bool,

    #[arg(long = "oracle-user", env = "ORACLE_USER")]
    pub oracle_user: Option<String>,

    #[arg(long = "oracle-password", env = "ORACLE_PASSWORD", hide_env_values = true)]
    pub oracle_password: Option<String>,

    /// Connect string, e.g. `host:1521/service`.
    #[arg(long = "oracle-dsn", env = "ORACLE_DSN")]
    pub oracle_dsn: Option<String>,

    /// Schema that owns the enrichment procedures.
    #[arg(long = "oracle-schema", env = "ORACLE_SCHEMA")]
    pub oracle_schema: Option<String>,

    /// Oracle client library directory, when not on the loader path.
    #[arg(long = "oracle-lib-dir", env = "ORACLE_LIB_DIR", value_name = "DIR")]
    pub oracle_lib_dir: Option<PathBuf>,

    /// Hand the artifacts to the legacy desktop upload.
    #[arg(
        long = "enable-legacy-upload",
        env = "ENABLE_LEGACY_UPLOAD",
        action = ArgAction::Set,
        value_parser = parse_flag,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub enable_legacy_upload: bool,

    /// Program that performs the legacy upload.
    #[arg(long = "upload-command", env = "LINIX_UPLOAD_COMMAND", value_name = "PROGRAM")]
    pub upload_command: Option<PathBuf>,

    /// Log the legacy upload command instead of running it.
    #[arg(
        long = "dry-run",
        env = "DRY_RUN",
        action = ArgAction::Set,
        value_parser = parse_flag,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub dry_run: bool,

    /// Timeout for the legacy upload, in milliseconds.
    #[arg(long = "timeout-ms", env = "TIMEOUT_MS", default_value_t = 30_000)]
    pub timeout_ms: u64,

    /// How long to wait for the portal export, in milliseconds.
    #[arg(long = "nav-timeout-ms", env = "NAV_TIMEOUT_MS", default_value_t = 60_000)]
    pub nav_timeout_ms: u64,
}

/// Database credentials for the enrichment stage.
#[derive(Clone)]
pub struct OracleSettings {
    pub user: String,
    pub password: String,
    pub dsn: String,
    pub lib_dir: Option<PathBuf>,
}

impl fmt::Debug for OracleSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleSettings")
            .field("user", &self.user)
            .field("password", &"***")
            .field("dsn", &self.dsn)
            .field("lib_dir", &self.lib_dir)
            .finish()
    }
}

/// Validated settings of one workflow run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub runs_dir: PathBuf,
    pub report_path: PathBuf,
    pub normalize: NormalizeOptions,
    pub enrichment: Option<OracleSettings>,
    pub procedure_names: ProcedureNames,
    pub upload_command: Option<PathBuf>,
    pub dry_run: bool,
    pub timeout: Duration,
    pub nav_timeout: Duration,
}

impl PipelineConfig {
    /// Checks cross-field requirements and resolves the output encoding.
    pub fn from_settings(settings: &RunSettings) -> anyhow::Result<Self> {
        let Some(report_path) = settings.report_path.clone() else {
            bail!("REPORT_PATH is required");
        };
        let normalize = settings.output.normalize_options()?;

        let enrichment = if settings.enable_enrichment {
            let required = |value: &Option<String>, name: &str| {
                value
                    .as_deref()
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
                    .with_context(|| format!("{name} is required when ENABLE_ENRICHMENT is set"))
            };
            Some(OracleSettings {
                user: required(&settings.oracle_user, "ORACLE_USER")?,
                password: required(&settings.oracle_password, "ORACLE_PASSWORD")?,
                dsn: required(&settings.oracle_dsn, "ORACLE_DSN")?,
                lib_dir: settings.oracle_lib_dir.clone(),
            })
        } else {
            None
        };

        let upload_command = if settings.enable_legacy_upload {
            let Some(command) = settings.upload_command.clone() else {
                bail!("LINIX_UPLOAD_COMMAND is required when ENABLE_LEGACY_UPLOAD is set");
            };
            Some(command)
        } else {
            None
        };

        Ok(Self {
            runs_dir: settings.runs_dir.clone(),
            report_path,
            normalize,
            enrichment,
            procedure_names: ProcedureNames::with_schema(settings.oracle_schema.as_deref()),
            upload_command,
            dry_run: settings.dry_run,
            timeout: Duration::from_millis(settings.timeout_ms),
            nav_timeout: Duration::from_millis(settings.nav_timeout_ms),
        })
    }
}
