//! Logging infrastructure using `tracing` and `tracing-subscriber`.
//!
//! Events go to stderr (or `--log-file`) and, for workflow runs, are mirrored into the run's
//! `pipeline.log` so every run folder carries its own record.
//!
//! # Log Levels
//!
//! - `error`: stage failures
//! - `warn`: recoverable issues, e.g. a failed diagnostic capture
//! - `info`: stage progress, artifact paths, counts and durations
//! - `debug`: stage transitions, per-call details
//! - `trace`: row-level values (identity numbers only with `--log-data`)

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

static LOG_DATA_ENABLED: AtomicBool = AtomicBool::new(false);

/// Placeholder used when row-level logging is disabled.
pub const REDACTED_VALUE: &str = "[REDACTED]";

/// Crates whose events follow the configured level; everything else stays at `warn`.
const PIPELINE_CRATES: [&str; 5] = [
    "cargue_cli",
    "cargue_enrich",
    "cargue_ingest",
    "cargue_model",
    "cargue_output",
];

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Returns true if row-level logging is explicitly enabled.
pub fn log_data_enabled() -> bool {
    LOG_DATA_ENABLED.load(Ordering::Relaxed)
}

/// Returns the input value when PII logging is enabled, otherwise a redacted token.
pub fn redact_value(value: &str) -> &str {
    if log_data_enabled() {
        value
    } else {
        REDACTED_VALUE
    }
}

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Maximum level for the pipeline crates.
    pub level_filter: LevelFilter,
    /// Whether `RUST_LOG` may replace the computed filter.
    pub use_env_filter: bool,
    /// Whether to include timestamps in console output.
    pub with_timestamps: bool,
    /// Whether to include target (module path) in log output.
    pub with_target: bool,
    /// Whether to emit span close events (JSON only).
    pub with_spans: bool,
    /// Whether to use ANSI colors on the console.
    pub with_ansi: bool,
    pub format: LogFormat,
    /// Write console output to this file instead of stderr.
    pub log_file: Option<PathBuf>,
    /// Additional file receiving a copy of every event, always timestamped and uncolored.
    pub mirror_file: Option<PathBuf>,
    /// Whether row-level (PII) values may be logged.
    pub log_data: bool,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors.
    #[default]
    Pretty,
    /// Compact single-line format.
    Compact,
    /// JSON format for machine parsing.
    Json,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level_filter: LevelFilter::INFO,
            use_env_filter: true,
            with_timestamps: true,
            with_target: false,
            with_spans: true,
            with_ansi: true,
            format: LogFormat::default(),
            log_file: None,
            mirror_file: None,
            log_data: false,
        }
    }
}

impl LogConfig {
    /// Mirror every event into `path`, e.g. the run's `pipeline.log`.
    #[must_use]
    pub fn with_mirror_file(mut self, path: Option<PathBuf>) -> Self {
        self.mirror_file = path;
        self
    }

    /// Enable or disable row-level logging of sensitive values.
    #[must_use]
    pub fn with_log_data(mut self, enable: bool) -> Self {
        self.log_data = enable;
        self
    }
}

/// Initialize the global tracing subscriber with the given configuration.
///
/// # Errors
///
/// Returns an error if a log file cannot be opened.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    match &config.log_file {
        Some(path) => layers.push(format_layer(
            config,
            SharedFileWriter::open(path)?,
            false,
            config.with_timestamps,
        )),
        None => layers.push(format_layer(
            config,
            io::stderr,
            config.with_ansi,
            config.with_timestamps,
        )),
    }
    if let Some(path) = &config.mirror_file {
        layers.push(format_layer(config, SharedFileWriter::open(path)?, false, true));
    }

    LOG_DATA_ENABLED.store(config.log_data, Ordering::Release);
    tracing_subscriber::registry()
        .with(layers)
        .with(build_env_filter(config))
        .init();
    Ok(())
}

fn format_layer<W>(config: &LogConfig, writer: W, ansi: bool, timestamps: bool) -> BoxedLayer
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(config.with_target)
            .with_span_events(if config.with_spans {
                fmt::format::FmtSpan::CLOSE
            } else {
                fmt::format::FmtSpan::NONE
            })
            .boxed(),
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_writer(writer)
                .with_ansi(ansi)
                .with_target(config.with_target);
            if timestamps {
                layer.boxed()
            } else {
                layer.without_time().boxed()
            }
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(ansi)
                .with_target(config.with_target);
            if timestamps {
                layer.boxed()
            } else {
                layer.without_time().boxed()
            }
        }
    }
}

#[derive(Clone)]
struct SharedFileWriter {
    file: Arc<Mutex<std::fs::File>>,
}

impl SharedFileWriter {
    fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Arc::new(Mutex::new(file)),
        })
    }
}

struct SharedFileGuard {
    file: Arc<Mutex<std::fs::File>>,
}

impl Write for SharedFileGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        guard.flush()
    }
}

impl<'a> MakeWriter<'a> for SharedFileWriter {
    type Writer = SharedFileGuard;

    fn make_writer(&'a self) -> Self::Writer {
        SharedFileGuard {
            file: Arc::clone(&self.file),
        }
    }
}

/// Directives for the configured level: pipeline crates at that level, the rest at `warn`.
fn default_directives(level_filter: LevelFilter) -> String {
    let level = level_filter.to_string().to_lowercase();
    let mut directives = vec![LevelFilter::WARN.min(level_filter).to_string().to_lowercase()];
    directives.extend(PIPELINE_CRATES.iter().map(|krate| format!("{krate}={level}")));
    directives.join(",")
}

/// Build an `EnvFilter`, letting `RUST_LOG` override it unless a level was given explicitly.
fn build_env_filter(config: &LogConfig) -> EnvFilter {
    let computed = || EnvFilter::new(default_directives(config.level_filter));
    if config.use_env_filter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| computed())
    } else {
        computed()
    }
}
