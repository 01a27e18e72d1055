//! CLI argument definitions for the Linix load runner.

use std::path::PathBuf;

use cargue_cli::config::{OutputSettings, RunSettings};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "cargue-linix",
    version,
    about = "Linix load runner - turn the portal report into Linix load files",
    long_about = "Pick up the credit-request report exported from the portal, normalize it into\n\
                  the canonical Linix load file, optionally enrich it through the core banking\n\
                  procedures, and hand the artifacts to the legacy upload.\n\n\
                  Settings are read from flags, the environment, or a .env file."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write console logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow identity numbers in trace-level logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full workflow in a new timestamped run folder.
    Run(RunSettings),

    /// Normalize a local report file without touching any external system.
    Normalize(NormalizeArgs),
}

#[derive(Parser)]
pub struct NormalizeArgs {
    /// Report exported from the portal (spreadsheet or delimited text).
    #[arg(value_name = "REPORT")]
    pub input: PathBuf,

    /// Directory for the normalized artifact (default: next to the report).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputSettings,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
