//! CLI argument definitions for the matrix converter.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use omx_legacy::DEFAULT_ROW_SLACK;
use omx_store::{DEFAULT_COMPRESSION_LEVEL, DEFAULT_MAX_TABLES};

#[derive(Parser)]
#[command(
    name = "omxconv",
    version,
    about = "Convert matrices between OMX containers and legacy positional files",
    long_about = "Convert each FILE between an OMX container and the legacy positional format.\n\n\
                  The direction is detected per file: containers become legacy files and\n\
                  anything else is read as a legacy file and becomes a container.\n\
                  The exit status is the number of files that failed.",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Matrix files to convert.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Directory for converted files (default: beside each input).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Deflate level for container rows, 0 stores them uncompressed.
    #[arg(
        long = "compression-level",
        value_name = "LEVEL",
        default_value_t = DEFAULT_COMPRESSION_LEVEL,
        value_parser = clap::value_parser!(u32).range(0..=9)
    )]
    pub compression_level: u32,

    /// Refuse to create containers with more tables than this.
    #[arg(long = "max-tables", value_name = "N", default_value_t = DEFAULT_MAX_TABLES)]
    pub max_tables: usize,

    /// Spare elements at the end of every legacy row buffer.
    #[arg(long = "row-slack", value_name = "N", default_value_t = DEFAULT_ROW_SLACK)]
    pub row_slack: usize,

    /// Hide the per-zone progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
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
