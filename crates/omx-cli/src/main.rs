//! OMX matrix converter CLI.

use std::fs;
use std::io::{self, IsTerminal};

use anyhow::Context;
use clap::{ColorChoice, Parser};
use omx_cli::batch::{BatchOptions, run_batch};
use omx_cli::logging::{LogConfig, LogFormat, init_logging};
use omx_cli::types::BatchResult;
use omx_convert::ConvertOptions;
use omx_legacy::RowRecordDriver;
use omx_store::StoreOptions;
use tracing::level_filters::LevelFilter;

mod cli;
mod summary;

use crate::cli::{Cli, LogFormatArg, LogLevelArg};
use crate::summary::print_summary;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli) {
        Ok(result) => {
            print_summary(&result);
            result.exit_code()
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> anyhow::Result<BatchResult> {
    if let Some(dir) = &cli.output_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create output directory {}", dir.display()))?;
    }
    let options = BatchOptions::new(convert_options_from_cli(cli))
        .with_progress_bar(!cli.no_progress && io::stderr().is_terminal());
    Ok(run_batch(
        &cli.files,
        &legacy_driver_from_cli(cli),
        &options,
        |outcome| match &outcome.result {
            Ok(report) => println!("{}", report.destination.display()),
            Err(error) => eprintln!("{}: {error}", outcome.input.display()),
        },
    ))
}

fn legacy_driver_from_cli(cli: &Cli) -> RowRecordDriver {
    RowRecordDriver::new().with_row_slack(cli.row_slack)
}

fn convert_options_from_cli(cli: &Cli) -> ConvertOptions {
    let store = StoreOptions::new()
        .with_compression_level(cli.compression_level)
        .with_max_tables(cli.max_tables);
    let mut options = ConvertOptions::new().with_store_options(store);
    if let Some(dir) = &cli.output_dir {
        options = options.with_output_dir(dir.clone());
    }
    options
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
