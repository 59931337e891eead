//! Converting a list of files.
//!
//! Each input is converted independently: a failure is recorded and the
//! batch moves on to the next file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use omx_convert::{ConvertOptions, convert_file};
use omx_legacy::LegacyDriver;
use tracing::{error, info, info_span};

use crate::types::{BatchResult, FileOutcome};

const PROGRESS_TEMPLATE: &str =
    "{msg:>20} [{elapsed_precise}] [{bar:40.cyan/blue}] zone {pos}/{len} ({eta})";

/// Options for one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Options shared by every conversion in the batch.
    pub convert: ConvertOptions,
    /// Draw a per-zone progress bar on stderr.
    pub show_progress: bool,
}

impl BatchOptions {
    #[must_use]
    pub fn new(convert: ConvertOptions) -> Self {
        Self {
            convert,
            show_progress: false,
        }
    }

    #[must_use]
    pub fn with_progress_bar(mut self, enable: bool) -> Self {
        self.show_progress = enable;
        self
    }
}

/// Convert every file in `inputs`, calling `on_file` as each one finishes.
pub fn run_batch<D, F>(
    inputs: &[PathBuf],
    driver: &D,
    options: &BatchOptions,
    mut on_file: F,
) -> BatchResult
where
    D: LegacyDriver,
    F: FnMut(&FileOutcome),
{
    let mut result = BatchResult::default();
    for input in inputs {
        let span = info_span!("file", path = %input.display());
        let _guard = span.enter();

        let bar = progress_bar(input, options.show_progress);
        let mut convert = options.convert.clone();
        if options.show_progress {
            let zones_bar = bar.clone();
            convert = convert.with_progress(move |progress| {
                zones_bar.set_length(progress.zones as u64);
                zones_bar.set_position(progress.zone as u64);
            });
        }

        let outcome = FileOutcome {
            input: input.clone(),
            result: convert_file(input, driver, &convert),
        };
        bar.finish_and_clear();

        match &outcome.result {
            Ok(report) => info!(
                destination = %report.destination.display(),
                direction = %report.direction,
                "converted"
            ),
            Err(err) => error!(error = %err, "conversion failed"),
        }
        on_file(&outcome);
        result.outcomes.push(outcome);
    }
    result
}

fn progress_bar(input: &Path, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    let bar = ProgressBar::new(0).with_style(style);
    let label = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    bar.set_message(label);
    bar.enable_steady_tick(Duration::from_millis(200));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_template_parses() {
        assert!(ProgressStyle::with_template(PROGRESS_TEMPLATE).is_ok());
    }

    #[test]
    fn test_empty_batch() {
        let result = run_batch(
            &[],
            &omx_legacy::RowRecordDriver::default(),
            &BatchOptions::default(),
            |_| panic!("no files"),
        );
        assert_eq!(result.total(), 0);
        assert_eq!(result.exit_code(), 0);
        assert_eq!(result.closing_line(), "Done; 0 errors and 0 of 0 completed.");
    }
}
