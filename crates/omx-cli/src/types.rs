//! Batch results.

use std::path::PathBuf;

use omx_convert::{ConversionReport, ConvertError};

/// Result of converting one input file.
#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub result: Result<ConversionReport, ConvertError>,
}

impl FileOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes for every file of one invocation, in argument order.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.completed()
    }

    /// Process exit status: the failure count, saturated at 255.
    ///
    /// Exit statuses are truncated to eight bits, so 256 failures must not
    /// wrap around to success.
    pub fn exit_code(&self) -> i32 {
        i32::try_from(self.failed().min(255)).unwrap_or(255)
    }

    /// `Done; E errors and C of N completed.`
    pub fn closing_line(&self) -> String {
        format!(
            "Done; {} errors and {} of {} completed.",
            self.failed(),
            self.completed(),
            self.total()
        )
    }
}
