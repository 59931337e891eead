//! Error types for conversions.

use std::path::PathBuf;

use omx_legacy::LegacyError;
use omx_store::StoreError;
use thiserror::Error;

use crate::order::OrderingError;

/// Which side of a row transfer failed.
#[derive(Debug, Error)]
pub enum RowFault {
    /// Failure in the container.
    #[error(transparent)]
    Store(StoreError),
    /// Failure in the legacy file.
    #[error(transparent)]
    Legacy(LegacyError),
}

/// Errors that can occur while converting one file.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Container could not be opened, created, or validated.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Legacy file could not be opened or created.
    #[error(transparent)]
    Legacy(#[from] LegacyError),

    /// Declared table positions are unusable; nothing was written.
    #[error(transparent)]
    Ordering(#[from] OrderingError),

    /// A row failed mid-copy; `partial_output` is left on disk incomplete.
    #[error(
        "row transfer failed for table '{table}', zone {zone}; {} is incomplete",
        .partial_output.display()
    )]
    RowTransfer {
        table: String,
        zone: usize,
        partial_output: PathBuf,
        #[source]
        source: RowFault,
    },

    /// The file has the container signature but no format version.
    #[error("{path} has a container signature but is not a valid OMX file")]
    NotAnOmxContainer { path: PathBuf },

    /// The output path would overwrite the input.
    #[error("refusing to overwrite input {path}")]
    SameOutput { path: PathBuf },

    /// Input path does not exist.
    #[error("input file not found: {path}")]
    SourceNotFound { path: PathBuf },
}

/// Result type alias for conversions.
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    /// Whether the destination may exist on disk in an incomplete state.
    pub fn left_partial_output(&self) -> bool {
        matches!(self, Self::RowTransfer { .. })
    }

    /// Whether the input could not be used at all.
    pub fn is_file_open(&self) -> bool {
        match self {
            Self::Store(err) => err.is_file_open(),
            Self::Legacy(err) => err.is_file_open(),
            Self::SourceNotFound { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderFault;

    #[test]
    fn test_row_transfer_display() {
        let err = ConvertError::RowTransfer {
            table: "SOV".to_string(),
            zone: 12,
            partial_output: PathBuf::from("out.omx"),
            source: RowFault::Legacy(LegacyError::Closed),
        };
        let text = err.to_string();
        assert!(text.contains("'SOV'"));
        assert!(text.contains("zone 12"));
        assert!(text.contains("out.omx is incomplete"));
        assert!(err.left_partial_output());
    }

    #[test]
    fn test_ordering_lists_every_fault() {
        let err: ConvertError = OrderingError {
            faults: vec![
                OrderFault::MissingAttribute {
                    table: "A".to_string(),
                },
                OrderFault::MissingAttribute {
                    table: "B".to_string(),
                },
            ],
        }
        .into();
        let text = err.to_string();
        assert!(text.contains("'A'"));
        assert!(text.contains("'B'"));
        assert!(!err.left_partial_output());
    }
}
