//! Error types for legacy matrix files.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by legacy readers, writers and drivers.
#[derive(Debug, Error)]
pub enum LegacyError {
    /// The file could not be opened or created.
    #[error("cannot open or create legacy matrix {path}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file does not follow the expected layout.
    #[error("invalid legacy matrix {path}: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    /// The announced table set cannot be written.
    #[error("invalid table set: {reason}")]
    InvalidTableSet { reason: String },

    /// Table position outside `1..=tables`.
    #[error("table position {position} is outside 1..={tables}")]
    NoSuchTable { position: usize, tables: usize },

    /// Zone outside `1..=zones`.
    #[error("zone {zone} is outside 1..={zones}")]
    ZoneOutOfRange { zone: usize, zones: usize },

    /// Column outside `1..=zones`.
    #[error("column {col} is outside 1..={zones}")]
    ColumnOutOfRange { col: usize, zones: usize },

    /// Caller buffer is shorter than one row.
    #[error("row buffer holds {actual} values, need at least {expected}")]
    BufferTooSmall { expected: usize, actual: usize },

    /// A row could not be read.
    #[error("could not read table {position}, zone {zone}")]
    RowRead {
        position: usize,
        zone: usize,
        #[source]
        source: std::io::Error,
    },

    /// A row could not be written.
    #[error("could not write table {position}, zone {zone}")]
    RowWrite {
        position: usize,
        zone: usize,
        #[source]
        source: std::io::Error,
    },

    /// Rows must be written zone by zone, table by table.
    #[error(
        "row (table {position}, zone {zone}) after (table {last_position}, zone {last_zone})"
    )]
    OutOfOrder {
        position: usize,
        zone: usize,
        last_position: usize,
        last_zone: usize,
    },

    /// Operation attempted after `close`.
    #[error("legacy matrix is closed")]
    Closed,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for legacy matrix operations.
pub type Result<T> = std::result::Result<T, LegacyError>;

impl LegacyError {
    /// Create a FileOpen error.
    pub fn file_open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileOpen {
            path: path.into(),
            source,
        }
    }

    /// Create an InvalidFormat error.
    pub fn invalid_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this is the "cannot open" condition.
    pub fn is_file_open(&self) -> bool {
        matches!(self, Self::FileOpen { .. })
    }

    /// Whether this error happened while moving row data.
    pub fn is_row_io(&self) -> bool {
        matches!(self, Self::RowRead { .. } | Self::RowWrite { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LegacyError::ZoneOutOfRange { zone: 9, zones: 3 };
        assert_eq!(format!("{err}"), "zone 9 is outside 1..=3");

        let err = LegacyError::OutOfOrder {
            position: 1,
            zone: 1,
            last_position: 2,
            last_zone: 1,
        };
        assert!(format!("{err}").contains("after (table 2, zone 1)"));
    }

    #[test]
    fn test_classification() {
        let io = || std::io::Error::other("boom");
        assert!(LegacyError::file_open("x.mat", io()).is_file_open());
        let err = LegacyError::RowRead {
            position: 2,
            zone: 5,
            source: io(),
        };
        assert!(err.is_row_io());
        assert!(!err.is_file_open());
    }
}
