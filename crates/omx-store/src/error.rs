//! Error types for OMX container operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when creating, opening, or streaming an OMX container.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The container file could not be opened or created.
    #[error("cannot open or create {path}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file carries no HDF5 superblock signature.
    #[error("{path} is not an OMX container (no HDF5 signature)")]
    NotAContainer { path: PathBuf },

    /// The container lacks required metadata or the metadata is malformed.
    #[error("invalid OMX container {path}: {message}")]
    Schema { path: PathBuf, message: String },

    /// Requested shape cannot be stored.
    #[error("invalid matrix shape {rows}x{cols}: matrices must be square and non-empty")]
    InvalidShape { rows: usize, cols: usize },

    /// Table name cannot be used as a dataset name.
    #[error("invalid table name '{name}'")]
    InvalidTableName { name: String },

    /// The same table name was announced twice.
    #[error("duplicate table name '{name}'")]
    DuplicateTable { name: String },

    /// More tables than the configured limit.
    #[error("{count} tables exceeds the configured limit of {limit}")]
    TooManyTables { count: usize, limit: usize },

    /// Row operation addressed an unknown table.
    #[error("no such table '{name}'")]
    NoSuchTable { name: String },

    /// Row index outside `1..=rows`.
    #[error("row {row} of table '{table}' is outside 1..={rows}")]
    RowOutOfRange {
        table: String,
        row: usize,
        rows: usize,
    },

    /// Column index outside `1..=cols`.
    #[error("column {col} of table '{table}' is outside 1..={cols}")]
    ColumnOutOfRange {
        table: String,
        col: usize,
        cols: usize,
    },

    /// Caller buffer is shorter than one row.
    #[error("row buffer holds {actual} values, need at least {expected}")]
    BufferTooSmall { expected: usize, actual: usize },

    /// A row selection or transfer failed.
    #[error("row I/O failed for table '{table}', row {row}: {message}")]
    RowIo {
        table: String,
        row: usize,
        message: String,
        #[source]
        source: Option<hdf5::Error>,
    },

    /// Write attempted on a store opened for reading.
    #[error("container {path} is open read-only")]
    ReadOnly { path: PathBuf },

    /// Operation attempted after `close`.
    #[error("container is closed")]
    Closed,

    /// The HDF5 library refused an operation.
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for container operations.
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Create a FileOpen error.
    pub fn file_open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileOpen {
            path: path.into(),
            source,
        }
    }

    /// Create a Schema error.
    pub fn schema(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a NoSuchTable error.
    pub fn no_such_table(name: impl Into<String>) -> Self {
        Self::NoSuchTable { name: name.into() }
    }

    /// Create a RowIo error without an underlying I/O cause.
    pub fn row_io(table: impl Into<String>, row: usize, message: impl Into<String>) -> Self {
        Self::RowIo {
            table: table.into(),
            row,
            message: message.into(),
            source: None,
        }
    }

    /// Create a RowIo error wrapping an HDF5 failure.
    pub fn row_io_from(table: impl Into<String>, row: usize, source: hdf5::Error) -> Self {
        Self::RowIo {
            table: table.into(),
            row,
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Whether this error means the file could not be used at all.
    pub fn is_file_open(&self) -> bool {
        matches!(self, Self::FileOpen { .. } | Self::NotAContainer { .. })
    }

    /// Whether this error happened while moving row data.
    pub fn is_row_io(&self) -> bool {
        matches!(self, Self::RowIo { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::no_such_table("SOV");
        assert_eq!(format!("{err}"), "no such table 'SOV'");

        let err = StoreError::InvalidShape { rows: 3, cols: 4 };
        assert!(format!("{err}").contains("3x4"));
    }

    #[test]
    fn test_row_io_context() {
        let err = StoreError::row_io_from("HOV", 7, hdf5::Error::from("short read"));
        let text = format!("{err}");
        assert!(text.contains("HOV"));
        assert!(text.contains("row 7"));
        assert!(text.contains("short read"));
        assert!(err.is_row_io());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: StoreError = io_err.into();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
