//! Legacy format boundary.
//!
//! A legacy matrix addresses tables purely by position (`1..=tables`) and
//! rows by zone (`1..=zones`). Table names are announced once, in positional
//! order, when the file is created.
//!
//! Row buffers crossing this boundary are `zones + row_slack()` doubles long.
//! Row values occupy the first `zones` slots; the slack is reserved for the
//! format's own bookkeeping and is never interpreted by callers.

use std::path::Path;

use crate::error::{LegacyError, Result};

/// Spare doubles reserved at the end of every legacy row buffer.
pub const DEFAULT_ROW_SLACK: usize = 3;

/// Random-access reader over an existing legacy matrix.
pub trait LegacyReader {
    /// Zone count (rows and columns).
    fn zones(&self) -> usize;

    /// Table names in positional order.
    fn table_names(&self) -> &[String];

    /// Number of tables.
    fn table_count(&self) -> usize {
        self.table_names().len()
    }

    /// Spare doubles this format wants at the end of a row buffer.
    fn row_slack(&self) -> usize {
        DEFAULT_ROW_SLACK
    }

    /// A zeroed buffer of `zones + row_slack` doubles.
    fn allocate_row_buffer(&self) -> Vec<f64> {
        vec![0.0; self.zones() + self.row_slack()]
    }

    /// Read table `position`, row `zone` into the first `zones` slots of `out`.
    fn get_row(&mut self, position: usize, zone: usize, out: &mut [f64]) -> Result<()>;

    /// Read a single cell (1-based column).
    fn get_value(&mut self, position: usize, zone: usize, col: usize) -> Result<f64> {
        let zones = self.zones();
        if col == 0 || col > zones {
            return Err(LegacyError::ColumnOutOfRange { col, zones });
        }
        let mut row = self.allocate_row_buffer();
        self.get_row(position, zone, &mut row)?;
        Ok(row[col - 1])
    }

    /// Release the file. Calling `close` again is a no-op.
    fn close(&mut self) -> Result<()>;
}

/// Append-only writer for a new legacy matrix.
///
/// Rows are written zone by zone and, within a zone, table by table.
pub trait LegacyWriter {
    /// Zone count (rows and columns).
    fn zones(&self) -> usize;

    /// Table names in positional order, as announced at creation.
    fn table_names(&self) -> &[String];

    /// Number of tables.
    fn table_count(&self) -> usize {
        self.table_names().len()
    }

    /// Spare doubles this format wants at the end of a row buffer.
    fn row_slack(&self) -> usize {
        DEFAULT_ROW_SLACK
    }

    /// A zeroed buffer of `zones + row_slack` doubles.
    fn allocate_row_buffer(&self) -> Vec<f64> {
        vec![0.0; self.zones() + self.row_slack()]
    }

    /// Write the first `zones` slots of `values` as table `position`, row `zone`.
    fn write_row(&mut self, position: usize, zone: usize, values: &[f64]) -> Result<()>;

    /// Finish the file. Calling `close` again is a no-op.
    fn close(&mut self) -> Result<()>;
}

/// Entry points of a legacy format implementation.
pub trait LegacyDriver {
    /// Reader type returned by [`LegacyDriver::open`].
    type Reader: LegacyReader;
    /// Writer type returned by [`LegacyDriver::create`].
    type Writer: LegacyWriter;

    /// Short human-readable format name.
    fn name(&self) -> &'static str;

    /// File extension (without the dot) used for files in this format.
    fn extension(&self) -> &'static str {
        "mat"
    }

    /// Open an existing file for reading.
    ///
    /// Fails with [`LegacyError::FileOpen`] when the path cannot be used.
    fn open(&self, path: &Path) -> Result<Self::Reader>;

    /// Create a new file announcing `names` in positional order.
    fn create(&self, path: &Path, names: &[String], zones: usize) -> Result<Self::Writer>;
}
