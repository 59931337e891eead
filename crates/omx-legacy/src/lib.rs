//! Positional legacy matrix files.
//!
//! The legacy format addresses tables by position rather than by name. This
//! crate defines the boundary the converter talks to ([`LegacyDriver`],
//! [`LegacyReader`], [`LegacyWriter`]) and ships [`RowRecordDriver`], a
//! row-record file that follows the same access pattern: a header announcing
//! zones and table names, then append-only rows written zone by zone.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use omx_legacy::{LegacyDriver, LegacyReader, LegacyWriter, RowRecordDriver};
//!
//! let names = vec!["HOV".to_string(), "SOV".to_string()];
//! let mut sink = RowRecordDriver::default().create(Path::new("trips.mat"), &names, 3).unwrap();
//! let mut row = sink.allocate_row_buffer();
//! row[0] = 5.0;
//! sink.write_row(2, 1, &row).unwrap();
//! sink.close().unwrap();
//!
//! let mut source = RowRecordDriver::default().open(Path::new("trips.mat")).unwrap();
//! source.get_row(2, 1, &mut row).unwrap();
//! assert_eq!(row[0], 5.0);
//! ```

mod driver;
mod error;
pub mod record;

pub use driver::{DEFAULT_ROW_SLACK, LegacyDriver, LegacyReader, LegacyWriter};
pub use error::{LegacyError, Result};
pub use record::{RowRecordDriver, RowRecordReader, RowRecordWriter};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
