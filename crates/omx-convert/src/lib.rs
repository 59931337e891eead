//! Conversion between OMX containers and positional legacy matrices.
//!
//! [`convert_file`] probes an input, picks the direction and streams every
//! table row by row into a new file next to it (or into an output
//! directory). Container tables are mapped onto legacy positions with
//! [`reconcile_order`], which reports every missing or duplicated position
//! at once.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use omx_convert::{ConvertOptions, convert_file};
//! use omx_legacy::RowRecordDriver;
//!
//! let driver = RowRecordDriver::default();
//! let report = convert_file(Path::new("trips.omx"), &driver, &ConvertOptions::new()).unwrap();
//! println!("{} -> {}", report.source.display(), report.destination.display());
//! ```

mod direction;
mod engine;
mod error;
mod order;

pub use direction::{CONTAINER_EXTENSION, Direction, detect_direction, output_path_for};
pub use engine::{
    ConversionReport, ConvertOptions, ProgressFn, ZoneProgress, container_to_legacy,
    convert_file, legacy_to_container,
};
pub use error::{ConvertError, Result, RowFault};
pub use order::{OrderFault, OrderingError, TableOrder, reconcile_order};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
