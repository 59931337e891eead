//! OMX matrix container.
//!
//! This crate stores sets of named square `zones x zones` double matrices in
//! an OMX file, an HDF5 file with a fixed layout, and streams them one row at
//! a time.
//!
//! # Features
//!
//! - Root attributes `OMX_VERSION` and `SHAPE`, a `/data` group with one dataset
//!   per table and a reserved `/lookup` group
//! - One deflate-compressed chunk per row, fill value `0.0` for unwritten rows
//! - Declared legacy position (`CUBE_MAT_NUMBER`) stamped on every table
//! - Table enumeration by name for opened containers
//!
//! # Example
//!
//! ```no_run
//! use omx_store::MatrixStore;
//!
//! let mut store = MatrixStore::create("trips.omx", 3, 3, &["HOV", "SOV"]).unwrap();
//! store.write_row("SOV", 1, &[5.0, 0.0, 0.0]).unwrap();
//! store.close().unwrap();
//!
//! let mut store = MatrixStore::open("trips.omx").unwrap();
//! let mut row = store.allocate_row_buffer();
//! store.get_row("SOV", 1, &mut row).unwrap();
//! assert_eq!(&row[..3], &[5.0, 0.0, 0.0]);
//! ```

mod error;
mod file;
mod options;
mod probe;
pub mod schema;
pub mod signature;
pub mod space;
mod store;

pub use error::{Result, StoreError};
pub use file::OpenMode;
pub use options::{DEFAULT_COMPRESSION_LEVEL, DEFAULT_MAX_TABLES, DEFAULT_ROW_SLACK, StoreOptions};
pub use probe::{ContainerProbe, probe_container};
pub use store::{MatrixStore, TableHandle, TableInfo};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
