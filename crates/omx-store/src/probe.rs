//! Container detection.

use std::path::Path;

use tracing::debug;

use crate::error::{Result, StoreError};
use crate::file::open_hdf5;
use crate::schema::{ATTR_VERSION, has_attr, read_string};

/// What a probe found at a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerProbe {
    /// An HDF5 file carrying an `OMX_VERSION` root attribute.
    Container { version: String },
    /// An HDF5 file without `OMX_VERSION`.
    MissingVersion,
    /// No HDF5 signature.
    NotContainer,
}

/// Inspect `path` without opening it as a store.
///
/// A file that carries the HDF5 signature but that the library cannot open
/// is reported as an error, not as [`ContainerProbe::NotContainer`].
pub fn probe_container(path: impl AsRef<Path>) -> Result<ContainerProbe> {
    let path = path.as_ref();
    let file = match open_hdf5(path) {
        Ok(file) => file,
        Err(StoreError::NotAContainer { .. }) => {
            debug!(path = %path.display(), "no HDF5 signature");
            return Ok(ContainerProbe::NotContainer);
        }
        Err(err) => return Err(err),
    };
    let probe = if has_attr(&file, ATTR_VERSION)? {
        ContainerProbe::Container {
            version: read_string(&file.attr(ATTR_VERSION)?)?,
        }
    } else {
        ContainerProbe::MissingVersion
    };
    debug!(path = %path.display(), ?probe, "probed container");
    Ok(probe)
}
