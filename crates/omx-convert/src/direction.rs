//! Conversion direction and output naming.

use std::fmt;
use std::path::{Path, PathBuf};

use omx_store::{ContainerProbe, probe_container};

use crate::error::{ConvertError, Result};

/// Extension given to container outputs.
pub const CONTAINER_EXTENSION: &str = "omx";

/// Which way a file is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// OMX container in, legacy matrix out.
    ContainerToLegacy,
    /// Legacy matrix in, OMX container out.
    LegacyToContainer,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContainerToLegacy => write!(f, "omx -> legacy"),
            Self::LegacyToContainer => write!(f, "legacy -> omx"),
        }
    }
}

/// Decide the direction for `path` by probing its content.
///
/// HDF5 files must also carry an `OMX_VERSION` root attribute. Anything
/// without the HDF5 signature is assumed to be a legacy matrix.
pub fn detect_direction(path: &Path) -> Result<Direction> {
    if !path.exists() {
        return Err(ConvertError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }
    match probe_container(path)? {
        ContainerProbe::Container { .. } => Ok(Direction::ContainerToLegacy),
        ContainerProbe::NotContainer => Ok(Direction::LegacyToContainer),
        ContainerProbe::MissingVersion => Err(ConvertError::NotAnOmxContainer {
            path: path.to_path_buf(),
        }),
    }
}

/// Output path for converting `input` in `direction`.
///
/// The input's extension is replaced by `omx` or `legacy_extension`. When
/// `output_dir` is set the file is placed there instead of beside the input.
pub fn output_path_for(
    input: &Path,
    direction: Direction,
    legacy_extension: &str,
    output_dir: Option<&Path>,
) -> PathBuf {
    let extension = match direction {
        Direction::ContainerToLegacy => legacy_extension,
        Direction::LegacyToContainer => CONTAINER_EXTENSION,
    };
    let renamed = input.with_extension(extension);
    match (output_dir, renamed.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => renamed,
    }
}
