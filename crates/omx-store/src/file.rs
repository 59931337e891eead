//! Opening and creating the underlying HDF5 file.

use std::io;
use std::path::Path;

use crate::error::{Result, StoreError};
use crate::signature::has_hdf5_signature;

/// How a container was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Freshly created, rows may be written.
    Create,
    /// Existing file, read-only.
    Read,
}

/// Create (or truncate) `path` as an empty HDF5 file.
pub(crate) fn create_hdf5(path: &Path) -> Result<hdf5::File> {
    hdf5::File::create(path).map_err(|err| StoreError::file_open(path, library_error(err)))
}

/// Open `path` read-only after checking it is an HDF5 file at all.
pub(crate) fn open_hdf5(path: &Path) -> Result<hdf5::File> {
    if !has_hdf5_signature(path).map_err(|err| StoreError::file_open(path, err))? {
        return Err(StoreError::NotAContainer {
            path: path.to_path_buf(),
        });
    }
    hdf5::File::open(path).map_err(|err| StoreError::file_open(path, library_error(err)))
}

fn library_error(err: hdf5::Error) -> io::Error {
    io::Error::other(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = open_hdf5(&dir.path().join("absent.omx")).unwrap_err();
        assert!(matches!(err, StoreError::FileOpen { .. }));
    }

    #[test]
    fn test_open_plain_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.omx");
        std::fs::write(&path, b"rows and rows").unwrap();
        assert!(matches!(
            open_hdf5(&path),
            Err(StoreError::NotAContainer { .. })
        ));
    }

    #[test]
    fn test_open_damaged_file_after_signature() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("damaged.omx");
        let mut bytes = crate::signature::HDF5_SIGNATURE.to_vec();
        bytes.extend_from_slice(&[0xff; 200]);
        std::fs::write(&path, bytes).unwrap();
        assert!(matches!(open_hdf5(&path), Err(StoreError::FileOpen { .. })));
    }

    #[test]
    fn test_create_then_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.omx");
        create_hdf5(&path).unwrap().close().unwrap();
        assert!(open_hdf5(&path).is_ok());
    }
}
