//! HDF5 superblock signature detection.
//!
//! The superblock may sit behind a user block, so the signature is searched
//! at offset 0 and then at every power of two from 512 up to the file length.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Format signature at the start of every HDF5 superblock.
pub const HDF5_SIGNATURE: [u8; 8] = *b"\x89HDF\r\n\x1a\n";

/// First non-zero offset at which a superblock may start.
const FIRST_USER_BLOCK_OFFSET: u64 = 512;

/// Whether `path` carries an HDF5 superblock signature.
pub fn has_hdf5_signature(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let mut window = [0u8; HDF5_SIGNATURE.len()];
    let mut offset = 0u64;
    while offset + HDF5_SIGNATURE.len() as u64 <= len {
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut window)?;
        if window == HDF5_SIGNATURE {
            return Ok(true);
        }
        offset = if offset == 0 {
            FIRST_USER_BLOCK_OFFSET
        } else {
            offset * 2
        };
    }
    Ok(false)
}
