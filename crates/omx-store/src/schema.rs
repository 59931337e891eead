//! OMX layout inside the HDF5 file.
//!
//! ```text
//! /                 OMX_VERSION = "0.2", SHAPE = [rows, cols]
//! /data/<table>     f64 rows x cols, chunks of 1 x cols, deflate
//!                   CUBE_MAT_NUMBER = declared position, NAME = description
//! /lookup           reserved for per-zone lookup vectors
//! ```

use hdf5::types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode};
use hdf5::{Attribute, Location};

/// Format version written to new containers.
pub const OMX_VERSION: &str = "0.2";

/// Root attribute holding the format version.
pub const ATTR_VERSION: &str = "OMX_VERSION";

/// Root attribute holding `[rows, cols]`.
pub const ATTR_SHAPE: &str = "SHAPE";

/// Dataset attribute holding the declared legacy position.
pub const ATTR_POSITION: &str = "CUBE_MAT_NUMBER";

/// Dataset attribute holding a descriptive name.
pub const ATTR_DESCRIPTION: &str = "NAME";

/// Group holding one dataset per table.
pub const DATA_GROUP: &str = "data";

/// Group reserved for per-zone lookup data.
pub const LOOKUP_GROUP: &str = "lookup";

/// Longest fixed-length string attribute read back.
const MAX_FIXED_STRING: usize = 256;

/// Whether `location` carries an attribute called `name`.
pub fn has_attr(location: &Location, name: &str) -> hdf5::Result<bool> {
    Ok(location.attr_names()?.iter().any(|attr| attr == name))
}

/// Read a scalar string attribute in any of the HDF5 string encodings.
pub fn read_string(attr: &Attribute) -> hdf5::Result<String> {
    let text = match attr.dtype()?.to_descriptor()? {
        TypeDescriptor::VarLenUnicode => attr.read_scalar::<VarLenUnicode>()?.as_str().to_owned(),
        TypeDescriptor::VarLenAscii => attr.read_scalar::<VarLenAscii>()?.as_str().to_owned(),
        TypeDescriptor::FixedUnicode(_) => attr
            .read_scalar::<FixedUnicode<MAX_FIXED_STRING>>()?
            .as_str()
            .to_owned(),
        _ => attr
            .read_scalar::<FixedAscii<MAX_FIXED_STRING>>()?
            .as_str()
            .to_owned(),
    };
    Ok(text)
}

/// Write `OMX_VERSION` as a fixed-length ASCII string.
pub fn write_version(location: &Location, version: &str) -> hdf5::Result<()> {
    let value = FixedAscii::<16>::from_ascii(version)
        .map_err(|err| hdf5::Error::from(format!("version '{version}': {err}")))?;
    location
        .new_attr::<FixedAscii<16>>()
        .create(ATTR_VERSION)?
        .write_scalar(&value)
}

/// Write `SHAPE` as a two-element integer vector.
pub fn write_shape(location: &Location, rows: i32, cols: i32) -> hdf5::Result<()> {
    location
        .new_attr::<i32>()
        .shape(2)
        .create(ATTR_SHAPE)?
        .write_raw(&[rows, cols][..])
}

/// Read `SHAPE`, or `None` when it is not two positive integers.
pub fn read_shape(location: &Location) -> hdf5::Result<Option<(usize, usize)>> {
    let values = location.attr(ATTR_SHAPE)?.read_raw::<i64>()?;
    let shape = match values[..] {
        [rows, cols] if rows > 0 && cols > 0 => Some((rows as usize, cols as usize)),
        _ => None,
    };
    Ok(shape)
}

/// Read the declared position of a dataset, `None` when absent.
pub fn read_position(location: &Location) -> hdf5::Result<Option<i64>> {
    if !has_attr(location, ATTR_POSITION)? {
        return Ok(None);
    }
    let values = location.attr(ATTR_POSITION)?.read_raw::<i64>()?;
    Ok(values.first().copied())
}

/// Replace the declared position of a dataset, or remove it.
pub fn write_position(location: &Location, position: Option<i32>) -> hdf5::Result<()> {
    if has_attr(location, ATTR_POSITION)? {
        location.delete_attr(ATTR_POSITION)?;
    }
    if let Some(position) = position {
        location
            .new_attr::<i32>()
            .create(ATTR_POSITION)?
            .write_scalar(&position)?;
    }
    Ok(())
}

/// Read the descriptive name of a dataset, `None` when absent.
pub fn read_description(location: &Location) -> hdf5::Result<Option<String>> {
    if !has_attr(location, ATTR_DESCRIPTION)? {
        return Ok(None);
    }
    read_string(&location.attr(ATTR_DESCRIPTION)?).map(Some)
}

/// Replace the descriptive name of a dataset.
pub fn write_description(location: &Location, description: &str) -> hdf5::Result<()> {
    let value: VarLenUnicode = description
        .parse()
        .map_err(|err| hdf5::Error::from(format!("description '{description}': {err}")))?;
    if has_attr(location, ATTR_DESCRIPTION)? {
        location.delete_attr(ATTR_DESCRIPTION)?;
    }
    location
        .new_attr::<VarLenUnicode>()
        .create(ATTR_DESCRIPTION)?
        .write_scalar(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scratch() -> (TempDir, hdf5::File) {
        let dir = TempDir::new().unwrap();
        let file = hdf5::File::create(dir.path().join("s.h5")).unwrap();
        (dir, file)
    }

    #[test]
    fn test_version_round_trip() {
        let (_dir, file) = scratch();
        write_version(&file, OMX_VERSION).unwrap();
        assert!(has_attr(&file, ATTR_VERSION).unwrap());
        assert_eq!(read_string(&file.attr(ATTR_VERSION).unwrap()).unwrap(), "0.2");
    }

    #[test]
    fn test_variable_length_version_is_read() {
        let (_dir, file) = scratch();
        let value: VarLenUnicode = "0.2".parse().unwrap();
        file.new_attr::<VarLenUnicode>()
            .create(ATTR_VERSION)
            .unwrap()
            .write_scalar(&value)
            .unwrap();
        assert_eq!(read_string(&file.attr(ATTR_VERSION).unwrap()).unwrap(), "0.2");
    }

    #[test]
    fn test_shape_round_trip() {
        let (_dir, file) = scratch();
        write_shape(&file, 7, 7).unwrap();
        assert_eq!(read_shape(&file).unwrap(), Some((7, 7)));
        assert!(!has_attr(&file, ATTR_VERSION).unwrap());
    }

    #[test]
    fn test_malformed_shape() {
        let (_dir, file) = scratch();
        file.new_attr::<i32>()
            .shape(3)
            .create(ATTR_SHAPE)
            .unwrap()
            .write_raw(&[2, 2, 2][..])
            .unwrap();
        assert_eq!(read_shape(&file).unwrap(), None);
    }

    #[test]
    fn test_position_replace_and_remove() {
        let (_dir, file) = scratch();
        let group = file.create_group(DATA_GROUP).unwrap();
        assert_eq!(read_position(&group).unwrap(), None);
        write_position(&group, Some(3)).unwrap();
        write_position(&group, Some(4)).unwrap();
        assert_eq!(read_position(&group).unwrap(), Some(4));
        write_position(&group, None).unwrap();
        assert_eq!(read_position(&group).unwrap(), None);
    }

    #[test]
    fn test_description_replace() {
        let (_dir, file) = scratch();
        write_description(&file, "single occupancy").unwrap();
        write_description(&file, "sov").unwrap();
        assert_eq!(read_description(&file).unwrap().as_deref(), Some("sov"));
    }
}
