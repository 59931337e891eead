//! The matrix store.
//!
//! A [`MatrixStore`] owns one open OMX (HDF5) file and streams whole rows in
//! and out of its tables. Per-table resources are acquired on first touch and
//! cached until [`MatrixStore::close`]:
//!
//! - a [`TableHandle`] holding the table's open HDF5 dataset,
//! - a [`Dataspace`] describing the table's extent and current row selection,
//! - one shared [`Memspace`] of exactly `cols` doubles used for every transfer.
//!
//! Rows live in `1 x cols` chunks, so rewriting a row replaces its chunk in
//! place when the encoded size is unchanged. Otherwise HDF5 moves the chunk
//! and returns the old space to its free-space manager for later chunks.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use hdf5::types::{FloatSize, TypeDescriptor};
use hdf5::{Dataset, Group};
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::file::{OpenMode, create_hdf5, open_hdf5};
use crate::options::StoreOptions;
use crate::schema::{
    ATTR_SHAPE, ATTR_VERSION, DATA_GROUP, LOOKUP_GROUP, OMX_VERSION, has_attr, read_description,
    read_position, read_shape, read_string, write_description, write_position, write_shape,
    write_version,
};
use crate::space::{Dataspace, Hyperslab, Memspace, RowSlice};

/// Public view of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    /// Dataset name, unique within the container.
    pub name: String,
    /// Declared legacy position, when the dataset carries one.
    pub position: Option<i64>,
    /// Optional descriptive name.
    pub description: Option<String>,
}

/// Cached reference to an open dataset.
#[derive(Debug, Clone)]
pub struct TableHandle {
    dataset: Dataset,
}

impl TableHandle {
    /// The open HDF5 dataset.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }
}

/// An open OMX container.
#[derive(Debug)]
pub struct MatrixStore {
    path: PathBuf,
    mode: OpenMode,
    options: StoreOptions,
    rows: usize,
    cols: usize,
    version: String,
    tables: Vec<TableInfo>,
    file: Option<hdf5::File>,
    handles: HashMap<String, TableHandle>,
    dataspaces: HashMap<String, Dataspace>,
    memspace: Option<Memspace>,
}

impl MatrixStore {
    /// Create a container with default options.
    ///
    /// See [`MatrixStore::create_with_options`].
    pub fn create<S: AsRef<str>>(
        path: impl AsRef<Path>,
        rows: usize,
        cols: usize,
        table_names: &[S],
    ) -> Result<Self> {
        Self::create_with_options(path, rows, cols, table_names, StoreOptions::default())
    }

    /// Create a container holding one all-zero table per name.
    ///
    /// Tables are created in the order given and each is stamped with its
    /// 1-based creation position. An existing file at `path` is replaced.
    pub fn create_with_options<S: AsRef<str>>(
        path: impl AsRef<Path>,
        rows: usize,
        cols: usize,
        table_names: &[S],
        options: StoreOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        let extent = i32::try_from(rows).ok().filter(|_| rows == cols && rows > 0);
        let Some(extent) = extent else {
            return Err(StoreError::InvalidShape { rows, cols });
        };
        if table_names.len() > options.max_tables {
            return Err(StoreError::TooManyTables {
                count: table_names.len(),
                limit: options.max_tables,
            });
        }

        let mut seen = HashSet::with_capacity(table_names.len());
        for name in table_names {
            let name = name.as_ref();
            validate_table_name(name)?;
            if !seen.insert(name) {
                return Err(StoreError::DuplicateTable {
                    name: name.to_string(),
                });
            }
        }

        let file = create_hdf5(path)?;
        write_version(&file, OMX_VERSION)?;
        write_shape(&file, extent, extent)?;
        let data = file.create_group(DATA_GROUP)?;
        file.create_group(LOOKUP_GROUP)?;

        let mut tables = Vec::with_capacity(table_names.len());
        for (idx, name) in table_names.iter().enumerate() {
            let name = name.as_ref();
            let position = idx as i32 + 1;
            let dataset = create_table(&data, name, rows, cols, options.compression_level)?;
            write_position(&dataset, Some(position))?;
            tables.push(TableInfo {
                name: name.to_string(),
                position: Some(i64::from(position)),
                description: None,
            });
        }

        info!(
            path = %path.display(),
            zones = rows,
            tables = tables.len(),
            "created container"
        );

        Ok(Self {
            path: path.to_path_buf(),
            mode: OpenMode::Create,
            options,
            rows,
            cols,
            version: OMX_VERSION.to_string(),
            tables,
            file: Some(file),
            handles: HashMap::new(),
            dataspaces: HashMap::new(),
            memspace: None,
        })
    }

    /// Open an existing container read-only with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, StoreOptions::default())
    }

    /// Open an existing container read-only.
    ///
    /// Tables are enumerated in name order, the order HDF5 lists the members
    /// of the data group.
    pub fn open_with_options(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = open_hdf5(path)?;

        if !has_attr(&file, ATTR_VERSION)? {
            return Err(StoreError::schema(path, "missing OMX_VERSION attribute"));
        }
        let version = read_string(&file.attr(ATTR_VERSION)?).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "unreadable OMX_VERSION attribute");
            String::new()
        });
        if !has_attr(&file, ATTR_SHAPE)? {
            return Err(StoreError::schema(path, "missing SHAPE attribute"));
        }
        let (rows, cols) = read_shape(&file)?
            .ok_or_else(|| StoreError::schema(path, "malformed SHAPE attribute"))?;
        if rows != cols {
            return Err(StoreError::schema(
                path,
                format!("shape {rows}x{cols} is not square"),
            ));
        }
        let data = file
            .group(DATA_GROUP)
            .map_err(|_| StoreError::schema(path, "missing /data group"))?;

        let names = data.member_names()?;
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let dataset = data
                .dataset(&name)
                .map_err(|_| StoreError::schema(path, format!("/data/{name} is not a dataset")))?;
            let shape = dataset.shape();
            if shape != [rows, cols] {
                return Err(StoreError::schema(
                    path,
                    format!("table '{name}' has shape {shape:?}, container shape is {rows}x{cols}"),
                ));
            }
            let dtype = dataset.dtype()?.to_descriptor()?;
            if dtype != TypeDescriptor::Float(FloatSize::U8) {
                return Err(StoreError::schema(
                    path,
                    format!("table '{name}' has element type {dtype:?}"),
                ));
            }
            let position = read_position(&dataset).unwrap_or_else(|err| {
                warn!(table = %name, error = %err, "unreadable declared position");
                None
            });
            tables.push(TableInfo {
                position,
                description: read_description(&dataset)?,
                name,
            });
        }
        if tables.len() > options.max_tables {
            warn!(
                path = %path.display(),
                tables = tables.len(),
                limit = options.max_tables,
                "container holds more tables than the configured limit"
            );
        }

        info!(
            path = %path.display(),
            version = %version,
            zones = rows,
            tables = tables.len(),
            "opened container"
        );

        Ok(Self {
            path: path.to_path_buf(),
            mode: OpenMode::Read,
            options,
            rows,
            cols,
            version,
            tables,
            file: Some(file),
            handles: HashMap::new(),
            dataspaces: HashMap::new(),
            memspace: None,
        })
    }

    /// Path of the container file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the store was created or opened.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Whether [`MatrixStore::close`] has not yet run.
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Value of the `OMX_VERSION` root attribute.
    pub fn format_version(&self) -> &str {
        &self.version
    }

    /// Row count.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column count.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Zone count (rows and columns are equal).
    pub fn zones(&self) -> usize {
        self.rows
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of tables.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Tables in enumeration order: creation order for a created store,
    /// name order for an opened one.
    pub fn tables(&self) -> &[TableInfo] {
        &self.tables
    }

    /// Table names in enumeration order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// Look up one table.
    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Declared position of `name`, when recorded.
    pub fn declared_position(&self, name: &str) -> Option<i64> {
        self.table(name).and_then(|t| t.position)
    }

    /// Row buffer slack configured for this store.
    pub fn row_slack(&self) -> usize {
        self.options.row_slack
    }

    /// A zeroed row buffer of `cols + row_slack` doubles.
    pub fn allocate_row_buffer(&self) -> Vec<f64> {
        vec![0.0; self.cols + self.options.row_slack]
    }

    /// Read row `row` (1-based) of `table` into the first `cols` slots of `out`.
    ///
    /// Rows never written read as the fill value `0.0`.
    pub fn get_row(&mut self, table: &str, row: usize, out: &mut [f64]) -> Result<()> {
        let slice = self.prepare(table, row, out.len())?;
        let Self {
            handles,
            memspace,
            cols,
            ..
        } = self;
        let handle = handles
            .get(table)
            .ok_or_else(|| StoreError::no_such_table(table))?;
        let mem = memspace.get_or_insert_with(|| Memspace::new(*cols));

        let values = handle
            .dataset
            .read_slice_1d::<f64, _>(slice)
            .map_err(|e| StoreError::row_io_from(table, row, e))?;
        if !mem.scatter(values.view(), out) {
            return Err(StoreError::row_io(
                table,
                row,
                format!("read {} values, expected {}", values.len(), mem.len()),
            ));
        }
        Ok(())
    }

    /// Write the first `cols` slots of `values` as row `row` (1-based) of `table`.
    ///
    /// Rewriting a row replaces it.
    pub fn write_row(&mut self, table: &str, row: usize, values: &[f64]) -> Result<()> {
        self.ensure_writable()?;
        let slice = self.prepare(table, row, values.len())?;
        let Self {
            handles,
            memspace,
            cols,
            ..
        } = self;
        let handle = handles
            .get(table)
            .ok_or_else(|| StoreError::no_such_table(table))?;
        let mem = memspace.get_or_insert_with(|| Memspace::new(*cols));

        handle
            .dataset
            .write_slice(mem.view(values), slice)
            .map_err(|e| StoreError::row_io_from(table, row, e))
    }

    /// Read a single cell (1-based row and column).
    pub fn get_value(&mut self, table: &str, row: usize, col: usize) -> Result<f64> {
        if col == 0 || col > self.cols {
            return Err(StoreError::ColumnOutOfRange {
                table: table.to_string(),
                col,
                cols: self.cols,
            });
        }
        let mut buffer = vec![0.0; self.cols];
        self.get_row(table, row, &mut buffer)?;
        Ok(buffer[col - 1])
    }

    /// Record a descriptive name on `table`.
    pub fn set_description(&mut self, table: &str, description: &str) -> Result<()> {
        self.ensure_writable()?;
        write_description(self.handle(table)?.dataset(), description)?;
        if let Some(info) = self.tables.iter_mut().find(|t| t.name == table) {
            info.description = Some(description.to_string());
        }
        Ok(())
    }

    /// Overwrite or remove the declared position of `table`.
    pub fn set_declared_position(&mut self, table: &str, position: Option<i64>) -> Result<()> {
        self.ensure_writable()?;
        let stored = position
            .map(|value| {
                i32::try_from(value).map_err(|_| {
                    StoreError::schema(
                        &self.path,
                        format!("declared position {value} of '{table}' does not fit in 32 bits"),
                    )
                })
            })
            .transpose()?;
        write_position(self.handle(table)?.dataset(), stored)?;
        if let Some(info) = self.tables.iter_mut().find(|t| t.name == table) {
            info.position = position;
        }
        Ok(())
    }

    /// Push everything written so far to disk.
    ///
    /// After a flush the file opens cleanly even if the process dies before
    /// [`MatrixStore::close`].
    pub fn flush(&mut self) -> Result<()> {
        let file = self.file.as_ref().ok_or(StoreError::Closed)?;
        if self.mode == OpenMode::Create {
            file.flush()?;
        }
        Ok(())
    }

    /// Release every cached resource and the file.
    ///
    /// Handles go first, then dataspaces, then the shared memspace, then the
    /// file itself (flushing a created store). Calling `close` again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };
        let cached = self.handles.len();
        self.handles.clear();
        self.dataspaces.clear();
        self.memspace = None;
        if self.mode == OpenMode::Create {
            file.flush()?;
        }
        file.close()?;
        debug!(path = %self.path.display(), cached, "closed container");
        Ok(())
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.mode == OpenMode::Read {
            return Err(StoreError::ReadOnly {
                path: self.path.clone(),
            });
        }
        Ok(())
    }

    /// Validate a row access, open the table's handle and select `row` on
    /// its dataspace.
    fn prepare(&mut self, table: &str, row: usize, buffer_len: usize) -> Result<RowSlice> {
        self.handle(table)?;
        if row == 0 || row > self.rows {
            return Err(StoreError::RowOutOfRange {
                table: table.to_string(),
                row,
                rows: self.rows,
            });
        }
        if buffer_len < self.cols {
            return Err(StoreError::BufferTooSmall {
                expected: self.cols,
                actual: buffer_len,
            });
        }

        let dims = [self.rows as u64, self.cols as u64];
        let space = self
            .dataspaces
            .entry(table.to_string())
            .or_insert_with(|| Dataspace::new(dims));
        space
            .select_hyperslab(Hyperslab::row(row, self.cols))
            .map_err(|e| StoreError::row_io(table, row, e.to_string()))?;
        space
            .row_slice()
            .ok_or_else(|| StoreError::row_io(table, row, "selection is not a whole row"))
    }

    /// Cached handle for `table`, opening its dataset on first use.
    fn handle(&mut self, table: &str) -> Result<&TableHandle> {
        let file = self.file.as_ref().ok_or(StoreError::Closed)?;
        if !self.handles.contains_key(table) {
            if self.table(table).is_none() {
                return Err(StoreError::no_such_table(table));
            }
            let dataset = file.group(DATA_GROUP)?.dataset(table)?;
            debug!(table, "opened table handle");
            self.handles
                .insert(table.to_string(), TableHandle { dataset });
        }
        self.handles
            .get(table)
            .ok_or_else(|| StoreError::no_such_table(table))
    }
}

impl Drop for MatrixStore {
    fn drop(&mut self) {
        if self.file.is_some() {
            if let Err(err) = self.close() {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "closing container on drop failed"
                );
            }
        }
    }
}

/// One `rows x cols` table chunked by row, deflated unless `level` is 0.
fn create_table(
    data: &Group,
    name: &str,
    rows: usize,
    cols: usize,
    level: u32,
) -> hdf5::Result<Dataset> {
    let builder = data
        .new_dataset::<f64>()
        .shape((rows, cols))
        .chunk((1, cols));
    if level == 0 {
        builder.create(name)
    } else {
        builder.deflate(level.min(9) as u8).create(name)
    }
}

fn validate_table_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') || name.contains('\0') || name == "." {
        return Err(StoreError::InvalidTableName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scratch(names: &[&str]) -> (TempDir, MatrixStore) {
        let dir = TempDir::new().unwrap();
        let store = MatrixStore::create(dir.path().join("t.omx"), 3, 3, names).unwrap();
        (dir, store)
    }

    #[test]
    fn test_create_rejects_non_square() {
        let dir = TempDir::new().unwrap();
        let err = MatrixStore::create(dir.path().join("t.omx"), 3, 4, &["A"]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidShape { rows: 3, cols: 4 }));
        assert!(!dir.path().join("t.omx").exists());
    }

    #[test]
    fn test_create_rejects_duplicates_and_bad_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.omx");
        let err = MatrixStore::create(&path, 2, 2, &["A", "A"]).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateTable { .. }));
        let err = MatrixStore::create(&path, 2, 2, &["a/b"]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTableName { .. }));
        let err = MatrixStore::create(&path, 2, 2, &[""]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTableName { .. }));
    }

    #[test]
    fn test_create_enforces_table_cap() {
        let dir = TempDir::new().unwrap();
        let options = StoreOptions::new().with_max_tables(1);
        let path = dir.path().join("t.omx");
        let err =
            MatrixStore::create_with_options(&path, 2, 2, &["A", "B"], options).unwrap_err();
        assert!(matches!(err, StoreError::TooManyTables { count: 2, limit: 1 }));
    }

    #[test]
    fn test_positions_follow_creation_order() {
        let (_dir, store) = scratch(&["SOV", "HOV", "AM"]);
        assert_eq!(store.declared_position("SOV"), Some(1));
        assert_eq!(store.declared_position("HOV"), Some(2));
        assert_eq!(store.declared_position("AM"), Some(3));
        assert_eq!(store.declared_position("PM"), None);
    }

    #[test]
    fn test_write_then_read_row() {
        let (_dir, mut store) = scratch(&["SOV"]);
        store.write_row("SOV", 2, &[1.0, 2.0, 3.0]).unwrap();
        let mut buf = store.allocate_row_buffer();
        assert_eq!(buf.len(), 3 + 3);
        store.get_row("SOV", 2, &mut buf).unwrap();
        assert_eq!(&buf[..3], &[1.0, 2.0, 3.0]);
        assert_eq!(store.get_value("SOV", 2, 3).unwrap(), 3.0);
    }

    #[test]
    fn test_rewrite_replaces_row() {
        let (_dir, mut store) = scratch(&["SOV"]);
        store.write_row("SOV", 1, &[1.0, 1.0, 1.0]).unwrap();
        store.write_row("SOV", 1, &[9.0, 8.0, 7.0]).unwrap();
        let mut buf = [0.0; 3];
        store.get_row("SOV", 1, &mut buf).unwrap();
        assert_eq!(buf, [9.0, 8.0, 7.0]);
    }

    #[test]
    fn test_row_bounds() {
        let (_dir, mut store) = scratch(&["SOV"]);
        let mut buf = [0.0; 3];
        assert!(matches!(
            store.get_row("SOV", 0, &mut buf),
            Err(StoreError::RowOutOfRange { row: 0, .. })
        ));
        assert!(matches!(
            store.get_row("SOV", 4, &mut buf),
            Err(StoreError::RowOutOfRange { row: 4, .. })
        ));
        assert!(matches!(
            store.get_value("SOV", 1, 4),
            Err(StoreError::ColumnOutOfRange { col: 4, .. })
        ));
    }

    #[test]
    fn test_unknown_table() {
        let (_dir, mut store) = scratch(&["SOV"]);
        let mut buf = [0.0; 3];
        let err = store.get_row("HOV", 1, &mut buf).unwrap_err();
        assert!(matches!(err, StoreError::NoSuchTable { ref name } if name == "HOV"));
    }

    #[test]
    fn test_short_buffer() {
        let (_dir, mut store) = scratch(&["SOV"]);
        let err = store.write_row("SOV", 1, &[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::BufferTooSmall {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_slack_is_left_untouched() {
        let (_dir, mut store) = scratch(&["SOV"]);
        let mut buf = vec![-1.0; 6];
        store.get_row("SOV", 1, &mut buf).unwrap();
        assert_eq!(buf, vec![0.0, 0.0, 0.0, -1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_oversized_shape_is_rejected() {
        let dir = TempDir::new().unwrap();
        let rows = i32::MAX as usize + 1;
        let err = MatrixStore::create(dir.path().join("t.omx"), rows, rows, &["A"]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidShape { .. }));
    }

    #[test]
    fn test_declared_position_can_be_moved_and_removed() {
        let (_dir, mut store) = scratch(&["SOV", "HOV"]);
        store.set_declared_position("SOV", Some(2)).unwrap();
        store.set_declared_position("HOV", None).unwrap();
        assert_eq!(store.declared_position("SOV"), Some(2));
        assert_eq!(store.declared_position("HOV"), None);
        assert!(matches!(
            store.set_declared_position("SOV", Some(i64::MAX)),
            Err(StoreError::Schema { .. })
        ));
    }

    #[test]
    fn test_close_is_idempotent() {
        let (_dir, mut store) = scratch(&["SOV"]);
        store.close().unwrap();
        store.close().unwrap();
        assert!(!store.is_open());
        let mut buf = [0.0; 3];
        assert!(matches!(
            store.get_row("SOV", 1, &mut buf),
            Err(StoreError::Closed)
        ));
    }

    #[test]
    fn test_description_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.omx");
        let mut store = MatrixStore::create(&path, 2, 2, &["SOV"]).unwrap();
        store.set_description("SOV", "single occupancy").unwrap();
        store.close().unwrap();

        let store = MatrixStore::open(&path).unwrap();
        assert_eq!(
            store.table("SOV").and_then(|t| t.description.as_deref()),
            Some("single occupancy")
        );
    }
}
