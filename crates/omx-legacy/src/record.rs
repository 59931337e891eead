//! Row-record matrix files.
//!
//! A row-record file carries a header followed by one record per
//! `(table, zone)` row, written zone-major:
//!
//! ```text
//! header
//!   magic            8 bytes  "OMXRREC\x01"
//!   zones            u32 LE
//!   tables           u32 LE
//!   names length     u32 LE
//!   names            NUL-terminated, positional order
//!   precision        1 byte per table ('D' = f64)
//! record
//!   table            u32 LE   (1-based position)
//!   origin           u32 LE   (1-based zone)
//!   precision        1 byte
//!   values           zones x f64 LE
//! ```
//!
//! Readers index every record's offset by scanning the file once on open. A
//! file must hold exactly one record per `(table, zone)`; writers pad missing
//! rows with zeros when they close.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::driver::{DEFAULT_ROW_SLACK, LegacyDriver, LegacyReader, LegacyWriter};
use crate::error::{LegacyError, Result};

/// File magic.
pub const MAGIC: [u8; 8] = *b"OMXRREC\x01";

/// Precision code for double rows.
pub const PRECISION_DOUBLE: u8 = b'D';

/// Bytes preceding the values of each record.
pub const RECORD_HEADER_LEN: usize = 9;

/// Upper bound on tables per file.
pub const MAX_TABLES: usize = 500;

const FIXED_HEADER_LEN: usize = 8 + 4 + 4 + 4;

/// Driver for row-record files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRecordDriver {
    row_slack: usize,
}

impl Default for RowRecordDriver {
    fn default() -> Self {
        Self {
            row_slack: DEFAULT_ROW_SLACK,
        }
    }
}

impl RowRecordDriver {
    /// Driver with the default row slack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spare doubles at the end of every row buffer handed out by readers
    /// and writers of this driver.
    #[must_use]
    pub fn with_row_slack(mut self, slack: usize) -> Self {
        self.row_slack = slack;
        self
    }

    /// Configured row slack.
    pub fn row_slack(&self) -> usize {
        self.row_slack
    }
}

impl LegacyDriver for RowRecordDriver {
    type Reader = RowRecordReader;
    type Writer = RowRecordWriter;

    fn name(&self) -> &'static str {
        "row-record"
    }

    fn open(&self, path: &Path) -> Result<Self::Reader> {
        let mut reader = RowRecordReader::open(path)?;
        reader.row_slack = self.row_slack;
        Ok(reader)
    }

    fn create(&self, path: &Path, names: &[String], zones: usize) -> Result<Self::Writer> {
        let mut writer = RowRecordWriter::create(path, names, zones)?;
        writer.row_slack = self.row_slack;
        Ok(writer)
    }
}

/// Header fields shared by reader and writer.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Header {
    zones: usize,
    names: Vec<String>,
}

impl Header {
    fn encode(&self) -> Vec<u8> {
        let mut names = Vec::new();
        for name in &self.names {
            names.extend_from_slice(name.as_bytes());
            names.push(0);
        }
        let mut out = Vec::with_capacity(FIXED_HEADER_LEN + names.len() + self.names.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&(self.zones as u32).to_le_bytes());
        out.extend_from_slice(&(self.names.len() as u32).to_le_bytes());
        out.extend_from_slice(&(names.len() as u32).to_le_bytes());
        out.extend_from_slice(&names);
        out.extend(std::iter::repeat_n(PRECISION_DOUBLE, self.names.len()));
        out
    }

    /// Decode a header from a file of `file_len` bytes.
    fn decode<R: Read>(path: &Path, reader: &mut R, file_len: u64) -> Result<(Self, u64)> {
        let mut fixed = [0u8; FIXED_HEADER_LEN];
        reader
            .read_exact(&mut fixed)
            .map_err(|_| LegacyError::invalid_format(path, "file too small"))?;
        if fixed[0..8] != MAGIC {
            return Err(LegacyError::invalid_format(
                path,
                "not a row-record matrix (invalid magic bytes)",
            ));
        }
        let zones = read_u32(&fixed[8..12]) as usize;
        let tables = read_u32(&fixed[12..16]) as usize;
        let names_len = read_u32(&fixed[16..20]) as usize;
        if zones == 0 {
            return Err(LegacyError::invalid_format(path, "zone count is zero"));
        }
        if tables == 0 || tables > MAX_TABLES {
            return Err(LegacyError::invalid_format(
                path,
                format!("table count {tables} is outside 1..={MAX_TABLES}"),
            ));
        }

        let available = file_len.saturating_sub(FIXED_HEADER_LEN as u64);
        if names_len as u64 + tables as u64 > available {
            return Err(LegacyError::invalid_format(
                path,
                format!("header announces {names_len} bytes of names, file holds {available}"),
            ));
        }

        let mut names_block = vec![0u8; names_len];
        reader
            .read_exact(&mut names_block)
            .map_err(|_| LegacyError::invalid_format(path, "truncated table names"))?;
        let names: Vec<String> = names_block
            .split(|b| *b == 0)
            .take(tables)
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
            .collect();
        if names.len() != tables || names_block.last() != Some(&0) {
            return Err(LegacyError::invalid_format(
                path,
                format!("expected {tables} table names"),
            ));
        }

        let mut precision = vec![0u8; tables];
        reader
            .read_exact(&mut precision)
            .map_err(|_| LegacyError::invalid_format(path, "truncated precision codes"))?;
        if let Some(pos) = precision.iter().position(|p| *p != PRECISION_DOUBLE) {
            return Err(LegacyError::invalid_format(
                path,
                format!(
                    "table {} uses unsupported precision code {:#04x}",
                    pos + 1,
                    precision[pos]
                ),
            ));
        }

        let header_len = (FIXED_HEADER_LEN + names_len + tables) as u64;
        Ok((Self { zones, names }, header_len))
    }
}

/// Reader for row-record files.
#[derive(Debug)]
pub struct RowRecordReader {
    path: PathBuf,
    file: Option<BufReader<File>>,
    header: Header,
    /// Record offset per `(zone - 1) * tables + (position - 1)`.
    index: Vec<Option<u64>>,
    scratch: Vec<u8>,
    row_slack: usize,
}

impl RowRecordReader {
    /// Open `path` and index every row record.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| LegacyError::file_open(path, e))?;
        let file_len = file
            .metadata()
            .map_err(|e| LegacyError::file_open(path, e))?
            .len();
        let mut reader = BufReader::new(file);
        let (header, header_len) = Header::decode(path, &mut reader, file_len)?;

        let tables = header.names.len();
        let body_len = file_len - header_len;
        let (record_len, cells) = body_layout(&header)
            .filter(|(record_len, cells)| {
                (*cells as u64)
                    .checked_mul(*record_len)
                    .is_some_and(|len| len == body_len)
            })
            .ok_or_else(|| {
                LegacyError::invalid_format(
                    path,
                    format!(
                        "{body_len} bytes of rows do not match {tables} tables of {} zones",
                        header.zones
                    ),
                )
            })?;
        let mut index = vec![None; cells];
        let mut offset = header_len;
        let mut record_head = [0u8; RECORD_HEADER_LEN];
        while offset < file_len {
            reader.read_exact(&mut record_head)?;
            let table = read_u32(&record_head[0..4]) as usize;
            let origin = read_u32(&record_head[4..8]) as usize;
            if table == 0 || table > tables {
                return Err(LegacyError::invalid_format(
                    path,
                    format!("record at byte {offset} names table {table} of {tables}"),
                ));
            }
            if origin == 0 || origin > header.zones {
                return Err(LegacyError::invalid_format(
                    path,
                    format!("record at byte {offset} names zone {origin} of {}", header.zones),
                ));
            }
            if record_head[8] != PRECISION_DOUBLE {
                return Err(LegacyError::invalid_format(
                    path,
                    format!("record at byte {offset} has precision {:#04x}", record_head[8]),
                ));
            }
            index[(origin - 1) * tables + (table - 1)] = Some(offset);
            reader.seek_relative((header.zones * 8) as i64)?;
            offset += record_len;
        }

        info!(
            path = %path.display(),
            zones = header.zones,
            tables,
            "opened row-record matrix"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(reader),
            scratch: Vec::with_capacity(header.zones * 8),
            header,
            index,
            row_slack: DEFAULT_ROW_SLACK,
        })
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LegacyReader for RowRecordReader {
    fn zones(&self) -> usize {
        self.header.zones
    }

    fn table_names(&self) -> &[String] {
        &self.header.names
    }

    fn row_slack(&self) -> usize {
        self.row_slack
    }

    fn get_row(&mut self, position: usize, zone: usize, out: &mut [f64]) -> Result<()> {
        let zones = self.header.zones;
        let tables = self.header.names.len();
        check_row(position, zone, out.len(), tables, zones)?;
        let file = self.file.as_mut().ok_or(LegacyError::Closed)?;

        let Some(offset) = self.index[(zone - 1) * tables + (position - 1)] else {
            out[..zones].fill(0.0);
            return Ok(());
        };
        self.scratch.resize(zones * 8, 0);
        file.seek(SeekFrom::Start(offset + RECORD_HEADER_LEN as u64))
            .and_then(|_| file.read_exact(&mut self.scratch))
            .map_err(|source| LegacyError::RowRead {
                position,
                zone,
                source,
            })?;
        for (value, bytes) in out[..zones].iter_mut().zip(self.scratch.chunks_exact(8)) {
            *value = f64::from_le_bytes(to_array(bytes));
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.file.take().is_some() {
            debug!(path = %self.path.display(), "closed row-record matrix");
        }
        Ok(())
    }
}

/// Writer for row-record files.
#[derive(Debug)]
pub struct RowRecordWriter {
    path: PathBuf,
    file: Option<BufWriter<File>>,
    header: Header,
    /// Next `(zone, position)` expected, zone-major.
    next: (usize, usize),
    zeros: Vec<f64>,
    row_slack: usize,
}

impl RowRecordWriter {
    /// Create `path` announcing `names` in positional order.
    pub fn create(path: &Path, names: &[String], zones: usize) -> Result<Self> {
        if zones == 0 || zones > u32::MAX as usize {
            return Err(LegacyError::InvalidTableSet {
                reason: format!("zone count {zones} is not representable"),
            });
        }
        if names.is_empty() || names.len() > MAX_TABLES {
            return Err(LegacyError::InvalidTableSet {
                reason: format!("table count {} is outside 1..={MAX_TABLES}", names.len()),
            });
        }
        if let Some(bad) = names.iter().find(|n| n.is_empty() || n.contains('\0')) {
            return Err(LegacyError::InvalidTableSet {
                reason: format!("table name {bad:?} cannot be stored"),
            });
        }

        let header = Header {
            zones,
            names: names.to_vec(),
        };
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| LegacyError::file_open(path, e))?;
        let mut file = BufWriter::new(file);
        file.write_all(&header.encode())?;

        info!(
            path = %path.display(),
            zones,
            tables = names.len(),
            "created row-record matrix"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            header,
            next: (1, 1),
            zeros: vec![0.0; zones],
            row_slack: DEFAULT_ROW_SLACK,
        })
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Emit zero rows up to (but not including) `(zone, position)`.
    fn pad_until(&mut self, zone: usize, position: usize) -> Result<()> {
        let tables = self.header.names.len();
        let file = self.file.as_mut().ok_or(LegacyError::Closed)?;
        while self.next < (zone, position) {
            let (z, p) = self.next;
            write_record(file, p, z, &self.zeros).map_err(|source| LegacyError::RowWrite {
                position: p,
                zone: z,
                source,
            })?;
            self.next = if p == tables { (z + 1, 1) } else { (z, p + 1) };
        }
        Ok(())
    }
}

impl LegacyWriter for RowRecordWriter {
    fn zones(&self) -> usize {
        self.header.zones
    }

    fn table_names(&self) -> &[String] {
        &self.header.names
    }

    fn row_slack(&self) -> usize {
        self.row_slack
    }

    fn write_row(&mut self, position: usize, zone: usize, values: &[f64]) -> Result<()> {
        let zones = self.header.zones;
        let tables = self.header.names.len();
        check_row(position, zone, values.len(), tables, zones)?;
        if self.file.is_none() {
            return Err(LegacyError::Closed);
        }
        if (zone, position) < self.next {
            let (last_zone, last_position) = if self.next.1 == 1 {
                (self.next.0 - 1, tables)
            } else {
                (self.next.0, self.next.1 - 1)
            };
            return Err(LegacyError::OutOfOrder {
                position,
                zone,
                last_position,
                last_zone,
            });
        }

        self.pad_until(zone, position)?;
        let file = self.file.as_mut().ok_or(LegacyError::Closed)?;
        write_record(file, position, zone, &values[..zones]).map_err(|source| {
            LegacyError::RowWrite {
                position,
                zone,
                source,
            }
        })?;
        self.next = if position == tables {
            (zone + 1, 1)
        } else {
            (zone, position + 1)
        };
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.file.is_none() {
            return Ok(());
        }
        let zones = self.header.zones;
        self.pad_until(zones + 1, 1)?;
        if let Some(mut file) = self.file.take() {
            file.flush()?;
            file.get_ref().sync_all()?;
        }
        debug!(path = %self.path.display(), "closed row-record matrix");
        Ok(())
    }
}

impl Drop for RowRecordWriter {
    fn drop(&mut self) {
        if self.file.is_some() {
            if let Err(err) = self.close() {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "closing row-record matrix on drop failed"
                );
            }
        }
    }
}

fn check_row(position: usize, zone: usize, len: usize, tables: usize, zones: usize) -> Result<()> {
    if position == 0 || position > tables {
        return Err(LegacyError::NoSuchTable { position, tables });
    }
    if zone == 0 || zone > zones {
        return Err(LegacyError::ZoneOutOfRange { zone, zones });
    }
    if len < zones {
        return Err(LegacyError::BufferTooSmall {
            expected: zones,
            actual: len,
        });
    }
    Ok(())
}

fn write_record<W: Write>(
    out: &mut W,
    position: usize,
    zone: usize,
    values: &[f64],
) -> io::Result<()> {
    out.write_all(&(position as u32).to_le_bytes())?;
    out.write_all(&(zone as u32).to_le_bytes())?;
    out.write_all(&[PRECISION_DOUBLE])?;
    for value in values {
        out.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

/// Record length in bytes and record count implied by `header`, or `None`
/// when either overflows.
fn body_layout(header: &Header) -> Option<(u64, usize)> {
    let record_len = header
        .zones
        .checked_mul(8)?
        .checked_add(RECORD_HEADER_LEN)?;
    let cells = header.names.len().checked_mul(header.zones)?;
    Some((record_len as u64, cells))
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn to_array(bytes: &[u8]) -> [u8; 8] {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    buf
}
