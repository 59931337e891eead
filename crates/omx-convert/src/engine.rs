//! Streaming conversion.
//!
//! Both directions copy one row at a time, zone by zone and, within a zone,
//! table by table. A single row buffer from the legacy side's allocator is
//! reused for the whole conversion, so memory stays independent of the zone
//! count. Schema and ordering problems are found before the destination is
//! created; a row failure after that point leaves a partial destination on
//! disk and is reported as [`ConvertError::RowTransfer`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use omx_legacy::{LegacyDriver, LegacyReader, LegacyWriter};
use omx_store::{MatrixStore, StoreOptions};
use tracing::{debug, info, info_span, warn};

use crate::direction::{Direction, detect_direction, output_path_for};
use crate::error::{ConvertError, Result, RowFault};
use crate::order::TableOrder;

/// Progress after one zone has been copied for every table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneProgress {
    /// Zones finished so far.
    pub zone: usize,
    /// Total zones.
    pub zones: usize,
}

/// Callback invoked once per finished zone.
pub type ProgressFn = Arc<dyn Fn(ZoneProgress) + Send + Sync>;

/// Options for one conversion.
#[derive(Clone, Default)]
pub struct ConvertOptions {
    /// Options for the container side.
    pub store: StoreOptions,
    /// Directory for outputs (default: beside the input).
    pub output_dir: Option<PathBuf>,
    /// Per-zone progress hook.
    pub progress: Option<ProgressFn>,
}

impl fmt::Debug for ConvertOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertOptions")
            .field("store", &self.store)
            .field("output_dir", &self.output_dir)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl ConvertOptions {
    /// Create conversion options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the container options.
    #[must_use]
    pub fn with_store_options(mut self, store: StoreOptions) -> Self {
        self.store = store;
        self
    }

    /// Write outputs into `dir`.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Report progress after every zone.
    #[must_use]
    pub fn with_progress(
        mut self,
        progress: impl Fn(ZoneProgress) + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    fn report(&self, zone: usize, zones: usize) {
        if let Some(progress) = &self.progress {
            progress(ZoneProgress { zone, zones });
        }
    }
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    pub direction: Direction,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub zones: usize,
    pub tables: usize,
    pub rows_copied: u64,
    pub elapsed: Duration,
}

/// Copy an OMX container into a new legacy file.
///
/// Tables are written in the order given by their declared positions.
pub fn container_to_legacy<D: LegacyDriver>(
    source: &Path,
    destination: &Path,
    driver: &D,
    options: &ConvertOptions,
) -> Result<ConversionReport> {
    let span = info_span!(
        "convert",
        direction = %Direction::ContainerToLegacy,
        source = %source.display()
    );
    let _guard = span.enter();
    let started = Instant::now();

    let mut store = MatrixStore::open_with_options(source, options.store)?;
    let order = TableOrder::from_store(&store)?;
    let zones = store.zones();
    let tables = order.len();
    debug!(zones, tables, driver = driver.name(), "table order reconciled");

    let mut sink = driver.create(destination, &order.names_in_order(), zones)?;
    let mut row = sink.allocate_row_buffer();
    let mut rows_copied = 0u64;

    for zone in 1..=zones {
        for (position, name) in order.iter() {
            let copied = store
                .get_row(name, zone, &mut row)
                .map_err(RowFault::Store)
                .and_then(|()| {
                    sink.write_row(position, zone, &row)
                        .map_err(RowFault::Legacy)
                });
            if let Err(fault) = copied {
                if let Err(err) = sink.close() {
                    warn!(
                        destination = %destination.display(),
                        error = %err,
                        "closing partial output failed"
                    );
                }
                return Err(row_transfer(name, zone, destination, fault));
            }
            rows_copied += 1;
        }
        options.report(zone, zones);
    }

    sink.close()?;
    store.close()?;
    finish(
        Direction::ContainerToLegacy,
        source,
        destination,
        zones,
        tables,
        rows_copied,
        started,
    )
}

/// Copy a legacy file into a new OMX container.
///
/// Container tables are created in legacy positional order, so each table's
/// declared position equals its legacy position. The container is flushed
/// after every zone, so an interrupted run leaves a readable file holding
/// every completed zone.
pub fn legacy_to_container<D: LegacyDriver>(
    source: &Path,
    destination: &Path,
    driver: &D,
    options: &ConvertOptions,
) -> Result<ConversionReport> {
    let span = info_span!(
        "convert",
        direction = %Direction::LegacyToContainer,
        source = %source.display()
    );
    let _guard = span.enter();
    let started = Instant::now();

    let mut legacy = driver.open(source)?;
    let zones = legacy.zones();
    let names = legacy.table_names().to_vec();
    debug!(zones, tables = names.len(), driver = driver.name(), "legacy source opened");

    let mut store =
        MatrixStore::create_with_options(destination, zones, zones, &names, options.store)?;
    let mut row = legacy.allocate_row_buffer();
    let mut rows_copied = 0u64;

    for zone in 1..=zones {
        for (idx, name) in names.iter().enumerate() {
            let copied = legacy
                .get_row(idx + 1, zone, &mut row)
                .map_err(RowFault::Legacy)
                .and_then(|()| store.write_row(name, zone, &row).map_err(RowFault::Store));
            if let Err(fault) = copied {
                if let Err(err) = store.close() {
                    warn!(
                        destination = %destination.display(),
                        error = %err,
                        "closing partial output failed"
                    );
                }
                return Err(row_transfer(name, zone, destination, fault));
            }
            rows_copied += 1;
        }
        store.flush()?;
        options.report(zone, zones);
    }

    store.close()?;
    legacy.close()?;
    finish(
        Direction::LegacyToContainer,
        source,
        destination,
        zones,
        names.len(),
        rows_copied,
        started,
    )
}

/// Detect the direction of `input`, derive its output path and convert it.
pub fn convert_file<D: LegacyDriver>(
    input: &Path,
    driver: &D,
    options: &ConvertOptions,
) -> Result<ConversionReport> {
    let direction = detect_direction(input)?;
    let destination = output_path_for(
        input,
        direction,
        driver.extension(),
        options.output_dir.as_deref(),
    );
    if destination == input {
        return Err(ConvertError::SameOutput {
            path: destination,
        });
    }
    match direction {
        Direction::ContainerToLegacy => container_to_legacy(input, &destination, driver, options),
        Direction::LegacyToContainer => legacy_to_container(input, &destination, driver, options),
    }
}

fn row_transfer(table: &str, zone: usize, destination: &Path, fault: RowFault) -> ConvertError {
    let err = ConvertError::RowTransfer {
        table: table.to_string(),
        zone,
        partial_output: destination.to_path_buf(),
        source: fault,
    };
    tracing::error!("{err}");
    err
}

fn finish(
    direction: Direction,
    source: &Path,
    destination: &Path,
    zones: usize,
    tables: usize,
    rows_copied: u64,
    started: Instant,
) -> Result<ConversionReport> {
    let elapsed = started.elapsed();
    info!(
        destination = %destination.display(),
        zones,
        tables,
        rows_copied,
        elapsed_ms = elapsed.as_millis() as u64,
        "conversion complete"
    );
    Ok(ConversionReport {
        direction,
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        zones,
        tables,
        rows_copied,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use omx_legacy::RowRecordDriver;
    use tempfile::TempDir;

    #[test]
    fn test_options_debug_hides_callback() {
        let options = ConvertOptions::new().with_progress(|_| {});
        let text = format!("{options:?}");
        assert!(text.contains("progress: true"));
    }

    #[test]
    fn test_progress_once_per_zone() {
        let dir = TempDir::new().unwrap();
        let omx = dir.path().join("a.omx");
        MatrixStore::create(&omx, 4, 4, &["A", "B"])
            .unwrap()
            .close()
            .unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let options = ConvertOptions::new().with_progress(move |p| {
            assert_eq!(p.zones, 4);
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let driver = RowRecordDriver::default();
        let report =
            container_to_legacy(&omx, &dir.path().join("a.mat"), &driver, &options).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(report.rows_copied, 8);
        assert_eq!(report.tables, 2);
    }

    #[test]
    fn test_convert_file_refuses_to_overwrite_input() {
        let dir = TempDir::new().unwrap();
        // A legacy file that already carries the container extension.
        let input = dir.path().join("trips.omx");
        std::fs::write(&input, b"legacy bytes").unwrap();
        let driver = RowRecordDriver::default();
        let err = convert_file(&input, &driver, &ConvertOptions::new()).unwrap_err();
        assert!(matches!(err, ConvertError::SameOutput { .. }));
        assert_eq!(std::fs::read(&input).unwrap(), b"legacy bytes");
    }
}
