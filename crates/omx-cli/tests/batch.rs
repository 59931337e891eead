use std::fs;
use std::path::PathBuf;

use omx_cli::batch::{BatchOptions, run_batch};
use omx_convert::{ConvertOptions, Direction};
use omx_legacy::{LegacyDriver, LegacyReader, LegacyWriter, RowRecordDriver};
use omx_store::MatrixStore;
use tempfile::TempDir;

fn container(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut store = MatrixStore::create(&path, 2, 2, &["SOV", "HOV"]).unwrap();
    store.write_row("HOV", 2, &[3.5, 4.5]).unwrap();
    store.close().unwrap();
    path
}

#[test]
fn batch_continues_after_failures() {
    let dir = TempDir::new().unwrap();
    let good = container(&dir, "good.omx");
    let missing = dir.path().join("missing.mat");
    let garbage = dir.path().join("garbage.mat");
    fs::write(&garbage, b"not a matrix at all").unwrap();

    let inputs = vec![missing.clone(), good.clone(), garbage.clone()];
    let mut seen = Vec::new();
    let result = run_batch(
        &inputs,
        &RowRecordDriver::default(),
        &BatchOptions::new(ConvertOptions::new()),
        |outcome| seen.push((outcome.input.clone(), outcome.succeeded())),
    );

    assert_eq!(
        seen,
        vec![(missing, false), (good, true), (garbage, false)]
    );
    assert_eq!(result.total(), 3);
    assert_eq!(result.completed(), 1);
    assert_eq!(result.exit_code(), 2);
    assert_eq!(result.closing_line(), "Done; 2 errors and 1 of 3 completed.");

    let report = result.outcomes[1].result.as_ref().unwrap();
    assert_eq!(report.direction, Direction::ContainerToLegacy);
    let mut legacy = RowRecordDriver::default().open(&report.destination).unwrap();
    assert_eq!(legacy.get_value(2, 2, 2).unwrap(), 4.5);
}

#[test]
fn batch_writes_into_output_dir() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("converted");
    fs::create_dir(&out).unwrap();
    let inputs = vec![container(&dir, "am.omx"), container(&dir, "pm.omx")];

    let options = BatchOptions::new(ConvertOptions::new().with_output_dir(&out));
    let result = run_batch(&inputs, &RowRecordDriver::default(), &options, |_| {});

    assert_eq!(result.exit_code(), 0);
    assert!(out.join("am.mat").exists());
    assert!(out.join("pm.mat").exists());
    assert!(!dir.path().join("am.mat").exists());
}

#[test]
fn row_slack_is_configurable_per_batch() {
    let dir = TempDir::new().unwrap();
    let legacy = dir.path().join("tight.mat");
    let names = vec!["SOV".to_string()];
    let mut sink = RowRecordDriver::default().create(&legacy, &names, 2).unwrap();
    sink.write_row(1, 2, &[6.0, 7.0]).unwrap();
    sink.close().unwrap();

    let driver = RowRecordDriver::new().with_row_slack(0);
    assert_eq!(driver.open(&legacy).unwrap().allocate_row_buffer().len(), 2);
    let options = BatchOptions::new(ConvertOptions::new());
    let result = run_batch(&[legacy], &driver, &options, |_| {});

    assert_eq!(result.exit_code(), 0);
    let mut store = MatrixStore::open(dir.path().join("tight.omx")).unwrap();
    assert_eq!(store.get_value("SOV", 2, 2).unwrap(), 7.0);
}
