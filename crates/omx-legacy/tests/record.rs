use omx_legacy::{LegacyDriver, LegacyReader, LegacyWriter, RowRecordDriver};
use proptest::prelude::*;
use tempfile::TempDir;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn zone_major_write_reads_back_by_position() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trips.mat");
    let driver = RowRecordDriver::default();
    let tables = names(&["HOV", "SOV", "TRK"]);

    let mut sink = driver.create(&path, &tables, 4).unwrap();
    let mut row = sink.allocate_row_buffer();
    for zone in 1..=4 {
        for position in 1..=3 {
            for (col, slot) in row[..4].iter_mut().enumerate() {
                *slot = (zone * 100 + position * 10 + col) as f64;
            }
            sink.write_row(position, zone, &row).unwrap();
        }
    }
    sink.close().unwrap();

    let mut source = driver.open(&path).unwrap();
    assert_eq!(source.zones(), 4);
    assert_eq!(source.table_count(), 3);
    assert_eq!(source.table_names(), &tables[..]);
    // Random access, reverse order.
    for zone in (1..=4).rev() {
        for position in (1..=3).rev() {
            source.get_row(position, zone, &mut row).unwrap();
            let expected: Vec<f64> = (0..4)
                .map(|col| (zone * 100 + position * 10 + col) as f64)
                .collect();
            assert_eq!(&row[..4], &expected[..]);
        }
    }
    source.close().unwrap();
}

#[test]
fn dropped_writer_leaves_complete_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.mat");
    {
        let mut sink = RowRecordDriver::default().create(&path, &names(&["A", "B"]), 2).unwrap();
        sink.write_row(1, 1, &[1.0, 2.0]).unwrap();
    }
    let mut source = RowRecordDriver::default().open(&path).unwrap();
    assert_eq!(source.get_value(1, 1, 2).unwrap(), 2.0);
    assert_eq!(source.get_value(2, 2, 1).unwrap(), 0.0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn values_survive_bit_for_bit(values in prop::collection::vec(any::<f64>(), 5)) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prop.mat");
        let mut sink = RowRecordDriver::default().create(&path, &names(&["T"]), 5).unwrap();
        sink.write_row(1, 3, &values).unwrap();
        sink.close().unwrap();

        let mut source = RowRecordDriver::default().open(&path).unwrap();
        let mut row = source.allocate_row_buffer();
        source.get_row(1, 3, &mut row).unwrap();
        for (written, read) in values.iter().zip(&row[..5]) {
            prop_assert_eq!(written.to_bits(), read.to_bits());
        }
    }
}
