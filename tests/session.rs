use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use measurement_processing::types::Value;
use measurement_processing::{DataProcessor, ProcessingError};

fn tmp_file(ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("measurement-processing-session-{nanos}.{ext}"))
}

#[test]
fn scripted_walkthrough_on_fixture() {
    let mut p = DataProcessor::new("tests/fixtures/measurements.csv", b';');
    p.load().unwrap();

    let summary = p.get_summary().unwrap();
    assert_eq!(summary.row_count, 6);
    assert_eq!(summary.column_count, 9);

    assert_eq!(p.remove_empty_rows().unwrap(), 1);
    assert_eq!(p.filter_by_batch(1).unwrap().row_count(), 3);
    assert_eq!(p.filter_by_index_range(Some(15), None).unwrap().row_count(), 2);
    assert_eq!(p.convert_decimal_format().unwrap(), 1);

    let appended = p.normalize_numeric_columns().unwrap();
    assert!(appended.contains(&"T2_FineNS_normalized".to_string()));
    assert!(!appended.contains(&"T1_FineNS_normalized".to_string()));

    let stats = p.calculate_statistics().unwrap();
    assert_eq!(stats.get("T1_FineNS").unwrap().valid_count, 1);

    let out = tmp_file("csv");
    p.export_delimited(&out).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().count(), 3);
    std::fs::remove_file(&out).unwrap();
}

#[test]
fn working_copy_does_not_touch_loaded_table() {
    let mut p = DataProcessor::new("tests/fixtures/measurements.csv", b';');
    let loaded = p.load().unwrap().clone();

    p.filter_by_batch(2).unwrap();
    p.convert_decimal_format().unwrap();
    let fine = p.data().unwrap().schema.index_of("T1_FineNS").unwrap();
    assert_eq!(p.data().unwrap().rows[0][fine], Value::Float64(3.5));

    p.reset();
    assert_eq!(p.data().unwrap(), &loaded);
}

#[test]
fn load_failure_is_reported_and_nothing_is_loaded() {
    let mut p = DataProcessor::new("tests/fixtures/nope.csv", b';');
    assert!(p.load().is_err());
    assert!(matches!(
        p.calculate_statistics(),
        Err(ProcessingError::NotLoaded)
    ));
}

#[cfg(feature = "excel")]
#[test]
fn workbook_export_from_session() {
    let mut p = DataProcessor::new("tests/fixtures/measurements.csv", b';');
    p.load().unwrap();
    p.filter_by_batch(2).unwrap();

    let out = tmp_file("xlsx");
    p.export_workbook(&out).unwrap();
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
    std::fs::remove_file(&out).unwrap();
}
