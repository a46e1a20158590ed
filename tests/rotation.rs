use std::fs;

use hourlog::{bucket_name, RotatingWriter, WriterConfig};
use tempfile::tempdir;
use time::macros::datetime;
use time::Duration;

/// Background flushes far enough apart that only explicit calls write.
fn manual_flush(dir: &std::path::Path, prefix: &str) -> WriterConfig {
    let mut config = WriterConfig::new(dir, prefix);
    config.flush_interval = std::time::Duration::from_secs(3600);
    config
}

#[test]
fn records_an_hour_apart_land_in_separate_files() {
    let dir = tempdir().expect("tempdir");
    let writer = RotatingWriter::open(manual_flush(dir.path(), "app-")).expect("open");

    writer.submit("first", datetime!(2024-01-01 10:30:00 UTC));
    writer.submit("second", datetime!(2024-01-01 11:05:00 UTC));
    let report = writer.flush_now().expect("flush");
    assert_eq!(report.records, 2);
    assert_eq!(report.files, 2);
    assert_eq!(
        writer.current_file().as_deref(),
        Some("app-2024-01-01T1100.log")
    );
    writer.close().expect("close");

    let ten = fs::read_to_string(dir.path().join("app-2024-01-01T1000.log")).expect("read 10");
    let eleven = fs::read_to_string(dir.path().join("app-2024-01-01T1100.log")).expect("read 11");
    assert_eq!(ten, "first\n");
    assert_eq!(eleven, "second\n");

    let mut names: Vec<String> = fs::read_dir(dir.path())
        .expect("read dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["app-2024-01-01T1000.log", "app-2024-01-01T1100.log"]);
}

#[test]
fn bucket_spans_exactly_one_hour() {
    let t = datetime!(2024-01-01 10:00:00 UTC);
    let name = bucket_name("app-", t).expect("bucket");
    assert_eq!(bucket_name("app-", t + Duration::minutes(59)), Some(name.clone()));
    assert_ne!(bucket_name("app-", t + Duration::minutes(61)), Some(name));
}

#[test]
fn offsets_are_normalized_before_bucketing() {
    let dir = tempdir().expect("tempdir");
    let writer = RotatingWriter::open(manual_flush(dir.path(), "")).expect("open");

    // Same instant, two offsets.
    writer.submit("utc", datetime!(2024-02-29 23:15:00 UTC));
    writer.submit("tokyo", datetime!(2024-03-01 08:15:00 +9));
    writer.close().expect("close");

    let body = fs::read_to_string(dir.path().join("2024-02-29T2300.log")).expect("read");
    assert_eq!(body, "tokyo\nutc\n");
}

#[test]
fn late_record_reopens_past_file_and_appends() {
    let dir = tempdir().expect("tempdir");
    let writer = RotatingWriter::open(manual_flush(dir.path(), "app-")).expect("open");

    writer.submit("ten", datetime!(2024-01-01 10:10:00 UTC));
    writer.submit("eleven", datetime!(2024-01-01 11:10:00 UTC));
    writer.flush_now().expect("first batch");

    writer.submit("ten-late", datetime!(2024-01-01 10:50:00 UTC));
    writer.submit("eleven-late", datetime!(2024-01-01 11:50:00 UTC));
    writer.flush_now().expect("second batch");
    writer.close().expect("close");

    let ten = fs::read_to_string(dir.path().join("app-2024-01-01T1000.log")).expect("read 10");
    let eleven = fs::read_to_string(dir.path().join("app-2024-01-01T1100.log")).expect("read 11");
    assert_eq!(ten, "ten\nten-late\n");
    assert_eq!(eleven, "eleven\neleven-late\n");

    let stats = writer.stats();
    assert_eq!(stats.late_reopens, 1);
    assert_eq!(stats.rotations, 4);
    assert_eq!(stats.written, 4);
}

#[test]
fn existing_bucket_file_is_appended_not_truncated() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("svc-2024-07-04T1200.log");
    fs::write(&path, "from a previous run\n").expect("seed");

    let writer = RotatingWriter::open(manual_flush(dir.path(), "svc-")).expect("open");
    writer.submit("fresh", datetime!(2024-07-04 12:30:00 UTC));
    writer.close().expect("close");

    assert_eq!(
        fs::read_to_string(&path).expect("read"),
        "from a previous run\nfresh\n"
    );
}
