//! End-to-end tests for the file-by-file ETL
//!
//! Song and log fixtures are written to temp directories and loaded into an
//! in-memory DuckDB warehouse.

#![cfg(feature = "duckdb-backend")]

mod common;

use tempfile::TempDir;

use common::{FailingWarehouse, event_json, fresh_warehouse, scalar, song_json, write};
use songplay_etl::ingest::SourceKind;
use songplay_etl::pipeline::{
    DriverState, FailurePolicy, PipelineDriver, PipelineError, RecordingProgress,
};
use songplay_etl::warehouse::{Dialect, LoadError, StatementCatalog, Warehouse};

fn catalog() -> StatementCatalog {
    StatementCatalog::for_dialect(Dialect::DuckDb)
}

#[test]
fn test_single_song_file_loads_song_and_artist() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "A/A/A/TRAAAAW128F429D538.json",
        r#"{"song_id":"S1","title":"T1","artist_id":"A1","artist_name":"AR1","artist_location":"L1","artist_latitude":1.0,"artist_longitude":2.0,"duration":200.5,"year":2000,"num_songs":1}"#,
    );

    let mut wh = fresh_warehouse();
    let mut progress = RecordingProgress::new();
    let report = PipelineDriver::new(&mut wh, catalog())
        .run(dir.path(), SourceKind::Songs, &mut progress)
        .unwrap();
    assert_eq!(report.files_found, 1);
    assert_eq!(report.files_processed, 1);

    assert_eq!(wh.row_count("songs").unwrap(), 1);
    assert_eq!(wh.row_count("artists").unwrap(), 1);

    let song = wh
        .query_row("SELECT song_id, title, artist_id, year, duration FROM songs", &[])
        .unwrap()
        .unwrap();
    assert_eq!(song[0].as_str(), Some("S1"));
    assert_eq!(song[1].as_str(), Some("T1"));
    assert_eq!(song[2].as_str(), Some("A1"));
    assert_eq!(song[3].as_i64(), Some(2000));
    assert_eq!(song[4].as_f64(), Some(200.5));

    let artist = wh
        .query_row("SELECT artist_id, name, location, latitude, longitude FROM artists", &[])
        .unwrap()
        .unwrap();
    assert_eq!(artist[0].as_str(), Some("A1"));
    assert_eq!(artist[1].as_str(), Some("AR1"));
    assert_eq!(artist[2].as_str(), Some("L1"));
    assert_eq!(artist[3].as_f64(), Some(1.0));
    assert_eq!(artist[4].as_f64(), Some(2.0));

    assert_eq!(
        progress.lines,
        vec![
            format!("1 files found in {}", dir.path().display()),
            "1/1 files processed.".to_string(),
        ]
    );
}

#[test]
fn test_event_log_loads_only_plays() {
    let songs = TempDir::new().unwrap();
    let logs = TempDir::new().unwrap();
    write(songs.path(), "song.json", &song_json("S1", "T1", "A1", "AR1"));

    let lines = [
        event_json("NextSong", 1_541_106_106_796, "T1", "AR1", 200.5, "free"),
        event_json("Home", 1_541_106_200_000, "", "", 0.0, "free"),
        event_json("NextSong", 1_541_106_352_796, "Unknown", "Nobody", 99.0, "paid"),
    ];
    write(logs.path(), "2018/11/2018-11-01-events.json", &lines.join("\n"));

    let mut wh = fresh_warehouse();
    let mut progress = RecordingProgress::new();
    let reports = PipelineDriver::new(&mut wh, catalog())
        .run_all(songs.path(), logs.path(), &mut progress)
        .unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1].files_processed, 1);

    assert_eq!(wh.row_count("songplays").unwrap(), 2);
    assert_eq!(wh.row_count("time").unwrap(), 2);
    assert_eq!(wh.row_count("users").unwrap(), 1);

    let matched = scalar(
        &mut wh,
        "SELECT COUNT(*) FROM songplays WHERE song_id = 'S1' AND artist_id = 'A1'",
    );
    let unmatched = scalar(
        &mut wh,
        "SELECT COUNT(*) FROM songplays WHERE song_id IS NULL AND artist_id IS NULL",
    );
    assert_eq!(matched.as_i64(), Some(1));
    assert_eq!(unmatched.as_i64(), Some(1));

    let level = scalar(&mut wh, "SELECT level FROM users WHERE user_id = '8'");
    assert_eq!(level.as_str(), Some("paid"));
}

#[test]
fn test_empty_tree_reports_zero_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "notes/readme.txt", "not json");

    let mut wh = fresh_warehouse();
    let mut progress = RecordingProgress::new();
    let mut driver = PipelineDriver::new(&mut wh, catalog());
    let report = driver
        .run(dir.path(), SourceKind::Events, &mut progress)
        .unwrap();

    assert_eq!(driver.state(), DriverState::Done);
    assert_eq!(report.files_found, 0);
    assert!(report.is_complete());
    assert_eq!(
        progress.lines,
        vec![format!("0 files found in {}", dir.path().display())]
    );
}

#[test]
fn test_load_failure_halts_run() {
    let dir = TempDir::new().unwrap();
    for i in 1..=5 {
        write(
            dir.path(),
            &format!("{i:02}.json"),
            &song_json(&format!("S{i}"), &format!("T{i}"), &format!("A{i}"), "AR"),
        );
    }

    let mut wh = FailingWarehouse::new(fresh_warehouse(), "S2");
    let mut progress = RecordingProgress::new();
    let mut driver = PipelineDriver::new(&mut wh, catalog());
    let err = driver
        .run(dir.path(), SourceKind::Songs, &mut progress)
        .unwrap_err();
    assert_eq!(driver.state(), DriverState::Failed(2));

    match &err {
        PipelineError::Load { path, source } => {
            assert!(path.ends_with("02.json"));
            assert!(matches!(source, LoadError::Connection(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(
        progress.lines,
        vec![
            format!("5 files found in {}", dir.path().display()),
            "1/5 files processed.".to_string(),
        ]
    );

    // File 1 stays committed; nothing of file 2 survives
    assert_eq!(wh.inner.row_count("songs").unwrap(), 1);
    assert_eq!(wh.inner.row_count("artists").unwrap(), 1);
    let kept = scalar(&mut wh.inner, "SELECT song_id FROM songs");
    assert_eq!(kept.as_str(), Some("S1"));

    // Files 3-5 are never attempted
    assert!(wh.saw("S2"));
    for id in ["S3", "S4", "S5"] {
        assert!(!wh.saw(id), "{id} was attempted");
    }
}

#[test]
fn test_continue_policy_skips_bad_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "01.json", &song_json("S1", "T1", "A1", "AR1"));
    write(dir.path(), "02.json", r#"{"song_id": "S2", "title": "#);
    write(dir.path(), "03.json", &song_json("S3", "T3", "A3", "AR3"));

    let mut wh = fresh_warehouse();
    let mut progress = RecordingProgress::new();
    let report = PipelineDriver::new(&mut wh, catalog())
        .with_policy(FailurePolicy::Continue)
        .run(dir.path(), SourceKind::Songs, &mut progress)
        .unwrap();

    assert_eq!(report.files_found, 3);
    assert_eq!(report.files_processed, 2);
    assert_eq!(report.failed_files.len(), 1);
    assert!(report.failed_files[0].path.ends_with("02.json"));
    assert!(!report.is_complete());
    assert_eq!(wh.row_count("songs").unwrap(), 2);
    assert_eq!(
        progress.lines.last().map(String::as_str),
        Some("3/3 files processed.")
    );
}

#[test]
fn test_malformed_log_line_rolls_back_file() {
    let logs = TempDir::new().unwrap();
    let good = event_json("NextSong", 1_541_106_106_796, "T1", "AR1", 200.5, "free");
    write(
        logs.path(),
        "events.json",
        &format!("{good}\n{{\"page\": \"NextSong\"\n"),
    );

    let mut wh = fresh_warehouse();
    let err = PipelineDriver::new(&mut wh, catalog())
        .run(logs.path(), SourceKind::Events, &mut RecordingProgress::new())
        .unwrap_err();

    assert!(err.is_parse_error());
    assert_eq!(wh.row_count("songplays").unwrap(), 0);
    assert_eq!(wh.row_count("users").unwrap(), 0);
}

#[test]
fn test_ignored_duplicates_are_not_counted_as_written() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "01.json", &song_json("S1", "T1", "A1", "AR1"));
    write(dir.path(), "02.json", &song_json("S1", "T1", "A1", "AR1"));

    let mut wh = fresh_warehouse();
    let report = PipelineDriver::new(&mut wh, catalog())
        .run(dir.path(), SourceKind::Songs, &mut RecordingProgress::new())
        .unwrap();

    assert_eq!(report.files_processed, 2);
    assert_eq!(report.rows_written, 2);
    assert_eq!(wh.row_count("songs").unwrap(), 1);
    assert_eq!(wh.row_count("artists").unwrap(), 1);
}
