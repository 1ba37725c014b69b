// crates/wlm-apex-source-sqlite/tests/sqlite_source_unit.rs
// ============================================================================
// Module: SQLite Log Source Unit Tests
// Description: Targeted tests for the read-only SQLite log source.
// Purpose: Validate availability checks, decoding, filter push-down, and
//          end-to-end reports over SQLite fixtures.
// ============================================================================

//! ## Overview
//! Unit-level tests for the `SQLite` log source:
//! - Missing files and tables fail as unavailable
//! - Table identifiers are validated before use
//! - INTEGER and TEXT timestamps decode to the same instant
//! - Optional `effective_from` column is detected

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::Path;
use std::path::PathBuf;

use rusqlite::Connection;
use rusqlite::params;
use tempfile::TempDir;
use wlm_apex_core::ApexReporter;
use wlm_apex_core::ConcurrencyMode;
use wlm_apex_core::ReportParams;
use wlm_apex_core::ReportWindow;
use wlm_apex_core::ServiceClassId;
use wlm_apex_core::SourceError;
use wlm_apex_core::Timestamp;
use wlm_apex_core::WlmLogSource;
use wlm_apex_source_sqlite::SqliteSourceConfig;
use wlm_apex_source_sqlite::SqliteSourceError;
use wlm_apex_source_sqlite::SqliteWlmLogSource;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const NOW: &str = "2024-03-05T12:00:00Z";

fn fixture(dir: &TempDir, versioned: bool) -> PathBuf {
    let path = dir.path().join("wlm.sqlite");
    let connection = Connection::open(&path).unwrap();
    let effective_from = if versioned { ", effective_from" } else { "" };
    connection
        .execute_batch(&format!(
            "CREATE TABLE stv_wlm_service_class_config (service_class INTEGER NOT NULL, \
             num_query_tasks INTEGER NOT NULL{effective_from});
             CREATE TABLE stl_wlm_query (userid INTEGER NOT NULL, service_class INTEGER NOT \
             NULL, slot_count INTEGER NOT NULL, service_class_start_time, \
             service_class_end_time);"
        ))
        .unwrap();
    path
}

fn insert_config(path: &Path, class: i64, tasks: i64) {
    let connection = Connection::open(path).unwrap();
    connection
        .execute(
            "INSERT INTO stv_wlm_service_class_config (service_class, num_query_tasks) VALUES \
             (?1, ?2)",
            params![class, tasks],
        )
        .unwrap();
}

fn insert_query(path: &Path, user: i64, class: i64, slots: i64, start: &str, end: &str) {
    let connection = Connection::open(path).unwrap();
    connection
        .execute(
            "INSERT INTO stl_wlm_query VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user, class, slots, start, end],
        )
        .unwrap();
}

fn params_hours(window_hours: u64) -> ReportParams {
    ReportParams {
        window_seconds: window_hours * 3_600,
        ..ReportParams::default()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn missing_database_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let config = SqliteSourceConfig::new(dir.path().join("absent.sqlite"));
    let err = SqliteWlmLogSource::open(config).err().unwrap();
    assert!(matches!(err, SqliteSourceError::Unavailable(_)));
    assert!(!dir.path().join("absent.sqlite").exists());
}

#[test]
fn missing_table_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, false);
    let mut config = SqliteSourceConfig::new(&path);
    config.query_table = "stl_wlm_query_archive".to_string();
    let err = SqliteWlmLogSource::open(config).err().unwrap();
    assert_eq!(
        SourceError::from(err),
        SourceError::Unavailable("table not found: stl_wlm_query_archive".to_string())
    );
}

#[test]
fn table_names_must_be_identifiers() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, false);
    let mut config = SqliteSourceConfig::new(&path);
    config.config_table = "stv; DROP TABLE stl_wlm_query".to_string();
    assert!(matches!(config.validate(), Err(SqliteSourceError::Invalid(_))));
    config.config_table = String::new();
    assert!(matches!(config.validate(), Err(SqliteSourceError::Invalid(_))));
}

#[test]
fn directory_path_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = SqliteSourceConfig::new(dir.path());
    assert!(matches!(SqliteWlmLogSource::open(config), Err(SqliteSourceError::Invalid(_))));
}

#[test]
fn integer_and_text_timestamps_decode_identically() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, false);
    insert_query(&path, 100, 6, 3, "2024-03-05 10:15:00", "2024-03-05 10:20:00.000000");
    let connection = Connection::open(&path).unwrap();
    connection
        .execute(
            "INSERT INTO stl_wlm_query VALUES (?1, ?2, ?3, ?4, ?5)",
            params![101, 6, 3, 1_709_633_700_000_i64, 1_709_634_000_000_i64],
        )
        .unwrap();

    let source = SqliteWlmLogSource::open(SqliteSourceConfig::new(&path)).unwrap();
    let params = params_hours(6);
    let window = ReportWindow::ending_at(Timestamp::parse_rfc3339(NOW).unwrap(), &params).unwrap();
    let records = source.query_executions(&params.filter(&window)).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].active_start, records[1].active_start);
    assert_eq!(records[0].active_end, records[1].active_end);
}

#[test]
fn thresholds_are_pushed_into_the_query() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, false);
    insert_query(&path, 1, 6, 3, "2024-03-05 10:15:00", "2024-03-05 10:20:00");
    insert_query(&path, 100, 4, 3, "2024-03-05 10:15:00", "2024-03-05 10:20:00");
    insert_query(&path, 100, 6, 3, "2024-03-05 10:15:00", "2024-03-05 10:20:00");
    insert_query(&path, 100, 6, 3, "2024-02-01 10:15:00", "2024-02-01 10:20:00");

    let source = SqliteWlmLogSource::open(SqliteSourceConfig::new(&path)).unwrap();
    let params = params_hours(6);
    let window = ReportWindow::ending_at(Timestamp::parse_rfc3339(NOW).unwrap(), &params).unwrap();
    let records = source.query_executions(&params.filter(&window)).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].service_class, ServiceClassId::new(6));
}

#[test]
fn undecodable_timestamp_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, false);
    insert_query(&path, 100, 6, 3, "tuesday", "2024-03-05 10:20:00");

    let source = SqliteWlmLogSource::open(SqliteSourceConfig::new(&path)).unwrap();
    let params = params_hours(6);
    let window = ReportWindow::ending_at(Timestamp::parse_rfc3339(NOW).unwrap(), &params).unwrap();
    let err = source.query_executions(&params.filter(&window)).unwrap_err();
    assert!(matches!(err, SourceError::Corrupt(_)));
}

#[test]
fn effective_from_column_is_optional() {
    let dir = TempDir::new().unwrap();
    let plain = fixture(&dir, false);
    insert_config(&plain, 6, 10);
    let source = SqliteWlmLogSource::open(SqliteSourceConfig::new(&plain)).unwrap();
    assert!(!source.has_versioned_configs());
    let configs = source.service_class_configs().unwrap();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].effective_from, None);

    let versioned_dir = TempDir::new().unwrap();
    let versioned = fixture(&versioned_dir, true);
    let connection = Connection::open(&versioned).unwrap();
    connection
        .execute_batch(
            "INSERT INTO stv_wlm_service_class_config VALUES (6, 5, NULL);
             INSERT INTO stv_wlm_service_class_config VALUES (6, 8, '2024-03-05 10:30:00');",
        )
        .unwrap();
    let source = SqliteWlmLogSource::open(SqliteSourceConfig::new(&versioned)).unwrap();
    assert!(source.has_versioned_configs());
    let configs = source.service_class_configs().unwrap();
    assert_eq!(configs.len(), 2);
    assert!(configs.iter().any(|config| config.effective_from
        == Some(Timestamp::parse_rfc3339("2024-03-05T10:30:00Z").unwrap())));
}

#[test]
fn later_config_rows_win_in_current_mode() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, false);
    let connection = Connection::open(&path).unwrap();
    connection
        .execute_batch(
            "CREATE INDEX config_by_tasks ON stv_wlm_service_class_config (service_class, \
             num_query_tasks DESC);",
        )
        .unwrap();
    drop(connection);
    for (class, tasks) in [(6, 1), (7, 9), (6, 2), (8, 5), (6, 3), (9, 1), (6, 4)] {
        insert_config(&path, class, tasks);
    }
    insert_query(&path, 100, 6, 2, "2024-03-05 10:15:00", "2024-03-05 10:20:00");

    let source = SqliteWlmLogSource::open(SqliteSourceConfig::new(&path)).unwrap();
    let class_six: Vec<i64> = source
        .service_class_configs()
        .unwrap()
        .iter()
        .filter(|config| config.service_class == ServiceClassId::new(6))
        .map(|config| config.configured_concurrency)
        .collect();
    assert_eq!(class_six, vec![1, 2, 3, 4]);

    let report = ApexReporter::new(source, params_hours(6))
        .run(Timestamp::parse_rfc3339(NOW).unwrap())
        .unwrap();
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].max_wlm_concurrency, 4);
    assert_eq!(report.rows[0].max_service_class_slots, 2);
}

#[test]
fn config_view_is_readable() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, false);
    insert_config(&path, 6, 10);
    insert_config(&path, 7, 3);
    let connection = Connection::open(&path).unwrap();
    connection
        .execute_batch(
            "CREATE VIEW wlm_config_view AS SELECT service_class, num_query_tasks FROM \
             stv_wlm_service_class_config;",
        )
        .unwrap();
    drop(connection);

    let mut config = SqliteSourceConfig::new(&path);
    config.config_table = "wlm_config_view".to_string();
    let source = SqliteWlmLogSource::open(config).unwrap();
    let classes: Vec<ServiceClassId> =
        source.service_class_configs().unwrap().iter().map(|config| config.service_class).collect();
    assert_eq!(classes, vec![ServiceClassId::new(6), ServiceClassId::new(7)]);
}

#[test]
fn sqlite_source_feeds_a_versioned_report() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, true);
    let connection = Connection::open(&path).unwrap();
    connection
        .execute_batch(
            "INSERT INTO stv_wlm_service_class_config VALUES (6, 5, NULL);
             INSERT INTO stv_wlm_service_class_config VALUES (6, 8, '2024-03-05 11:00:00');",
        )
        .unwrap();
    drop(connection);
    insert_query(&path, 100, 6, 3, "2024-03-05 10:15:00", "2024-03-05 10:20:00");
    insert_query(&path, 101, 6, 2, "2024-03-05 10:17:00", "2024-03-05 10:25:00");
    insert_query(&path, 101, 6, 1, "2024-03-05 11:10:00", "2024-03-05 11:12:00");

    let source = SqliteWlmLogSource::open(SqliteSourceConfig::new(&path)).unwrap();
    let params = ReportParams {
        concurrency_mode: ConcurrencyMode::Versioned,
        ..params_hours(6)
    };
    let report = ApexReporter::new(source, params)
        .run(Timestamp::parse_rfc3339(NOW).unwrap())
        .unwrap();

    let summary: Vec<(String, i64, i64)> = report
        .rows
        .iter()
        .map(|row| (row.hour.clone(), row.max_wlm_concurrency, row.max_service_class_slots))
        .collect();
    assert_eq!(summary, vec![
        ("10:00 - 10:59".to_string(), 5, 5),
        ("11:00 - 11:59".to_string(), 8, 1),
    ]);
}
