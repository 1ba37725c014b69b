// crates/wlm-apex-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and report resolution helpers.
// Purpose: Ensure flags override config, sources resolve predictably, and
//          report output is rendered end to end.
// Dependencies: wlm-apex-cli main helpers
// ============================================================================

//! ## Overview
//! Exercises the private helpers behind `wlm-apex report`: flag parsing,
//! config overrides, source and sink resolution, and rendered output over a
//! JSON snapshot fixture.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;
use tempfile::TempDir;
use wlm_apex_cli::i18n::Locale;
use wlm_apex_config::WlmApexConfig;
use wlm_apex_core::ConcurrencyMode;
use wlm_apex_core::TiePolicy;
use wlm_apex_core::Timestamp;

use super::Cli;
use super::Commands;
use super::ConcurrencyArg;
use super::LangArg;
use super::LogArg;
use super::OutputFormat;
use super::ReportCommand;
use super::SourceChoice;
use super::TieArg;
use super::report_output;
use super::resolve_locale;
use super::resolve_now;
use super::resolve_params;
use super::resolve_source;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const SNAPSHOT: &str = r#"{
  "configs": [
    { "service_class": 6, "configured_concurrency": 10 },
    { "service_class": 7, "configured_concurrency": 3 }
  ],
  "executions": [
    { "service_class": 6, "user_id": 100, "slot_count": 3,
      "active_start": "2024-03-05 10:15:00", "active_end": "2024-03-05 10:20:00" },
    { "service_class": 6, "user_id": 101, "slot_count": 2,
      "active_start": 1709633820000, "active_end": 1709634300000 }
  ]
}"#;

fn parse_report(args: &[&str]) -> ReportCommand {
    let mut argv = vec!["wlm-apex", "report"];
    argv.extend_from_slice(args);
    match Cli::try_parse_from(argv).unwrap().command {
        Some(Commands::Report(command)) => command,
        other => panic!("expected report command, got {other:?}"),
    }
}

fn fixture(dir: &TempDir, config: &str) -> (PathBuf, PathBuf) {
    let snapshot = dir.path().join("wlm.json");
    fs::write(&snapshot, SNAPSHOT).unwrap();
    let config_path = dir.path().join("wlm-apex.toml");
    fs::write(&config_path, config).unwrap();
    (snapshot, config_path)
}

fn report_args<'a>(config: &'a Path, snapshot: &'a Path, format: &'a str) -> Vec<&'a str> {
    vec![
        "--config",
        config.to_str().unwrap(),
        "--snapshot",
        snapshot.to_str().unwrap(),
        "--window-seconds",
        "21600",
        "--now",
        "2024-03-05T12:00:00Z",
        "--format",
        format,
        "--log",
        "none",
    ]
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn report_flags_parse_into_command() {
    let command = parse_report(&[
        "--sqlite",
        "wlm.sqlite",
        "--window-seconds",
        "3600",
        "--granularity-seconds",
        "10",
        "--ties",
        "all",
        "--concurrency",
        "versioned",
        "--format",
        "csv",
        "--log",
        "stderr",
    ]);
    assert_eq!(command.sqlite, Some(PathBuf::from("wlm.sqlite")));
    assert_eq!(command.window_seconds, Some(3_600));
    assert_eq!(command.granularity_seconds, Some(10));
    assert_eq!(command.ties, Some(TieArg::All));
    assert_eq!(command.concurrency, Some(ConcurrencyArg::Versioned));
    assert_eq!(command.format, OutputFormat::Csv);
    assert_eq!(command.log, Some(LogArg::Stderr));
}

#[test]
fn report_format_defaults_to_text() {
    let command = parse_report(&[]);
    assert_eq!(command.format, OutputFormat::Text);
    assert!(command.ties.is_none());
}

#[test]
fn sqlite_and_snapshot_flags_conflict() {
    let result =
        Cli::try_parse_from(["wlm-apex", "report", "--sqlite", "a.sqlite", "--snapshot", "b.json"]);
    assert!(result.is_err());
}

#[test]
fn version_flag_is_global() {
    let cli = Cli::try_parse_from(["wlm-apex", "report", "--version"]).unwrap();
    assert!(cli.show_version);
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

#[test]
fn flags_override_only_the_params_they_name() {
    let config = WlmApexConfig::from_toml_str(
        "[report]\nwindow_seconds = 7200\nmin_user_id = 50\nconcurrency_mode = \"versioned\"\n",
    )
    .unwrap();
    let command = parse_report(&["--window-seconds", "3600", "--ties", "all"]);
    let params = resolve_params(&config, &command);
    assert_eq!(params.window_seconds, 3_600);
    assert_eq!(params.min_user_id, 50);
    assert_eq!(params.tie_policy, TiePolicy::AllInstants);
    assert_eq!(params.concurrency_mode, ConcurrencyMode::Versioned);
}

#[test]
fn sqlite_flag_keeps_configured_table_names() {
    let config = WlmApexConfig::from_toml_str(
        "[source]\npath = \"configured.sqlite\"\nconfig_table = \"wlm_config_history\"\n",
    )
    .unwrap();
    let command = parse_report(&["--sqlite", "override.sqlite"]);
    match resolve_source(&command, &config).unwrap() {
        SourceChoice::Sqlite(sqlite) => {
            assert_eq!(sqlite.path, PathBuf::from("override.sqlite"));
            assert_eq!(sqlite.config_table, "wlm_config_history");
        }
        SourceChoice::Snapshot(path) => panic!("unexpected snapshot {}", path.display()),
    }
}

#[test]
fn configured_snapshot_is_used_without_flags() {
    let config =
        WlmApexConfig::from_toml_str("[source]\ntype = \"snapshot\"\npath = \"wlm.json\"\n")
            .unwrap();
    let command = parse_report(&[]);
    assert_eq!(
        resolve_source(&command, &config).unwrap(),
        SourceChoice::Snapshot(PathBuf::from("wlm.json"))
    );
}

#[test]
fn missing_source_is_reported() {
    let command = parse_report(&[]);
    let err = resolve_source(&command, &WlmApexConfig::default()).unwrap_err();
    assert!(err.to_string().contains("--sqlite"));
}

#[test]
fn now_flag_parses_rfc3339() {
    let now = resolve_now(Some("2024-03-05T12:00:00Z")).unwrap();
    assert_eq!(now, Timestamp::parse_rfc3339("2024-03-05T12:00:00Z").unwrap());
    let err = resolve_now(Some("yesterday")).unwrap_err();
    assert!(err.to_string().contains("yesterday"));
}

#[test]
fn locale_flag_wins_over_environment() {
    assert_eq!(resolve_locale(Some(LangArg::Ca), Some("en")).unwrap(), Locale::Ca);
    assert_eq!(resolve_locale(None, Some("ca_ES.UTF-8")).unwrap(), Locale::Ca);
    assert_eq!(resolve_locale(None, None).unwrap(), Locale::En);
    let err = resolve_locale(None, Some("fr")).unwrap_err();
    assert!(err.to_string().contains("WLM_APEX_LANG"));
}

// ============================================================================
// SECTION: Report Output
// ============================================================================

#[test]
fn csv_output_lists_hourly_rows() {
    let dir = TempDir::new().unwrap();
    let (snapshot, config) = fixture(&dir, "");
    let command = parse_report(&report_args(&config, &snapshot, "csv"));
    let output = report_output(&command).unwrap();
    assert_eq!(
        output,
        concat!(
            "service_class,max_wlm_concurrency,day,hour,max_service_class_slots\n",
            "6,10,2024-03-05,10:00 - 10:59,5\n",
        )
    );
}

#[test]
fn json_output_is_canonical_report() {
    let dir = TempDir::new().unwrap();
    let (snapshot, config) = fixture(&dir, "");
    let command = parse_report(&report_args(&config, &snapshot, "json"));
    let output = report_output(&command).unwrap();
    let value: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["rows"][0]["hour"], Value::from("10:00 - 10:59"));
    assert_eq!(value["rows"][0]["max_service_class_slots"], Value::from(5));
    assert_eq!(value["stats"]["records_eligible"], Value::from(2));
    assert!(!output.contains(": "), "canonical JSON has no insignificant whitespace");
}

#[test]
fn text_output_reports_empty_window() {
    let dir = TempDir::new().unwrap();
    let (snapshot, config) = fixture(&dir, "");
    let mut args = report_args(&config, &snapshot, "text");
    args[7] = "2024-04-01T00:00:00Z";
    let output = report_output(&parse_report(&args)).unwrap();
    assert!(output.starts_with("No service class activity"));
    assert!(output.contains("0 rows from 0 executions"));
}

#[test]
fn configured_file_log_receives_events() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("events.log");
    let config_text = format!(
        "[logging]\nsink = \"file\"\npath = \"{}\"\n",
        log_path.display().to_string().replace('\\', "/")
    );
    let (snapshot, config) = fixture(&dir, &config_text);
    let mut args = report_args(&config, &snapshot, "text");
    args.truncate(args.len() - 2);
    report_output(&parse_report(&args)).unwrap();
    let lines = fs::read_to_string(&log_path).unwrap();
    assert_eq!(lines.lines().count(), 3);
    assert!(lines.contains("report_completed"));
}

#[test]
fn invalid_params_fail_the_report() {
    let dir = TempDir::new().unwrap();
    let (snapshot, config) = fixture(&dir, "");
    let mut args = report_args(&config, &snapshot, "csv");
    args.extend_from_slice(&["--granularity-seconds", "0"]);
    let err = report_output(&parse_report(&args)).unwrap_err();
    assert!(err.to_string().starts_with("Report failed"));
}
