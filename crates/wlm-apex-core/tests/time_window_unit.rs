// crates/wlm-apex-core/tests/time_window_unit.rs
// ============================================================================
// Module: Time and Window Unit Tests
// Description: Timestamp parsing, hour buckets, params, and the time axis.
// Purpose: Pin UTC bucketing and window arithmetic.
// ============================================================================

//! Time, params, and axis unit tests.

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

use wlm_apex_core::MAX_SAMPLE_INSTANTS;
use wlm_apex_core::ParamsError;
use wlm_apex_core::ReportParams;
use wlm_apex_core::ReportWindow;
use wlm_apex_core::TimeAxis;
use wlm_apex_core::Timestamp;

#[test]
fn host_text_timestamps_are_read_as_utc() {
    let sql = Timestamp::parse_host_text("2024-03-05 10:15:00.123456").unwrap();
    assert_eq!(sql.as_unix_millis(), 1_709_633_700_123);
    let rfc = Timestamp::parse_host_text("2024-03-05T12:15:00+02:00").unwrap();
    assert_eq!(rfc.as_unix_millis(), 1_709_633_700_000);
    assert!(Timestamp::parse_host_text("yesterday").is_err());
}

#[test]
fn hour_bucket_uses_utc_calendar() {
    let bucket = Timestamp::parse_rfc3339("2024-03-04T23:59:59.999Z").unwrap().hour_bucket().unwrap();
    assert_eq!(bucket.day.to_string(), "2024-03-04");
    assert_eq!(bucket.hour, 23);
    assert_eq!(bucket.label(), "23:00 - 23:59");

    let next = Timestamp::from_unix_millis(1_709_596_800_000).hour_bucket().unwrap();
    assert_eq!(next.day.to_string(), "2024-03-05");
    assert_eq!(next.label(), "00:00 - 00:59");
    assert!(bucket < next);
}

#[test]
fn timestamps_deserialize_from_millis_or_text() {
    let from_millis: Timestamp = serde_json::from_str("1709633700000").unwrap();
    let from_text: Timestamp = serde_json::from_str("\"2024-03-05 10:15:00\"").unwrap();
    assert_eq!(from_millis, from_text);
    assert_eq!(serde_json::to_string(&from_text).unwrap(), "1709633700000");
}

#[test]
fn default_params_cover_seven_days_at_one_second() {
    let params = ReportParams::default();
    assert_eq!(params.instant_count().unwrap(), 604_800);
    assert_eq!(params.min_service_class, 4);
    assert_eq!(params.min_user_id, 1);
}

#[test]
fn params_validation_rejects_degenerate_windows() {
    let zero_window = ReportParams {
        window_seconds: 0,
        ..ReportParams::default()
    };
    assert_eq!(zero_window.validate(), Err(ParamsError::ZeroWindow));

    let coarse = ReportParams {
        window_seconds: 10,
        granularity_seconds: 11,
        ..ReportParams::default()
    };
    assert_eq!(coarse.validate(), Err(ParamsError::GranularityExceedsWindow {
        granularity: 11,
        window: 10,
    }));

    let huge = ReportParams {
        window_seconds: MAX_SAMPLE_INSTANTS + 1,
        ..ReportParams::default()
    };
    assert!(matches!(huge.validate(), Err(ParamsError::TooManyInstants { .. })));
}

#[test]
fn window_spans_n_instants_ending_at_now() {
    let now = Timestamp::from_unix_millis(1_709_640_000_000);
    let params = ReportParams {
        window_seconds: 10,
        granularity_seconds: 3,
        ..ReportParams::default()
    };
    let window = ReportWindow::ending_at(now, &params).unwrap();
    assert_eq!(window.instants, 3);
    assert_eq!(window.start.as_unix_millis(), 1_709_640_000_000 - 6_000);

    let axis = TimeAxis::new(&window);
    assert_eq!(axis.len(), 3);
    let descending: Vec<i64> = axis.clone().map(Timestamp::as_unix_millis).collect();
    assert_eq!(descending, vec![1_709_640_000_000, 1_709_639_997_000, 1_709_639_994_000]);
    let ascending: Vec<i64> = axis.ascending().map(Timestamp::as_unix_millis).collect();
    assert_eq!(ascending, vec![1_709_639_994_000, 1_709_639_997_000, 1_709_640_000_000]);
}

#[test]
fn partially_consumed_axis_restarts_from_now() {
    let now = Timestamp::from_unix_millis(0);
    let params = ReportParams {
        window_seconds: 4,
        ..ReportParams::default()
    };
    let window = ReportWindow::ending_at(now, &params).unwrap();
    let mut axis = TimeAxis::new(&window);
    assert_eq!(axis.next(), Some(now));
    assert_eq!(axis.len(), 3);
    assert_eq!(axis.restarted().count(), 4);
    assert_eq!(axis.ascending().last(), Some(now));
}
