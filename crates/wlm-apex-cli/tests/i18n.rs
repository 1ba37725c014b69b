// crates/wlm-apex-cli/tests/i18n.rs
// ============================================================================
// Module: CLI i18n Tests
// Description: Exercises the translation catalog and placeholder substitution.
// Purpose: Ensure CLI user-facing strings route through stable i18n helpers.
// Dependencies: wlm-apex-cli i18n module and the `t!` macro.
// ============================================================================

//! ## Overview
//! Validates the WLM Apex CLI i18n catalog behavior:
//! - Message arguments capture key/value substitutions.
//! - Translation falls back to keys on misses.
//! - The [`t!`](wlm_apex_cli::t) macro formats placeholders correctly.

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

use wlm_apex_cli::i18n::MessageArg;
use wlm_apex_cli::i18n::translate;
use wlm_apex_cli::t;

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Confirms message arguments capture key/value pairs.
#[test]
fn message_arg_new_captures_key_and_value() {
    let arg = MessageArg::new("path", "/var/lib/wlm.sqlite");
    assert_eq!(arg.key, "path");
    assert_eq!(arg.value, "/var/lib/wlm.sqlite");
}

/// Confirms catalog entries resolve and replace placeholders.
#[test]
fn translate_substitutes_placeholders() {
    let args = vec![MessageArg::new("error", "window_seconds must be greater than zero")];
    let result = translate("report.failed", args);
    assert_eq!(result, "Report failed: window_seconds must be greater than zero");
}

/// Confirms missing keys fall back to the key string.
#[test]
fn translate_falls_back_to_key() {
    let result = translate("missing.key", Vec::new());
    assert_eq!(result, "missing.key");
}

/// Confirms the t! macro formats named arguments.
#[test]
fn t_macro_formats_message() {
    let rendered = t!("main.version", version = "0.1.0");
    assert_eq!(rendered, "wlm-apex 0.1.0");
}

/// Confirms numeric arguments are formatted through `Display`.
#[test]
fn t_macro_formats_numeric_arguments() {
    let rendered = t!("report.summary", rows = 2, records = 5, configs = 1, samples = 3_600_u64);
    assert_eq!(rendered, "2 rows from 5 executions and 1 config rows (3600 samples).");
}
