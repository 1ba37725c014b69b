// crates/wlm-apex-core/src/core/events.rs
// ============================================================================
// Module: WLM Apex Report Events
// Description: Structured lifecycle events emitted by report runs.
// Purpose: Give operators a JSON-line trail of each run without a logging framework.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Each pipeline stage boundary produces a [`ReportEvent`]. Events carry
//! counters only; they never embed execution rows.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Lifecycle stage of a report run.
///
/// # Invariants
/// - Variants are stable for log labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStage {
    /// Run accepted and params validated.
    Started,
    /// Config and execution rows loaded from the source.
    SourceLoaded,
    /// Report assembled.
    Completed,
    /// Run aborted.
    Failed,
}

impl ReportStage {
    /// Returns the event label for the stage.
    #[must_use]
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::Started => "report_started",
            Self::SourceLoaded => "source_loaded",
            Self::Completed => "report_completed",
            Self::Failed => "report_failed",
        }
    }
}

/// Report lifecycle event payload.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Lifecycle stage.
    pub stage: ReportStage,
    /// Report `now` as epoch milliseconds.
    pub report_now_ms: i64,
    /// Config rows in use, when known.
    pub configs: Option<usize>,
    /// Execution rows loaded, when known.
    pub records: Option<usize>,
    /// Samples produced, when known.
    pub samples: Option<u64>,
    /// Report rows produced, when known.
    pub rows: Option<usize>,
    /// Failure detail for [`ReportStage::Failed`].
    pub message: Option<String>,
}

impl ReportEvent {
    /// Creates an event for `stage` stamped with the current wall-clock time.
    #[must_use]
    pub fn new(stage: ReportStage, report_now_ms: i64) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: stage.event_name(),
            timestamp_ms,
            stage,
            report_now_ms,
            configs: None,
            records: None,
            samples: None,
            rows: None,
            message: None,
        }
    }
}
