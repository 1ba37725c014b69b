// crates/wlm-apex-core/src/core/model.rs
// ============================================================================
// Module: WLM Apex Data Model
// Description: Input log rows, derived samples, and report rows.
// Purpose: Provide the canonical serializable shapes shared by every stage.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Inputs mirror the host WLM tables: one [`QueueClassConfig`] per service
//! class (optionally versioned) and one [`QueryExecutionRecord`] per query
//! execution. Every other type here is derived and recomputed per run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ServiceClassId;
use crate::core::identifiers::UserId;
use crate::core::time::CalendarDay;
use crate::core::time::HourBucket;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Inputs
// ============================================================================

/// Configured concurrency for a WLM service class.
///
/// # Invariants
/// - `effective_from` is `None` for the host's single current row; it only
///   matters when concurrency is resolved in versioned mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueClassConfig {
    /// Service class the setting applies to.
    pub service_class: ServiceClassId,
    /// Maximum parallel task slots (`num_query_tasks`).
    pub configured_concurrency: i64,
    /// Instant from which this row applies.
    #[serde(default)]
    pub effective_from: Option<Timestamp>,
}

/// A single queued or running query execution from the host log.
///
/// # Invariants
/// - The active interval is half-open: `[active_start, active_end)`.
/// - Rows with `active_end <= active_start` cover no instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryExecutionRecord {
    /// Service class the query ran in.
    pub service_class: ServiceClassId,
    /// User that issued the query.
    pub user_id: UserId,
    /// Slots consumed by the execution.
    pub slot_count: i64,
    /// Inclusive start of the active interval.
    pub active_start: Timestamp,
    /// Exclusive end of the active interval.
    pub active_end: Timestamp,
}

// ============================================================================
// SECTION: Derived Values
// ============================================================================

/// Occupancy of one service class at one sampled instant.
///
/// # Invariants
/// - `sample_count >= 1`; instants with no active execution are not sampled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupancySample {
    /// Sampled instant.
    pub instant: Timestamp,
    /// Service class sampled.
    pub service_class: ServiceClassId,
    /// Concurrency setting in effect for the sample.
    pub configured_concurrency: i64,
    /// Number of executions active at the instant.
    pub sample_count: u64,
    /// Sum of `slot_count` over the active executions.
    pub total_slots: i64,
}

/// Maximum slot occupancy for one (service class, day, hour) bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyMax {
    /// Service class of the bucket.
    pub service_class: ServiceClassId,
    /// UTC calendar day of the bucket.
    pub day: CalendarDay,
    /// UTC hour of the bucket.
    pub hour: u8,
    /// Largest `total_slots` seen in the bucket.
    pub max_slots: i64,
}

impl HourlyMax {
    /// Returns the bucket as an [`HourBucket`].
    #[must_use]
    pub const fn bucket(&self) -> HourBucket {
        HourBucket {
            day: self.day,
            hour: self.hour,
        }
    }
}

/// Hourly maximum together with the samples that reached it.
///
/// # Invariants
/// - `winners` is non-empty and every entry has `total_slots == max.max_slots`.
/// - `winners` is ordered by instant ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyPeak {
    /// Bucket maximum.
    pub max: HourlyMax,
    /// Samples achieving the maximum.
    pub winners: Vec<OccupancySample>,
}

/// One output row of the apex report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    /// Service class of the row.
    pub service_class: ServiceClassId,
    /// Configured concurrency at the peak instant.
    pub max_wlm_concurrency: i64,
    /// UTC calendar day.
    pub day: CalendarDay,
    /// Hour label (`HH:00 - HH:59`).
    pub hour: String,
    /// Peak concurrent slots in the hour.
    pub max_service_class_slots: i64,
}
