// crates/wlm-apex-core/src/core/params.rs
// ============================================================================
// Module: WLM Apex Report Parameters
// Description: Tunables, validation, and the derived sampling window.
// Purpose: Turn user-supplied knobs into a bounded, validated window and filter.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`ReportParams`] holds every tunable of a report run. Validation bounds the
//! number of sampled instants so a run always terminates in bounded memory
//! and time. [`ReportWindow`] and [`ExecutionFilter`] are derived from the
//! params and a caller-supplied `now`; the core never reads the clock itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::ServiceClassId;
use crate::core::identifiers::UserId;
use crate::core::model::QueryExecutionRecord;
use crate::core::time::MILLIS_PER_SECOND;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default lookback window: seven days.
pub const DEFAULT_WINDOW_SECONDS: u64 = 604_800;
/// Default sampling granularity.
pub const DEFAULT_GRANULARITY_SECONDS: u64 = 1;
/// Service classes at or below this value are reserved by the host.
pub const DEFAULT_MIN_SERVICE_CLASS: i64 = 4;
/// User ids at or below this value are internal users.
pub const DEFAULT_MIN_USER_ID: i64 = 1;
/// Upper bound on sampled instants per run (one year at one-second resolution).
pub const MAX_SAMPLE_INSTANTS: u64 = 31_536_000;

// ============================================================================
// SECTION: Policies
// ============================================================================

/// How ties for the hourly maximum are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiePolicy {
    /// One row per bucket, taken from the earliest instant reaching the maximum.
    #[default]
    FirstInstant,
    /// One row per instant reaching the maximum (legacy duplicated rows).
    AllInstants,
}

/// How the configured concurrency is resolved for historical instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyMode {
    /// Latest config row per class applies to every instant.
    #[default]
    Current,
    /// The row in effect at each instant applies.
    Versioned,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Parameter validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamsError {
    /// Window size must be positive.
    #[error("window_seconds must be greater than zero")]
    ZeroWindow,
    /// Granularity must be positive.
    #[error("granularity_seconds must be greater than zero")]
    ZeroGranularity,
    /// Granularity cannot exceed the window.
    #[error("granularity_seconds ({granularity}) exceeds window_seconds ({window})")]
    GranularityExceedsWindow {
        /// Configured granularity.
        granularity: u64,
        /// Configured window.
        window: u64,
    },
    /// Too many instants would be sampled.
    #[error("window produces {instants} instants (max {max})")]
    TooManyInstants {
        /// Requested instant count.
        instants: u64,
        /// Maximum permitted instant count.
        max: u64,
    },
    /// Window arithmetic overflowed the timestamp range.
    #[error("window does not fit the timestamp range")]
    Overflow,
}

// ============================================================================
// SECTION: Parameters
// ============================================================================

/// Tunables for one report run.
///
/// # Invariants
/// - Thresholds are exclusive: only classes `> min_service_class` and users
///   `> min_user_id` are sampled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportParams {
    /// Lookback window in seconds.
    pub window_seconds: u64,
    /// Sampling step in seconds.
    pub granularity_seconds: u64,
    /// Exclusive lower bound for service classes.
    pub min_service_class: i64,
    /// Exclusive lower bound for user ids.
    pub min_user_id: i64,
    /// Tie reporting policy.
    pub tie_policy: TiePolicy,
    /// Concurrency resolution mode.
    pub concurrency_mode: ConcurrencyMode,
}

impl Default for ReportParams {
    fn default() -> Self {
        Self {
            window_seconds: DEFAULT_WINDOW_SECONDS,
            granularity_seconds: DEFAULT_GRANULARITY_SECONDS,
            min_service_class: DEFAULT_MIN_SERVICE_CLASS,
            min_user_id: DEFAULT_MIN_USER_ID,
            tie_policy: TiePolicy::default(),
            concurrency_mode: ConcurrencyMode::default(),
        }
    }
}

impl ReportParams {
    /// Returns the number of instants the window samples.
    ///
    /// # Errors
    ///
    /// Returns [`ParamsError`] when the params are out of bounds.
    pub fn instant_count(&self) -> Result<u64, ParamsError> {
        if self.window_seconds == 0 {
            return Err(ParamsError::ZeroWindow);
        }
        if self.granularity_seconds == 0 {
            return Err(ParamsError::ZeroGranularity);
        }
        if self.granularity_seconds > self.window_seconds {
            return Err(ParamsError::GranularityExceedsWindow {
                granularity: self.granularity_seconds,
                window: self.window_seconds,
            });
        }
        let instants = self.window_seconds / self.granularity_seconds;
        if instants > MAX_SAMPLE_INSTANTS {
            return Err(ParamsError::TooManyInstants {
                instants,
                max: MAX_SAMPLE_INSTANTS,
            });
        }
        Ok(instants)
    }

    /// Validates the params.
    ///
    /// # Errors
    ///
    /// Returns [`ParamsError`] when the params are out of bounds.
    pub fn validate(&self) -> Result<(), ParamsError> {
        self.instant_count().map(|_| ())
    }

    /// Builds the record filter for a window.
    #[must_use]
    pub const fn filter(&self, window: &ReportWindow) -> ExecutionFilter {
        ExecutionFilter {
            min_service_class: ServiceClassId::new(self.min_service_class),
            min_user_id: UserId::new(self.min_user_id),
            window_start: window.start,
            window_end: window.end,
        }
    }
}

// ============================================================================
// SECTION: Window
// ============================================================================

/// Sampled instants of a run: `end - k * step` for `k` in `0..instants`.
///
/// # Invariants
/// - `instants >= 1` and `start == end - (instants - 1) * step_millis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportWindow {
    /// Earliest sampled instant.
    pub start: Timestamp,
    /// Latest sampled instant (`now`).
    pub end: Timestamp,
    /// Distance between consecutive instants in milliseconds.
    pub step_millis: i64,
    /// Number of sampled instants.
    pub instants: u64,
}

impl ReportWindow {
    /// Derives the window ending at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ParamsError`] when the params are invalid or overflow.
    pub fn ending_at(now: Timestamp, params: &ReportParams) -> Result<Self, ParamsError> {
        let instants = params.instant_count()?;
        let step_seconds =
            i64::try_from(params.granularity_seconds).map_err(|_| ParamsError::Overflow)?;
        let step_millis = step_seconds.checked_mul(MILLIS_PER_SECOND).ok_or(ParamsError::Overflow)?;
        let span_steps = i64::try_from(instants - 1).map_err(|_| ParamsError::Overflow)?;
        let span = span_steps.checked_mul(step_millis).ok_or(ParamsError::Overflow)?;
        let start = now.checked_sub_millis(span).ok_or(ParamsError::Overflow)?;
        Ok(Self {
            start,
            end: now,
            step_millis,
            instants,
        })
    }
}

// ============================================================================
// SECTION: Filter
// ============================================================================

/// Eligibility filter applied to executions and config rows.
///
/// # Invariants
/// - Bounds are exclusive; the window overlap test is half-open on the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExecutionFilter {
    /// Exclusive lower bound for service classes.
    pub min_service_class: ServiceClassId,
    /// Exclusive lower bound for user ids.
    pub min_user_id: UserId,
    /// Earliest sampled instant.
    pub window_start: Timestamp,
    /// Latest sampled instant.
    pub window_end: Timestamp,
}

impl ExecutionFilter {
    /// Returns true when the service class is above the reserved range.
    #[must_use]
    pub fn accepts_class(&self, service_class: ServiceClassId) -> bool {
        service_class > self.min_service_class
    }

    /// Returns true when the record can contribute to any sampled instant.
    #[must_use]
    pub fn accepts(&self, record: &QueryExecutionRecord) -> bool {
        record.user_id > self.min_user_id
            && self.accepts_class(record.service_class)
            && record.active_start < record.active_end
            && record.active_start <= self.window_end
            && record.active_end > self.window_start
    }
}
