// crates/wlm-apex-core/src/core/time.rs
// ============================================================================
// Module: WLM Apex Time Model
// Description: UTC timestamps, calendar days, and hour buckets.
// Purpose: Keep time-bucketing explicit and free of local-time conversion.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! All instants are unix epoch milliseconds interpreted in UTC. Calendar day
//! and hour are derived with the `time` crate against UTC only, so a report
//! generated on any host buckets identically.
//!
//! Timestamps accept two wire forms on input: integer epoch milliseconds and
//! RFC 3339 strings. Host log dumps additionally use the SQL text form
//! `YYYY-MM-DD HH:MM:SS[.ffffff]`, which [`Timestamp::parse_host_text`] reads
//! as UTC.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use thiserror::Error;
use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Milliseconds per second.
pub const MILLIS_PER_SECOND: i64 = 1_000;
/// Nanoseconds per millisecond.
const NANOS_PER_MILLI: i128 = 1_000_000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Time conversion errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeError {
    /// Timestamp cannot be represented as a calendar date.
    #[error("timestamp out of range: {0} ms")]
    OutOfRange(i64),
    /// Timestamp text could not be parsed.
    #[error("invalid timestamp {value:?}: {reason}")]
    Parse {
        /// Rejected input text.
        value: String,
        /// Parser failure detail.
        reason: String,
    },
}

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// UTC instant with millisecond precision.
///
/// # Invariants
/// - Value is unix epoch milliseconds; no timezone offset is ever applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Creates a timestamp from unix epoch seconds (returns `None` on overflow).
    #[must_use]
    pub const fn from_unix_seconds(seconds: i64) -> Option<Self> {
        match seconds.checked_mul(MILLIS_PER_SECOND) {
            Some(millis) => Some(Self(millis)),
            None => None,
        }
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Returns the timestamp truncated to the whole second (towards negative infinity).
    #[must_use]
    pub const fn truncate_to_second(self) -> Self {
        Self(self.0.div_euclid(MILLIS_PER_SECOND) * MILLIS_PER_SECOND)
    }

    /// Shifts the timestamp backwards by `millis` (returns `None` on overflow).
    #[must_use]
    pub const fn checked_sub_millis(self, millis: i64) -> Option<Self> {
        match self.0.checked_sub(millis) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Shifts the timestamp forwards by `millis` (returns `None` on overflow).
    #[must_use]
    pub const fn checked_add_millis(self, millis: i64) -> Option<Self> {
        match self.0.checked_add(millis) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Returns the current wall-clock time truncated to the whole second.
    #[must_use]
    pub fn now_utc() -> Self {
        let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
        let millis = i64::try_from(nanos.div_euclid(NANOS_PER_MILLI)).unwrap_or(i64::MAX);
        Self(millis).truncate_to_second()
    }

    /// Parses an RFC 3339 timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError`] when the text is not valid RFC 3339 or out of range.
    pub fn parse_rfc3339(value: &str) -> Result<Self, TimeError> {
        let parsed = OffsetDateTime::parse(value.trim(), &Rfc3339).map_err(|err| {
            TimeError::Parse {
                value: value.to_string(),
                reason: err.to_string(),
            }
        })?;
        Self::from_offset_datetime(parsed, value)
    }

    /// Parses a host log timestamp: SQL text form (UTC) or RFC 3339.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError`] when neither form matches.
    pub fn parse_host_text(value: &str) -> Result<Self, TimeError> {
        let trimmed = value.trim();
        let format = format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
        );
        match PrimitiveDateTime::parse(trimmed, &format) {
            Ok(parsed) => Self::from_offset_datetime(parsed.assume_utc(), value),
            Err(_) => Self::parse_rfc3339(trimmed),
        }
    }

    /// Formats the timestamp as RFC 3339 in UTC.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::OutOfRange`] when the instant has no calendar form.
    pub fn to_rfc3339(self) -> Result<String, TimeError> {
        let datetime = self.to_offset_datetime()?;
        datetime.format(&Rfc3339).map_err(|err| TimeError::Parse {
            value: self.0.to_string(),
            reason: err.to_string(),
        })
    }

    /// Returns the UTC calendar hour bucket containing this instant.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::OutOfRange`] when the instant has no calendar form.
    pub fn hour_bucket(self) -> Result<HourBucket, TimeError> {
        let datetime = self.to_offset_datetime()?;
        Ok(HourBucket {
            day: CalendarDay {
                year: datetime.year(),
                month: u8::from(datetime.month()),
                day: datetime.day(),
            },
            hour: datetime.hour(),
        })
    }

    /// Converts to a UTC `OffsetDateTime`.
    fn to_offset_datetime(self) -> Result<OffsetDateTime, TimeError> {
        let nanos = i128::from(self.0) * NANOS_PER_MILLI;
        OffsetDateTime::from_unix_timestamp_nanos(nanos).map_err(|_| TimeError::OutOfRange(self.0))
    }

    /// Converts a parsed datetime into milliseconds, flooring sub-millisecond precision.
    fn from_offset_datetime(datetime: OffsetDateTime, source: &str) -> Result<Self, TimeError> {
        let millis = datetime.unix_timestamp_nanos().div_euclid(NANOS_PER_MILLI);
        i64::try_from(millis).map(Self).map_err(|_| TimeError::Parse {
            value: source.to_string(),
            reason: "timestamp exceeds millisecond range".to_string(),
        })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rfc3339() {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{}ms", self.0),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

/// Accepted wire forms for timestamps.
#[derive(Deserialize)]
#[serde(untagged)]
enum TimestampWire {
    /// Unix epoch milliseconds.
    Millis(i64),
    /// RFC 3339 or host SQL text.
    Text(String),
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match TimestampWire::deserialize(deserializer)? {
            TimestampWire::Millis(millis) => Ok(Self(millis)),
            TimestampWire::Text(text) => {
                Self::parse_host_text(&text).map_err(serde::de::Error::custom)
            }
        }
    }
}

// ============================================================================
// SECTION: Calendar Buckets
// ============================================================================

/// UTC calendar day.
///
/// # Invariants
/// - Field order makes the derived ordering chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalendarDay {
    /// Calendar year.
    pub year: i32,
    /// Month of year (1-12).
    pub month: u8,
    /// Day of month (1-31).
    pub day: u8,
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl Serialize for CalendarDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// UTC (day, hour) bucket used by the hourly reducer.
///
/// # Invariants
/// - `hour` is in `0..=23`.
/// - Ordering is chronological (day first, then hour).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HourBucket {
    /// Calendar day of the bucket.
    pub day: CalendarDay,
    /// Hour of day (0-23).
    pub hour: u8,
}

impl HourBucket {
    /// Returns the report label for the hour, e.g. `09:00 - 09:59`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{hour:02}:00 - {hour:02}:59", hour = self.hour)
    }
}
