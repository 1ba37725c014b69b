// crates/wlm-apex-core/src/runtime/axis.rs
// ============================================================================
// Module: WLM Apex Time Axis
// Description: Finite, restartable sequence of sampling instants.
// Purpose: Enumerate `now - k * step` without materializing the window.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! [`TimeAxis`] is a counter-driven iterator over the instants of a
//! [`ReportWindow`]. Forward iteration walks from `now` backwards in time;
//! [`TimeAxis::ascending`] walks oldest first, which is the order the
//! occupancy sweep needs. Cloning the axis restarts it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::iter::FusedIterator;
use std::iter::Rev;

use crate::core::ReportWindow;
use crate::core::Timestamp;

// ============================================================================
// SECTION: Time Axis
// ============================================================================

/// Iterator over `end - k * step_millis` for `k` in `0..instants`.
///
/// # Invariants
/// - Yields exactly `instants` values, strictly decreasing.
/// - Independent of any input data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeAxis {
    /// Latest instant (`k = 0`).
    end: Timestamp,
    /// Step between instants in milliseconds.
    step_millis: i64,
    /// Total number of instants in the window.
    instants: u64,
    /// Next `k` yielded from the front.
    front: u64,
    /// One past the last `k` yielded from the back.
    back: u64,
}

impl TimeAxis {
    /// Creates the axis for a window.
    #[must_use]
    pub const fn new(window: &ReportWindow) -> Self {
        Self {
            end: window.end,
            step_millis: window.step_millis,
            instants: window.instants,
            front: 0,
            back: window.instants,
        }
    }

    /// Returns a restarted axis ordered oldest instant first.
    #[must_use]
    pub fn ascending(&self) -> Rev<Self> {
        self.restarted().rev()
    }

    /// Returns a copy of the axis rewound to its first instant.
    #[must_use]
    pub const fn restarted(&self) -> Self {
        Self {
            end: self.end,
            step_millis: self.step_millis,
            instants: self.instants,
            front: 0,
            back: self.instants,
        }
    }

    /// Returns the instant at offset `k`.
    fn at(&self, k: u64) -> Timestamp {
        let offset = i64::try_from(k).map_or(i64::MAX, |k| k.saturating_mul(self.step_millis));
        Timestamp::from_unix_millis(self.end.as_unix_millis().saturating_sub(offset))
    }

    /// Returns the number of instants left.
    const fn remaining(&self) -> u64 {
        self.back.saturating_sub(self.front)
    }
}

impl Iterator for TimeAxis {
    type Item = Timestamp;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let instant = self.at(self.front);
        self.front += 1;
        Some(instant)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for TimeAxis {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.at(self.back))
    }
}

impl ExactSizeIterator for TimeAxis {}

impl FusedIterator for TimeAxis {}
