// crates/wlm-apex-core/src/runtime/sampler.rs
// ============================================================================
// Module: WLM Apex Occupancy Sampler
// Description: Per-instant slot occupancy for each eligible service class.
// Purpose: Count executions whose half-open interval covers each sampled instant.
// Dependencies: crate::core, crate::runtime::axis
// ============================================================================

//! ## Overview
//! The sampler turns execution rows into a stream of [`OccupancySample`]s.
//! Rather than scanning every row for every instant, each service class is
//! reduced to a sorted list of start and end events, and a sweep over the
//! ascending time axis keeps running totals. An instant `t` sees every event
//! with `at <= t` applied, which is exactly `active_start <= t < active_end`.
//!
//! ## Invariants
//! - Only rows accepted by the [`ExecutionFilter`] and whose class has a
//!   config row contribute.
//! - Instants with no active execution produce no sample.
//! - Samples are yielded per class ascending, then per instant ascending.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::iter::Rev;

use crate::core::ConcurrencyMode;
use crate::core::ExecutionFilter;
use crate::core::OccupancySample;
use crate::core::QueryExecutionRecord;
use crate::core::QueueClassConfig;
use crate::core::ReportWindow;
use crate::core::ServiceClassId;
use crate::core::Timestamp;
use crate::runtime::axis::TimeAxis;

// ============================================================================
// SECTION: Concurrency Resolution
// ============================================================================

/// A concurrency setting and the instant it applies from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ConcurrencyVersion {
    /// First instant the setting applies to (`None` means always).
    from: Option<Timestamp>,
    /// Configured concurrency.
    value: i64,
}

/// Ordered concurrency settings for one service class.
///
/// # Invariants
/// - `versions` is sorted by `from` with `None` first.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ConcurrencyTimeline {
    /// Settings ordered by start instant.
    versions: Vec<ConcurrencyVersion>,
}

impl ConcurrencyTimeline {
    /// Builds the timeline for `mode` from unordered config rows.
    fn build(mut versions: Vec<ConcurrencyVersion>, mode: ConcurrencyMode) -> Self {
        versions.sort_by_key(|version| version.from);
        match mode {
            ConcurrencyMode::Versioned => Self {
                versions,
            },
            ConcurrencyMode::Current => {
                let latest = versions.last().map(|version| ConcurrencyVersion {
                    from: None,
                    value: version.value,
                });
                Self {
                    versions: latest.into_iter().collect(),
                }
            }
        }
    }

    /// Returns the setting in effect at `instant`.
    fn resolve(&self, instant: Timestamp) -> Option<i64> {
        let index = self
            .versions
            .partition_point(|version| version.from.is_none_or(|from| from <= instant));
        index.checked_sub(1).and_then(|last| self.versions.get(last)).map(|version| version.value)
    }
}

// ============================================================================
// SECTION: Sweep Events
// ============================================================================

/// Direction of a slot event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotEventKind {
    /// Execution becomes active.
    Start,
    /// Execution stops being active.
    End,
}

/// Boundary of one execution's active interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SlotEvent {
    /// Instant of the boundary.
    at: Timestamp,
    /// Boundary direction.
    kind: SlotEventKind,
    /// Slots consumed by the execution.
    slots: i64,
}

/// Sweep inputs for one service class.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ClassLane {
    /// Service class of the lane.
    service_class: ServiceClassId,
    /// Interval boundaries sorted by instant.
    events: Vec<SlotEvent>,
    /// Concurrency settings for the class.
    concurrency: ConcurrencyTimeline,
}

// ============================================================================
// SECTION: Sampler
// ============================================================================

/// Prepared occupancy sampler over a fixed set of rows.
///
/// # Invariants
/// - Lanes are ordered by service class and contain at least one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancySampler {
    /// Per-class sweep inputs.
    lanes: Vec<ClassLane>,
    /// Number of service classes with a usable config row.
    configured_classes: usize,
    /// Number of execution rows that contribute.
    eligible_records: usize,
}

impl OccupancySampler {
    /// Prepares the sampler from config and execution rows.
    #[must_use]
    pub fn new(
        configs: &[QueueClassConfig],
        records: &[QueryExecutionRecord],
        filter: &ExecutionFilter,
        mode: ConcurrencyMode,
    ) -> Self {
        let mut versions: BTreeMap<ServiceClassId, Vec<ConcurrencyVersion>> = BTreeMap::new();
        for config in configs.iter().filter(|config| filter.accepts_class(config.service_class)) {
            versions.entry(config.service_class).or_default().push(ConcurrencyVersion {
                from: config.effective_from,
                value: config.configured_concurrency,
            });
        }
        let configured_classes = versions.len();

        let mut events: BTreeMap<ServiceClassId, Vec<SlotEvent>> = BTreeMap::new();
        let mut eligible_records = 0;
        for record in records {
            if !filter.accepts(record) || !versions.contains_key(&record.service_class) {
                continue;
            }
            eligible_records += 1;
            let lane = events.entry(record.service_class).or_default();
            lane.push(SlotEvent {
                at: record.active_start,
                kind: SlotEventKind::Start,
                slots: record.slot_count,
            });
            lane.push(SlotEvent {
                at: record.active_end,
                kind: SlotEventKind::End,
                slots: record.slot_count,
            });
        }

        let lanes = events
            .into_iter()
            .filter_map(|(service_class, mut lane_events)| {
                let class_versions = versions.remove(&service_class)?;
                lane_events.sort_by_key(|event| event.at);
                Some(ClassLane {
                    service_class,
                    events: lane_events,
                    concurrency: ConcurrencyTimeline::build(class_versions, mode),
                })
            })
            .collect();
        Self {
            lanes,
            configured_classes,
            eligible_records,
        }
    }

    /// Returns the number of service classes with a usable config row.
    #[must_use]
    pub const fn configured_classes(&self) -> usize {
        self.configured_classes
    }

    /// Returns the number of execution rows that contribute to samples.
    #[must_use]
    pub const fn eligible_records(&self) -> usize {
        self.eligible_records
    }

    /// Returns a lazy stream of samples over the window's instants.
    #[must_use]
    pub fn samples(&self, window: &ReportWindow) -> OccupancySamples<'_> {
        let axis = TimeAxis::new(window);
        OccupancySamples {
            lanes: &self.lanes,
            instants: axis.ascending(),
            axis,
            lane_index: 0,
            cursor: 0,
            active_count: 0,
            active_slots: 0,
        }
    }
}

/// Lazy sample stream produced by [`OccupancySampler::samples`].
#[derive(Debug, Clone)]
pub struct OccupancySamples<'a> {
    /// Lanes being swept.
    lanes: &'a [ClassLane],
    /// Axis template used to restart each lane.
    axis: TimeAxis,
    /// Remaining instants of the current lane.
    instants: Rev<TimeAxis>,
    /// Index of the current lane.
    lane_index: usize,
    /// Next unapplied event of the current lane.
    cursor: usize,
    /// Executions active at the last applied instant.
    active_count: u64,
    /// Slots held at the last applied instant.
    active_slots: i64,
}

impl OccupancySamples<'_> {
    /// Moves the sweep to the next lane.
    fn advance_lane(&mut self) {
        self.lane_index += 1;
        self.instants = self.axis.ascending();
        self.cursor = 0;
        self.active_count = 0;
        self.active_slots = 0;
    }
}

impl Iterator for OccupancySamples<'_> {
    type Item = OccupancySample;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let lane = self.lanes.get(self.lane_index)?;
            if self.active_count == 0 && self.cursor >= lane.events.len() {
                self.advance_lane();
                continue;
            }
            let Some(instant) = self.instants.next() else {
                self.advance_lane();
                continue;
            };
            while let Some(event) = lane.events.get(self.cursor)
                && event.at <= instant
            {
                match event.kind {
                    SlotEventKind::Start => {
                        self.active_count += 1;
                        self.active_slots = self.active_slots.saturating_add(event.slots);
                    }
                    SlotEventKind::End => {
                        self.active_count = self.active_count.saturating_sub(1);
                        self.active_slots = self.active_slots.saturating_sub(event.slots);
                    }
                }
                self.cursor += 1;
            }
            if self.active_count == 0 {
                continue;
            }
            let Some(configured_concurrency) = lane.concurrency.resolve(instant) else {
                continue;
            };
            return Some(OccupancySample {
                instant,
                service_class: lane.service_class,
                configured_concurrency,
                sample_count: self.active_count,
                total_slots: self.active_slots,
            });
        }
    }
}
