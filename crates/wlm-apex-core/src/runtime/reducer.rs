// crates/wlm-apex-core/src/runtime/reducer.rs
// ============================================================================
// Module: WLM Apex Hourly Reducer
// Description: Streaming per-hour maximum over occupancy samples.
// Purpose: Collapse per-instant samples into one peak per class and UTC hour.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! [`HourlyReducer`] folds samples one at a time, keeping only the running
//! maximum and its winning samples per `(service class, day, hour)` bucket.
//! Buckets without samples never appear. Input order is irrelevant: the
//! earliest tying instant always wins under [`TiePolicy::FirstInstant`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::HourBucket;
use crate::core::HourlyMax;
use crate::core::HourlyPeak;
use crate::core::OccupancySample;
use crate::core::ServiceClassId;
use crate::core::TiePolicy;
use crate::core::TimeError;

// ============================================================================
// SECTION: Reducer
// ============================================================================

/// Running maximum of one bucket.
#[derive(Debug, Clone)]
struct BucketPeak {
    /// Largest `total_slots` seen so far.
    max_slots: i64,
    /// Samples that reached `max_slots`.
    winners: Vec<OccupancySample>,
}

/// Streaming hourly maximum reducer.
///
/// # Invariants
/// - Each bucket holds at least one winner.
/// - Under [`TiePolicy::FirstInstant`] each bucket holds exactly one winner.
#[derive(Debug, Clone)]
pub struct HourlyReducer {
    /// Tie reporting policy.
    tie_policy: TiePolicy,
    /// Peaks keyed by class then chronological bucket.
    peaks: BTreeMap<(ServiceClassId, HourBucket), BucketPeak>,
    /// Samples folded so far.
    samples_seen: u64,
}

impl HourlyReducer {
    /// Creates an empty reducer.
    #[must_use]
    pub const fn new(tie_policy: TiePolicy) -> Self {
        Self {
            tie_policy,
            peaks: BTreeMap::new(),
            samples_seen: 0,
        }
    }

    /// Folds one sample into its bucket.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError`] when the sample instant has no calendar date.
    pub fn push(&mut self, sample: OccupancySample) -> Result<(), TimeError> {
        let bucket = sample.instant.hour_bucket()?;
        self.samples_seen += 1;
        let key = (sample.service_class, bucket);
        let Some(peak) = self.peaks.get_mut(&key) else {
            self.peaks.insert(key, BucketPeak {
                max_slots: sample.total_slots,
                winners: vec![sample],
            });
            return Ok(());
        };
        if sample.total_slots > peak.max_slots {
            peak.max_slots = sample.total_slots;
            peak.winners.clear();
            peak.winners.push(sample);
        } else if sample.total_slots == peak.max_slots {
            match self.tie_policy {
                TiePolicy::AllInstants => peak.winners.push(sample),
                TiePolicy::FirstInstant => {
                    if peak.winners.first().is_none_or(|winner| sample.instant < winner.instant) {
                        peak.winners.clear();
                        peak.winners.push(sample);
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns the number of samples folded so far.
    #[must_use]
    pub const fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    /// Returns the number of non-empty buckets.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.peaks.len()
    }

    /// Consumes the reducer, returning peaks ordered by class then bucket.
    #[must_use]
    pub fn finish(self) -> Vec<HourlyPeak> {
        self.peaks
            .into_iter()
            .map(|((service_class, bucket), mut peak)| {
                peak.winners.sort_by_key(|winner| winner.instant);
                HourlyPeak {
                    max: HourlyMax {
                        service_class,
                        day: bucket.day,
                        hour: bucket.hour,
                        max_slots: peak.max_slots,
                    },
                    winners: peak.winners,
                }
            })
            .collect()
    }
}

/// Reduces a sample stream to hourly peaks.
///
/// # Errors
///
/// Returns [`TimeError`] when a sample instant has no calendar date.
pub fn reduce_hourly<I>(samples: I, tie_policy: TiePolicy) -> Result<Vec<HourlyPeak>, TimeError>
where
    I: IntoIterator<Item = OccupancySample>,
{
    let mut reducer = HourlyReducer::new(tie_policy);
    for sample in samples {
        reducer.push(sample)?;
    }
    Ok(reducer.finish())
}
