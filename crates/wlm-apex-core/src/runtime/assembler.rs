// crates/wlm-apex-core/src/runtime/assembler.rs
// ============================================================================
// Module: WLM Apex Report Assembler
// Description: Joins hourly peaks with their winning samples into report rows.
// Purpose: Produce the final ordered row set.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Each winning sample of a peak becomes one [`ReportRow`]. Rows are ordered
//! by service class, day, and hour; rows from the same bucket keep instant
//! order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::HourlyPeak;
use crate::core::ReportRow;

// ============================================================================
// SECTION: Assembly
// ============================================================================

/// Builds report rows from hourly peaks.
#[must_use]
pub fn assemble_report(peaks: &[HourlyPeak]) -> Vec<ReportRow> {
    let mut rows: Vec<(u8, ReportRow)> = peaks
        .iter()
        .flat_map(|peak| {
            let label = peak.max.bucket().label();
            peak.winners.iter().map(move |winner| {
                (peak.max.hour, ReportRow {
                    service_class: peak.max.service_class,
                    max_wlm_concurrency: winner.configured_concurrency,
                    day: peak.max.day,
                    hour: label.clone(),
                    max_service_class_slots: peak.max.max_slots,
                })
            })
        })
        .collect();
    rows.sort_by_key(|(hour, row)| (row.service_class, row.day, *hour));
    rows.into_iter().map(|(_, row)| row).collect()
}
