// crates/wlm-apex-core/src/lib.rs
// ============================================================================
// Module: WLM Apex Core Library
// Description: Public API surface for the WLM apex reporter.
// Purpose: Expose core types, interfaces, and runtime stages.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! WLM apex computes, for every eligible workload management service class
//! and every UTC hour of a lookback window, the peak number of concurrently
//! held query slots and the concurrency configured at that moment. It is
//! read-only and backend-agnostic; host log tables are reached through
//! [`WlmLogSource`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ReportEventSink;
pub use interfaces::SourceError;
pub use interfaces::WlmLogSource;
pub use runtime::ApexReport;
pub use runtime::ApexReporter;
pub use runtime::FileEventSink;
pub use runtime::HourlyReducer;
pub use runtime::InMemoryEventSink;
pub use runtime::InMemoryWlmLogSource;
pub use runtime::MAX_SNAPSHOT_BYTES;
pub use runtime::NoopEventSink;
pub use runtime::OccupancySampler;
pub use runtime::OccupancySamples;
pub use runtime::ReportError;
pub use runtime::ReportStats;
pub use runtime::StderrEventSink;
pub use runtime::TimeAxis;
pub use runtime::WlmLogSnapshot;
pub use runtime::assemble_report;
pub use runtime::build_report;
pub use runtime::reduce_hourly;
