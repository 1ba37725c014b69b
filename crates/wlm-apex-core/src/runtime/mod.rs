// crates/wlm-apex-core/src/runtime/mod.rs
// ============================================================================
// Module: WLM Apex Runtime
// Description: Time axis, sampler, reducer, assembler, and pipeline.
// Purpose: Compute hourly slot high-water marks from host WLM logs.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the four report stages and the runner that
//! chains them. Every entry point takes `now` explicitly so output is a pure
//! function of the rows and the params.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod assembler;
pub mod axis;
pub mod memory;
pub mod pipeline;
pub mod reducer;
pub mod sampler;
pub mod sinks;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use assembler::assemble_report;
pub use axis::TimeAxis;
pub use memory::InMemoryWlmLogSource;
pub use memory::MAX_SNAPSHOT_BYTES;
pub use memory::WlmLogSnapshot;
pub use pipeline::ApexReport;
pub use pipeline::ApexReporter;
pub use pipeline::ReportError;
pub use pipeline::ReportStats;
pub use pipeline::build_report;
pub use reducer::HourlyReducer;
pub use reducer::reduce_hourly;
pub use sampler::OccupancySampler;
pub use sampler::OccupancySamples;
pub use sinks::FileEventSink;
pub use sinks::InMemoryEventSink;
pub use sinks::NoopEventSink;
pub use sinks::StderrEventSink;
