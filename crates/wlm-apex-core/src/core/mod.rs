// crates/wlm-apex-core/src/core/mod.rs
// ============================================================================
// Module: WLM Apex Core Types
// Description: Canonical identifiers, time model, rows, and report params.
// Purpose: Provide stable, serializable types shared by every pipeline stage.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! Core types describe the host log inputs, the derived occupancy samples,
//! and the final report rows. They are the source of truth for the CLI's
//! JSON and CSV output.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod events;
pub mod identifiers;
pub mod model;
pub mod params;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use events::ReportEvent;
pub use events::ReportStage;
pub use identifiers::ServiceClassId;
pub use identifiers::UserId;
pub use model::HourlyMax;
pub use model::HourlyPeak;
pub use model::OccupancySample;
pub use model::QueryExecutionRecord;
pub use model::QueueClassConfig;
pub use model::ReportRow;
pub use params::ConcurrencyMode;
pub use params::DEFAULT_GRANULARITY_SECONDS;
pub use params::DEFAULT_MIN_SERVICE_CLASS;
pub use params::DEFAULT_MIN_USER_ID;
pub use params::DEFAULT_WINDOW_SECONDS;
pub use params::ExecutionFilter;
pub use params::MAX_SAMPLE_INSTANTS;
pub use params::ParamsError;
pub use params::ReportParams;
pub use params::ReportWindow;
pub use params::TiePolicy;
pub use time::CalendarDay;
pub use time::HourBucket;
pub use time::TimeError;
pub use time::Timestamp;
