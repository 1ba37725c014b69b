// crates/wlm-apex-core/src/interfaces/mod.rs
// ============================================================================
// Module: WLM Apex Interfaces
// Description: Backend-agnostic seams for log sources and event sinks.
// Purpose: Define the contract surfaces used by the report pipeline.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The pipeline reads host WLM tables through [`WlmLogSource`] and reports
//! its progress through [`ReportEventSink`]. Sources are read-only; a source
//! failure aborts the whole run and is surfaced verbatim.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::QueryExecutionRecord;
use crate::core::QueueClassConfig;
use crate::core::ReportEvent;
use crate::core::params::ExecutionFilter;

// ============================================================================
// SECTION: Log Source
// ============================================================================

/// Log source errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Underlying tables are missing or unreadable.
    #[error("log source unavailable: {0}")]
    Unavailable(String),
    /// Stored rows could not be decoded.
    #[error("log source corrupt: {0}")]
    Corrupt(String),
    /// Source settings are invalid.
    #[error("log source invalid: {0}")]
    Invalid(String),
}

/// Read-only access to the host's WLM config and execution log tables.
pub trait WlmLogSource {
    /// Returns every service class config row the source knows about.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the config table cannot be read.
    fn service_class_configs(&self) -> Result<Vec<QueueClassConfig>, SourceError>;

    /// Returns execution rows, optionally narrowed by `filter`.
    ///
    /// Implementations may return rows the filter rejects; the sampler
    /// re-applies it.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the execution log cannot be read.
    fn query_executions(
        &self,
        filter: &ExecutionFilter,
    ) -> Result<Vec<QueryExecutionRecord>, SourceError>;
}

// ============================================================================
// SECTION: Event Sink
// ============================================================================

/// Sink for report lifecycle events.
pub trait ReportEventSink: Send + Sync {
    /// Records an event.
    fn record(&self, event: &ReportEvent);
}
