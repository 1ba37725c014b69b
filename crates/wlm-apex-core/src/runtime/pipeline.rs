// crates/wlm-apex-core/src/runtime/pipeline.rs
// ============================================================================
// Module: WLM Apex Report Pipeline
// Description: End-to-end report run over a log source.
// Purpose: Wire sampling, reduction, and assembly behind one entry point.
// Dependencies: crate::core, crate::interfaces, crate::runtime, thiserror
// ============================================================================

//! ## Overview
//! [`ApexReporter::run`] validates params, loads config and execution rows
//! from a [`WlmLogSource`], and streams samples through the hourly reducer.
//! [`build_report`] is the same computation over rows already in memory.
//! Runs are read-only and stateless; the same rows and `now` always produce
//! the same report.
//!
//! ## Errors
//! Any source failure aborts the run with no partial output. An empty
//! eligible set is not an error and yields an empty row list.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::core::ParamsError;
use crate::core::QueryExecutionRecord;
use crate::core::QueueClassConfig;
use crate::core::ReportEvent;
use crate::core::ReportParams;
use crate::core::ReportRow;
use crate::core::ReportStage;
use crate::core::ReportWindow;
use crate::core::TimeError;
use crate::core::Timestamp;
use crate::interfaces::ReportEventSink;
use crate::interfaces::SourceError;
use crate::interfaces::WlmLogSource;
use crate::runtime::assembler::assemble_report;
use crate::runtime::reducer::HourlyReducer;
use crate::runtime::sampler::OccupancySampler;
use crate::runtime::sinks::NoopEventSink;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Report run errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// Log source failed.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// Params failed validation.
    #[error("invalid report params: {0}")]
    InvalidParams(#[from] ParamsError),
    /// A sampled instant could not be bucketed.
    #[error("time conversion failed: {0}")]
    Time(#[from] TimeError),
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Counters describing one report run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    /// Config rows returned by the source.
    pub configs: usize,
    /// Execution rows returned by the source.
    pub records_loaded: usize,
    /// Execution rows that contributed to samples.
    pub records_eligible: usize,
    /// Occupancy samples produced.
    pub samples: u64,
    /// Non-empty hourly buckets.
    pub buckets: usize,
    /// Report rows emitted.
    pub rows: usize,
}

/// Output of a report run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApexReport {
    /// `now` the run was anchored at.
    pub generated_at: Timestamp,
    /// Params used for the run.
    pub params: ReportParams,
    /// Sampled window.
    pub window: ReportWindow,
    /// Report rows ordered by class, day, and hour.
    pub rows: Vec<ReportRow>,
    /// Run counters.
    pub stats: ReportStats,
}

/// Computes a report over rows already in memory.
///
/// # Errors
///
/// Returns [`ReportError`] when params are invalid or an instant cannot be
/// bucketed.
pub fn build_report(
    configs: &[QueueClassConfig],
    records: &[QueryExecutionRecord],
    params: &ReportParams,
    now: Timestamp,
) -> Result<ApexReport, ReportError> {
    let now = now.truncate_to_second();
    let window = ReportWindow::ending_at(now, params)?;
    let filter = params.filter(&window);
    let sampler = OccupancySampler::new(configs, records, &filter, params.concurrency_mode);

    let mut reducer = HourlyReducer::new(params.tie_policy);
    for sample in sampler.samples(&window) {
        reducer.push(sample)?;
    }
    let samples = reducer.samples_seen();
    let buckets = reducer.bucket_count();
    let rows = assemble_report(&reducer.finish());

    let stats = ReportStats {
        configs: configs.len(),
        records_loaded: records.len(),
        records_eligible: sampler.eligible_records(),
        samples,
        buckets,
        rows: rows.len(),
    };
    Ok(ApexReport {
        generated_at: now,
        params: params.clone(),
        window,
        rows,
        stats,
    })
}

// ============================================================================
// SECTION: Reporter
// ============================================================================

/// Report runner bound to a log source.
pub struct ApexReporter<S> {
    /// Source of config and execution rows.
    source: S,
    /// Params for every run.
    params: ReportParams,
    /// Lifecycle event sink.
    events: Arc<dyn ReportEventSink>,
}

impl<S: WlmLogSource> ApexReporter<S> {
    /// Creates a reporter that discards lifecycle events.
    #[must_use]
    pub fn new(source: S, params: ReportParams) -> Self {
        Self {
            source,
            params,
            events: Arc::new(NoopEventSink),
        }
    }

    /// Replaces the lifecycle event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn ReportEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the params used for runs.
    #[must_use]
    pub const fn params(&self) -> &ReportParams {
        &self.params
    }

    /// Runs the report anchored at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when params are invalid or the source fails.
    pub fn run(&self, now: Timestamp) -> Result<ApexReport, ReportError> {
        let now_ms = now.truncate_to_second().as_unix_millis();
        self.events.record(&ReportEvent::new(ReportStage::Started, now_ms));
        let result = self.run_stages(now, now_ms);
        match &result {
            Ok(report) => {
                let mut event = ReportEvent::new(ReportStage::Completed, now_ms);
                event.configs = Some(report.stats.configs);
                event.records = Some(report.stats.records_eligible);
                event.samples = Some(report.stats.samples);
                event.rows = Some(report.stats.rows);
                self.events.record(&event);
            }
            Err(err) => {
                let mut event = ReportEvent::new(ReportStage::Failed, now_ms);
                event.message = Some(err.to_string());
                self.events.record(&event);
            }
        }
        result
    }

    /// Loads rows and builds the report.
    fn run_stages(&self, now: Timestamp, now_ms: i64) -> Result<ApexReport, ReportError> {
        let window = ReportWindow::ending_at(now.truncate_to_second(), &self.params)?;
        let filter = self.params.filter(&window);
        let configs = self.source.service_class_configs()?;
        let records = self.source.query_executions(&filter)?;

        let mut event = ReportEvent::new(ReportStage::SourceLoaded, now_ms);
        event.configs = Some(configs.len());
        event.records = Some(records.len());
        self.events.record(&event);

        build_report(&configs, &records, &self.params, now)
    }
}
