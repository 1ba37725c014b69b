// crates/wlm-apex-cli/src/render.rs
// ============================================================================
// Module: Report Rendering
// Description: Text, CSV, and canonical JSON renderers for report output.
// Purpose: Keep report formatting deterministic and independent of I/O.
// Dependencies: csv, serde, serde_jcs, tabled, thiserror, wlm-apex-core
// ============================================================================

//! ## Overview
//! Renderers turn an assembled report into a single string. Column order is
//! fixed: `service_class`, `max_wlm_concurrency`, `day`, `hour`,
//! `max_service_class_slots`. Rows are rendered in the order the assembler
//! produced them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use csv::Writer;
use serde::Serialize;
use tabled::Table;
use tabled::Tabled;
use tabled::settings::Alignment;
use tabled::settings::Style;
use tabled::settings::object::Columns;
use thiserror::Error;
use wlm_apex_core::CalendarDay;
use wlm_apex_core::ReportRow;
use wlm_apex_core::ServiceClassId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Report column names in output order.
pub const REPORT_COLUMNS: [&str; 5] =
    ["service_class", "max_wlm_concurrency", "day", "hour", "max_service_class_slots"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Rendering failures.
#[derive(Debug, Error)]
pub enum RenderError {
    /// CSV encoding failed.
    #[error("csv encoding failed: {0}")]
    Csv(String),
    /// Canonical JSON serialization failed.
    #[error("canonical json serialization failed: {0}")]
    Json(String),
}

// ============================================================================
// SECTION: Table View
// ============================================================================

/// Text table view of one report row.
#[derive(Tabled)]
struct ReportTableRow {
    /// Service class identifier.
    service_class: ServiceClassId,
    /// Configured concurrency for the hour.
    max_wlm_concurrency: i64,
    /// UTC calendar day.
    day: CalendarDay,
    /// Hour label.
    hour: String,
    /// Peak slots in the hour.
    max_service_class_slots: i64,
}

impl From<&ReportRow> for ReportTableRow {
    fn from(row: &ReportRow) -> Self {
        Self {
            service_class: row.service_class,
            max_wlm_concurrency: row.max_wlm_concurrency,
            day: row.day,
            hour: row.hour.clone(),
            max_service_class_slots: row.max_service_class_slots,
        }
    }
}

// ============================================================================
// SECTION: Renderers
// ============================================================================

/// Renders rows as a text table with a header and rule line.
///
/// Numeric columns are right-aligned.
#[must_use]
pub fn render_text(rows: &[ReportRow]) -> String {
    let mut table = Table::new(rows.iter().map(ReportTableRow::from));
    table.with(Style::psql());
    table.modify(Columns::new(.. 2), Alignment::right());
    table.modify(Columns::new(4 ..), Alignment::right());
    let mut output = table.to_string();
    output.push('\n');
    output
}

/// Renders rows as CSV with a header row.
///
/// # Errors
///
/// Returns [`RenderError::Csv`] when a record cannot be encoded.
pub fn render_csv(rows: &[ReportRow]) -> Result<String, RenderError> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(REPORT_COLUMNS).map_err(|err| RenderError::Csv(err.to_string()))?;
    for row in rows {
        writer.write_record(row_cells(row)).map_err(|err| RenderError::Csv(err.to_string()))?;
    }
    let bytes = writer.into_inner().map_err(|err| RenderError::Csv(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| RenderError::Csv(err.to_string()))
}

/// Renders any serializable value as canonical JSON (RFC 8785).
///
/// # Errors
///
/// Returns [`RenderError::Json`] when serialization fails.
pub fn render_json<T: Serialize>(value: &T) -> Result<String, RenderError> {
    let mut output =
        serde_jcs::to_string(value).map_err(|err| RenderError::Json(err.to_string()))?;
    output.push('\n');
    Ok(output)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Formats one row's cells in column order.
fn row_cells(row: &ReportRow) -> [String; 5] {
    [
        row.service_class.to_string(),
        row.max_wlm_concurrency.to_string(),
        row.day.to_string(),
        row.hour.clone(),
        row.max_service_class_slots.to_string(),
    ]
}
