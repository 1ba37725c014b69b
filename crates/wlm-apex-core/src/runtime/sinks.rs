// crates/wlm-apex-core/src/runtime/sinks.rs
// ============================================================================
// Module: WLM Apex Event Sinks
// Description: JSON-line sinks for report lifecycle events.
// Purpose: Route run diagnostics to stderr, a file, memory, or nowhere.
// Dependencies: crate::core, crate::interfaces, serde_json
// ============================================================================

//! ## Overview
//! Sinks serialize each [`ReportEvent`] as one JSON line. Write failures are
//! swallowed so diagnostics never change the outcome of a report run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use crate::core::ReportEvent;
use crate::interfaces::ReportEventSink;

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Event sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl ReportEventSink for StderrEventSink {
    fn record(&self, event: &ReportEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Event sink that logs JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<File>,
}

impl FileEventSink {
    /// Opens the event log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ReportEventSink for FileEventSink {
    fn record(&self, event: &ReportEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Event sink that drops all events.
pub struct NoopEventSink;

impl ReportEventSink for NoopEventSink {
    fn record(&self, _event: &ReportEvent) {}
}

/// Event sink that keeps events in memory for inspection.
#[derive(Debug, Default)]
pub struct InMemoryEventSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<ReportEvent>>,
}

impl InMemoryEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl ReportEventSink for InMemoryEventSink {
    fn record(&self, event: &ReportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
