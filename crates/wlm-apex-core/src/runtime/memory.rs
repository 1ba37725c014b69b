// crates/wlm-apex-core/src/runtime/memory.rs
// ============================================================================
// Module: WLM Apex In-Memory Log Source
// Description: Log source backed by owned rows or a JSON snapshot file.
// Purpose: Provide a deterministic source for tests and offline reports.
// Dependencies: crate::core, crate::interfaces, serde, serde_json
// ============================================================================

//! ## Overview
//! [`InMemoryWlmLogSource`] serves rows captured ahead of time. Snapshots are
//! JSON documents with `configs` and `executions` arrays; timestamps may be
//! epoch milliseconds or RFC 3339 strings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::core::ExecutionFilter;
use crate::core::QueryExecutionRecord;
use crate::core::QueueClassConfig;
use crate::interfaces::SourceError;
use crate::interfaces::WlmLogSource;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum snapshot size accepted from disk (bytes).
pub const MAX_SNAPSHOT_BYTES: u64 = 256 * 1024 * 1024;

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// Serializable capture of the host WLM tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WlmLogSnapshot {
    /// Service class config rows.
    #[serde(default)]
    pub configs: Vec<QueueClassConfig>,
    /// Query execution rows.
    #[serde(default)]
    pub executions: Vec<QueryExecutionRecord>,
}

impl WlmLogSnapshot {
    /// Parses a snapshot from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Corrupt`] when the JSON does not decode.
    pub fn from_json(text: &str) -> Result<Self, SourceError> {
        serde_json::from_str(text).map_err(|err| SourceError::Corrupt(err.to_string()))
    }

    /// Reads a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unavailable`] when the file cannot be read and
    /// [`SourceError::Corrupt`] when it does not decode.
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let metadata = fs::metadata(path).map_err(|err| {
            SourceError::Unavailable(format!("snapshot {}: {err}", path.display()))
        })?;
        if metadata.len() > MAX_SNAPSHOT_BYTES {
            return Err(SourceError::Invalid(format!(
                "snapshot {} exceeds {MAX_SNAPSHOT_BYTES} bytes",
                path.display()
            )));
        }
        let text = fs::read_to_string(path).map_err(|err| {
            SourceError::Unavailable(format!("snapshot {}: {err}", path.display()))
        })?;
        Self::from_json(&text)
    }
}

// ============================================================================
// SECTION: In-Memory Source
// ============================================================================

/// In-memory log source for tests and snapshot reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryWlmLogSource {
    /// Captured rows.
    snapshot: WlmLogSnapshot,
}

impl InMemoryWlmLogSource {
    /// Creates a source over the given rows.
    #[must_use]
    pub const fn new(
        configs: Vec<QueueClassConfig>,
        executions: Vec<QueryExecutionRecord>,
    ) -> Self {
        Self {
            snapshot: WlmLogSnapshot {
                configs,
                executions,
            },
        }
    }

    /// Creates a source from a snapshot.
    #[must_use]
    pub const fn from_snapshot(snapshot: WlmLogSnapshot) -> Self {
        Self {
            snapshot,
        }
    }

    /// Opens a JSON snapshot file.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the snapshot cannot be read or decoded.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        WlmLogSnapshot::load(path).map(Self::from_snapshot)
    }
}

impl WlmLogSource for InMemoryWlmLogSource {
    fn service_class_configs(&self) -> Result<Vec<QueueClassConfig>, SourceError> {
        Ok(self.snapshot.configs.clone())
    }

    fn query_executions(
        &self,
        filter: &ExecutionFilter,
    ) -> Result<Vec<QueryExecutionRecord>, SourceError> {
        Ok(self.snapshot.executions.iter().filter(|record| filter.accepts(record)).cloned().collect())
    }
}
