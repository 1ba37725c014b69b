// crates/wlm-apex-core/src/core/identifiers.rs
// ============================================================================
// Module: WLM Apex Identifiers
// Description: Integer identifiers for WLM service classes and users.
// Purpose: Keep service class and user ids from being swapped at call sites.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Host log tables key executions by integer service class and user id. Both
//! are wrapped in transparent newtypes so they serialize as bare numbers while
//! staying distinct in signatures. Neither type validates its range; the
//! reserved-class and system-user thresholds are applied by the sampler.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// WLM service class (queue) identifier.
///
/// # Invariants
/// - Opaque integer; classes `<= 4` are reserved by the host but still representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceClassId(i64);

impl ServiceClassId {
    /// Creates a service class identifier from a raw value.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ServiceClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Database user identifier attached to a query execution.
///
/// # Invariants
/// - Opaque integer; ids `<= 1` denote internal users on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates a user identifier from a raw value.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
