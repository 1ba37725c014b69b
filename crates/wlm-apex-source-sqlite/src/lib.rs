// crates/wlm-apex-source-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite WLM Log Source
// Description: Read-only WlmLogSource backend using SQLite.
// Purpose: Load service class config and query execution rows from a database.
// Dependencies: wlm-apex-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`wlm_apex_core::WlmLogSource`] that
//! reads copies of the host's service class config and query log tables.
//! The database is opened read-only; the reporter never writes to it.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod source;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use source::DEFAULT_CONFIG_TABLE;
pub use source::DEFAULT_QUERY_TABLE;
pub use source::SqliteSourceConfig;
pub use source::SqliteSourceError;
pub use source::SqliteWlmLogSource;
