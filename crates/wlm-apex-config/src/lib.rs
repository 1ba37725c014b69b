// crates/wlm-apex-config/src/lib.rs
// ============================================================================
// Module: WLM Apex Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for wlm-apex.toml semantics.
// Dependencies: wlm-apex-core, wlm-apex-source-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `wlm-apex-config` defines the configuration model for the WLM apex
//! reporter. Loading is strict and fail-closed: oversized, non-UTF-8, or
//! inconsistent files are rejected before any report runs.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
