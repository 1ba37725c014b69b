// crates/wlm-apex-cli/src/lib.rs
// ============================================================================
// Module: WLM Apex CLI Library
// Description: Shared helpers for the wlm-apex binary.
// Purpose: Expose localization and report rendering for the CLI and its tests.
// Dependencies: serde, serde_jcs, wlm-apex-core
// ============================================================================

//! ## Overview
//! The `wlm-apex` binary keeps its user-facing strings in [`i18n`] and its
//! report renderers in [`render`]. Both are library modules so integration
//! tests can exercise them without spawning the binary.

pub mod i18n;
pub mod render;
