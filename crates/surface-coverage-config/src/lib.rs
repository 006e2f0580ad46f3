// crates/surface-coverage-config/src/lib.rs
// ============================================================================
// Module: Surface Coverage Config Library
// Description: Configuration model and validation.
// Purpose: Single source of truth for surface-coverage.toml semantics.
// Dependencies: surface-coverage-core, surface-coverage-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `surface-coverage-config` defines the configuration model for the
//! surface coverage analyzer with strict, fail-closed loading.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
