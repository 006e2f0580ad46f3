// crates/surface-coverage-core/src/model/mod.rs
// ============================================================================
// Module: Surface Coverage Model
// Description: Metadata, manifest loading, stability tiers, and versions.
// Purpose: Group the data types consumed by the analyzer.
// Dependencies: crate::model::*
// ============================================================================

//! ## Overview
//! Data model for the analyzer: the decoded type system, the loader that
//! builds it from manifests, stability classification, and module versions.

pub mod manifest;
pub mod metadata;
pub mod stability;
pub mod version;
