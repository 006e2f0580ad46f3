// crates/surface-coverage-core/src/analysis/mod.rs
// ============================================================================
// Module: Surface Coverage Analysis
// Description: Construct resolution, surface counting, and module rollups.
// Purpose: Compute per-resource and per-module surface coverage statistics.
// Dependencies: crate::model, thiserror
// ============================================================================

//! ## Overview
//! The analysis pipeline pairs every generated resource class with its
//! hand-authored construct ([`resolver`]), counts the configuration surface
//! reachable from its props type ([`counter`]), and rolls resources up into a
//! module summary ([`aggregate`], [`metrics`]).
//!
//! Errors raised here are fatal for the whole run: they mean the metadata
//! disagrees with the analyzer's assumptions.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod aggregate;
pub mod counter;
pub mod metrics;
pub mod resolver;

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal analysis errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The props parameter of a resource initializer is not named as expected.
    #[error("invalid 3rd parameter name on {class}. expecting \"{expected}\" got {actual}")]
    PropsParameter {
        /// Resource class FQN.
        class: String,
        /// Expected parameter name.
        expected: String,
        /// Actual parameter name.
        actual: String,
    },
    /// A construct carries a stability tag outside the recognized set.
    #[error("unexpected stability {tag} on {construct} (wrapping {resource})")]
    UnknownStability {
        /// Construct FQN.
        construct: String,
        /// Resource class FQN.
        resource: String,
        /// Rejected stability tag.
        tag: String,
    },
}
