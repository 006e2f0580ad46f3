// crates/surface-coverage-core/src/model/stability.rs
// ============================================================================
// Module: Surface Coverage Stability Tiers
// Description: Stability classification and ordinal rank encodings.
// Purpose: Turn construct documentation tags into stability buckets.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Every resource lands in exactly one [`Stability`] bucket: `cfn-only` when
//! no construct wraps it, otherwise the construct's documented stability.
//! An absent tag counts as `experimental`; any unrecognized tag is a
//! classification error that aborts the run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Stability rank persisted when a module has no construct-backed resource.
pub const DEFAULT_STABILITY_RANK: u8 = 1;

// ============================================================================
// SECTION: Stability
// ============================================================================

/// Stability tier of a resource.
///
/// # Invariants
/// - Labels are stable and match the CSV and history encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stability {
    /// No construct wraps the resource.
    #[serde(rename = "cfn-only")]
    CfnOnly,
    /// Construct is experimental (or carries no stability tag).
    #[serde(rename = "experimental")]
    Experimental,
    /// Construct is stable.
    #[serde(rename = "stable")]
    Stable,
    /// Construct is deprecated.
    #[serde(rename = "deprecated")]
    Deprecated,
}

/// Unrecognized stability tag on a construct.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unexpected stability {tag}")]
pub struct UnknownStabilityError {
    /// The rejected tag value.
    pub tag: String,
}

impl Stability {
    /// Classifies a construct stability tag. `None` maps to experimental.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStabilityError`] for tags outside the recognized set.
    pub fn from_doc_tag(tag: Option<&str>) -> Result<Self, UnknownStabilityError> {
        match tag {
            None | Some("experimental") => Ok(Self::Experimental),
            Some("stable") => Ok(Self::Stable),
            Some("deprecated") => Ok(Self::Deprecated),
            Some(other) => Err(UnknownStabilityError {
                tag: other.to_string(),
            }),
        }
    }

    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CfnOnly => "cfn-only",
            Self::Experimental => "experimental",
            Self::Stable => "stable",
            Self::Deprecated => "deprecated",
        }
    }

    /// Returns true when a construct backs the resource.
    #[must_use]
    pub const fn is_construct_backed(self) -> bool {
        !matches!(self, Self::CfnOnly)
    }

    /// Returns true when the bucket counts toward coverage.
    #[must_use]
    pub const fn counts_as_covered(self) -> bool {
        matches!(self, Self::Experimental | Self::Stable)
    }

    /// Returns the ordinal maturity rank.
    #[must_use]
    pub const fn maturity_rank(self) -> u8 {
        match self {
            Self::CfnOnly => 1,
            Self::Experimental => 2,
            Self::Stable => 4,
            Self::Deprecated => 5,
        }
    }

    /// Returns the ordinal stability rank; `cfn-only` has none.
    #[must_use]
    pub const fn stability_rank(self) -> Option<u8> {
        match self {
            Self::CfnOnly => None,
            Self::Experimental => Some(1),
            Self::Stable => Some(2),
            Self::Deprecated => Some(3),
        }
    }

    /// Returns the stability rank written to the history store.
    #[must_use]
    pub const fn persisted_stability_rank(self) -> u8 {
        match self.stability_rank() {
            Some(rank) => rank,
            None => DEFAULT_STABILITY_RANK,
        }
    }
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
