// crates/surface-coverage-core/src/model/version.rs
// ============================================================================
// Module: Surface Coverage Module Versions
// Description: Semantic version triples for history records.
// Purpose: Parse `MAJOR.MINOR.PATCH` and render the sortable normalized form.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`ModuleVersion`] is the natural-key component of every history row. The
//! normalized form pads each component to three digits so that versions sort
//! lexically (`1.60.0` becomes `001.060.000`).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Version parsing errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid version {input:?}: expected MAJOR.MINOR.PATCH")]
pub struct VersionError {
    /// Rejected input.
    pub input: String,
}

// ============================================================================
// SECTION: Module Version
// ============================================================================

/// Semantic version triple of the processed module corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleVersion {
    /// Major component.
    pub major: u32,
    /// Minor component.
    pub minor: u32,
    /// Patch component.
    pub patch: u32,
}

impl ModuleVersion {
    /// Creates a version from its components.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Returns the zero-padded `MMM.mmm.ppp` form used for lexical sorting.
    #[must_use]
    pub fn normalized(&self) -> String {
        format!("{:03}.{:03}.{:03}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ModuleVersion {
    type Err = VersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let error = || VersionError {
            input: input.to_string(),
        };
        let mut parts = input.split('.');
        let mut next = || -> Result<u32, VersionError> {
            let part = parts.next().ok_or_else(error)?;
            if part.is_empty() || !part.bytes().all(|byte| byte.is_ascii_digit()) {
                return Err(error());
            }
            part.parse::<u32>().map_err(|_| error())
        };
        let major = next()?;
        let minor = next()?;
        let patch = next()?;
        if parts.next().is_some() {
            return Err(error());
        }
        Ok(Self::new(major, minor, patch))
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
