// crates/surface-coverage-core/src/interfaces/mod.rs
// ============================================================================
// Module: Surface Coverage Interfaces
// Description: Backend-agnostic contracts for history stores and report sinks.
// Purpose: Decouple the analyzer from persistence and output formats.
// Dependencies: crate::analysis, crate::history, crate::model, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the analyzer hands results to external systems
//! without embedding backend details. Stores and sinks are called
//! sequentially from a single thread; implementations fail closed and never
//! retry on their own.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::analysis::aggregate::ModuleSummary;
use crate::analysis::aggregate::ResourceSurfaceRecord;
use crate::history::HistoryId;
use crate::history::ModuleHistoryRecord;
use crate::history::ModuleSnapshot;
use crate::model::version::ModuleVersion;

// ============================================================================
// SECTION: History Store
// ============================================================================

/// History store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// Store I/O or connection error.
    #[error("history store io error: {0}")]
    Io(String),
    /// Backend rejected or failed a query.
    #[error("history store backend error: {0}")]
    Backend(String),
    /// Stored data failed integrity checks.
    #[error("history store corruption: {0}")]
    Corrupt(String),
    /// Stored schema version is incompatible.
    #[error("history store version mismatch: {0}")]
    VersionMismatch(String),
    /// Record data is invalid.
    #[error("history store invalid data: {0}")]
    Invalid(String),
}

/// Persistence backend for module history.
///
/// # Invariants
/// - `append_history` is idempotent on `(module, major, minor, patch)`.
/// - `save_snapshot` replaces any prior snapshot of the module.
pub trait HistoryStore {
    /// Returns the history id already recorded for a module version.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] when the lookup fails.
    fn find_history_id(&self, module: &str, version: &ModuleVersion) -> Result<Option<HistoryId>, HistoryError>;

    /// Appends an immutable history row; repeats of the natural key are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] when the write fails.
    fn append_history(&self, record: &ModuleHistoryRecord) -> Result<(), HistoryError>;

    /// Upserts the current snapshot of a module.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] when the write fails.
    fn save_snapshot(&self, snapshot: &ModuleSnapshot) -> Result<(), HistoryError>;

    /// Reports store readiness before a run starts.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), HistoryError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Report Sink
// ============================================================================

/// Report sink errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// Underlying writer failed.
    #[error("report io error: {0}")]
    Io(String),
    /// Record encoding failed.
    #[error("report encoding error: {0}")]
    Encode(String),
}

/// Destination for resource records and module summaries.
///
/// `finish` is called exactly once per run, on success and on failure.
pub trait ReportSink {
    /// Writes one resource record.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when the record cannot be written.
    fn write_resource(&mut self, record: &ResourceSurfaceRecord) -> Result<(), ReportError>;

    /// Writes one module summary.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when the summary cannot be written.
    fn write_module(&mut self, summary: &ModuleSummary) -> Result<(), ReportError>;

    /// Flushes buffered output.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when flushing fails.
    fn finish(&mut self) -> Result<(), ReportError>;
}
