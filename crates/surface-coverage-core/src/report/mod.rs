// crates/surface-coverage-core/src/report/mod.rs
// ============================================================================
// Module: Surface Coverage Reports
// Description: Report sink implementations.
// Purpose: Group output formats for analysis results.
// Dependencies: crate::report::csv
// ============================================================================

//! ## Overview
//! Report sinks implement [`crate::interfaces::ReportSink`]. CSV is the only
//! output format.

pub mod csv;
