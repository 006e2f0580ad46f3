// crates/surface-coverage-core/src/lib.rs
// ============================================================================
// Module: Surface Coverage Core Library
// Description: Metadata model, analysis pipeline, history protocol, reports.
// Purpose: Measure how much of the raw resource surface has construct coverage.
// Dependencies: csv, serde, serde_json, thiserror, tracing, uuid
// ============================================================================

//! ## Overview
//! Surface Coverage Core loads type-definition manifests into a read-only
//! [`TypeSystem`], pairs each generated resource class with the construct
//! that wraps it, counts the configuration surface behind every resource,
//! and rolls the results up per module. Results flow to a [`ReportSink`] and,
//! optionally, to a [`HistoryStore`] through the [`HistoryRecorder`].
//!
//! The core is synchronous and single-threaded. Persistence backends live in
//! separate crates and plug in through [`HistoryStore`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod analysis;
pub mod history;
pub mod interfaces;
pub mod model;
pub mod report;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use analysis::AnalysisError;
pub use analysis::aggregate::AnalyzerConfig;
pub use analysis::aggregate::BucketTotals;
pub use analysis::aggregate::ModuleReport;
pub use analysis::aggregate::ModuleSummary;
pub use analysis::aggregate::ResourceSurfaceRecord;
pub use analysis::aggregate::SurfaceAnalyzer;
pub use history::HistoryId;
pub use history::HistoryPolicy;
pub use history::HistoryRecorder;
pub use history::ModuleHistoryRecord;
pub use history::ModuleHistoryState;
pub use history::ModuleSnapshot;
pub use history::PropertyCounts;
pub use interfaces::HistoryError;
pub use interfaces::HistoryStore;
pub use interfaces::ReportError;
pub use interfaces::ReportSink;
pub use model::manifest::ManifestError;
pub use model::manifest::load_manifest_dir;
pub use model::metadata::Assembly;
pub use model::metadata::TypeSystem;
pub use model::stability::Stability;
pub use model::version::ModuleVersion;
pub use model::version::VersionError;
pub use report::csv::CsvReportSink;
pub use runtime::RunError;
pub use runtime::RunOutcome;
pub use runtime::run_report;
