// crates/surface-coverage-core/src/runtime.rs
// ============================================================================
// Module: Surface Coverage Runtime
// Description: Sequential driver from type system to sink and history store.
// Purpose: Run one report over every loaded assembly.
// Dependencies: crate::analysis, crate::history, crate::interfaces, tracing
// ============================================================================

//! ## Overview
//! [`run_report`] analyses assemblies in name order. For each eligible
//! assembly it writes the resource rows, then the module row, then hands the
//! summary to the history recorder when persistence is enabled. The first
//! error aborts the run; the sink is finished on every exit path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use tracing::info;
use tracing::warn;

use crate::analysis::AnalysisError;
use crate::analysis::aggregate::SurfaceAnalyzer;
use crate::history::HistoryRecorder;
use crate::interfaces::HistoryError;
use crate::interfaces::ReportError;
use crate::interfaces::ReportSink;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Run failures, by stage.
#[derive(Debug, Error)]
pub enum RunError {
    /// Analysis rejected the metadata.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    /// Report output failed.
    #[error(transparent)]
    Report(#[from] ReportError),
    /// History persistence failed.
    #[error(transparent)]
    History(#[from] HistoryError),
}

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Counters describing a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Assemblies skipped as ineligible.
    pub skipped_assemblies: usize,
    /// Modules analysed.
    pub modules: usize,
    /// Resource rows written.
    pub resources: usize,
    /// Modules persisted to the history store.
    pub persisted_modules: usize,
}

// ============================================================================
// SECTION: Driver
// ============================================================================

/// Runs one report over every assembly of the analyzer's type system.
///
/// # Errors
///
/// Returns [`RunError`] for the first failure. When both the run and the
/// final sink flush fail, the run error is reported.
pub fn run_report(
    analyzer: &SurfaceAnalyzer<'_>,
    sink: &mut dyn ReportSink,
    history: Option<&mut HistoryRecorder<'_>>,
) -> Result<RunOutcome, RunError> {
    let result = drive(analyzer, sink, history);
    let finished = sink.finish();
    let outcome = result?;
    finished?;
    info!(
        modules = outcome.modules,
        resources = outcome.resources,
        skipped = outcome.skipped_assemblies,
        persisted = outcome.persisted_modules,
        "report complete"
    );
    Ok(outcome)
}

/// Processes assemblies without finishing the sink.
fn drive(
    analyzer: &SurfaceAnalyzer<'_>,
    sink: &mut dyn ReportSink,
    mut history: Option<&mut HistoryRecorder<'_>>,
) -> Result<RunOutcome, RunError> {
    let mut outcome = RunOutcome::default();
    for assembly in analyzer.types().assemblies() {
        let Some(report) = analyzer.analyze_assembly(assembly)? else {
            outcome.skipped_assemblies += 1;
            continue;
        };
        for record in &report.resources {
            sink.write_resource(record)?;
        }
        sink.write_module(&report.summary)?;
        outcome.modules += 1;
        outcome.resources += report.resources.len();

        if let Some(recorder) = history.as_deref_mut() {
            if let Err(err) = recorder.record(&report.summary) {
                warn!(module = report.summary.service.as_str(), error = %err, "history persistence failed");
                return Err(err.into());
            }
            outcome.persisted_modules += 1;
        }
    }
    Ok(outcome)
}
