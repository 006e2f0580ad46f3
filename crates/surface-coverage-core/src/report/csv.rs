// crates/surface-coverage-core/src/report/csv.rs
// ============================================================================
// Module: CSV Report Sink
// Description: Writes resource and module rows to two CSV streams.
// Purpose: Produce `resources.csv` and `modules.csv`.
// Dependencies: csv, crate::interfaces, tracing
// ============================================================================

//! ## Overview
//! [`CsvReportSink`] writes both header rows on construction and one row per
//! record afterwards. Coverage renders as an integer percent with a trailing
//! `%`; covered surface units render in shortest decimal form.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;
use csv::WriterBuilder;
use tracing::info;

use crate::analysis::aggregate::ModuleSummary;
use crate::analysis::aggregate::ResourceSurfaceRecord;
use crate::interfaces::ReportError;
use crate::interfaces::ReportSink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File name of the per-resource report.
pub const RESOURCES_FILE_NAME: &str = "resources.csv";

/// File name of the per-module report.
pub const MODULES_FILE_NAME: &str = "modules.csv";

/// Header of the per-resource report.
pub const RESOURCES_HEADER: [&str; 4] = ["service", "resource", "surface", "stability"];

/// Header of the per-module report.
pub const MODULES_HEADER: [&str; 9] = [
    "Service",
    "Stability",
    "Surface (props)",
    "Stable (props)",
    "Experimental (props)",
    "Deprecated (props)",
    "Coverage",
    "Total SUs",
    "Covered SUs",
];

// ============================================================================
// SECTION: Sink
// ============================================================================

/// CSV report sink over two writers.
pub struct CsvReportSink<W: Write> {
    /// Resource rows.
    resources: Writer<W>,
    /// Module rows.
    modules: Writer<W>,
}

impl<W: Write> CsvReportSink<W> {
    /// Wraps two writers and emits both headers.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when a header cannot be written.
    pub fn new(resources: W, modules: W) -> Result<Self, ReportError> {
        let mut resources = WriterBuilder::new().has_headers(false).from_writer(resources);
        let mut modules = WriterBuilder::new().has_headers(false).from_writer(modules);
        resources.write_record(RESOURCES_HEADER).map_err(encode_error)?;
        modules.write_record(MODULES_HEADER).map_err(encode_error)?;
        Ok(Self {
            resources,
            modules,
        })
    }

    /// Flushes and returns the underlying writers.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Io`] when flushing fails.
    pub fn into_inner(self) -> Result<(W, W), ReportError> {
        let resources = self.resources.into_inner().map_err(|err| ReportError::Io(err.to_string()))?;
        let modules = self.modules.into_inner().map_err(|err| ReportError::Io(err.to_string()))?;
        Ok((resources, modules))
    }
}

impl CsvReportSink<File> {
    /// Creates (truncating) both report files inside `out_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Io`] when a file cannot be created.
    pub fn create(out_dir: &Path) -> Result<Self, ReportError> {
        let resources = create_file(&out_dir.join(RESOURCES_FILE_NAME))?;
        let modules = create_file(&out_dir.join(MODULES_FILE_NAME))?;
        info!(out_dir = %out_dir.display(), "writing csv reports");
        Self::new(resources, modules)
    }
}

impl<W: Write> ReportSink for CsvReportSink<W> {
    fn write_resource(&mut self, record: &ResourceSurfaceRecord) -> Result<(), ReportError> {
        self.resources
            .write_record([
                record.service.clone(),
                record.resource.clone(),
                record.surface.to_string(),
                record.stability.to_string(),
            ])
            .map_err(encode_error)
    }

    fn write_module(&mut self, summary: &ModuleSummary) -> Result<(), ReportError> {
        self.modules.write_record(module_row(summary)).map_err(encode_error)
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        self.resources.flush().map_err(|err| ReportError::Io(err.to_string()))?;
        self.modules.flush().map_err(|err| ReportError::Io(err.to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders a module summary in header column order.
#[must_use]
pub fn module_row(summary: &ModuleSummary) -> [String; 9] {
    [
        summary.service.clone(),
        summary.stability.to_string(),
        summary.total_props.to_string(),
        summary.stable_props.to_string(),
        summary.experimental_props.to_string(),
        summary.deprecated_props.to_string(),
        format!("{}%", summary.coverage_percent),
        summary.total_su.to_string(),
        summary.covered_su.to_string(),
    ]
}

/// Creates a report file, mapping failures to [`ReportError::Io`].
fn create_file(path: &Path) -> Result<File, ReportError> {
    File::create(path).map_err(|err| ReportError::Io(format!("{}: {err}", path.display())))
}

/// Maps CSV encoding errors.
fn encode_error(err: csv::Error) -> ReportError {
    ReportError::Encode(err.to_string())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
