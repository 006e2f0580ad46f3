// crates/surface-coverage-cli/src/run.rs
// ============================================================================
// Module: Report Command
// Description: Wires configuration, manifests, sinks, and stores into a run.
// Purpose: Execute one coverage report for a module version.
// Dependencies: surface-coverage-{core,config,store-sqlite}, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`execute`] runs the report in a fixed order: parse the version, resolve
//! the persistence target, load configuration, open the history store, load
//! manifests, create the CSV files, then analyse. Every failure before the
//! CSV files are created leaves the output directory untouched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use surface_coverage_config::SurfaceCoverageConfig;
use surface_coverage_core::CsvReportSink;
use surface_coverage_core::HistoryRecorder;
use surface_coverage_core::HistoryStore;
use surface_coverage_core::ModuleVersion;
use surface_coverage_core::RunOutcome;
use surface_coverage_core::SurfaceAnalyzer;
use surface_coverage_core::VersionError;
use surface_coverage_core::load_manifest_dir;
use surface_coverage_core::run_report;
use surface_coverage_store_sqlite::SqliteHistoryStore;
use surface_coverage_store_sqlite::SqliteStoreConfig;
use thiserror::Error;
use tracing::info;
use tracing::warn;

use crate::persistence::MysqlSettings;
use crate::persistence::PersistMode;
use crate::persistence::PersistTarget;
use crate::persistence::resolve_target;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Inputs of one report run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    /// Persistence argument (`mysql`, `rest`, `sqlite`, other).
    pub persist: String,
    /// Module version being reported, `MAJOR.MINOR.PATCH`.
    pub version: String,
    /// Manifest directory overriding configuration.
    pub manifest_dir: Option<PathBuf>,
    /// Output directory overriding configuration.
    pub out_dir: Option<PathBuf>,
    /// Explicit configuration file.
    pub config: Option<PathBuf>,
}

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    #[must_use]
    pub const fn new(message: String) -> Self {
        Self {
            message,
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// CLI result alias for fallible operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Execution
// ============================================================================

/// Runs one report.
///
/// # Errors
///
/// Returns [`CliError`] for configuration, environment, manifest, analysis,
/// report, or persistence failures.
pub fn execute<F>(request: &RunRequest, lookup: F) -> CliResult<RunOutcome>
where
    F: Fn(&str) -> Option<String>,
{
    let version: ModuleVersion =
        request.version.parse().map_err(|err: VersionError| CliError::new(err.to_string()))?;
    let target = resolve_target(PersistMode::parse(&request.persist), &lookup)
        .map_err(|err| CliError::new(err.to_string()))?;
    let config = SurfaceCoverageConfig::load_with_env(request.config.as_deref(), &lookup)
        .map_err(|err| CliError::new(err.to_string()))?;
    let policy = config.history_policy().map_err(|err| CliError::new(err.to_string()))?;
    let analyzer_config = config.analyzer_config();
    let manifest_dir = request.manifest_dir.clone().unwrap_or_else(|| config.paths.manifest_dir.clone());
    let out_dir = request.out_dir.clone().unwrap_or_else(|| config.paths.out_dir.clone());

    let store = open_store(target, &config.sqlite)?;
    if let Some(store) = store.as_deref() {
        store.readiness().map_err(|err| CliError::new(err.to_string()))?;
    }

    let types = load_manifest_dir(&manifest_dir).map_err(|err| CliError::new(err.to_string()))?;
    info!(assemblies = types.len(), dir = %manifest_dir.display(), "loaded manifests");
    let analyzer = SurfaceAnalyzer::new(&types, &analyzer_config);
    let mut sink = CsvReportSink::create(&out_dir).map_err(|err| CliError::new(err.to_string()))?;

    let outcome = match store.as_deref() {
        Some(store) => {
            let mut recorder = HistoryRecorder::new(store, version, policy);
            run_report(&analyzer, &mut sink, Some(&mut recorder))
        }
        None => run_report(&analyzer, &mut sink, None),
    }
    .map_err(|err| CliError::new(err.to_string()))?;

    info!(
        version = %version,
        modules = outcome.modules,
        resources = outcome.resources,
        persisted = outcome.persisted_modules,
        "report complete"
    );
    Ok(outcome)
}

// ============================================================================
// SECTION: Stores
// ============================================================================

/// Opens the history store for `target`, if it persists anywhere.
fn open_store(target: PersistTarget, sqlite: &SqliteStoreConfig) -> CliResult<Option<Box<dyn HistoryStore>>> {
    match target {
        PersistTarget::CsvOnly => Ok(None),
        PersistTarget::Rest {
            url,
        } => {
            warn!(url = %url, "rest submission is not supported; writing csv only");
            Ok(None)
        }
        PersistTarget::Sqlite {
            path_override,
        } => {
            let mut config = sqlite.clone();
            if let Some(path) = path_override {
                config.path = path;
            }
            let store = SqliteHistoryStore::new(config).map_err(|err| CliError::new(err.to_string()))?;
            info!(path = %store.config().path.display(), "opened sqlite history store");
            Ok(Some(Box::new(store)))
        }
        PersistTarget::Mysql(settings) => open_mysql(&settings),
    }
}

/// Connects to the MySQL history store.
#[cfg(feature = "mysql-backend")]
fn open_mysql(settings: &MysqlSettings) -> CliResult<Option<Box<dyn HistoryStore>>> {
    let store = crate::mysql_store::MysqlHistoryStore::connect(settings)
        .map_err(|err| CliError::new(err.to_string()))?;
    info!(host = %settings.host, "connected to mysql");
    Ok(Some(Box::new(store)))
}

/// Rejects MySQL persistence in builds without the backend.
#[cfg(not(feature = "mysql-backend"))]
fn open_mysql(_settings: &MysqlSettings) -> CliResult<Option<Box<dyn HistoryStore>>> {
    Err(CliError::new("mysql persistence requires the mysql-backend feature".to_string()))
}
