// crates/surface-coverage-cli/src/mysql_store.rs
// ============================================================================
// Module: MySQL History Store
// Description: HistoryStore over the product-metrics stored procedures.
// Purpose: Persist snapshots and history rows to an existing MySQL schema.
// Dependencies: mysql, surface-coverage-core
// ============================================================================

//! ## Overview
//! The schema is owned by the database: this store only calls
//! `module_save`, `module_history_get_id`, and `module_history_save`.
//! Deduplication of history rows is the procedures' responsibility.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;

use mysql::Conn;
use mysql::OptsBuilder;
use mysql::Row;
use mysql::prelude::Queryable;
use surface_coverage_core::HistoryError;
use surface_coverage_core::HistoryId;
use surface_coverage_core::HistoryStore;
use surface_coverage_core::ModuleHistoryRecord;
use surface_coverage_core::ModuleSnapshot;
use surface_coverage_core::ModuleVersion;

use crate::persistence::MysqlSettings;

// ============================================================================
// SECTION: Procedures
// ============================================================================

/// Snapshot upsert procedure.
pub const MODULE_SAVE_CALL: &str = "CALL module_save(?, ?, ?, ?, ?, ?, ?, ?)";
/// History id lookup procedure.
pub const HISTORY_GET_ID_CALL: &str = "CALL module_history_get_id(?, ?, ?, ?)";
/// History append procedure.
pub const HISTORY_SAVE_CALL: &str = "CALL module_history_save(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// `module_save` arguments: module, stability, maturity, category, props,
/// stable, deprecated, experimental.
pub type ModuleSaveParams<'a> = (&'a str, u8, u8, u8, u64, u64, u64, u64);

/// `module_history_get_id` arguments: module, major, minor, patch.
pub type HistoryGetIdParams<'a> = (&'a str, u32, u32, u32);

/// `module_history_save` arguments: id, module, major, minor, patch,
/// maturity, props, stable, deprecated, experimental, normalized version.
pub type HistorySaveParams<'a> = (&'a str, &'a str, u32, u32, u32, u8, u64, u64, u64, u64, &'a str);

/// Orders snapshot fields for [`MODULE_SAVE_CALL`].
#[must_use]
pub fn module_save_params(snapshot: &ModuleSnapshot) -> ModuleSaveParams<'_> {
    (
        snapshot.module.as_str(),
        snapshot.stability_rank,
        snapshot.maturity_rank,
        snapshot.category,
        snapshot.counts.total,
        snapshot.counts.stable,
        snapshot.counts.deprecated,
        snapshot.counts.experimental,
    )
}

/// Orders lookup keys for [`HISTORY_GET_ID_CALL`].
#[must_use]
pub const fn history_get_id_params<'a>(module: &'a str, version: &ModuleVersion) -> HistoryGetIdParams<'a> {
    (module, version.major, version.minor, version.patch)
}

/// Orders history fields for [`HISTORY_SAVE_CALL`]. The stability rank is
/// not part of the procedure signature.
#[must_use]
pub fn history_save_params(record: &ModuleHistoryRecord) -> HistorySaveParams<'_> {
    (
        record.history_id.as_str(),
        record.module.as_str(),
        record.version.major,
        record.version.minor,
        record.version.patch,
        record.maturity_rank,
        record.counts.total,
        record.counts.stable,
        record.counts.deprecated,
        record.counts.experimental,
        record.normalized_version.as_str(),
    )
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// MySQL-backed history store using a single connection.
pub struct MysqlHistoryStore {
    /// Connection guarded for `&self` access.
    connection: Mutex<Conn>,
}

impl MysqlHistoryStore {
    /// Connects using `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Backend`] when the connection fails.
    pub fn connect(settings: &MysqlSettings) -> Result<Self, HistoryError> {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(settings.host.as_str()))
            .user(Some(settings.user.as_str()))
            .pass(Some(settings.password.as_str()))
            .db_name(Some(settings.database.as_str()));
        let connection = Conn::new(opts).map_err(backend)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Runs `f` with the locked connection.
    fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut Conn) -> mysql::Result<T>,
    ) -> Result<T, HistoryError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| HistoryError::Backend("mysql connection mutex poisoned".to_string()))?;
        f(&mut guard).map_err(backend)
    }
}

impl HistoryStore for MysqlHistoryStore {
    fn find_history_id(&self, module: &str, version: &ModuleVersion) -> Result<Option<HistoryId>, HistoryError> {
        let row: Option<Row> = self
            .with_connection(|conn| conn.exec_first(HISTORY_GET_ID_CALL, history_get_id_params(module, version)))?;
        Ok(row.and_then(|row| row.get::<String, &str>("id")).map(HistoryId::new))
    }

    fn append_history(&self, record: &ModuleHistoryRecord) -> Result<(), HistoryError> {
        self.with_connection(|conn| conn.exec_drop(HISTORY_SAVE_CALL, history_save_params(record)))
    }

    fn save_snapshot(&self, snapshot: &ModuleSnapshot) -> Result<(), HistoryError> {
        self.with_connection(|conn| conn.exec_drop(MODULE_SAVE_CALL, module_save_params(snapshot)))
    }

    fn readiness(&self) -> Result<(), HistoryError> {
        self.with_connection(|conn| conn.ping())
    }
}

/// Maps a driver error to a backend failure.
fn backend(err: mysql::Error) -> HistoryError {
    HistoryError::Backend(err.to_string())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
