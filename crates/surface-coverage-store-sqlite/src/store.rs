// crates/surface-coverage-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Module History Store
// Description: Durable HistoryStore backed by SQLite.
// Purpose: Persist immutable module history rows and current snapshots.
// Dependencies: surface-coverage-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! This module implements a durable [`HistoryStore`] using `SQLite`. History
//! rows are append-only and keyed by `(module, major, minor, patch)`; repeated
//! appends of the same key are ignored. Snapshot rows are keyed by module and
//! replaced on every save.
//! Security posture: database contents are untrusted; reads validate ranges
//! before converting back into domain types.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use surface_coverage_core::HistoryError;
use surface_coverage_core::HistoryId;
use surface_coverage_core::HistoryStore;
use surface_coverage_core::ModuleHistoryRecord;
use surface_coverage_core::ModuleSnapshot;
use surface_coverage_core::ModuleVersion;
use surface_coverage_core::PropertyCounts;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Current schema version stored in `store_meta`.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout in milliseconds.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum length of the full store path.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default database file name.
pub const DEFAULT_DATABASE_FILE: &str = "surface-coverage.db";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode.
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode.
    #[default]
    Full,
    /// Normal synchronous mode.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` history store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a configuration with default tuning for the given path.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self::at(default_path())
    }
}

/// Returns the default database path.
fn default_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE_FILE)
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteHistoryError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored row failed integrity checks.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteHistoryError> for HistoryError {
    fn from(error: SqliteHistoryError) -> Self {
        match error {
            SqliteHistoryError::Io(message) => Self::Io(message),
            SqliteHistoryError::Db(message) => Self::Backend(message),
            SqliteHistoryError::Corrupt(message) => Self::Corrupt(message),
            SqliteHistoryError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteHistoryError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps engine errors.
fn db_error(err: &rusqlite::Error) -> SqliteHistoryError {
    SqliteHistoryError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed module history store.
///
/// # Invariants
/// - Connection access is serialized through a mutex.
/// - History rows are never updated or deleted.
pub struct SqliteHistoryStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection.
    connection: Mutex<Connection>,
}

impl SqliteHistoryStore {
    /// Opens an `SQLite`-backed history store, creating the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteHistoryError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteHistoryError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        debug!(path = %config.path.display(), "opened sqlite history store");
        Ok(Self {
            config,
            connection: Mutex::new(connection),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Runs a closure with the locked connection.
    fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, SqliteHistoryError>,
    ) -> Result<T, SqliteHistoryError> {
        let guard = self
            .connection
            .lock()
            .map_err(|_| SqliteHistoryError::Io("sqlite mutex poisoned".to_string()))?;
        f(&guard)
    }

    /// Returns the history id stored for a module version.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteHistoryError`] when the query fails.
    pub fn lookup_history_id(
        &self,
        module: &str,
        version: &ModuleVersion,
    ) -> Result<Option<HistoryId>, SqliteHistoryError> {
        self.with_connection(|connection| {
            let id: Option<String> = connection
                .query_row(
                    "SELECT history_id FROM module_history
                     WHERE module = ?1 AND major = ?2 AND minor = ?3 AND patch = ?4",
                    params![module, version.major, version.minor, version.patch],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|err| db_error(&err))?;
            Ok(id.map(HistoryId::new))
        })
    }

    /// Inserts a history row unless its natural key already exists.
    ///
    /// Returns true when a row was inserted.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteHistoryError`] when the insert fails.
    pub fn insert_history(&self, record: &ModuleHistoryRecord) -> Result<bool, SqliteHistoryError> {
        let counts = encode_counts(&record.counts)?;
        self.with_connection(|connection| {
            let inserted = connection
                .execute(
                    "INSERT INTO module_history (
                        history_id, module, major, minor, patch, normalized_version,
                        maturity_rank, stability_rank, num_props, num_stable_props,
                        num_experimental_props, num_deprecated_props, saved_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                    ON CONFLICT (module, major, minor, patch) DO NOTHING",
                    params![
                        record.history_id.as_str(),
                        record.module,
                        record.version.major,
                        record.version.minor,
                        record.version.patch,
                        record.normalized_version,
                        record.maturity_rank,
                        record.stability_rank,
                        counts[0],
                        counts[1],
                        counts[2],
                        counts[3],
                        unix_millis(),
                    ],
                )
                .map_err(|err| db_error(&err))?;
            Ok(inserted > 0)
        })
    }

    /// Upserts the snapshot row of a module.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteHistoryError`] when the write fails.
    pub fn upsert_snapshot(&self, snapshot: &ModuleSnapshot) -> Result<(), SqliteHistoryError> {
        let counts = encode_counts(&snapshot.counts)?;
        self.with_connection(|connection| {
            connection
                .execute(
                    "INSERT INTO module_snapshots (
                        module, stability_rank, maturity_rank, category, num_props,
                        num_stable_props, num_experimental_props, num_deprecated_props, saved_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT (module) DO UPDATE SET
                        stability_rank = excluded.stability_rank,
                        maturity_rank = excluded.maturity_rank,
                        category = excluded.category,
                        num_props = excluded.num_props,
                        num_stable_props = excluded.num_stable_props,
                        num_experimental_props = excluded.num_experimental_props,
                        num_deprecated_props = excluded.num_deprecated_props,
                        saved_at = excluded.saved_at",
                    params![
                        snapshot.module,
                        snapshot.stability_rank,
                        snapshot.maturity_rank,
                        snapshot.category,
                        counts[0],
                        counts[1],
                        counts[2],
                        counts[3],
                        unix_millis(),
                    ],
                )
                .map_err(|err| db_error(&err))?;
            Ok(())
        })
    }

    /// Loads the snapshot row of a module.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteHistoryError`] when the query fails or the row is
    /// corrupt.
    pub fn load_snapshot(&self, module: &str) -> Result<Option<ModuleSnapshot>, SqliteHistoryError> {
        self.with_connection(|connection| {
            let row = connection
                .query_row(
                    "SELECT module, stability_rank, maturity_rank, category, num_props,
                            num_stable_props, num_experimental_props, num_deprecated_props
                     FROM module_snapshots WHERE module = ?1",
                    params![module],
                    |row| {
                        Ok(SnapshotRow {
                            module: row.get(0)?,
                            stability_rank: row.get(1)?,
                            maturity_rank: row.get(2)?,
                            category: row.get(3)?,
                            counts: [row.get(4)?, row.get(5)?, row.get(6)?, row.get(7)?],
                        })
                    },
                )
                .optional()
                .map_err(|err| db_error(&err))?;
            row.map(SnapshotRow::into_snapshot).transpose()
        })
    }

    /// Lists every history row of a module in version order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteHistoryError`] when the query fails or a row is
    /// corrupt.
    pub fn list_history(&self, module: &str) -> Result<Vec<ModuleHistoryRecord>, SqliteHistoryError> {
        self.with_connection(|connection| {
            let mut statement = connection
                .prepare(
                    "SELECT history_id, module, major, minor, patch, normalized_version,
                            maturity_rank, stability_rank, num_props, num_stable_props,
                            num_experimental_props, num_deprecated_props
                     FROM module_history WHERE module = ?1
                     ORDER BY normalized_version",
                )
                .map_err(|err| db_error(&err))?;
            let rows = statement
                .query_map(params![module], |row| {
                    Ok(HistoryRow {
                        history_id: row.get(0)?,
                        module: row.get(1)?,
                        version: [row.get(2)?, row.get(3)?, row.get(4)?],
                        normalized_version: row.get(5)?,
                        maturity_rank: row.get(6)?,
                        stability_rank: row.get(7)?,
                        counts: [row.get(8)?, row.get(9)?, row.get(10)?, row.get(11)?],
                    })
                })
                .map_err(|err| db_error(&err))?;
            let mut records = Vec::new();
            for row in rows {
                records.push(row.map_err(|err| db_error(&err))?.into_record()?);
            }
            Ok(records)
        })
    }

    /// Verifies the store can execute a simple SQL statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteHistoryError`] if the mutex is poisoned or the query
    /// fails.
    pub fn check_connection(&self) -> Result<(), SqliteHistoryError> {
        self.with_connection(|connection| {
            connection.query_row("SELECT 1", [], |_| Ok(())).map_err(|err| db_error(&err))
        })
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn find_history_id(
        &self,
        module: &str,
        version: &ModuleVersion,
    ) -> Result<Option<HistoryId>, HistoryError> {
        self.lookup_history_id(module, version).map_err(HistoryError::from)
    }

    fn append_history(&self, record: &ModuleHistoryRecord) -> Result<(), HistoryError> {
        let inserted = self.insert_history(record).map_err(HistoryError::from)?;
        if !inserted {
            debug!(module = record.module.as_str(), version = %record.version, "history row already present");
        }
        Ok(())
    }

    fn save_snapshot(&self, snapshot: &ModuleSnapshot) -> Result<(), HistoryError> {
        self.upsert_snapshot(snapshot).map_err(HistoryError::from)
    }

    fn readiness(&self) -> Result<(), HistoryError> {
        self.check_connection().map_err(HistoryError::from)
    }
}

// ============================================================================
// SECTION: Row Decoding
// ============================================================================

/// Raw snapshot columns.
struct SnapshotRow {
    /// Module name.
    module: String,
    /// Stability rank column.
    stability_rank: i64,
    /// Maturity rank column.
    maturity_rank: i64,
    /// Category column.
    category: i64,
    /// Count columns: total, stable, experimental, deprecated.
    counts: [i64; 4],
}

impl SnapshotRow {
    /// Validates and converts the row.
    fn into_snapshot(self) -> Result<ModuleSnapshot, SqliteHistoryError> {
        Ok(ModuleSnapshot {
            stability_rank: decode_rank(self.stability_rank, "stability_rank")?,
            maturity_rank: decode_rank(self.maturity_rank, "maturity_rank")?,
            category: decode_rank(self.category, "category")?,
            counts: decode_counts(self.counts)?,
            module: self.module,
        })
    }
}

/// Raw history columns.
struct HistoryRow {
    /// History id column.
    history_id: String,
    /// Module name.
    module: String,
    /// Major, minor, patch columns.
    version: [i64; 3],
    /// Normalized version column.
    normalized_version: String,
    /// Maturity rank column.
    maturity_rank: i64,
    /// Stability rank column.
    stability_rank: i64,
    /// Count columns: total, stable, experimental, deprecated.
    counts: [i64; 4],
}

impl HistoryRow {
    /// Validates and converts the row.
    fn into_record(self) -> Result<ModuleHistoryRecord, SqliteHistoryError> {
        let [major, minor, patch] = self.version.map(decode_version_part);
        let version = ModuleVersion::new(major?, minor?, patch?);
        if version.normalized() != self.normalized_version {
            return Err(SqliteHistoryError::Corrupt(format!(
                "normalized version {} does not match {version}",
                self.normalized_version
            )));
        }
        Ok(ModuleHistoryRecord {
            history_id: HistoryId::new(self.history_id),
            module: self.module,
            version,
            normalized_version: self.normalized_version,
            maturity_rank: decode_rank(self.maturity_rank, "maturity_rank")?,
            stability_rank: decode_rank(self.stability_rank, "stability_rank")?,
            counts: decode_counts(self.counts)?,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts counts to `SQLite` integers.
fn encode_counts(counts: &PropertyCounts) -> Result<[i64; 4], SqliteHistoryError> {
    let encode = |value: u64| {
        i64::try_from(value)
            .map_err(|_| SqliteHistoryError::Invalid(format!("property count {value} out of range")))
    };
    Ok([
        encode(counts.total)?,
        encode(counts.stable)?,
        encode(counts.experimental)?,
        encode(counts.deprecated)?,
    ])
}

/// Converts stored counts back to domain values.
fn decode_counts(counts: [i64; 4]) -> Result<PropertyCounts, SqliteHistoryError> {
    let [total, stable, experimental, deprecated] = counts.map(|value| {
        u64::try_from(value)
            .map_err(|_| SqliteHistoryError::Corrupt(format!("negative property count {value}")))
    });
    Ok(PropertyCounts {
        total: total?,
        stable: stable?,
        experimental: experimental?,
        deprecated: deprecated?,
    })
}

/// Converts a stored rank column.
fn decode_rank(value: i64, column: &str) -> Result<u8, SqliteHistoryError> {
    u8::try_from(value)
        .map_err(|_| SqliteHistoryError::Corrupt(format!("{column} out of range: {value}")))
}

/// Converts a stored version component.
fn decode_version_part(value: i64) -> Result<u32, SqliteHistoryError> {
    u32::try_from(value)
        .map_err(|_| SqliteHistoryError::Corrupt(format!("version component out of range: {value}")))
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteHistoryError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteHistoryError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteHistoryError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteHistoryError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteHistoryError::Invalid("store path must not be empty".to_string()));
    }
    if path.display().to_string().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteHistoryError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteHistoryError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteHistoryError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteHistoryError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(|err| db_error(&err))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies journal, sync, and busy-timeout settings.
fn apply_pragmas(connection: &Connection, config: &SqliteStoreConfig) -> Result<(), SqliteHistoryError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| db_error(&err))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteHistoryError> {
    let tx = connection.transaction().map_err(|err| db_error(&err))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| db_error(&err))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| db_error(&err))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| db_error(&err))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS module_snapshots (
                    module TEXT NOT NULL PRIMARY KEY,
                    stability_rank INTEGER NOT NULL,
                    maturity_rank INTEGER NOT NULL,
                    category INTEGER NOT NULL,
                    num_props INTEGER NOT NULL,
                    num_stable_props INTEGER NOT NULL,
                    num_experimental_props INTEGER NOT NULL,
                    num_deprecated_props INTEGER NOT NULL,
                    saved_at INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS module_history (
                    history_id TEXT NOT NULL,
                    module TEXT NOT NULL,
                    major INTEGER NOT NULL,
                    minor INTEGER NOT NULL,
                    patch INTEGER NOT NULL,
                    normalized_version TEXT NOT NULL,
                    maturity_rank INTEGER NOT NULL,
                    stability_rank INTEGER NOT NULL,
                    num_props INTEGER NOT NULL,
                    num_stable_props INTEGER NOT NULL,
                    num_experimental_props INTEGER NOT NULL,
                    num_deprecated_props INTEGER NOT NULL,
                    saved_at INTEGER NOT NULL,
                    PRIMARY KEY (module, major, minor, patch)
                );
                CREATE INDEX IF NOT EXISTS idx_module_history_normalized
                    ON module_history (module, normalized_version);",
            )
            .map_err(|err| db_error(&err))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteHistoryError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| db_error(&err))?;
    Ok(())
}

/// Returns the current unix epoch in milliseconds.
fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
