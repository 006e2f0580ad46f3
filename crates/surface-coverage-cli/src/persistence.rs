// crates/surface-coverage-cli/src/persistence.rs
// ============================================================================
// Module: Persistence Target Resolution
// Description: Maps the persistence argument and environment to a target.
// Purpose: Fail before any processing when required settings are missing.
// Dependencies: dotenvy, thiserror
// ============================================================================

//! ## Overview
//! The first positional argument selects where module history goes:
//! `mysql`, `rest`, `sqlite`, or anything else for CSV output only. Each
//! target reads its settings from the environment through an injected lookup
//! so resolution stays testable without touching process state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// MySQL host variable.
pub const MYSQL_HOST_ENV: &str = "CDK_PM_HOST";
/// MySQL user variable.
pub const MYSQL_USER_ENV: &str = "CDK_PM_USER";
/// MySQL password variable.
pub const MYSQL_PASSWORD_ENV: &str = "CDK_PM_PASSWORD";
/// MySQL database variable.
pub const MYSQL_DATABASE_ENV: &str = "CDK_PM_DATABASE";
/// REST endpoint variable.
pub const REST_API_URL_ENV: &str = "REST_API_URL";
/// Optional override of the configured `SQLite` database path.
pub const SQLITE_PATH_ENV: &str = "SURFACE_SQLITE_PATH";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Environment resolution failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvError {
    /// A required variable is unset or empty.
    #[error("{0} environment variable not set")]
    Missing(String),
    /// The `.env` file exists but could not be applied.
    #[error("failed to load .env: {0}")]
    Dotenv(String),
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Persistence mode named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistMode {
    /// Stored procedures on a MySQL server.
    Mysql,
    /// REST endpoint.
    Rest,
    /// Local `SQLite` database.
    Sqlite,
    /// No persistence; CSV files only.
    CsvOnly,
}

impl PersistMode {
    /// Parses the persistence argument. Unrecognized values mean CSV only.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "mysql" => Self::Mysql,
            "rest" => Self::Rest,
            "sqlite" => Self::Sqlite,
            _ => Self::CsvOnly,
        }
    }

    /// Returns true when a `.env` file should be applied before resolution.
    #[must_use]
    pub const fn loads_dotenv(self) -> bool {
        matches!(self, Self::Mysql)
    }
}

/// MySQL connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct MysqlSettings {
    /// Server host name or address.
    pub host: String,
    /// Login user.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Database holding the history procedures.
    pub database: String,
}

impl fmt::Debug for MysqlSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MysqlSettings")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Resolved persistence target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistTarget {
    /// CSV output only.
    CsvOnly,
    /// MySQL history store.
    Mysql(MysqlSettings),
    /// REST endpoint.
    Rest {
        /// Base URL of the endpoint.
        url: String,
    },
    /// `SQLite` history store.
    Sqlite {
        /// Database path taking precedence over configuration.
        path_override: Option<PathBuf>,
    },
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolves the persistence target for `mode` using `lookup` for variables.
///
/// # Errors
///
/// Returns [`EnvError::Missing`] when a variable required by `mode` is unset
/// or empty.
pub fn resolve_target<F>(mode: PersistMode, lookup: F) -> Result<PersistTarget, EnvError>
where
    F: Fn(&str) -> Option<String>,
{
    match mode {
        PersistMode::CsvOnly => Ok(PersistTarget::CsvOnly),
        PersistMode::Mysql => Ok(PersistTarget::Mysql(MysqlSettings {
            host: required(&lookup, MYSQL_HOST_ENV)?,
            user: required(&lookup, MYSQL_USER_ENV)?,
            password: required(&lookup, MYSQL_PASSWORD_ENV)?,
            database: required(&lookup, MYSQL_DATABASE_ENV)?,
        })),
        PersistMode::Rest => Ok(PersistTarget::Rest {
            url: required(&lookup, REST_API_URL_ENV)?,
        }),
        PersistMode::Sqlite => Ok(PersistTarget::Sqlite {
            path_override: lookup(SQLITE_PATH_ENV)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
        }),
    }
}

/// Applies `.env` from the working directory. A missing file is not an error.
///
/// # Errors
///
/// Returns [`EnvError::Dotenv`] when the file exists but cannot be parsed.
pub fn load_dotenv() -> Result<(), EnvError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(EnvError::Dotenv(err.to_string())),
    }
}

/// Reads a required variable; empty values count as unset.
fn required<F>(lookup: &F, name: &str) -> Result<String, EnvError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|value| !value.is_empty()).ok_or_else(|| EnvError::Missing(name.to_string()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
