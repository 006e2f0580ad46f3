// crates/surface-coverage-config/src/config.rs
// ============================================================================
// Module: Surface Coverage Configuration
// Description: Configuration loading and validation for the analyzer.
// Purpose: Provide strict config parsing with hard limits and defaults.
// Dependencies: surface-coverage-core, surface-coverage-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The file is optional: when neither `--config` nor the environment names a
//! file and the default file is absent, built-in defaults apply. An
//! explicitly named file that cannot be read is an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use surface_coverage_core::AnalyzerConfig;
use surface_coverage_core::HistoryPolicy;
use surface_coverage_core::ModuleVersion;
use surface_coverage_core::analysis::aggregate::DEFAULT_MODULE_PREFIX;
use surface_coverage_core::analysis::aggregate::DEFAULT_PROPS_PARAMETER;
use surface_coverage_core::analysis::aggregate::DEFAULT_RESOURCE_MARKER;
use surface_coverage_core::history::DEFAULT_LATEST_VERSION;
use surface_coverage_core::history::DEFAULT_MODULE_CATEGORY;
use surface_coverage_store_sqlite::SqliteStoreConfig;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "surface-coverage.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "SURFACE_COVERAGE_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of analyzer name patterns.
const MAX_PATTERN_LENGTH: usize = 256;
/// Maximum `SQLite` busy timeout in milliseconds.
const MAX_BUSY_TIMEOUT_MS: u64 = 600_000;
/// Default manifest directory.
const DEFAULT_MANIFEST_DIR: &str = "jsii";
/// Default report output directory.
const DEFAULT_OUT_DIR: &str = ".";

// ============================================================================
// SECTION: Config
// ============================================================================

/// Root configuration.
///
/// # Invariants
/// - `validate` has succeeded on every value returned by [`Self::load`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurfaceCoverageConfig {
    /// Analyzer naming conventions.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// History recording settings.
    #[serde(default)]
    pub history: HistoryConfig,
    /// `SQLite` history store settings.
    #[serde(default)]
    pub sqlite: SqliteStoreConfig,
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,
}

impl SurfaceCoverageConfig {
    /// Loads configuration from `path`, the environment, or the default file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is unreadable, oversized, not
    /// UTF-8, malformed, or fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |name| env::var(name).ok())
    }

    /// Loads configuration, reading [`CONFIG_ENV_VAR`] through `lookup`.
    ///
    /// Precedence: `path`, then the variable, then [`DEFAULT_CONFIG_NAME`]
    /// in the working directory. Only the default may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] under the same conditions as [`Self::load`].
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (resolved, explicit) = resolve_path(path, lookup)?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            let mut config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        self.history.validate()?;
        validate_sqlite(&self.sqlite)?;
        self.paths.validate()?;
        Ok(())
    }

    /// Returns the analyzer settings.
    #[must_use]
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        self.analysis.analyzer_config()
    }

    /// Returns the history recording policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `history.latest_version` is malformed.
    pub fn history_policy(&self) -> Result<HistoryPolicy, ConfigError> {
        self.history.policy()
    }
}

// ============================================================================
// SECTION: Analysis
// ============================================================================

/// Analyzer naming conventions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Required assembly name prefix; empty disables the check.
    #[serde(default = "default_module_prefix")]
    pub module_prefix: String,
    /// Name prefix identifying generated resource classes.
    #[serde(default = "default_resource_marker")]
    pub resource_marker: String,
    /// Expected name of the third resource initializer parameter.
    #[serde(default = "default_props_parameter")]
    pub props_parameter: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            module_prefix: default_module_prefix(),
            resource_marker: default_resource_marker(),
            props_parameter: default_props_parameter(),
        }
    }
}

impl AnalysisConfig {
    /// Validates analyzer naming conventions.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.module_prefix.len() > MAX_PATTERN_LENGTH {
            return Err(ConfigError::Invalid("analysis.module_prefix exceeds max length".to_string()));
        }
        validate_identifier("analysis.resource_marker", &self.resource_marker)?;
        validate_identifier("analysis.props_parameter", &self.props_parameter)?;
        Ok(())
    }

    /// Converts to the analyzer's runtime settings.
    #[must_use]
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            module_prefix: (!self.module_prefix.is_empty()).then(|| self.module_prefix.clone()),
            resource_marker: self.resource_marker.clone(),
            props_parameter: self.props_parameter.clone(),
        }
    }
}

/// Returns the default module prefix.
fn default_module_prefix() -> String {
    DEFAULT_MODULE_PREFIX.to_string()
}

/// Returns the default resource marker.
fn default_resource_marker() -> String {
    DEFAULT_RESOURCE_MARKER.to_string()
}

/// Returns the default props parameter name.
fn default_props_parameter() -> String {
    DEFAULT_PROPS_PARAMETER.to_string()
}

// ============================================================================
// SECTION: History
// ============================================================================

/// History recording settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Version whose runs also refresh module snapshots.
    #[serde(default = "default_latest_version")]
    pub latest_version: String,
    /// Category written to snapshot rows.
    #[serde(default = "default_category")]
    pub category: u8,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            latest_version: default_latest_version(),
            category: default_category(),
        }
    }
}

impl HistoryConfig {
    /// Validates history settings.
    fn validate(&self) -> Result<(), ConfigError> {
        self.latest()?;
        if self.category == 0 {
            return Err(ConfigError::Invalid("history.category must be greater than zero".to_string()));
        }
        Ok(())
    }

    /// Parses the latest version.
    fn latest(&self) -> Result<ModuleVersion, ConfigError> {
        self.latest_version
            .parse::<ModuleVersion>()
            .map_err(|err| ConfigError::Invalid(format!("history.latest_version: {err}")))
    }

    /// Returns the recording policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the latest version is malformed.
    pub fn policy(&self) -> Result<HistoryPolicy, ConfigError> {
        Ok(HistoryPolicy {
            latest_version: self.latest()?,
            category: self.category,
        })
    }
}

/// Returns the default latest version.
fn default_latest_version() -> String {
    DEFAULT_LATEST_VERSION.to_string()
}

/// Returns the default module category.
const fn default_category() -> u8 {
    DEFAULT_MODULE_CATEGORY
}

// ============================================================================
// SECTION: Paths
// ============================================================================

/// Input and output locations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory holding type-definition manifests.
    #[serde(default = "default_manifest_dir")]
    pub manifest_dir: PathBuf,
    /// Directory receiving the CSV reports.
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            manifest_dir: default_manifest_dir(),
            out_dir: default_out_dir(),
        }
    }
}

impl PathsConfig {
    /// Validates path limits.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("paths.manifest_dir", &self.manifest_dir.to_string_lossy())?;
        validate_path_string("paths.out_dir", &self.out_dir.to_string_lossy())?;
        Ok(())
    }
}

/// Returns the default manifest directory.
fn default_manifest_dir() -> PathBuf {
    PathBuf::from(DEFAULT_MANIFEST_DIR)
}

/// Returns the default output directory.
fn default_out_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUT_DIR)
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
///
/// Returns the path and whether it was named explicitly.
fn resolve_path<F>(path: Option<&Path>, lookup: F) -> Result<(PathBuf, bool), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Some(env_path) = lookup(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a non-empty identifier without whitespace.
fn validate_identifier(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.len() > MAX_PATTERN_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(ConfigError::Invalid(format!("{field} must not contain whitespace")));
    }
    Ok(())
}

/// Validates `SQLite` store settings.
fn validate_sqlite(config: &SqliteStoreConfig) -> Result<(), ConfigError> {
    validate_path_string("sqlite.path", &config.path.to_string_lossy())?;
    if config.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
        return Err(ConfigError::Invalid(format!(
            "sqlite.busy_timeout_ms must be at most {MAX_BUSY_TIMEOUT_MS}"
        )));
    }
    Ok(())
}
