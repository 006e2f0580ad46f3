//! Config load validation tests for surface-coverage-config.
// crates/surface-coverage-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards and section defaults.
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

#![allow(clippy::use_debug, reason = "Test diagnostics print rejected values.")]

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use surface_coverage_config::CONFIG_ENV_VAR;
use surface_coverage_config::ConfigError;
use surface_coverage_config::SurfaceCoverageConfig;
use surface_coverage_core::ModuleVersion;
use surface_coverage_store_sqlite::SqliteStoreMode;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<SurfaceCoverageConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

fn write_config(content: &str) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content.as_bytes()).map_err(|err| err.to_string())?;
    Ok(file)
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(SurfaceCoverageConfig::load(Some(path)), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(SurfaceCoverageConfig::load(Some(path)), "config path component too long")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'#'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(SurfaceCoverageConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(SurfaceCoverageConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_rejects_missing_explicit_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    assert_invalid(SurfaceCoverageConfig::load(Some(&path)), "config io error")
}

#[test]
fn load_rejects_unknown_fields() -> TestResult {
    let file = write_config("[analysis]\nmarker = \"Cfn\"\n")?;
    assert_invalid(SurfaceCoverageConfig::load(Some(file.path())), "config parse error")
}

#[test]
fn empty_file_yields_defaults() -> TestResult {
    let file = write_config("")?;
    let config = SurfaceCoverageConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config != SurfaceCoverageConfig::default() {
        return Err(format!("unexpected config: {config:?}"));
    }
    let analyzer = config.analyzer_config();
    if analyzer.module_prefix.as_deref() != Some("@aws-cdk/aws-") {
        return Err("default module prefix missing".to_string());
    }
    if config.paths.manifest_dir != PathBuf::from("jsii") {
        return Err("default manifest dir missing".to_string());
    }
    let policy = config.history_policy().map_err(|err| err.to_string())?;
    if policy.latest_version != ModuleVersion::new(1, 60, 0) || policy.category != 1 {
        return Err(format!("unexpected policy: {policy:?}"));
    }
    Ok(())
}

#[test]
fn sections_override_defaults() -> TestResult {
    let config = SurfaceCoverageConfig::from_toml(
        r#"
[analysis]
module_prefix = ""
resource_marker = "Raw"

[history]
latest_version = "2.0.0"
category = 3

[sqlite]
path = "data/history.db"
journal_mode = "delete"

[paths]
manifest_dir = "manifests"
out_dir = "reports"
"#,
    )
    .map_err(|err| err.to_string())?;
    let analyzer = config.analyzer_config();
    if analyzer.module_prefix.is_some() || analyzer.resource_marker != "Raw" {
        return Err(format!("unexpected analyzer config: {analyzer:?}"));
    }
    if analyzer.props_parameter != "props" {
        return Err("props parameter default lost".to_string());
    }
    let policy = config.history_policy().map_err(|err| err.to_string())?;
    if policy.latest_version != ModuleVersion::new(2, 0, 0) || policy.category != 3 {
        return Err(format!("unexpected policy: {policy:?}"));
    }
    if config.sqlite.path != PathBuf::from("data/history.db")
        || config.sqlite.journal_mode != SqliteStoreMode::Delete
    {
        return Err(format!("unexpected sqlite config: {:?}", config.sqlite));
    }
    if config.paths.out_dir != PathBuf::from("reports") {
        return Err("out_dir override lost".to_string());
    }
    Ok(())
}

#[test]
fn rejects_malformed_latest_version() -> TestResult {
    assert_invalid(
        SurfaceCoverageConfig::from_toml("[history]\nlatest_version = \"1.60\"\n"),
        "history.latest_version",
    )
}

#[test]
fn rejects_zero_category() -> TestResult {
    assert_invalid(
        SurfaceCoverageConfig::from_toml("[history]\ncategory = 0\n"),
        "history.category must be greater than zero",
    )
}

#[test]
fn rejects_empty_resource_marker() -> TestResult {
    assert_invalid(
        SurfaceCoverageConfig::from_toml("[analysis]\nresource_marker = \"\"\n"),
        "analysis.resource_marker must be non-empty",
    )
}

#[test]
fn rejects_whitespace_props_parameter() -> TestResult {
    assert_invalid(
        SurfaceCoverageConfig::from_toml("[analysis]\nprops_parameter = \"my props\"\n"),
        "analysis.props_parameter must not contain whitespace",
    )
}

#[test]
fn rejects_excessive_busy_timeout() -> TestResult {
    assert_invalid(
        SurfaceCoverageConfig::from_toml("[sqlite]\nbusy_timeout_ms = 600001\n"),
        "sqlite.busy_timeout_ms",
    )
}

#[test]
fn rejects_empty_out_dir() -> TestResult {
    assert_invalid(
        SurfaceCoverageConfig::from_toml("[paths]\nout_dir = \"  \"\n"),
        "paths.out_dir must be non-empty",
    )
}

#[test]
fn explicit_path_wins_over_environment() -> TestResult {
    let explicit = write_config("[history]\ncategory = 2\n")?;
    let from_env = write_config("[history]\ncategory = 5\n")?;
    let env_path = from_env.path().display().to_string();
    let config = SurfaceCoverageConfig::load_with_env(Some(explicit.path()), |name| {
        (name == CONFIG_ENV_VAR).then(|| env_path.clone())
    })
    .map_err(|err| err.to_string())?;
    if config.history.category != 2 {
        return Err(format!("explicit config ignored: category {}", config.history.category));
    }
    Ok(())
}

#[test]
fn environment_path_used_without_explicit_path() -> TestResult {
    let from_env = write_config("[history]\ncategory = 5\n")?;
    let env_path = from_env.path().display().to_string();
    let config = SurfaceCoverageConfig::load_with_env(None, |name| {
        (name == CONFIG_ENV_VAR).then(|| env_path.clone())
    })
    .map_err(|err| err.to_string())?;
    if config.history.category != 5 {
        return Err(format!("environment config ignored: category {}", config.history.category));
    }
    Ok(())
}

#[test]
fn missing_environment_path_is_an_error() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let env_path = dir.path().join("absent.toml").display().to_string();
    assert_invalid(
        SurfaceCoverageConfig::load_with_env(None, |name| {
            (name == CONFIG_ENV_VAR).then(|| env_path.clone())
        }),
        "config io error",
    )
}

#[test]
fn absent_default_file_yields_defaults() -> TestResult {
    let config =
        SurfaceCoverageConfig::load_with_env(None, |_| None).map_err(|err| err.to_string())?;
    if config != SurfaceCoverageConfig::default() {
        return Err(format!("unexpected config: {config:?}"));
    }
    Ok(())
}
