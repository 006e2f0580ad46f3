// crates/surface-coverage-cli/src/main.rs
// ============================================================================
// Module: Surface Coverage CLI Entry Point
// Description: Argument parsing and exit-code mapping.
// Purpose: Run one coverage report from the command line.
// Dependencies: clap, surface-coverage-cli
// ============================================================================

//! ## Overview
//! Parses `<PERSIST> <VERSION>` plus path overrides, installs logging, and
//! runs the report. Any failure, usage errors included, prints to stderr and
//! exits with 1. `--help` and `--version` exit with 0.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use surface_coverage_cli::CliError;
use surface_coverage_cli::CliResult;
use surface_coverage_cli::PersistMode;
use surface_coverage_cli::RunRequest;
use surface_coverage_cli::execute;
use surface_coverage_cli::logging::init_logging;
use surface_coverage_cli::persistence::load_dotenv;

// ============================================================================
// SECTION: Arguments
// ============================================================================

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "surface-coverage", version, about = "Measure construct coverage of the resource surface.")]
struct Cli {
    /// Persistence target: mysql, rest, sqlite; anything else writes CSV only.
    #[arg(value_name = "PERSIST")]
    persist: String,
    /// Module version being reported (MAJOR.MINOR.PATCH).
    #[arg(id = "module_version", value_name = "VERSION")]
    version: String,
    /// Directory holding the type manifests.
    #[arg(long, value_name = "DIR")]
    manifest_dir: Option<PathBuf>,
    /// Directory receiving resources.csv and modules.csv.
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,
    /// Configuration file (overrides SURFACE_COVERAGE_CONFIG).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => emit_error(err.message()),
    }
}

/// Parses arguments and executes the report.
fn run() -> CliResult<()> {
    let Some(cli) = parse_cli(std::env::args_os())? else {
        return Ok(());
    };
    init_logging().map_err(CliError::new)?;
    if PersistMode::parse(&cli.persist).loads_dotenv() {
        load_dotenv().map_err(|err| CliError::new(err.to_string()))?;
    }
    let request = RunRequest {
        persist: cli.persist,
        version: cli.version,
        manifest_dir: cli.manifest_dir,
        out_dir: cli.out_dir,
        config: cli.config,
    };
    execute(&request, |name| std::env::var(name).ok())?;
    Ok(())
}

/// Parses arguments; `None` means help or version output was printed.
fn parse_cli<I, T>(args: I) -> CliResult<Option<Cli>>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.print().map_err(|io| CliError::new(format!("failed to write help: {io}")))?;
            Ok(None)
        }
        Err(err) => Err(CliError::new(err.render().to_string().trim_end().to_string())),
    }
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "{message}");
    ExitCode::FAILURE
}
