// crates/surface-coverage-cli/src/logging.rs
// ============================================================================
// Module: Logging Setup
// Description: Installs the process-wide tracing subscriber.
// Purpose: Route run diagnostics to stderr under a RUST_LOG filter.
// Dependencies: tracing-subscriber
// ============================================================================

//! ## Overview
//! One fmt subscriber per process. `RUST_LOG` selects the filter; stdout is
//! never written, so report output and logs stay separate.

use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Installs a fmt subscriber writing to stderr.
///
/// # Errors
///
/// Returns a message when a global subscriber is already installed.
pub fn init_logging() -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| format!("failed to install log subscriber: {err}"))
}
