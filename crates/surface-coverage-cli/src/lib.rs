// crates/surface-coverage-cli/src/lib.rs
// ============================================================================
// Module: Surface Coverage CLI Library
// Description: Run orchestration shared by the binary and its tests.
// Purpose: Keep the entry point thin and the run path testable.
// Dependencies: surface-coverage-{core,config,store-sqlite}, dotenvy, tracing
// ============================================================================

//! ## Overview
//! `surface-coverage <PERSIST> <VERSION>` analyses every loaded manifest,
//! writes `resources.csv` and `modules.csv`, and optionally records module
//! history. This library holds the pieces the binary wires together:
//! persistence target resolution, logging setup, and the run itself.

pub mod logging;
#[cfg(feature = "mysql-backend")]
pub mod mysql_store;
pub mod persistence;
pub mod run;

pub use persistence::EnvError;
pub use persistence::MysqlSettings;
pub use persistence::PersistMode;
pub use persistence::PersistTarget;
pub use run::CliError;
pub use run::CliResult;
pub use run::RunRequest;
pub use run::execute;
