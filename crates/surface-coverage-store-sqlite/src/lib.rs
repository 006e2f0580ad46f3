// crates/surface-coverage-store-sqlite/src/lib.rs
// ============================================================================
// Module: Surface Coverage SQLite Store Library
// Description: SQLite-backed module history store.
// Purpose: Persist module history and snapshots without an external server.
// Dependencies: surface-coverage-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! Provides [`SqliteHistoryStore`], a [`surface_coverage_core::HistoryStore`]
//! backed by a local `SQLite` database file.

pub mod store;

pub use store::SqliteHistoryStore;
pub use store::SqliteHistoryError;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
