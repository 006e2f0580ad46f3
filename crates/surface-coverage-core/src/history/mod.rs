// crates/surface-coverage-core/src/history/mod.rs
// ============================================================================
// Module: Module History Protocol
// Description: History identifiers, persisted records, and the run recorder.
// Purpose: Persist module summaries as immutable per-version history rows.
// Dependencies: crate::analysis, crate::interfaces, crate::model, serde, uuid
// ============================================================================

//! ## Overview
//! Each module moves through `Unseen -> HasHistoryId -> SnapshotCurrent`
//! within a run. On first encounter the recorder reuses the history id the
//! store already holds for `(module, version)` or mints a fresh UUID v4.
//! When the run version is the designated latest version the module's
//! snapshot row is upserted first, then the immutable history row is
//! appended. The store deduplicates history rows on the natural key.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::analysis::aggregate::ModuleSummary;
use crate::interfaces::HistoryError;
use crate::interfaces::HistoryStore;
use crate::model::version::ModuleVersion;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Version whose runs also refresh the module snapshot.
pub const DEFAULT_LATEST_VERSION: ModuleVersion = ModuleVersion::new(1, 60, 0);

/// Module category written to snapshot rows.
pub const DEFAULT_MODULE_CATEGORY: u8 = 1;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Opaque history identifier shared by every row of a module version.
///
/// # Invariants
/// - Opaque UTF-8 string; freshly minted ids are UUID v4 in hyphenated form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryId(String);

impl HistoryId {
    /// Wraps an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a random UUID v4 identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HistoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Property counts persisted with every history and snapshot row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyCounts {
    /// Total properties.
    pub total: u64,
    /// Properties wrapped by stable constructs.
    pub stable: u64,
    /// Properties wrapped by experimental constructs.
    pub experimental: u64,
    /// Properties wrapped by deprecated constructs.
    pub deprecated: u64,
}

impl PropertyCounts {
    /// Extracts the persisted counts of a module summary.
    #[must_use]
    pub const fn from_summary(summary: &ModuleSummary) -> Self {
        Self {
            total: summary.total_props,
            stable: summary.stable_props,
            experimental: summary.experimental_props,
            deprecated: summary.deprecated_props,
        }
    }
}

/// Immutable history row for one module version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleHistoryRecord {
    /// History identifier.
    pub history_id: HistoryId,
    /// Module (service) name.
    pub module: String,
    /// Module version.
    pub version: ModuleVersion,
    /// Zero-padded sortable version.
    pub normalized_version: String,
    /// Maturity rank.
    pub maturity_rank: u8,
    /// Stability rank.
    pub stability_rank: u8,
    /// Property counts.
    pub counts: PropertyCounts,
}

/// Current (non-versioned) snapshot row of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSnapshot {
    /// Module (service) name.
    pub module: String,
    /// Stability rank.
    pub stability_rank: u8,
    /// Maturity rank.
    pub maturity_rank: u8,
    /// Module category.
    pub category: u8,
    /// Property counts.
    pub counts: PropertyCounts,
}

// ============================================================================
// SECTION: Recorder
// ============================================================================

/// Per-module protocol state within one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleHistoryState {
    /// Module not yet persisted in this run.
    Unseen,
    /// History id resolved and history row appended.
    HasHistoryId(HistoryId),
    /// History row appended and snapshot refreshed.
    SnapshotCurrent(HistoryId),
}

/// Settings for a history recording run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPolicy {
    /// Version whose runs also refresh snapshots.
    pub latest_version: ModuleVersion,
    /// Category written to snapshot rows.
    pub category: u8,
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        Self {
            latest_version: DEFAULT_LATEST_VERSION,
            category: DEFAULT_MODULE_CATEGORY,
        }
    }
}

/// Drives the history protocol against a store for one run version.
pub struct HistoryRecorder<'a> {
    /// Backing store.
    store: &'a dyn HistoryStore,
    /// Version of the processed corpus.
    version: ModuleVersion,
    /// Recording settings.
    policy: HistoryPolicy,
    /// Protocol state keyed by module.
    states: BTreeMap<String, ModuleHistoryState>,
}

impl<'a> HistoryRecorder<'a> {
    /// Creates a recorder for the given run version.
    #[must_use]
    pub fn new(store: &'a dyn HistoryStore, version: ModuleVersion, policy: HistoryPolicy) -> Self {
        Self {
            store,
            version,
            policy,
            states: BTreeMap::new(),
        }
    }

    /// Returns true when this run refreshes snapshots.
    #[must_use]
    pub fn is_latest(&self) -> bool {
        self.version == self.policy.latest_version
    }

    /// Returns the run version.
    #[must_use]
    pub const fn version(&self) -> ModuleVersion {
        self.version
    }

    /// Returns the protocol state of a module.
    #[must_use]
    pub fn state(&self, module: &str) -> ModuleHistoryState {
        self.states.get(module).cloned().unwrap_or(ModuleHistoryState::Unseen)
    }

    /// Persists a module summary and returns its history id.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] when any store call fails; no retry is made.
    pub fn record(&mut self, summary: &ModuleSummary) -> Result<HistoryId, HistoryError> {
        let module = summary.service.as_str();
        let counts = PropertyCounts::from_summary(summary);
        let maturity_rank = summary.stability.maturity_rank();
        let stability_rank = summary.stability.persisted_stability_rank();
        let latest = self.is_latest();

        let state = self.state(module);
        if latest && !matches!(state, ModuleHistoryState::SnapshotCurrent(_)) {
            self.store.save_snapshot(&ModuleSnapshot {
                module: module.to_string(),
                stability_rank,
                maturity_rank,
                category: self.policy.category,
                counts,
            })?;
            info!(module, "saved module snapshot");
        }

        let history_id = match state {
            ModuleHistoryState::HasHistoryId(id) | ModuleHistoryState::SnapshotCurrent(id) => id,
            ModuleHistoryState::Unseen => match self.store.find_history_id(module, &self.version)? {
                Some(id) => id,
                None => HistoryId::generate(),
            },
        };

        self.store.append_history(&ModuleHistoryRecord {
            history_id: history_id.clone(),
            module: module.to_string(),
            version: self.version,
            normalized_version: self.version.normalized(),
            maturity_rank,
            stability_rank,
            counts,
        })?;
        info!(module, version = %self.version, history_id = %history_id, "saved module history");

        let next = if latest {
            ModuleHistoryState::SnapshotCurrent(history_id.clone())
        } else {
            ModuleHistoryState::HasHistoryId(history_id.clone())
        };
        self.states.insert(module.to_string(), next);
        Ok(history_id)
    }
}
