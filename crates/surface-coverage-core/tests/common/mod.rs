// crates/surface-coverage-core/tests/common/mod.rs
// ============================================================================
// Module: Surface Coverage Test Fixtures
// Description: Manifest builders, in-memory sinks, and in-memory stores.
// Purpose: Share fixtures across core integration tests.
// ============================================================================

//! ## Overview
//! Fixtures build manifests as JSON and decode them through the real
//! manifest loader, so every test exercises the same validation path as
//! production input.

#![allow(
    dead_code,
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Shared test helpers; not every test binary uses every helper."
)]

use std::sync::Mutex;

use serde_json::Value;
use serde_json::json;
use surface_coverage_core::Assembly;
use surface_coverage_core::HistoryError;
use surface_coverage_core::HistoryId;
use surface_coverage_core::HistoryStore;
use surface_coverage_core::ModuleHistoryRecord;
use surface_coverage_core::ModuleSnapshot;
use surface_coverage_core::ModuleSummary;
use surface_coverage_core::ModuleVersion;
use surface_coverage_core::ReportError;
use surface_coverage_core::ReportSink;
use surface_coverage_core::ResourceSurfaceRecord;
use surface_coverage_core::TypeSystem;
use surface_coverage_core::model::manifest::parse_manifest;

// ============================================================================
// SECTION: Manifest Builders
// ============================================================================

/// Scalar type reference.
pub fn scalar() -> Value {
    json!({ "primitive": "string" })
}

/// Named type reference.
pub fn named(fqn: &str) -> Value {
    json!({ "fqn": fqn })
}

/// Property record.
pub fn property(name: &str, type_ref: Value) -> Value {
    json!({ "name": name, "type": type_ref })
}

/// Interface record with the given properties.
pub fn interface(assembly: &str, name: &str, properties: Vec<Value>) -> Value {
    json!({
        "kind": "interface",
        "fqn": format!("{assembly}.{name}"),
        "name": name,
        "properties": properties,
    })
}

/// Interface record extending base interfaces.
pub fn interface_extending(assembly: &str, name: &str, bases: &[&str], properties: Vec<Value>) -> Value {
    let mut value = interface(assembly, name, properties);
    value["interfaces"] = json!(bases);
    value
}

/// Resource class whose third initializer parameter is named `props_name`.
pub fn resource_with_param(assembly: &str, name: &str, props_name: &str, props_fqn: &str) -> Value {
    json!({
        "kind": "class",
        "fqn": format!("{assembly}.{name}"),
        "name": name,
        "initializer": {
            "parameters": [
                { "name": "scope", "type": named("constructs.Construct") },
                { "name": "id", "type": scalar() },
                { "name": props_name, "type": named(props_fqn) },
            ]
        }
    })
}

/// Resource class with a conventional props parameter.
pub fn resource(assembly: &str, name: &str, props_fqn: &str) -> Value {
    resource_with_param(assembly, name, "props", props_fqn)
}

/// Construct class with optional stability and `resource` tags.
pub fn construct(assembly: &str, name: &str, stability: Option<&str>, resource_tag: Option<&str>) -> Value {
    let mut docs = json!({});
    if let Some(stability) = stability {
        docs["stability"] = json!(stability);
    }
    if let Some(tag) = resource_tag {
        docs["custom"] = json!({ "resource": tag });
    }
    json!({
        "kind": "class",
        "fqn": format!("{assembly}.{name}"),
        "name": name,
        "docs": docs,
    })
}

/// Decodes an assembly from type records.
pub fn assembly(name: &str, types: Vec<Value>) -> Assembly {
    let mut map = serde_json::Map::new();
    for def in types {
        let fqn = def["fqn"].as_str().expect("fixture fqn").to_string();
        map.insert(fqn, def);
    }
    let manifest = json!({ "name": name, "version": "1.60.0", "types": map });
    parse_manifest(manifest.to_string().as_bytes(), name).expect("fixture manifest")
}

/// Builds a type system from assemblies.
pub fn type_system(assemblies: Vec<Assembly>) -> TypeSystem {
    let mut types = TypeSystem::new();
    for assembly in assemblies {
        types.add_assembly(assembly).expect("unique fixture assembly");
    }
    types
}

/// Bucket resource with a two-property config wrapped by a stable construct.
pub fn s3_assembly(name: &str) -> Assembly {
    assembly(
        name,
        vec![
            resource(name, "CfnBucket", &format!("{name}.CfnBucketProps")),
            interface(
                name,
                "CfnBucketProps",
                vec![property("bucketName", scalar()), property("versioned", scalar())],
            ),
            construct(name, "Bucket", Some("stable"), None),
        ],
    )
}

// ============================================================================
// SECTION: Memory Sink
// ============================================================================

/// Report sink collecting rows in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Resource rows in write order.
    pub resources: Vec<ResourceSurfaceRecord>,
    /// Module rows in write order.
    pub modules: Vec<ModuleSummary>,
    /// Number of finish calls.
    pub finished: usize,
}

impl ReportSink for MemorySink {
    fn write_resource(&mut self, record: &ResourceSurfaceRecord) -> Result<(), ReportError> {
        self.resources.push(record.clone());
        Ok(())
    }

    fn write_module(&mut self, summary: &ModuleSummary) -> Result<(), ReportError> {
        self.modules.push(summary.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        self.finished += 1;
        Ok(())
    }
}

// ============================================================================
// SECTION: Memory Store
// ============================================================================

/// Call recorded by [`MemoryHistoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// History id lookup.
    Find(String),
    /// History append.
    Append(String),
    /// Snapshot upsert.
    Snapshot(String),
}

/// Mutable state of [`MemoryHistoryStore`].
#[derive(Debug, Default)]
pub struct MemoryState {
    /// Deduplicated history rows.
    pub history: Vec<ModuleHistoryRecord>,
    /// Snapshot rows, one per module.
    pub snapshots: Vec<ModuleSnapshot>,
    /// Every call in order.
    pub calls: Vec<StoreCall>,
}

/// History store keeping rows in memory with natural-key deduplication.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    /// Guarded state.
    pub state: Mutex<MemoryState>,
    /// When set, every call fails with this message.
    pub fail_with: Option<String>,
}

impl MemoryHistoryStore {
    /// Store that rejects every call.
    pub fn failing(message: &str) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            fail_with: Some(message.to_string()),
        }
    }

    /// Returns the configured failure, if any.
    fn check(&self) -> Result<(), HistoryError> {
        match &self.fail_with {
            Some(message) => Err(HistoryError::Io(message.clone())),
            None => Ok(()),
        }
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn find_history_id(&self, module: &str, version: &ModuleVersion) -> Result<Option<HistoryId>, HistoryError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Find(module.to_string()));
        Ok(state
            .history
            .iter()
            .find(|row| row.module == module && row.version == *version)
            .map(|row| row.history_id.clone()))
    }

    fn append_history(&self, record: &ModuleHistoryRecord) -> Result<(), HistoryError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Append(record.module.clone()));
        let exists = state.history.iter().any(|row| row.module == record.module && row.version == record.version);
        if !exists {
            state.history.push(record.clone());
        }
        Ok(())
    }

    fn save_snapshot(&self, snapshot: &ModuleSnapshot) -> Result<(), HistoryError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Snapshot(snapshot.module.clone()));
        state.snapshots.retain(|row| row.module != snapshot.module);
        state.snapshots.push(snapshot.clone());
        Ok(())
    }
}
