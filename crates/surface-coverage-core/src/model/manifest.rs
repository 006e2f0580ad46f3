// crates/surface-coverage-core/src/model/manifest.rs
// ============================================================================
// Module: Surface Coverage Manifest Loader
// Description: Decoding of assembly manifests into the metadata model.
// Purpose: Load a manifest directory into a read-only type system.
// Dependencies: crate::model::metadata, serde, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! Manifests are JSON documents describing one assembly each (`name`,
//! `version`, `dependencies`, and a `types` map keyed by FQN). Before
//! decoding, dependency versions declared in object form
//! (`{ "version": "1.2.3" }`) are flattened to the bare version string.
//! Loading is all-or-nothing: the first unreadable or invalid manifest aborts
//! the load.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use tracing::info;

use crate::model::metadata::Assembly;
use crate::model::metadata::MetadataError;
use crate::model::metadata::TypeDef;
use crate::model::metadata::TypeSystem;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum manifest size accepted by the loader.
pub const MAX_MANIFEST_BYTES: u64 = 128 * 1024 * 1024;
/// File extensions recognized as manifests.
pub const MANIFEST_EXTENSIONS: [&str; 2] = ["jsii", "json"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Manifest loading errors.
///
/// # Invariants
/// - Every variant names the offending manifest path.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Manifest could not be read.
    #[error("manifest io error: {path}: {message}")]
    Io {
        /// Manifest path.
        path: String,
        /// I/O failure description.
        message: String,
    },
    /// Manifest exceeds [`MAX_MANIFEST_BYTES`].
    #[error("manifest too large: {path} ({actual_bytes} > {max_bytes})")]
    TooLarge {
        /// Manifest path.
        path: String,
        /// Maximum allowed bytes.
        max_bytes: u64,
        /// Actual manifest size.
        actual_bytes: u64,
    },
    /// Manifest is not valid JSON or does not match the expected shape.
    #[error("manifest parse error: {path}: {message}")]
    Parse {
        /// Manifest path.
        path: String,
        /// Decoder message.
        message: String,
    },
    /// Manifest decoded but violated a metadata invariant.
    #[error("invalid manifest: {path}: {source}")]
    Metadata {
        /// Manifest path.
        path: String,
        /// Underlying metadata error.
        #[source]
        source: MetadataError,
    },
}

// ============================================================================
// SECTION: Wire Shape
// ============================================================================

/// Manifest document after dependency normalization.
#[derive(Debug, Deserialize)]
struct ManifestDocument {
    /// Assembly name.
    name: String,
    /// Type definitions keyed by FQN.
    #[serde(default)]
    types: BTreeMap<String, TypeDef>,
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Flattens object-form dependency versions to plain version strings.
///
/// `{ "dep": { "version": "1.0.0" } }` becomes `{ "dep": "1.0.0" }`. Object
/// entries without a string `version` are removed. Returns whether the
/// document changed.
pub fn normalize_dependencies(manifest: &mut Value) -> bool {
    let Some(Value::Object(dependencies)) = manifest.get_mut("dependencies") else {
        return false;
    };
    let mut changed = false;
    let keys: Vec<String> = dependencies.keys().cloned().collect();
    for key in keys {
        let flattened = match dependencies.get(&key) {
            Some(Value::Object(detail)) => {
                Some(detail.get("version").and_then(Value::as_str).map(str::to_string))
            }
            _ => None,
        };
        match flattened {
            Some(Some(version)) => {
                dependencies.insert(key, Value::String(version));
                changed = true;
            }
            Some(None) => {
                dependencies.remove(&key);
                changed = true;
            }
            None => {}
        }
    }
    changed
}

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Decodes a manifest already held in memory.
///
/// `origin` labels the manifest in error messages.
///
/// # Errors
///
/// Returns [`ManifestError`] when the bytes are not a valid manifest.
pub fn parse_manifest(bytes: &[u8], origin: &str) -> Result<Assembly, ManifestError> {
    let mut value: Value = serde_json::from_slice(bytes).map_err(|err| ManifestError::Parse {
        path: origin.to_string(),
        message: err.to_string(),
    })?;
    decode_manifest_value(&mut value, origin)
}

/// Decodes a manifest from a JSON value, normalizing dependencies in place.
///
/// # Errors
///
/// Returns [`ManifestError`] when the value is not a valid manifest.
pub fn decode_manifest_value(value: &mut Value, origin: &str) -> Result<Assembly, ManifestError> {
    if normalize_dependencies(value) {
        debug!(manifest = origin, "normalized object-form dependency versions");
    }
    let document: ManifestDocument =
        serde_json::from_value(value.clone()).map_err(|err| ManifestError::Parse {
            path: origin.to_string(),
            message: err.to_string(),
        })?;
    Assembly::new(document.name, document.types).map_err(
        |source| ManifestError::Metadata {
            path: origin.to_string(),
            source,
        },
    )
}

/// Reads and decodes a single manifest file.
///
/// # Errors
///
/// Returns [`ManifestError`] when the file cannot be read or decoded.
pub fn load_manifest_file(path: &Path) -> Result<Assembly, ManifestError> {
    let origin = path.display().to_string();
    let metadata = fs::metadata(path).map_err(|err| ManifestError::Io {
        path: origin.clone(),
        message: err.to_string(),
    })?;
    if metadata.len() > MAX_MANIFEST_BYTES {
        return Err(ManifestError::TooLarge {
            path: origin,
            max_bytes: MAX_MANIFEST_BYTES,
            actual_bytes: metadata.len(),
        });
    }
    let bytes = fs::read(path).map_err(|err| ManifestError::Io {
        path: origin.clone(),
        message: err.to_string(),
    })?;
    parse_manifest(&bytes, &origin)
}

/// Loads every manifest in a directory into a new type system.
///
/// Files are visited in path order; files without a recognized extension and
/// subdirectories are ignored.
///
/// # Errors
///
/// Returns [`ManifestError`] when the directory cannot be listed or any
/// manifest fails to load.
pub fn load_manifest_dir(dir: &Path) -> Result<TypeSystem, ManifestError> {
    let origin = dir.display().to_string();
    let entries = fs::read_dir(dir).map_err(|err| ManifestError::Io {
        path: origin.clone(),
        message: err.to_string(),
    })?;
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| ManifestError::Io {
            path: origin.clone(),
            message: err.to_string(),
        })?;
        let path = entry.path();
        if path.is_file() && has_manifest_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut types = TypeSystem::new();
    for path in &paths {
        let assembly = load_manifest_file(path)?;
        debug!(manifest = %path.display(), assembly = assembly.name(), "loaded manifest");
        types.add_assembly(assembly).map_err(|source| ManifestError::Metadata {
            path: path.display().to_string(),
            source,
        })?;
    }
    info!(dir = %origin, assemblies = types.len(), "loaded type system");
    Ok(types)
}

/// Returns true when the path carries a manifest extension.
fn has_manifest_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| MANIFEST_EXTENSIONS.contains(&extension))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
