// crates/surface-coverage-core/tests/manifest_loading.rs
// ============================================================================
// Module: Manifest Loading Tests
// Description: Directory loading, dependency normalization, and failures.
// Purpose: Validate the manifest loader against on-disk fixtures.
// ============================================================================

//! ## Overview
//! Loads manifests from temporary directories:
//! - Only `.jsii` and `.json` files are read
//! - Object-form dependency versions are flattened
//! - Duplicate assemblies and malformed files fail the load

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;
use std::path::Path;

use serde_json::json;
use surface_coverage_core::ManifestError;
use surface_coverage_core::load_manifest_dir;
use surface_coverage_core::model::manifest::decode_manifest_value;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn write_manifest(dir: &Path, file: &str, name: &str) {
    let manifest = json!({
        "name": name,
        "version": "1.60.0",
        "dependencies": {
            "@aws-cdk/core": { "version": "1.60.0" },
            "constructs": "3.0.4"
        },
        "types": {
            format!("{name}.CfnBucket"): {
                "kind": "class",
                "fqn": format!("{name}.CfnBucket"),
                "name": "CfnBucket"
            }
        }
    });
    fs::write(dir.join(file), manifest.to_string()).expect("write manifest");
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn loads_every_manifest_in_directory() {
    let dir = TempDir::new().expect("tempdir");
    write_manifest(dir.path(), "s3.jsii", "@aws-cdk/aws-s3");
    write_manifest(dir.path(), "sqs.json", "@aws-cdk/aws-sqs");
    fs::write(dir.path().join("notes.txt"), "not a manifest").expect("write notes");

    let types = load_manifest_dir(dir.path()).expect("load");

    assert_eq!(types.len(), 2);
    let names: Vec<&str> = types.assemblies().map(|assembly| assembly.name()).collect();
    assert_eq!(names, vec!["@aws-cdk/aws-s3", "@aws-cdk/aws-sqs"]);
}

#[test]
fn decoding_flattens_object_dependency_versions_in_place() {
    let mut manifest = json!({
        "name": "@aws-cdk/aws-s3",
        "dependencies": {
            "@aws-cdk/core": { "version": "1.60.0" },
            "constructs": "3.0.4"
        }
    });

    let assembly = decode_manifest_value(&mut manifest, "s3.jsii").expect("decode");

    assert_eq!(assembly.name(), "@aws-cdk/aws-s3");
    assert_eq!(manifest["dependencies"]["@aws-cdk/core"], json!("1.60.0"));
    assert_eq!(manifest["dependencies"]["constructs"], json!("3.0.4"));
}

#[test]
fn duplicate_assemblies_fail() {
    let dir = TempDir::new().expect("tempdir");
    write_manifest(dir.path(), "a.jsii", "@aws-cdk/aws-s3");
    write_manifest(dir.path(), "b.jsii", "@aws-cdk/aws-s3");

    let err = load_manifest_dir(dir.path()).unwrap_err();

    assert!(matches!(err, ManifestError::Metadata { .. }), "unexpected error: {err}");
}

#[test]
fn malformed_manifest_names_its_file() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("broken.jsii"), "{").expect("write");

    let err = load_manifest_dir(dir.path()).unwrap_err();

    assert!(matches!(err, ManifestError::Parse { .. }));
    assert!(err.to_string().contains("broken.jsii"));
}

#[test]
fn missing_directory_is_io_error() {
    let dir = TempDir::new().expect("tempdir");
    let err = load_manifest_dir(&dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, ManifestError::Io { .. }));
}
