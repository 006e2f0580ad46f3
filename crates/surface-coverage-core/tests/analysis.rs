// crates/surface-coverage-core/tests/analysis.rs
// ============================================================================
// Module: Surface Analysis Tests
// Description: Construct resolution, surface counting, and module rollups.
// Purpose: Validate analysis outputs against hand-built manifests.
// ============================================================================

//! ## Overview
//! End-to-end checks of the analysis pipeline:
//! - Construct resolution by exact name and by `resource` tag
//! - Surface counting for flat, nested, inherited, and cyclic props
//! - Module rollups, eligibility, and fatal contract violations

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use common::MemorySink;
use common::assembly;
use common::construct;
use common::interface;
use common::interface_extending;
use common::named;
use common::property;
use common::resource;
use common::resource_with_param;
use common::s3_assembly;
use common::scalar;
use common::type_system;
use surface_coverage_core::AnalysisError;
use surface_coverage_core::AnalyzerConfig;
use surface_coverage_core::RunError;
use surface_coverage_core::Stability;
use surface_coverage_core::SurfaceAnalyzer;
use surface_coverage_core::analysis::counter::count_resource_surface;
use surface_coverage_core::analysis::resolver::find_construct;
use surface_coverage_core::model::metadata::TypeDef;
use surface_coverage_core::run_report;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const ASM: &str = "@scope-aws-s3";

fn unprefixed() -> AnalyzerConfig {
    AnalyzerConfig {
        module_prefix: None,
        ..AnalyzerConfig::default()
    }
}

fn surface_of(types: &surface_coverage_core::TypeSystem, fqn: &str) -> u64 {
    let class = types.try_find_type(fqn).and_then(TypeDef::as_class).expect("resource class");
    count_resource_surface(types, class, "props").expect("count")
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

#[test]
fn resolver_prefers_exact_name() {
    let asm = assembly(
        ASM,
        vec![
            construct(ASM, "Bucket", Some("stable"), None),
            construct(ASM, "BucketV2", Some("deprecated"), Some("AWS::S3::Bucket")),
        ],
    );
    let found = find_construct(&asm, "Bucket").expect("construct");
    assert_eq!(found.name, "Bucket");
}

#[test]
fn resolver_falls_back_to_resource_tag_case_insensitively() {
    let asm = assembly(
        ASM,
        vec![
            construct(ASM, "Broken", None, Some("AWS::S3")),
            construct(ASM, "StoragePolicy", Some("stable"), Some("AWS::S3::BUCKETPOLICY")),
        ],
    );
    let found = find_construct(&asm, "BucketPolicy").expect("construct");
    assert_eq!(found.name, "StoragePolicy");
    assert!(find_construct(&asm, "AccessPoint").is_none());
}

#[test]
fn resolver_is_deterministic() {
    let asm = assembly(
        ASM,
        vec![
            construct(ASM, "Alpha", None, Some("AWS::S3::Bucket")),
            construct(ASM, "Beta", None, Some("AWS::S3::Bucket")),
        ],
    );
    for _ in 0 .. 3 {
        assert_eq!(find_construct(&asm, "Bucket").map(|class| class.name.as_str()), Some("Alpha"));
    }
}

// ============================================================================
// SECTION: Counter
// ============================================================================

#[test]
fn three_scalars_count_three() {
    let types = type_system(vec![assembly(
        ASM,
        vec![
            resource(ASM, "CfnThing", &format!("{ASM}.CfnThingProps")),
            interface(
                ASM,
                "CfnThingProps",
                vec![property("a", scalar()), property("b", scalar()), property("c", scalar())],
            ),
        ],
    )]);
    assert_eq!(surface_of(&types, &format!("{ASM}.CfnThing")), 3);
}

#[test]
fn nested_interface_adds_its_surface() {
    let types = type_system(vec![assembly(
        ASM,
        vec![
            resource(ASM, "CfnThing", &format!("{ASM}.CfnThingProps")),
            interface(
                ASM,
                "CfnThingProps",
                vec![property("a", scalar()), property("nested", named(&format!("{ASM}.Nested")))],
            ),
            interface(ASM, "Nested", vec![property("x", scalar()), property("y", scalar())]),
        ],
    )]);
    assert_eq!(surface_of(&types, &format!("{ASM}.CfnThing")), 4);
}

#[test]
fn missing_initializer_or_short_parameter_list_counts_zero() {
    let mut short = resource(ASM, "CfnShort", &format!("{ASM}.Props"));
    short["initializer"]["parameters"].as_array_mut().expect("parameters").truncate(2);
    let types = type_system(vec![assembly(
        ASM,
        vec![
            construct(ASM, "CfnBare", None, None),
            short,
            interface(ASM, "Props", vec![property("a", scalar())]),
        ],
    )]);
    assert_eq!(surface_of(&types, &format!("{ASM}.CfnBare")), 0);
    assert_eq!(surface_of(&types, &format!("{ASM}.CfnShort")), 0);
}

#[test]
fn unresolved_props_type_counts_zero() {
    let types = type_system(vec![assembly(ASM, vec![resource(ASM, "CfnThing", "other.Missing")])]);
    assert_eq!(surface_of(&types, &format!("{ASM}.CfnThing")), 0);
}

#[test]
fn misnamed_props_parameter_is_fatal() {
    let types = type_system(vec![assembly(
        ASM,
        vec![resource_with_param(ASM, "CfnThing", "options", &format!("{ASM}.Props"))],
    )]);
    let class = types.try_find_type(&format!("{ASM}.CfnThing")).and_then(TypeDef::as_class).unwrap();
    let err = count_resource_surface(&types, class, "props").unwrap_err();
    assert!(matches!(err, AnalysisError::PropsParameter { ref actual, .. } if actual == "options"));
}

#[test]
fn cyclic_props_terminate() {
    let types = type_system(vec![assembly(
        ASM,
        vec![
            resource(ASM, "CfnThing", &format!("{ASM}.A")),
            interface(ASM, "A", vec![property("b", named(&format!("{ASM}.B"))), property("x", scalar())]),
            interface(ASM, "B", vec![property("a", named(&format!("{ASM}.A")))]),
        ],
    )]);
    // A: b(1 + B) + x(1); B: a(1 + 0 on re-entry).
    assert_eq!(surface_of(&types, &format!("{ASM}.CfnThing")), 3);
}

#[test]
fn diamonds_count_every_path() {
    let types = type_system(vec![assembly(
        ASM,
        vec![
            resource(ASM, "CfnThing", &format!("{ASM}.Root")),
            interface(
                ASM,
                "Root",
                vec![
                    property("left", named(&format!("{ASM}.Leaf"))),
                    property("right", named(&format!("{ASM}.Leaf"))),
                ],
            ),
            interface(ASM, "Leaf", vec![property("x", scalar()), property("y", scalar())]),
        ],
    )]);
    assert_eq!(surface_of(&types, &format!("{ASM}.CfnThing")), 6);
}

#[test]
fn inherited_properties_count_and_own_shadow_base() {
    let types = type_system(vec![assembly(
        ASM,
        vec![
            resource(ASM, "CfnThing", &format!("{ASM}.Props")),
            interface_extending(
                ASM,
                "Props",
                &[&format!("{ASM}.Base")],
                vec![property("own", scalar()), property("shared", scalar())],
            ),
            interface(ASM, "Base", vec![property("shared", scalar()), property("inherited", scalar())]),
        ],
    )]);
    assert_eq!(surface_of(&types, &format!("{ASM}.CfnThing")), 3);
}

#[test]
fn props_resolve_across_assemblies() {
    let types = type_system(vec![
        assembly(ASM, vec![resource(ASM, "CfnThing", "@scope-shared.Props")]),
        assembly("@scope-shared", vec![interface("@scope-shared", "Props", vec![property("a", scalar())])]),
    ]);
    assert_eq!(surface_of(&types, &format!("{ASM}.CfnThing")), 1);
}

// ============================================================================
// SECTION: Aggregator
// ============================================================================

#[test]
fn bucket_module_end_to_end() {
    let types = type_system(vec![s3_assembly(ASM)]);
    let config = unprefixed();
    let analyzer = SurfaceAnalyzer::new(&types, &config);
    let mut sink = MemorySink::default();

    let outcome = run_report(&analyzer, &mut sink, None).expect("run");

    assert_eq!(outcome.modules, 1);
    assert_eq!(sink.finished, 1);
    assert_eq!(sink.resources.len(), 1);
    let record = &sink.resources[0];
    assert_eq!(
        (record.service.as_str(), record.resource.as_str(), record.surface, record.stability),
        ("s3", "Bucket", 2, Stability::Stable)
    );
    let summary = &sink.modules[0];
    assert_eq!(summary.stability, Stability::Stable);
    assert_eq!(summary.total_props, 2);
    assert_eq!(summary.stable_props, 2);
    assert_eq!(summary.experimental_props, 0);
    assert_eq!(summary.deprecated_props, 0);
    assert_eq!(summary.cfn_only_props, 0);
    assert_eq!(summary.coverage_percent, 100);
    assert_eq!(summary.total_su, 1);
    assert_eq!(summary.covered_su, 1.0);
}

#[test]
fn ineligible_assemblies_produce_no_rows() {
    let core = assembly("@scope-core", vec![resource("@scope-core", "CfnThing", "@scope-core.Props")]);
    let types = type_system(vec![core]);
    let config = unprefixed();
    let analyzer = SurfaceAnalyzer::new(&types, &config);
    let mut sink = MemorySink::default();

    let outcome = run_report(&analyzer, &mut sink, None).expect("run");

    assert_eq!(outcome.skipped_assemblies, 1);
    assert!(sink.resources.is_empty());
    assert!(sink.modules.is_empty());
}

#[test]
fn default_prefix_filters_scoped_names() {
    let types = type_system(vec![s3_assembly(ASM), s3_assembly("@aws-cdk/aws-s3")]);
    let config = AnalyzerConfig::default();
    let analyzer = SurfaceAnalyzer::new(&types, &config);
    let mut sink = MemorySink::default();

    run_report(&analyzer, &mut sink, None).expect("run");

    assert_eq!(sink.modules.len(), 1);
    assert_eq!(sink.modules[0].service, "s3");
}

#[test]
fn buckets_partition_module_totals() {
    let types = type_system(vec![assembly(
        ASM,
        vec![
            resource(ASM, "CfnAlpha", &format!("{ASM}.One")),
            resource(ASM, "CfnBeta", &format!("{ASM}.Two")),
            resource(ASM, "CfnGamma", &format!("{ASM}.Three")),
            resource(ASM, "CfnDelta", &format!("{ASM}.One")),
            construct(ASM, "Alpha", Some("deprecated"), None),
            construct(ASM, "Beta", None, None),
            construct(ASM, "DeltaWrapper", Some("stable"), Some("AWS::S3::Delta")),
            interface(ASM, "One", vec![property("a", scalar())]),
            interface(ASM, "Two", vec![property("a", scalar()), property("b", scalar())]),
            interface(
                ASM,
                "Three",
                vec![property("a", scalar()), property("b", scalar()), property("c", scalar())],
            ),
        ],
    )]);
    let config = unprefixed();
    let analyzer = SurfaceAnalyzer::new(&types, &config);
    let mut sink = MemorySink::default();

    run_report(&analyzer, &mut sink, None).expect("run");

    let stabilities: Vec<(&str, Stability)> =
        sink.resources.iter().map(|record| (record.resource.as_str(), record.stability)).collect();
    assert_eq!(
        stabilities,
        vec![
            ("Alpha", Stability::Deprecated),
            ("Beta", Stability::Experimental),
            ("Delta", Stability::Stable),
            ("Gamma", Stability::CfnOnly),
        ]
    );
    let summary = &sink.modules[0];
    assert_eq!(
        summary.total_props,
        summary.cfn_only_props + summary.stable_props + summary.experimental_props + summary.deprecated_props
    );
    assert_eq!(summary.total_props, 7);
    assert_eq!(summary.coverage_percent, 43);
    // Last construct-backed resource in FQN order is Delta.
    assert_eq!(summary.stability, Stability::Stable);
}

#[test]
fn module_without_resources_reports_zero_coverage() {
    let types = type_system(vec![assembly(ASM, vec![construct(ASM, "Bucket", Some("stable"), None)])]);
    let config = unprefixed();
    let analyzer = SurfaceAnalyzer::new(&types, &config);
    let mut sink = MemorySink::default();

    run_report(&analyzer, &mut sink, None).expect("run");

    let summary = &sink.modules[0];
    assert_eq!(summary.stability, Stability::CfnOnly);
    assert_eq!(summary.total_props, 0);
    assert_eq!(summary.coverage_percent, 0);
    assert_eq!(summary.total_su, 0);
}

#[test]
fn unknown_stability_aborts_and_finishes_sink() {
    let types = type_system(vec![assembly(
        ASM,
        vec![
            resource(ASM, "CfnBucket", &format!("{ASM}.Props")),
            construct(ASM, "Bucket", Some("external"), None),
            interface(ASM, "Props", vec![property("a", scalar())]),
        ],
    )]);
    let config = unprefixed();
    let analyzer = SurfaceAnalyzer::new(&types, &config);
    let mut sink = MemorySink::default();

    let err = run_report(&analyzer, &mut sink, None).unwrap_err();

    assert!(matches!(
        err,
        RunError::Analysis(AnalysisError::UnknownStability { ref tag, .. }) if tag == "external"
    ));
    assert_eq!(sink.finished, 1);
    assert!(sink.modules.is_empty());
}
