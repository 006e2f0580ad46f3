// crates/surface-coverage-core/src/analysis/resolver.rs
// ============================================================================
// Module: Construct Resolver
// Description: Pairs generated resource classes with hand-authored constructs.
// Purpose: Decide which construct, if any, wraps a resource.
// Dependencies: crate::model::metadata
// ============================================================================

//! ## Overview
//! Resolution is a pure function of the assembly contents. The first rule to
//! match wins:
//! 1. a class named exactly after the resource base name, in the same
//!    assembly;
//! 2. the first class (FQN order) whose `resource` documentation tag,
//!    `Provider::Service::Type`, names the base name case-insensitively.
//!
//! No match means the resource is unwrapped; that is not an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::model::metadata::Assembly;
use crate::model::metadata::ClassType;
use crate::model::metadata::TypeDef;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Custom documentation tag naming the raw resource type a construct wraps.
pub const RESOURCE_TAG: &str = "resource";

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Returns the resource base name (marker stripped), or `None` when the class
/// is not a generated resource.
#[must_use]
pub fn resource_base_name<'a>(class: &'a ClassType, marker: &str) -> Option<&'a str> {
    class.name.strip_prefix(marker)
}

/// Extracts the resource type name from a `Provider::Service::Type` tag.
///
/// Returns `None` unless the tag has exactly three segments.
#[must_use]
pub fn resource_type_name(tag: &str) -> Option<&str> {
    let mut segments = tag.split("::");
    match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(_), Some(type_name), None) => Some(type_name),
        _ => None,
    }
}

/// Finds the construct wrapping the resource with the given base name.
#[must_use]
pub fn find_construct<'a>(assembly: &'a Assembly, base_name: &str) -> Option<&'a ClassType> {
    let expected_fqn = format!("{}.{base_name}", assembly.name());
    if let Some(class) = assembly.try_find_type(&expected_fqn).and_then(TypeDef::as_class) {
        return Some(class);
    }

    let expected = base_name.to_lowercase();
    assembly.classes().find(|class| {
        class
            .docs
            .custom_tag(RESOURCE_TAG)
            .and_then(resource_type_name)
            .is_some_and(|type_name| type_name.to_lowercase() == expected)
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
