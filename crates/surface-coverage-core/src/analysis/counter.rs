// crates/surface-coverage-core/src/analysis/counter.rs
// ============================================================================
// Module: Surface Counter
// Description: Recursive configuration-surface counting for resources.
// Purpose: Count the properties reachable from a resource's props type.
// Dependencies: crate::analysis, crate::model::metadata
// ============================================================================

//! ## Overview
//! A resource's surface is the number of properties reachable from the third
//! initializer parameter, the props type. Every property counts once, and a
//! property whose type is itself a structured interface adds that
//! interface's surface on top.
//!
//! Security posture: manifests are untrusted input. A props graph with a
//! cycle is cut at the re-entry point instead of recursing without bound.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::analysis::AnalysisError;
use crate::model::metadata::ClassType;
use crate::model::metadata::InterfaceType;
use crate::model::metadata::TypeSystem;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Zero-based position of the props parameter in a resource initializer.
pub const PROPS_PARAMETER_INDEX: usize = 2;

// ============================================================================
// SECTION: Props Resolution
// ============================================================================

/// Returns the props interface of a resource class.
///
/// Initializers with fewer than three parameters, and props parameters whose
/// type is not a known interface, yield `Ok(None)`.
///
/// # Errors
///
/// Returns [`AnalysisError::PropsParameter`] when the third parameter is not
/// named `props_parameter`.
pub fn props_type<'a>(
    types: &'a TypeSystem,
    resource: &ClassType,
    props_parameter: &str,
) -> Result<Option<&'a InterfaceType>, AnalysisError> {
    let Some(parameter) = resource.parameters().get(PROPS_PARAMETER_INDEX) else {
        return Ok(None);
    };
    if parameter.name != props_parameter {
        return Err(AnalysisError::PropsParameter {
            class: resource.fqn.clone(),
            expected: props_parameter.to_string(),
            actual: parameter.name.clone(),
        });
    }
    Ok(parameter.type_ref.fqn().and_then(|fqn| types.find_interface(fqn)))
}

/// Counts the configuration surface of a resource class.
///
/// # Errors
///
/// Returns [`AnalysisError::PropsParameter`] when the props parameter is
/// misnamed.
pub fn count_resource_surface(
    types: &TypeSystem,
    resource: &ClassType,
    props_parameter: &str,
) -> Result<u64, AnalysisError> {
    Ok(props_type(types, resource, props_parameter)?
        .map_or(0, |props| SurfaceCounter::new(types).count(props)))
}

// ============================================================================
// SECTION: Counter
// ============================================================================

/// Recursive property counter with a per-path re-entry guard.
///
/// # Invariants
/// - `in_progress` holds exactly the interfaces on the current expansion path.
/// - An interface reachable along several acyclic paths is counted on each.
pub struct SurfaceCounter<'a> {
    /// Type system used to resolve nested property types.
    types: &'a TypeSystem,
    /// Interfaces currently being expanded.
    in_progress: BTreeSet<&'a str>,
}

impl<'a> SurfaceCounter<'a> {
    /// Creates a counter over the given type system.
    #[must_use]
    pub const fn new(types: &'a TypeSystem) -> Self {
        Self {
            types,
            in_progress: BTreeSet::new(),
        }
    }

    /// Counts the surface of an interface, own and inherited properties
    /// included.
    pub fn count(&mut self, interface: &'a InterfaceType) -> u64 {
        if !self.in_progress.insert(interface.fqn.as_str()) {
            return 0;
        }
        let types = self.types;
        let mut total = 0_u64;
        for property in interface.all_properties(types) {
            let nested = property
                .type_ref
                .fqn()
                .and_then(|fqn| types.find_interface(fqn))
                .map_or(0, |nested| self.count(nested));
            total = total.saturating_add(1).saturating_add(nested);
        }
        self.in_progress.remove(interface.fqn.as_str());
        total
    }
}
