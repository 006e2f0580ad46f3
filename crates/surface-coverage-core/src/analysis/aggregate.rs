// crates/surface-coverage-core/src/analysis/aggregate.rs
// ============================================================================
// Module: Module Aggregator
// Description: Per-resource classification and per-module rollups.
// Purpose: Turn an assembly into resource records and one module summary.
// Dependencies: crate::analysis, crate::model, serde, tracing
// ============================================================================

//! ## Overview
//! [`SurfaceAnalyzer`] walks an eligible assembly's resource classes in FQN
//! order. Each resource is resolved to its construct, classified into a
//! stability bucket, and counted. The bucket totals then finalize into a
//! [`ModuleSummary`].
//!
//! Invariants:
//! - `total = cfn_only + stable + experimental + deprecated` for every summary.
//! - The module stability is the stability of the last construct-backed
//!   resource, or `cfn-only` when there is none.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::analysis::AnalysisError;
use crate::analysis::counter::count_resource_surface;
use crate::analysis::metrics::coverage_percent;
use crate::analysis::metrics::covered_surface_units;
use crate::analysis::metrics::total_surface_units;
use crate::analysis::resolver::find_construct;
use crate::analysis::resolver::resource_base_name;
use crate::model::metadata::Assembly;
use crate::model::metadata::ClassType;
use crate::model::metadata::TypeSystem;
use crate::model::stability::Stability;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default assembly name prefix for eligible modules.
pub const DEFAULT_MODULE_PREFIX: &str = "@aws-cdk/aws-";

/// Default name prefix of generated resource classes.
pub const DEFAULT_RESOURCE_MARKER: &str = "Cfn";

/// Default name of the props initializer parameter.
pub const DEFAULT_PROPS_PARAMETER: &str = "props";

/// Number of `-`-delimited components in an eligible assembly name.
const ASSEMBLY_NAME_COMPONENTS: usize = 3;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Analyzer tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Required assembly name prefix; `None` accepts any name.
    pub module_prefix: Option<String>,
    /// Name prefix identifying generated resource classes.
    pub resource_marker: String,
    /// Expected name of the third initializer parameter.
    pub props_parameter: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            module_prefix: Some(DEFAULT_MODULE_PREFIX.to_string()),
            resource_marker: DEFAULT_RESOURCE_MARKER.to_string(),
            props_parameter: DEFAULT_PROPS_PARAMETER.to_string(),
        }
    }
}

/// Returns the short service identifier of an eligible assembly name.
///
/// The name must carry `prefix` (when given) and split on `-` into exactly
/// three components; the third is the service.
#[must_use]
pub fn service_name<'a>(assembly_name: &'a str, prefix: Option<&str>) -> Option<&'a str> {
    if prefix.is_some_and(|prefix| !assembly_name.starts_with(prefix)) {
        return None;
    }
    let components: Vec<&str> = assembly_name.split('-').collect();
    if components.len() != ASSEMBLY_NAME_COMPONENTS {
        return None;
    }
    components.last().copied().filter(|service| !service.is_empty())
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Surface record of a single resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSurfaceRecord {
    /// Service identifier of the owning module.
    pub service: String,
    /// Resource base name (marker stripped).
    pub resource: String,
    /// Number of reachable configuration properties.
    pub surface: u64,
    /// Stability bucket.
    pub stability: Stability,
}

/// Per-bucket property totals of a module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketTotals {
    /// Properties of unwrapped resources.
    pub cfn_only: u64,
    /// Properties wrapped by stable constructs.
    pub stable: u64,
    /// Properties wrapped by experimental constructs.
    pub experimental: u64,
    /// Properties wrapped by deprecated constructs.
    pub deprecated: u64,
}

impl BucketTotals {
    /// Adds a resource surface to its bucket.
    pub const fn add(&mut self, stability: Stability, surface: u64) {
        let bucket = match stability {
            Stability::CfnOnly => &mut self.cfn_only,
            Stability::Stable => &mut self.stable,
            Stability::Experimental => &mut self.experimental,
            Stability::Deprecated => &mut self.deprecated,
        };
        *bucket = bucket.saturating_add(surface);
    }

    /// Returns the total across every bucket.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.cfn_only
            .saturating_add(self.stable)
            .saturating_add(self.experimental)
            .saturating_add(self.deprecated)
    }

    /// Returns the properties counting toward coverage.
    #[must_use]
    pub const fn covered(&self) -> u64 {
        self.stable.saturating_add(self.experimental)
    }
}

/// Rolled-up coverage statistics of one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSummary {
    /// Service identifier.
    pub service: String,
    /// Module stability (last construct-backed resource wins).
    pub stability: Stability,
    /// Total properties across all buckets.
    pub total_props: u64,
    /// Properties of unwrapped resources.
    pub cfn_only_props: u64,
    /// Properties wrapped by stable constructs.
    pub stable_props: u64,
    /// Properties wrapped by experimental constructs.
    pub experimental_props: u64,
    /// Properties wrapped by deprecated constructs.
    pub deprecated_props: u64,
    /// Integer coverage percentage.
    pub coverage_percent: u64,
    /// Total surface units.
    pub total_su: u64,
    /// Covered surface units.
    pub covered_su: f64,
}

impl ModuleSummary {
    /// Finalizes bucket totals into a summary.
    #[must_use]
    pub fn from_totals(service: impl Into<String>, stability: Stability, totals: BucketTotals) -> Self {
        let total_props = totals.total();
        let coverage = coverage_percent(totals.covered(), total_props);
        let total_su = total_surface_units(total_props);
        Self {
            service: service.into(),
            stability,
            total_props,
            cfn_only_props: totals.cfn_only,
            stable_props: totals.stable,
            experimental_props: totals.experimental,
            deprecated_props: totals.deprecated,
            coverage_percent: coverage,
            total_su,
            covered_su: covered_surface_units(total_su, coverage),
        }
    }
}

/// Resource records and summary for one module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleReport {
    /// Resource records in FQN order.
    pub resources: Vec<ResourceSurfaceRecord>,
    /// Module summary.
    pub summary: ModuleSummary,
}

// ============================================================================
// SECTION: Accumulator
// ============================================================================

/// Running bucket state for the module being analysed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleAccumulator {
    /// Service identifier.
    service: String,
    /// Stability of the last construct-backed resource seen.
    stability: Stability,
    /// Bucket totals so far.
    totals: BucketTotals,
}

impl ModuleAccumulator {
    /// Starts an empty accumulator for a service.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            stability: Stability::CfnOnly,
            totals: BucketTotals::default(),
        }
    }

    /// Adds one resource record.
    pub const fn record(&mut self, stability: Stability, surface: u64) {
        self.totals.add(stability, surface);
        if stability.is_construct_backed() {
            self.stability = stability;
        }
    }

    /// Finalizes the module summary.
    #[must_use]
    pub fn finish(self) -> ModuleSummary {
        ModuleSummary::from_totals(self.service, self.stability, self.totals)
    }
}

// ============================================================================
// SECTION: Analyzer
// ============================================================================

/// Read-only analyzer over a loaded type system.
pub struct SurfaceAnalyzer<'a> {
    /// Loaded type system.
    types: &'a TypeSystem,
    /// Analyzer tunables.
    config: &'a AnalyzerConfig,
}

impl<'a> SurfaceAnalyzer<'a> {
    /// Creates an analyzer.
    #[must_use]
    pub const fn new(types: &'a TypeSystem, config: &'a AnalyzerConfig) -> Self {
        Self {
            types,
            config,
        }
    }

    /// Returns the analysed type system.
    #[must_use]
    pub const fn types(&self) -> &'a TypeSystem {
        self.types
    }

    /// Returns the analyzer configuration.
    #[must_use]
    pub const fn config(&self) -> &'a AnalyzerConfig {
        self.config
    }

    /// Returns the service identifier when the assembly is eligible.
    #[must_use]
    pub fn service_of<'b>(&self, assembly: &'b Assembly) -> Option<&'b str> {
        service_name(assembly.name(), self.config.module_prefix.as_deref())
    }

    /// Iterates the resource classes of an assembly in FQN order.
    pub fn resources<'b>(&self, assembly: &'b Assembly) -> impl Iterator<Item = &'b ClassType> {
        let marker = self.config.resource_marker.clone();
        assembly.classes().filter(move |class| class.name.starts_with(&marker))
    }

    /// Classifies a resource by the construct that wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::UnknownStability`] when the construct's
    /// stability tag is not recognized.
    pub fn classify(&self, assembly: &Assembly, resource: &ClassType) -> Result<Stability, AnalysisError> {
        let Some(base_name) = resource_base_name(resource, &self.config.resource_marker) else {
            return Ok(Stability::CfnOnly);
        };
        let Some(construct) = find_construct(assembly, base_name) else {
            return Ok(Stability::CfnOnly);
        };
        Stability::from_doc_tag(construct.docs.stability.as_deref()).map_err(|err| {
            AnalysisError::UnknownStability {
                construct: construct.fqn.clone(),
                resource: resource.fqn.clone(),
                tag: err.tag,
            }
        })
    }

    /// Builds the surface record of one resource.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] on classification or props contract failures.
    pub fn analyze_resource(
        &self,
        service: &str,
        assembly: &Assembly,
        resource: &ClassType,
    ) -> Result<ResourceSurfaceRecord, AnalysisError> {
        let stability = self.classify(assembly, resource)?;
        let surface = count_resource_surface(self.types, resource, &self.config.props_parameter)?;
        let base_name = resource_base_name(resource, &self.config.resource_marker).unwrap_or(&resource.name);
        Ok(ResourceSurfaceRecord {
            service: service.to_string(),
            resource: base_name.to_string(),
            surface,
            stability,
        })
    }

    /// Analyses one assembly. Ineligible assemblies yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns the first [`AnalysisError`] raised by any resource.
    pub fn analyze_assembly(&self, assembly: &Assembly) -> Result<Option<ModuleReport>, AnalysisError> {
        let Some(service) = self.service_of(assembly) else {
            debug!(assembly = assembly.name(), "skipping ineligible assembly");
            return Ok(None);
        };
        let mut accumulator = ModuleAccumulator::new(service);
        let mut resources = Vec::new();
        for resource in self.resources(assembly) {
            let record = self.analyze_resource(service, assembly, resource)?;
            accumulator.record(record.stability, record.surface);
            resources.push(record);
        }
        let summary = accumulator.finish();
        debug!(
            assembly = assembly.name(),
            service,
            resources = resources.len(),
            total_props = summary.total_props,
            "analysed module"
        );
        Ok(Some(ModuleReport {
            resources,
            summary,
        }))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
