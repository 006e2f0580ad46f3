// crates/surface-coverage-core/src/model/metadata.rs
// ============================================================================
// Module: Surface Coverage Metadata Model
// Description: Decoded assemblies, classes, interfaces, and properties.
// Purpose: Provide the read-only type system queried by the analyzer.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The metadata model is a strongly typed view over decoded type-definition
//! manifests. Every record is an explicit struct with required fields; fields
//! the manifests may omit are modelled as [`Option`] or defaulted collections.
//! The [`TypeSystem`] is built once before analysis and never mutated after.
//!
//! Invariants:
//! - Every type key in an [`Assembly`] equals the type's own FQN.
//! - Every FQN is prefixed by its owning assembly name and a `.` separator.
//! - Assembly names are unique within a [`TypeSystem`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Metadata validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetadataError {
    /// Two manifests declared the same assembly name.
    #[error("duplicate assembly: {0}")]
    DuplicateAssembly(String),
    /// A type record violated a structural requirement.
    #[error("invalid type metadata: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Type References
// ============================================================================

/// Reference to the declared type of a property or parameter.
///
/// Only [`TypeRef::Named`] references can resolve to another structured
/// type; every other shape is treated as an opaque leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeRef {
    /// Reference to a named type by fully qualified name.
    Named {
        /// Fully qualified type name.
        fqn: String,
    },
    /// Primitive type (`string`, `number`, `boolean`, `any`, ...).
    Primitive {
        /// Primitive type label.
        primitive: String,
    },
    /// Collection type (array or map), kept opaque.
    Collection {
        /// Raw collection descriptor.
        collection: Value,
    },
    /// Union type, kept opaque.
    Union {
        /// Raw union descriptor.
        union: Value,
    },
}

impl TypeRef {
    /// Returns the referenced FQN for named references.
    #[must_use]
    pub fn fqn(&self) -> Option<&str> {
        match self {
            Self::Named {
                fqn,
            } => Some(fqn),
            Self::Primitive {
                ..
            }
            | Self::Collection {
                ..
            }
            | Self::Union {
                ..
            } => None,
        }
    }

    /// Creates a named reference.
    #[must_use]
    pub fn named(fqn: impl Into<String>) -> Self {
        Self::Named {
            fqn: fqn.into(),
        }
    }

    /// Creates a primitive reference.
    #[must_use]
    pub fn primitive(primitive: impl Into<String>) -> Self {
        Self::Primitive {
            primitive: primitive.into(),
        }
    }
}

// ============================================================================
// SECTION: Documentation
// ============================================================================

/// Documentation tags attached to a type or member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Docs {
    /// Declared stability tag, if any. Values are not normalized here.
    #[serde(default)]
    pub stability: Option<String>,
    /// Custom documentation tags keyed by tag name.
    #[serde(default)]
    pub custom: BTreeMap<String, String>,
}

impl Docs {
    /// Returns the value of a custom documentation tag.
    #[must_use]
    pub fn custom_tag(&self, name: &str) -> Option<&str> {
        self.custom.get(name).map(String::as_str)
    }
}

// ============================================================================
// SECTION: Members
// ============================================================================

/// Initializer parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Declared parameter type.
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
}

/// Class initializer (constructor) signature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Initializer {
    /// Ordered initializer parameters.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// Property declared on an interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Declared property type.
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
}

// ============================================================================
// SECTION: Type Definitions
// ============================================================================

/// Class definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassType {
    /// Fully qualified class name.
    pub fqn: String,
    /// Simple class name.
    pub name: String,
    /// Optional initializer signature.
    #[serde(default)]
    pub initializer: Option<Initializer>,
    /// Documentation tags.
    #[serde(default)]
    pub docs: Docs,
}

impl ClassType {
    /// Returns the initializer parameters, or an empty slice without one.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        match &self.initializer {
            Some(initializer) => &initializer.parameters,
            None => &[],
        }
    }
}

/// Interface (structured property type) definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceType {
    /// Fully qualified interface name.
    pub fqn: String,
    /// Simple interface name.
    pub name: String,
    /// Base interface FQNs.
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Properties declared directly on this interface.
    #[serde(default)]
    pub properties: Vec<Property>,
    /// Documentation tags.
    #[serde(default)]
    pub docs: Docs,
}

impl InterfaceType {
    /// Returns own and inherited properties.
    ///
    /// Own declarations come first and shadow inherited properties with the
    /// same name. Base interfaces that cannot be resolved are ignored.
    #[must_use]
    pub fn all_properties<'a>(&'a self, types: &'a TypeSystem) -> Vec<&'a Property> {
        let mut visited = BTreeSet::new();
        let mut names = BTreeSet::new();
        let mut properties = Vec::new();
        collect_properties(self, types, &mut visited, &mut names, &mut properties);
        properties
    }
}

/// Enum definition. Members are not consulted by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    /// Fully qualified enum name.
    pub fqn: String,
    /// Simple enum name.
    pub name: String,
}

/// Any type definition found in an assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeDef {
    /// Class definition.
    Class(ClassType),
    /// Interface definition.
    Interface(InterfaceType),
    /// Enum definition.
    Enum(EnumType),
}

impl TypeDef {
    /// Returns the fully qualified name.
    #[must_use]
    pub fn fqn(&self) -> &str {
        match self {
            Self::Class(class) => &class.fqn,
            Self::Interface(interface) => &interface.fqn,
            Self::Enum(enumeration) => &enumeration.fqn,
        }
    }

    /// Returns the simple name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Class(class) => &class.name,
            Self::Interface(interface) => &interface.name,
            Self::Enum(enumeration) => &enumeration.name,
        }
    }

    /// Returns the class definition, if this is a class.
    #[must_use]
    pub const fn as_class(&self) -> Option<&ClassType> {
        match self {
            Self::Class(class) => Some(class),
            Self::Interface(_) | Self::Enum(_) => None,
        }
    }

    /// Returns the interface definition, if this is an interface.
    #[must_use]
    pub const fn as_interface(&self) -> Option<&InterfaceType> {
        match self {
            Self::Interface(interface) => Some(interface),
            Self::Class(_) | Self::Enum(_) => None,
        }
    }
}

// ============================================================================
// SECTION: Assembly
// ============================================================================

/// A named module of the type system.
///
/// # Invariants
/// - Type keys equal type FQNs and carry the assembly name as prefix.
/// - Types iterate in FQN order.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    /// Assembly name (for example `@aws-cdk/aws-s3`).
    name: String,
    /// Type definitions keyed by FQN.
    types: BTreeMap<String, TypeDef>,
}

impl Assembly {
    /// Builds an assembly after validating its type records.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Invalid`] when the name is empty, a type key
    /// disagrees with its FQN, an FQN lacks the assembly prefix, or a type or
    /// member name is empty.
    pub fn new(
        name: impl Into<String>,
        types: BTreeMap<String, TypeDef>,
    ) -> Result<Self, MetadataError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(MetadataError::Invalid("assembly name must be non-empty".to_string()));
        }
        let prefix = format!("{name}.");
        for (key, def) in &types {
            if key != def.fqn() {
                return Err(MetadataError::Invalid(format!(
                    "type key {key} does not match fqn {}",
                    def.fqn()
                )));
            }
            if !key.starts_with(&prefix) {
                return Err(MetadataError::Invalid(format!(
                    "type {key} is not scoped to assembly {name}"
                )));
            }
            if def.name().is_empty() {
                return Err(MetadataError::Invalid(format!("type {key} has an empty name")));
            }
            validate_members(def)?;
        }
        Ok(Self {
            name,
            types,
        })
    }

    /// Returns the assembly name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterates every type definition in FQN order.
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    /// Iterates class definitions in FQN order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassType> {
        self.types.values().filter_map(TypeDef::as_class)
    }

    /// Iterates interface definitions in FQN order.
    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceType> {
        self.types.values().filter_map(TypeDef::as_interface)
    }

    /// Looks up a type owned by this assembly.
    #[must_use]
    pub fn try_find_type(&self, fqn: &str) -> Option<&TypeDef> {
        self.types.get(fqn)
    }
}

// ============================================================================
// SECTION: Type System
// ============================================================================

/// Read-only collection of loaded assemblies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeSystem {
    /// Assemblies keyed by name.
    assemblies: BTreeMap<String, Assembly>,
}

impl TypeSystem {
    /// Creates an empty type system.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            assemblies: BTreeMap::new(),
        }
    }

    /// Adds an assembly to the type system.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::DuplicateAssembly`] when the name is taken.
    pub fn add_assembly(&mut self, assembly: Assembly) -> Result<(), MetadataError> {
        if self.assemblies.contains_key(assembly.name()) {
            return Err(MetadataError::DuplicateAssembly(assembly.name().to_string()));
        }
        self.assemblies.insert(assembly.name().to_string(), assembly);
        Ok(())
    }

    /// Iterates assemblies in name order.
    pub fn assemblies(&self) -> impl Iterator<Item = &Assembly> {
        self.assemblies.values()
    }

    /// Returns the assembly with the given name.
    #[must_use]
    pub fn assembly(&self, name: &str) -> Option<&Assembly> {
        self.assemblies.get(name)
    }

    /// Returns the number of loaded assemblies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assemblies.len()
    }

    /// Returns true when no assembly is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assemblies.is_empty()
    }

    /// Looks up a type across every loaded assembly.
    #[must_use]
    pub fn try_find_type(&self, fqn: &str) -> Option<&TypeDef> {
        self.assemblies.values().find_map(|assembly| assembly.try_find_type(fqn))
    }

    /// Looks up an interface across every loaded assembly.
    ///
    /// Returns `None` when the FQN is unknown or names a class or enum.
    #[must_use]
    pub fn find_interface(&self, fqn: &str) -> Option<&InterfaceType> {
        self.try_find_type(fqn).and_then(TypeDef::as_interface)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Rejects member records with empty names.
fn validate_members(def: &TypeDef) -> Result<(), MetadataError> {
    match def {
        TypeDef::Class(class) => {
            if class.parameters().iter().any(|parameter| parameter.name.is_empty()) {
                return Err(MetadataError::Invalid(format!(
                    "class {} has an unnamed initializer parameter",
                    class.fqn
                )));
            }
        }
        TypeDef::Interface(interface) => {
            if interface.properties.iter().any(|property| property.name.is_empty()) {
                return Err(MetadataError::Invalid(format!(
                    "interface {} has an unnamed property",
                    interface.fqn
                )));
            }
        }
        TypeDef::Enum(_) => {}
    }
    Ok(())
}

/// Collects own then inherited properties, skipping shadowed names and
/// already visited base interfaces.
fn collect_properties<'a>(
    interface: &'a InterfaceType,
    types: &'a TypeSystem,
    visited: &mut BTreeSet<&'a str>,
    names: &mut BTreeSet<&'a str>,
    properties: &mut Vec<&'a Property>,
) {
    if !visited.insert(interface.fqn.as_str()) {
        return;
    }
    for property in &interface.properties {
        if names.insert(property.name.as_str()) {
            properties.push(property);
        }
    }
    for base in &interface.interfaces {
        if let Some(base) = types.find_interface(base) {
            collect_properties(base, types, visited, names, properties);
        }
    }
}
