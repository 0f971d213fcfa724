//! Deserializable representation of a composite binding manifest.
//!
//! The types mirror `schema/composite_manifest.schema.json` so the build pass
//! and tests can reason about catalog contents without ad-hoc JSON handling.
//! Use `ManifestIndex` for validation and lookup; use these structs when the
//! raw manifest surface is required.

use crate::catalog::identity::{
    CapabilityId, CatalogKey, CompositeId, ImplementationId, MethodId, Propagation, Tier,
};
use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Clone, Debug, Deserialize)]
/// Full composite manifest as stored on disk.
pub struct CompositeManifest {
    pub schema_version: String,
    pub catalog: CatalogMetadata,
    pub capabilities: Vec<CapabilityInterface>,
    #[serde(default)]
    pub composites: Vec<CompositeDeclaration>,
    // Kept as raw values so one malformed entry is excluded instead of
    // failing the whole manifest; see `implementation_entries`.
    #[serde(default)]
    pub implementations: Vec<Value>,
}

#[derive(Clone, Debug, Deserialize)]
/// Catalog identity recorded alongside the declarations.
pub struct CatalogMetadata {
    pub key: CatalogKey,
    pub title: String,
}

#[derive(Clone, Debug, Deserialize)]
/// A capability interface: the contract a composite aggregates implementations of.
pub struct CapabilityInterface {
    pub id: CapabilityId,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub methods: Vec<MethodDeclaration>,
}

#[derive(Clone, Debug, Deserialize)]
/// One method on a capability interface, optionally carrying a propagation
/// declaration. Methods without one are not routable through the dispatcher.
pub struct MethodDeclaration {
    pub id: MethodId,
    #[serde(default)]
    pub propagate: Option<Propagation>,
}

#[derive(Clone, Debug, Deserialize)]
/// A class declaring composite status for one capability.
///
/// The capability is named explicitly; there is no declaration-order
/// convention to fall back on.
pub struct CompositeDeclaration {
    pub id: CompositeId,
    pub capability: CapabilityId,
    #[serde(default = "default_autodiscover")]
    pub autodiscover: bool,
}

#[derive(Clone, Debug, Deserialize)]
/// A candidate implementation carrying a tier marker.
pub struct ImplementationEntry {
    pub id: ImplementationId,
    pub tier: Tier,
    #[serde(default)]
    pub implements: Vec<CapabilityId>,
}

#[derive(Clone, Debug)]
/// Catalog-side view of a candidate implementation for one tier query.
///
/// Assignability to a capability is membership in `implements`.
pub struct ImplementationDescriptor {
    pub id: ImplementationId,
    pub implements: Vec<CapabilityId>,
}

impl CompositeDeclaration {
    pub fn new(id: impl Into<String>, capability: impl Into<String>) -> Self {
        Self {
            id: CompositeId(id.into()),
            capability: CapabilityId(capability.into()),
            autodiscover: true,
        }
    }

    pub fn manual(mut self) -> Self {
        self.autodiscover = false;
        self
    }
}

impl CapabilityInterface {
    pub fn method(&self, id: &MethodId) -> Option<&MethodDeclaration> {
        self.methods.iter().find(|method| &method.id == id)
    }

    /// Method ids whose propagation declaration obliges the given tier,
    /// in declaration order.
    pub fn methods_requiring(&self, tier: Tier) -> Vec<&MethodId> {
        self.methods
            .iter()
            .filter(|method| method.propagate.is_some_and(|p| p.requires(tier)))
            .map(|method| &method.id)
            .collect()
    }
}

impl CompositeManifest {
    /// Parse the raw implementation entries, excluding any that fail.
    ///
    /// A failed entry is the per-candidate load failure of the catalog
    /// contract: it is dropped with a debug log, never surfaced as an error.
    pub fn implementation_entries(&self) -> Vec<ImplementationEntry> {
        let mut entries = Vec::new();
        for (idx, raw) in self.implementations.iter().enumerate() {
            match serde_json::from_value::<ImplementationEntry>(raw.clone()) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    debug!(index = idx, error = %err, "excluding unloadable implementation entry");
                }
            }
        }
        entries
    }
}

fn default_autodiscover() -> bool {
    true
}

/// Read and parse a composite manifest from disk without additional validation.
pub fn load_manifest_from_path(path: &Path) -> Result<CompositeManifest> {
    let data = fs::read_to_string(path)?;
    let manifest: CompositeManifest = serde_json::from_str(&data)?;
    Ok(manifest)
}
