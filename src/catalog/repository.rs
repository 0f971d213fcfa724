//! Class catalog sources for the build pass.
//!
//! The catalog is the collaborator that enumerates composite declarations and
//! tier-marked implementation candidates. It sits behind a trait so tests can
//! supply a fixed in-memory catalog instead of loading a manifest, and so
//! embedders that enumerate their own types can participate in the same
//! build pass.

use crate::catalog::identity::{CapabilityId, Tier};
use crate::catalog::index::ManifestIndex;
use crate::catalog::model::{
    CapabilityInterface, CompositeDeclaration, ImplementationDescriptor,
};
use crate::error::DiscoveryError;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

/// Read-only snapshot of loadable classes and their markers.
///
/// A failure to enumerate at all must surface as a `DiscoveryError` and is
/// fatal to activation; a failure to load one individual candidate must be
/// swallowed by the implementation (that candidate is excluded, not
/// reported).
pub trait ClassCatalog {
    /// All classes carrying the composite marker, in discovery order.
    fn composites(&self) -> Result<Vec<CompositeDeclaration>, DiscoveryError>;

    /// All classes carrying the given tier marker, in discovery order.
    fn implementations(&self, tier: Tier)
    -> Result<Vec<ImplementationDescriptor>, DiscoveryError>;

    /// Resolve the interface declaration for a capability, if the catalog
    /// knows it.
    fn interface(&self, id: &CapabilityId)
    -> Result<Option<CapabilityInterface>, DiscoveryError>;
}

#[derive(Default)]
/// In-memory catalog with explicit registration, preserving registration
/// order. The usual source for tests and for embedders without a manifest.
pub struct StaticCatalog {
    interfaces: BTreeMap<CapabilityId, CapabilityInterface>,
    composites: Vec<CompositeDeclaration>,
    implementations: Vec<(Tier, ImplementationDescriptor)>,
}

impl StaticCatalog {
    pub fn declare_interface(&mut self, interface: CapabilityInterface) -> &mut Self {
        self.interfaces.insert(interface.id.clone(), interface);
        self
    }

    pub fn declare_composite(&mut self, composite: CompositeDeclaration) -> &mut Self {
        self.composites.push(composite);
        self
    }

    pub fn declare_implementation(
        &mut self,
        tier: Tier,
        descriptor: ImplementationDescriptor,
    ) -> &mut Self {
        self.implementations.push((tier, descriptor));
        self
    }
}

impl ClassCatalog for StaticCatalog {
    fn composites(&self) -> Result<Vec<CompositeDeclaration>, DiscoveryError> {
        Ok(self.composites.clone())
    }

    fn implementations(
        &self,
        tier: Tier,
    ) -> Result<Vec<ImplementationDescriptor>, DiscoveryError> {
        Ok(self
            .implementations
            .iter()
            .filter(|(marker, _)| *marker == tier)
            .map(|(_, descriptor)| descriptor.clone())
            .collect())
    }

    fn interface(
        &self,
        id: &CapabilityId,
    ) -> Result<Option<CapabilityInterface>, DiscoveryError> {
        Ok(self.interfaces.get(id).cloned())
    }
}

/// Catalog backed by a validated on-disk manifest.
pub struct ManifestCatalog {
    index: ManifestIndex,
}

impl ManifestCatalog {
    /// Load and validate the manifest at `path`.
    ///
    /// Errors here correspond to the catalog being unenumerable (missing
    /// file, schema violation, contradictory declarations) and abort
    /// activation before any classification runs.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self {
            index: ManifestIndex::load(path)?,
        })
    }

    pub fn index(&self) -> &ManifestIndex {
        &self.index
    }
}

impl From<ManifestIndex> for ManifestCatalog {
    fn from(index: ManifestIndex) -> Self {
        Self { index }
    }
}

impl ClassCatalog for ManifestCatalog {
    fn composites(&self) -> Result<Vec<CompositeDeclaration>, DiscoveryError> {
        Ok(self.index.composites().to_vec())
    }

    fn implementations(
        &self,
        tier: Tier,
    ) -> Result<Vec<ImplementationDescriptor>, DiscoveryError> {
        Ok(self.index.implementations(tier))
    }

    fn interface(
        &self,
        id: &CapabilityId,
    ) -> Result<Option<CapabilityInterface>, DiscoveryError> {
        Ok(self.index.interface(id).cloned())
    }
}
