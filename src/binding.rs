//! Delegate binding groups and the frozen registry.
//!
//! A `BindingGroup` collects the tiered implementations bound to one
//! capability during the build pass. The `Registry` is the committed,
//! read-only set of groups the dispatcher runs against; it is only
//! constructed on the success path of the build pass and has no mutating
//! API, so partial activation is never observable.

use crate::catalog::identity::{CapabilityId, ImplementationId, Tier};
use crate::catalog::model::CapabilityInterface;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
/// Tiered implementation bindings for one capability.
///
/// Registration order is preserved per tier; it is the dispatch order
/// contract. Duplicate ids within a tier are not re-added.
pub struct BindingGroup {
    capability: CapabilityId,
    primary: Vec<ImplementationId>,
    secondary: Vec<ImplementationId>,
}

impl BindingGroup {
    pub(crate) fn new(capability: CapabilityId) -> Self {
        Self {
            capability,
            primary: Vec::new(),
            secondary: Vec::new(),
        }
    }

    /// Record a delegate binding. Returns false when the implementation is
    /// already bound in that tier.
    pub(crate) fn add(&mut self, tier: Tier, implementation: ImplementationId) -> bool {
        let bindings = match tier {
            Tier::Primary => &mut self.primary,
            Tier::Secondary => &mut self.secondary,
        };
        if bindings.contains(&implementation) {
            return false;
        }
        bindings.push(implementation);
        true
    }

    pub fn capability(&self) -> &CapabilityId {
        &self.capability
    }

    /// Bindings for one tier, in registration order.
    pub fn tier_bindings(&self, tier: Tier) -> &[ImplementationId] {
        match tier {
            Tier::Primary => &self.primary,
            Tier::Secondary => &self.secondary,
        }
    }

    pub fn primary(&self) -> &[ImplementationId] {
        &self.primary
    }

    pub fn secondary(&self) -> &[ImplementationId] {
        &self.secondary
    }
}

#[derive(Debug)]
/// The frozen binding set produced by a successful build pass.
///
/// Immutable for the remainder of the process; safe to share across any
/// number of dispatching threads without synchronization.
pub struct Registry {
    groups: BTreeMap<CapabilityId, BindingGroup>,
    interfaces: BTreeMap<CapabilityId, CapabilityInterface>,
}

impl Registry {
    pub(crate) fn commit(
        groups: BTreeMap<CapabilityId, BindingGroup>,
        interfaces: BTreeMap<CapabilityId, CapabilityInterface>,
    ) -> Self {
        Self { groups, interfaces }
    }

    pub fn group(&self, capability: &CapabilityId) -> Option<&BindingGroup> {
        self.groups.get(capability)
    }

    pub fn interface(&self, capability: &CapabilityId) -> Option<&CapabilityInterface> {
        self.interfaces.get(capability)
    }

    /// Iterates bound capabilities in stable order.
    pub fn capabilities(&self) -> impl Iterator<Item = &CapabilityId> {
        self.groups.keys()
    }

    pub fn groups(&self) -> impl Iterator<Item = &BindingGroup> {
        self.groups.values()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
