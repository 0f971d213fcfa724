//! The startup build pass: discovery, classification, validation, commit.
//!
//! Drives the classifier and validator once per autodiscovered composite and
//! either commits a frozen `Registry` or fails with one aggregated creation
//! error. Activation is all-or-nothing: the registry value only exists on
//! the success path, so no partial binding set is ever visible to a
//! dispatcher.

use crate::binding::{BindingGroup, Registry};
use crate::catalog::identity::{CapabilityId, Tier};
use crate::catalog::model::CapabilityInterface;
use crate::catalog::repository::ClassCatalog;
use crate::classifier::classify;
use crate::error::{BuildError, CompositeCreationError};
use crate::validator::{ValidationError, validate_bindings};
use std::collections::BTreeMap;
use tracing::{debug, error};

/// Configures and runs the composite build pass.
#[derive(Clone, Debug)]
pub struct RegistryBuilder {
    validating: bool,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self { validating: true }
    }

    /// Disable or re-enable binding validation. Classification and
    /// registration always run; only the cross-check is skipped.
    pub fn validating(mut self, validating: bool) -> Self {
        self.validating = validating;
        self
    }

    /// Run the build pass against a catalog snapshot.
    ///
    /// Catalog enumeration failures abort immediately; validation errors are
    /// collected across all composites and reported as one combined failure.
    /// Deterministic: the same catalog contents yield the same registry and
    /// the same outcome.
    pub fn build(&self, catalog: &dyn ClassCatalog) -> Result<Registry, BuildError> {
        let mut errors: Vec<ValidationError> = Vec::new();
        let mut groups: BTreeMap<CapabilityId, BindingGroup> = BTreeMap::new();
        let mut interfaces: BTreeMap<CapabilityId, CapabilityInterface> = BTreeMap::new();
        // Counts per capability so a second composite over the same
        // capability reuses the group instead of classifying twice.
        let mut counts: BTreeMap<CapabilityId, (usize, usize)> = BTreeMap::new();

        for composite in catalog.composites()? {
            if !composite.autodiscover {
                debug!(composite = %composite.id, "autodiscover disabled, skipping composite");
                continue;
            }
            debug!(
                composite = %composite.id,
                capability = %composite.capability,
                "binding composite component"
            );

            let Some(interface) = catalog.interface(&composite.capability)? else {
                let validation_error = ValidationError {
                    composite: composite.id.clone(),
                    message: format!(
                        "Composite component {} declares unknown capability {}",
                        composite.id, composite.capability
                    ),
                };
                error!(composite = %composite.id, "{}", validation_error.message);
                errors.push(validation_error);
                continue;
            };

            let capability = composite.capability.clone();
            let (primaries, secondaries) = match counts.get(&capability) {
                Some(recorded) => *recorded,
                None => {
                    let group = groups
                        .entry(capability.clone())
                        .or_insert_with(|| BindingGroup::new(capability.clone()));
                    let primaries = classify(catalog, group, &capability, Tier::Primary)?;
                    let secondaries = classify(catalog, group, &capability, Tier::Secondary)?;
                    counts.insert(capability.clone(), (primaries, secondaries));
                    (primaries, secondaries)
                }
            };
            interfaces
                .entry(capability.clone())
                .or_insert_with(|| interface.clone());

            if self.validating {
                debug!(composite = %composite.id, "validating bindings");
                for validation_error in
                    validate_bindings(&composite, &interface, primaries, secondaries)
                {
                    error!(composite = %validation_error.composite, "{}", validation_error.message);
                    errors.push(validation_error);
                }
            }
        }

        if !errors.is_empty() {
            return Err(CompositeCreationError::from_errors(&errors).into());
        }

        Ok(Registry::commit(groups, interfaces))
    }
}
