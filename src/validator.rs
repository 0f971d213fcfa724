//! Binding validation for one composite against its classified counts.
//!
//! Returns a list of errors rather than short-circuiting so the builder can
//! surface every misconfigured composite in a single aggregated report.

use crate::catalog::identity::{CompositeId, MethodId, Tier};
use crate::catalog::model::{CapabilityInterface, CompositeDeclaration};

#[derive(Clone, Debug)]
/// One validation failure attributable to a composite. Transient: exists
/// only until folded into the aggregated creation error.
pub struct ValidationError {
    pub composite: CompositeId,
    pub message: String,
}

/// Cross-check the classified binding counts against the capability's
/// per-method propagation requirements.
///
/// The policy is a single else-if chain, evaluated in this exact order:
/// 1. zero bindings in both tiers reports only "No implementations found";
/// 2. otherwise zero primaries reports the Primary-requiring methods, if any;
/// 3. otherwise zero secondaries reports the Secondary-requiring methods;
/// 4. otherwise nothing.
/// The precedence is deliberate: a composite with no bindings at all never
/// reports method-level detail. Making the checks independent would change
/// observable validation output.
pub fn validate_bindings(
    composite: &CompositeDeclaration,
    interface: &CapabilityInterface,
    primaries: usize,
    secondaries: usize,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if primaries == 0 && secondaries == 0 {
        errors.push(ValidationError {
            composite: composite.id.clone(),
            message: format!("No implementations found for {}", composite.id),
        });
    } else if primaries == 0 {
        if let Some(error) = missing_tier_error(composite, interface, Tier::Primary) {
            errors.push(error);
        }
    } else if secondaries == 0 {
        if let Some(error) = missing_tier_error(composite, interface, Tier::Secondary) {
            errors.push(error);
        }
    }

    errors
}

fn missing_tier_error(
    composite: &CompositeDeclaration,
    interface: &CapabilityInterface,
    tier: Tier,
) -> Option<ValidationError> {
    let methods = interface.methods_requiring(tier);
    if methods.is_empty() {
        return None;
    }
    Some(ValidationError {
        composite: composite.id.clone(),
        message: format!(
            "Composite component {} methods [{}] require {} propagation but no {} implementations were found",
            composite.id,
            join_methods(&methods),
            tier.as_str(),
            tier.as_str()
        ),
    })
}

fn join_methods(methods: &[&MethodId]) -> String {
    methods
        .iter()
        .map(|method| method.0.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
