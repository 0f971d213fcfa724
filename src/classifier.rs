//! Tier classification of catalog candidates.
//!
//! Given a capability and a tier marker, selects the catalog implementations
//! that carry the marker and are assignable to the capability, and registers
//! them into the capability's binding group.

use crate::binding::BindingGroup;
use crate::catalog::identity::{CapabilityId, Tier};
use crate::catalog::repository::ClassCatalog;
use crate::error::DiscoveryError;
use tracing::debug;

/// Bind every marker-carrying, assignable candidate and return the number added.
///
/// Must be called exactly once per (capability, tier) pair within one build
/// pass; a second call would double-count and is a caller error. Pure with
/// respect to the catalog snapshot: identical catalog contents yield the
/// same count and the same bindings regardless of scan scheduling.
pub fn classify(
    catalog: &dyn ClassCatalog,
    group: &mut BindingGroup,
    capability: &CapabilityId,
    tier: Tier,
) -> Result<usize, DiscoveryError> {
    let mut added = 0;
    for candidate in catalog.implementations(tier)? {
        if !candidate.implements.contains(capability) {
            continue;
        }
        if group.add(tier, candidate.id.clone()) {
            debug!(
                implementation = %candidate.id,
                capability = %capability,
                tier = tier.as_str(),
                "binding implementation"
            );
            added += 1;
        }
    }
    Ok(added)
}
