//! Tier-based call fan-out against a frozen registry.
//!
//! The dispatcher replaces the original interception layer with an explicit
//! type: callers invoke `dispatch(capability, method, args)` and the
//! dispatcher performs tier selection and fan-out itself.
//!
//! Fan-out contract: every delegate in the selected tier(s) is invoked
//! sequentially in registration order; when a declaration routes to both
//! tiers the full primary tier runs before the secondary tier. The first
//! delegate failure aborts the dispatch and is propagated to the caller;
//! successful results are collected into an ordered sequence for the caller
//! to combine. There is no retry, timeout, or exception isolation.

use crate::binding::Registry;
use crate::catalog::identity::{CapabilityId, ImplementationId, MethodId, Tier};
use crate::error::DispatchError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A callable implementation bound into a tier.
///
/// Delegates are shared across concurrent dispatches; implementations must
/// not rely on exclusive access.
pub trait Delegate: Send + Sync {
    fn invoke(&self, method: &MethodId, args: &Value) -> anyhow::Result<Value>;
}

/// Routes capability method calls to the delegate tier(s) their propagation
/// declaration selects. Immutable once bound; dispatches share no state.
pub struct Dispatcher {
    registry: Arc<Registry>,
    delegates: BTreeMap<ImplementationId, Arc<dyn Delegate>>,
}

// Delegate instances are opaque; report the registry and the bound ids.
impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("delegates", &self.delegates.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Dispatcher {
    /// Pair a frozen registry with delegate instances.
    ///
    /// Every implementation bound in the registry needs an instance here;
    /// a missing one fails activation up front rather than at call time.
    pub fn bind(
        registry: Arc<Registry>,
        delegates: BTreeMap<ImplementationId, Arc<dyn Delegate>>,
    ) -> Result<Self, DispatchError> {
        for group in registry.groups() {
            for tier in [Tier::Primary, Tier::Secondary] {
                for implementation in group.tier_bindings(tier) {
                    if !delegates.contains_key(implementation) {
                        return Err(DispatchError::MissingDelegate(implementation.clone()));
                    }
                }
            }
        }
        Ok(Self {
            registry,
            delegates,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Fan a method call out across the declared tier(s).
    ///
    /// Only methods with a propagation declaration are routable. Results are
    /// returned in invocation order; the accumulator is local to this call.
    pub fn dispatch(
        &self,
        capability: &CapabilityId,
        method: &MethodId,
        args: &Value,
    ) -> Result<Vec<Value>, DispatchError> {
        let group = self
            .registry
            .group(capability)
            .ok_or_else(|| DispatchError::UnknownCapability(capability.clone()))?;
        let interface = self
            .registry
            .interface(capability)
            .ok_or_else(|| DispatchError::UnknownCapability(capability.clone()))?;
        let declaration =
            interface
                .method(method)
                .ok_or_else(|| DispatchError::UnknownMethod {
                    capability: capability.clone(),
                    method: method.clone(),
                })?;
        let propagation = declaration
            .propagate
            .ok_or_else(|| DispatchError::Unrouted {
                capability: capability.clone(),
                method: method.clone(),
            })?;
        debug!(
            capability = %capability,
            method = %method,
            propagation = propagation.as_str(),
            "dispatching"
        );

        let mut results = Vec::new();
        for tier in propagation.tiers() {
            for implementation in group.tier_bindings(*tier) {
                let delegate = self
                    .delegates
                    .get(implementation)
                    .ok_or_else(|| DispatchError::MissingDelegate(implementation.clone()))?;
                debug!(
                    capability = %capability,
                    method = %method,
                    implementation = %implementation,
                    tier = tier.as_str(),
                    "propagating call"
                );
                let result =
                    delegate
                        .invoke(method, args)
                        .map_err(|source| DispatchError::Delegate {
                            implementation: implementation.clone(),
                            source,
                        })?;
                results.push(result);
            }
        }
        Ok(results)
    }
}
