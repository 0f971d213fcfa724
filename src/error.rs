//! Error taxonomy for activation and dispatch.
//!
//! Discovery failures abort immediately; binding validation errors are
//! deferred across the whole build pass and folded into one
//! `CompositeCreationError` so a misconfigured deployment is reported in a
//! single pass instead of one composite at a time.

use crate::catalog::identity::{CapabilityId, ImplementationId, MethodId};
use crate::validator::ValidationError;
use thiserror::Error;

/// Header line prefixed to every aggregated creation failure.
pub const CREATION_ERROR_HEADER: &str = "The following creation errors were found:";

/// The class catalog could not be enumerated at all.
///
/// Distinct from validation: no further work is possible without the
/// candidate list, so this aborts activation on the spot.
#[derive(Debug, Error)]
#[error("class catalog discovery failed: {reason}")]
pub struct DiscoveryError {
    reason: String,
}

impl DiscoveryError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The single process-visible activation failure: a fixed header followed by
/// one line per validation error, in collection order.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CompositeCreationError {
    message: String,
}

impl CompositeCreationError {
    pub(crate) fn from_errors(errors: &[ValidationError]) -> Self {
        let mut message = String::from(CREATION_ERROR_HEADER);
        for error in errors {
            message.push('\n');
            message.push_str(&error.message);
        }
        Self { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Outcome of a failed build pass.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Creation(#[from] CompositeCreationError),
}

/// Errors surfaced by the propagation dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no binding group for capability {0}")]
    UnknownCapability(CapabilityId),
    #[error("capability {capability} declares no method {method}")]
    UnknownMethod {
        capability: CapabilityId,
        method: MethodId,
    },
    #[error("method {method} on {capability} has no propagation declaration")]
    Unrouted {
        capability: CapabilityId,
        method: MethodId,
    },
    #[error("no delegate instance registered for bound implementation {0}")]
    MissingDelegate(ImplementationId),
    #[error("delegate {implementation} failed")]
    Delegate {
        implementation: ImplementationId,
        #[source]
        source: anyhow::Error,
    },
}
