//! Composite delegate binding and call propagation.
//!
//! The crate discovers candidate implementations of a declared composite
//! capability, classifies them into primary and secondary delegate tiers,
//! validates per-method propagation requirements against the discovered
//! bindings, and dispatches calls on the capability to the selected tier(s).
//!
//! The build pass is a one-time startup operation with all-or-nothing
//! activation: either every autodiscovered composite classifies and
//! validates cleanly and a frozen [`Registry`] is committed, or activation
//! fails with a single aggregated [`CompositeCreationError`] listing every
//! misconfigured composite. After activation the registry is immutable and
//! the [`Dispatcher`] reads it concurrently without synchronization.
//!
//! Catalogs are pluggable: [`ManifestCatalog`] loads a schema-validated JSON
//! manifest, [`StaticCatalog`] serves fixed in-memory declarations.

pub mod binding;
pub mod builder;
pub mod catalog;
pub mod classifier;
pub mod dispatch;
pub mod error;
pub mod validator;

mod schema_loader;

pub use binding::{BindingGroup, Registry};
pub use builder::RegistryBuilder;
pub use catalog::{
    CapabilityId, CapabilityInterface, CatalogKey, ClassCatalog, CompositeDeclaration,
    CompositeId, CompositeManifest, ImplementationDescriptor, ImplementationId, ManifestCatalog,
    ManifestIndex, MethodDeclaration, MethodId, Propagation, StaticCatalog, Tier,
    load_manifest_from_path,
};
pub use classifier::classify;
pub use dispatch::{Delegate, Dispatcher};
pub use error::{
    BuildError, CREATION_ERROR_HEADER, CompositeCreationError, DiscoveryError, DispatchError,
};
pub use validator::{ValidationError, validate_bindings};
