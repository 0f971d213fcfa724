//! Composite catalog wiring.
//!
//! This module wraps the composite manifest contract so the build pass can
//! load a validated snapshot and expose consistent identifiers. Types here
//! mirror the manifest schema fields; callers use `ManifestIndex` for
//! validated lookups and the `ClassCatalog` trait when the source of
//! declarations should stay pluggable.

pub mod identity;
pub mod index;
pub mod model;
pub mod repository;

pub use identity::{
    CapabilityId, CatalogKey, CompositeId, ImplementationId, MethodId, Propagation, Tier,
};
pub use index::ManifestIndex;
pub use model::{
    CapabilityInterface, CompositeDeclaration, CompositeManifest, ImplementationDescriptor,
    ImplementationEntry, MethodDeclaration, load_manifest_from_path,
};
pub use repository::{ClassCatalog, ManifestCatalog, StaticCatalog};
