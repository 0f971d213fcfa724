//! Indexed view of a composite manifest.
//!
//! The index enforces the expected manifest schema version and structural
//! integrity (unique ids, resolvable capability references) and provides
//! fast lookup by capability id. It is intentionally strict so the build
//! pass never runs against a manifest whose declarations contradict each
//! other; binding-level policy checks stay with the validator.

use crate::catalog::identity::{CapabilityId, CatalogKey, Tier};
use crate::catalog::model::{
    CapabilityInterface, CompositeDeclaration, CompositeManifest, ImplementationDescriptor,
    ImplementationEntry, load_manifest_from_path,
};
use crate::schema_loader::load_json_schema;
use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

// The crate currently ships a single manifest contract; reject unexpected
// versions rather than risk activating bindings from a mismatched layout.
const MANIFEST_SCHEMA_VERSION: &str = "composite_manifest_v1";

#[derive(Debug)]
/// Composite manifest plus derived lookup tables keyed by capability id.
pub struct ManifestIndex {
    catalog_key: CatalogKey,
    interfaces: BTreeMap<CapabilityId, CapabilityInterface>,
    composites: Vec<CompositeDeclaration>,
    implementations: Vec<ImplementationEntry>,
}

impl ManifestIndex {
    /// Load and validate a manifest from disk.
    ///
    /// Validates against the bundled JSON Schema, checks the schema version
    /// and catalog metadata, and builds deterministic lookup tables. Any
    /// failure here means the catalog cannot be enumerated at all.
    pub fn load(path: &Path) -> Result<Self> {
        validate_against_schema(path)?;

        let manifest =
            load_manifest_from_path(path).with_context(|| format!("loading {}", path.display()))?;
        validate_schema_version(&manifest.schema_version)?;
        validate_catalog_metadata(&manifest)?;
        let interfaces = build_interface_map(&manifest)?;
        let composites = checked_composites(&manifest, &interfaces)?;
        let implementations = usable_implementations(&manifest, &interfaces)?;
        Ok(Self {
            catalog_key: manifest.catalog.key.clone(),
            interfaces,
            composites,
            implementations,
        })
    }

    /// The catalog key declared in the loaded manifest.
    pub fn key(&self) -> &CatalogKey {
        &self.catalog_key
    }

    /// Resolve a capability interface by id.
    pub fn interface(&self, id: &CapabilityId) -> Option<&CapabilityInterface> {
        self.interfaces.get(id)
    }

    /// Composite declarations in manifest order.
    pub fn composites(&self) -> &[CompositeDeclaration] {
        &self.composites
    }

    /// Implementations carrying the given tier marker, in manifest order.
    pub fn implementations(&self, tier: Tier) -> Vec<ImplementationDescriptor> {
        self.implementations
            .iter()
            .filter(|entry| entry.tier == tier)
            .map(|entry| ImplementationDescriptor {
                id: entry.id.clone(),
                implements: entry.implements.clone(),
            })
            .collect()
    }
}

fn validate_schema_version(schema_version: &str) -> Result<()> {
    if schema_version.is_empty() {
        bail!("schema_version must not be empty");
    }

    if schema_version != MANIFEST_SCHEMA_VERSION {
        bail!(
            "schema_version '{}' not supported; expected '{}'",
            schema_version,
            MANIFEST_SCHEMA_VERSION
        );
    }

    Ok(())
}

fn validate_catalog_metadata(manifest: &CompositeManifest) -> Result<()> {
    let key = &manifest.catalog.key;
    if key.0.is_empty() {
        bail!("catalog.key must not be empty");
    }
    if !key
        .0
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        bail!("catalog.key must match ^[A-Za-z0-9_.-]+$, got {}", key.0);
    }
    if manifest.catalog.title.trim().is_empty() {
        bail!("catalog.title must not be empty");
    }
    Ok(())
}

fn build_interface_map(
    manifest: &CompositeManifest,
) -> Result<BTreeMap<CapabilityId, CapabilityInterface>> {
    let mut map = BTreeMap::new();
    for interface in &manifest.capabilities {
        if interface.id.0.trim().is_empty() {
            bail!("encountered capability with no id");
        }
        if map.contains_key(&interface.id) {
            bail!("duplicate capability id {}", interface.id.0);
        }
        let mut method_ids = BTreeSet::new();
        for method in &interface.methods {
            if method.id.0.trim().is_empty() {
                bail!("capability {} declares a method with no id", interface.id.0);
            }
            if !method_ids.insert(method.id.clone()) {
                bail!(
                    "capability {} declares duplicate method {}",
                    interface.id.0,
                    method.id.0
                );
            }
        }
        map.insert(interface.id.clone(), interface.clone());
    }
    Ok(map)
}

fn checked_composites(
    manifest: &CompositeManifest,
    interfaces: &BTreeMap<CapabilityId, CapabilityInterface>,
) -> Result<Vec<CompositeDeclaration>> {
    let mut seen = BTreeSet::new();
    for composite in &manifest.composites {
        if composite.id.0.trim().is_empty() {
            bail!("encountered composite with no id");
        }
        if !seen.insert(composite.id.clone()) {
            bail!("duplicate composite id {}", composite.id.0);
        }
        if !interfaces.contains_key(&composite.capability) {
            bail!(
                "composite {} references unknown capability {}",
                composite.id.0,
                composite.capability.0
            );
        }
    }
    Ok(manifest.composites.clone())
}

fn usable_implementations(
    manifest: &CompositeManifest,
    interfaces: &BTreeMap<CapabilityId, CapabilityInterface>,
) -> Result<Vec<ImplementationEntry>> {
    let mut seen = BTreeSet::new();
    let mut entries = Vec::new();
    for mut entry in manifest.implementation_entries() {
        if !seen.insert(entry.id.clone()) {
            bail!("duplicate implementation id {}", entry.id.0);
        }
        // References to capabilities the manifest never declares can never be
        // assignable; drop them the way an unloadable candidate is dropped.
        entry.implements.retain(|capability| {
            let known = interfaces.contains_key(capability);
            if !known {
                debug!(
                    implementation = %entry.id,
                    capability = %capability,
                    "dropping reference to undeclared capability"
                );
            }
            known
        });
        if entry.implements.is_empty() {
            debug!(implementation = %entry.id, "excluding implementation with no usable capability");
            continue;
        }
        entries.push(entry);
    }
    Ok(entries)
}

fn validate_against_schema(manifest_path: &Path) -> Result<()> {
    let manifest_file = File::open(manifest_path)
        .with_context(|| format!("opening manifest {}", manifest_path.display()))?;
    let manifest_value: Value = serde_json::from_reader(BufReader::new(manifest_file))
        .with_context(|| format!("parsing manifest {}", manifest_path.display()))?;

    let schema_path = canonical_manifest_schema_path();
    let allowed = BTreeSet::from_iter([MANIFEST_SCHEMA_VERSION.to_string()]);
    let schema = load_json_schema(&schema_path, &allowed)
        .with_context(|| format!("loading manifest schema {}", schema_path.display()))?;
    debug!(schema_version = %schema.schema_version, "validating manifest against schema");

    if let Err(errors) = schema.compiled.validate(&manifest_value) {
        let details = errors
            .map(|err| err.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        bail!(
            "composite manifest {} failed schema validation:\n{}",
            manifest_path.display(),
            details
        );
    }
    Ok(())
}

fn canonical_manifest_schema_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("schema/composite_manifest.schema.json")
}
