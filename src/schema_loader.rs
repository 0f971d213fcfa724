//! Shared JSON Schema loader for manifest validation.
//!
//! Compiles the bundled manifest schema and enforces that its
//! `schema_version` const stays inside the allowed set, so the index cannot
//! silently accept manifests written for a different contract revision.

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

const SCHEMA_VERSION_POINTER: &str = "/properties/schema_version/const";

/// Result of loading and compiling a JSON Schema.
pub(crate) struct SchemaLoadResult {
    pub schema_version: String,
    pub compiled: JSONSchema,
    // Keeps the schema payload alive for the compiled validator, which
    // borrows it for 'static via the pointer below.
    #[allow(dead_code)]
    pub raw: Arc<Value>,
}

pub(crate) fn load_json_schema(
    path: &Path,
    allowed_versions: &BTreeSet<String>,
) -> Result<SchemaLoadResult> {
    let schema_value: Value = serde_json::from_reader(
        File::open(path).with_context(|| format!("opening schema {}", path.display()))?,
    )
    .with_context(|| format!("parsing schema {}", path.display()))?;

    let schema_version = extract_schema_version(&schema_value)
        .ok_or_else(|| anyhow!("schema {} missing schema_version const", path.display()))?;

    if !allowed_versions.contains(&schema_version) {
        bail!(
            "schema_version '{}' not in allowed set {:?}",
            schema_version,
            allowed_versions
        );
    }

    let raw = Arc::new(schema_value);
    let raw_static: &'static Value = unsafe { &*(Arc::as_ptr(&raw)) };
    let compiled = JSONSchema::compile(raw_static)
        .with_context(|| format!("compiling schema {}", path.display()))?;

    Ok(SchemaLoadResult {
        schema_version,
        compiled,
        raw,
    })
}

fn extract_schema_version(schema: &Value) -> Option<String> {
    let version = schema.pointer(SCHEMA_VERSION_POINTER).and_then(Value::as_str)?;
    if version
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Some(version.to_string())
    } else {
        None
    }
}
