use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tandem::{Delegate, ImplementationId, MethodId};
use tempfile::NamedTempFile;

/// Write a manifest value to a temp file for `ManifestCatalog::load`.
pub fn write_manifest(manifest: &Value) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new().context("failed to allocate manifest file")?;
    serde_json::to_writer(&mut file, manifest).context("failed to write manifest fixture")?;
    Ok(file)
}

/// Baseline manifest skeleton; tests splice their declarations in.
pub fn manifest(
    capabilities: Value,
    composites: Value,
    implementations: Value,
) -> Value {
    json!({
        "schema_version": "composite_manifest_v1",
        "catalog": {"key": "fixture_v1", "title": "test fixture catalog"},
        "capabilities": capabilities,
        "composites": composites,
        "implementations": implementations
    })
}

/// Shared journal of delegate invocations, in call order.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Test delegate that records its invocations and echoes its own id.
pub struct RecordingDelegate {
    id: String,
    log: CallLog,
    fail: bool,
}

impl RecordingDelegate {
    pub fn new(id: &str, log: &CallLog) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            log: Arc::clone(log),
            fail: false,
        })
    }

    pub fn failing(id: &str, log: &CallLog) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            log: Arc::clone(log),
            fail: true,
        })
    }
}

impl Delegate for RecordingDelegate {
    fn invoke(&self, method: &MethodId, _args: &Value) -> anyhow::Result<Value> {
        self.log
            .lock()
            .expect("call log poisoned")
            .push(format!("{}::{}", self.id, method));
        if self.fail {
            anyhow::bail!("{} refused the call", self.id);
        }
        Ok(json!({"handled_by": self.id}))
    }
}

/// Convenience: a delegate table from (id, delegate) pairs.
pub fn delegate_table(
    entries: Vec<(&str, Arc<RecordingDelegate>)>,
) -> BTreeMap<ImplementationId, Arc<dyn Delegate>> {
    entries
        .into_iter()
        .map(|(id, delegate)| {
            (
                ImplementationId(id.to_string()),
                delegate as Arc<dyn Delegate>,
            )
        })
        .collect()
}
