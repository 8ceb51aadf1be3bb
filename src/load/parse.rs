use crate::findings::Findings;
use anyhow::Context;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Parse each file as JSON.
///
/// Files that cannot be read or parsed are reported as errors and left out
/// of the returned map; the remaining files are still processed.
pub fn load_documents(paths: &[PathBuf], findings: &mut Findings) -> BTreeMap<PathBuf, Value> {
    let mut out = BTreeMap::new();
    for path in paths {
        match read_json(path) {
            Ok(value) => {
                tracing::debug!(path = %path.display(), "loaded document");
                out.insert(path.clone(), value);
            }
            Err(err) => findings.error(format!(
                "Failed to validate JSON in: {}. {:#}",
                path.display(),
                err
            )),
        }
    }
    out
}

fn read_json(path: &Path) -> crate::Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&text).context("malformed JSON")?;
    Ok(value)
}
