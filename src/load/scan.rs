use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

/// List regular files directly inside `dir` whose name contains "json".
///
/// Sorted by path so that repeated runs report findings in the same order.
pub fn list_candidates(dir: &Path) -> crate::Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))?;

    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.contains("json"))
            .unwrap_or(false);
        if matches {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}
