//! Pairing model: group loaded documents into job-spec / hysds-io units.

use crate::findings::{Findings, Severity};
use crate::spec::{BaseName, DocumentKind, FileNaming};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RawDocument {
    pub path: PathBuf,
    pub content: Value,
}

/// The two halves sharing a base name. Either side may be missing.
#[derive(Debug, Clone)]
pub struct PairedUnit {
    pub base: BaseName,
    pub job_spec: Option<RawDocument>,
    pub hysds_io: Option<RawDocument>,
}

impl PairedUnit {
    fn new(base: BaseName) -> Self {
        Self {
            base,
            job_spec: None,
            hysds_io: None,
        }
    }

    fn slot(&mut self, kind: DocumentKind) -> &mut Option<RawDocument> {
        match kind {
            DocumentKind::JobSpec => &mut self.job_spec,
            DocumentKind::HysdsIo => &mut self.hysds_io,
        }
    }
}

/// Group documents by base name. Performs:
/// - warn about files outside the naming convention (skipped)
/// - warn about a second file for the same base and kind (later path wins)
/// - warn about units missing either side
pub fn pair_documents(
    naming: &FileNaming,
    docs: BTreeMap<PathBuf, Value>,
    findings: &mut Findings,
) -> BTreeMap<BaseName, PairedUnit> {
    let mut units: BTreeMap<BaseName, PairedUnit> = BTreeMap::new();

    for (path, content) in docs {
        let Some((kind, base)) = naming.classify(&path) else {
            findings.warning(format!(
                "{} does not follow the <kind>.json.<name> naming convention and is skipped",
                path.display()
            ));
            continue;
        };

        let unit = units
            .entry(base.clone())
            .or_insert_with(|| PairedUnit::new(base.clone()));
        let slot = unit.slot(kind);
        if let Some(prev) = slot {
            findings.warning(format!(
                "{} defines more than one {}.json ({} and {}); using {}",
                base,
                kind,
                prev.path.display(),
                path.display(),
                path.display()
            ));
        }
        *slot = Some(RawDocument { path, content });
    }

    for unit in units.values() {
        findings.check(unit.hysds_io.is_some(), Severity::Warning, || {
            format!("{} does not define a hysds-io.json", unit.base)
        });
        findings.check(unit.job_spec.is_some(), Severity::Warning, || {
            format!("{} does not define a job-spec.json", unit.base)
        });
    }

    tracing::debug!(units = units.len(), "paired documents");
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn docs(names: &[&str]) -> BTreeMap<PathBuf, Value> {
        names
            .iter()
            .map(|n| (PathBuf::from("/repo/docker").join(n), json!({})))
            .collect()
    }

    fn messages(findings: &Findings) -> Vec<String> {
        findings.iter().map(|f| f.message.clone()).collect()
    }

    #[test]
    fn both_halves_pair_without_findings() {
        let mut findings = Findings::new();
        let units = pair_documents(
            &FileNaming::new().unwrap(),
            docs(&["foo.json.job-spec", "hysds-io.json.foo"]),
            &mut findings,
        );
        assert!(findings.is_empty());
        let unit = &units[&BaseName("foo".to_string())];
        assert!(unit.job_spec.is_some());
        assert!(unit.hysds_io.is_some());
    }

    #[test]
    fn missing_half_is_a_warning() {
        let mut findings = Findings::new();
        pair_documents(
            &FileNaming::new().unwrap(),
            docs(&["foo.json.job-spec", "bar.json.hysds-io"]),
            &mut findings,
        );
        assert!(!findings.has_errors());
        assert_eq!(
            messages(&findings),
            vec![
                "bar does not define a job-spec.json",
                "foo does not define a hysds-io.json",
            ]
        );
    }

    #[test]
    fn bare_names_pair_under_the_empty_base() {
        let mut findings = Findings::new();
        let units = pair_documents(
            &FileNaming::new().unwrap(),
            docs(&["job-spec.json", "hysds-io.json"]),
            &mut findings,
        );
        assert!(findings.is_empty());
        assert_eq!(units.len(), 1);
        assert!(units.contains_key(&BaseName(String::new())));
    }

    #[test]
    fn unrecognized_names_are_skipped_with_a_warning() {
        let mut findings = Findings::new();
        let units = pair_documents(
            &FileNaming::new().unwrap(),
            docs(&["dataset.json"]),
            &mut findings,
        );
        assert!(units.is_empty());
        assert_eq!(findings.warning_count(), 1);
    }

    #[test]
    fn duplicate_kind_keeps_the_later_path() {
        let mut findings = Findings::new();
        let units = pair_documents(
            &FileNaming::new().unwrap(),
            docs(&["foo.json.job-spec", "job-spec.json.foo"]),
            &mut findings,
        );
        let unit = &units[&BaseName("foo".to_string())];
        assert!(
            unit.job_spec
                .as_ref()
                .unwrap()
                .path
                .ends_with("job-spec.json.foo")
        );
        assert_eq!(findings.warning_count(), 2);
    }
}
