//! Document checks: per-document schema rules plus the cross-pair
//! parameter reconciliation.

pub mod hysds_io;
pub mod job_spec;
pub mod paired;

use crate::findings::Findings;
use crate::model::{PairedUnit, RawDocument};
use crate::spec::{BaseName, DocumentKind, HysdsIo, JobSpec, param_name};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// Run every check over every unit, in base-name order.
pub fn check_units(units: &BTreeMap<BaseName, PairedUnit>, findings: &mut Findings) {
    for unit in units.values() {
        check_unit(unit, findings);
    }
}

pub fn check_unit(unit: &PairedUnit, findings: &mut Findings) {
    let base = &unit.base;

    let spec: Option<JobSpec> = unit
        .job_spec
        .as_ref()
        .and_then(|doc| typed(base, DocumentKind::JobSpec, doc, findings));
    if let Some(spec) = &spec {
        job_spec::check_job_spec(base, spec, findings);
    }

    let io: Option<HysdsIo> = unit
        .hysds_io
        .as_ref()
        .and_then(|doc| typed(base, DocumentKind::HysdsIo, doc, findings));
    if let Some(io) = &io {
        hysds_io::check_hysds_io(base, io, findings);
    }

    if let (Some(spec), Some(io)) = (&spec, &io) {
        paired::check_paired_params(base, spec, io, findings);
    }
}

/// Deserialize a raw document into its typed shape, reporting a mismatch
/// (wrong JSON type for a known field) as an error.
fn typed<T: DeserializeOwned>(
    base: &BaseName,
    kind: DocumentKind,
    doc: &RawDocument,
    findings: &mut Findings,
) -> Option<T> {
    match serde_json::from_value(doc.content.clone()) {
        Ok(v) => Some(v),
        Err(err) => {
            findings.error(format!(
                "{} defines {} with an invalid structure in {}: {}",
                base,
                kind,
                doc.path.display(),
                err
            ));
            None
        }
    }
}

/// Type one raw parameter object. A mismatch is reported against that
/// parameter and suppresses only its own checks.
fn typed_param<T: DeserializeOwned>(
    base: &BaseName,
    kind: DocumentKind,
    raw: &Value,
    findings: &mut Findings,
) -> Option<T> {
    match serde_json::from_value(raw.clone()) {
        Ok(v) => Some(v),
        Err(err) => {
            findings.error(format!(
                "{} defines {} parameter, {}, with an invalid structure: {}",
                base,
                kind,
                param_name(raw).unwrap_or("no-name"),
                err
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn unit(spec: Option<Value>, io: Option<Value>) -> PairedUnit {
        PairedUnit {
            base: BaseName("foo".to_string()),
            job_spec: spec.map(|content| RawDocument {
                path: PathBuf::from("foo.json.job-spec"),
                content,
            }),
            hysds_io: io.map(|content| RawDocument {
                path: PathBuf::from("foo.json.hysds-io"),
                content,
            }),
        }
    }

    #[test]
    fn well_formed_pair_is_clean() {
        let mut findings = Findings::new();
        check_unit(
            &unit(
                Some(json!({"command": "run", "params": [{"name": "bar", "destination": "positional"}]})),
                Some(json!({
                    "submission_type": "individual",
                    "params": [{"name": "bar", "from": "submitter", "type": "text"}]
                })),
            ),
            &mut findings,
        );
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn structurally_invalid_document_skips_the_cross_check() {
        let mut findings = Findings::new();
        check_unit(
            &unit(
                Some(json!({"command": "run", "params": "bar"})),
                Some(json!({"submission_type": "individual", "params": [{"name": "bar", "from": "submitter", "type": "text"}]})),
            ),
            &mut findings,
        );
        assert_eq!(findings.error_count(), 1);
        assert!(
            findings
                .iter()
                .next()
                .unwrap()
                .message
                .starts_with("foo defines job-spec with an invalid structure in foo.json.job-spec: ")
        );
    }

    #[test]
    fn malformed_parameter_only_suppresses_itself() {
        let mut findings = Findings::new();
        check_unit(
            &unit(
                Some(json!({"command": "run", "params": [
                    {"name": "a", "destination": "context"},
                    {"name": "b", "destination": "context"}
                ]})),
                Some(json!({"submission_type": "individual", "params": [
                    {"name": "a", "from": "bogus", "type": "text"},
                    {"name": "b", "from": "submitter", "type": 7}
                ]})),
            ),
            &mut findings,
        );
        let messages: Vec<String> = findings.iter().map(|f| f.message.clone()).collect();
        assert_eq!(messages.len(), 2, "{:?}", messages);
        assert_eq!(
            messages[0],
            "foo defines hysds-io parameter, a, with bad 'from' field, bogus"
        );
        assert!(
            messages[1].starts_with("foo defines hysds-io parameter, b, with an invalid structure: "),
            "{}",
            messages[1]
        );
    }

    #[test]
    fn cross_check_still_runs_past_a_malformed_parameter() {
        let mut findings = Findings::new();
        check_unit(
            &unit(
                Some(json!({"command": "run", "params": [{"name": "a", "destination": 3}]})),
                Some(json!({"submission_type": 7, "params": []})),
            ),
            &mut findings,
        );
        let messages: Vec<String> = findings.iter().map(|f| f.message.clone()).collect();
        assert_eq!(
            messages,
            vec![
                "foo defines job-spec parameter, a, with an invalid structure: invalid type: integer `3`, expected a string".to_string(),
                "foo defines hysds-io with illegal 'submission_type' of 7".to_string(),
                "foo defines job-spec parameter without match in hysds-io: a".to_string(),
            ]
        );
    }

    #[test]
    fn non_object_document_is_an_error() {
        let mut findings = Findings::new();
        check_unit(&unit(Some(json!([1, 2])), None), &mut findings);
        assert_eq!(findings.error_count(), 1);
    }
}
