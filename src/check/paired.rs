use crate::findings::Findings;
use crate::spec::{BaseName, HysdsIo, JobSpec, param_name};
use std::collections::HashSet;

const NO_NAME: &str = "no-name";

/// Report parameter names declared on only one side of the pair.
pub fn check_paired_params(base: &BaseName, spec: &JobSpec, io: &HysdsIo, findings: &mut Findings) {
    let spec_names: Vec<&str> = spec
        .params
        .iter()
        .flatten()
        .map(|p| param_name(p).unwrap_or(NO_NAME))
        .collect();
    let io_names: Vec<&str> = io
        .params
        .iter()
        .flatten()
        .map(|p| param_name(p).unwrap_or(NO_NAME))
        .collect();

    for name in unmatched(&spec_names, &io_names) {
        findings.error(format!(
            "{} defines job-spec parameter without match in hysds-io: {}",
            base, name
        ));
    }
    for name in unmatched(&io_names, &spec_names) {
        findings.error(format!(
            "{} defines hysds-io parameter without match in job-spec: {}",
            base, name
        ));
    }
}

/// Distinct names of `left` missing from `right`, in first-seen order.
fn unmatched<'a>(left: &[&'a str], right: &[&str]) -> Vec<&'a str> {
    let right: HashSet<&str> = right.iter().copied().collect();
    let mut seen = HashSet::new();
    left.iter()
        .copied()
        .filter(|name| !right.contains(name) && seen.insert(*name))
        .collect()
}
