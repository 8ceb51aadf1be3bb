use crate::findings::{Findings, Severity};
use crate::spec::job_spec::JobSpecParam;
use crate::spec::{BaseName, Destination, DocumentKind, JobSpec};

pub fn check_job_spec(base: &BaseName, spec: &JobSpec, findings: &mut Findings) {
    findings.check(spec.command.is_some(), Severity::Error, || {
        format!("{} defines job-spec without command field", base)
    });
    findings.check(spec.params.is_some(), Severity::Error, || {
        format!("{} defines job-spec without params field", base)
    });
    findings.check(spec.required_queues.is_none(), Severity::Warning, || {
        format!("{} defines job-spec with deprecated 'required-queues'", base)
    });
    findings.check(spec.recommended_queues.is_none(), Severity::Warning, || {
        format!("{} defines job-spec with deprecated 'recommended-queues'", base)
    });

    let Some(params) = &spec.params else {
        return;
    };

    for raw in params {
        let Some(param) =
            super::typed_param::<JobSpecParam>(base, DocumentKind::JobSpec, raw, findings)
        else {
            continue;
        };
        findings.check(param.name.is_some(), Severity::Error, || {
            format!("{} defines job-spec parameter with no 'name' field", base)
        });
        let name = param.name.as_deref().unwrap_or("no-name");

        match param.destination.as_deref() {
            None => findings.error(format!(
                "{} defines job-spec parameter, '{}', with no 'destination' field",
                base, name
            )),
            Some(dest) => findings.check(Destination::parse(dest).is_some(), Severity::Error, || {
                format!(
                    "{} defines job-spec parameter, {}, with bad 'destination' field, {}, must be one of {}",
                    base,
                    name,
                    dest,
                    Destination::ALL.join(", ")
                )
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(doc: serde_json::Value) -> Findings {
        let spec: JobSpec = serde_json::from_value(doc).unwrap();
        let mut findings = Findings::new();
        check_job_spec(&BaseName("foo".to_string()), &spec, &mut findings);
        findings
    }

    fn messages(findings: &Findings) -> Vec<String> {
        findings.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn valid_spec_has_no_findings() {
        let findings = run(json!({
            "command": "/home/ops/run.sh",
            "params": [
                {"name": "a", "destination": "context"},
                {"name": "b", "destination": "positional"},
                {"name": "c", "destination": "localize"}
            ]
        }));
        assert!(findings.is_empty());
    }

    #[test]
    fn missing_command_and_params() {
        let findings = run(json!({}));
        assert_eq!(
            messages(&findings),
            vec![
                "[ERROR] foo defines job-spec without command field",
                "[ERROR] foo defines job-spec without params field",
            ]
        );
    }

    #[test]
    fn deprecated_queues_only_warn() {
        let findings = run(json!({
            "command": "run",
            "params": [],
            "required-queues": ["a"],
            "recommended-queues": ["b"]
        }));
        assert!(!findings.has_errors());
        assert_eq!(findings.warning_count(), 2);
    }

    #[test]
    fn missing_destination_is_exactly_one_error() {
        let findings = run(json!({"command": "run", "params": [{"name": "bar"}]}));
        assert_eq!(
            messages(&findings),
            vec!["[ERROR] foo defines job-spec parameter, 'bar', with no 'destination' field"]
        );
    }

    #[test]
    fn mistyped_parameter_does_not_hide_the_others() {
        let findings = run(json!({"command": "run", "params": [
            {"name": ["x"], "destination": "context"},
            {"name": "bar"}
        ]}));
        let found = messages(&findings);
        assert_eq!(found.len(), 2);
        assert!(found[0].starts_with("[ERROR] foo defines job-spec parameter, no-name, with an invalid structure: "));
        assert_eq!(
            found[1],
            "[ERROR] foo defines job-spec parameter, 'bar', with no 'destination' field"
        );
    }

    #[test]
    fn null_command_is_present() {
        let findings = run(json!({"command": null, "params": []}));
        assert!(findings.is_empty());
    }

    #[test]
    fn bad_destination_and_missing_name() {
        let findings = run(json!({"command": "run", "params": [{"destination": "stdin"}]}));
        assert_eq!(
            messages(&findings),
            vec![
                "[ERROR] foo defines job-spec parameter with no 'name' field",
                "[ERROR] foo defines job-spec parameter, no-name, with bad 'destination' field, stdin, must be one of context, positional, localize",
            ]
        );
    }
}
