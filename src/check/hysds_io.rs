use crate::findings::{Findings, Severity};
use crate::lambda::validate_lambda;
use crate::spec::hysds_io::{DATASET_TOP_LEVEL_KEYS, PASSTHROUGH_NAMES};
use crate::spec::{BaseName, DocumentKind, HysdsIo, HysdsIoParam, ParamType, Source, SubmissionType};
use serde_json::Value;

pub fn check_hysds_io(base: &BaseName, io: &HysdsIo, findings: &mut Findings) {
    findings.check(io.params.is_some(), Severity::Error, || {
        format!("{} defines hysds-io without params field", base)
    });

    match &io.submission_type {
        None => findings.warning(format!(
            "{} defines hysds-io without 'submission_type'",
            base
        )),
        Some(st) => findings.check(
            st.as_str().and_then(SubmissionType::parse).is_some(),
            Severity::Error,
            || {
                format!(
                    "{} defines hysds-io with illegal 'submission_type' of {}",
                    base,
                    st.as_str().map_or_else(|| st.to_string(), str::to_string)
                )
            },
        ),
    }

    for raw in io.params.iter().flatten() {
        if let Some(param) =
            super::typed_param::<HysdsIoParam>(base, DocumentKind::HysdsIo, raw, findings)
        {
            check_param(base, &param, findings);
        }
    }
}

fn check_param(base: &BaseName, param: &HysdsIoParam, findings: &mut Findings) {
    findings.check(param.name.is_some(), Severity::Error, || {
        format!("{} defines hysds-io parameter with no 'name' field", base)
    });
    let name = param.name.as_deref().unwrap_or("no-name");

    match param.from.as_deref() {
        None => findings.error(format!(
            "{} defines hysds-io parameter, '{}', with no 'from' field",
            base, name
        )),
        Some(from) => match Source::parse(from) {
            None => findings.error(format!(
                "{} defines hysds-io parameter, {}, with bad 'from' field, {}",
                base, name, from
            )),
            Some(source) => check_source(base, name, param, source, findings),
        },
    }

    match &param.lambda {
        None => {}
        Some(Value::String(src)) => {
            if let Err(err) = validate_lambda(src) {
                findings.error(format!(
                    "{} defines hysds-io lambda modifier for parameter, {}, which {}",
                    base, name, err
                ));
            }
        }
        Some(_) => findings.error(format!(
            "{} defines hysds-io lambda modifier for parameter, {}, which is not a string",
            base, name
        )),
    }

    check_type(base, name, param, findings);

    findings.check(
        param.default.as_ref().is_none_or(Value::is_string),
        Severity::Error,
        || {
            format!(
                "{} defines hysds-io parameter {} with default that is not a string.",
                base, name
            )
        },
    );
}

fn check_source(
    base: &BaseName,
    name: &str,
    param: &HysdsIoParam,
    source: Source<'_>,
    findings: &mut Findings,
) {
    match source {
        Source::Submitter => {}
        Source::Value => findings.check(param.value.is_some(), Severity::Error, || {
            format!(
                "{} defines hysds-io value parameter, {}, without value field",
                base, name
            )
        }),
        Source::Passthrough => findings.check(PASSTHROUGH_NAMES.contains(&name), Severity::Error, || {
            format!(
                "{} defines hysds-io passthrough parameter with invalid name, {}, must be one of {}",
                base,
                name,
                PASSTHROUGH_NAMES.join(", ")
            )
        }),
        Source::DatasetJpath(from) => {
            let parts: Vec<&str> = from.split(':').collect();
            let [_, path] = parts.as_slice() else {
                findings.error(format!(
                    "{} defines hysds-io dataset_jpath parameter, {}, with invalid format: {} does not match 'dataset_jpath:*'",
                    base, name, from
                ));
                return;
            };
            let first = path.split('.').next().unwrap_or_default();
            findings.check(
                first.is_empty() || DATASET_TOP_LEVEL_KEYS.contains(&first),
                Severity::Error,
                || {
                    format!(
                        "{} defines hysds-io parameter, {}, with dataset_jpath, {}, that will not exist.",
                        base, name, path
                    )
                },
            );
        }
    }
}

fn check_type(base: &BaseName, name: &str, param: &HysdsIoParam, findings: &mut Findings) {
    findings.check(param.param_type.is_some(), Severity::Warning, || {
        format!("{} defines hysds-io parameter {} without a type", base, name)
    });
    let type_name = param.param_type.as_deref().unwrap_or("text");

    let Some(param_type) = ParamType::parse(type_name) else {
        findings.error(format!(
            "{} defines hysds-io parameter {} with invalid type {}",
            base, name, type_name
        ));
        return;
    };

    for field in param_type.required_fields() {
        findings.check(param.has_field(*field), Severity::Error, || {
            format!(
                "{} defines hysds-io parameter {} with type {} but not required field {}",
                base,
                name,
                type_name,
                field.key()
            )
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(doc: Value) -> Findings {
        let io: HysdsIo = serde_json::from_value(doc).unwrap();
        let mut findings = Findings::new();
        check_hysds_io(&BaseName("foo".to_string()), &io, &mut findings);
        findings
    }

    fn run_param(param: Value) -> Vec<String> {
        let findings = run(json!({"submission_type": "iteration", "params": [param]}));
        findings.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn valid_params_have_no_findings() {
        let findings = run(json!({
            "submission_type": "individual",
            "params": [
                {"name": "a", "from": "submitter", "type": "text", "default": "x"},
                {"name": "queue", "from": "passthrough", "type": "text"},
                {"name": "b", "from": "value", "value": "v", "type": "number"},
                {"name": "c", "from": "dataset_jpath:_source.urls", "type": "text"},
                {"name": "d", "from": "dataset_jpath:", "type": "text"},
                {"name": "e", "from": "submitter", "type": "enum", "enumerables": ["x", "y"]},
                {"name": "f", "from": "submitter", "type": "container_version", "version_regex": ".*"},
                {"name": "g", "from": "submitter", "type": "text", "lambda": "lambda x: x.upper()"}
            ]
        }));
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn top_level_fields() {
        let findings = run(json!({}));
        assert_eq!(
            findings.iter().map(|f| f.to_string()).collect::<Vec<_>>(),
            vec![
                "[ERROR] foo defines hysds-io without params field",
                "[WARNING] foo defines hysds-io without 'submission_type'",
            ]
        );

        let findings = run(json!({"params": [], "submission_type": "batch"}));
        assert_eq!(
            findings.iter().map(|f| f.to_string()).collect::<Vec<_>>(),
            vec!["[ERROR] foo defines hysds-io with illegal 'submission_type' of batch"]
        );

        let findings = run(json!({"params": [], "submission_type": 7}));
        assert_eq!(
            findings.iter().map(|f| f.to_string()).collect::<Vec<_>>(),
            vec!["[ERROR] foo defines hysds-io with illegal 'submission_type' of 7"]
        );
    }

    #[test]
    fn one_mistyped_parameter_leaves_the_rest_checked() {
        let findings = run(json!({"submission_type": "iteration", "params": [
            {"name": "a", "from": "bogus", "type": "text"},
            {"name": "b", "from": "submitter", "type": 7},
            {"name": "c", "from": "value", "type": "text"}
        ]}));
        let found: Vec<String> = findings.iter().map(|f| f.to_string()).collect();
        assert_eq!(found.len(), 3, "{:?}", found);
        assert_eq!(found[0], "[ERROR] foo defines hysds-io parameter, a, with bad 'from' field, bogus");
        assert!(found[1].starts_with("[ERROR] foo defines hysds-io parameter, b, with an invalid structure: "));
        assert_eq!(found[2], "[ERROR] foo defines hysds-io value parameter, c, without value field");
    }

    #[test]
    fn missing_from_is_exactly_one_error() {
        assert_eq!(
            run_param(json!({"name": "bar", "type": "text"})),
            vec!["[ERROR] foo defines hysds-io parameter, 'bar', with no 'from' field"]
        );
    }

    #[test]
    fn bad_from() {
        assert_eq!(
            run_param(json!({"name": "bar", "from": "env", "type": "text"})),
            vec!["[ERROR] foo defines hysds-io parameter, bar, with bad 'from' field, env"]
        );
    }

    #[test]
    fn value_source_needs_a_value() {
        assert_eq!(
            run_param(json!({"name": "bar", "from": "value", "type": "text"})),
            vec!["[ERROR] foo defines hysds-io value parameter, bar, without value field"]
        );
    }

    #[test]
    fn passthrough_names_are_fixed() {
        assert_eq!(
            run_param(json!({"name": "bar", "from": "passthrough", "type": "text"})),
            vec![
                "[ERROR] foo defines hysds-io passthrough parameter with invalid name, bar, must be one of name, query, username, priority, type, queue"
            ]
        );
    }

    #[test]
    fn dataset_jpath_format() {
        assert_eq!(
            run_param(json!({"name": "bar", "from": "dataset_jpath", "type": "text"})),
            vec![
                "[ERROR] foo defines hysds-io dataset_jpath parameter, bar, with invalid format: dataset_jpath does not match 'dataset_jpath:*'"
            ]
        );
        assert_eq!(
            run_param(json!({"name": "bar", "from": "dataset_jpath:a:b", "type": "text"})).len(),
            1
        );
        assert_eq!(
            run_param(json!({"name": "bar", "from": "dataset_jpath:metadata.id", "type": "text"})),
            vec![
                "[ERROR] foo defines hysds-io parameter, bar, with dataset_jpath, metadata.id, that will not exist."
            ]
        );
    }

    #[test]
    fn enum_needs_enumerables() {
        assert_eq!(
            run_param(json!({"name": "bar", "from": "submitter", "type": "enum"})),
            vec![
                "[ERROR] foo defines hysds-io parameter bar with type enum but not required field enumerables"
            ]
        );
        assert!(
            run_param(json!({"name": "bar", "from": "submitter", "type": "enum", "enumerables": []}))
                .is_empty()
        );
    }

    #[test]
    fn versioned_types_need_version_regex() {
        for t in ["container_version", "jobspec_version", "hysdsio_version"] {
            let found = run_param(json!({"name": "bar", "from": "submitter", "type": t}));
            assert_eq!(found.len(), 1, "{}", t);
            assert!(found[0].ends_with("but not required field version_regex"));
        }
    }

    #[test]
    fn missing_type_warns_and_defaults_to_text() {
        assert_eq!(
            run_param(json!({"name": "bar", "from": "submitter"})),
            vec!["[WARNING] foo defines hysds-io parameter bar without a type"]
        );
        assert_eq!(
            run_param(json!({"name": "bar", "from": "submitter", "type": "string"})),
            vec!["[ERROR] foo defines hysds-io parameter bar with invalid type string"]
        );
    }

    #[test]
    fn null_required_fields_count_as_present() {
        assert!(
            run_param(json!({"name": "bar", "from": "submitter", "type": "enum", "enumerables": null}))
                .is_empty()
        );
        assert!(
            run_param(json!({"name": "bar", "from": "submitter", "type": "jobspec_version", "version_regex": null}))
                .is_empty()
        );
        assert!(
            run_param(json!({"name": "bar", "from": "value", "value": null, "type": "text"}))
                .is_empty()
        );
    }

    #[test]
    fn non_string_defaults_are_rejected() {
        for default in [json!(null), json!(1), json!(true), json!(["a"])] {
            let found = run_param(
                json!({"name": "bar", "from": "submitter", "type": "number", "default": default}),
            );
            assert_eq!(
                found,
                vec!["[ERROR] foo defines hysds-io parameter bar with default that is not a string."]
            );
        }
    }

    #[test]
    fn lambda_findings_name_the_parameter() {
        assert_eq!(
            run_param(json!({"name": "bar", "from": "submitter", "type": "text", "lambda": "x + 1"})),
            vec![
                "[ERROR] foo defines hysds-io lambda modifier for parameter, bar, which does not equate to a lambda function"
            ]
        );
        assert!(
            run_param(json!({"name": "bar", "from": "submitter", "type": "text", "lambda": "lambda x: x + 1"}))
                .is_empty()
        );

        let found = run_param(json!({
            "name": "bar", "from": "submitter", "type": "text",
            "lambda": "lambda x: helper_not_in_allowlist(x)"
        }));
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("references name 'helper_not_in_allowlist'"));

        for lambda in [json!(3), json!(null)] {
            assert_eq!(
                run_param(json!({"name": "bar", "from": "submitter", "type": "text", "lambda": lambda})),
                vec![
                    "[ERROR] foo defines hysds-io lambda modifier for parameter, bar, which is not a string"
                ]
            );
        }
    }
}
