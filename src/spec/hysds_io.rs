//! hysds-io document shape.
//!
//! JSON shape:
//! {
//!   "submission_type": "individual",
//!   "params": [
//!     { "name": "input", "from": "dataset_jpath:_source.urls", "type": "text" },
//!     { "name": "mode", "from": "submitter", "type": "enum", "enumerables": ["a", "b"] },
//!     { "name": "fmt", "from": "value", "value": "png", "lambda": "lambda x: x.upper()" }
//!   ]
//! }

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct HysdsIo {
    /// Raw parameter objects; see `HysdsIoParam`.
    #[serde(default)]
    pub params: Option<Vec<Value>>,

    /// Kept untyped: a non-string value is reported as an illegal type.
    #[serde(default)]
    pub submission_type: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HysdsIoParam {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub from: Option<String>,

    #[serde(default, rename = "type")]
    pub param_type: Option<String>,

    #[serde(default, deserialize_with = "super::present")]
    pub value: Option<Value>,

    /// Kept untyped: a non-string default (`null` included) is itself a finding.
    #[serde(default, deserialize_with = "super::present")]
    pub default: Option<Value>,

    #[serde(default, deserialize_with = "super::present")]
    pub lambda: Option<Value>,

    #[serde(default, deserialize_with = "super::present")]
    pub enumerables: Option<Value>,

    #[serde(default, deserialize_with = "super::present")]
    pub version_regex: Option<Value>,
}

impl HysdsIoParam {
    pub fn has_field(&self, field: RequiredField) -> bool {
        match field {
            RequiredField::Enumerables => self.enumerables.is_some(),
            RequiredField::VersionRegex => self.version_regex.is_some(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionType {
    Individual,
    Iteration,
}

impl SubmissionType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "individual" => Some(SubmissionType::Individual),
            "iteration" => Some(SubmissionType::Iteration),
            _ => None,
        }
    }
}

/// Where a parameter value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source<'a> {
    Submitter,
    Passthrough,
    Value,
    /// Anything starting with "dataset_jpath"; the raw text is kept for
    /// path checks.
    DatasetJpath(&'a str),
}

impl<'a> Source<'a> {
    pub fn parse(s: &'a str) -> Option<Self> {
        match s {
            "submitter" => Some(Source::Submitter),
            "passthrough" => Some(Source::Passthrough),
            "value" => Some(Source::Value),
            _ if s.starts_with("dataset_jpath") => Some(Source::DatasetJpath(s)),
            _ => None,
        }
    }
}

/// Parameter names a passthrough source may carry.
pub const PASSTHROUGH_NAMES: [&str; 6] = ["name", "query", "username", "priority", "type", "queue"];

/// Top-level keys of an indexed dataset document.
pub const DATASET_TOP_LEVEL_KEYS: [&str; 6] =
    ["_source", "_id", "_type", "_version", "_index", "_score"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Enumerables,
    VersionRegex,
}

impl RequiredField {
    pub fn key(self) -> &'static str {
        match self {
            RequiredField::Enumerables => "enumerables",
            RequiredField::VersionRegex => "version_regex",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Region,
    Text,
    Number,
    Date,
    Datetime,
    Boolean,
    Enum,
    Email,
    Textarea,
    ContainerVersion,
    JobspecVersion,
    HysdsioVersion,
}

impl ParamType {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "region" => ParamType::Region,
            "text" => ParamType::Text,
            "number" => ParamType::Number,
            "date" => ParamType::Date,
            "datetime" => ParamType::Datetime,
            "boolean" => ParamType::Boolean,
            "enum" => ParamType::Enum,
            "email" => ParamType::Email,
            "textarea" => ParamType::Textarea,
            "container_version" => ParamType::ContainerVersion,
            "jobspec_version" => ParamType::JobspecVersion,
            "hysdsio_version" => ParamType::HysdsioVersion,
            _ => return None,
        })
    }

    pub fn required_fields(self) -> &'static [RequiredField] {
        match self {
            ParamType::Enum => &[RequiredField::Enumerables],
            ParamType::ContainerVersion | ParamType::JobspecVersion | ParamType::HysdsioVersion => {
                &[RequiredField::VersionRegex]
            }
            ParamType::Region
            | ParamType::Text
            | ParamType::Number
            | ParamType::Date
            | ParamType::Datetime
            | ParamType::Boolean
            | ParamType::Email
            | ParamType::Textarea => &[],
        }
    }
}
