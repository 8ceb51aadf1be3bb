//! job-spec document shape.
//!
//! JSON shape:
//! {
//!   "command": "/home/ops/run.sh",
//!   "params": [
//!     { "name": "input", "destination": "localize" }
//!   ]
//! }

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct JobSpec {
    #[serde(default, deserialize_with = "super::present")]
    pub command: Option<Value>,

    /// Raw parameter objects; see `JobSpecParam`.
    #[serde(default)]
    pub params: Option<Vec<Value>>,

    #[serde(default, rename = "required-queues", deserialize_with = "super::present")]
    pub required_queues: Option<Value>,

    #[serde(default, rename = "recommended-queues", deserialize_with = "super::present")]
    pub recommended_queues: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobSpecParam {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub destination: Option<String>,
}

/// How a parameter value is delivered to the running job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Context,
    Positional,
    Localize,
}

impl Destination {
    pub const ALL: [&'static str; 3] = ["context", "positional", "localize"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "context" => Some(Destination::Context),
            "positional" => Some(Destination::Positional),
            "localize" => Some(Destination::Localize),
            _ => None,
        }
    }
}
