//! Spec layer: document schemas + the file-name convention.
//!
//! No I/O happens here; loading and checking live in `load` and `check`.
//! It owns:
//! - DocumentKind / BaseName (file-name convention)
//! - typed job-spec and hysds-io shapes
//!
//! Parameter lists stay raw at the document level and are typed one
//! parameter at a time, so a malformed parameter only affects itself.

pub mod hysds_io;
pub mod job_spec;
pub mod name;

pub use hysds_io::{HysdsIo, HysdsIoParam, ParamType, Source, SubmissionType};
pub use job_spec::{Destination, JobSpec};
pub use name::{BaseName, DocumentKind, FileNaming};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `deserialize_with` for fields where presence of the key is what matters:
/// an explicit `null` comes back as `Some(Value::Null)`, not `None`.
fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(d).map(Some)
}

/// The `name` of a raw parameter object, when it is a string.
pub fn param_name(raw: &Value) -> Option<&str> {
    raw.get("name").and_then(Value::as_str)
}
