//! File-name convention shared by job-spec and hysds-io documents.
//!
//! Both `job-spec.json.foo` and `foo.json.job-spec` name the job-spec of
//! base `foo`. A bare `job-spec.json` has an empty base; it pairs with a
//! bare `hysds-io.json` in the same directory.

use regex::Regex;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentKind {
    JobSpec,
    HysdsIo,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::JobSpec => "job-spec",
            DocumentKind::HysdsIo => "hysds-io",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "job-spec" => Some(DocumentKind::JobSpec),
            "hysds-io" => Some(DocumentKind::HysdsIo),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base name shared by the two halves of a pair. May be empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BaseName(pub String);

impl BaseName {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for BaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("<unnamed>")
        } else {
            f.write_str(&self.0)
        }
    }
}

pub struct FileNaming {
    re: Regex,
}

impl FileNaming {
    pub fn new() -> crate::Result<Self> {
        // Greedy first group: the last ".json" in the name is the separator.
        let re = Regex::new(r"^(.*)\.json\.?(.*)$")?;
        Ok(Self { re })
    }

    /// Extract `(kind, base)` from the final component of `path`.
    pub fn classify(&self, path: &Path) -> Option<(DocumentKind, BaseName)> {
        let file_name = path.file_name()?.to_str()?;
        let caps = self.re.captures(file_name)?;
        let head = caps.get(1)?.as_str();
        let tail = caps.get(2)?.as_str();

        if let Some(kind) = DocumentKind::from_tag(head) {
            return Some((kind, BaseName(tail.to_string())));
        }
        DocumentKind::from_tag(tail).map(|kind| (kind, BaseName(head.to_string())))
    }
}
