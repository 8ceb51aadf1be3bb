//! Finding aggregator.
//!
//! Every check reports through a `Findings` value threaded by `&mut`; nothing
//! short-circuits the run. Whether the run failed is derived from the
//! recorded findings, never tracked separately.

use std::fmt;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn tag(self) -> &'static str {
        match self {
            Severity::Warning => "[WARNING]",
            Severity::Error => "[ERROR]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.severity.tag(), self.message)
    }
}

/// Ordered list of findings for one validation run.
#[derive(Debug, Clone, Default)]
pub struct Findings {
    items: Vec<Finding>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message.into());
    }

    /// Record `message` at `severity` unless `ok` holds.
    pub fn check(&mut self, ok: bool, severity: Severity, message: impl FnOnce() -> String) {
        if !ok {
            self.push(severity, message());
        }
    }

    fn push(&mut self, severity: Severity, message: String) {
        tracing::trace!(?severity, %message, "finding recorded");
        self.items.push(Finding { severity, message });
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|f| f.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.items.iter().filter(|f| f.severity == severity).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Write every finding, one per line, in recorded order.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        for finding in self.iter() {
            writeln!(out, "{}", finding)?;
        }
        Ok(())
    }
}
