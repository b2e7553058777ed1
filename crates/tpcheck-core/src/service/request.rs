//! Per-call request descriptors and operation options
//!
//! Query assembly rules, shared by every operation: booleans are always
//! emitted as the `"true"`/`"false"` literals, list-valued options are
//! comma-joined and omitted entirely when empty, and absent optional scalars
//! are omitted rather than sent as empty strings. Percent-encoding happens
//! in the HTTP layer when the query pairs are serialized.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Service endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Check,
    Format,
    Compliance,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Check => "/check",
            Endpoint::Format => "/format",
            Endpoint::Compliance => "/compliance",
        }
    }
}

fn bool_param(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

/// Options for the `check` operation.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Report positions in LSP coordinates.
    pub lsp: bool,
    /// Ask the service to include safe autofixes.
    pub fix: bool,
    /// Allow autofixes that may change program behavior.
    pub fix_unsafe: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            lsp: true,
            fix: false,
            fix_unsafe: false,
        }
    }
}

impl CheckOptions {
    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("lsp", bool_param(self.lsp)),
            ("fix", bool_param(self.fix)),
            ("fix_unsafe", bool_param(self.fix_unsafe)),
        ]
    }
}

/// Options for the `compliance` operation.
#[derive(Debug, Clone)]
pub struct ComplianceOptions {
    /// Report positions in LSP coordinates.
    pub lsp: bool,
    /// Rule ids to check exclusively; empty means the service default set.
    pub select: Vec<String>,
    /// Rule ids to skip.
    pub ignore: Vec<String>,
    /// Minimum severity to report.
    pub severity: Option<String>,
    /// Compliance standard to check against.
    pub standard: Option<String>,
}

impl Default for ComplianceOptions {
    fn default() -> Self {
        Self {
            lsp: true,
            select: Vec::new(),
            ignore: Vec::new(),
            severity: None,
            standard: None,
        }
    }
}

impl ComplianceOptions {
    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("lsp", bool_param(self.lsp))];
        if !self.select.is_empty() {
            query.push(("select", self.select.join(",")));
        }
        if !self.ignore.is_empty() {
            query.push(("ignore", self.ignore.join(",")));
        }
        if let Some(severity) = &self.severity {
            query.push(("severity", severity.clone()));
        }
        if let Some(standard) = &self.standard {
            query.push(("standard", standard.clone()));
        }
        query
    }
}

/// A single outbound request. Built per call, never reused.
#[derive(Debug)]
pub(crate) struct RequestDescriptor {
    pub endpoint: Endpoint,
    pub body: String,
    pub query: Vec<(&'static str, String)>,
    pub timeout: Duration,
    pub cancellation: Option<CancellationToken>,
}
