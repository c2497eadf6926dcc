use crate::constants::context::NO_PROBLEMS;
use lsp_types::DiagnosticSeverity;
use serde::{Deserialize, Serialize};

/// Host-side source of diagnostics, keyed by document URI.
pub trait DiagnosticsProvider {
    fn diagnostics_for(&self, uri: &str) -> Vec<lsp_types::Diagnostic>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    pub fn from_lsp(severity: Option<DiagnosticSeverity>) -> Self {
        match severity {
            Some(s) if s == DiagnosticSeverity::ERROR => Severity::Error,
            Some(s) if s == DiagnosticSeverity::WARNING => Severity::Warning,
            Some(s) if s == DiagnosticSeverity::HINT => Severity::Hint,
            _ => Severity::Info,
        }
    }
}

/// Lowest severity that survives filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinSeverity {
    Error,
    Warning,
}

impl MinSeverity {
    fn keeps(&self, severity: Severity) -> bool {
        match self {
            MinSeverity::Error => severity == Severity::Error,
            MinSeverity::Warning => matches!(severity, Severity::Error | Severity::Warning),
        }
    }
}

/// Wire shape of one diagnostic. Lines are 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub line: u32,
    pub end_line: u32,
    pub message: String,
    pub severity: Severity,
    pub source: String,
}

impl From<&lsp_types::Diagnostic> for Diagnostic {
    fn from(diag: &lsp_types::Diagnostic) -> Self {
        Self {
            line: diag.range.start.line + 1,
            end_line: diag.range.end.line + 1,
            message: diag.message.clone(),
            severity: Severity::from_lsp(diag.severity),
            source: diag
                .source
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsResponse {
    pub errors: Vec<Diagnostic>,
}

impl DiagnosticsResponse {
    pub fn count(&self, severity: Severity) -> usize {
        self.errors.iter().filter(|d| d.severity == severity).count()
    }
}

/// Diagnostics of the document at `uri`, optionally filtered. No document
/// means no diagnostics.
pub fn collect(
    provider: &dyn DiagnosticsProvider,
    uri: Option<&str>,
    min_severity: Option<MinSeverity>,
) -> DiagnosticsResponse {
    let Some(uri) = uri else {
        return DiagnosticsResponse::default();
    };

    let errors = provider
        .diagnostics_for(uri)
        .iter()
        .map(Diagnostic::from)
        .filter(|d| min_severity.map_or(true, |min| min.keeps(d.severity)))
        .collect();

    DiagnosticsResponse { errors }
}

/// "2 errors, 1 warning"; a fixed sentence when there are neither.
pub fn summary(response: &DiagnosticsResponse) -> String {
    let errors = response.count(Severity::Error);
    let warnings = response.count(Severity::Warning);

    if errors == 0 && warnings == 0 {
        return NO_PROBLEMS.to_string();
    }

    let mut parts = Vec::new();
    if errors > 0 {
        parts.push(pluralize(errors, "error"));
    }
    if warnings > 0 {
        parts.push(pluralize(warnings, "warning"));
    }
    parts.join(", ")
}

fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
