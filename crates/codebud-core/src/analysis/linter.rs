use crate::editor::{split_lines_inclusive, strip_line_break, TextDocument};
use crate::error::{CodebudError, Result};
use lsp_types::{Diagnostic, DiagnosticSeverity, Position, Range};
use regex::Regex;

const MAX_LINE_LENGTH: usize = 120;
const SOURCE: &str = "codebud";

struct Rule {
    pattern: Regex,
    /// Language ids the rule applies to; empty means every language.
    languages: &'static [&'static str],
    severity: DiagnosticSeverity,
    message: &'static str,
}

impl Rule {
    fn new(
        pattern: &str,
        languages: &'static [&'static str],
        severity: DiagnosticSeverity,
        message: &'static str,
    ) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| CodebudError::Config(format!("Invalid lint pattern: {e}")))?;
        Ok(Self {
            pattern,
            languages,
            severity,
            message,
        })
    }

    fn applies_to(&self, language_id: &str) -> bool {
        self.languages.is_empty() || self.languages.contains(&language_id)
    }
}

/// Line-based regex linter. Stands in for a language server so that the
/// diagnostics endpoints have something to report.
pub struct Linter {
    rules: Vec<Rule>,
}

impl Linter {
    pub fn new() -> Result<Self> {
        const JS: &[&str] = &["javascript", "javascriptreact", "typescript", "typescriptreact"];

        let rules = vec![
            Rule::new(
                r"\.unwrap\(\)",
                &["rust"],
                DiagnosticSeverity::WARNING,
                "Direct unwrap() call without error handling",
            )?,
            Rule::new(
                r"\.clone\(\)",
                &["rust"],
                DiagnosticSeverity::HINT,
                "Consider borrowing instead of clone()",
            )?,
            Rule::new(
                r"except\s*:",
                &["python"],
                DiagnosticSeverity::WARNING,
                "Bare except clause catches all exceptions",
            )?,
            Rule::new(
                r"\bvar\s+",
                JS,
                DiagnosticSeverity::WARNING,
                "Using 'var' instead of 'let' or 'const'",
            )?,
            Rule::new(
                r"\b(TODO|FIXME|HACK)\b",
                &[],
                DiagnosticSeverity::INFORMATION,
                "TODO/FIXME comment found",
            )?,
        ];

        Ok(Self { rules })
    }

    pub fn lint(&self, text: &str, language_id: &str) -> Vec<Diagnostic> {
        let rules: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|r| r.applies_to(language_id))
            .collect();

        let mut diagnostics = Vec::new();
        let lines = split_lines_inclusive(text).into_iter().map(strip_line_break);
        for (line_num, line) in lines.enumerate() {
            for rule in &rules {
                if let Some(m) = rule.pattern.find(line) {
                    diagnostics.push(diagnostic(
                        line_num,
                        char_column(line, m.start()),
                        char_column(line, m.end()),
                        rule.severity,
                        rule.message.to_string(),
                    ));
                }
            }

            let length = line.chars().count();
            if length > MAX_LINE_LENGTH {
                diagnostics.push(diagnostic(
                    line_num,
                    MAX_LINE_LENGTH,
                    length,
                    DiagnosticSeverity::INFORMATION,
                    format!("Line is too long ({length} characters)"),
                ));
            }
        }
        diagnostics
    }

    pub fn lint_document(&self, document: &TextDocument) -> Vec<Diagnostic> {
        self.lint(&document.text(), document.language_id())
    }
}

fn char_column(line: &str, byte_offset: usize) -> usize {
    line[..byte_offset].chars().count()
}

fn diagnostic(
    line: usize,
    start: usize,
    end: usize,
    severity: DiagnosticSeverity,
    message: String,
) -> Diagnostic {
    Diagnostic {
        range: Range::new(
            Position::new(line as u32, start as u32),
            Position::new(line as u32, end as u32),
        ),
        severity: Some(severity),
        source: Some(SOURCE.to_string()),
        message,
        ..Default::default()
    }
}
