use super::document::{split_lines_inclusive, strip_line_break, Position};
use super::host::{EditorHost, Highlight};
use crate::constants::editor::HIGHLIGHT_DURATION_MS;
use crate::error::{CodebudError, Result};
use serde::{Deserialize, Serialize};

/// Outcome of an editing request. Failures are data, never panics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl EditResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

impl From<Result<()>> for EditResult {
    fn from(result: Result<()>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// Line-addressed edits against the focused document. Line numbers are
/// 1-indexed, as on the wire.
#[derive(Debug, Clone)]
pub struct EditorActions {
    highlight_duration_ms: i64,
}

impl EditorActions {
    pub fn new() -> Self {
        Self {
            highlight_duration_ms: HIGHLIGHT_DURATION_MS,
        }
    }

    pub fn with_highlight_duration(mut self, millis: i64) -> Self {
        self.highlight_duration_ms = millis;
        self
    }

    /// Inserts `code` above `line`; `line == totalLines + 1` appends.
    pub fn insert_code(&self, host: &mut EditorHost, line: i64, code: &str) -> EditResult {
        let result = self.try_insert(host, line, code);
        if let Err(ref e) = result {
            tracing::debug!(line, error = %e, "Insert rejected");
        }
        result.into()
    }

    /// Replaces lines `start..=end` with `code`.
    pub fn replace_code(&self, host: &mut EditorHost, start: i64, end: i64, code: &str) -> EditResult {
        let result = self.try_replace(host, start, end, code);
        if let Err(ref e) = result {
            tracing::debug!(start, end, error = %e, "Replace rejected");
        }
        result.into()
    }

    /// Decorates `line` until `duration_ms` passes or another highlight
    /// replaces it. Out-of-range lines only clear the previous decoration.
    pub fn highlight_line(&self, host: &mut EditorHost, line: i64, duration_ms: i64) -> bool {
        host.set_highlight(None);

        let Some(total) = host.active_document().map(|d| d.line_count()) else {
            return false;
        };
        if line < 1 || line as usize > total {
            return false;
        }

        let expires_at = host.now() + duration_ms;
        host.set_highlight(Some(Highlight {
            line: line as usize,
            expires_at,
        }));
        true
    }

    fn try_insert(&self, host: &mut EditorHost, line: i64, code: &str) -> Result<()> {
        let document = host.active_document().ok_or(CodebudError::NoActiveDocument)?;
        let total = document.line_count();
        let zero = line - 1;
        if zero < 0 || zero as usize > total {
            return Err(CodebudError::InvalidLine { line, total });
        }
        let zero = zero as usize;

        let indentation = document
            .line_text(zero)
            .map(|text| leading_whitespace(&text).to_string())
            .unwrap_or_default();

        let eol = document.eol();
        // Appending to a document without a final line break starts a new line.
        let separator = if zero == total && !document.ends_with_newline() {
            eol
        } else {
            ""
        };

        let text = format!(
            "{separator}{indentation}{}{eol}",
            reindent(code, &indentation, eol)
        );
        let at = Position::new(zero, 0);
        host.edit_active(at, at, &text)?;

        self.highlight_line(host, line, self.highlight_duration_ms);
        Ok(())
    }

    fn try_replace(&self, host: &mut EditorHost, start: i64, end: i64, code: &str) -> Result<()> {
        let document = host.active_document().ok_or(CodebudError::NoActiveDocument)?;
        let total = document.line_count() as i64;
        if start < 1 || end > total || start > end {
            return Err(CodebudError::InvalidRange { start, end });
        }
        let (first, last) = ((start - 1) as usize, (end - 1) as usize);

        let indentation = document
            .line_text(first)
            .map(|text| leading_whitespace(&text).to_string())
            .unwrap_or_default();
        let range_end = document.line_end(last);

        let text = format!(
            "{indentation}{}",
            reindent(code, &indentation, document.eol())
        );
        host.edit_active(Position::new(first, 0), range_end, &text)?;

        self.highlight_line(host, start, self.highlight_duration_ms);
        Ok(())
    }
}

impl Default for EditorActions {
    fn default() -> Self {
        Self::new()
    }
}

fn leading_whitespace(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    &line[..end]
}

/// Prefixes every line but the first with `indentation` and joins the lines
/// with the document's `eol`.
fn reindent(code: &str, indentation: &str, eol: &str) -> String {
    let mut lines: Vec<&str> = split_lines_inclusive(code)
        .into_iter()
        .map(strip_line_break)
        .collect();
    if code.is_empty() || code.ends_with(['\n', '\r']) {
        lines.push("");
    }
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.to_string()
            } else {
                format!("{indentation}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join(eol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::editor::TextDocument;
    use std::sync::Arc;

    fn host_with(text: &str) -> (EditorHost, ManualClock) {
        let clock = ManualClock::new(10_000);
        let mut host = EditorHost::new(Arc::new(clock.clone()));
        host.open_document(TextDocument::new("/work/app.py", text));
        (host, clock)
    }

    fn text(host: &EditorHost) -> String {
        host.active_document().unwrap().text()
    }

    #[test]
    fn test_insert_reuses_target_indentation() {
        let (mut host, _) = host_with("def f():\n    return 1\n");
        let result = EditorActions::new().insert_code(&mut host, 2, "x = 1\ny = 2");
        assert_eq!(result, EditResult::ok());
        assert_eq!(text(&host), "def f():\n    x = 1\n    y = 2\n    return 1\n");
    }

    #[test]
    fn test_insert_keeps_crlf_line_endings() {
        let (mut host, _) = host_with("a\r\nb\r\n");
        let actions = EditorActions::new();
        assert!(actions.insert_code(&mut host, 2, "x\ny").success);
        assert!(actions.replace_code(&mut host, 4, 4, "c\nd").success);

        let text = text(&host);
        assert_eq!(text, "a\r\nx\r\ny\r\nc\r\nd\r\n");
        assert_eq!(text.matches('\n').count(), text.matches("\r\n").count());
    }

    #[test]
    fn test_append_to_crlf_document_without_final_break() {
        let (mut host, _) = host_with("a\r\nb");
        assert!(EditorActions::new().insert_code(&mut host, 3, "c").success);
        assert_eq!(text(&host), "a\r\nb\r\nc\r\n");
    }

    #[test]
    fn test_insert_at_end_of_file_is_legal() {
        let (mut host, _) = host_with("a\nb\nc");
        let actions = EditorActions::new();
        let total = host.active_document().unwrap().line_count() as i64;

        let result = actions.insert_code(&mut host, total + 1, "x");
        assert!(result.success, "{result:?}");
        assert_eq!(text(&host), "a\nb\nc\nx\n");
    }

    #[test]
    fn test_insert_two_past_end_fails_with_invalid_line() {
        let (mut host, _) = host_with("a\nb\nc");
        let result = EditorActions::new().insert_code(&mut host, 5, "x");
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Invalid line number: 5. Document has 3 lines.")
        );
        assert_eq!(text(&host), "a\nb\nc");
    }

    #[test]
    fn test_insert_rejects_line_zero() {
        let (mut host, _) = host_with("a");
        assert!(!EditorActions::new().insert_code(&mut host, 0, "x").success);
    }

    #[test]
    fn test_replace_range_with_indentation() {
        let (mut host, _) = host_with("if x:\n    a()\n    b()\n    c()\n");
        let result = EditorActions::new().replace_code(&mut host, 2, 3, "d()\ne()");
        assert!(result.success);
        assert_eq!(text(&host), "if x:\n    d()\n    e()\n    c()\n");
    }

    #[test]
    fn test_replace_inverted_range_fails_without_mutation() {
        let (mut host, _) = host_with("1\n2\n3\n4\n5\n6");
        let result = EditorActions::new().replace_code(&mut host, 5, 3, "x");
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Invalid range: 5-3."));
        assert_eq!(text(&host), "1\n2\n3\n4\n5\n6");
        assert!(host.tracker().is_empty());
    }

    #[test]
    fn test_replace_past_end_fails() {
        let (mut host, _) = host_with("1\n2");
        assert!(!EditorActions::new().replace_code(&mut host, 1, 3, "x").success);
        assert!(!EditorActions::new().replace_code(&mut host, 0, 1, "x").success);
    }

    #[test]
    fn test_successful_edit_highlights_and_tracks() {
        let (mut host, clock) = host_with("a\nb");
        EditorActions::new().replace_code(&mut host, 2, 2, "bee");

        let highlight = host.active_highlight().unwrap();
        assert_eq!(highlight.line, 2);
        assert_eq!(host.tracker().recent_change_texts(1), vec!["bee"]);

        clock.advance(2_000);
        assert!(host.active_highlight().is_none());
    }

    #[test]
    fn test_new_highlight_preempts_old() {
        let (mut host, clock) = host_with("a\nb\nc");
        let actions = EditorActions::new();
        assert!(actions.highlight_line(&mut host, 1, 5_000));
        clock.advance(1_000);
        assert!(actions.highlight_line(&mut host, 3, 500));

        assert_eq!(host.active_highlight().unwrap().line, 3);
        clock.advance(600);
        assert!(host.active_highlight().is_none());
    }

    #[test]
    fn test_out_of_range_highlight_clears_previous() {
        let (mut host, _) = host_with("a\nb");
        let actions = EditorActions::new();
        actions.highlight_line(&mut host, 1, 2_000);
        assert!(!actions.highlight_line(&mut host, 9, 2_000));
        assert!(host.active_highlight().is_none());
    }

    #[test]
    fn test_no_active_editor() {
        let mut host = EditorHost::default();
        let result = EditorActions::new().insert_code(&mut host, 1, "x");
        assert_eq!(result.error.as_deref(), Some("No active editor"));
    }

    #[test]
    fn test_edit_result_wire_shape() {
        let ok = serde_json::to_value(EditResult::ok()).unwrap();
        assert_eq!(ok, serde_json::json!({ "success": true }));
    }
}
