//! Snapshot of the focused document as reported to polling clients.

use crate::constants::context::{MAX_CONTENT_LINES, SURROUNDING_RADIUS};
use crate::constants::tracking::DEFAULT_RECENT_CHANGES;
use crate::editor::{split_lines_inclusive, strip_line_break, EditorHost};
use crate::mode::Mode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeContext {
    pub mode: Mode,
    pub file_name: String,
    pub language: String,
    pub file_content: String,
    pub surrounding_code: String,
    /// 1-indexed.
    pub cursor_line: usize,
    pub total_lines: usize,
    pub selected_text: Option<String>,
    pub recent_changes: Vec<String>,
    pub is_typing: bool,
    pub last_change_time: i64,
    pub seconds_since_last_change: i64,
    pub changes_since_last_poll: Vec<String>,
    pub has_new_changes: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics_summary: Option<String>,
}

/// Assembles the context of the focused document, or `None` when nothing is
/// focused. Drains the since-last-poll queue, so two consecutive calls never
/// report the same change twice.
pub fn get_context(host: &mut EditorHost, mode: Mode) -> Option<CodeContext> {
    let now = host.now();
    let cursor = host.cursor()?.line;
    let selected_text = host.selected_text();

    let pending: Vec<String> = host
        .tracker_mut()
        .take_changes_since_last_poll()
        .into_iter()
        .map(|change| change.text)
        .collect();
    let typing = host.tracker().typing_state(now);
    let recent_changes = host.tracker().recent_change_texts(DEFAULT_RECENT_CHANGES);

    let document = host.active_document()?;
    let total_lines = document.line_count();

    let start = cursor.saturating_sub(SURROUNDING_RADIUS);
    let end = (cursor + SURROUNDING_RADIUS).min(total_lines.saturating_sub(1));

    Some(CodeContext {
        mode,
        file_name: document.file_name().to_string(),
        language: document.language_id().to_string(),
        file_content: truncate_content(&document.text(), total_lines),
        surrounding_code: document.lines_text(start, end),
        cursor_line: cursor + 1,
        total_lines,
        selected_text,
        recent_changes,
        is_typing: typing.is_typing,
        last_change_time: typing.last_change_time,
        seconds_since_last_change: typing.seconds_since_last_change,
        has_new_changes: !pending.is_empty(),
        changes_since_last_poll: pending,
        diagnostics_summary: None,
    })
}

/// Keeps the first `MAX_CONTENT_LINES` lines of `text` and appends a marker
/// naming how many were cut. Depends only on the line count.
pub fn truncate_content(text: &str, total_lines: usize) -> String {
    if total_lines <= MAX_CONTENT_LINES {
        return text.to_string();
    }

    let kept: String = split_lines_inclusive(text)
        .into_iter()
        .take(MAX_CONTENT_LINES)
        .collect();
    format!(
        "{}\n... (truncated {} lines)",
        strip_line_break(&kept),
        total_lines - MAX_CONTENT_LINES
    )
}
