use super::document::{ContentChange, Position, TextDocument};
use crate::clock::{Clock, SystemClock};
use crate::diagnostics::DiagnosticsProvider;
use crate::error::{CodebudError, Result};
use crate::tracker::ChangeTracker;
use lsp_types::Diagnostic;
use std::collections::HashMap;
use std::sync::Arc;

/// The single transient line decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    /// 1-indexed.
    pub line: usize,
    pub expires_at: i64,
}

struct ActiveEditor {
    uri: String,
    cursor: Position,
    selection: Option<(Position, Position)>,
}

/// In-memory editor: open documents, the focused editor, published
/// diagnostics and the highlight slot. Every content mutation goes through
/// here so that changes to the focused document reach the change tracker.
pub struct EditorHost {
    documents: HashMap<String, TextDocument>,
    active: Option<ActiveEditor>,
    diagnostics: HashMap<String, Vec<Diagnostic>>,
    highlight: Option<Highlight>,
    tracker: ChangeTracker,
    clock: Arc<dyn Clock>,
}

impl EditorHost {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            documents: HashMap::new(),
            active: None,
            diagnostics: HashMap::new(),
            highlight: None,
            tracker: ChangeTracker::new(),
            clock,
        }
    }

    pub fn with_tracker(mut self, tracker: ChangeTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Opens (or reloads) a document and focuses it.
    pub fn open_document(&mut self, document: TextDocument) {
        let uri = document.uri().to_string();
        tracing::debug!(uri = %uri, lines = document.line_count(), "Opened document");
        self.documents.insert(uri.clone(), document);
        self.active = Some(ActiveEditor {
            uri,
            cursor: Position::default(),
            selection: None,
        });
    }

    pub fn focus(&mut self, uri: &str) -> Result<()> {
        if !self.documents.contains_key(uri) {
            return Err(CodebudError::Other(format!("Document not open: {uri}")));
        }
        self.active = Some(ActiveEditor {
            uri: uri.to_string(),
            cursor: Position::default(),
            selection: None,
        });
        self.highlight = None;
        Ok(())
    }

    /// Drops focus without closing anything, e.g. when the editor loses focus.
    pub fn blur(&mut self) {
        self.active = None;
        self.highlight = None;
    }

    pub fn close_document(&mut self, uri: &str) {
        self.documents.remove(uri);
        self.diagnostics.remove(uri);
        if self.active_uri() == Some(uri) {
            self.blur();
        }
    }

    pub fn document(&self, uri: &str) -> Option<&TextDocument> {
        self.documents.get(uri)
    }

    pub fn active_uri(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.uri.as_str())
    }

    pub fn active_document(&self) -> Option<&TextDocument> {
        self.active_uri().and_then(|uri| self.documents.get(uri))
    }

    /// Cursor of the focused editor, clamped to the document.
    pub fn cursor(&self) -> Option<Position> {
        let active = self.active.as_ref()?;
        let document = self.documents.get(&active.uri)?;
        let line = active.cursor.line.min(document.line_count().saturating_sub(1));
        let character = active.cursor.character.min(document.line_end(line).character);
        Some(Position::new(line, character))
    }

    pub fn set_cursor(&mut self, position: Position) {
        if let Some(active) = self.active.as_mut() {
            active.cursor = position;
            active.selection = None;
        }
    }

    /// Selects `start..end` and moves the cursor to `end`.
    pub fn set_selection(&mut self, start: Position, end: Position) {
        if let Some(active) = self.active.as_mut() {
            active.cursor = end;
            active.selection = if start == end {
                None
            } else {
                Some((start.min(end), start.max(end)))
            };
        }
    }

    pub fn selected_text(&self) -> Option<String> {
        let active = self.active.as_ref()?;
        let (start, end) = active.selection?;
        let document = self.documents.get(&active.uri)?;
        Some(document.text_in(start, end))
    }

    /// Applies an edit to `uri`. Changes to the focused document are recorded
    /// as typing activity.
    pub fn apply_edit(
        &mut self,
        uri: &str,
        start: Position,
        end: Position,
        new_text: &str,
    ) -> Result<ContentChange> {
        let document = self
            .documents
            .get_mut(uri)
            .ok_or_else(|| CodebudError::Other(format!("Document not open: {uri}")))?;
        let change = document.replace(start, end, new_text);

        if self.active_uri() == Some(uri) {
            let now = self.clock.now_millis();
            self.tracker.record_change(&change.text, change.line, now);
        }
        Ok(change)
    }

    /// Applies an edit to the focused document.
    pub fn edit_active(
        &mut self,
        start: Position,
        end: Position,
        new_text: &str,
    ) -> Result<ContentChange> {
        let uri = self
            .active_uri()
            .ok_or(CodebudError::NoActiveDocument)?
            .to_string();
        self.apply_edit(&uri, start, end, new_text)
    }

    pub fn publish_diagnostics(&mut self, uri: &str, diagnostics: Vec<Diagnostic>) {
        self.diagnostics.insert(uri.to_string(), diagnostics);
    }

    pub fn set_highlight(&mut self, highlight: Option<Highlight>) {
        self.highlight = highlight;
    }

    /// The live highlight, if its deadline has not passed.
    pub fn active_highlight(&self) -> Option<Highlight> {
        let now = self.clock.now_millis();
        self.highlight.filter(|h| now < h.expires_at)
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut ChangeTracker {
        &mut self.tracker
    }
}

impl Default for EditorHost {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl DiagnosticsProvider for EditorHost {
    fn diagnostics_for(&self, uri: &str) -> Vec<Diagnostic> {
        self.diagnostics.get(uri).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn host_with(text: &str) -> (EditorHost, ManualClock) {
        let clock = ManualClock::new(1_000);
        let mut host = EditorHost::new(Arc::new(clock.clone()));
        host.open_document(TextDocument::new("/tmp/main.rs", text));
        (host, clock)
    }

    #[test]
    fn test_edits_to_focused_document_are_tracked() {
        let (mut host, _) = host_with("fn main() {\n}\n");
        host.edit_active(Position::new(1, 0), Position::new(1, 0), "    run();\n")
            .unwrap();
        let recent = host.tracker().recent_changes(5);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].text, "run();");
        assert_eq!(recent[0].line, 2);
    }

    #[test]
    fn test_edits_to_background_document_are_not_tracked() {
        let (mut host, _) = host_with("a\n");
        host.open_document(TextDocument::new("/tmp/other.rs", "b\n"));
        host.focus("/tmp/main.rs").unwrap();

        host.apply_edit("/tmp/other.rs", Position::new(0, 0), Position::new(0, 0), "x")
            .unwrap();
        assert!(host.tracker().is_empty());
        assert_eq!(host.document("/tmp/other.rs").unwrap().text(), "xb\n");
    }

    #[test]
    fn test_no_active_document() {
        let mut host = EditorHost::default();
        assert!(host.active_document().is_none());
        assert!(matches!(
            host.edit_active(Position::default(), Position::default(), "x"),
            Err(CodebudError::NoActiveDocument)
        ));
    }

    #[test]
    fn test_cursor_is_clamped() {
        let (mut host, _) = host_with("ab\ncd");
        host.set_cursor(Position::new(40, 9));
        assert_eq!(host.cursor(), Some(Position::new(1, 2)));
    }

    #[test]
    fn test_selection_text() {
        let (mut host, _) = host_with("hello world\nsecond");
        assert!(host.selected_text().is_none());
        host.set_selection(Position::new(0, 6), Position::new(1, 3));
        assert_eq!(host.selected_text().as_deref(), Some("world\nsec"));
        host.set_selection(Position::new(0, 1), Position::new(0, 1));
        assert!(host.selected_text().is_none());
    }

    #[test]
    fn test_highlight_expires_lazily() {
        let (mut host, clock) = host_with("a\nb");
        host.set_highlight(Some(Highlight {
            line: 2,
            expires_at: 3_000,
        }));
        assert_eq!(host.active_highlight().map(|h| h.line), Some(2));
        clock.set(3_000);
        assert!(host.active_highlight().is_none());
    }

    #[test]
    fn test_close_active_document_blurs() {
        let (mut host, _) = host_with("a");
        host.close_document("/tmp/main.rs");
        assert!(host.active_uri().is_none());
        assert!(host.focus("/tmp/main.rs").is_err());
    }
}
