use codebud_core::analysis::Linter;
use codebud_core::diagnostics::{self, DiagnosticsResponse};
use codebud_core::{
    CodebudError, EditResult, EditorActions, EditorHost, Mode, ModeState, Result, TextDocument,
};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Everything a request handler may touch. Built explicitly and shared by
/// reference; there are no process-wide singletons.
///
/// Lock order is always mode, then host. Every document mutation happens
/// under the host lock, so API edits and file-mirror updates never
/// interleave.
pub struct ApiState {
    host: Mutex<EditorHost>,
    mode: Mutex<ModeState>,
    actions: EditorActions,
    linter: Option<Linter>,
    write_back: Option<PathBuf>,
}

impl ApiState {
    pub fn new(host: EditorHost, mode: ModeState) -> Self {
        Self {
            host: Mutex::new(host),
            mode: Mutex::new(mode),
            actions: EditorActions::new(),
            linter: None,
            write_back: None,
        }
    }

    pub fn with_actions(mut self, actions: EditorActions) -> Self {
        self.actions = actions;
        self
    }

    /// Lints the focused document after every change.
    pub fn with_linter(mut self, linter: Linter) -> Self {
        self.linter = Some(linter);
        self
    }

    /// Successful API edits to the document at `path` are saved back to it.
    pub fn with_write_back(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.write_back = Some(path.canonicalize().unwrap_or(path));
        self
    }

    pub fn host(&self) -> MutexGuard<'_, EditorHost> {
        self.host.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mode_state(&self) -> MutexGuard<'_, ModeState> {
        self.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mode(&self) -> Mode {
        self.mode_state().mode()
    }

    pub fn actions(&self) -> &EditorActions {
        &self.actions
    }

    /// The single capability check for mutating operations.
    pub fn require_driver(&self, operation: &str) -> Result<()> {
        if self.mode().can_edit() {
            Ok(())
        } else {
            Err(CodebudError::forbidden(operation))
        }
    }

    pub fn open_document(&self, document: TextDocument) {
        let mut host = self.host();
        host.open_document(document);
        self.refresh_diagnostics(&mut host);
    }

    pub fn diagnostics(&self) -> DiagnosticsResponse {
        let host = self.host();
        diagnostics::collect(&*host, host.active_uri(), None)
    }

    pub fn insert(&self, line: i64, code: &str) -> Result<EditResult> {
        self.require_driver("Code insertion")?;
        Ok(self.edit(|actions, host| actions.insert_code(host, line, code)))
    }

    pub fn replace(&self, start_line: i64, end_line: i64, code: &str) -> Result<EditResult> {
        self.require_driver("Code replacement")?;
        Ok(self.edit(|actions, host| actions.replace_code(host, start_line, end_line, code)))
    }

    pub fn highlight(&self, line: i64, duration_ms: i64) -> bool {
        let mut host = self.host();
        self.actions.highlight_line(&mut host, line, duration_ms)
    }

    fn edit(&self, apply: impl FnOnce(&EditorActions, &mut EditorHost) -> EditResult) -> EditResult {
        let mut host = self.host();
        let result = apply(&self.actions, &mut host);
        if result.success {
            self.refresh_diagnostics(&mut host);
            self.save_back(&host);
        }
        result
    }

    /// Re-lints the focused document. Called with the host lock held.
    pub(crate) fn refresh_diagnostics(&self, host: &mut EditorHost) {
        let Some(ref linter) = self.linter else {
            return;
        };
        let Some(document) = host.active_document() else {
            return;
        };
        let uri = document.uri().to_string();
        let found = linter.lint_document(document);
        host.publish_diagnostics(&uri, found);
    }

    fn save_back(&self, host: &EditorHost) {
        let Some(ref path) = self.write_back else {
            return;
        };
        let uri = path.display().to_string();
        let Some(document) = host.document(&uri) else {
            return;
        };
        if let Err(e) = std::fs::write(path, document.text()) {
            tracing::warn!(path = %uri, error = %e, "Failed to write edit back to disk");
        }
    }
}

impl Default for ApiState {
    fn default() -> Self {
        Self::new(EditorHost::default(), ModeState::default())
    }
}
