//! In-process stand-ins for the HTTP API and the model, shared by the unit
//! tests.

use crate::clock::ManualClock;
use crate::context::{get_context, CodeContext};
use crate::diagnostics::{self, DiagnosticsResponse};
use crate::editor::{EditResult, EditorActions, EditorHost, Position, TextDocument};
use crate::error::{CodebudError, Result};
use crate::llm::{LlmClient, LlmResponse, Message, Role};
use crate::mode::{Mode, ModeState};
use crate::monitor::CodeBudApi;
use crate::protocol::{ModeResponse, StatusResponse};
use crate::tools::ToolDefinition;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub(crate) struct InMemoryApi {
    host: Mutex<EditorHost>,
    mode: Mutex<ModeState>,
    actions: EditorActions,
    clock: ManualClock,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl InMemoryApi {
    pub fn empty() -> Self {
        let clock = ManualClock::new(1_700_000_000_000);
        Self {
            host: Mutex::new(EditorHost::new(Arc::new(clock.clone()))),
            mode: Mutex::new(ModeState::default()),
            actions: EditorActions::new(),
            clock,
            offline: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_document(uri: &str, text: &str) -> Self {
        let api = Self::empty();
        api.host.lock().unwrap().open_document(TextDocument::new(uri, text));
        api
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn text(&self) -> String {
        let host = self.host.lock().unwrap();
        host.active_document().map(|d| d.text()).unwrap_or_default()
    }

    /// Simulates the user typing `text` at the start of `line` (0-indexed).
    pub fn type_text(&self, line: usize, text: &str) {
        let at = Position::new(line, 0);
        self.host.lock().unwrap().edit_active(at, at, text).unwrap();
    }

    /// Like [`type_text`](Self::type_text), leaving the cursor on `line`.
    pub fn type_at(&self, line: usize, text: &str) {
        let at = Position::new(line, 0);
        let mut host = self.host.lock().unwrap();
        host.edit_active(at, at, text).unwrap();
        host.set_cursor(at);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(CodebudError::ConnectionFailed("connection refused".into()));
        }
        Ok(())
    }

    fn require_driver(&self, operation: &str) -> Result<()> {
        if self.mode.lock().unwrap().mode().can_edit() {
            return Ok(());
        }
        Err(CodebudError::Api {
            status: 403,
            message: CodebudError::forbidden(operation).to_string(),
        })
    }
}

#[async_trait::async_trait]
impl CodeBudApi for InMemoryApi {
    async fn context(&self) -> Result<CodeContext> {
        self.enter()?;
        let mode = self.mode.lock().unwrap().mode();
        let mut host = self.host.lock().unwrap();
        get_context(&mut host, mode).ok_or(CodebudError::Api {
            status: 404,
            message: CodebudError::NoActiveDocument.to_string(),
        })
    }

    async fn diagnostics(&self) -> Result<DiagnosticsResponse> {
        self.enter()?;
        let host = self.host.lock().unwrap();
        Ok(diagnostics::collect(&*host, host.active_uri(), None))
    }

    async fn insert(&self, line: i64, code: &str) -> Result<EditResult> {
        self.enter()?;
        self.require_driver("Code insertion")?;
        let mut host = self.host.lock().unwrap();
        Ok(self.actions.insert_code(&mut host, line, code))
    }

    async fn replace(&self, start_line: i64, end_line: i64, code: &str) -> Result<EditResult> {
        self.enter()?;
        self.require_driver("Code replacement")?;
        let mut host = self.host.lock().unwrap();
        Ok(self.actions.replace_code(&mut host, start_line, end_line, code))
    }

    async fn highlight(&self, line: i64) -> Result<()> {
        self.enter()?;
        let mut host = self.host.lock().unwrap();
        self.actions
            .highlight_line(&mut host, line, crate::constants::editor::HIGHLIGHT_DURATION_MS);
        Ok(())
    }

    async fn set_mode(&self, mode: Mode) -> Result<ModeResponse> {
        self.enter()?;
        self.mode.lock().unwrap().set_mode(mode);
        Ok(ModeResponse {
            success: true,
            mode,
        })
    }

    async fn status(&self) -> Result<StatusResponse> {
        self.enter()?;
        Ok(StatusResponse {
            active: true,
            mode: self.mode.lock().unwrap().mode(),
        })
    }
}

/// Replays canned replies and records what it was sent. Answers "done" once
/// the script runs out.
#[derive(Clone, Default)]
pub(crate) struct ScriptedLlm {
    replies: Arc<Mutex<VecDeque<Message>>>,
    seen: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Message>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }

    /// Last user message of every request.
    pub fn prompts(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|messages| messages.iter().rev().find(|m| m.role == Role::User))
            .map(|m| m.content.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat(&self, messages: &[Message], _tools: &[ToolDefinition]) -> Result<LlmResponse> {
        self.seen.lock().unwrap().push(messages.to_vec());
        let message = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Message::assistant("done"));
        Ok(LlmResponse {
            message,
            usage: None,
        })
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
