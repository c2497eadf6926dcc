use super::{ConversationSession, TranscriptEntry};
use crate::error::{CodebudError, Result};

/// Session without a model. Context updates are kept, user turns are only
/// recorded, so the monitor can run and be observed without any backend.
#[derive(Debug, Default)]
pub struct ConsoleSession {
    active: bool,
    last_context: Option<String>,
    transcript: Vec<TranscriptEntry>,
}

impl ConsoleSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_context(&self) -> Option<&str> {
        self.last_context.as_deref()
    }
}

#[async_trait::async_trait]
impl ConversationSession for ConsoleSession {
    async fn start_session(&mut self) -> Result<()> {
        self.active = true;
        self.transcript.clear();
        tracing::info!("Console session started");
        Ok(())
    }

    async fn end_session(&mut self) -> Result<Vec<TranscriptEntry>> {
        self.active = false;
        self.last_context = None;
        Ok(std::mem::take(&mut self.transcript))
    }

    fn is_active(&self) -> bool {
        self.active
    }

    async fn send_contextual_update(&mut self, text: &str) -> Result<()> {
        if !self.active {
            return Err(CodebudError::NotInitialized("conversation session".into()));
        }
        tracing::debug!("{text}");
        self.last_context = Some(text.to_string());
        Ok(())
    }

    async fn send_user_message(
        &mut self,
        text: &str,
        shown_as: Option<&str>,
    ) -> Result<Option<String>> {
        if !self.active {
            return Err(CodebudError::NotInitialized("conversation session".into()));
        }
        self.transcript
            .push(TranscriptEntry::user(shown_as.unwrap_or(text)));
        Ok(None)
    }

    fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }
}
