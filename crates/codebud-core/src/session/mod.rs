//! Conversational sessions the monitor feeds context into.

mod console;
mod llm;
mod transcript;

pub use console::ConsoleSession;
pub use llm::{LlmConversation, SYSTEM_PROMPT};
pub use transcript::{TranscriptEntry, TranscriptRole};

use crate::error::Result;

/// A conversation with the assistant.
#[async_trait::async_trait]
pub trait ConversationSession: Send {
    async fn start_session(&mut self) -> Result<()>;

    /// Ends the session and hands back its transcript.
    async fn end_session(&mut self) -> Result<Vec<TranscriptEntry>>;

    fn is_active(&self) -> bool;

    /// Context the assistant absorbs without replying.
    async fn send_contextual_update(&mut self, text: &str) -> Result<()>;

    /// A user turn. `shown_as` replaces `text` in the transcript when the
    /// turn was generated rather than typed. Returns the assistant's reply,
    /// if the session produces one.
    async fn send_user_message(&mut self, text: &str, shown_as: Option<&str>)
        -> Result<Option<String>>;

    fn transcript(&self) -> &[TranscriptEntry];
}
