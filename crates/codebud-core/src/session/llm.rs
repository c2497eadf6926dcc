use super::{ConversationSession, TranscriptEntry};
use crate::constants::monitor::MAX_TOOL_ITERATIONS;
use crate::context::ConversationHistory;
use crate::error::{CodebudError, Result};
use crate::llm::{LlmClient, Message};
use crate::tools::ToolRegistry;

pub const SYSTEM_PROMPT: &str = "You are CodeBud, a friendly pair programmer sitting next to the user. \
You receive [CONTEXT] notes describing the file and cursor; absorb them silently. \
When the user pauses you receive a [CODE_REVIEW] request: answer in one or two short sentences. \
In navigator mode you only observe and advise. In driver mode you may edit the code with \
insert_code_line and replace_code_line. Line numbers are 1-indexed. \
Call get_code_context or get_diagnostics before making claims about code you have not seen.";

/// Session backed by a chat model with the client tools attached. Tool calls
/// are answered in a loop until the model produces plain text.
pub struct LlmConversation {
    llm: Box<dyn LlmClient>,
    tools: ToolRegistry,
    history: ConversationHistory,
    transcript: Vec<TranscriptEntry>,
    max_iterations: usize,
    active: bool,
}

impl LlmConversation {
    pub fn new(llm: Box<dyn LlmClient>, tools: ToolRegistry) -> Self {
        Self {
            llm,
            tools,
            history: ConversationHistory::new().with_system_prompt(SYSTEM_PROMPT),
            transcript: Vec::new(),
            max_iterations: MAX_TOOL_ITERATIONS,
            active: false,
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    fn ensure_active(&self) -> Result<()> {
        if self.active {
            Ok(())
        } else {
            Err(CodebudError::NotInitialized("conversation session".into()))
        }
    }

    async fn complete(&mut self) -> Result<String> {
        let definitions = self.tools.definitions();

        for iteration in 1..=self.max_iterations {
            let messages = self.history.get_messages();
            let response = self.llm.chat(&messages, &definitions).await?;
            let message = response.message;

            let Some(tool_calls) = message.tool_calls.clone().filter(|c| !c.is_empty()) else {
                self.history.add_assistant_message(&message.content);
                tracing::debug!(iteration, "Model replied");
                return Ok(message.content);
            };

            self.history.add_message(message);
            for call in &tool_calls {
                let answer = match call.parse_arguments() {
                    Ok(params) => self.tools.dispatch(&call.function.name, params).await,
                    Err(e) => serde_json::json!({
                        "error": format!("Failed to parse tool arguments: {e}")
                    })
                    .to_string(),
                };
                tracing::info!(tool = %call.function.name, "Tool call answered");
                self.history.add_tool_result(&call.id, answer);
            }
        }

        Err(CodebudError::Llm(format!(
            "Exceeded maximum iterations ({})",
            self.max_iterations
        )))
    }
}

#[async_trait::async_trait]
impl ConversationSession for LlmConversation {
    async fn start_session(&mut self) -> Result<()> {
        self.history.clear();
        self.transcript.clear();
        self.active = true;
        tracing::info!(model = self.llm.model(), "Conversation started");
        Ok(())
    }

    async fn end_session(&mut self) -> Result<Vec<TranscriptEntry>> {
        self.active = false;
        self.history.clear();
        tracing::info!(turns = self.transcript.len(), "Conversation ended");
        Ok(std::mem::take(&mut self.transcript))
    }

    fn is_active(&self) -> bool {
        self.active
    }

    async fn send_contextual_update(&mut self, text: &str) -> Result<()> {
        self.ensure_active()?;
        self.history.set_ambient(text);
        Ok(())
    }

    async fn send_user_message(
        &mut self,
        text: &str,
        shown_as: Option<&str>,
    ) -> Result<Option<String>> {
        self.ensure_active()?;
        self.history.add_user_message(text);
        self.transcript
            .push(TranscriptEntry::user(shown_as.unwrap_or(text)));

        let reply = self.complete().await?;
        if !reply.trim().is_empty() {
            self.transcript.push(TranscriptEntry::assistant(&reply));
        }
        Ok(Some(reply))
    }

    fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }
}
