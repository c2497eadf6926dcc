use crate::constants::monitor::MAX_HISTORY_MESSAGES;
use crate::llm::Message;
use std::collections::VecDeque;

/// Chat history sent to the model. Besides the turn-by-turn messages it
/// holds one ambient note: the latest silent context update, which replaces
/// the previous one instead of piling up.
pub struct ConversationHistory {
    messages: VecDeque<Message>,
    max_messages: usize,
    system_prompt: Option<String>,
    ambient: Option<String>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self {
            messages: VecDeque::new(),
            max_messages: MAX_HISTORY_MESSAGES,
            system_prompt: None,
            ambient: None,
        }
    }

    pub fn with_max_messages(mut self, max: usize) -> Self {
        self.max_messages = max;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn set_ambient(&mut self, note: impl Into<String>) {
        self.ambient = Some(note.into());
    }

    pub fn ambient(&self) -> Option<&str> {
        self.ambient.as_deref()
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.add_message(Message::user(content));
    }

    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.add_message(Message::assistant(content));
    }

    pub fn add_tool_result(&mut self, tool_call_id: impl Into<String>, result: impl Into<String>) {
        self.add_message(Message::tool_result(tool_call_id, result));
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push_back(message);
        self.trim_if_needed();
    }

    /// System prompt, then the ambient note, then the conversation.
    pub fn get_messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.messages.len() + 2);
        if let Some(ref system) = self.system_prompt {
            messages.push(Message::system(system));
        }
        if let Some(ref ambient) = self.ambient {
            messages.push(Message::system(ambient));
        }
        messages.extend(self.messages.iter().cloned());
        messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.ambient = None;
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.back()
    }

    // A tool result whose call was trimmed away would be rejected by the
    // model API, so trimming never leaves one at the front.
    fn trim_if_needed(&mut self) {
        while self.messages.len() > self.max_messages
            || self
                .messages
                .front()
                .is_some_and(|m| m.tool_call_id.is_some())
        {
            self.messages.pop_front();
        }
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn test_ambient_note_replaces_previous() {
        let mut history = ConversationHistory::new().with_system_prompt("sys");
        history.set_ambient("[CONTEXT] one");
        history.set_ambient("[CONTEXT] two");
        history.add_user_message("hi");

        let messages = history.get_messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content, "[CONTEXT] two");
        assert_eq!(messages[2].role, Role::User);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_trim_drops_oldest_and_orphaned_tool_results() {
        let mut history = ConversationHistory::new().with_max_messages(2);
        history.add_user_message("one");
        history.add_tool_result("call_1", "{}");
        history.add_assistant_message("two");

        assert_eq!(history.len(), 1);
        assert_eq!(history.last_message().unwrap().content, "two");
    }
}
