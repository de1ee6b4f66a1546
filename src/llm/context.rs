use super::client::{Message, Role};
use serde_json::json;
use std::collections::VecDeque;

/// Ordered chat turns owned by the host, with an optional leading system message.
#[derive(Debug, Clone)]
pub struct ChatContext {
    messages: VecDeque<Message>,
    max_messages: usize,
    max_tokens: usize,
    system_message: Option<Message>,
}

impl ChatContext {
    pub fn new(max_messages: usize, max_tokens: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            max_messages,
            max_tokens,
            system_message: None,
        }
    }

    /// Create with default limits (40 messages, ~16000 tokens)
    pub fn with_defaults() -> Self {
        Self::new(40, 16000)
    }

    pub fn with_system_message(mut self, content: impl Into<String>) -> Self {
        self.set_system_message(content);
        self
    }

    pub fn set_system_message(&mut self, content: impl Into<String>) {
        self.system_message = Some(Message::system(content));
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.add_message(Message::user(content));
    }

    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.add_message(Message::assistant(content));
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push_back(message);
        self.trim_context();
    }

    /// Get all messages for API call (includes system message if set)
    pub fn get_messages(&self) -> Vec<Message> {
        self.system_message
            .iter()
            .chain(self.messages.iter())
            .cloned()
            .collect()
    }

    /// Final turn of the conversation, if any
    pub fn last(&self) -> Option<&Message> {
        self.messages.back()
    }

    /// Content of the most recent user turn
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|msg| msg.role == Role::User)
            .map(|msg| msg.content.as_str())
    }

    /// Clear all messages except system message
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Conversation length (excluding system message)
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn estimate_tokens(&self) -> usize {
        self.system_message
            .iter()
            .chain(self.messages.iter())
            .map(Self::estimate_message_tokens)
            .sum()
    }

    /// Rough token estimation for a single message
    fn estimate_message_tokens(message: &Message) -> usize {
        // ~4 characters per token plus role/formatting overhead
        (message.content.len() / 4) + (message.role.as_ref().len() / 4) + 10
    }

    fn trim_context(&mut self) {
        while self.messages.len() > self.max_messages {
            self.messages.pop_front();
        }

        // Keep at least the newest turn even if it alone exceeds the budget
        while self.estimate_tokens() > self.max_tokens && self.messages.len() > 1 {
            self.messages.pop_front();
        }
    }

    /// Get context summary for debugging
    pub fn summary(&self) -> String {
        format!(
            "Context: {} messages, ~{} tokens (limits: {} messages, {} tokens)",
            self.len(),
            self.estimate_tokens(),
            self.max_messages,
            self.max_tokens
        )
    }

    /// Export conversation to JSON for persistence
    pub fn to_json(&self) -> serde_json::Result<String> {
        let messages_json: Vec<serde_json::Value> =
            self.messages.iter().map(Message::to_json).collect();

        let context_json = json!({
            "system_message": self.system_message.as_ref().map(|msg| msg.content.clone()),
            "messages": messages_json,
            "max_messages": self.max_messages,
            "max_tokens": self.max_tokens
        });

        serde_json::to_string_pretty(&context_json)
    }

    /// Import conversation from JSON. Entries with unknown roles are skipped.
    pub fn from_json(json_str: &str) -> serde_json::Result<Self> {
        let json: serde_json::Value = serde_json::from_str(json_str)?;

        let max_messages = json["max_messages"].as_u64().unwrap_or(40) as usize;
        let max_tokens = json["max_tokens"].as_u64().unwrap_or(16000) as usize;

        let mut context = Self::new(max_messages, max_tokens);

        if let Some(system) = json["system_message"].as_str() {
            context.set_system_message(system);
        }

        if let Some(messages_array) = json["messages"].as_array() {
            for msg_json in messages_array {
                let role = msg_json["role"].as_str().and_then(|r| r.parse::<Role>().ok());
                match (role, msg_json["content"].as_str()) {
                    (Some(Role::User), Some(content)) => context.add_user_message(content),
                    (Some(Role::Assistant), Some(content)) => {
                        context.add_assistant_message(content)
                    }
                    _ => log::debug!("Skipping unsupported context entry: {}", msg_json),
                }
            }
        }

        Ok(context)
    }
}

impl Default for ChatContext {
    fn default() -> Self {
        Self::with_defaults()
    }
}
