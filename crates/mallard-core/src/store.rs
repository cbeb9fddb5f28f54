//! Append-only conversation timeline.

use crate::error::{MallardError, Result};
use crate::state::ChatMessage;

pub const DEFAULT_GREETING: &str = "Quack! Ask me anything.";

#[derive(Debug, Default)]
pub struct ConversationStore {
    timeline: Vec<ChatMessage>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation whose first entry is a bot greeting.
    pub fn with_greeting(greeting: &str) -> Result<Self> {
        let mut store = Self::new();
        store.append(ChatMessage::bot(greeting))?;
        Ok(store)
    }

    /// Append a message to the end of the timeline.
    ///
    /// Callers are expected to trim and check input first; empty or
    /// whitespace-only text is rejected with `InvalidArgument`.
    pub fn append(&mut self, message: ChatMessage) -> Result<()> {
        if message.text.trim().is_empty() {
            return Err(MallardError::InvalidArgument(format!(
                "{:?} message text must not be empty",
                message.role
            )));
        }
        self.timeline.push(message);
        Ok(())
    }

    pub fn snapshot(&self) -> &[ChatMessage] {
        &self.timeline
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.timeline.last()
    }
}
