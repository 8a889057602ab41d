use std::sync::Arc;

use super::message::{now_millis, Message, Sender};
use crate::error::{ParleyError, Result};
use crate::id::{IdGenerator, UuidGenerator};

/// The active conversation: messages in append order.
pub struct ConversationStore {
    messages: Vec<Message>,
    ids: Arc<dyn IdGenerator>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::with_ids(Arc::new(UuidGenerator))
    }

    pub fn with_ids(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            messages: Vec::new(),
            ids,
        }
    }

    /// Rehydrate from persisted messages.
    pub fn from_messages(messages: Vec<Message>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { messages, ids }
    }

    /// Append a finalized message and return the stored copy.
    ///
    /// The timestamp never goes backwards within the conversation, even if
    /// the wall clock does.
    pub fn append(&mut self, sender: Sender, text: impl Into<String>) -> Result<Message> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ParleyError::precondition("message text must not be empty"));
        }

        let now = now_millis();
        let timestamp = self
            .messages
            .last()
            .map_or(now, |last| last.timestamp.max(now));

        let message = Message {
            id: self.ids.next_id(),
            text,
            sender,
            timestamp,
        };
        self.messages.push(message.clone());
        Ok(message)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Owned copy of the conversation; later appends do not touch it.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
